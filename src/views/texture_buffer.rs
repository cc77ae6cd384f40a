use gl::types::*;

use crate::buffer::{Buffer, SharedBuffer};
use crate::context::Context;
use crate::errors::*;
use crate::texture::{Texture, TextureBufferFormat};

/// A buffer texture giving shaders indexed, formatted access to a range of a buffer.
///
/// Shares the texture unit bindings with regular textures.
#[derive(Debug)]
pub struct TextureBufferView {
    ctx: Context,
    id: GLuint,
    buffer: SharedBuffer,
    format: TextureBufferFormat,
    offset: usize,
    size: usize,
}

impl TextureBufferView {
    /// A view of the entire buffer.
    pub fn new(ctx: &Context, buffer: SharedBuffer, format: TextureBufferFormat) -> Result<Self> {
        let size = Buffer::borrow_shared(&buffer)?.size();
        TextureBufferView::with_range(ctx, buffer, format, 0, size)
    }

    /// A view of `size` bytes starting at `offset`.
    pub fn with_range(
        ctx: &Context,
        buffer: SharedBuffer,
        format: TextureBufferFormat,
        offset: usize,
        size: usize,
    ) -> Result<Self> {
        let handle = {
            let b = Buffer::borrow_shared(&buffer)?;
            debug_assert!(offset + size <= b.size(), "View exceeds the buffer.");
            b.handle()
        };

        let device = ctx.device();
        let id = device.create_texture(gl::TEXTURE_BUFFER);
        let view = TextureBufferView {
            ctx: ctx.clone(),
            id,
            buffer,
            format,
            offset,
            size,
        };

        device.texture_buffer_range(id, format.into(), handle, offset, size);
        ctx.check("glTextureBufferRange")?;
        Ok(view)
    }

    /// Binds the view to a texture unit if it is not bound there already.
    pub fn bind(&self, slot: usize) {
        Texture::bind_unit(&self.ctx, slot, self.id);
    }

    #[inline]
    pub fn handle(&self) -> GLuint {
        self.id
    }

    #[inline]
    pub fn format(&self) -> TextureBufferFormat {
        self.format
    }

    /// Viewed byte range as (offset, size).
    #[inline]
    pub fn range(&self) -> (usize, usize) {
        (self.offset, self.size)
    }

    #[inline]
    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }
}

impl Drop for TextureBufferView {
    fn drop(&mut self) {
        self.ctx.state().forget_texture(self.id);
        self.ctx.device().delete_texture(self.id);
    }
}
