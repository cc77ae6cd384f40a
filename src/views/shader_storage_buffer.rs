use crate::buffer::{Buffer, SharedBuffer};
use crate::context::Context;
use crate::errors::*;

/// A buffer used as the backing store of a shader storage block.
#[derive(Debug)]
pub struct ShaderStorageBufferView {
    buffer: SharedBuffer,
    name: String,
}

impl ShaderStorageBufferView {
    /// `name` is the block name used by `ShaderObject::bind_shader_storage_buffer`.
    pub fn new<T: Into<String>>(buffer: SharedBuffer, name: T) -> Self {
        ShaderStorageBufferView {
            buffer,
            name: name.into(),
        }
    }

    /// Binds the whole buffer to a shader storage slot if it is not bound there already.
    /// Non-persistent buffers are unmapped first.
    pub fn bind(&self, slot: usize) -> Result<()> {
        let mut buffer = Buffer::borrow_shared(&self.buffer)?;
        if buffer.is_mapped() && !buffer.is_persistent() {
            buffer.unmap()?;
        }

        buffer.bind_shader_storage_buffer_whole(slot);
        Ok(())
    }

    pub fn reset_binding(ctx: &Context, slot: usize) {
        Buffer::reset_shader_storage_buffer_binding(ctx, slot);
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }
}
