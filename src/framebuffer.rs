//! Framebuffer objects rendering into textures.

use gl::types::*;
use smallvec::SmallVec;

use crate::context::Context;
use crate::errors::*;
use crate::texture::Texture;

/// A texture image attached to a framebuffer.
#[derive(Debug, Copy, Clone)]
pub struct Attachment<'a> {
    pub texture: &'a Texture,
    pub mip_level: u32,
    /// Attaches a single layer if greater than zero, otherwise the whole level.
    pub layer: u32,
}

impl<'a> Attachment<'a> {
    pub fn new(texture: &'a Texture) -> Self {
        Attachment {
            texture,
            mip_level: 0,
            layer: 0,
        }
    }

    pub fn with_level(texture: &'a Texture, mip_level: u32, layer: u32) -> Self {
        Attachment {
            texture,
            mip_level,
            layer,
        }
    }
}

/// What the framebuffer remembers of an attachment.
#[derive(Debug, Copy, Clone)]
struct AttachmentInfo {
    texture: GLuint,
    width: u32,
    height: u32,
    mip_level: u32,
}

impl AttachmentInfo {
    fn viewport(&self) -> (u32, u32) {
        (
            (self.width >> self.mip_level).max(1),
            (self.height >> self.mip_level).max(1),
        )
    }
}

/// A rectangle in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    fn corners(&self) -> [i32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }
}

#[derive(Debug)]
pub struct FramebufferObject {
    ctx: Context,
    id: GLuint,
    colors: SmallVec<[AttachmentInfo; 8]>,
    depth_stencil: Option<AttachmentInfo>,
}

impl FramebufferObject {
    /// Creates a framebuffer with the given color attachments and an optional depth (or
    /// depth-stencil if `depth_with_stencil`) attachment.
    pub fn new(
        ctx: &Context,
        colors: &[Attachment],
        depth_stencil: Option<Attachment>,
        depth_with_stencil: bool,
    ) -> Result<Self> {
        if colors.is_empty() && depth_stencil.is_none() {
            return Err(Error::EmptyFramebuffer);
        }

        let device = ctx.device();
        let id = device.create_framebuffer();

        let mut fbo = FramebufferObject {
            ctx: ctx.clone(),
            id,
            colors: SmallVec::new(),
            depth_stencil: None,
        };

        if let Some(v) = depth_stencil {
            let attachment = if depth_with_stencil {
                gl::DEPTH_STENCIL_ATTACHMENT
            } else {
                gl::DEPTH_ATTACHMENT
            };

            fbo.depth_stencil = Some(fbo.attach(attachment, &v));
        }

        for (i, v) in colors.iter().enumerate() {
            let info = fbo.attach(gl::COLOR_ATTACHMENT0 + i as GLenum, v);
            fbo.colors.push(info);
        }

        let draw_buffers: SmallVec<[GLenum; 8]> = (0..colors.len())
            .map(|i| gl::COLOR_ATTACHMENT0 + i as GLenum)
            .collect();

        device.framebuffer_draw_buffers(id, &draw_buffers);
        device.framebuffer_read_buffer(
            id,
            if colors.is_empty() {
                gl::NONE
            } else {
                gl::COLOR_ATTACHMENT0
            },
        );
        ctx.check("glNamedFramebufferDrawBuffers")?;

        match device.check_framebuffer_status(id, gl::FRAMEBUFFER) {
            gl::FRAMEBUFFER_COMPLETE => Ok(fbo),
            gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => Err(Error::IncompleteFramebuffer(
                "Not all framebuffer attachment points are framebuffer attachment complete.",
            )),
            gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => Err(Error::IncompleteFramebuffer(
                "No images are attached to the framebuffer.",
            )),
            gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => Err(Error::IncompleteFramebuffer(
                "The attached images do not share the same number of samples.",
            )),
            gl::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => Err(Error::IncompleteFramebuffer(
                "Some attachments are layered while others are not.",
            )),
            gl::FRAMEBUFFER_UNSUPPORTED => Err(Error::IncompleteFramebuffer(
                "The combination of internal formats of the attached images violates an \
                 implementation-dependent set of restrictions.",
            )),
            _ => Err(Error::IncompleteFramebuffer("Unknown status.")),
        }
    }

    fn attach(&self, attachment: GLenum, v: &Attachment) -> AttachmentInfo {
        let device = self.ctx.device();
        let texture = v.texture.handle();

        if v.layer > 0 {
            device.framebuffer_texture_layer(self.id, attachment, texture, v.mip_level, v.layer);
        } else {
            device.framebuffer_texture(self.id, attachment, texture, v.mip_level);
        }

        AttachmentInfo {
            texture,
            width: v.texture.width(),
            height: v.texture.height(),
            mip_level: v.mip_level,
        }
    }

    #[inline]
    pub fn handle(&self) -> GLuint {
        self.id
    }

    #[inline]
    pub fn num_color_attachments(&self) -> usize {
        self.colors.len()
    }

    /// Handle of the texture attached to color attachment `index`.
    pub fn color_attachment(&self, index: usize) -> Option<GLuint> {
        self.colors.get(index).map(|v| v.texture)
    }

    pub fn depth_stencil_attachment(&self) -> Option<GLuint> {
        self.depth_stencil.map(|v| v.texture)
    }

    /// Size of the viewport covering the attachments. Taken from the depth-stencil attachment
    /// if there is one, otherwise from the first color attachment.
    pub fn viewport_size(&self) -> (u32, u32) {
        self.depth_stencil
            .or_else(|| self.colors.first().cloned())
            .map(|v| v.viewport())
            .unwrap_or((0, 0))
    }

    /// Binds the framebuffer for drawing if it is not bound already.
    ///
    /// If `auto_viewport` is set, the viewport is set to the size of the attachments whenever
    /// the binding changes.
    pub fn bind(&self, auto_viewport: bool) {
        let mut state = self.ctx.state();
        if state.draw_framebuffer == self.id {
            return;
        }

        self.ctx
            .device()
            .bind_framebuffer(gl::DRAW_FRAMEBUFFER, self.id);
        state.draw_framebuffer = self.id;

        if auto_viewport {
            let (w, h) = self.viewport_size();
            self.ctx.device().viewport(0, 0, w, h);
        }
    }

    /// Binds the default framebuffer for drawing if it is not bound already.
    pub fn bind_back_buffer(ctx: &Context) {
        let mut state = ctx.state();
        if state.draw_framebuffer != 0 {
            ctx.device().bind_framebuffer(gl::DRAW_FRAMEBUFFER, 0);
            state.draw_framebuffer = 0;
        }
    }

    /// Copies a rectangle of this framebuffer into `target`, or into the default framebuffer
    /// if `target` is `None`.
    pub fn blit_to(
        &self,
        target: Option<&FramebufferObject>,
        src: Rect,
        dst: Rect,
        color: bool,
        depth: bool,
        stencil: bool,
        linear: bool,
    ) -> Result<()> {
        let mut mask = 0;
        if color {
            mask |= gl::COLOR_BUFFER_BIT;
        }

        if depth {
            mask |= gl::DEPTH_BUFFER_BIT;
        }

        if stencil {
            mask |= gl::STENCIL_BUFFER_BIT;
        }

        debug_assert!(
            !linear || (!depth && !stencil),
            "Depth and stencil blits must use nearest filtering."
        );

        let filter = if linear { gl::LINEAR } else { gl::NEAREST };
        let dst_id = target.map(|v| v.id).unwrap_or(0);

        self.ctx
            .device()
            .blit_framebuffer(self.id, dst_id, src.corners(), dst.corners(), mask, filter);
        self.ctx.check("glBlitNamedFramebuffer")
    }

    /// Clears color attachment `index`.
    pub fn clear_color(&self, index: usize, rgba: [f32; 4]) -> Result<()> {
        debug_assert!(index < self.colors.len(), "No color attachment {}.", index);
        self.ctx
            .device()
            .clear_framebuffer_color(self.id, index as i32, rgba);
        self.ctx.check("glClearNamedFramebufferfv")
    }

    /// Clears the depth-stencil attachment.
    pub fn clear_depth_stencil(&self, depth: f32, stencil: i32) -> Result<()> {
        debug_assert!(self.depth_stencil.is_some(), "No depth-stencil attachment.");
        self.ctx
            .device()
            .clear_framebuffer_depth_stencil(self.id, depth, stencil);
        self.ctx.check("glClearNamedFramebufferfi")
    }
}

impl Drop for FramebufferObject {
    fn drop(&mut self) {
        {
            let mut state = self.ctx.state();
            if state.draw_framebuffer == self.id {
                state.draw_framebuffer = 0;
            }
        }

        self.ctx.device().delete_framebuffer(self.id);
    }
}
