//! Immutable-storage textures and views.

pub mod format;
pub mod texture2d;
pub mod texture3d;
pub mod view;

pub use self::format::*;
pub use self::texture2d::Texture2D;
pub use self::texture3d::Texture3D;
pub use self::view::TextureView;

use gl::types::*;

use crate::context::Context;
use crate::errors::*;

/// Number of bytes of an image of `size` pixels.
pub(crate) fn image_bytes(size: &[u32], pixel_size: usize) -> usize {
    size.iter()
        .fold(pixel_size, |acc, &v| acc.saturating_mul(v as usize))
}

/// Fails if `data` holds fewer bytes than an upload of `size` pixels reads.
pub(crate) fn check_upload_size(data: &[u8], size: &[u32], pixel_size: usize) -> Result<()> {
    let needed = image_bytes(size, pixel_size);
    if data.len() < needed {
        error!("Texture upload needs {} bytes but got {}.", needed, data.len());
        return Err(Error::DataTooSmall(data.len(), needed));
    }

    Ok(())
}

/// Data shared by all texture kinds. Owns the driver texture object.
#[derive(Debug)]
pub struct Texture {
    ctx: Context,
    id: GLuint,
    width: u32,
    height: u32,
    depth: u32,
    format: TextureFormat,
    levels: u32,
    samples: u32,
}

impl Texture {
    /// Wraps a freshly created texture object. A mip level count of zero means the full chain.
    pub(crate) fn wrap(
        ctx: &Context,
        id: GLuint,
        dimensions: [u32; 3],
        format: TextureFormat,
        levels: u32,
        samples: u32,
    ) -> Texture {
        let [width, height, depth] = dimensions;
        debug_assert!(
            width > 0 && height > 0 && depth > 0,
            "Texture size must be greater than zero."
        );

        let levels = if levels == 0 {
            Texture::full_mip_chain(width, height, depth)
        } else {
            levels
        };

        debug_assert!(
            levels == 1 || samples == 0,
            "Multisampled textures can not have more than one mip level."
        );

        Texture {
            ctx: ctx.clone(),
            id,
            width,
            height,
            depth,
            format,
            levels,
            samples,
        }
    }

    /// Number of mip levels down to a single texel.
    pub fn full_mip_chain(mut width: u32, mut height: u32, mut depth: u32) -> u32 {
        let mut levels = 0;
        while width > 0 || height > 0 || depth > 0 {
            width /= 2;
            height /= 2;
            depth /= 2;
            levels += 1;
        }

        levels
    }

    #[inline]
    pub fn handle(&self) -> GLuint {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    #[inline]
    pub fn num_mip_levels(&self) -> u32 {
        self.levels
    }

    #[inline]
    pub fn num_msaa_samples(&self) -> u32 {
        self.samples
    }

    /// Dimensions of a mip level, never smaller than one texel.
    pub fn mip_size(&self, level: u32) -> [u32; 3] {
        [
            (self.width >> level).max(1),
            (self.height >> level).max(1),
            (self.depth >> level).max(1),
        ]
    }

    #[inline]
    pub(crate) fn context(&self) -> &Context {
        &self.ctx
    }

    /// Binds the texture to a texture unit if it is not bound there already.
    pub fn bind(&self, slot: usize) {
        Texture::bind_unit(&self.ctx, slot, self.id);
    }

    pub(crate) fn bind_unit(ctx: &Context, slot: usize, id: GLuint) {
        let mut state = ctx.state();
        debug_assert!(
            slot < state.textures.len(),
            "Texture slot {} exceeds the tracked range of {}.",
            slot,
            state.textures.len()
        );

        if state.textures.get(slot) != Some(&id) {
            ctx.device().bind_texture_unit(slot as GLuint, id);
            if let Some(v) = state.textures.get_mut(slot) {
                *v = id;
            }
        }
    }

    /// Unbinds whatever is bound to the texture unit.
    pub fn reset_binding(ctx: &Context, slot: usize) {
        Texture::bind_unit(ctx, slot, 0);
    }

    /// Binds all layers of the top mip level as image. Image bindings are not cached.
    pub fn bind_image(&self, slot: usize, access: ImageAccess, format: TextureFormat) {
        self.bind_image_level(slot, access, format, 0, None)
    }

    /// Binds a mip level as image, either all layers or a single one.
    pub fn bind_image_level(
        &self,
        slot: usize,
        access: ImageAccess,
        format: TextureFormat,
        level: u32,
        layer: Option<u32>,
    ) {
        debug_assert!(level < self.levels, "Mip level {} does not exist.", level);
        self.ctx.device().bind_image_texture(
            slot as GLuint,
            self.id,
            level,
            layer,
            access.into(),
            format.into(),
        );
    }

    pub fn reset_image_binding(ctx: &Context, slot: usize) {
        ctx.device()
            .bind_image_texture(slot as GLuint, 0, 0, None, gl::READ_ONLY, gl::R8);
    }

    /// Reads back a whole mip level.
    pub fn read_image(
        &self,
        level: u32,
        format: TextureReadFormat,
        ty: TextureReadType,
        out: &mut [u8],
    ) -> Result<()> {
        debug_assert!(level < self.levels, "Mip level {} does not exist.", level);

        let [w, h, d] = self.mip_size(level);
        debug_assert!(
            out.len() >= image_bytes(&[w, h, d], ty.pixel_size(format)),
            "Output is too small for mip level {}.",
            level
        );

        self.ctx
            .device()
            .get_texture_image(self.id, level, format.into(), ty.into(), out);
        self.ctx.check("glGetTextureImage")
    }

    /// Clears a mip level to zero.
    pub fn clear_to_zero(&self, level: u32) -> Result<()> {
        debug_assert!(level < self.levels, "Mip level {} does not exist.", level);

        let (format, ty) = self.format.clear_format();
        self.ctx
            .device()
            .clear_tex_image(self.id, level, format.into(), ty.into());
        self.ctx.check("glClearTexImage")
    }

    /// Generates all mip levels below the top level.
    pub fn gen_mipmaps(&self) -> Result<()> {
        self.ctx.device().generate_texture_mipmap(self.id);
        self.ctx.check("glGenerateTextureMipmap")
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.ctx.state().forget_texture(self.id);
        self.ctx.device().delete_texture(self.id);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mip_chain() {
        assert_eq!(Texture::full_mip_chain(1, 1, 1), 1);
        assert_eq!(Texture::full_mip_chain(256, 256, 1), 9);
        assert_eq!(Texture::full_mip_chain(256, 16, 1), 9);
        assert_eq!(Texture::full_mip_chain(300, 200, 1), 9);
        assert_eq!(Texture::full_mip_chain(4, 4, 64), 7);
    }

    #[test]
    fn large_images() {
        assert_eq!(image_bytes(&[16, 8], 4), 512);
        assert_eq!(image_bytes(&[65536, 65536, 4], 16) as u64, 1 << 38);
        assert_eq!(image_bytes(&[u32::max_value(); 3], 16), usize::max_value());
        assert!(check_upload_size(&[0; 16], &[65536, 65536], 4).is_err());
    }
}
