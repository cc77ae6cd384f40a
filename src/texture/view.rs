use std::ops::Deref;

use gl::types::*;

use super::*;
use crate::context::Context;
use crate::errors::*;

/// A texture that shares the storage of another one, reinterpreting a range of its mip levels
/// and layers with a compatible format or target.
///
/// The driver keeps the shared storage alive, so the original may be dropped before the view.
#[derive(Debug)]
pub struct TextureView {
    texture: Texture,
    original: GLuint,
}

impl TextureView {
    /// Creates a view of `levels` (first, count) and `layers` (first, count) of `original`.
    pub fn new(
        ctx: &Context,
        original: &Texture,
        target: TextureTarget,
        format: TextureFormat,
        levels: (u32, u32),
        layers: (u32, u32),
    ) -> Result<Self> {
        let (min_level, num_levels) = levels;
        let (min_layer, num_layers) = layers;

        debug_assert!(num_levels > 0 && num_layers > 0, "Empty texture view.");
        debug_assert!(
            min_level + num_levels <= original.num_mip_levels(),
            "View exceeds the mip levels of the original."
        );

        let id = ctx.device().gen_texture();

        let [w, h, d] = original.mip_size(min_level);
        let depth = match target {
            TextureTarget::Texture3D => d,
            TextureTarget::Texture1D
            | TextureTarget::Texture2D
            | TextureTarget::Texture2DMultisample
            | TextureTarget::TextureRectangle => 1,
            _ => num_layers,
        };

        let texture = Texture::wrap(
            ctx,
            id,
            [w, h, depth],
            format,
            num_levels,
            original.num_msaa_samples(),
        );

        ctx.device().texture_view(
            id,
            target.into(),
            original.handle(),
            format.into(),
            (min_level, num_levels),
            (min_layer, num_layers),
        );
        ctx.check("glTextureView")?;

        Ok(TextureView {
            texture,
            original: original.handle(),
        })
    }

    /// Handle of the texture this view was created from.
    #[inline]
    pub fn original(&self) -> GLuint {
        self.original
    }
}

impl Deref for TextureView {
    type Target = Texture;

    #[inline]
    fn deref(&self) -> &Texture {
        &self.texture
    }
}
