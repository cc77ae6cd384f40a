use std::ops::Deref;

use gl::types::*;

use super::*;
use crate::context::Context;
use crate::errors::*;

/// A two-dimensional texture, optionally multisampled.
#[derive(Debug)]
pub struct Texture2D {
    texture: Texture,
}

impl Texture2D {
    /// Allocates storage for a `width` x `height` texture.
    ///
    /// `levels` of zero allocates the full mip chain, `samples` greater than zero creates a
    /// multisampled texture with a single level.
    pub fn new(
        ctx: &Context,
        width: u32,
        height: u32,
        format: TextureFormat,
        levels: u32,
        samples: u32,
    ) -> Result<Self> {
        let target = if samples > 0 {
            gl::TEXTURE_2D_MULTISAMPLE
        } else {
            gl::TEXTURE_2D
        };

        let id = ctx.device().create_texture(target);
        let texture = Texture::wrap(ctx, id, [width, height, 1], format, levels, samples);

        if samples > 0 {
            ctx.device()
                .texture_storage_2d_multisample(id, samples, format.into(), width, height);
            ctx.check("glTextureStorage2DMultisample")?;
        } else {
            ctx.device()
                .texture_storage_2d(id, texture.levels, format.into(), width, height);
            ctx.check("glTextureStorage2D")?;
        }

        Ok(Texture2D { texture })
    }

    /// Allocates storage and uploads the top mip level. Lower levels are generated from it.
    pub fn with_data(
        ctx: &Context,
        width: u32,
        height: u32,
        format: TextureFormat,
        levels: u32,
        data_format: TextureSetDataFormat,
        data_type: TextureSetDataType,
        data: &[u8],
    ) -> Result<Self> {
        let texture = Texture2D::new(ctx, width, height, format, levels, 0)?;
        texture.set_level(0, data_format, data_type, data)?;

        if texture.num_mip_levels() > 1 {
            texture.gen_mipmaps()?;
        }

        Ok(texture)
    }

    /// Uploads a rectangle of a mip level.
    pub fn set_data(
        &self,
        level: u32,
        data_format: TextureSetDataFormat,
        data_type: TextureSetDataType,
        data: &[u8],
        offset: [u32; 2],
        size: [u32; 2],
    ) -> Result<()> {
        debug_assert!(
            self.samples == 0,
            "Can not upload data to a multisampled texture."
        );
        debug_assert!(level < self.levels, "Mip level {} does not exist.", level);

        let [w, h, _] = self.mip_size(level);
        debug_assert!(
            offset[0] + size[0] <= w && offset[1] + size[1] <= h,
            "Rectangle exceeds the size of mip level {}.",
            level
        );

        check_upload_size(data, &size, data_type.pixel_size(data_format))?;

        self.ctx.device().texture_sub_image_2d(
            self.id,
            level,
            offset,
            size,
            GLenum::from(data_format),
            GLenum::from(data_type),
            data,
        );

        self.ctx.check("glTextureSubImage2D")
    }

    /// Uploads a whole mip level.
    pub fn set_level(
        &self,
        level: u32,
        data_format: TextureSetDataFormat,
        data_type: TextureSetDataType,
        data: &[u8],
    ) -> Result<()> {
        let [w, h, _] = self.mip_size(level);
        self.set_data(level, data_format, data_type, data, [0, 0], [w, h])
    }
}

impl Deref for Texture2D {
    type Target = Texture;

    #[inline]
    fn deref(&self) -> &Texture {
        &self.texture
    }
}
