use std::ops::Deref;

use gl::types::*;

use super::*;
use crate::context::Context;
use crate::errors::*;

/// A volume texture.
#[derive(Debug)]
pub struct Texture3D {
    texture: Texture,
}

impl Texture3D {
    pub fn new(
        ctx: &Context,
        width: u32,
        height: u32,
        depth: u32,
        format: TextureFormat,
        levels: u32,
    ) -> Result<Self> {
        let id = ctx.device().create_texture(gl::TEXTURE_3D);
        let texture = Texture::wrap(ctx, id, [width, height, depth], format, levels, 0);

        ctx.device()
            .texture_storage_3d(id, texture.levels, format.into(), width, height, depth);
        ctx.check("glTextureStorage3D")?;

        Ok(Texture3D { texture })
    }

    /// Uploads a box of a mip level.
    pub fn set_data(
        &self,
        level: u32,
        data_format: TextureSetDataFormat,
        data_type: TextureSetDataType,
        data: &[u8],
        offset: [u32; 3],
        size: [u32; 3],
    ) -> Result<()> {
        debug_assert!(level < self.levels, "Mip level {} does not exist.", level);

        let [w, h, d] = self.mip_size(level);
        debug_assert!(
            offset[0] + size[0] <= w && offset[1] + size[1] <= h && offset[2] + size[2] <= d,
            "Box exceeds the size of mip level {}.",
            level
        );

        check_upload_size(data, &size, data_type.pixel_size(data_format))?;

        self.ctx.device().texture_sub_image_3d(
            self.id,
            level,
            offset,
            size,
            GLenum::from(data_format),
            GLenum::from(data_type),
            data,
        );

        self.ctx.check("glTextureSubImage3D")
    }

    pub fn set_level(
        &self,
        level: u32,
        data_format: TextureSetDataFormat,
        data_type: TextureSetDataType,
        data: &[u8],
    ) -> Result<()> {
        let size = self.mip_size(level);
        self.set_data(level, data_format, data_type, data, [0, 0, 0], size)
    }
}

impl Deref for Texture3D {
    type Target = Texture;

    #[inline]
    fn deref(&self) -> &Texture {
        &self.texture
    }
}
