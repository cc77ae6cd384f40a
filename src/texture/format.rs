use gl::types::*;

/// Sized internal formats of texture storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8,
    R8Snorm,
    R16,
    R16F,
    R32F,
    R8I,
    R8UI,
    R16I,
    R16UI,
    R32I,
    R32UI,
    RG8,
    RG8Snorm,
    RG16,
    RG16F,
    RG32F,
    RG8I,
    RG8UI,
    RG16I,
    RG16UI,
    RG32I,
    RG32UI,
    RGB8,
    RGB16F,
    RGB32F,
    R11FG11FB10F,
    RGB9E5,
    SRGB8,
    RGBA8,
    RGBA8Snorm,
    RGBA16,
    RGBA16F,
    RGBA32F,
    RGBA8I,
    RGBA8UI,
    RGBA16I,
    RGBA16UI,
    RGBA32I,
    RGBA32UI,
    RGB10A2,
    SRGB8Alpha8,
    Depth16,
    Depth24,
    Depth32F,
    Depth24Stencil8,
    Depth32FStencil8,
}

impl TextureFormat {
    #[inline]
    pub fn is_depth(self) -> bool {
        match self {
            TextureFormat::Depth16
            | TextureFormat::Depth24
            | TextureFormat::Depth32F
            | TextureFormat::Depth24Stencil8
            | TextureFormat::Depth32FStencil8 => true,
            _ => false,
        }
    }

    #[inline]
    pub fn has_stencil(self) -> bool {
        match self {
            TextureFormat::Depth24Stencil8 | TextureFormat::Depth32FStencil8 => true,
            _ => false,
        }
    }

    #[inline]
    pub fn is_integer(self) -> bool {
        match self {
            TextureFormat::R8I
            | TextureFormat::R8UI
            | TextureFormat::R16I
            | TextureFormat::R16UI
            | TextureFormat::R32I
            | TextureFormat::R32UI
            | TextureFormat::RG8I
            | TextureFormat::RG8UI
            | TextureFormat::RG16I
            | TextureFormat::RG16UI
            | TextureFormat::RG32I
            | TextureFormat::RG32UI
            | TextureFormat::RGBA8I
            | TextureFormat::RGBA8UI
            | TextureFormat::RGBA16I
            | TextureFormat::RGBA16UI
            | TextureFormat::RGBA32I
            | TextureFormat::RGBA32UI => true,
            _ => false,
        }
    }

    /// Number of channels of the format.
    pub fn components(self) -> usize {
        match self {
            TextureFormat::R8
            | TextureFormat::R8Snorm
            | TextureFormat::R16
            | TextureFormat::R16F
            | TextureFormat::R32F
            | TextureFormat::R8I
            | TextureFormat::R8UI
            | TextureFormat::R16I
            | TextureFormat::R16UI
            | TextureFormat::R32I
            | TextureFormat::R32UI
            | TextureFormat::Depth16
            | TextureFormat::Depth24
            | TextureFormat::Depth32F => 1,
            TextureFormat::RG8
            | TextureFormat::RG8Snorm
            | TextureFormat::RG16
            | TextureFormat::RG16F
            | TextureFormat::RG32F
            | TextureFormat::RG8I
            | TextureFormat::RG8UI
            | TextureFormat::RG16I
            | TextureFormat::RG16UI
            | TextureFormat::RG32I
            | TextureFormat::RG32UI
            | TextureFormat::Depth24Stencil8
            | TextureFormat::Depth32FStencil8 => 2,
            TextureFormat::RGB8
            | TextureFormat::RGB16F
            | TextureFormat::RGB32F
            | TextureFormat::R11FG11FB10F
            | TextureFormat::RGB9E5
            | TextureFormat::SRGB8 => 3,
            _ => 4,
        }
    }

    /// The client format and type used to clear a texture of this format to zero.
    pub fn clear_format(self) -> (TextureSetDataFormat, TextureSetDataType) {
        if self.has_stencil() {
            let ty = if self == TextureFormat::Depth32FStencil8 {
                TextureSetDataType::Float32UnsignedInt248Rev
            } else {
                TextureSetDataType::UnsignedInt248
            };

            return (TextureSetDataFormat::DepthStencil, ty);
        }

        if self.is_depth() {
            return (TextureSetDataFormat::DepthComponent, TextureSetDataType::Float);
        }

        let integer = self.is_integer();
        let format = match (self.components(), integer) {
            (1, false) => TextureSetDataFormat::Red,
            (2, false) => TextureSetDataFormat::RG,
            (3, false) => TextureSetDataFormat::RGB,
            (_, false) => TextureSetDataFormat::RGBA,
            (1, true) => TextureSetDataFormat::RedInteger,
            (2, true) => TextureSetDataFormat::RGInteger,
            (3, true) => TextureSetDataFormat::RGBInteger,
            (_, true) => TextureSetDataFormat::RGBAInteger,
        };

        let ty = if integer {
            TextureSetDataType::UnsignedInt
        } else {
            TextureSetDataType::Float
        };

        (format, ty)
    }
}

/// Client side pixel layouts, used to upload and read back texture data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureSetDataFormat {
    Red,
    RG,
    RGB,
    BGR,
    RGBA,
    BGRA,
    RedInteger,
    RGInteger,
    RGBInteger,
    BGRInteger,
    RGBAInteger,
    BGRAInteger,
    StencilIndex,
    DepthComponent,
    DepthStencil,
}

impl TextureSetDataFormat {
    pub fn components(self) -> usize {
        match self {
            TextureSetDataFormat::Red
            | TextureSetDataFormat::RedInteger
            | TextureSetDataFormat::StencilIndex
            | TextureSetDataFormat::DepthComponent => 1,
            TextureSetDataFormat::RG
            | TextureSetDataFormat::RGInteger
            | TextureSetDataFormat::DepthStencil => 2,
            TextureSetDataFormat::RGB
            | TextureSetDataFormat::BGR
            | TextureSetDataFormat::RGBInteger
            | TextureSetDataFormat::BGRInteger => 3,
            _ => 4,
        }
    }
}

/// Client side component types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureSetDataType {
    UnsignedByte,
    Byte,
    UnsignedShort,
    Short,
    UnsignedInt,
    Int,
    HalfFloat,
    Float,
    UnsignedInt248,
    Float32UnsignedInt248Rev,
    UnsignedInt10F11F11FRev,
    UnsignedInt2101010Rev,
}

impl TextureSetDataType {
    /// Size in bytes of one pixel with `format`. Packed types hold a whole pixel.
    pub fn pixel_size(self, format: TextureSetDataFormat) -> usize {
        let component = match self {
            TextureSetDataType::UnsignedByte | TextureSetDataType::Byte => 1,
            TextureSetDataType::UnsignedShort
            | TextureSetDataType::Short
            | TextureSetDataType::HalfFloat => 2,
            TextureSetDataType::UnsignedInt | TextureSetDataType::Int | TextureSetDataType::Float => {
                4
            }
            TextureSetDataType::UnsignedInt248
            | TextureSetDataType::UnsignedInt10F11F11FRev
            | TextureSetDataType::UnsignedInt2101010Rev => return 4,
            TextureSetDataType::Float32UnsignedInt248Rev => return 8,
        };

        component * format.components()
    }
}

pub type TextureReadFormat = TextureSetDataFormat;
pub type TextureReadType = TextureSetDataType;

/// Targets a texture view can reinterpret its original as.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture2DMultisample,
    Texture2DMultisampleArray,
    Texture3D,
    TextureCubeMap,
    TextureCubeMapArray,
    TextureRectangle,
}

/// Access of image load/store bindings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImageAccess {
    Read,
    Write,
    ReadWrite,
}

/// Internal formats a texture buffer can interpret its buffer with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureBufferFormat {
    R8,
    R16,
    R16F,
    R32F,
    R8I,
    R16I,
    R32I,
    R8UI,
    R16UI,
    R32UI,
    RG8,
    RG16,
    RG16F,
    RG32F,
    RG8I,
    RG16I,
    RG32I,
    RG8UI,
    RG16UI,
    RG32UI,
    RGB32F,
    RGB32I,
    RGB32UI,
    RGBA8,
    RGBA16,
    RGBA16F,
    RGBA32F,
    RGBA8I,
    RGBA16I,
    RGBA32I,
    RGBA8UI,
    RGBA16UI,
    RGBA32UI,
}

impl From<TextureFormat> for GLenum {
    fn from(format: TextureFormat) -> Self {
        match format {
            TextureFormat::R8 => gl::R8,
            TextureFormat::R8Snorm => gl::R8_SNORM,
            TextureFormat::R16 => gl::R16,
            TextureFormat::R16F => gl::R16F,
            TextureFormat::R32F => gl::R32F,
            TextureFormat::R8I => gl::R8I,
            TextureFormat::R8UI => gl::R8UI,
            TextureFormat::R16I => gl::R16I,
            TextureFormat::R16UI => gl::R16UI,
            TextureFormat::R32I => gl::R32I,
            TextureFormat::R32UI => gl::R32UI,
            TextureFormat::RG8 => gl::RG8,
            TextureFormat::RG8Snorm => gl::RG8_SNORM,
            TextureFormat::RG16 => gl::RG16,
            TextureFormat::RG16F => gl::RG16F,
            TextureFormat::RG32F => gl::RG32F,
            TextureFormat::RG8I => gl::RG8I,
            TextureFormat::RG8UI => gl::RG8UI,
            TextureFormat::RG16I => gl::RG16I,
            TextureFormat::RG16UI => gl::RG16UI,
            TextureFormat::RG32I => gl::RG32I,
            TextureFormat::RG32UI => gl::RG32UI,
            TextureFormat::RGB8 => gl::RGB8,
            TextureFormat::RGB16F => gl::RGB16F,
            TextureFormat::RGB32F => gl::RGB32F,
            TextureFormat::R11FG11FB10F => gl::R11F_G11F_B10F,
            TextureFormat::RGB9E5 => gl::RGB9_E5,
            TextureFormat::SRGB8 => gl::SRGB8,
            TextureFormat::RGBA8 => gl::RGBA8,
            TextureFormat::RGBA8Snorm => gl::RGBA8_SNORM,
            TextureFormat::RGBA16 => gl::RGBA16,
            TextureFormat::RGBA16F => gl::RGBA16F,
            TextureFormat::RGBA32F => gl::RGBA32F,
            TextureFormat::RGBA8I => gl::RGBA8I,
            TextureFormat::RGBA8UI => gl::RGBA8UI,
            TextureFormat::RGBA16I => gl::RGBA16I,
            TextureFormat::RGBA16UI => gl::RGBA16UI,
            TextureFormat::RGBA32I => gl::RGBA32I,
            TextureFormat::RGBA32UI => gl::RGBA32UI,
            TextureFormat::RGB10A2 => gl::RGB10_A2,
            TextureFormat::SRGB8Alpha8 => gl::SRGB8_ALPHA8,
            TextureFormat::Depth16 => gl::DEPTH_COMPONENT16,
            TextureFormat::Depth24 => gl::DEPTH_COMPONENT24,
            TextureFormat::Depth32F => gl::DEPTH_COMPONENT32F,
            TextureFormat::Depth24Stencil8 => gl::DEPTH24_STENCIL8,
            TextureFormat::Depth32FStencil8 => gl::DEPTH32F_STENCIL8,
        }
    }
}

impl From<TextureSetDataFormat> for GLenum {
    fn from(format: TextureSetDataFormat) -> Self {
        match format {
            TextureSetDataFormat::Red => gl::RED,
            TextureSetDataFormat::RG => gl::RG,
            TextureSetDataFormat::RGB => gl::RGB,
            TextureSetDataFormat::BGR => gl::BGR,
            TextureSetDataFormat::RGBA => gl::RGBA,
            TextureSetDataFormat::BGRA => gl::BGRA,
            TextureSetDataFormat::RedInteger => gl::RED_INTEGER,
            TextureSetDataFormat::RGInteger => gl::RG_INTEGER,
            TextureSetDataFormat::RGBInteger => gl::RGB_INTEGER,
            TextureSetDataFormat::BGRInteger => gl::BGR_INTEGER,
            TextureSetDataFormat::RGBAInteger => gl::RGBA_INTEGER,
            TextureSetDataFormat::BGRAInteger => gl::BGRA_INTEGER,
            TextureSetDataFormat::StencilIndex => gl::STENCIL_INDEX,
            TextureSetDataFormat::DepthComponent => gl::DEPTH_COMPONENT,
            TextureSetDataFormat::DepthStencil => gl::DEPTH_STENCIL,
        }
    }
}

impl From<TextureSetDataType> for GLenum {
    fn from(ty: TextureSetDataType) -> Self {
        match ty {
            TextureSetDataType::UnsignedByte => gl::UNSIGNED_BYTE,
            TextureSetDataType::Byte => gl::BYTE,
            TextureSetDataType::UnsignedShort => gl::UNSIGNED_SHORT,
            TextureSetDataType::Short => gl::SHORT,
            TextureSetDataType::UnsignedInt => gl::UNSIGNED_INT,
            TextureSetDataType::Int => gl::INT,
            TextureSetDataType::HalfFloat => gl::HALF_FLOAT,
            TextureSetDataType::Float => gl::FLOAT,
            TextureSetDataType::UnsignedInt248 => gl::UNSIGNED_INT_24_8,
            TextureSetDataType::Float32UnsignedInt248Rev => gl::FLOAT_32_UNSIGNED_INT_24_8_REV,
            TextureSetDataType::UnsignedInt10F11F11FRev => gl::UNSIGNED_INT_10F_11F_11F_REV,
            TextureSetDataType::UnsignedInt2101010Rev => gl::UNSIGNED_INT_2_10_10_10_REV,
        }
    }
}

impl From<TextureTarget> for GLenum {
    fn from(target: TextureTarget) -> Self {
        match target {
            TextureTarget::Texture1D => gl::TEXTURE_1D,
            TextureTarget::Texture1DArray => gl::TEXTURE_1D_ARRAY,
            TextureTarget::Texture2D => gl::TEXTURE_2D,
            TextureTarget::Texture2DArray => gl::TEXTURE_2D_ARRAY,
            TextureTarget::Texture2DMultisample => gl::TEXTURE_2D_MULTISAMPLE,
            TextureTarget::Texture2DMultisampleArray => gl::TEXTURE_2D_MULTISAMPLE_ARRAY,
            TextureTarget::Texture3D => gl::TEXTURE_3D,
            TextureTarget::TextureCubeMap => gl::TEXTURE_CUBE_MAP,
            TextureTarget::TextureCubeMapArray => gl::TEXTURE_CUBE_MAP_ARRAY,
            TextureTarget::TextureRectangle => gl::TEXTURE_RECTANGLE,
        }
    }
}

impl From<ImageAccess> for GLenum {
    fn from(access: ImageAccess) -> Self {
        match access {
            ImageAccess::Read => gl::READ_ONLY,
            ImageAccess::Write => gl::WRITE_ONLY,
            ImageAccess::ReadWrite => gl::READ_WRITE,
        }
    }
}

impl From<TextureBufferFormat> for GLenum {
    fn from(format: TextureBufferFormat) -> Self {
        match format {
            TextureBufferFormat::R8 => gl::R8,
            TextureBufferFormat::R16 => gl::R16,
            TextureBufferFormat::R16F => gl::R16F,
            TextureBufferFormat::R32F => gl::R32F,
            TextureBufferFormat::R8I => gl::R8I,
            TextureBufferFormat::R16I => gl::R16I,
            TextureBufferFormat::R32I => gl::R32I,
            TextureBufferFormat::R8UI => gl::R8UI,
            TextureBufferFormat::R16UI => gl::R16UI,
            TextureBufferFormat::R32UI => gl::R32UI,
            TextureBufferFormat::RG8 => gl::RG8,
            TextureBufferFormat::RG16 => gl::RG16,
            TextureBufferFormat::RG16F => gl::RG16F,
            TextureBufferFormat::RG32F => gl::RG32F,
            TextureBufferFormat::RG8I => gl::RG8I,
            TextureBufferFormat::RG16I => gl::RG16I,
            TextureBufferFormat::RG32I => gl::RG32I,
            TextureBufferFormat::RG8UI => gl::RG8UI,
            TextureBufferFormat::RG16UI => gl::RG16UI,
            TextureBufferFormat::RG32UI => gl::RG32UI,
            TextureBufferFormat::RGB32F => gl::RGB32F,
            TextureBufferFormat::RGB32I => gl::RGB32I,
            TextureBufferFormat::RGB32UI => gl::RGB32UI,
            TextureBufferFormat::RGBA8 => gl::RGBA8,
            TextureBufferFormat::RGBA16 => gl::RGBA16,
            TextureBufferFormat::RGBA16F => gl::RGBA16F,
            TextureBufferFormat::RGBA32F => gl::RGBA32F,
            TextureBufferFormat::RGBA8I => gl::RGBA8I,
            TextureBufferFormat::RGBA16I => gl::RGBA16I,
            TextureBufferFormat::RGBA32I => gl::RGBA32I,
            TextureBufferFormat::RGBA8UI => gl::RGBA8UI,
            TextureBufferFormat::RGBA16UI => gl::RGBA16UI,
            TextureBufferFormat::RGBA32UI => gl::RGBA32UI,
        }
    }
}
