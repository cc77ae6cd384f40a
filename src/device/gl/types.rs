use gl::types::*;

use crate::buffer::{BufferUsage, MapWriteFlags};
use crate::sampler::{Border, CompareMode};
use crate::shader::ShaderType;
use crate::state::{Cap, DepthFunc};
use crate::vertex_array::AttributeType;

/// `GL_TEXTURE_MAX_ANISOTROPY`, core since 4.6 and identical to the EXT/ARB enums.
pub const TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FE;
pub const MAX_TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FF;

impl From<Cap> for GLenum {
    fn from(cap: Cap) -> Self {
        match cap {
            Cap::Blend => gl::BLEND,
            Cap::ClipDistance0 => gl::CLIP_DISTANCE0,
            Cap::ClipDistance1 => gl::CLIP_DISTANCE1,
            Cap::ClipDistance2 => gl::CLIP_DISTANCE2,
            Cap::ClipDistance3 => gl::CLIP_DISTANCE3,
            Cap::ClipDistance4 => gl::CLIP_DISTANCE4,
            Cap::ClipDistance5 => gl::CLIP_DISTANCE5,
            Cap::ColorLogicOp => gl::COLOR_LOGIC_OP,
            Cap::CullFace => gl::CULL_FACE,
            Cap::DebugOutput => gl::DEBUG_OUTPUT,
            Cap::DebugOutputSynchronous => gl::DEBUG_OUTPUT_SYNCHRONOUS,
            Cap::DepthClamp => gl::DEPTH_CLAMP,
            Cap::DepthTest => gl::DEPTH_TEST,
            Cap::Dither => gl::DITHER,
            Cap::FramebufferSrgb => gl::FRAMEBUFFER_SRGB,
            Cap::LineSmooth => gl::LINE_SMOOTH,
            Cap::Multisample => gl::MULTISAMPLE,
            Cap::PolygonOffsetFill => gl::POLYGON_OFFSET_FILL,
            Cap::PolygonOffsetLine => gl::POLYGON_OFFSET_LINE,
            Cap::PolygonOffsetPoint => gl::POLYGON_OFFSET_POINT,
            Cap::PolygonSmooth => gl::POLYGON_SMOOTH,
            Cap::PrimitiveRestart => gl::PRIMITIVE_RESTART,
            Cap::PrimitiveRestartFixedIndex => gl::PRIMITIVE_RESTART_FIXED_INDEX,
            Cap::RasterizerDiscard => gl::RASTERIZER_DISCARD,
            Cap::SampleAlphaToCoverage => gl::SAMPLE_ALPHA_TO_COVERAGE,
            Cap::SampleAlphaToOne => gl::SAMPLE_ALPHA_TO_ONE,
            Cap::SampleCoverage => gl::SAMPLE_COVERAGE,
            Cap::SampleShading => gl::SAMPLE_SHADING,
            Cap::SampleMask => gl::SAMPLE_MASK,
            Cap::ScissorTest => gl::SCISSOR_TEST,
            Cap::StencilTest => gl::STENCIL_TEST,
            Cap::TextureCubeMapSeamless => gl::TEXTURE_CUBE_MAP_SEAMLESS,
            Cap::ProgramPointSize => gl::PROGRAM_POINT_SIZE,
        }
    }
}

impl From<DepthFunc> for GLenum {
    fn from(func: DepthFunc) -> Self {
        match func {
            DepthFunc::Never => gl::NEVER,
            DepthFunc::Less => gl::LESS,
            DepthFunc::Equal => gl::EQUAL,
            DepthFunc::LessOrEqual => gl::LEQUAL,
            DepthFunc::Greater => gl::GREATER,
            DepthFunc::NotEqual => gl::NOTEQUAL,
            DepthFunc::GreaterOrEqual => gl::GEQUAL,
            DepthFunc::Always => gl::ALWAYS,
        }
    }
}

/// Storage flags of `glNamedBufferStorage`. Explicit flushing is a property of the mapping,
/// not of the storage, so it never shows up here.
impl From<BufferUsage> for GLbitfield {
    fn from(usage: BufferUsage) -> Self {
        let mut flags = 0;

        if usage.contains(BufferUsage::MAP_WRITE) {
            flags |= gl::MAP_WRITE_BIT;
        }

        if usage.contains(BufferUsage::MAP_READ) {
            flags |= gl::MAP_READ_BIT;
        }

        if usage.contains(BufferUsage::MAP_PERSISTENT) {
            flags |= gl::MAP_PERSISTENT_BIT;
        }

        if usage.contains(BufferUsage::MAP_COHERENT) {
            flags |= gl::MAP_COHERENT_BIT;
        }

        if usage.contains(BufferUsage::SUB_DATA_UPDATE) {
            flags |= gl::DYNAMIC_STORAGE_BIT;
        }

        flags
    }
}

impl From<MapWriteFlags> for GLbitfield {
    fn from(v: MapWriteFlags) -> Self {
        let mut flags = 0;

        if v.contains(MapWriteFlags::INVALIDATE_RANGE) {
            flags |= gl::MAP_INVALIDATE_RANGE_BIT;
        }

        if v.contains(MapWriteFlags::INVALIDATE_BUFFER) {
            flags |= gl::MAP_INVALIDATE_BUFFER_BIT;
        }

        if v.contains(MapWriteFlags::FLUSH_EXPLICIT) {
            flags |= gl::MAP_FLUSH_EXPLICIT_BIT;
        }

        if v.contains(MapWriteFlags::UNSYNCHRONIZED) {
            flags |= gl::MAP_UNSYNCHRONIZED_BIT;
        }

        flags
    }
}

impl From<Border> for GLenum {
    fn from(border: Border) -> Self {
        match border {
            Border::Repeat => gl::REPEAT,
            Border::Mirror => gl::MIRRORED_REPEAT,
            Border::Clamp => gl::CLAMP_TO_EDGE,
            Border::Border => gl::CLAMP_TO_BORDER,
        }
    }
}

impl From<CompareMode> for GLenum {
    fn from(mode: CompareMode) -> Self {
        match mode {
            CompareMode::None => gl::NONE,
            CompareMode::LessEqual => gl::LEQUAL,
            CompareMode::GreaterEqual => gl::GEQUAL,
            CompareMode::Less => gl::LESS,
            CompareMode::Greater => gl::GREATER,
            CompareMode::Equal => gl::EQUAL,
            CompareMode::NotEqual => gl::NOTEQUAL,
            CompareMode::Always => gl::ALWAYS,
            CompareMode::Never => gl::NEVER,
        }
    }
}

impl From<ShaderType> for GLenum {
    fn from(ty: ShaderType) -> Self {
        match ty {
            ShaderType::Vertex => gl::VERTEX_SHADER,
            ShaderType::Fragment => gl::FRAGMENT_SHADER,
            ShaderType::TessEvaluation => gl::TESS_EVALUATION_SHADER,
            ShaderType::TessControl => gl::TESS_CONTROL_SHADER,
            ShaderType::Geometry => gl::GEOMETRY_SHADER,
            ShaderType::Compute => gl::COMPUTE_SHADER,
        }
    }
}

impl From<AttributeType> for GLenum {
    fn from(ty: AttributeType) -> Self {
        match ty {
            AttributeType::Int8 => gl::BYTE,
            AttributeType::UInt8 => gl::UNSIGNED_BYTE,
            AttributeType::Int16 => gl::SHORT,
            AttributeType::UInt16 => gl::UNSIGNED_SHORT,
            AttributeType::Int32 => gl::INT,
            AttributeType::UInt32 => gl::UNSIGNED_INT,
            AttributeType::Fixed => gl::FIXED,
            AttributeType::Float => gl::FLOAT,
            AttributeType::Half => gl::HALF_FLOAT,
            AttributeType::Double => gl::DOUBLE,
            AttributeType::Int2_10_10_10 => gl::INT_2_10_10_10_REV,
            AttributeType::UInt2_10_10_10 => gl::UNSIGNED_INT_2_10_10_10_REV,
            AttributeType::UInt10F11F11F => gl::UNSIGNED_INT_10F_11F_11F_REV,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn storage_flags() {
        let usage = BufferUsage::MAP_WRITE | BufferUsage::MAP_PERSISTENT | BufferUsage::EXPLICIT_FLUSH;
        let flags = GLbitfield::from(usage);

        assert_eq!(flags, gl::MAP_WRITE_BIT | gl::MAP_PERSISTENT_BIT);
        assert_eq!(flags & gl::MAP_FLUSH_EXPLICIT_BIT, 0);
        assert_eq!(
            GLbitfield::from(BufferUsage::SUB_DATA_UPDATE),
            gl::DYNAMIC_STORAGE_BIT
        );
    }

    #[test]
    fn map_flags() {
        let flags = MapWriteFlags::INVALIDATE_RANGE | MapWriteFlags::UNSYNCHRONIZED;
        assert_eq!(
            GLbitfield::from(flags),
            gl::MAP_INVALIDATE_RANGE_BIT | gl::MAP_UNSYNCHRONIZED_BIT
        );
    }
}
