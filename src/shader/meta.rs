//! Reflection data of linked programs and typed writes into mapped block memory.

use std::collections::HashMap;
use std::mem;
use std::ops::DerefMut;

use byteorder::{ByteOrder, NativeEndian};
use cgmath::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};
use gl::types::*;

use crate::errors::*;

macro_rules! variable_types {
    ($($name:ident = $gl:ident,)*) => {
        /// The GLSL type of a program resource, as reported by `GL_TYPE`.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum ShaderVariableType {
            $($name,)*
            Unknown(GLenum),
        }

        impl ShaderVariableType {
            pub fn from_gl(v: GLenum) -> ShaderVariableType {
                match v {
                    $(gl::$gl => ShaderVariableType::$name,)*
                    v => ShaderVariableType::Unknown(v),
                }
            }

            pub fn gl_enum(self) -> GLenum {
                match self {
                    $(ShaderVariableType::$name => gl::$gl,)*
                    ShaderVariableType::Unknown(v) => v,
                }
            }
        }
    };
}

variable_types! {
    Float = FLOAT,
    FloatVec2 = FLOAT_VEC2,
    FloatVec3 = FLOAT_VEC3,
    FloatVec4 = FLOAT_VEC4,
    Double = DOUBLE,
    DoubleVec2 = DOUBLE_VEC2,
    DoubleVec3 = DOUBLE_VEC3,
    DoubleVec4 = DOUBLE_VEC4,
    Int = INT,
    IntVec2 = INT_VEC2,
    IntVec3 = INT_VEC3,
    IntVec4 = INT_VEC4,
    UnsignedInt = UNSIGNED_INT,
    UnsignedIntVec2 = UNSIGNED_INT_VEC2,
    UnsignedIntVec3 = UNSIGNED_INT_VEC3,
    UnsignedIntVec4 = UNSIGNED_INT_VEC4,
    Bool = BOOL,
    BoolVec2 = BOOL_VEC2,
    BoolVec3 = BOOL_VEC3,
    BoolVec4 = BOOL_VEC4,
    FloatMat2 = FLOAT_MAT2,
    FloatMat3 = FLOAT_MAT3,
    FloatMat4 = FLOAT_MAT4,
    FloatMat2x3 = FLOAT_MAT2x3,
    FloatMat2x4 = FLOAT_MAT2x4,
    FloatMat3x2 = FLOAT_MAT3x2,
    FloatMat3x4 = FLOAT_MAT3x4,
    FloatMat4x2 = FLOAT_MAT4x2,
    FloatMat4x3 = FLOAT_MAT4x3,
    DoubleMat2 = DOUBLE_MAT2,
    DoubleMat3 = DOUBLE_MAT3,
    DoubleMat4 = DOUBLE_MAT4,
    DoubleMat2x3 = DOUBLE_MAT2x3,
    DoubleMat2x4 = DOUBLE_MAT2x4,
    DoubleMat3x2 = DOUBLE_MAT3x2,
    DoubleMat3x4 = DOUBLE_MAT3x4,
    DoubleMat4x2 = DOUBLE_MAT4x2,
    DoubleMat4x3 = DOUBLE_MAT4x3,
    Sampler1D = SAMPLER_1D,
    Sampler2D = SAMPLER_2D,
    Sampler3D = SAMPLER_3D,
    SamplerCube = SAMPLER_CUBE,
    Sampler1DShadow = SAMPLER_1D_SHADOW,
    Sampler2DShadow = SAMPLER_2D_SHADOW,
    Sampler1DArray = SAMPLER_1D_ARRAY,
    Sampler2DArray = SAMPLER_2D_ARRAY,
    Sampler1DArrayShadow = SAMPLER_1D_ARRAY_SHADOW,
    Sampler2DArrayShadow = SAMPLER_2D_ARRAY_SHADOW,
    Sampler2DMultisample = SAMPLER_2D_MULTISAMPLE,
    Sampler2DMultisampleArray = SAMPLER_2D_MULTISAMPLE_ARRAY,
    SamplerCubeShadow = SAMPLER_CUBE_SHADOW,
    SamplerBuffer = SAMPLER_BUFFER,
    Sampler2DRect = SAMPLER_2D_RECT,
    Sampler2DRectShadow = SAMPLER_2D_RECT_SHADOW,
    IntSampler1D = INT_SAMPLER_1D,
    IntSampler2D = INT_SAMPLER_2D,
    IntSampler3D = INT_SAMPLER_3D,
    IntSamplerCube = INT_SAMPLER_CUBE,
    IntSampler2DArray = INT_SAMPLER_2D_ARRAY,
    IntSamplerBuffer = INT_SAMPLER_BUFFER,
    UnsignedIntSampler1D = UNSIGNED_INT_SAMPLER_1D,
    UnsignedIntSampler2D = UNSIGNED_INT_SAMPLER_2D,
    UnsignedIntSampler3D = UNSIGNED_INT_SAMPLER_3D,
    UnsignedIntSamplerCube = UNSIGNED_INT_SAMPLER_CUBE,
    UnsignedIntSampler2DArray = UNSIGNED_INT_SAMPLER_2D_ARRAY,
    UnsignedIntSamplerBuffer = UNSIGNED_INT_SAMPLER_BUFFER,
    Image1D = IMAGE_1D,
    Image2D = IMAGE_2D,
    Image3D = IMAGE_3D,
    ImageCube = IMAGE_CUBE,
    ImageBuffer = IMAGE_BUFFER,
    Image2DArray = IMAGE_2D_ARRAY,
    Image2DMultisample = IMAGE_2D_MULTISAMPLE,
    IntImage2D = INT_IMAGE_2D,
    IntImage3D = INT_IMAGE_3D,
    IntImageBuffer = INT_IMAGE_BUFFER,
    UnsignedIntImage2D = UNSIGNED_INT_IMAGE_2D,
    UnsignedIntImage3D = UNSIGNED_INT_IMAGE_3D,
    UnsignedIntImageBuffer = UNSIGNED_INT_IMAGE_BUFFER,
    UnsignedIntAtomicCounter = UNSIGNED_INT_ATOMIC_COUNTER,
}

impl Default for ShaderVariableType {
    fn default() -> Self {
        ShaderVariableType::Float
    }
}

/// A uniform, either global or part of a uniform block.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct UniformVariableInfo {
    pub ty: ShaderVariableType,
    /// Byte offset inside the block, -1 for global uniforms.
    pub block_offset: i32,
    pub array_size: i32,
    /// Byte distance between array elements.
    pub array_stride: i32,
    pub matrix_stride: i32,
    pub row_major: bool,
    /// Location of a global uniform, -1 for block members.
    pub location: i32,
    pub atomic_counter_buffer_index: i32,
}

/// A member of a shader storage block.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BufferVariableInfo {
    pub ty: ShaderVariableType,
    pub block_offset: i32,
    pub array_size: i32,
    pub array_stride: i32,
    pub matrix_stride: i32,
    pub row_major: bool,
    pub top_level_array_size: i32,
    pub top_level_array_stride: i32,
}

/// The layout data of a block member needed to write it into memory.
pub trait VariableInfo {
    fn ty(&self) -> ShaderVariableType;
    fn block_offset(&self) -> i32;
    /// Number of array elements, 0 for arrays sized at runtime.
    fn array_size(&self) -> i32;
    fn array_stride(&self) -> i32;
    fn matrix_stride(&self) -> i32;
}

impl VariableInfo for UniformVariableInfo {
    fn ty(&self) -> ShaderVariableType {
        self.ty
    }

    fn block_offset(&self) -> i32 {
        self.block_offset
    }

    fn array_size(&self) -> i32 {
        self.array_size
    }

    fn array_stride(&self) -> i32 {
        self.array_stride
    }

    fn matrix_stride(&self) -> i32 {
        self.matrix_stride
    }
}

impl VariableInfo for BufferVariableInfo {
    fn ty(&self) -> ShaderVariableType {
        self.ty
    }

    fn block_offset(&self) -> i32 {
        self.block_offset
    }

    fn array_size(&self) -> i32 {
        self.array_size
    }

    fn array_stride(&self) -> i32 {
        self.array_stride
    }

    fn matrix_stride(&self) -> i32 {
        self.matrix_stride
    }
}

/// A uniform or shader storage block of a program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BufferInfo<V> {
    pub binding: i32,
    pub data_size: usize,
    pub variables: HashMap<String, V>,
    /// Resource index of the block inside its program interface.
    pub(crate) index: i32,
}

impl<V> BufferInfo<V> {
    pub fn new(binding: i32, data_size: usize) -> Self {
        BufferInfo {
            binding,
            data_size,
            variables: HashMap::new(),
            index: -1,
        }
    }
}

/// A value that has a GLSL counterpart and knows its memory layout in a block.
pub trait ShaderValue {
    const TYPE: ShaderVariableType;

    /// Number of bytes written, given the matrix stride of the variable.
    fn byte_size(matrix_stride: usize) -> usize;

    fn write(&self, out: &mut [u8], matrix_stride: usize);
}

macro_rules! scalar_values {
    ($($ty:ty => $var:ident, $write:ident;)*) => {
        $(
            impl ShaderValue for $ty {
                const TYPE: ShaderVariableType = ShaderVariableType::$var;

                fn byte_size(_: usize) -> usize {
                    mem::size_of::<$ty>()
                }

                fn write(&self, out: &mut [u8], _: usize) {
                    NativeEndian::$write(out, *self);
                }
            }
        )*
    };
}

scalar_values! {
    f32 => Float, write_f32;
    f64 => Double, write_f64;
    i32 => Int, write_i32;
    u32 => UnsignedInt, write_u32;
}

impl ShaderValue for bool {
    const TYPE: ShaderVariableType = ShaderVariableType::Bool;

    fn byte_size(_: usize) -> usize {
        4
    }

    fn write(&self, out: &mut [u8], _: usize) {
        NativeEndian::write_u32(out, *self as u32);
    }
}

macro_rules! vector_values {
    ($($vec:ident<$s:ty>, $n:expr => $var:ident, $write:ident;)*) => {
        $(
            impl ShaderValue for $vec<$s> {
                const TYPE: ShaderVariableType = ShaderVariableType::$var;

                fn byte_size(_: usize) -> usize {
                    $n * mem::size_of::<$s>()
                }

                fn write(&self, out: &mut [u8], _: usize) {
                    let components: &[$s; $n] = self.as_ref();
                    let size = mem::size_of::<$s>();
                    for (i, v) in components.iter().enumerate() {
                        NativeEndian::$write(&mut out[i * size..], *v);
                    }
                }
            }
        )*
    };
}

vector_values! {
    Vector2<f32>, 2 => FloatVec2, write_f32;
    Vector3<f32>, 3 => FloatVec3, write_f32;
    Vector4<f32>, 4 => FloatVec4, write_f32;
    Vector2<f64>, 2 => DoubleVec2, write_f64;
    Vector3<f64>, 3 => DoubleVec3, write_f64;
    Vector4<f64>, 4 => DoubleVec4, write_f64;
    Vector2<i32>, 2 => IntVec2, write_i32;
    Vector3<i32>, 3 => IntVec3, write_i32;
    Vector4<i32>, 4 => IntVec4, write_i32;
    Vector2<u32>, 2 => UnsignedIntVec2, write_u32;
    Vector3<u32>, 3 => UnsignedIntVec3, write_u32;
    Vector4<u32>, 4 => UnsignedIntVec4, write_u32;
}

// Columns start `matrix_stride` bytes apart, tightly packed if the stride is unknown.
macro_rules! matrix_values {
    ($($mat:ident, $n:expr => $var:ident;)*) => {
        $(
            impl ShaderValue for $mat<f32> {
                const TYPE: ShaderVariableType = ShaderVariableType::$var;

                fn byte_size(matrix_stride: usize) -> usize {
                    let stride = if matrix_stride > 0 { matrix_stride } else { $n * 4 };
                    ($n - 1) * stride + $n * 4
                }

                fn write(&self, out: &mut [u8], matrix_stride: usize) {
                    let stride = if matrix_stride > 0 { matrix_stride } else { $n * 4 };
                    let columns: &[[f32; $n]; $n] = self.as_ref();
                    for (c, column) in columns.iter().enumerate() {
                        for (r, v) in column.iter().enumerate() {
                            NativeEndian::write_f32(&mut out[c * stride + r * 4..], *v);
                        }
                    }
                }
            }
        )*
    };
}

matrix_values! {
    Matrix2, 2 => FloatMat2;
    Matrix3, 3 => FloatMat3;
    Matrix4, 4 => FloatMat4;
}

/// Writes typed values into the mapped memory of a block, addressed by variable name.
///
/// `map_offset` is the offset of the start of `memory` inside the block.
pub struct MappedMemoryView<'a, V: 'a, M> {
    info: &'a BufferInfo<V>,
    memory: M,
    map_offset: usize,
}

impl<'a, V, M> MappedMemoryView<'a, V, M>
where
    V: VariableInfo,
    M: DerefMut<Target = [u8]>,
{
    pub fn new(info: &'a BufferInfo<V>, memory: M, map_offset: usize) -> Self {
        MappedMemoryView {
            info,
            memory,
            map_offset,
        }
    }

    #[inline]
    pub fn info(&self) -> &BufferInfo<V> {
        self.info
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.info.variables.contains_key(name)
    }

    /// Writes `value` to the variable `name`.
    pub fn set<T: ShaderValue>(&mut self, name: &str, value: T) -> Result<()> {
        self.set_element(name, 0, value)
    }

    /// Writes `value` to element `index` of the array variable `name`.
    pub fn set_element<T: ShaderValue>(&mut self, name: &str, index: usize, value: T) -> Result<()> {
        let variable = match self.info.variables.get(name) {
            Some(v) => v,
            None => {
                error!("Shader variable '{}' does not exist in the mapped block.", name);
                return Err(Error::UnknownVariable(name.to_owned()));
            }
        };

        debug_assert!(
            variable.ty() == T::TYPE,
            "Variable type does not match! '{}' is {:?} but got {:?}.",
            name,
            variable.ty(),
            T::TYPE
        );

        debug_assert!(
            variable.array_size() <= 0 || index < variable.array_size() as usize,
            "Index {} exceeds the {} elements of '{}'.",
            index,
            variable.array_size(),
            name
        );

        let matrix_stride = variable.matrix_stride().max(0) as usize;
        let size = T::byte_size(matrix_stride);
        let offset = (variable.array_stride().max(0) as usize)
            .checked_mul(index)
            .and_then(|v| v.checked_add(variable.block_offset().max(0) as usize));

        debug_assert!(
            offset.map_or(false, |v| v + size <= self.info.data_size),
            "Variable '{}' exceeds the block's data size.",
            name
        );

        let range = offset
            .and_then(|v| v.checked_sub(self.map_offset))
            .and_then(|start| start.checked_add(size).map(|end| (start, end)));

        let (start, end) = match range {
            Some((start, end)) if end <= self.memory.len() => (start, end),
            _ => {
                error!("Variable '{}' is outside of the mapped memory area.", name);
                return Err(Error::Usage("variable outside of the mapped memory area"));
            }
        };

        value.write(&mut self.memory[start..end], matrix_stride);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cgmath::SquareMatrix;

    fn block() -> BufferInfo<UniformVariableInfo> {
        let mut info = BufferInfo::new(0, 128);
        info.variables.insert(
            "scale".into(),
            UniformVariableInfo {
                ty: ShaderVariableType::Float,
                block_offset: 0,
                ..Default::default()
            },
        );

        info.variables.insert(
            "color".into(),
            UniformVariableInfo {
                ty: ShaderVariableType::FloatVec4,
                block_offset: 16,
                ..Default::default()
            },
        );

        info.variables.insert(
            "transform".into(),
            UniformVariableInfo {
                ty: ShaderVariableType::FloatMat3,
                block_offset: 32,
                matrix_stride: 16,
                ..Default::default()
            },
        );

        info.variables.insert(
            "weights".into(),
            UniformVariableInfo {
                ty: ShaderVariableType::Int,
                block_offset: 80,
                array_size: 4,
                array_stride: 16,
                ..Default::default()
            },
        );

        info
    }

    #[test]
    fn type_enums() {
        assert_eq!(ShaderVariableType::from_gl(gl::FLOAT_VEC3), ShaderVariableType::FloatVec3);
        assert_eq!(ShaderVariableType::FloatMat4.gl_enum(), gl::FLOAT_MAT4);
        assert_eq!(ShaderVariableType::from_gl(0x1234), ShaderVariableType::Unknown(0x1234));
    }

    #[test]
    fn typed_writes() {
        let info = block();
        let mut memory = vec![0u8; 128];

        {
            let mut view = MappedMemoryView::new(&info, &mut memory[..], 0);
            view.set("scale", 2.0f32).unwrap();
            view.set("color", Vector4::new(1.0f32, 0.5, 0.25, 0.0)).unwrap();
            view.set("transform", Matrix3::<f32>::identity()).unwrap();
            view.set_element("weights", 2, -7i32).unwrap();
            assert!(view.set("missing", 1.0f32).is_err());
        }

        assert_eq!(NativeEndian::read_f32(&memory[0..]), 2.0);
        assert_eq!(NativeEndian::read_f32(&memory[20..]), 0.5);
        assert_eq!(NativeEndian::read_f32(&memory[32..]), 1.0);
        assert_eq!(NativeEndian::read_f32(&memory[36..]), 0.0);
        // Second column starts one matrix stride later.
        assert_eq!(NativeEndian::read_f32(&memory[52..]), 1.0);
        assert_eq!(NativeEndian::read_f32(&memory[72..]), 1.0);
        assert_eq!(NativeEndian::read_i32(&memory[112..]), -7);
    }

    #[test]
    fn partial_mapping() {
        let info = block();
        let mut memory = vec![0u8; 64];

        {
            let mut view = MappedMemoryView::new(&info, &mut memory[..], 16);
            view.set("color", Vector4::new(1.0f32, 2.0, 3.0, 4.0)).unwrap();
        }

        assert_eq!(NativeEndian::read_f32(&memory[0..]), 1.0);
        assert_eq!(NativeEndian::read_f32(&memory[12..]), 4.0);
    }

    #[test]
    fn writes_outside_the_mapping() {
        let info = block();
        let mut memory = vec![0u8; 32];

        {
            let mut view = MappedMemoryView::new(&info, &mut memory[..], 16);
            // In front of the mapped range.
            assert!(view.set("scale", 1.0f32).is_err());
            // Behind the mapped range.
            assert!(view.set_element("weights", 1, 3i32).is_err());
            view.set("color", Vector4::new(1.0f32, 1.0, 1.0, 1.0)).unwrap();
        }

        assert_eq!(&memory[16..], &[0; 16]);
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn element_index_out_of_bounds() {
        let info = block();
        let mut memory = vec![0u8; 128];

        let mut view = MappedMemoryView::new(&info, &mut memory[..], 0);
        let _ = view.set_element("weights", 4, 1i32);
    }
}
