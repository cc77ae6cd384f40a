//! Vertex array objects describing the vertex layout independently of the vertex buffers.

use gl::types::*;
use smallvec::SmallVec;

use crate::context::Context;

/// Element type of a vertex attribute component.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Fixed,
    Float,
    Half,
    Double,
    /// Packed, always a single component.
    Int2_10_10_10,
    /// Packed, always a single component.
    UInt2_10_10_10,
    /// Packed, always a single component.
    UInt10F11F11F,
}

impl AttributeType {
    /// Size of a single component in bytes.
    pub fn size(self) -> u32 {
        match self {
            AttributeType::Int8 | AttributeType::UInt8 => 1,
            AttributeType::Int16 | AttributeType::UInt16 | AttributeType::Half => 2,
            AttributeType::Int32
            | AttributeType::UInt32
            | AttributeType::Fixed
            | AttributeType::Float
            | AttributeType::Int2_10_10_10
            | AttributeType::UInt2_10_10_10
            | AttributeType::UInt10F11F11F => 4,
            AttributeType::Double => 8,
        }
    }

    #[inline]
    pub fn is_packed(self) -> bool {
        match self {
            AttributeType::Int2_10_10_10
            | AttributeType::UInt2_10_10_10
            | AttributeType::UInt10F11F11F => true,
            _ => false,
        }
    }

    /// Whether the shader always reads the attribute as floating point.
    fn is_floating(self) -> bool {
        match self {
            AttributeType::Float
            | AttributeType::Half
            | AttributeType::Fixed
            | AttributeType::UInt10F11F11F => true,
            _ => false,
        }
    }
}

/// How integer components are presented to the shader.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IntegerHandling {
    /// Converted to float as is.
    Float,
    /// Mapped to [0, 1] for unsigned and [-1, 1] for signed types.
    Normalized,
    /// Kept as integer.
    Integer,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub ty: AttributeType,
    pub num_components: u8,
    /// Vertex buffer binding the attribute is read from.
    pub binding: u8,
    pub integer_handling: IntegerHandling,
    /// Unused attributes take up space in the vertex but are not enabled.
    pub unused: bool,
}

impl Attribute {
    pub fn new(ty: AttributeType, num_components: u8) -> Self {
        Attribute {
            ty,
            num_components,
            binding: 0,
            integer_handling: IntegerHandling::Float,
            unused: false,
        }
    }

    pub fn with_binding(mut self, binding: u8) -> Self {
        self.binding = binding;
        self
    }

    pub fn with_integer_handling(mut self, handling: IntegerHandling) -> Self {
        self.integer_handling = handling;
        self
    }

    pub fn normalized(self) -> Self {
        self.with_integer_handling(IntegerHandling::Normalized)
    }

    /// Marks the attribute as padding.
    pub fn unused(mut self) -> Self {
        self.unused = true;
        self
    }

    /// Bytes the attribute takes up in a vertex.
    #[inline]
    pub fn size(&self) -> u32 {
        u32::from(self.num_components) * self.ty.size()
    }

    /// The component count passed to the driver. Packed types have a fixed count.
    fn gl_size(&self) -> GLint {
        match self.ty {
            AttributeType::Int2_10_10_10 | AttributeType::UInt2_10_10_10 => 4,
            AttributeType::UInt10F11F11F => 3,
            _ => GLint::from(self.num_components),
        }
    }
}

#[derive(Debug)]
pub struct VertexArrayObject {
    ctx: Context,
    id: GLuint,
    attributes: Vec<Attribute>,
    strides: SmallVec<[u32; 4]>,
}

impl VertexArrayObject {
    pub fn new(ctx: &Context, attributes: &[Attribute]) -> Self {
        VertexArrayObject::with_divisors(ctx, attributes, &[])
    }

    /// Creates the vertex array. `divisors[i]` is the instance divisor of binding `i`.
    pub fn with_divisors(ctx: &Context, attributes: &[Attribute], divisors: &[u32]) -> Self {
        let device = ctx.device();
        let id = device.create_vertex_array();

        let mut strides: SmallVec<[u32; 4]> = SmallVec::new();
        for (index, attribute) in attributes.iter().enumerate() {
            debug_assert!(
                attribute.num_components > 0 && attribute.num_components <= 4,
                "Invalid vertex attribute component number!"
            );

            debug_assert!(
                attribute.num_components == 1 || !attribute.ty.is_packed(),
                "Number of vertex components needs to be 1 for packed formats."
            );

            let binding = attribute.binding as usize;
            while strides.len() <= binding {
                strides.push(0);
            }

            let index = index as GLuint;
            let offset = strides[binding];

            if !attribute.unused {
                device.enable_vertex_array_attrib(id, index);
                device.vertex_array_attrib_binding(id, index, binding as GLuint);

                let ty = attribute.ty.into();
                let size = attribute.gl_size();

                if attribute.ty == AttributeType::Double {
                    device.vertex_array_attrib_l_format(id, index, size, ty, offset);
                } else if attribute.ty.is_floating()
                    || attribute.integer_handling != IntegerHandling::Integer
                {
                    let normalized = attribute.integer_handling == IntegerHandling::Normalized;
                    device.vertex_array_attrib_format(id, index, size, ty, normalized, offset);
                } else {
                    device.vertex_array_attrib_i_format(id, index, size, ty, offset);
                }
            }

            strides[binding] += attribute.size();
        }

        for (binding, divisor) in divisors.iter().enumerate() {
            device.vertex_array_binding_divisor(id, binding as GLuint, *divisor);
        }

        VertexArrayObject {
            ctx: ctx.clone(),
            id,
            attributes: attributes.to_vec(),
            strides,
        }
    }

    #[inline]
    pub fn handle(&self) -> GLuint {
        self.id
    }

    #[inline]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Total size of a vertex read from `binding`, zero for unused bindings.
    pub fn vertex_stride(&self, binding: usize) -> u32 {
        self.strides.get(binding).cloned().unwrap_or(0)
    }

    /// Binds the vertex array if it is not bound already.
    pub fn bind(&self) {
        let mut state = self.ctx.state();
        if state.vertex_array != self.id {
            self.ctx.device().bind_vertex_array(self.id);
            state.vertex_array = self.id;
        }
    }

    pub fn reset_binding(ctx: &Context) {
        let mut state = ctx.state();
        ctx.device().bind_vertex_array(0);
        state.vertex_array = 0;
    }
}

impl Drop for VertexArrayObject {
    fn drop(&mut self) {
        let bound = self.ctx.state().vertex_array == self.id;
        if bound {
            VertexArrayObject::reset_binding(&self.ctx);
        }

        self.ctx.device().delete_vertex_array(self.id);
    }
}
