//! A single triangle covering the whole viewport, for fullscreen passes.

use byteorder::{ByteOrder, NativeEndian};

use crate::buffer::{Buffer, BufferUsage};
use crate::context::Context;
use crate::errors::*;
use crate::vertex_array::{Attribute, AttributeType, VertexArrayObject};

const VERTICES: [f32; 6] = [-1.0, 1.0, 3.0, 1.0, -1.0, -3.0];

#[derive(Debug)]
pub struct ScreenAlignedTriangle {
    vertices: Buffer,
    vao: VertexArrayObject,
}

impl ScreenAlignedTriangle {
    pub fn new(ctx: &Context) -> Result<Self> {
        let mut bytes = [0u8; 24];
        NativeEndian::write_f32_into(&VERTICES, &mut bytes);

        let vertices = Buffer::new(ctx, bytes.len(), BufferUsage::IMMUTABLE, Some(&bytes))?;
        let vao = VertexArrayObject::new(ctx, &[Attribute::new(AttributeType::Float, 2)]);

        Ok(ScreenAlignedTriangle { vertices, vao })
    }

    /// Draws the triangle with whatever program is active.
    pub fn draw(&self) {
        self.vao.bind();
        self.vertices
            .bind_vertex_buffer(0, 0, self.vao.vertex_stride(0));
        self.vertices.context().device().draw_arrays(gl::TRIANGLES, 0, 3);
    }
}
