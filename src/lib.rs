//! # What is This?
//!
//! `glhelper` is a small set of typed wrappers around OpenGL 4.5 objects. Every wrapper owns
//! exactly one driver handle and releases it when dropped. Binding calls go through a
//! `Context`, which remembers what is bound to each slot and skips calls that would not change
//! anything.
//!
//! The driver itself sits behind the `Device` trait. `GLDevice` forwards to the `gl` crate,
//! while `HeadlessDevice` simulates the driver and records calls, which is what the test-suite
//! uses.
//!
//! ```rust,ignore
//! use glhelper::prelude::*;
//!
//! let device = unsafe { GLDevice::new()? };
//! let ctx = Context::new(Rc::new(device), Settings::default());
//!
//! let mut ring = PersistentRingBuffer::new(&ctx, 4 * 1024 * 1024)?;
//! let (block, memory) = ring.add_block(256, 256)?;
//! memory[..4].copy_from_slice(&[1, 2, 3, 4]);
//! ring.flush_all_blocks();
//! ring.bind_block_as_uniform_buffer(0, block);
//! ring.complete_frame()?;
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

pub extern crate cgmath;
pub extern crate gl;

pub mod errors;
pub mod settings;

pub mod context;
pub mod device;
pub mod state;

pub mod buffer;
pub mod framebuffer;
pub mod ring_buffer;
pub mod sampler;
pub mod screen_triangle;
pub mod shader;
pub mod texture;
pub mod vertex_array;
pub mod views;

pub mod prelude {
    pub use crate::buffer::{Buffer, BufferUsage, MapType, MapWriteFlags, SharedBuffer};
    pub use crate::context::Context;
    pub use crate::device::gl::GLDevice;
    pub use crate::device::headless::HeadlessDevice;
    pub use crate::device::{DebugSeverity, Device, Limits};
    pub use crate::errors::{Error, Result};
    pub use crate::framebuffer::{Attachment, FramebufferObject, Rect};
    pub use crate::ring_buffer::PersistentRingBuffer;
    pub use crate::sampler::{Border, CompareMode, Filter, SamplerCache, SamplerDesc, SamplerObject};
    pub use crate::screen_triangle::ScreenAlignedTriangle;
    pub use crate::settings::Settings;
    pub use crate::shader::meta::{
        BufferInfo, BufferVariableInfo, MappedMemoryView, ShaderVariableType, UniformVariableInfo,
    };
    pub use crate::shader::{ProgramBinary, ShaderObject, ShaderType};
    pub use crate::state::{Cap, CapState, DepthFunc};
    pub use crate::texture::{
        ImageAccess, Texture, Texture2D, Texture3D, TextureBufferFormat, TextureFormat,
        TextureSetDataFormat, TextureSetDataType, TextureTarget, TextureView,
    };
    pub use crate::vertex_array::{Attribute, AttributeType, IntegerHandling, VertexArrayObject};
    pub use crate::views::{ShaderStorageBufferView, TextureBufferView, UniformBufferView};
}
