//! Views that interpret a shared `Buffer` as uniform block, shader storage block or buffer
//! texture.

pub mod shader_storage_buffer;
pub mod texture_buffer;
pub mod uniform_buffer;

pub use self::shader_storage_buffer::ShaderStorageBufferView;
pub use self::texture_buffer::TextureBufferView;
pub use self::uniform_buffer::UniformBufferView;
