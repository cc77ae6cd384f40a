//! The OpenGL implementation of `Device`, forwarding to the functions loaded by the `gl` crate.

pub mod capabilities;
pub mod device;
pub mod types;

pub use self::device::GLDevice;
