use std::cell::RefMut;

use crate::buffer::{Buffer, BufferUsage, MapType, MapWriteFlags, SharedBuffer};
use crate::context::Context;
use crate::errors::*;
use crate::shader::meta::{BufferInfo, MappedMemoryView, UniformVariableInfo};
use crate::shader::ShaderObject;

/// A buffer used as the backing store of a uniform block, optionally with the block's layout.
#[derive(Debug)]
pub struct UniformBufferView {
    buffer: SharedBuffer,
    name: String,
    info: BufferInfo<UniformVariableInfo>,
}

impl UniformBufferView {
    /// Wraps an existing buffer, which needs the `MAP_WRITE` usage flag.
    pub fn from_buffer<T: Into<String>>(buffer: SharedBuffer, name: T) -> Result<Self> {
        let (usage, size) = {
            let b = buffer.borrow();
            (b.usage(), b.size())
        };

        if !usage.contains(BufferUsage::MAP_WRITE) {
            let name = name.into();
            error!("Uniform buffer {} needs at least the MAP_WRITE usage flag.", name);
            return Err(Error::Usage("uniform buffer views need MAP_WRITE"));
        }

        Ok(UniformBufferView {
            buffer,
            name: name.into(),
            info: BufferInfo::new(-1, size),
        })
    }

    /// Creates a new buffer of `size` bytes. `MAP_WRITE` is always added to `usage`.
    pub fn new<T: Into<String>>(
        ctx: &Context,
        size: usize,
        name: T,
        usage: BufferUsage,
    ) -> Result<Self> {
        let buffer = Buffer::new_shared(ctx, size, usage | BufferUsage::MAP_WRITE, None)?;
        UniformBufferView::from_buffer(buffer, name)
    }

    /// Creates a buffer matching the size and layout of the uniform block `block` of `shader`.
    pub fn from_shader(
        ctx: &Context,
        shader: &ShaderObject,
        block: &str,
        usage: BufferUsage,
    ) -> Result<Self> {
        UniformBufferView::from_shaders(ctx, &[shader], block, usage)
    }

    /// Creates a buffer for the uniform block `block` shared by several shaders. Variables of
    /// all shaders are merged, mismatching sizes or layouts are logged.
    pub fn from_shaders(
        ctx: &Context,
        shaders: &[&ShaderObject],
        block: &str,
        usage: BufferUsage,
    ) -> Result<Self> {
        debug_assert!(!shaders.is_empty(), "At least one shader is needed.");

        let mut merged: Option<BufferInfo<UniformVariableInfo>> = None;
        for shader in shaders {
            let info = match shader.uniform_buffer_info().get(block) {
                Some(v) => v,
                None => {
                    error!(
                        "ShaderObject \"{}\" doesn't contain the uniform block \"{}\". Skipping.",
                        shader.name(),
                        block
                    );
                    continue;
                }
            };

            if merged.is_none() {
                merged = Some(info.clone());
                continue;
            }

            let merged = match merged.as_mut() {
                Some(v) => v,
                None => continue,
            };

            if merged.data_size != info.data_size {
                warn!(
                    "Uniform block \"{}\" of shader \"{}\" has size {} instead of {}.",
                    block,
                    shader.name(),
                    info.data_size,
                    merged.data_size
                );
                merged.data_size = merged.data_size.max(info.data_size);
            }

            for (name, variable) in &info.variables {
                if let Some(existing) = merged.variables.get(name) {
                    if existing != variable {
                        warn!(
                            "Uniform \"{}\" of block \"{}\" has a different layout in shader \"{}\".",
                            name,
                            block,
                            shader.name()
                        );
                    }

                    continue;
                }

                merged.variables.insert(name.clone(), *variable);
            }
        }

        let info = match merged {
            Some(v) => v,
            None => {
                let names: Vec<_> = shaders.iter().map(|v| v.name()).collect();
                return Err(Error::UnknownBlock(names.join(", "), block.to_owned()));
            }
        };

        let mut view = UniformBufferView::new(ctx, info.data_size, block, usage)?;
        view.info = info;
        Ok(view)
    }

    /// Binds the whole buffer to a uniform buffer slot. Non-persistent buffers are unmapped
    /// first.
    pub fn bind(&self, slot: usize) -> Result<()> {
        let mut buffer = Buffer::borrow_shared(&self.buffer)?;
        if buffer.is_mapped() && !buffer.is_persistent() {
            buffer.unmap()?;
        }

        buffer.bind_uniform_buffer_whole(slot);
        Ok(())
    }

    pub fn reset_binding(ctx: &Context, slot: usize) {
        Buffer::reset_uniform_buffer_binding(ctx, slot);
    }

    /// Copies `data` into the mapped memory at `offset`.
    pub fn set(&self, data: &[u8], offset: usize) -> Result<()> {
        debug_assert!(!data.is_empty(), "Given size to set for uniform data is 0.");

        let mut buffer = Buffer::borrow_shared(&self.buffer)?;
        debug_assert!(
            offset + data.len() <= buffer.size(),
            "Data block doesn't fit into uniform buffer {}.",
            self.name
        );

        debug_assert!(buffer.is_mapped(), "Uniform buffer {} is not mapped!", self.name);

        match buffer.mapped_range(offset, data.len()) {
            Some(memory) => {
                memory.copy_from_slice(data);
                Ok(())
            }
            None => {
                error!(
                    "Mapping of uniform buffer {} does not cover [{}, {}).",
                    self.name,
                    offset,
                    offset + data.len()
                );
                Err(Error::Usage("buffer mapping range is not sufficient"))
            }
        }
    }

    /// Maps the whole buffer if necessary and returns a view to write variables by name.
    ///
    /// The view borrows the buffer, `bind` and `set` fail with `Error::BufferInUse` until it is
    /// dropped.
    pub fn map_view(&self) -> Result<MappedMemoryView<UniformVariableInfo, RefMut<[u8]>>> {
        let mut buffer = Buffer::borrow_shared(&self.buffer)?;
        let size = buffer.size();
        buffer.map_whole(MapType::Write, MapWriteFlags::NONE)?;

        let memory = RefMut::map(buffer, |v| v.mapped_range(0, size).unwrap_or(&mut []));
        Ok(MappedMemoryView::new(&self.info, memory, 0))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn info(&self) -> &BufferInfo<UniformVariableInfo> {
        &self.info
    }

    #[inline]
    pub fn variables(&self) -> impl Iterator<Item = (&String, &UniformVariableInfo)> {
        self.info.variables.iter()
    }

    #[inline]
    pub fn contains_variable(&self, name: &str) -> bool {
        self.info.variables.contains_key(name)
    }

    #[inline]
    pub fn variable(&self, name: &str) -> Option<&UniformVariableInfo> {
        self.info.variables.get(name)
    }

    #[inline]
    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }
}
