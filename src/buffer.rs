//! Immutable-storage buffer objects.
//!
//! The storage size of a `Buffer` is fixed on creation, the usage flags decide how the content
//! can be changed afterwards: by mapping, by `set` or not at all.

use std::cell::{RefCell, RefMut};
use std::ops::{BitOr, BitOrAssign};
use std::rc::Rc;
use std::slice;

use gl::types::*;

use crate::context::{BufferRange, Context, VertexBinding};
use crate::errors::*;

/// A buffer shared between views.
pub type SharedBuffer = Rc<RefCell<Buffer>>;

/// Creation flags of a buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferUsage(u32);

impl BufferUsage {
    /// No CPU side access after creation.
    pub const IMMUTABLE: BufferUsage = BufferUsage(0);
    /// Enables CPU side write access via mapping.
    pub const MAP_WRITE: BufferUsage = BufferUsage(1);
    /// Enables CPU side read access via mapping.
    pub const MAP_READ: BufferUsage = BufferUsage(1 << 1);
    /// The buffer is mapped once on creation and stays mapped until it is dropped.
    pub const MAP_PERSISTENT: BufferUsage = BufferUsage(1 << 2);
    /// Writes to a persistent mapping need an explicit flush. Requires `MAP_PERSISTENT`.
    pub const EXPLICIT_FLUSH: BufferUsage = BufferUsage(1 << 3);
    /// Writes to a persistent mapping are visible without barriers. Requires `MAP_PERSISTENT`.
    pub const MAP_COHERENT: BufferUsage = BufferUsage(1 << 4);
    /// Enables `Buffer::set` and `Buffer::get`.
    pub const SUB_DATA_UPDATE: BufferUsage = BufferUsage(1 << 5);

    #[inline]
    pub fn contains(self, other: BufferUsage) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for BufferUsage {
    type Output = BufferUsage;

    #[inline]
    fn bitor(self, rhs: BufferUsage) -> BufferUsage {
        BufferUsage(self.0 | rhs.0)
    }
}

impl BitOrAssign for BufferUsage {
    #[inline]
    fn bitor_assign(&mut self, rhs: BufferUsage) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapType {
    Read,
    Write,
    ReadWrite,
}

impl MapType {
    #[inline]
    fn reads(self) -> bool {
        self != MapType::Write
    }

    #[inline]
    fn writes(self) -> bool {
        self != MapType::Read
    }
}

/// Additional hints of write mappings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MapWriteFlags(u32);

impl MapWriteFlags {
    pub const NONE: MapWriteFlags = MapWriteFlags(0);
    /// The previous content of the mapped range may be discarded.
    pub const INVALIDATE_RANGE: MapWriteFlags = MapWriteFlags(1);
    /// The previous content of the whole buffer may be discarded.
    pub const INVALIDATE_BUFFER: MapWriteFlags = MapWriteFlags(1 << 1);
    /// Modified ranges are flushed explicitly with `Buffer::flush`.
    pub const FLUSH_EXPLICIT: MapWriteFlags = MapWriteFlags(1 << 2);
    /// The driver does not synchronize pending operations on the buffer.
    pub const UNSYNCHRONIZED: MapWriteFlags = MapWriteFlags(1 << 3);

    #[inline]
    pub fn contains(self, other: MapWriteFlags) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl BitOr for MapWriteFlags {
    type Output = MapWriteFlags;

    #[inline]
    fn bitor(self, rhs: MapWriteFlags) -> MapWriteFlags {
        MapWriteFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Copy, Clone)]
struct Mapping {
    ptr: *mut u8,
    offset: usize,
    size: usize,
}

#[derive(Debug)]
pub struct Buffer {
    ctx: Context,
    id: GLuint,
    size: usize,
    usage: BufferUsage,
    mapping: Option<Mapping>,
}

impl Buffer {
    /// Creates a buffer of `size` bytes, optionally initialised with `data`.
    ///
    /// Persistent buffers are mapped right away over their whole range.
    pub fn new(ctx: &Context, size: usize, usage: BufferUsage, data: Option<&[u8]>) -> Result<Self> {
        debug_assert!(
            !usage.contains(BufferUsage::EXPLICIT_FLUSH)
                || usage.contains(BufferUsage::MAP_PERSISTENT),
            "EXPLICIT_FLUSH only valid in combination with MAP_PERSISTENT."
        );

        debug_assert!(
            !usage.contains(BufferUsage::MAP_COHERENT)
                || usage.contains(BufferUsage::MAP_PERSISTENT),
            "MAP_COHERENT only valid in combination with MAP_PERSISTENT."
        );

        debug_assert!(size > 0, "Buffer size must be greater than zero.");
        let data = match data {
            Some(v) if v.len() < size => {
                error!("Initial data of {} bytes is smaller than the buffer of {}.", v.len(), size);
                return Err(Error::DataTooSmall(v.len(), size));
            }
            Some(v) => Some(&v[..size]),
            None => None,
        };

        let device = ctx.device();
        let id = device.create_buffer();
        device.buffer_storage(id, size, data, usage.into());

        let mut buffer = Buffer {
            ctx: ctx.clone(),
            id,
            size,
            usage,
            mapping: None,
        };

        ctx.check("glNamedBufferStorage")?;

        if usage.contains(BufferUsage::MAP_PERSISTENT) {
            let flags = if usage.contains(BufferUsage::EXPLICIT_FLUSH) {
                MapWriteFlags::FLUSH_EXPLICIT
            } else {
                MapWriteFlags::NONE
            };

            let read = usage.contains(BufferUsage::MAP_READ);
            let write = usage.contains(BufferUsage::MAP_WRITE);

            let ty = match (read, write) {
                (true, true) => MapType::ReadWrite,
                (false, true) => MapType::Write,
                (true, false) => MapType::Read,
                (false, false) => {
                    return Err(Error::Usage(
                        "persistently mapped buffers need MAP_READ, MAP_WRITE or both",
                    ));
                }
            };

            buffer.map_whole(ty, flags)?;
        }

        Ok(buffer)
    }

    /// Creates a buffer that can be shared between views.
    pub fn new_shared(
        ctx: &Context,
        size: usize,
        usage: BufferUsage,
        data: Option<&[u8]>,
    ) -> Result<SharedBuffer> {
        Ok(Rc::new(RefCell::new(Buffer::new(ctx, size, usage, data)?)))
    }

    /// Mutably borrows a shared buffer, failing while a mapped view of it is alive.
    pub fn borrow_shared(buffer: &SharedBuffer) -> Result<RefMut<Buffer>> {
        buffer.try_borrow_mut().map_err(|_| {
            error!("Shared buffer is still borrowed, drop mapped views before using it.");
            Error::BufferInUse
        })
    }

    #[inline]
    pub fn handle(&self) -> GLuint {
        self.id
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }

    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.usage.contains(BufferUsage::MAP_PERSISTENT)
    }

    #[inline]
    pub(crate) fn context(&self) -> &Context {
        &self.ctx
    }

    /// Maps the whole buffer.
    pub fn map_whole(&mut self, ty: MapType, flags: MapWriteFlags) -> Result<&mut [u8]> {
        let size = self.size;
        self.map(0, size, ty, flags)
    }

    /// Maps a range of the buffer.
    ///
    /// Returns the already mapped memory if it covers the requested range. If an incompatible
    /// range is mapped, it is unmapped first and a warning is logged.
    pub fn map(
        &mut self,
        offset: usize,
        size: usize,
        ty: MapType,
        flags: MapWriteFlags,
    ) -> Result<&mut [u8]> {
        debug_assert!(
            (ty.reads() && self.usage.contains(BufferUsage::MAP_READ))
                || (ty.writes() && self.usage.contains(BufferUsage::MAP_WRITE)),
            "Can't map the buffer for {:?} since it was not created with the matching usage.",
            ty
        );

        debug_assert!(size > 0, "Invalid map range.");
        debug_assert!(offset + size <= self.size, "Map region exceeds buffer size.");

        if let Some(m) = self.mapping {
            if m.offset <= offset && m.offset + m.size >= offset + size {
                return Ok(unsafe { slice::from_raw_parts_mut(m.ptr.add(offset - m.offset), size) });
            }

            warn!("Buffer was already mapped, but within incompatible range. Unmapping it.");
            self.release_mapping()?;
        }

        let mut access = 0;
        if ty.reads() {
            access |= gl::MAP_READ_BIT;
        }

        if ty.writes() {
            access |= gl::MAP_WRITE_BIT;
            access |= GLbitfield::from(flags);
        }

        if self.usage.contains(BufferUsage::MAP_PERSISTENT) {
            access |= gl::MAP_PERSISTENT_BIT;
        }

        if self.usage.contains(BufferUsage::MAP_COHERENT) {
            access |= gl::MAP_COHERENT_BIT;
        }

        let ptr = self.ctx.device().map_buffer_range(self.id, offset, size, access);
        self.ctx.check("glMapNamedBufferRange")?;

        if ptr.is_null() {
            return Err(Error::MapFailed(self.id, offset, offset + size));
        }

        // Valid until unmapped, see `Device`.
        self.mapping = Some(Mapping { ptr, offset, size });
        Ok(unsafe { slice::from_raw_parts_mut(ptr, size) })
    }

    /// Returns the currently mapped memory of `[offset, offset + size)`.
    pub(crate) fn mapped_range(&mut self, offset: usize, size: usize) -> Option<&mut [u8]> {
        match self.mapping {
            Some(m) if m.offset <= offset && m.offset + m.size >= offset + size => {
                Some(unsafe { slice::from_raw_parts_mut(m.ptr.add(offset - m.offset), size) })
            }
            _ => None,
        }
    }

    /// Unmaps the buffer.
    ///
    /// Logs a warning and ignores the call if the buffer is not mapped, or if it was created
    /// with `MAP_PERSISTENT`, since those stay mapped for their whole life time.
    pub fn unmap(&mut self) -> Result<()> {
        if self.mapping.is_none() {
            warn!("Unmapping buffer {} which is not mapped.", self.id);
            return Ok(());
        }

        if self.is_persistent() {
            warn!("Unmapping persistently mapped buffer {} is ignored.", self.id);
            return Ok(());
        }

        self.release_mapping()
    }

    fn release_mapping(&mut self) -> Result<()> {
        if self.mapping.take().is_some() {
            self.ctx.device().unmap_buffer(self.id);
            self.ctx.check("glUnmapNamedBuffer")?;
        }

        Ok(())
    }

    /// Flushes a range of an explicitly flushed mapping. Has no effect on other buffers.
    pub fn flush(&self, offset: usize, size: usize) {
        if !self.usage.contains(BufferUsage::EXPLICIT_FLUSH) {
            return;
        }

        match self.mapping {
            Some(m) => {
                debug_assert!(
                    offset >= m.offset && offset + size <= m.offset + m.size,
                    "Flushed range exceeds the mapped range."
                );

                // The offset is relative to the start of the mapping.
                self.ctx
                    .device()
                    .flush_mapped_buffer_range(self.id, offset - m.offset, size);
            }
            None => warn!("Flushing buffer {} which is not mapped.", self.id),
        }
    }

    /// Flushes the whole mapped range.
    pub fn flush_mapped(&self) {
        if let Some(m) = self.mapping {
            self.flush(m.offset, m.size);
        }
    }

    /// Clears the whole buffer to zero.
    pub fn clear_to_zero(&self) -> Result<()> {
        debug_assert!(
            self.mapping.is_none() || self.is_persistent(),
            "Cannot clear a mapped buffer."
        );

        self.ctx
            .device()
            .clear_buffer_data(self.id, gl::R32UI, gl::RED_INTEGER, gl::UNSIGNED_INT);
        self.ctx.check("glClearNamedBufferData")
    }

    /// Updates a range of the buffer with `glNamedBufferSubData`.
    pub fn set(&self, data: &[u8], offset: usize) -> Result<()> {
        self.check_sub_data_access("set")?;
        debug_assert!(
            offset + data.len() <= self.size,
            "Buffer::set exceeds buffer size."
        );

        self.ctx.device().buffer_sub_data(self.id, offset, data);
        self.ctx.check("glNamedBufferSubData")
    }

    /// Reads a range of the buffer with `glGetNamedBufferSubData`.
    pub fn get(&self, offset: usize, out: &mut [u8]) -> Result<()> {
        self.check_sub_data_access("get")?;
        debug_assert!(
            offset + out.len() <= self.size,
            "Buffer::get exceeds buffer size."
        );

        self.ctx.device().get_buffer_sub_data(self.id, offset, out);
        self.ctx.check("glGetNamedBufferSubData")
    }

    fn check_sub_data_access(&self, op: &'static str) -> Result<()> {
        if !self.usage.contains(BufferUsage::SUB_DATA_UPDATE) {
            error!("Buffer::{} requires the SUB_DATA_UPDATE usage flag.", op);
            return Err(Error::Usage("sub data access requires SUB_DATA_UPDATE"));
        }

        if self.mapping.is_some() && !self.is_persistent() {
            error!("Buffer::{} on buffer {} while it is mapped.", op, self.id);
            return Err(Error::Usage("sub data access on a mapped buffer"));
        }

        Ok(())
    }

    #[inline]
    fn debug_assert_bindable(&self) {
        debug_assert!(
            self.mapping.is_none() || self.is_persistent(),
            "Only persistently mapped buffers can be bound while mapped."
        );
    }

    /// Binds as vertex buffer if not already bound with the same parameters.
    pub fn bind_vertex_buffer(&self, binding: usize, offset: usize, stride: u32) {
        self.debug_assert_bindable();

        let want = VertexBinding {
            buffer: self.id,
            offset,
            stride,
        };

        let mut state = self.ctx.state();
        debug_assert!(
            binding < state.vertex_buffers.len(),
            "Vertex buffer binding {} exceeds the tracked range.",
            binding
        );

        if state.vertex_buffers.get(binding) != Some(&want) {
            self.ctx
                .device()
                .bind_vertex_buffer(binding as GLuint, self.id, offset, stride as GLsizei);

            if let Some(v) = state.vertex_buffers.get_mut(binding) {
                *v = want;
            }
        }
    }

    pub fn reset_vertex_buffer_binding(ctx: &Context, binding: usize) {
        let mut state = ctx.state();
        if let Some(v) = state.vertex_buffers.get_mut(binding) {
            if v.buffer != 0 {
                ctx.device().bind_vertex_buffer(binding as GLuint, 0, 0, 0);
                *v = VertexBinding::default();
            }
        }
    }

    /// Binds as index buffer (vertex element array) if not already bound.
    pub fn bind_index_buffer(&self) {
        self.debug_assert_bindable();

        let mut state = self.ctx.state();
        if state.index_buffer != self.id {
            self.ctx.device().bind_buffer(gl::ELEMENT_ARRAY_BUFFER, self.id);
            state.index_buffer = self.id;
        }
    }

    pub fn reset_index_buffer_binding(ctx: &Context) {
        let mut state = ctx.state();
        if state.index_buffer != 0 {
            ctx.device().bind_buffer(gl::ELEMENT_ARRAY_BUFFER, 0);
            state.index_buffer = 0;
        }
    }

    pub fn bind_indirect_draw_buffer(&self) {
        self.debug_assert_bindable();

        let mut state = self.ctx.state();
        if state.indirect_draw_buffer != self.id {
            self.ctx.device().bind_buffer(gl::DRAW_INDIRECT_BUFFER, self.id);
            state.indirect_draw_buffer = self.id;
        }
    }

    pub fn reset_indirect_draw_buffer_binding(ctx: &Context) {
        let mut state = ctx.state();
        if state.indirect_draw_buffer != 0 {
            ctx.device().bind_buffer(gl::DRAW_INDIRECT_BUFFER, 0);
            state.indirect_draw_buffer = 0;
        }
    }

    pub fn bind_indirect_dispatch_buffer(&self) {
        self.debug_assert_bindable();

        let mut state = self.ctx.state();
        if state.indirect_dispatch_buffer != self.id {
            self.ctx.device().bind_buffer(gl::DISPATCH_INDIRECT_BUFFER, self.id);
            state.indirect_dispatch_buffer = self.id;
        }
    }

    pub fn reset_indirect_dispatch_buffer_binding(ctx: &Context) {
        let mut state = ctx.state();
        if state.indirect_dispatch_buffer != 0 {
            ctx.device().bind_buffer(gl::DISPATCH_INDIRECT_BUFFER, 0);
            state.indirect_dispatch_buffer = 0;
        }
    }

    /// Binds a range as uniform buffer if not already bound with the same parameters.
    pub fn bind_uniform_buffer(&self, index: usize, offset: usize, size: usize) {
        self.bind_indexed(gl::UNIFORM_BUFFER, index, offset, size)
    }

    pub fn bind_uniform_buffer_whole(&self, index: usize) {
        self.bind_indexed(gl::UNIFORM_BUFFER, index, 0, self.size)
    }

    pub fn reset_uniform_buffer_binding(ctx: &Context, index: usize) {
        Buffer::reset_indexed(ctx, gl::UNIFORM_BUFFER, index)
    }

    /// Binds a range as shader storage buffer if not already bound with the same parameters.
    pub fn bind_shader_storage_buffer(&self, index: usize, offset: usize, size: usize) {
        self.bind_indexed(gl::SHADER_STORAGE_BUFFER, index, offset, size)
    }

    pub fn bind_shader_storage_buffer_whole(&self, index: usize) {
        self.bind_indexed(gl::SHADER_STORAGE_BUFFER, index, 0, self.size)
    }

    pub fn reset_shader_storage_buffer_binding(ctx: &Context, index: usize) {
        Buffer::reset_indexed(ctx, gl::SHADER_STORAGE_BUFFER, index)
    }

    fn bind_indexed(&self, target: GLenum, index: usize, offset: usize, size: usize) {
        self.debug_assert_bindable();
        debug_assert!(offset + size <= self.size, "Bound range exceeds buffer size.");

        let want = BufferRange {
            buffer: self.id,
            offset,
            size,
        };

        let mut state = self.ctx.state();
        let table = if target == gl::UNIFORM_BUFFER {
            &mut state.uniform_buffers
        } else {
            &mut state.storage_buffers
        };

        debug_assert!(
            index < table.len(),
            "Buffer binding {} exceeds the tracked range of {}.",
            index,
            table.len()
        );

        if table.get(index) == Some(&want) {
            return;
        }

        if offset == 0 && size == self.size {
            self.ctx.device().bind_buffer_base(target, index as GLuint, self.id);
        } else {
            self.ctx
                .device()
                .bind_buffer_range(target, index as GLuint, self.id, offset, size);
        }

        if let Some(v) = table.get_mut(index) {
            *v = want;
        }
    }

    fn reset_indexed(ctx: &Context, target: GLenum, index: usize) {
        let mut state = ctx.state();
        let table = if target == gl::UNIFORM_BUFFER {
            &mut state.uniform_buffers
        } else {
            &mut state.storage_buffers
        };

        if let Some(v) = table.get_mut(index) {
            if v.buffer != 0 {
                ctx.device().bind_buffer_base(target, index as GLuint, 0);
                *v = BufferRange::default();
            }
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // Deleting a buffer unmaps it and resets its driver bindings.
        self.mapping = None;
        self.ctx.state().forget_buffer(self.id);
        self.ctx.device().delete_buffer(self.id);
    }
}
