//! A persistently mapped ring buffer for per-frame streaming data.
//!
//! Memory is handed out in blocks. All blocks added between two `complete_frame` calls belong
//! to one frame, which is guarded by a fence once completed. Before a block reuses memory of an
//! older frame, the CPU waits until the GPU signaled that frame's fence.

use std::collections::VecDeque;

use gl::types::*;

use crate::buffer::{Buffer, BufferUsage};
use crate::context::Context;
use crate::device::Fence;
use crate::errors::*;

#[derive(Debug, Copy, Clone)]
struct Frame {
    start: usize,
    fence: Option<Fence>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Block {
    start: usize,
    size: usize,
}

pub struct PersistentRingBuffer {
    buffer: Buffer,
    frames: VecDeque<Frame>,
    blocks: Vec<Block>,
    next: usize,
    timeout_ns: u64,
    warn_on_sync: bool,
}

impl PersistentRingBuffer {
    pub fn new(ctx: &Context, size: usize) -> Result<Self> {
        let usage = BufferUsage::MAP_WRITE | BufferUsage::MAP_PERSISTENT | BufferUsage::EXPLICIT_FLUSH;
        let buffer = Buffer::new(ctx, size, usage, None)?;

        let mut frames = VecDeque::new();
        frames.push_back(Frame {
            start: 0,
            fence: None,
        });

        Ok(PersistentRingBuffer {
            buffer,
            frames,
            blocks: Vec::new(),
            next: 0,
            timeout_ns: ctx.settings().ring_buffer_timeout_ns,
            warn_on_sync: ctx.settings().ring_buffer_warn_on_sync,
        })
    }

    /// Allocates a block of `size` bytes whose offset is a multiple of `alignment`.
    ///
    /// Waits for older frames if their memory is about to be reused. Fails if the wait failed
    /// or timed out, or if the current frame alone would exceed the buffer.
    pub fn add_block(&mut self, size: usize, alignment: usize) -> Result<(usize, &mut [u8])> {
        let capacity = self.buffer.size();
        debug_assert!(
            size > 0 && size < capacity,
            "Block size {} is not within (0, {}).",
            size,
            capacity
        );

        let alignment = alignment.max(1);
        let mut unaligned = self.next;
        let mut start = unaligned + (alignment - unaligned % alignment) % alignment;
        let mut wrapped = false;

        if start + size > capacity {
            unaligned = 0;
            start = 0;
            wrapped = true;
        }

        let end = start + size;

        // Waits for frames whose memory we are going to overwrite.
        while self.frames.len() > 1 {
            let front = self.frames[0];
            let overlaps = front.start >= unaligned && front.start < end;
            let skipped = wrapped && self.next <= front.start;

            if !overlaps && !skipped {
                break;
            }

            if let Some(fence) = front.fence {
                self.wait(fence)?;
                self.buffer.context().device().delete_sync(fence);
            }

            self.frames.pop_front();
        }

        // The current frame must not overwrite its own blocks.
        if let Some(first) = self.blocks.first() {
            let overlaps = first.start >= unaligned && first.start < end;
            let skipped = wrapped && self.next <= first.start;

            if overlaps || skipped {
                error!(
                    "Persistent ring buffer of {} bytes has not enough memory to hold a single frame.",
                    capacity
                );
                return Err(Error::RingBufferTooSmall);
            }
        }

        // A frame owns its memory from where its first block was placed.
        if self.blocks.is_empty() {
            if let Some(v) = self.frames.back_mut() {
                v.start = start;
            }
        }

        self.blocks.push(Block { start, size });
        self.next = end % capacity;

        let index = self.blocks.len() - 1;
        let handle = self.buffer.handle();
        match self.buffer.mapped_range(start, size) {
            Some(memory) => Ok((index, memory)),
            None => Err(Error::MapFailed(handle, start, end)),
        }
    }

    fn wait(&self, fence: Fence) -> Result<()> {
        let ctx = self.buffer.context();
        let status = ctx
            .device()
            .client_wait_sync(fence, gl::SYNC_FLUSH_COMMANDS_BIT, self.timeout_ns);

        match status {
            gl::ALREADY_SIGNALED => Ok(()),
            gl::CONDITION_SATISFIED => {
                if self.warn_on_sync {
                    warn!(
                        "Persistent ring buffer of {} bytes had to wait for the GPU. \
                         Consider increasing its size.",
                        self.buffer.size()
                    );
                }

                Ok(())
            }
            gl::TIMEOUT_EXPIRED => {
                error!(
                    "Persistent ring buffer timed out after {}ns waiting for a frame fence.",
                    self.timeout_ns
                );
                Err(Error::SyncTimeout(self.timeout_ns))
            }
            _ => {
                ctx.check("glClientWaitSync")?;
                Err(Error::SyncFailed)
            }
        }
    }

    /// Flushes every block of the current frame.
    pub fn flush_all_blocks(&self) {
        if !self.blocks.is_empty() {
            self.flush_block_range(0, self.blocks.len() - 1);
        }
    }

    /// Flushes the blocks `first..=last` of the current frame.
    pub fn flush_block_range(&self, first: usize, last: usize) {
        debug_assert!(
            first <= last && last < self.blocks.len(),
            "Invalid block range {}..={}.",
            first,
            last
        );

        let (first, last) = match (self.blocks.get(first), self.blocks.get(last)) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return,
        };

        let end = last.start + last.size;
        if first.start < end {
            self.buffer.flush(first.start, end - first.start);
        } else {
            // The range wraps around the end of the buffer.
            self.buffer.flush(first.start, self.buffer.size() - first.start);
            self.buffer.flush(0, end);
        }
    }

    /// Guards all blocks of the current frame with a fence and opens a new frame.
    pub fn complete_frame(&mut self) -> Result<()> {
        if self.blocks.is_empty() {
            error!("Completing a persistent ring buffer frame without any blocks.");
            return Ok(());
        }

        let ctx = self.buffer.context().clone();
        let fence = ctx.device().fence_sync();
        ctx.check("glFenceSync")?;

        if let Some(v) = self.frames.back_mut() {
            v.fence = Some(fence);
        }

        self.frames.push_back(Frame {
            start: self.next,
            fence: None,
        });

        self.blocks.clear();
        Ok(())
    }

    /// Binds a block of the current frame as uniform buffer.
    pub fn bind_block_as_uniform_buffer(&self, slot: usize, block: usize) {
        debug_assert!(block < self.blocks.len(), "Invalid block index {}.", block);
        if let Some(b) = self.blocks.get(block) {
            self.buffer.bind_uniform_buffer(slot, b.start, b.size);
        }
    }

    /// Binds a block of the current frame as shader storage buffer.
    pub fn bind_block_as_shader_storage_buffer(&self, slot: usize, block: usize) {
        debug_assert!(block < self.blocks.len(), "Invalid block index {}.", block);
        if let Some(b) = self.blocks.get(block) {
            self.buffer.bind_shader_storage_buffer(slot, b.start, b.size);
        }
    }

    /// Offset of a block of the current frame within the buffer.
    pub fn block_offset(&self, block: usize) -> Option<usize> {
        self.blocks.get(block).map(|v| v.start)
    }

    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Number of completed frames whose fence has not been waited for yet.
    #[inline]
    pub fn pending_frames(&self) -> usize {
        self.frames.len() - 1
    }

    #[inline]
    pub fn timeout(&self) -> u64 {
        self.timeout_ns
    }

    #[inline]
    pub fn set_timeout(&mut self, timeout_ns: u64) {
        self.timeout_ns = timeout_ns;
    }

    #[inline]
    pub fn set_warn_on_sync(&mut self, warn: bool) {
        self.warn_on_sync = warn;
    }

    #[inline]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    #[inline]
    pub fn handle(&self) -> GLuint {
        self.buffer.handle()
    }
}

impl Drop for PersistentRingBuffer {
    fn drop(&mut self) {
        let device = self.buffer.context().device();
        for fence in self.frames.iter().filter_map(|v| v.fence) {
            device.delete_sync(fence);
        }
    }
}
