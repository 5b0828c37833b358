//! Memory manager for the host runtime
//!
//! Allocations live in `Vec<u8>`s keyed by handle id. Every allocation
//! remembers the context it was created in so that transfers against a
//! released context fail the way a driver would.

use crate::error::{Result, RuntimeError};
use crate::status::StatusCode;
use crate::types::{BufferHandle, ContextHandle, ProgramHandle};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Buffers at least this large are filled in parallel
const PARALLEL_FILL_BYTES: usize = 1 << 20;

/// Counters describing the state of a host runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub live_contexts: usize,
    pub live_buffers: usize,
    pub live_programs: usize,
    pub bytes_in_use: usize,
    pub contexts_created: u64,
    pub contexts_released: u64,
    pub allocations: u64,
    pub releases: u64,
}

struct HostAllocation {
    context: u64,
    bytes: Vec<u8>,
}

pub(crate) struct MemoryLimits {
    pub global_mem_bytes: usize,
    pub max_alloc_bytes: usize,
    pub uninit_byte: u8,
}

pub(crate) struct HostMemory {
    limits: MemoryLimits,
    contexts: HashSet<u64>,
    buffers: HashMap<u64, HostAllocation>,
    programs: HashMap<u64, u64>,
    next_context_id: u64,
    next_buffer_id: u64,
    next_program_id: u64,
    stats: HostStats,
}

impl HostMemory {
    pub fn new(limits: MemoryLimits) -> Self {
        Self {
            limits,
            contexts: HashSet::new(),
            buffers: HashMap::new(),
            programs: HashMap::new(),
            next_context_id: 1,
            next_buffer_id: 1,
            next_program_id: 1,
            stats: HostStats::default(),
        }
    }

    pub fn stats(&self) -> HostStats {
        self.stats
    }

    // ============================================================================================
    // Contexts
    // ============================================================================================

    pub fn create_context(&mut self) -> ContextHandle {
        let id = self.next_context_id;
        self.next_context_id += 1;
        self.contexts.insert(id);
        self.stats.live_contexts += 1;
        self.stats.contexts_created += 1;
        ContextHandle::new(id)
    }

    pub fn release_context(&mut self, context: ContextHandle) -> Result<()> {
        if !self.contexts.remove(&context.id()) {
            return Err(RuntimeError::status("release_context", StatusCode::INVALID_CONTEXT));
        }
        self.stats.live_contexts -= 1;
        self.stats.contexts_released += 1;
        Ok(())
    }

    pub fn check_context(&self, operation: &'static str, context: ContextHandle) -> Result<()> {
        if self.contexts.contains(&context.id()) {
            Ok(())
        } else {
            Err(RuntimeError::status(operation, StatusCode::INVALID_CONTEXT))
        }
    }

    // ============================================================================================
    // Buffers
    // ============================================================================================

    pub fn allocate(&mut self, context: ContextHandle, size: usize) -> Result<BufferHandle> {
        self.check_context("allocate", context)?;

        if size == 0 || size > self.limits.max_alloc_bytes {
            return Err(RuntimeError::status("allocate", StatusCode::INVALID_BUFFER_SIZE));
        }
        if self.stats.bytes_in_use + size > self.limits.global_mem_bytes {
            return Err(RuntimeError::status(
                "allocate",
                StatusCode::MEM_OBJECT_ALLOCATION_FAILURE,
            ));
        }

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| RuntimeError::status("allocate", StatusCode::OUT_OF_HOST_MEMORY))?;
        bytes.resize(size, self.limits.uninit_byte);

        let id = self.next_buffer_id;
        self.next_buffer_id += 1;
        self.buffers.insert(
            id,
            HostAllocation {
                context: context.id(),
                bytes,
            },
        );

        self.stats.live_buffers += 1;
        self.stats.bytes_in_use += size;
        self.stats.allocations += 1;
        Ok(BufferHandle::new(id))
    }

    pub fn release(&mut self, buffer: BufferHandle) -> Result<()> {
        let allocation = self
            .buffers
            .remove(&buffer.id())
            .ok_or(RuntimeError::status("release", StatusCode::INVALID_MEM_OBJECT))?;
        self.stats.live_buffers -= 1;
        self.stats.bytes_in_use -= allocation.bytes.len();
        self.stats.releases += 1;
        Ok(())
    }

    pub fn buffer_size(&self, buffer: BufferHandle) -> Result<usize> {
        self.buffers
            .get(&buffer.id())
            .map(|allocation| allocation.bytes.len())
            .ok_or(RuntimeError::status("buffer_size", StatusCode::INVALID_MEM_OBJECT))
    }

    /// Look up a live allocation whose context is still live
    fn allocation(&self, operation: &'static str, buffer: BufferHandle) -> Result<&HostAllocation> {
        let allocation = self
            .buffers
            .get(&buffer.id())
            .ok_or(RuntimeError::status(operation, StatusCode::INVALID_MEM_OBJECT))?;
        if !self.contexts.contains(&allocation.context) {
            return Err(RuntimeError::status(operation, StatusCode::INVALID_CONTEXT));
        }
        Ok(allocation)
    }

    fn allocation_mut(&mut self, operation: &'static str, buffer: BufferHandle) -> Result<&mut HostAllocation> {
        let allocation = self
            .buffers
            .get_mut(&buffer.id())
            .ok_or(RuntimeError::status(operation, StatusCode::INVALID_MEM_OBJECT))?;
        if !self.contexts.contains(&allocation.context) {
            return Err(RuntimeError::status(operation, StatusCode::INVALID_CONTEXT));
        }
        Ok(allocation)
    }

    // ============================================================================================
    // Transfers
    // ============================================================================================

    pub fn write(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<()> {
        let allocation = self.allocation_mut("write", buffer)?;
        let range = checked_range(offset, data.len(), allocation.bytes.len())?;
        allocation.bytes[range].copy_from_slice(data);
        Ok(())
    }

    pub fn read(&self, buffer: BufferHandle, offset: usize, data: &mut [u8]) -> Result<()> {
        let allocation = self.allocation("read", buffer)?;
        let range = checked_range(offset, data.len(), allocation.bytes.len())?;
        data.copy_from_slice(&allocation.bytes[range]);
        Ok(())
    }

    pub fn fill(&mut self, buffer: BufferHandle, pattern: &[u8]) -> Result<()> {
        let allocation = self.allocation_mut("fill", buffer)?;
        if pattern.is_empty() || allocation.bytes.len() % pattern.len() != 0 {
            return Err(RuntimeError::status("fill", StatusCode::INVALID_VALUE));
        }

        let bytes = &mut allocation.bytes;
        if bytes.len() >= PARALLEL_FILL_BYTES {
            bytes
                .par_chunks_exact_mut(pattern.len())
                .for_each(|chunk| chunk.copy_from_slice(pattern));
        } else {
            for chunk in bytes.chunks_exact_mut(pattern.len()) {
                chunk.copy_from_slice(pattern);
            }
        }
        Ok(())
    }

    pub fn copy(&mut self, src: BufferHandle, dst: BufferHandle, bytes: usize) -> Result<()> {
        if src == dst {
            return Err(RuntimeError::status("copy", StatusCode::MEM_COPY_OVERLAP));
        }

        let staged = {
            let source = self.allocation("copy", src)?;
            let range = checked_range(0, bytes, source.bytes.len())?;
            source.bytes[range].to_vec()
        };

        let target = self.allocation_mut("copy", dst)?;
        let range = checked_range(0, bytes, target.bytes.len())?;
        target.bytes[range].copy_from_slice(&staged);
        Ok(())
    }

    // ============================================================================================
    // Programs
    // ============================================================================================

    pub fn register_program(&mut self, context: ContextHandle) -> ProgramHandle {
        let id = self.next_program_id;
        self.next_program_id += 1;
        self.programs.insert(id, context.id());
        self.stats.live_programs += 1;
        ProgramHandle::new(id)
    }

    pub fn release_program(&mut self, program: ProgramHandle) -> Result<()> {
        if self.programs.remove(&program.id()).is_none() {
            return Err(RuntimeError::status("release_program", StatusCode::INVALID_PROGRAM));
        }
        self.stats.live_programs -= 1;
        Ok(())
    }
}

fn checked_range(offset: usize, size: usize, buffer_size: usize) -> Result<std::ops::Range<usize>> {
    match offset.checked_add(size) {
        Some(end) if end <= buffer_size => Ok(offset..end),
        _ => Err(RuntimeError::OutOfBounds {
            offset,
            size,
            buffer_size,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(global: usize, max_alloc: usize) -> HostMemory {
        HostMemory::new(MemoryLimits {
            global_mem_bytes: global,
            max_alloc_bytes: max_alloc,
            uninit_byte: 0xEE,
        })
    }

    #[test]
    fn allocation_is_filled_with_uninit_byte() {
        let mut mem = memory(1024, 1024);
        let ctx = mem.create_context();
        let buf = mem.allocate(ctx, 8).unwrap();

        let mut out = [0u8; 8];
        mem.read(buf, 0, &mut out).unwrap();
        assert_eq!(out, [0xEE; 8]);
    }

    #[test]
    fn allocation_limits() {
        let mut mem = memory(100, 64);
        let ctx = mem.create_context();

        let err = mem.allocate(ctx, 0).unwrap_err();
        assert_eq!(err.code(), StatusCode::INVALID_BUFFER_SIZE);

        let err = mem.allocate(ctx, 65).unwrap_err();
        assert_eq!(err.code(), StatusCode::INVALID_BUFFER_SIZE);

        let _a = mem.allocate(ctx, 64).unwrap();
        let err = mem.allocate(ctx, 64).unwrap_err();
        assert_eq!(err.code(), StatusCode::MEM_OBJECT_ALLOCATION_FAILURE);
        assert_eq!(mem.stats().bytes_in_use, 64);
    }

    #[test]
    fn release_returns_memory() {
        let mut mem = memory(64, 64);
        let ctx = mem.create_context();
        let a = mem.allocate(ctx, 64).unwrap();
        mem.release(a).unwrap();
        assert_eq!(mem.stats().bytes_in_use, 0);
        assert!(mem.allocate(ctx, 64).is_ok());

        let err = mem.release(a).unwrap_err();
        assert_eq!(err.code(), StatusCode::INVALID_MEM_OBJECT);
    }

    #[test]
    fn transfers_check_bounds() {
        let mut mem = memory(1024, 1024);
        let ctx = mem.create_context();
        let buf = mem.allocate(ctx, 16).unwrap();

        mem.write(buf, 12, &[1, 2, 3, 4]).unwrap();
        let err = mem.write(buf, 13, &[1, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, RuntimeError::OutOfBounds { offset: 13, size: 4, buffer_size: 16 }));

        let mut out = [0u8; 4];
        mem.read(buf, 12, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
        assert!(mem.read(buf, usize::MAX, &mut out).is_err());
    }

    #[test]
    fn fill_repeats_pattern() {
        let mut mem = memory(1024, 1024);
        let ctx = mem.create_context();
        let buf = mem.allocate(ctx, 12).unwrap();

        mem.fill(buf, &[1, 2, 3, 4]).unwrap();
        let mut out = [0u8; 12];
        mem.read(buf, 0, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);

        assert_eq!(mem.fill(buf, &[0; 5]).unwrap_err().code(), StatusCode::INVALID_VALUE);
        assert_eq!(mem.fill(buf, &[]).unwrap_err().code(), StatusCode::INVALID_VALUE);
    }

    #[test]
    fn large_fill_runs_in_parallel_path() {
        let size = PARALLEL_FILL_BYTES * 2;
        let mut mem = memory(size, size);
        let ctx = mem.create_context();
        let buf = mem.allocate(ctx, size).unwrap();

        mem.fill(buf, &[7, 0, 0, 0]).unwrap();
        let mut tail = [0u8; 8];
        mem.read(buf, size - 8, &mut tail).unwrap();
        assert_eq!(tail, [7, 0, 0, 0, 7, 0, 0, 0]);
    }

    #[test]
    fn copy_between_buffers() {
        let mut mem = memory(1024, 1024);
        let ctx = mem.create_context();
        let a = mem.allocate(ctx, 8).unwrap();
        let b = mem.allocate(ctx, 8).unwrap();

        mem.write(a, 0, &[9; 8]).unwrap();
        mem.copy(a, b, 8).unwrap();
        let mut out = [0u8; 8];
        mem.read(b, 0, &mut out).unwrap();
        assert_eq!(out, [9; 8]);

        assert_eq!(mem.copy(a, a, 8).unwrap_err().code(), StatusCode::MEM_COPY_OVERLAP);
        assert!(mem.copy(a, b, 9).is_err());
    }

    #[test]
    fn released_context_invalidates_transfers() {
        let mut mem = memory(1024, 1024);
        let ctx = mem.create_context();
        let buf = mem.allocate(ctx, 4).unwrap();
        mem.release_context(ctx).unwrap();

        let err = mem.write(buf, 0, &[0; 4]).unwrap_err();
        assert_eq!(err.code(), StatusCode::INVALID_CONTEXT);
        assert_eq!(mem.allocate(ctx, 4).unwrap_err().code(), StatusCode::INVALID_CONTEXT);
        assert_eq!(
            mem.release_context(ctx).unwrap_err().code(),
            StatusCode::INVALID_CONTEXT
        );
        // the allocation itself can still be released
        mem.release(buf).unwrap();
    }

    #[test]
    fn program_registry() {
        let mut mem = memory(1024, 1024);
        let ctx = mem.create_context();
        let prog = mem.register_program(ctx);
        assert_eq!(mem.stats().live_programs, 1);
        mem.release_program(prog).unwrap();
        assert_eq!(
            mem.release_program(prog).unwrap_err().code(),
            StatusCode::INVALID_PROGRAM
        );
    }
}
