//! Transient memory pool for ephemeral per-frame data
//!
//! Serves byte ranges out of one large persistently-mapped buffer by
//! advancing a cursor, so ephemeral uniform/vertex/index data costs no
//! per-allocation GPU allocation. The whole ring drains every frame: the
//! renderer resets the cursor at present, after the frame's fence has
//! signaled, which is what makes offset reuse safe without per-allocation
//! tracking. A frame whose ephemeral allocations exceed the ring capacity
//! is a fatal configuration error, never a silent wrap.

/// Cursor-based allocator over a fixed capacity
pub struct RingBufferAllocator {
    capacity: u32,
    cursor: u32,
    /// Largest cursor value seen since creation, for diagnostics
    high_water: u32,
}

impl RingBufferAllocator {
    /// Create an allocator over `capacity` bytes
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be nonzero");
        Self {
            capacity,
            cursor: 0,
            high_water: 0,
        }
    }

    /// Allocate `size` bytes, aligned to `alignment`.
    ///
    /// Returns the byte offset of the allocation. `alignment` is the
    /// backend's minimum offset alignment (uniform/storage buffer) queried
    /// at startup and must be a power of two.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero or if the frame's total allocation would
    /// exceed the ring capacity.
    pub fn allocate(&mut self, size: u32, alignment: u32) -> u32 {
        assert!(size > 0, "zero-sized ring buffer allocation");
        assert!(
            alignment.is_power_of_two(),
            "ring buffer alignment must be a power of two, got {}",
            alignment
        );

        let offset = align_up(self.cursor, alignment);
        let end = offset
            .checked_add(size)
            .unwrap_or_else(|| panic!("ring buffer allocation of {} bytes overflows", size));
        if end > self.capacity {
            panic!(
                "ephemeral ring buffer exhausted: {} bytes requested at offset {}, capacity {}; \
                 increase RendererDesc::ephemeral_ring_buf_size",
                size, offset, self.capacity
            );
        }

        self.cursor = end;
        self.high_water = self.high_water.max(end);
        offset
    }

    /// Reset the cursor to zero. Called once per frame at present, after the
    /// frame's fence has signaled.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Bytes allocated since the last reset
    pub fn used(&self) -> u32 {
        self.cursor
    }

    /// Bytes still available this frame
    pub fn remaining(&self) -> u32 {
        self.capacity - self.cursor
    }

    /// Total capacity in bytes
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Largest end-of-frame usage ever reached
    pub fn high_water_mark(&self) -> u32 {
        self.high_water
    }
}

/// Round `value` up to the next multiple of `alignment` (a power of two)
pub fn align_up(value: u32, alignment: u32) -> u32 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
#[path = "ring_buffer_tests.rs"]
mod tests;
