//! Power-of-two circular sample buffer with read-at-delay access.

use std::cell::Cell;

/// Error returned when a [`DelayLine`] is misused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DelayLineError {
    /// Requested capacity was zero.
    #[error("delay line capacity must be non-zero")]
    ZeroCapacity,
    /// Requested read offset is not representable in the ring (`offset >= capacity`).
    #[error("read offset {offset} is out of range for capacity {capacity}")]
    OutOfRange {
        /// The offset that was requested.
        offset: u32,
        /// The ring's capacity at the time of the request.
        capacity: u32,
    },
}

/// Fixed-capacity ring of samples with capacity rounded up to a power of two.
///
/// `read(0)` returns the most recently written sample; `read(k)` returns the
/// sample written `k` samples ago. Index arithmetic uses a bitmask, so
/// capacity is always a power of two.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buf: Vec<f32>,
    mask: usize,
    write_index: usize,
    clamped_reads: Cell<u64>,
}

impl DelayLine {
    /// Creates a ring with capacity at least `min_capacity`, rounded up to
    /// the next power of two.
    ///
    /// # Errors
    ///
    /// Returns [`DelayLineError::ZeroCapacity`] if `min_capacity` is zero.
    pub fn new(min_capacity: usize) -> Result<Self, DelayLineError> {
        if min_capacity == 0 {
            return Err(DelayLineError::ZeroCapacity);
        }
        let capacity = min_capacity.next_power_of_two();
        Ok(Self {
            buf: vec![0.0; capacity],
            mask: capacity - 1,
            write_index: 0,
            clamped_reads: Cell::new(0),
        })
    }

    /// The ring's capacity (always a power of two).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Writes `src` into the ring, advancing the write index by `src.len()`.
    pub fn write_block(&mut self, src: &[f32]) {
        for &sample in src {
            self.buf[self.write_index & self.mask] = sample;
            self.write_index = self.write_index.wrapping_add(1);
        }
    }

    /// Returns the sample written `offset` samples ago (`0` = most recent).
    ///
    /// # Errors
    ///
    /// Returns [`DelayLineError::OutOfRange`] if `offset as usize >= capacity()`.
    pub fn read(&self, offset: u32) -> Result<f32, DelayLineError> {
        if offset as usize >= self.buf.len() {
            return Err(DelayLineError::OutOfRange {
                offset,
                capacity: self.buf.len() as u32,
            });
        }
        let index = self.write_index.wrapping_sub(1).wrapping_sub(offset as usize);
        Ok(self.buf[index & self.mask])
    }

    /// As [`Self::read`], but clamps an out-of-range offset to the largest
    /// valid offset instead of failing. Used on the real-time path, where a
    /// caller-side bug (e.g. a delay estimate exceeding capacity) must not
    /// abort a block; the clamp is reported by the caller via metrics.
    pub fn read_clamped(&self, offset: u32) -> f32 {
        let clamped = offset.min(self.buf.len() as u32 - 1);
        if clamped != offset {
            self.clamped_reads.set(self.clamped_reads.get() + 1);
            tracing::debug!(offset, clamped, capacity = self.buf.len(), "read offset clamped");
        }
        self.read(clamped).expect("clamped offset is always in range")
    }

    /// Count of [`Self::read_clamped`] calls that actually clamped their
    /// offset, accumulated since construction or the last [`Self::clear`].
    #[inline]
    pub fn clamped_reads(&self) -> u64 {
        self.clamped_reads.get()
    }

    /// Fills `dst` so that `dst[i]` is the sample written `offset + i`
    /// samples ago — the ring viewed as a time-reversed window starting
    /// `offset` samples back.
    ///
    /// # Errors
    ///
    /// Returns [`DelayLineError::OutOfRange`] if the furthest sample read
    /// (`offset + dst.len() - 1`) falls outside the ring.
    pub fn read_block(&self, dst: &mut [f32], offset: u32) -> Result<(), DelayLineError> {
        if dst.is_empty() {
            return Ok(());
        }
        let furthest = offset as usize + dst.len() - 1;
        if furthest >= self.buf.len() {
            return Err(DelayLineError::OutOfRange {
                offset: furthest as u32,
                capacity: self.buf.len() as u32,
            });
        }
        for (i, out) in dst.iter_mut().enumerate() {
            *out = self.read(offset + i as u32)?;
        }
        Ok(())
    }

    /// Zeroes the ring and resets the write index.
    pub fn clear(&mut self) {
        self.buf.fill(0.0);
        self.write_index = 0;
        self.clamped_reads.set(0);
    }
}
