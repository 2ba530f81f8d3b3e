//! Helpers to access interleaved sample buffers.

// -------------------------------------------------------------------------------------------------

/// Read-only frame access to an interleaved sample buffer.
pub trait InterleavedBuffer {
    /// View the buffer as a slice of fixed sized frames.
    ///
    /// The buffer's length must be a multiple of `CHANNELS`.
    fn as_frames<const CHANNELS: usize>(&self) -> &[[f32; CHANNELS]];
}

impl InterleavedBuffer for [f32] {
    fn as_frames<const CHANNELS: usize>(&self) -> &[[f32; CHANNELS]] {
        assert!(CHANNELS > 0 && self.len() % CHANNELS == 0);
        // SAFETY: [f32; N] has the same layout as N consecutive f32 values and the length
        // got checked above.
        unsafe {
            std::slice::from_raw_parts(
                self.as_ptr() as *const [f32; CHANNELS],
                self.len() / CHANNELS,
            )
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Mutable frame access to an interleaved sample buffer.
pub trait InterleavedBufferMut {
    /// View the buffer as a mutable slice of fixed sized frames.
    ///
    /// The buffer's length must be a multiple of `CHANNELS`.
    fn as_frames_mut<const CHANNELS: usize>(&mut self) -> &mut [[f32; CHANNELS]];
}

impl InterleavedBufferMut for [f32] {
    fn as_frames_mut<const CHANNELS: usize>(&mut self) -> &mut [[f32; CHANNELS]] {
        assert!(CHANNELS > 0 && self.len() % CHANNELS == 0);
        // SAFETY: see `as_frames`
        unsafe {
            std::slice::from_raw_parts_mut(
                self.as_mut_ptr() as *mut [f32; CHANNELS],
                self.len() / CHANNELS,
            )
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Set all samples of the given buffer to zero.
#[inline]
pub fn clear_buffer(buffer: &mut [f32]) {
    buffer.fill(0.0);
}

/// Returns true when all samples in the buffer are exactly zero.
#[inline]
pub fn is_silent(buffer: &[f32]) -> bool {
    buffer.iter().all(|s| *s == 0.0)
}

// -------------------------------------------------------------------------------------------------
