//! Rolling capture history of the reverb's input.

// -------------------------------------------------------------------------------------------------

/// Multi channel circular buffer which holds the most recent `capture_len` input frames.
///
/// All channels share a single write head which advances exactly once per written frame, so
/// channels always stay index-aligned. The buffer is allocated once and never grows.
///
/// Positions are addressed as offsets behind the write head: offset 1 is the most recently
/// written frame, offset `capture_len` the oldest one still available.
#[derive(Debug)]
pub struct CaptureBuffer<const CHANNELS: usize> {
    channels: [Box<[f32]>; CHANNELS],
    capture_len: usize,
    write_pos: usize,
    frames_written: u64,
    last_audible_frame: Option<u64>,
}

impl<const CHANNELS: usize> CaptureBuffer<CHANNELS> {
    /// Create a new, silent capture buffer which holds `capture_len` frames.
    pub fn new(capture_len: usize) -> Self {
        assert!(capture_len > 0, "Capture buffer length must be > 0");
        let channels = std::array::from_fn(|_| vec![0.0; capture_len].into_boxed_slice());
        Self {
            channels,
            capture_len,
            write_pos: 0,
            frames_written: 0,
            last_audible_frame: None,
        }
    }

    /// Number of frames the buffer holds.
    #[inline]
    pub fn capture_len(&self) -> usize {
        self.capture_len
    }

    /// Total number of frames written since creation or the last [`Self::flush`].
    #[inline]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// True when the buffer holds no non-zero sample: either nothing audible got written
    /// yet, or all audible frames got overwritten by silence already.
    #[inline]
    pub fn is_silent(&self) -> bool {
        match self.last_audible_frame {
            None => true,
            Some(frame) => self.frames_written - frame > self.capture_len as u64,
        }
    }

    /// Clear all content and reset the write head.
    pub fn flush(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
        self.write_pos = 0;
        self.frames_written = 0;
        self.last_audible_frame = None;
    }

    /// Write a single frame at the write head and advance the head by one frame.
    #[inline]
    pub fn write_frame(&mut self, frame: &[f32; CHANNELS]) {
        let mut audible = false;
        for (channel, sample) in self.channels.iter_mut().zip(frame) {
            channel[self.write_pos] = *sample;
            audible |= *sample != 0.0;
        }
        if audible {
            self.last_audible_frame = Some(self.frames_written);
        }
        self.frames_written += 1;
        self.write_pos += 1;
        if self.write_pos == self.capture_len {
            self.write_pos = 0;
        }
    }

    /// Access `len` consecutive samples of the given channel, starting `start_offset_back`
    /// frames behind the write head, as two contiguous parts: the second part is non-empty
    /// only when the range wraps around the end of the circular buffer.
    ///
    /// The range must lie in the captured past: `len <= start_offset_back <= capture_len`.
    #[inline]
    pub fn slices(&self, channel: usize, start_offset_back: usize, len: usize) -> (&[f32], &[f32]) {
        debug_assert!(
            start_offset_back <= self.capture_len,
            "Capture read offset exceeds the capture length"
        );
        debug_assert!(
            len <= start_offset_back,
            "Capture reads must not overtake the write head"
        );
        let buffer = &self.channels[channel];
        let start = if start_offset_back <= self.write_pos {
            self.write_pos - start_offset_back
        } else {
            self.write_pos + self.capture_len - start_offset_back
        };
        let first_len = len.min(self.capture_len - start);
        (
            &buffer[start..start + first_len],
            &buffer[..len - first_len],
        )
    }

    /// Copy `output.len()` consecutive samples of the given channel, starting
    /// `start_offset_back` frames behind the write head, into `output`.
    ///
    /// See [`Self::slices`] for the valid offset range.
    pub fn read_slice(&self, channel: usize, start_offset_back: usize, output: &mut [f32]) {
        let (first, second) = self.slices(channel, start_offset_back, output.len());
        output[..first.len()].copy_from_slice(first);
        output[first.len()..].copy_from_slice(second);
    }
}

// -------------------------------------------------------------------------------------------------
