//! Bit-slot layout of one frame.

use crate::MAX_LINES;

/// Per-line values are `u16`, so a frame holds at most this many bit-slots.
pub const MAX_FRAME_BITS: usize = 16;

/// Frame length and the selector mask of each bit-slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameGeometry {
    frame_size: u8,
    selectors: [u16; MAX_FRAME_BITS],
}

impl FrameGeometry {
    /// Lay out a frame of `frame_size` bit-slots.
    ///
    /// `frame_size` must be in `1..=16`. Release builds clamp anything else
    /// into that range.
    pub const fn new(frame_size: u8) -> Self {
        debug_assert!(
            frame_size >= 1 && frame_size as usize <= MAX_FRAME_BITS,
            "frame size must be in 1..=16"
        );
        let frame_size = if frame_size == 0 {
            1
        } else if frame_size as usize > MAX_FRAME_BITS {
            MAX_FRAME_BITS as u8
        } else {
            frame_size
        };

        let mut selectors = [0; MAX_FRAME_BITS];
        let mut i = 0;
        while i < frame_size as usize {
            selectors[i] = 1 << i;
            i += 1;
        }

        Self {
            frame_size,
            selectors,
        }
    }

    /// Number of bit-slots per frame.
    #[inline]
    pub const fn frame_size(&self) -> u8 {
        self.frame_size
    }

    /// Mask isolating the bit sent in `slot`.
    #[inline(always)]
    pub const fn selector(&self, slot: usize) -> u16 {
        self.selectors[slot]
    }

    /// Line levels for `slot`: bit `n` is set when the selected bit of
    /// `values[n]` is set.
    #[inline(always)]
    pub fn composite(&self, slot: usize, values: &[u16]) -> u8 {
        let selector = self.selectors[slot];
        let mut state = 0;
        for (line, value) in values.iter().take(MAX_LINES).enumerate() {
            if value & selector != 0 {
                state |= 1 << line;
            }
        }
        state
    }
}
