//! Playback cursor - maps index, percent and time requests to a frame index
//!
//! # Addressing rules
//!
//! - Percent outside `[0, 1]` wraps cyclically (`p - floor(p)`), then maps
//!   onto `0..total` by truncation, clamped to the last frame.
//! - Time is normalized by the sequence duration at the configured frame
//!   rate, then treated as a percent. It never looks at a wall clock.
//! - Indices: negative ones are rejected, indices past the end wrap with
//!   modulo. The asymmetry is intentional and observable.

use log::error;

use crate::entities::SequenceError;

/// Frame rate used until [`PlaybackCursor::set_frame_rate`] is called
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Frame index for a percentage of the sequence length
pub fn frame_index_at_percent(percent: f64, total: usize) -> usize {
    if total == 0 {
        return 0;
    }

    let mut percent = percent;
    if !(0.0..=1.0).contains(&percent) {
        percent -= percent.floor();
    }

    // NaN and infinities land on 0 through the saturating cast
    ((percent * total as f64) as usize).min(total - 1)
}

/// Inverse of [`frame_index_at_percent`]: `index / (total - 1)`, clamped to `[0, 1]`
pub fn percent_at_frame_index(index: usize, total: usize) -> f64 {
    if total <= 1 {
        return 0.0;
    }
    (index as f64 / (total - 1) as f64).clamp(0.0, 1.0)
}

/// Current frame and frame rate of a sequence
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackCursor {
    current: usize,
    frame_rate: f64,
}

impl Default for PlaybackCursor {
    fn default() -> Self {
        Self {
            current: 0,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl PlaybackCursor {
    pub fn new(frame_rate: f64) -> Result<Self, SequenceError> {
        let mut cursor = Self::default();
        cursor.set_frame_rate(frame_rate)?;
        Ok(cursor)
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn set_current(&mut self, index: usize) {
        self.current = index;
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Change the rate used by time addressing. Does not move the cursor.
    pub fn set_frame_rate(&mut self, frame_rate: f64) -> Result<(), SequenceError> {
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            error!("Ignoring invalid frame rate {}", frame_rate);
            return Err(SequenceError::InvalidFrameRate(frame_rate));
        }
        self.frame_rate = frame_rate;
        Ok(())
    }

    /// Sequence duration in seconds at the current frame rate
    pub fn length_in_seconds(&self, total: usize) -> f64 {
        total as f64 / self.frame_rate
    }

    /// Frame index for a time in seconds
    pub fn frame_for_time(&self, time: f64, total: usize) -> usize {
        if total == 0 {
            return 0;
        }
        frame_index_at_percent(time / self.length_in_seconds(total), total)
    }

    /// Validate and wrap a requested index.
    ///
    /// Negative indices are rejected; indices `>= total` wrap with modulo.
    pub fn wrap_index(index: i64, total: usize) -> Result<usize, SequenceError> {
        if index < 0 {
            error!("Asking for negative index {}", index);
            return Err(SequenceError::NegativeIndex(index));
        }
        if total == 0 {
            return Err(SequenceError::NotLoaded);
        }
        Ok((index as u64 % total as u64) as usize)
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_round_trip() {
        for total in [1usize, 2, 3, 7, 24, 100, 1001] {
            for i in 0..total {
                let p = percent_at_frame_index(i, total);
                assert_eq!(frame_index_at_percent(p, total), i, "total={total} i={i}");
            }
        }
    }

    #[test]
    fn test_percent_wraps_cyclically() {
        let total = 10;
        for p in [0.05, 0.31, 0.5, 0.77, 0.93] {
            let base = frame_index_at_percent(p, total);
            for k in [-3.0, -1.0, 1.0, 2.0, 5.0] {
                assert_eq!(frame_index_at_percent(p + k, total), base, "p={p} k={k}");
            }
        }
        assert_eq!(frame_index_at_percent(-0.25, 4), 3);
        assert_eq!(frame_index_at_percent(1.5, 4), 2);
    }

    #[test]
    fn test_percent_edges() {
        assert_eq!(frame_index_at_percent(0.0, 5), 0);
        assert_eq!(frame_index_at_percent(1.0, 5), 4);
        assert_eq!(frame_index_at_percent(0.999, 5), 4);
        assert_eq!(frame_index_at_percent(f64::NAN, 5), 0);
        assert_eq!(frame_index_at_percent(0.5, 0), 0);

        assert_eq!(percent_at_frame_index(0, 1), 0.0);
        assert_eq!(percent_at_frame_index(9, 5), 1.0);
        assert_eq!(percent_at_frame_index(2, 5), 0.5);
    }

    #[test]
    fn test_frame_for_time() {
        let cursor = PlaybackCursor::default(); // 30 fps
        let total = 60; // 2 seconds
        assert_eq!(cursor.length_in_seconds(total), 2.0);
        assert_eq!(cursor.frame_for_time(0.0, total), 0);
        assert_eq!(cursor.frame_for_time(1.0, total), 30);
        assert_eq!(cursor.frame_for_time(2.0, total), 59);
        // Past the end wraps
        assert_eq!(cursor.frame_for_time(3.0, total), 30);

        let slow = PlaybackCursor::new(15.0).unwrap();
        assert_eq!(slow.length_in_seconds(total), 4.0);
        assert_eq!(slow.frame_for_time(1.0, total), 15);
    }

    #[test]
    fn test_frame_rate_validation() {
        let mut cursor = PlaybackCursor::default();
        cursor.set_current(7);
        assert!(matches!(cursor.set_frame_rate(0.0), Err(SequenceError::InvalidFrameRate(_))));
        assert!(cursor.set_frame_rate(f64::NAN).is_err());
        assert_eq!(cursor.frame_rate(), DEFAULT_FRAME_RATE);

        cursor.set_frame_rate(24.0).unwrap();
        assert_eq!(cursor.frame_rate(), 24.0);
        assert_eq!(cursor.current(), 7);
    }

    #[test]
    fn test_wrap_index() {
        assert_eq!(PlaybackCursor::wrap_index(3, 5).unwrap(), 3);
        assert_eq!(PlaybackCursor::wrap_index(5, 5).unwrap(), 0);
        assert_eq!(PlaybackCursor::wrap_index(12, 5).unwrap(), 2);
        assert!(matches!(PlaybackCursor::wrap_index(-1, 5), Err(SequenceError::NegativeIndex(-1))));
        assert!(matches!(PlaybackCursor::wrap_index(0, 0), Err(SequenceError::NotLoaded)));
    }
}
