use anyhow::{ensure, Result};

/// Steps through the frames of a strip on a fixed cadence, independent of
/// how the sprite moves.
///
/// - at most one frame per `advance` call, a long stall resumes on the next
///   frame instead of skipping ahead
/// - `frame_index` is always in `0..frame_count`
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameAnimator {
    frame_index: usize,
    frame_count: usize,
    frame_duration: f64,
    last_advance: f64,
}

impl FrameAnimator {
    pub fn new(frame_count: usize, fps: f64, now: f64) -> Result<Self> {
        ensure!(frame_count > 0, "animation needs at least one frame");
        ensure!(
            fps.is_finite() && fps > 0.0,
            "animation speed must be positive, got {} fps",
            fps
        );
        Ok(FrameAnimator {
            frame_index: 0,
            frame_count,
            frame_duration: 1000.0 / fps,
            last_advance: now,
        })
    }

    pub fn advance(&mut self, now: f64) {
        if now - self.last_advance >= self.frame_duration {
            self.frame_index = (self.frame_index + 1) % self.frame_count;
            self.last_advance = now;
        }
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }
}

#[cfg(test)]
impl FrameAnimator {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn frame_duration(&self) -> f64 {
        self.frame_duration
    }
}
