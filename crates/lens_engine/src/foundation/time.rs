//! Frame timing
//!
//! Windows sample the platform clock once per flush and keep the result here. Time values
//! are seconds as `f64`, matching what windowing backends report.

/// Per-window frame timing state
///
/// `tick` is called once per flush. The delta between the two most recent samples drives
/// the FPS figure, which is only reported once it is a real measurement: at least two
/// samples, with time actually having passed between them.
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    current: f64,
    last: f64,
    delta: f64,
    first: Option<f64>,
    frame_count: u64,
}

impl FrameTimer {
    /// Create a timer with no samples
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new frame sampled at `now` seconds
    pub fn tick(&mut self, now: f64) {
        self.frame_count += 1;
        self.current = now;
        self.delta = match self.first {
            Some(_) => self.current - self.last,
            None => {
                self.first = Some(now);
                0.0
            }
        };
        self.last = self.current;
    }

    /// Timestamp of the most recent frame
    pub fn current_time(&self) -> f64 {
        self.current
    }

    /// Seconds between the two most recent frames (0 before the second frame)
    pub fn delta_time(&self) -> f64 {
        self.delta
    }

    /// Number of frames recorded
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Seconds between the first and the most recent frame
    pub fn elapsed(&self) -> f64 {
        self.first.map_or(0.0, |first| self.current - first)
    }

    /// Instantaneous FPS (`1 / delta`)
    ///
    /// `None` until two frames were recorded, and whenever the delta does not produce a
    /// finite, positive rate.
    pub fn fps(&self) -> Option<f64> {
        if self.frame_count < 2 {
            return None;
        }
        let fps = 1.0 / self.delta;
        (fps.is_finite() && fps > 0.0).then_some(fps)
    }

    /// Mean FPS over every interval since the first frame
    pub fn average_fps(&self) -> Option<f64> {
        let elapsed = self.elapsed();
        if self.frame_count < 2 || elapsed <= 0.0 {
            return None;
        }
        Some((self.frame_count - 1) as f64 / elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fps_needs_two_samples() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.fps(), None);

        timer.tick(10.0);
        assert_eq!(timer.frame_count(), 1);
        assert_eq!(timer.fps(), None);
        assert_eq!(timer.delta_time(), 0.0);

        timer.tick(10.5);
        assert_eq!(timer.frame_count(), 2);
        assert_relative_eq!(timer.delta_time(), 0.5);
        assert_relative_eq!(timer.fps().unwrap(), 2.0);
    }

    #[test]
    fn test_zero_delta_is_not_reported() {
        let mut timer = FrameTimer::new();
        timer.tick(1.0);
        timer.tick(1.0);
        assert_eq!(timer.fps(), None);
    }

    #[test]
    fn test_elapsed_and_average() {
        let mut timer = FrameTimer::new();
        for i in 0..=10 {
            timer.tick(2.0 + f64::from(i) * 0.1);
        }
        assert_eq!(timer.frame_count(), 11);
        assert_relative_eq!(timer.elapsed(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(timer.average_fps().unwrap(), 10.0, epsilon = 1e-6);
        assert_relative_eq!(timer.current_time(), 3.0, epsilon = 1e-9);
    }
}
