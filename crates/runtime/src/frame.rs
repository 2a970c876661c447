use foundation::time::Time;

/// Frame metadata handed to every render tick.
///
/// Time is derived from the index and a fixed delta so that a recorded
/// sequence of ticks replays identically.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Fixed delta time (seconds).
    pub dt_s: f64,
    /// Time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }
}

/// Hands out consecutive frames at a fixed rate.
#[derive(Debug, Clone)]
pub struct FrameClock {
    next: Frame,
}

impl FrameClock {
    pub fn new(fps: f64) -> Self {
        let dt_s = if fps.is_finite() && fps > 0.0 { 1.0 / fps } else { 1.0 / 60.0 };
        Self {
            next: Frame::new(0, dt_s),
        }
    }

    pub fn advance(&mut self) -> Frame {
        let frame = self.next;
        self.next = frame.next();
        frame
    }

    pub fn frames_elapsed(&self) -> u64 {
        self.next.index
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Frame, FrameClock};
    use foundation::time::Time;

    #[test]
    fn frame_time_is_deterministic() {
        let a = Frame::new(10, 1.0 / 60.0);
        let b = Frame::new(10, 1.0 / 60.0);
        assert_eq!(a, b);
        assert_eq!(a.time, Time(10.0 / 60.0));
    }

    #[test]
    fn clock_hands_out_consecutive_frames() {
        let mut clock = FrameClock::new(2.0);
        let f0 = clock.advance();
        let f1 = clock.advance();
        assert_eq!(f0.index, 0);
        assert_eq!(f1.index, 1);
        assert_eq!(f1.time, Time(0.5));
        assert_eq!(clock.frames_elapsed(), 2);
    }

    #[test]
    fn invalid_rate_falls_back_to_sixty() {
        let mut clock = FrameClock::new(0.0);
        assert_eq!(clock.advance().dt_s, 1.0 / 60.0);
    }
}
