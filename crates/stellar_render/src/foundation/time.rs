//! Time management utilities
//!
//! The scene is driven by the elapsed time passed to each frame, so nothing here
//! reads the system clock: [`FrameTimer`] accumulates the frame deltas and
//! [`StateSequence`] steps through timed keyframes (particle and light states).

/// Accumulates frame times handed to the scene
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl FrameTimer {
    /// Create a new timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame lasting `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        self.delta_time = dt;
        self.total_time += dt;
        self.frame_count += 1;
    }

    /// Duration of the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Sum of all frame durations
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of frames advanced so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average frames per second since creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// A keyframe that can be blended with another one
pub trait Keyframe: Clone {
    /// Seconds it takes to reach this keyframe from the previous one
    fn time_to_reach(&self) -> f32;

    /// Blend from `self` towards `target` (`t` in `[0, 1]`)
    fn interpolate(&self, target: &Self, t: f32) -> Self;
}

/// Steps through a list of keyframes, optionally looping back to the first
#[derive(Debug, Clone)]
pub struct StateSequence<K: Keyframe> {
    states: Vec<K>,
    looping: bool,
    current_index: usize,
    time_since_current: f32,
    finished: bool,
}

impl<K: Keyframe> StateSequence<K> {
    /// Create a sequence positioned at its first keyframe
    pub fn new(states: Vec<K>, looping: bool) -> Self {
        Self {
            states,
            looping,
            current_index: 0,
            time_since_current: 0.0,
            finished: false,
        }
    }

    /// Whether the sequence restarts after its last keyframe
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Whether a non-looping sequence reached its last keyframe
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of keyframes
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the sequence has no keyframes at all
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Start over from the first keyframe
    pub fn restart(&mut self) {
        self.current_index = 0;
        self.time_since_current = 0.0;
        self.finished = false;
    }

    /// Advance by `dt` seconds and return the blended state, `None` without keyframes
    pub fn advance(&mut self, dt: f32) -> Option<K> {
        if self.states.is_empty() {
            return None;
        }
        if !self.finished {
            self.time_since_current += dt;
            // A keyframe with zero duration is passed in the same step, but one
            // step never wraps around more than once
            for _ in 0..self.states.len() {
                let Some(next) = self.next_index() else {
                    self.finished = true;
                    break;
                };
                let duration = self.states[next].time_to_reach();
                if self.time_since_current < duration {
                    break;
                }
                self.time_since_current -= duration;
                self.current_index = next;
            }
        }
        Some(self.current())
    }

    fn next_index(&self) -> Option<usize> {
        if self.current_index + 1 < self.states.len() {
            Some(self.current_index + 1)
        } else if self.looping && self.states.len() > 1 {
            Some(0)
        } else {
            None
        }
    }

    /// The blended state at the current time
    pub fn current(&self) -> K {
        let current = &self.states[self.current_index];
        match self.next_index() {
            Some(next) if !self.finished => {
                let target = &self.states[next];
                let duration = target.time_to_reach();
                let t = if duration > 0.0 { (self.time_since_current / duration).clamp(0.0, 1.0) } else { 1.0 };
                current.interpolate(target, t)
            }
            _ => current.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Level {
        value: f32,
        time: f32,
    }

    impl Keyframe for Level {
        fn time_to_reach(&self) -> f32 {
            self.time
        }

        fn interpolate(&self, target: &Self, t: f32) -> Self {
            Self { value: self.value + (target.value - self.value) * t, time: target.time }
        }
    }

    fn levels() -> Vec<Level> {
        vec![
            Level { value: 0.0, time: 0.0 },
            Level { value: 10.0, time: 1.0 },
            Level { value: 20.0, time: 2.0 },
        ]
    }

    #[test]
    fn test_interpolates_between_keyframes() {
        let mut sequence = StateSequence::new(levels(), false);
        assert_relative_eq!(sequence.advance(0.5).unwrap().value, 5.0);
        assert_relative_eq!(sequence.advance(1.5).unwrap().value, 15.0);
        assert!(!sequence.is_finished());
    }

    #[test]
    fn test_non_looping_sequence_finishes() {
        let mut sequence = StateSequence::new(levels(), false);
        let last = sequence.advance(10.0).unwrap();
        assert_relative_eq!(last.value, 20.0);
        assert!(sequence.is_finished());
    }

    #[test]
    fn test_looping_sequence_wraps() {
        let mut sequence = StateSequence::new(levels(), true);
        // 1 + 2 seconds to reach the last state, then the first one takes no time
        let state = sequence.advance(3.5).unwrap();
        assert!(!sequence.is_finished());
        assert_relative_eq!(state.value, 5.0);
    }

    #[test]
    fn test_frame_timer() {
        let mut timer = FrameTimer::new();
        timer.advance(0.5);
        timer.advance(0.5);
        assert_eq!(timer.frame_count(), 2);
        assert_relative_eq!(timer.average_fps(), 2.0);
    }
}
