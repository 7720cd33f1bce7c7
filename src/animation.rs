use keyframe::{AnimationSequence, EasingFunction, Keyframe};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported easing functions for animations.
///
/// The power curves follow the usual motion-design naming: `Quad` is the
/// gentle first power, `Cubic` the second, `Quart` the strongly
/// decelerating third.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingType {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    QuartOut,
}

impl EasingFunction for EasingType {
    fn y(&self, x: f64) -> f64 {
        match self {
            EasingType::Linear => keyframe::functions::Linear.y(x),
            EasingType::EaseIn => keyframe::functions::EaseIn.y(x),
            EasingType::EaseOut => keyframe::functions::EaseOut.y(x),
            EasingType::EaseInOut => keyframe::functions::EaseInOut.y(x),
            EasingType::QuadIn => keyframe::functions::EaseInQuad.y(x),
            EasingType::QuadOut => keyframe::functions::EaseOutQuad.y(x),
            EasingType::QuadInOut => keyframe::functions::EaseInOutQuad.y(x),
            EasingType::CubicIn => keyframe::functions::EaseInCubic.y(x),
            EasingType::CubicOut => keyframe::functions::EaseOutCubic.y(x),
            EasingType::QuartOut => keyframe::functions::EaseOutQuart.y(x),
        }
    }
}

impl EasingType {
    /// Evaluates the easing curve at a specific point `x` (0.0 to 1.0).
    pub fn eval(&self, x: f32) -> f32 {
        self.y(x as f64) as f32
    }
}

/// A generic animated value that tracks keyframes and current state.
///
/// Time-driven: `update` advances the sequence to an absolute local time.
/// Scroll-scrubbed values use `timeline::PropertyTrack` instead, which
/// samples without mutating playhead state.
#[derive(Clone)]
pub struct Animated<T>
where
    T: Copy + keyframe::CanTween + Default,
{
    /// Raw storage of keyframes (value, absolute_time, easing).
    raw_keyframes: Vec<(T, f64, EasingType)>,
    /// The underlying keyframe sequence used for interpolation.
    pub sequence: AnimationSequence<T>,
    /// The current calculated value for the last updated time.
    pub current_value: T,
}

impl<T> Animated<T>
where
    T: Copy + keyframe::CanTween + Default,
{
    /// Creates a new animated value with an initial state and no motion.
    pub fn new(initial: T) -> Self {
        let raw = vec![(initial, 0.0, EasingType::Linear)];
        let kf = Keyframe::new(initial, 0.0, EasingType::Linear);

        Self {
            sequence: AnimationSequence::from(vec![kf]),
            raw_keyframes: raw,
            current_value: initial,
        }
    }

    /// Appends a new keyframe to the end of the current sequence.
    ///
    /// # Arguments
    /// * `target` - The value to reach.
    /// * `duration` - Time in seconds to reach the target from the previous keyframe.
    /// * `easing` - The easing curve to use.
    pub fn add_keyframe(&mut self, target: T, duration: f64, easing: EasingType) {
        let current_end_time = self.sequence.duration();
        let new_time = current_end_time + duration;

        self.raw_keyframes.push((target, new_time, easing));

        // Rebuild sequence
        let frames: Vec<Keyframe<T>> = self
            .raw_keyframes
            .iter()
            .map(|(val, time, ease_type)| Keyframe::new(*val, *time, *ease_type))
            .collect();

        self.sequence = AnimationSequence::from(frames);
    }

    /// Returns the total duration of the animation sequence in seconds.
    pub fn duration(&self) -> f64 {
        self.sequence.duration()
    }

    /// Adds a discrete animation segment (jump to start, then animate to target).
    pub fn add_segment(&mut self, start: T, target: T, duration: f64, easing: EasingType) {
        if self.sequence.duration() == 0.0 {
            // If no animation exists yet, treat start as the initial value
            *self = Self::new(start);
        } else {
            // If animation exists, we jump to 'start' immediately at the current end time
            self.add_keyframe(start, 0.0, EasingType::Linear);
        }
        self.add_keyframe(target, duration, easing);
    }

    /// Updates `current_value` based on the provided absolute time.
    pub fn update(&mut self, time: f64) {
        self.sequence.advance_to(time);
        self.current_value = self.sequence.now();
    }
}

impl<T> fmt::Debug for Animated<T>
where
    T: Copy + keyframe::CanTween + Default + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animated")
            .field("current_value", &self.current_value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints() {
        let curves = [
            EasingType::Linear,
            EasingType::QuadIn,
            EasingType::QuadOut,
            EasingType::QuadInOut,
            EasingType::CubicIn,
            EasingType::CubicOut,
            EasingType::QuartOut,
        ];
        for curve in curves {
            assert!(curve.eval(0.0).abs() < 1e-4, "{:?} start", curve);
            assert!((curve.eval(1.0) - 1.0).abs() < 1e-4, "{:?} end", curve);
        }
    }

    #[test]
    fn easing_monotonic() {
        let curves = [EasingType::QuadIn, EasingType::CubicOut, EasingType::QuartOut];
        for curve in curves {
            let mut prev = 0.0f32;
            for step in 1..=100 {
                let v = curve.eval(step as f32 / 100.0);
                assert!(v >= prev - 1e-4, "{:?} not monotonic at {}", curve, step);
                prev = v;
            }
        }
    }

    #[test]
    fn animated_segment_playback() {
        let mut anim = Animated::new(0.0f32);
        anim.add_keyframe(10.0, 1.0, EasingType::Linear);
        anim.update(0.5);
        assert!((anim.current_value - 5.0).abs() < 1e-4);
        anim.update(2.0);
        assert!((anim.current_value - 10.0).abs() < 1e-4);
    }
}
