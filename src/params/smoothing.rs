// Smoothing - Frame-rate independent exponential approach towards a target
//
// Formula: y = target + (y - target) * e^(-rate * dt)
// The result only depends on elapsed time, not on how it was split into frames.

/// Below this distance the value snaps onto the target
const SNAP_EPSILON: f64 = 1e-9;

/// Exponential smoother for one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpSmoother {
    current: f64,
    target: f64,
    rate: f64,
}

impl ExpSmoother {
    /// `rate` is the approach speed in 1/s; non-positive rates never move
    pub fn new(initial_value: f64, rate: f64) -> Self {
        Self {
            current: initial_value,
            target: initial_value,
            rate: rate.max(0.0),
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Advance by `dt` seconds; `dt <= 0` leaves the value unchanged
    #[inline]
    pub fn advance(&mut self, dt: f64) -> f64 {
        if dt > 0.0 {
            self.current = self.target + (self.current - self.target) * (-self.rate * dt).exp();
            if (self.current - self.target).abs() < SNAP_EPSILON {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Jump to `value` without smoothing
    #[inline]
    pub fn reset(&mut self, value: f64) {
        self.current = value;
        self.target = value;
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.current
    }
}

/// Harmonic parameters that glide between chords
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HarmonicVector {
    pub tension: f64,
    /// Chord root as a fraction of the octave, [0, 1)
    pub root_position: f64,
    /// Scale degree as a fraction of the scale, [0, 1]
    pub degree_position: f64,
    /// 1.0 for major-family chords, 0.0 for minor-family, 0.5 when unknown
    pub brightness: f64,
}

/// One smoother per [`HarmonicVector`] component, all at the same rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicSmoother {
    tension: ExpSmoother,
    root_position: ExpSmoother,
    degree_position: ExpSmoother,
    brightness: ExpSmoother,
}

impl HarmonicSmoother {
    pub fn new(initial: HarmonicVector, rate: f64) -> Self {
        Self {
            tension: ExpSmoother::new(initial.tension, rate),
            root_position: ExpSmoother::new(initial.root_position, rate),
            degree_position: ExpSmoother::new(initial.degree_position, rate),
            brightness: ExpSmoother::new(initial.brightness, rate),
        }
    }

    pub fn set_target(&mut self, target: HarmonicVector) {
        self.tension.set_target(target.tension);
        self.root_position.set_target(target.root_position);
        self.degree_position.set_target(target.degree_position);
        self.brightness.set_target(target.brightness);
    }

    pub fn advance(&mut self, dt: f64) -> HarmonicVector {
        HarmonicVector {
            tension: self.tension.advance(dt),
            root_position: self.root_position.advance(dt),
            degree_position: self.degree_position.advance(dt),
            brightness: self.brightness.advance(dt),
        }
    }

    pub fn reset(&mut self, value: HarmonicVector) {
        self.tension.reset(value.tension);
        self.root_position.reset(value.root_position);
        self.degree_position.reset(value.degree_position);
        self.brightness.reset(value.brightness);
    }

    pub fn get(&self) -> HarmonicVector {
        HarmonicVector {
            tension: self.tension.get(),
            root_position: self.root_position.get(),
            degree_position: self.degree_position.get(),
            brightness: self.brightness.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoother_convergence() {
        let mut smoother = ExpSmoother::new(0.0, 8.0);
        smoother.set_target(1.0);

        // 1 - e^(-0.96) after 0.12 s at rate 8
        let value = smoother.advance(0.12);
        assert!((value - (1.0 - (-0.96f64).exp())).abs() < 1e-12);
        assert!(value > 0.6 && value < 0.7);

        for _ in 0..600 {
            smoother.advance(1.0 / 60.0);
        }
        assert_eq!(smoother.get(), 1.0);
    }

    #[test]
    fn test_smoother_frame_rate_independent() {
        let mut coarse = ExpSmoother::new(0.0, 8.0);
        let mut fine = ExpSmoother::new(0.0, 8.0);
        coarse.set_target(1.0);
        fine.set_target(1.0);

        coarse.advance(0.1);
        for _ in 0..10 {
            fine.advance(0.01);
        }
        assert!((coarse.get() - fine.get()).abs() < 1e-9);
    }

    #[test]
    fn test_smoother_no_overshoot() {
        let mut smoother = ExpSmoother::new(0.0, 50.0);
        smoother.set_target(1.0);
        for _ in 0..100 {
            let value = smoother.advance(0.05);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_non_positive_dt_is_a_no_op() {
        let mut smoother = ExpSmoother::new(0.25, 8.0);
        smoother.set_target(1.0);
        assert_eq!(smoother.advance(0.0), 0.25);
        assert_eq!(smoother.advance(-1.0), 0.25);
    }

    #[test]
    fn test_harmonic_reset_jumps() {
        let mut smoother = HarmonicSmoother::new(HarmonicVector::default(), 8.0);
        let target = HarmonicVector {
            tension: 0.5,
            root_position: 7.0 / 12.0,
            degree_position: 5.0 / 7.0,
            brightness: 1.0,
        };
        smoother.set_target(target);
        let halfway = smoother.advance(0.05);
        assert!(halfway.tension > 0.0 && halfway.tension < 0.5);

        smoother.reset(target);
        assert_eq!(smoother.get(), target);
    }
}
