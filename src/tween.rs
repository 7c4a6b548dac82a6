/// Linear interpolation of an angle over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleTween {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
}

impl AngleTween {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    /// A finished tween resting at `angle`.
    pub fn settled(angle: f32) -> Self {
        Self::new(angle, angle, 0.0)
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    pub fn current(&self) -> f32 {
        self.from + (self.to - self.from) * self.progress()
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.current()
    }

    /// Heads for `to` from wherever the tween is now. The duration is the
    /// share of `full_duration` that the remaining angle is of `full_span`,
    /// so the angular speed stays constant when reversing mid-swing.
    pub fn retarget(&mut self, to: f32, full_duration: f32, full_span: f32) {
        let from = self.current();
        let duration = if full_span.abs() <= f32::EPSILON {
            full_duration
        } else {
            full_duration * ((to - from).abs() / full_span.abs()).min(1.0)
        };
        *self = Self::new(from, to, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn interpolates_linearly_and_stops() {
        let mut tween = AngleTween::new(0.0, -FRAC_PI_2, 1.0);
        assert!((tween.advance(0.5) + FRAC_PI_2 / 2.0).abs() < 1e-6);
        assert!(!tween.is_finished());
        assert_eq!(tween.advance(5.0), -FRAC_PI_2);
        assert!(tween.is_finished());
    }

    #[test]
    fn settled_tween_is_finished() {
        let tween = AngleTween::settled(0.3);
        assert!(tween.is_finished());
        assert_eq!(tween.current(), 0.3);
    }

    #[test]
    fn reversing_keeps_angular_speed() {
        let mut tween = AngleTween::new(0.0, -FRAC_PI_2, 1.0);
        tween.advance(0.25);
        tween.retarget(0.0, 1.0, FRAC_PI_2);
        assert!((tween.current() + FRAC_PI_2 / 4.0).abs() < 1e-6);
        tween.advance(0.2);
        assert!(!tween.is_finished());
        assert!(tween.advance(0.1).abs() < 1e-6);
        assert!(tween.is_finished());
    }
}
