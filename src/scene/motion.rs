//! The wobbling rotation of the entity scene.

use rand::prng::XorShiftRng;
use rand::{Rng, SeedableRng};

use crate::math::prelude::*;

use super::camera::Camera;

/// The range the tilt of the rotation axis is drawn from.
pub const TILT_RANGE: (f32, f32) = (-0.8, 0.8);

/// Rotates the camera around an axis whose z component springs towards a
/// target tilt, drawing a new target whenever the current one is reached.
pub struct Wobble {
    rng: XorShiftRng,
    z_comp: f32,
    z_target: f32,
    deriv: f32,
    paused: bool,
}

impl Wobble {
    pub fn new(seed: [u8; 16]) -> Self {
        Wobble {
            rng: XorShiftRng::from_seed(seed),
            z_comp: 0.0,
            z_target: 0.0,
            deriv: 0.0,
            paused: false,
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pauses or resumes the motion.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Returns the current tilt of the rotation axis.
    #[inline]
    pub fn tilt(&self) -> f32 {
        self.z_comp
    }

    pub fn reset(&mut self) {
        self.z_comp = 0.0;
        self.z_target = 0.0;
        self.deriv = 0.0;
    }

    /// Advances the motion by `dt` seconds, rotating `camera` by `dt` radians.
    pub fn update(&mut self, camera: &mut Camera, dt: f32) {
        if self.paused {
            return;
        }

        camera.rotate(Vector3::new(0.0, 1.0, self.z_comp), Rad(dt));

        if (self.z_comp - self.z_target).abs() < 0.01 {
            self.z_target = self.rng.gen_range(TILT_RANGE.0, TILT_RANGE.1);
        }

        self.z_comp += self.deriv * dt;
        self.deriv += (self.z_target - self.z_comp) * (dt / 10.0);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wobble() {
        let mut camera = Camera::new(Vector2::new(100, 100), true);
        let mut wobble = Wobble::new([7; 16]);

        for _ in 0..1000 {
            wobble.update(&mut camera, 0.016);
            assert!(wobble.tilt().is_finite());
        }

        assert!(camera.view() != Matrix4::from_translation(Vector3::new(0.0, 0.0, -5.0)));

        wobble.toggle_pause();
        let view = camera.view();
        wobble.update(&mut camera, 0.016);
        assert_eq!(camera.view(), view);

        wobble.reset();
        assert_eq!(wobble.tilt(), 0.0);
    }
}
