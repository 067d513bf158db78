//! The fixed orthographic camera looking at the scene.

use crate::math::prelude::*;

/// The distance between the eye and the center of the scene.
pub const DISTANCE: f32 = 5.0;

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    aspect: f32,
    /// Half of the horizontal extent of the view volume.
    half_width: f32,
    clip: Vector2<f32>,
    view: Matrix4<f32>,
}

impl Camera {
    /// Creates a camera for a viewport of `dimensions`, framing one object or
    /// two objects side by side.
    pub fn new(dimensions: Vector2<u32>, two_objects: bool) -> Self {
        let mut camera = Camera {
            aspect: 1.0,
            half_width: if two_objects { 4.0 } else { 2.0 },
            clip: Vector2::new(0.0, 10.0),
            view: Matrix4::identity(),
        };

        camera.set_dimensions(dimensions);
        camera.reset();
        camera
    }

    /// Gets the aspect ratio (width divided by height).
    #[inline]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_dimensions(&mut self, dimensions: Vector2<u32>) {
        self.aspect = dimensions.x.max(1) as f32 / dimensions.y.max(1) as f32;
    }

    /// Puts the scene back in front of the eye, without any rotation.
    pub fn reset(&mut self) {
        self.view = Matrix4::from_translation(Vector3::new(0.0, 0.0, -DISTANCE));
    }

    /// Rotates the scene around `axis`, in its own frame.
    pub fn rotate<T: Into<Rad<f32>>>(&mut self, axis: Vector3<f32>, angle: T) {
        self.view = self.view * Matrix4::from_axis_angle(axis.normalize(), angle);
    }

    #[inline]
    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }

    /// Gets the projection matrix.
    pub fn matrix(&self) -> Matrix4<f32> {
        let hsize = self.half_width;
        let vsize = hsize / self.aspect;
        Camera::ortho_matrix(-hsize, hsize, -vsize, vsize, self.clip.x, self.clip.y)
    }

    /// Gets the orthographic projection matrix, looking down the negative z-axis.
    pub fn ortho_matrix(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Matrix4<f32> {
        let c0 = [2.0 / (r - l), 0.0, 0.0, 0.0];
        let c1 = [0.0, 2.0 / (t - b), 0.0, 0.0];
        let c2 = [0.0, 0.0, 2.0 / (n - f), 0.0];
        let c3 = [(r + l) / (l - r), (t + b) / (b - t), (f + n) / (n - f), 1.0];
        Matrix4::from_cols(c0.into(), c1.into(), c2.into(), c3.into())
    }

    /// The transform from the local space of a section into clip space.
    pub fn mvp(&self, section: &Matrix4<f32>) -> Matrix4<f32> {
        self.matrix() * *section * self.view
    }

    /// The transform of normals of a section into the scaled view space used by
    /// screen-space refraction.
    pub fn nrp(&self, section: &Matrix4<f32>) -> Matrix3<f32> {
        let mv = upper(section) * upper(&self.view);
        let normal = mv.invert().unwrap_or_else(Matrix3::identity).transpose();
        upper(&self.matrix()) * normal
    }
}

fn upper(m: &Matrix4<f32>) -> Matrix3<f32> {
    Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn projection() {
        let camera = Camera::new(Vector2::new(200, 100), true);
        assert_eq!(camera.aspect(), 2.0);

        let m = camera.mvp(&Matrix4::identity());
        let center = m * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(center.x.abs() < 1e-6 && center.y.abs() < 1e-6);
        assert!(center.z.abs() < 1e-6);

        let corner = m * Vector4::new(4.0, 2.0, 0.0, 1.0);
        assert!((corner.x - 1.0).abs() < 1e-6);
        assert!((corner.y - 1.0).abs() < 1e-6);

        // Nearer to the eye maps to a smaller depth.
        let near = m * Vector4::new(0.0, 0.0, 1.0, 1.0);
        assert!(near.z < center.z);
    }

    #[test]
    fn normals() {
        let mut camera = Camera::new(Vector2::new(100, 100), false);
        camera.rotate(Vector3::new(0.0, 1.0, 0.0), Deg(90.0));

        let section = Matrix4::from_translation(Vector3::new(-2.0, 0.0, 0.0));
        let n = camera.nrp(&section) * Vector3::new(1.0, 0.0, 0.0);
        assert!(n.x.abs() < 1e-5);
        assert!(n.z.abs() > 1e-3);

        camera.reset();
        assert_eq!(camera.view(), Matrix4::from_translation(Vector3::new(0.0, 0.0, -DISTANCE)));
    }
}
