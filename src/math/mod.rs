//! This module contains the math utils that mainly comes from `cgmath`.

pub use cgmath::*;

pub mod color;
pub use self::color::Color;

pub mod prelude {
    pub use super::color::Color;
    pub use cgmath::prelude::*;
    pub use cgmath::{Deg, Matrix3, Matrix4, Point3, Rad, Vector2, Vector3, Vector4};
}
