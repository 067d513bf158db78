//! # transp
//!
//! A collection of order-independent transparency techniques that could be
//! switched at runtime, drawn over a background image on top of OpenGL or a
//! deterministic software rasterizer.
//!
//! The rendering layer lives in `video`, the per-pixel algorithms shared by
//! both backends in `oit`, and the multi-pass techniques with their render
//! targets in `techniques`.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

extern crate cgmath;
extern crate gl;
extern crate glutin;
extern crate image;
extern crate obj;
extern crate rand;
extern crate rayon;
extern crate serde_json;
extern crate smallvec;

#[macro_use]
pub mod utils;
pub mod errors;
pub mod math;

pub mod video;

pub mod oit;
pub mod techniques;

pub mod scene;
pub mod settings;
pub mod window;

pub mod demo;

pub mod prelude {
    pub use crate::demo::{Action, Demo};
    pub use crate::errors::*;
    pub use crate::math::prelude::*;
    pub use crate::scene::{Camera, Scene, Section};
    pub use crate::settings::Settings;
    pub use crate::techniques::prelude::*;
    pub use crate::video::prelude::*;
    pub use crate::window::prelude::*;
}
