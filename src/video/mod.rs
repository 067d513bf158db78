//! A stateless, low-level rendering layer over OpenGL or a software rasterizer.
//!
//! Every resource is created through `VideoSystem` and referred to by a typed
//! handle afterwards. Pipeline states are immutable, so a technique that needs
//! different blending or color masks in different passes simply creates one
//! shader object per combination.

pub mod assets;
pub mod backends;
pub mod command;
pub mod errors;
pub mod system;

/// Maximum number of color attachments of a surface.
pub const MAX_FRAMEBUFFER_ATTACHMENTS: usize = 4;
/// Maximum number of uniform variables of a draw call.
pub const MAX_UNIFORM_VARIABLES: usize = 16;

pub use self::backends::{Barrier, Features};
pub use self::system::VideoSystem;

pub mod prelude {
    pub use super::assets::prelude::*;
    pub use super::command::Draw;
    pub use super::system::VideoSystem;
    pub use super::{Barrier, Features};
}
