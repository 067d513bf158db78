//! A surface is a framebuffer object: a set of color attachments plus an
//! optional depth attachment, all of the same dimensions.

use crate::math::Vector2;
use crate::video::assets::texture::RenderTextureHandle;
use crate::video::MAX_FRAMEBUFFER_ATTACHMENTS;

impl_handle!(SurfaceHandle);

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SurfaceParams {
    pub colors: [Option<RenderTextureHandle>; MAX_FRAMEBUFFER_ATTACHMENTS],
    pub depth: Option<RenderTextureHandle>,
}

impl SurfaceParams {
    /// Returns true if `rt` is attached to this surface.
    pub fn is_attached(&self, rt: RenderTextureHandle) -> bool {
        self.depth == Some(rt) || self.colors.iter().any(|v| *v == Some(rt))
    }
}

/// The destination of draws and clears, either the default framebuffer of the
/// window or an off-screen surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Window,
    Surface(SurfaceHandle),
}

impl From<SurfaceHandle> for Target {
    fn from(handle: SurfaceHandle) -> Self {
        Target::Surface(handle)
    }
}

/// A rectangle in pixels, with the origin at the bottom-left corner.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub position: Vector2<u32>,
    pub size: Vector2<u32>,
}

impl Rect {
    #[inline]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            position: Vector2::new(x, y),
            size: Vector2::new(width, height),
        }
    }

    #[inline]
    pub fn with_size(size: Vector2<u32>) -> Self {
        Rect {
            position: Vector2::new(0, 0),
            size,
        }
    }
}

/// The buffers copied by a blit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlitMask {
    Color,
    ColorDepth,
}
