//! The library of transparency techniques.
//!
//! Every technique is a multi-pass procedure that composites the transparent
//! scene over the background already drawn by the `FrameDriver`, and leaves
//! the final image in the default framebuffer. Techniques own their pipeline
//! states (one immutable shader object per combination of blending, masks and
//! culling they need) and share render targets through the `FramebufferPool`.

pub mod abuffer;
pub mod adaptive;
pub mod controller;
pub mod depth_peel;
pub mod driver;
pub mod forward;
pub mod pool;
pub mod refract;
pub mod weighted;

pub mod prelude {
    pub use super::controller::ModeController;
    pub use super::driver::FrameDriver;
    pub use super::pool::{FramebufferPool, PoolParams, TargetKind};
    pub use super::{FrameContext, Technique, TechniqueId};
}

use std::fmt;
use std::str::FromStr;

use crate::errors::*;
use crate::math::prelude::*;
use crate::scene::{Camera, Section};
use crate::video::prelude::*;

use self::pool::FramebufferPool;

/// Identifies a technique. The declaration order is the default cycling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechniqueId {
    #[serde(rename = "alpha")]
    Alpha,
    #[serde(rename = "alpha-dp")]
    AlphaDp,
    #[serde(rename = "abuffer")]
    ABuffer,
    #[serde(rename = "adaptive")]
    Adaptive,
    #[serde(rename = "meshkin")]
    Meshkin,
    #[serde(rename = "bavoil-myers")]
    BavoilMyers,
    #[serde(rename = "bavoil-mcguire")]
    BavoilMcGuire,
    #[serde(rename = "bavoil-mcguire-weighted")]
    BavoilMcGuireWeighted,
    #[serde(rename = "refract")]
    Refract,
    #[serde(rename = "refract-dp")]
    RefractDp,
    #[serde(rename = "additive")]
    Additive,
    #[serde(rename = "multiplicative")]
    Multiplicative,
}

impl TechniqueId {
    pub const ALL: [TechniqueId; 12] = [
        TechniqueId::Alpha,
        TechniqueId::AlphaDp,
        TechniqueId::ABuffer,
        TechniqueId::Adaptive,
        TechniqueId::Meshkin,
        TechniqueId::BavoilMyers,
        TechniqueId::BavoilMcGuire,
        TechniqueId::BavoilMcGuireWeighted,
        TechniqueId::Refract,
        TechniqueId::RefractDp,
        TechniqueId::Additive,
        TechniqueId::Multiplicative,
    ];

    /// The identifier used on the command line and in settings files.
    pub fn name(self) -> &'static str {
        match self {
            TechniqueId::Alpha => "alpha",
            TechniqueId::AlphaDp => "alpha-dp",
            TechniqueId::ABuffer => "abuffer",
            TechniqueId::Adaptive => "adaptive",
            TechniqueId::Meshkin => "meshkin",
            TechniqueId::BavoilMyers => "bavoil-myers",
            TechniqueId::BavoilMcGuire => "bavoil-mcguire",
            TechniqueId::BavoilMcGuireWeighted => "bavoil-mcguire-weighted",
            TechniqueId::Refract => "refract",
            TechniqueId::RefractDp => "refract-dp",
            TechniqueId::Additive => "additive",
            TechniqueId::Multiplicative => "multiplicative",
        }
    }

    /// The human readable description shown in the window title.
    pub fn label(self) -> &'static str {
        match self {
            TechniqueId::Alpha => "plain alpha blending",
            TechniqueId::AlphaDp => "alpha blending with depth peeling",
            TechniqueId::ABuffer => "alpha blending with a A-Buffer (linked list)",
            TechniqueId::Adaptive => "adaptive transparency",
            TechniqueId::Meshkin => "Meshkin's blending",
            TechniqueId::BavoilMyers => "Bavoil's and Myer's blending",
            TechniqueId::BavoilMcGuire => "Bavoil's and McGuire's blending",
            TechniqueId::BavoilMcGuireWeighted => {
                "Bavoil's and McGuire's blending with depth weighting"
            }
            TechniqueId::Refract => "screen-space refraction and absorption",
            TechniqueId::RefractDp => {
                "screen-space refraction and absorption with depth peeling"
            }
            TechniqueId::Additive => "additive blending",
            TechniqueId::Multiplicative => "multiplicative blending",
        }
    }

    /// The number of layers that could be inspected one by one. Zero if the
    /// technique has no inspection mode.
    pub fn layer_cap(self) -> i32 {
        match self {
            TechniqueId::AlphaDp | TechniqueId::ABuffer => 8,
            TechniqueId::RefractDp => 4,
            _ => 0,
        }
    }

    /// Returns true if the technique reads the background from ping-pong A and
    /// writes into ping-pong B, which the driver primes with a copy of A.
    pub fn needs_dual_framebuffer(self) -> bool {
        match self {
            TechniqueId::AlphaDp
            | TechniqueId::Meshkin
            | TechniqueId::BavoilMyers
            | TechniqueId::BavoilMcGuire
            | TechniqueId::BavoilMcGuireWeighted
            | TechniqueId::Refract
            | TechniqueId::RefractDp => true,
            _ => false,
        }
    }
}

impl fmt::Display for TechniqueId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for TechniqueId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TechniqueId::ALL
            .iter()
            .find(|v| v.name() == s)
            .cloned()
            .ok_or_else(|| format_err!("Unknown technique {}.", s))
    }
}

/// Everything a technique reads during a frame.
pub struct FrameContext<'a> {
    pub pool: &'a FramebufferPool,
    pub sections: &'a [Section],
    pub camera: &'a Camera,
    /// The inspected layer, or -1 to composite every layer.
    pub layer: i32,
    /// Replaces the opacity every technique gives its fragments.
    pub opacity: Option<f32>,
}

impl<'a> FrameContext<'a> {
    /// Draws every section with `shader`, after `f` added the uniforms of the
    /// pass. The transforms `mat_mvp` and `mat_nrp` are always provided.
    pub fn draw_sections<F>(
        &self,
        video: &mut VideoSystem,
        shader: ShaderHandle,
        f: F,
    ) -> Result<()>
    where
        F: Fn(Draw) -> Draw,
    {
        for section in self.sections {
            let dc = Draw::new(shader, section.mesh)
                .with("mat_mvp", self.camera.mvp(&section.transform))
                .with("mat_nrp", self.camera.nrp(&section.transform));

            video.draw(&f(dc))?;
        }

        Ok(())
    }

    /// Draws a full-screen quad with `shader`.
    pub fn draw_quad<F>(&self, video: &mut VideoSystem, shader: ShaderHandle, f: F) -> Result<()>
    where
        F: FnOnce(Draw) -> Draw,
    {
        let dc = Draw::new(shader, self.pool.quad());
        video.draw(&f(dc))
    }

    /// Copies the color of `src` into the default framebuffer, which stays
    /// bound.
    pub fn present(&self, video: &mut VideoSystem, src: SurfaceHandle) -> Result<()> {
        self.pool.blit(video, src, Target::Window, BlitMask::Color)
    }

    /// Returns true if a single layer is inspected.
    #[inline]
    pub fn is_inspecting(&self) -> bool {
        self.layer >= 0
    }

    /// The opacity of fragments, `default` unless it is overridden.
    #[inline]
    pub fn alpha(&self, default: f32) -> f32 {
        self.opacity.unwrap_or(default)
    }
}

/// A transparency technique.
pub trait Technique {
    fn id(&self) -> TechniqueId;

    /// Composites the scene over the background and leaves the result in the
    /// default framebuffer.
    fn render(&self, video: &mut VideoSystem, frame: &FrameContext) -> Result<()>;

    /// Releases the shader objects of this technique.
    fn delete(&self, video: &mut VideoSystem) -> Result<()>;
}

/// The opacity of transparent fragments, unless a technique overrides it.
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Creates the technique identified by `id`.
pub fn create(video: &mut VideoSystem, id: TechniqueId) -> Result<Box<dyn Technique>> {
    let technique: Box<dyn Technique> = match id {
        TechniqueId::Alpha | TechniqueId::Additive | TechniqueId::Multiplicative => {
            Box::new(forward::Forward::new(video, id)?)
        }
        TechniqueId::AlphaDp => Box::new(depth_peel::DepthPeeling::new(video)?),
        TechniqueId::ABuffer => Box::new(abuffer::ABuffer::new(video)?),
        TechniqueId::Adaptive => Box::new(adaptive::Adaptive::new(video)?),
        TechniqueId::Meshkin => Box::new(weighted::Meshkin::new(video)?),
        TechniqueId::BavoilMyers => Box::new(weighted::BavoilMyers::new(video)?),
        TechniqueId::BavoilMcGuire | TechniqueId::BavoilMcGuireWeighted => {
            Box::new(weighted::BavoilMcGuire::new(video, id)?)
        }
        TechniqueId::Refract => Box::new(refract::Refraction::new(video)?),
        TechniqueId::RefractDp => Box::new(refract::RefractionPeeling::new(video)?),
    };

    debug!("Creates technique {}.", id);
    Ok(technique)
}

/// Creates a shader object for `program` with `state`.
pub(crate) fn shader(
    video: &mut VideoSystem,
    program: Program,
    state: RenderState,
) -> Result<ShaderHandle> {
    video.create_shader(ShaderParams::new(program, state))
}

/// Deletes a group of shader objects.
pub(crate) fn delete_shaders(video: &mut VideoSystem, shaders: &[ShaderHandle]) -> Result<()> {
    for &v in shaders {
        video.delete_shader(v)?;
    }

    Ok(())
}

/// Premultiplied over, `src + dst * (1 - src.a)`.
pub(crate) fn over() -> RenderState {
    RenderState::default().with_blend(
        BlendFactor::One,
        BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
    )
}

/// Resolves `(average color, transmittance)` against the destination.
pub(crate) fn resolve() -> RenderState {
    RenderState::default().with_blend(
        BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
        BlendFactor::Value(BlendValue::SourceAlpha),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names() {
        for &v in &TechniqueId::ALL {
            assert_eq!(v.name().parse::<TechniqueId>().unwrap(), v);
            let json = ::serde_json::to_string(&v).unwrap();
            assert_eq!(json, format!("\"{}\"", v.name()));
        }

        assert!("alpha-blending".parse::<TechniqueId>().is_err());
    }

    #[test]
    fn flags() {
        assert_eq!(TechniqueId::AlphaDp.layer_cap(), 8);
        assert_eq!(TechniqueId::RefractDp.layer_cap(), 4);
        assert_eq!(TechniqueId::Adaptive.layer_cap(), 0);

        assert!(TechniqueId::Refract.needs_dual_framebuffer());
        assert!(!TechniqueId::ABuffer.needs_dual_framebuffer());
        assert!(!TechniqueId::Alpha.needs_dual_framebuffer());
    }
}
