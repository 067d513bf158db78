//! Weighted blended approximations: a commutative accumulation pass, then a
//! resolve pass against the background where one is needed.

use crate::errors::*;
use crate::math::prelude::*;
use crate::video::prelude::*;

use super::pool::Accumulation;
use super::{FrameContext, Technique, TechniqueId, DEFAULT_ALPHA};

fn additive() -> RenderState {
    RenderState::default().with_blend(BlendFactor::One, BlendFactor::One)
}

/// Resolves an accumulation target into ping-pong A, which holds the
/// background, and presents the result.
fn resolve(
    video: &mut VideoSystem,
    frame: &FrameContext,
    shader: ShaderHandle,
    target: Accumulation,
    aux: &'static str,
) -> Result<()> {
    let a = frame.pool.ping_pong_a();
    video.bind(a.surface)?;

    frame.draw_quad(video, shader, |dc| {
        dc.with("accum", target.accum).with(aux, target.aux)
    })?;

    frame.present(video, a.surface)
}

/// Meshkin's blending adds the difference of every fragment to the background.
pub struct Meshkin {
    shader: ShaderHandle,
}

impl Meshkin {
    pub fn new(video: &mut VideoSystem) -> Result<Self> {
        let shader = super::shader(video, Program::Meshkin, additive())?;
        Ok(Meshkin { shader })
    }
}

impl Technique for Meshkin {
    fn id(&self) -> TechniqueId {
        TechniqueId::Meshkin
    }

    fn render(&self, video: &mut VideoSystem, frame: &FrameContext) -> Result<()> {
        let (a, b) = (frame.pool.ping_pong_a(), frame.pool.ping_pong_b());

        video.bind(b.surface)?;
        frame.draw_sections(video, self.shader, |dc| {
            dc.with("alpha", frame.alpha(DEFAULT_ALPHA)).with("fb", a.color)
        })?;

        frame.present(video, b.surface)
    }

    fn delete(&self, video: &mut VideoSystem) -> Result<()> {
        video.delete_shader(self.shader)
    }
}

/// Bavoil and Myers average the colors of the fragments, and approximate the
/// transmittance with the average alpha.
pub struct BavoilMyers {
    accum: ShaderHandle,
    resolve: ShaderHandle,
}

impl BavoilMyers {
    pub fn new(video: &mut VideoSystem) -> Result<Self> {
        Ok(BavoilMyers {
            accum: super::shader(video, Program::BavoilMyersAccum, additive())?,
            resolve: super::shader(video, Program::BavoilMyersResolve, super::resolve())?,
        })
    }
}

impl Technique for BavoilMyers {
    fn id(&self) -> TechniqueId {
        TechniqueId::BavoilMyers
    }

    fn render(&self, video: &mut VideoSystem, frame: &FrameContext) -> Result<()> {
        let target = frame.pool.bavoil_myers();

        video.bind(target.surface)?;
        video.clear(Color::transparent(), None)?;
        let alpha = frame.alpha(DEFAULT_ALPHA);
        frame.draw_sections(video, self.accum, |dc| dc.with("alpha", alpha))?;

        resolve(video, frame, self.resolve, target, "count")
    }

    fn delete(&self, video: &mut VideoSystem) -> Result<()> {
        super::delete_shaders(video, &[self.accum, self.resolve])
    }
}

/// Bavoil and McGuire average the colors of the fragments, optionally weighted
/// by depth, and multiply the exact transmittance.
pub struct BavoilMcGuire {
    id: TechniqueId,
    accum: ShaderHandle,
    resolve: ShaderHandle,
}

impl BavoilMcGuire {
    /// Creates `BavoilMcGuire` or its depth weighted variant.
    pub fn new(video: &mut VideoSystem, id: TechniqueId) -> Result<Self> {
        let program = match id {
            TechniqueId::BavoilMcGuire => Program::BavoilMcGuireAccum,
            TechniqueId::BavoilMcGuireWeighted => Program::BavoilMcGuireWeightedAccum,
            _ => bail!("{} is not a Bavoil-McGuire technique.", id),
        };

        let state = RenderState::default()
            .with_blend_at(0, BlendFactor::One, BlendFactor::One)
            .with_blend_at(
                1,
                BlendFactor::Zero,
                BlendFactor::Value(BlendValue::SourceColor),
            );

        Ok(BavoilMcGuire {
            id,
            accum: super::shader(video, program, state)?,
            resolve: super::shader(video, Program::BavoilMcGuireResolve, super::resolve())?,
        })
    }
}

impl Technique for BavoilMcGuire {
    fn id(&self) -> TechniqueId {
        self.id
    }

    fn render(&self, video: &mut VideoSystem, frame: &FrameContext) -> Result<()> {
        let target = frame.pool.bavoil_mcguire();

        video.bind(target.surface)?;
        video.clear_attachment(0, Color::transparent())?;
        video.clear_attachment(1, Color::white())?;
        let alpha = frame.alpha(DEFAULT_ALPHA);
        frame.draw_sections(video, self.accum, |dc| dc.with("alpha", alpha))?;

        resolve(video, frame, self.resolve, target, "transp")
    }

    fn delete(&self, video: &mut VideoSystem) -> Result<()> {
        super::delete_shaders(video, &[self.accum, self.resolve])
    }
}
