//! Single pass blending straight into the default framebuffer, in submission
//! order.

use crate::errors::*;
use crate::video::prelude::*;

use super::{FrameContext, Technique, TechniqueId, DEFAULT_ALPHA};

pub struct Forward {
    id: TechniqueId,
    alpha: f32,
    shader: ShaderHandle,
}

impl Forward {
    /// Creates one of the order dependent techniques: `Alpha`, `Additive` or
    /// `Multiplicative`.
    pub fn new(video: &mut VideoSystem, id: TechniqueId) -> Result<Self> {
        let (alpha, src, dst) = match id {
            TechniqueId::Alpha => (
                DEFAULT_ALPHA,
                BlendFactor::One,
                BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
            ),
            TechniqueId::Additive => (0.2, BlendFactor::One, BlendFactor::One),
            TechniqueId::Multiplicative => (
                0.8,
                BlendFactor::Zero,
                BlendFactor::Value(BlendValue::SourceColor),
            ),
            _ => bail!("{} is not a forward technique.", id),
        };

        let state = RenderState::default().with_blend(src, dst);
        let shader = super::shader(video, Program::Simple, state)?;
        Ok(Forward { id, alpha, shader })
    }
}

impl Technique for Forward {
    fn id(&self) -> TechniqueId {
        self.id
    }

    fn render(&self, video: &mut VideoSystem, frame: &FrameContext) -> Result<()> {
        video.bind(Target::Window)?;
        let alpha = frame.alpha(self.alpha);
        frame.draw_sections(video, self.shader, |dc| dc.with("alpha", alpha))
    }

    fn delete(&self, video: &mut VideoSystem) -> Result<()> {
        video.delete_shader(self.shader)
    }
}
