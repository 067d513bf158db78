//! Adaptive transparency.
//!
//! The visibility pass inserts every fragment into a bounded visibility
//! function per pixel, inside a critical section guarded by a lock texel, and
//! attenuates the background by the transmittance of the fragment. The
//! composite pass redraws the scene and adds every fragment weighted by the
//! visibility in front of it.

use crate::errors::*;
use crate::video::prelude::*;

use super::{FrameContext, Technique, TechniqueId, DEFAULT_ALPHA};

struct Shaders {
    visibility: ShaderHandle,
    composite: ShaderHandle,
}

pub struct Adaptive {
    shaders: Option<Shaders>,
}

impl Adaptive {
    /// Creates the technique. It renders nothing on devices without storage
    /// images.
    pub fn new(video: &mut VideoSystem) -> Result<Self> {
        if !video.features().image_load_store {
            warn!("{} needs atomic image load/store, it is disabled.", TechniqueId::Adaptive);
            return Ok(Adaptive { shaders: None });
        }

        let visibility = RenderState::default().with_blend(
            BlendFactor::Zero,
            BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
        );

        let composite = RenderState::default()
            .with_blend(BlendFactor::Value(BlendValue::SourceAlpha), BlendFactor::One);

        let shaders = Shaders {
            visibility: super::shader(video, Program::AdaptiveVisibility, visibility)?,
            composite: super::shader(video, Program::AdaptiveComposite, composite)?,
        };

        Ok(Adaptive {
            shaders: Some(shaders),
        })
    }
}

impl Technique for Adaptive {
    fn id(&self) -> TechniqueId {
        TechniqueId::Adaptive
    }

    fn render(&self, video: &mut VideoSystem, frame: &FrameContext) -> Result<()> {
        let (shaders, images) = match (self.shaders.as_ref(), frame.pool.visibility()) {
            (Some(shaders), Some(images)) => (shaders, images),
            _ => return Ok(()),
        };

        let alpha = frame.alpha(DEFAULT_ALPHA);
        images.reset(video)?;
        video.bind(Target::Window)?;

        frame.draw_sections(video, shaders.visibility, |dc| {
            dc.with("alpha", alpha)
                .with("alpha_tex", images.alpha)
                .with("depth_tex", images.depth)
                .with("lock_tex", images.lock)
        })?;

        video.memory_barrier(Barrier::ImageAccess)?;

        frame.draw_sections(video, shaders.composite, |dc| {
            dc.with("alpha", alpha)
                .with("alpha_tex", images.alpha)
                .with("depth_tex", images.depth)
        })
    }

    fn delete(&self, video: &mut VideoSystem) -> Result<()> {
        match self.shaders {
            Some(ref v) => super::delete_shaders(video, &[v.visibility, v.composite]),
            None => Ok(()),
        }
    }
}
