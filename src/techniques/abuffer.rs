//! Alpha blending with an A-buffer.
//!
//! The build pass pushes every fragment onto the linked list of its pixel: an
//! atomic counter hands out node slots and an atomic exchange swaps the new
//! node in as the head. The resolve pass walks, sorts and composites every
//! list over the background.

use crate::errors::*;
use crate::video::prelude::*;

use super::{FrameContext, Technique, TechniqueId, DEFAULT_ALPHA};

struct Shaders {
    build: ShaderHandle,
    resolve: ShaderHandle,
    resolve_layer: ShaderHandle,
}

pub struct ABuffer {
    shaders: Option<Shaders>,
}

impl ABuffer {
    /// Creates the technique. It renders nothing on devices without storage
    /// images.
    pub fn new(video: &mut VideoSystem) -> Result<Self> {
        if !video.features().image_load_store {
            warn!("{} needs atomic image load/store, it is disabled.", TechniqueId::ABuffer);
            return Ok(ABuffer { shaders: None });
        }

        let build = RenderState::default().with_color_write(false);
        let shaders = Shaders {
            build: super::shader(video, Program::ABufferBuild, build)?,
            resolve: super::shader(video, Program::ABufferResolve, super::over())?,
            resolve_layer: super::shader(video, Program::ABufferResolveLayer, super::over())?,
        };

        Ok(ABuffer {
            shaders: Some(shaders),
        })
    }
}

impl Technique for ABuffer {
    fn id(&self) -> TechniqueId {
        TechniqueId::ABuffer
    }

    fn render(&self, video: &mut VideoSystem, frame: &FrameContext) -> Result<()> {
        let (shaders, lists) = match (self.shaders.as_ref(), frame.pool.lists()) {
            (Some(shaders), Some(lists)) => (shaders, lists),
            _ => return Ok(()),
        };

        let alpha = if frame.is_inspecting() {
            1.0
        } else {
            frame.alpha(DEFAULT_ALPHA)
        };

        lists.reset(video)?;
        video.bind(Target::Window)?;

        frame.draw_sections(video, shaders.build, |dc| {
            dc.with("alpha", alpha)
                .with("head", lists.head)
                .with("list", lists.list)
                .with("counter", lists.counter)
        })?;

        video.memory_barrier(Barrier::ImageAccess)?;

        if frame.is_inspecting() {
            frame.draw_quad(video, shaders.resolve_layer, |dc| {
                dc.with("head", lists.head)
                    .with("list", lists.list)
                    .with("layer", frame.layer)
            })
        } else {
            frame.draw_quad(video, shaders.resolve, |dc| {
                dc.with("head", lists.head).with("list", lists.list)
            })
        }
    }

    fn delete(&self, video: &mut VideoSystem) -> Result<()> {
        match self.shaders {
            Some(ref v) => super::delete_shaders(video, &[v.build, v.resolve, v.resolve_layer]),
            None => Ok(()),
        }
    }
}
