//! Screen-space refraction and absorption.
//!
//! Back faces are drawn first, refracting the background. Front faces then
//! refract what the back faces produced, and absorb light along the distance
//! between the front face and the back face behind it.

use crate::errors::*;
use crate::video::prelude::*;

use super::depth_peel;
use super::{FrameContext, Technique, TechniqueId};

/// The number of layers peeled. Every layer is a back face and the front face
/// in front of it.
pub const LAYERS: usize = 4;

fn faces(face: CullFace, test: Comparison, write: bool) -> RenderState {
    RenderState::default()
        .with_cull_face(face)
        .with_depth(test, true)
        .with_color_write(write)
}

/// A single layer of refraction, the nearest surfaces only.
pub struct Refraction {
    back: ShaderHandle,
    front: ShaderHandle,
}

impl Refraction {
    pub fn new(video: &mut VideoSystem) -> Result<Self> {
        let back = faces(CullFace::Front, Comparison::Less, true);
        let front = faces(CullFace::Back, Comparison::Less, true);

        Ok(Refraction {
            back: super::shader(video, Program::RefractBackFace, back)?,
            front: super::shader(video, Program::RefractFrontFace, front)?,
        })
    }
}

impl Technique for Refraction {
    fn id(&self) -> TechniqueId {
        TechniqueId::Refract
    }

    fn render(&self, video: &mut VideoSystem, frame: &FrameContext) -> Result<()> {
        let (a, b) = (frame.pool.ping_pong_a(), frame.pool.ping_pong_b());

        video.bind(b.surface)?;
        frame.draw_sections(video, self.back, |dc| dc.with("fb", a.color))?;

        video.bind(a.surface)?;
        frame.draw_sections(video, self.front, |dc| {
            dc.with("fb", b.color).with("depth", b.depth)
        })?;

        frame.present(video, a.surface)
    }

    fn delete(&self, video: &mut VideoSystem) -> Result<()> {
        super::delete_shaders(video, &[self.back, self.front])
    }
}

/// Refraction through nested surfaces, peeled back to front. Every layer
/// draws the farthest back faces in front of the previous layer into B, then
/// the farthest front faces in front of those into A.
pub struct RefractionPeeling {
    back: [ShaderHandle; 2],
    front: [ShaderHandle; 2],
}

impl RefractionPeeling {
    pub fn new(video: &mut VideoSystem) -> Result<Self> {
        let mut create = |program, face, write| {
            let state = faces(face, Comparison::Greater, write);
            super::shader(video, program, state)
        };

        let back = [
            create(Program::RefractBackFacePeel, CullFace::Front, true)?,
            create(Program::RefractBackFacePeel, CullFace::Front, false)?,
        ];

        let front = [
            create(Program::RefractFrontFacePeel, CullFace::Back, true)?,
            create(Program::RefractFrontFacePeel, CullFace::Back, false)?,
        ];

        Ok(RefractionPeeling { back, front })
    }
}

impl Technique for RefractionPeeling {
    fn id(&self) -> TechniqueId {
        TechniqueId::RefractDp
    }

    fn render(&self, video: &mut VideoSystem, frame: &FrameContext) -> Result<()> {
        let last = depth_peel::peel(video, frame, LAYERS, 2, |video, pass| {
            let shaders = if pass.index == 0 { &self.back } else { &self.front };
            let shader = shaders[pass.masked as usize];

            frame.draw_sections(video, shader, |dc| {
                dc.with("fb", pass.color).with("depth", pass.depth)
            })
        })?;

        frame.present(video, last)
    }

    fn delete(&self, video: &mut VideoSystem) -> Result<()> {
        super::delete_shaders(video, &self.back)?;
        super::delete_shaders(video, &self.front)
    }
}
