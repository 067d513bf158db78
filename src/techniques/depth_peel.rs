//! Depth peeling, back to front.
//!
//! Every pass keeps the farthest fragment in front of the layer peeled by the
//! previous pass, with the depth test inverted and the depth buffer cleared to
//! the near plane. The pass reads the color and depth of one ping-pong target
//! and writes the other, so the layers composite over each other in order.

use crate::errors::*;
use crate::math::prelude::*;
use crate::video::prelude::*;

use super::{FrameContext, Technique, TechniqueId, DEFAULT_ALPHA};

/// The number of layers peeled.
pub const LAYERS: usize = 8;

/// Drives the ping-pong peeling passes shared by the alpha and the refraction
/// variants. Every one of the `layers` is peeled by `passes` consecutive
/// passes, each reading the target written by the one before.
///
/// When a layer is inspected, the passes of the layers behind it only peel
/// depth, with color writes disabled, and peeling stops right after the
/// inspected layer. Otherwise every pass starts by copying the color of the
/// previous one, so pixels without a fragment carry the latest composited
/// value forward.
pub(crate) fn peel<F>(
    video: &mut VideoSystem,
    frame: &FrameContext,
    layers: usize,
    passes: usize,
    mut pass: F,
) -> Result<SurfaceHandle>
where
    F: FnMut(&mut VideoSystem, Pass) -> Result<()>,
{
    let layers = if frame.is_inspecting() {
        (frame.layer as usize + 1).min(layers)
    } else {
        layers
    };

    let mut last = frame.pool.ping_pong_a().surface;
    for i in 0..layers * passes {
        let (src, dst) = frame.pool.ping_pong(i);

        if frame.is_inspecting() {
            video.bind(dst.surface)?;
        } else {
            frame.pool.blit(video, src.surface, dst.surface, BlitMask::Color)?;
        }

        video.clear_depth(0.0)?;

        let layer = i / passes;
        let p = Pass {
            layer,
            index: i % passes,
            color: src.color,
            depth: src.depth,
            masked: frame.is_inspecting() && layer != frame.layer as usize,
        };

        pass(video, p)?;
        debug!("Peels pass {} of layer {} into {:?}.", p.index, layer, dst.surface);
        last = dst.surface;
    }

    Ok(last)
}

/// One pass of a peeling sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Pass {
    /// The layer being peeled, counted from the far end.
    pub layer: usize,
    /// The position of the pass within its layer.
    pub index: usize,
    /// The color written by the previous pass.
    pub color: RenderTextureHandle,
    /// The depth written by the previous pass.
    pub depth: RenderTextureHandle,
    /// Only depth is written, a nearer layer is inspected.
    pub masked: bool,
}

fn peeling(write: bool) -> RenderState {
    RenderState::default()
        .with_depth(Comparison::Greater, true)
        .with_color_write(write)
}

pub struct DepthPeeling {
    shader: ShaderHandle,
    masked: ShaderHandle,
}

impl DepthPeeling {
    pub fn new(video: &mut VideoSystem) -> Result<Self> {
        let shader = super::shader(video, Program::DepthPeel, peeling(true))?;
        let masked = super::shader(video, Program::DepthPeel, peeling(false))?;
        Ok(DepthPeeling { shader, masked })
    }
}

impl Technique for DepthPeeling {
    fn id(&self) -> TechniqueId {
        TechniqueId::AlphaDp
    }

    fn render(&self, video: &mut VideoSystem, frame: &FrameContext) -> Result<()> {
        let alpha = if frame.is_inspecting() {
            1.0
        } else {
            frame.alpha(DEFAULT_ALPHA)
        };

        let last = peel(video, frame, LAYERS, 1, |video, pass| {
            let shader = if pass.masked { self.masked } else { self.shader };
            frame.draw_sections(video, shader, |dc| {
                dc.with("alpha", alpha)
                    .with("fb", pass.color)
                    .with("depth", pass.depth)
            })
        })?;

        frame.present(video, last)
    }

    fn delete(&self, video: &mut VideoSystem) -> Result<()> {
        super::delete_shaders(video, &[self.shader, self.masked])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scene::{Camera, Section};
    use crate::techniques::pool::{FramebufferPool, PoolParams};
    use crate::video::Features;

    fn visit(
        video: &mut VideoSystem,
        frame: &FrameContext,
        layers: usize,
        passes: usize,
    ) -> (Vec<(usize, usize, bool)>, SurfaceHandle) {
        let mut visited = Vec::new();
        let last = peel(video, frame, layers, passes, |_, p| {
            visited.push((p.layer, p.index, p.masked));
            Ok(())
        })
        .unwrap();

        (visited, last)
    }

    #[test]
    fn passes() {
        let mut video = VideoSystem::soft(Vector2::new(4, 4), Features::default());
        let mut params = PoolParams::default();
        params.dimensions = Vector2::new(4, 4);
        let pool = FramebufferPool::new(&mut video, params).unwrap();

        let sections: Vec<Section> = Vec::new();
        let camera = Camera::new(Vector2::new(4, 4), false);
        let mut frame = FrameContext {
            pool: &pool,
            sections: &sections,
            camera: &camera,
            layer: -1,
            opacity: None,
        };

        let (visited, last) = visit(&mut video, &frame, LAYERS, 1);
        assert_eq!(visited.len(), LAYERS);
        assert!(visited.iter().all(|v| !v.2));
        assert_eq!(last, pool.ping_pong_a().surface);

        frame.layer = 2;
        let (visited, last) = visit(&mut video, &frame, LAYERS, 1);
        assert_eq!(visited, vec![(0, 0, true), (1, 0, true), (2, 0, false)]);
        assert_eq!(last, pool.ping_pong_b().surface);
    }

    #[test]
    fn layers_of_two_passes() {
        let mut video = VideoSystem::soft(Vector2::new(4, 4), Features::default());
        let mut params = PoolParams::default();
        params.dimensions = Vector2::new(4, 4);
        let pool = FramebufferPool::new(&mut video, params).unwrap();

        let sections: Vec<Section> = Vec::new();
        let camera = Camera::new(Vector2::new(4, 4), false);
        let mut frame = FrameContext {
            pool: &pool,
            sections: &sections,
            camera: &camera,
            layer: -1,
            opacity: None,
        };

        let (visited, last) = visit(&mut video, &frame, 4, 2);
        assert_eq!(visited.len(), 8);
        assert_eq!(visited[6], (3, 0, false));
        assert_eq!(visited[7], (3, 1, false));
        assert_eq!(last, pool.ping_pong_a().surface);

        frame.layer = 1;
        let (visited, last) = visit(&mut video, &frame, 4, 2);
        assert_eq!(
            visited,
            vec![(0, 0, true), (0, 1, true), (1, 0, false), (1, 1, false)]
        );
        assert_eq!(last, pool.ping_pong_a().surface);
    }
}
