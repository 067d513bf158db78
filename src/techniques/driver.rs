//! Runs the active technique once per frame.

use crate::errors::*;
use crate::math::prelude::*;
use crate::scene::{Camera, Section};
use crate::video::prelude::*;
use crate::video::system::FrameInfo;

use super::controller::ModeController;
use super::pool::{FramebufferPool, PoolParams};
use super::{FrameContext, TechniqueId};

pub struct FrameDriver {
    pool: FramebufferPool,
    controller: ModeController,
    background: ShaderHandle,
    texture: TextureHandle,
    opacity: Option<f32>,
}

impl FrameDriver {
    /// Creates the pool and the techniques `ids`, which are cycled in order.
    /// `texture` is drawn behind the scene every frame.
    pub fn new(
        video: &mut VideoSystem,
        params: PoolParams,
        ids: &[TechniqueId],
        texture: TextureHandle,
    ) -> Result<Self> {
        let pool = FramebufferPool::new(video, params)?;
        let controller = ModeController::with_ids(video, ids)?;
        let background = super::shader(video, Program::Background, RenderState::default())?;

        Ok(FrameDriver {
            pool,
            controller,
            background,
            texture,
            opacity: None,
        })
    }

    #[inline]
    pub fn pool(&self) -> &FramebufferPool {
        &self.pool
    }

    #[inline]
    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    #[inline]
    pub fn controller_mut(&mut self) -> &mut ModeController {
        &mut self.controller
    }

    #[inline]
    pub fn opacity(&self) -> Option<f32> {
        self.opacity
    }

    /// Gives every transparent fragment the opacity `alpha` instead of the
    /// one its technique picks. Inspected layers stay opaque.
    pub fn set_opacity(&mut self, alpha: Option<f32>) {
        self.opacity = alpha;
    }

    /// Draws the background, primes the ping-pong targets if the active
    /// technique reads them, and runs the technique. The final image is left in
    /// the default framebuffer.
    pub fn frame(
        &mut self,
        video: &mut VideoSystem,
        sections: &[Section],
        camera: &Camera,
    ) -> Result<FrameInfo> {
        video.advance();

        let id = self.controller.id();
        let dual = id.needs_dual_framebuffer();
        let a = self.pool.ping_pong_a();

        if dual {
            video.bind(a.surface)?;
        } else {
            video.bind(Target::Window)?;
        }

        video.clear(Color::transparent(), Some(1.0))?;
        video.draw(&Draw::new(self.background, self.pool.quad()).with("fb", self.texture))?;

        if dual {
            let b = self.pool.ping_pong_b();
            video.bind(b.surface)?;
            video.clear(Color::transparent(), Some(1.0))?;
            self.pool.blit(video, a.surface, b.surface, BlitMask::ColorDepth)?;
        }

        let frame = FrameContext {
            pool: &self.pool,
            sections,
            camera,
            layer: self.controller.layer(),
            opacity: self.opacity,
        };

        self.controller.current().render(video, &frame)?;
        Ok(video.frame_info())
    }

    /// Reallocates the pool for a new output resolution.
    pub fn resize(&mut self, video: &mut VideoSystem, dimensions: Vector2<u32>) -> Result<()> {
        video.resize(dimensions)?;
        self.pool.resize(video, dimensions)
    }

    pub fn delete(self, video: &mut VideoSystem) -> Result<()> {
        self.controller.delete(video)?;
        video.delete_shader(self.background)?;
        self.pool.delete(video)
    }
}
