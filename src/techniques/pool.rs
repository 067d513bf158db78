//! The render targets, storage images and counters shared by every technique.
//!
//! Everything is allocated once, sized to the output resolution, and only its
//! contents change from frame to frame. Storage images exist only on devices
//! with `image_load_store`; techniques that need them check `lists()` and
//! `visibility()` and degrade when they are absent.

use crate::errors::*;
use crate::math::prelude::*;
use crate::oit::abuffer::HEAD_SENTINEL;
use crate::oit::visibility::EMPTY_DEPTH;
use crate::video::assets::mesh;
use crate::video::prelude::*;

/// The default dimensions of the A-buffer node arena.
pub const DEFAULT_LIST_DIMENSIONS: (u32, u32) = (2048, 2048);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolParams {
    /// The output resolution.
    pub dimensions: Vector2<u32>,
    /// The dimensions of the A-buffer list image, one node per texel.
    pub list_dimensions: Vector2<u32>,
}

impl Default for PoolParams {
    fn default() -> Self {
        PoolParams {
            dimensions: Vector2::new(1280, 720),
            list_dimensions: Vector2::new(DEFAULT_LIST_DIMENSIONS.0, DEFAULT_LIST_DIMENSIONS.1),
        }
    }
}

/// The kinds of surfaces in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    PingPongA,
    PingPongB,
    /// Premultiplied color sum, and alpha sum with fragment count.
    BavoilMyers,
    /// Premultiplied color and alpha sums, and the transmittance product.
    BavoilMcGuire,
}

/// A general purpose color and depth target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPong {
    pub surface: SurfaceHandle,
    pub color: RenderTextureHandle,
    pub depth: RenderTextureHandle,
}

/// A weighted accumulation target with two color attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulation {
    pub surface: SurfaceHandle,
    pub accum: RenderTextureHandle,
    pub aux: RenderTextureHandle,
}

/// The per-pixel linked lists of the A-buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedLists {
    pub head: ImageHandle,
    pub list: ImageHandle,
    pub counter: CounterHandle,
}

impl LinkedLists {
    /// Truncates every list, making the whole node arena available again.
    pub fn reset(&self, video: &mut VideoSystem) -> Result<()> {
        video.clear_image(self.head, ImageValue::Uint([HEAD_SENTINEL; 4]))?;
        video.reset_counter(self.counter)
    }
}

/// The per-pixel visibility functions of adaptive transparency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityImages {
    pub alpha: ImageHandle,
    pub depth: ImageHandle,
    pub lock: ImageHandle,
}

impl VisibilityImages {
    /// Empties every visibility function and releases every lock.
    pub fn reset(&self, video: &mut VideoSystem) -> Result<()> {
        video.clear_image(self.alpha, ImageValue::Float([0.0; 4]))?;
        video.clear_image(self.depth, ImageValue::Float([EMPTY_DEPTH; 4]))?;
        video.clear_image(self.lock, ImageValue::Uint([0; 4]))
    }
}

struct Targets {
    ping_pong: [PingPong; 2],
    bavoil_myers: Accumulation,
    bavoil_mcguire: Accumulation,
    lists: Option<LinkedLists>,
    visibility: Option<VisibilityImages>,
}

pub struct FramebufferPool {
    params: PoolParams,
    targets: Targets,
    quad: MeshHandle,
}

impl FramebufferPool {
    pub fn new(video: &mut VideoSystem, params: PoolParams) -> Result<Self> {
        let targets = Self::allocate(video, params)?;
        let quad = video.create_mesh(MeshPrimitive::TriangleStrip, &mesh::screen_quad())?;

        Ok(FramebufferPool {
            params,
            targets,
            quad,
        })
    }

    fn allocate(video: &mut VideoSystem, params: PoolParams) -> Result<Targets> {
        let dimensions = params.dimensions;
        if dimensions.x == 0 || dimensions.y == 0 {
            bail!("Framebuffer pool of {:?} is empty.", dimensions);
        }

        let a = ping_pong(video, dimensions)?;
        let b = ping_pong(video, dimensions)?;
        let bavoil_myers = accumulation(
            video,
            dimensions,
            RenderTextureFormat::RGB16F,
            RenderTextureFormat::RGB16F,
        )?;
        let bavoil_mcguire = accumulation(
            video,
            dimensions,
            RenderTextureFormat::RGBA16F,
            RenderTextureFormat::R8,
        )?;

        let (lists, visibility) = if video.features().image_load_store {
            let lists = LinkedLists {
                head: image(video, ImageFormat::R32UI, dimensions)?,
                list: image(video, ImageFormat::RGBA32UI, params.list_dimensions)?,
                counter: video.create_counter()?,
            };

            let visibility = VisibilityImages {
                alpha: image(video, ImageFormat::RGBA8Snorm, dimensions)?,
                depth: image(video, ImageFormat::RGBA16Snorm, dimensions)?,
                lock: image(video, ImageFormat::R32UI, dimensions)?,
            };

            (Some(lists), Some(visibility))
        } else {
            warn!("Storage images are not supported, the A-buffer and adaptive transparency are disabled.");
            (None, None)
        };

        info!(
            "Allocates framebuffer pool of {:?} with {:?} list nodes.",
            dimensions,
            lists.map(|_| params.list_dimensions)
        );

        Ok(Targets {
            ping_pong: [a, b],
            bavoil_myers,
            bavoil_mcguire,
            lists,
            visibility,
        })
    }

    fn release(video: &mut VideoSystem, targets: &Targets) -> Result<()> {
        for v in &targets.ping_pong {
            video.delete_surface(v.surface)?;
            video.delete_render_texture(v.color)?;
            video.delete_render_texture(v.depth)?;
        }

        for v in &[targets.bavoil_myers, targets.bavoil_mcguire] {
            video.delete_surface(v.surface)?;
            video.delete_render_texture(v.accum)?;
            video.delete_render_texture(v.aux)?;
        }

        if let Some(v) = targets.lists {
            video.delete_image(v.head)?;
            video.delete_image(v.list)?;
            video.delete_counter(v.counter)?;
        }

        if let Some(v) = targets.visibility {
            video.delete_image(v.alpha)?;
            video.delete_image(v.depth)?;
            video.delete_image(v.lock)?;
        }

        Ok(())
    }

    /// Reallocates every target at `dimensions`. Contents are lost.
    pub fn resize(&mut self, video: &mut VideoSystem, dimensions: Vector2<u32>) -> Result<()> {
        if dimensions == self.params.dimensions {
            return Ok(());
        }

        if dimensions.x == 0 || dimensions.y == 0 {
            bail!("Framebuffer pool of {:?} is empty.", dimensions);
        }

        Self::release(video, &self.targets)?;
        self.params.dimensions = dimensions;
        self.targets = Self::allocate(video, self.params)?;
        Ok(())
    }

    /// Releases every resource of the pool.
    pub fn delete(self, video: &mut VideoSystem) -> Result<()> {
        Self::release(video, &self.targets)?;
        video.delete_mesh(self.quad)
    }

    #[inline]
    pub fn params(&self) -> PoolParams {
        self.params
    }

    #[inline]
    pub fn dimensions(&self) -> Vector2<u32> {
        self.params.dimensions
    }

    /// Returns the surface of `kind`.
    pub fn acquire(&self, kind: TargetKind) -> SurfaceHandle {
        match kind {
            TargetKind::PingPongA => self.targets.ping_pong[0].surface,
            TargetKind::PingPongB => self.targets.ping_pong[1].surface,
            TargetKind::BavoilMyers => self.targets.bavoil_myers.surface,
            TargetKind::BavoilMcGuire => self.targets.bavoil_mcguire.surface,
        }
    }

    #[inline]
    pub fn ping_pong_a(&self) -> PingPong {
        self.targets.ping_pong[0]
    }

    #[inline]
    pub fn ping_pong_b(&self) -> PingPong {
        self.targets.ping_pong[1]
    }

    /// Returns ping-pong targets `(src, dst)` of the peeling pass `index`. The
    /// first pass reads A and writes B.
    #[inline]
    pub fn ping_pong(&self, index: usize) -> (PingPong, PingPong) {
        let src = self.targets.ping_pong[index % 2];
        let dst = self.targets.ping_pong[(index + 1) % 2];
        (src, dst)
    }

    #[inline]
    pub fn bavoil_myers(&self) -> Accumulation {
        self.targets.bavoil_myers
    }

    #[inline]
    pub fn bavoil_mcguire(&self) -> Accumulation {
        self.targets.bavoil_mcguire
    }

    #[inline]
    pub fn lists(&self) -> Option<LinkedLists> {
        self.targets.lists
    }

    #[inline]
    pub fn visibility(&self) -> Option<VisibilityImages> {
        self.targets.visibility
    }

    /// The full-screen quad.
    #[inline]
    pub fn quad(&self) -> MeshHandle {
        self.quad
    }

    /// Copies `src` into `dst`, which stays bound afterwards.
    pub fn blit<S, D>(&self, video: &mut VideoSystem, src: S, dst: D, mask: BlitMask) -> Result<()>
    where
        S: Into<Target>,
        D: Into<Target>,
    {
        video.bind(dst)?;
        video.blit(src, mask)
    }
}

fn render_texture(
    video: &mut VideoSystem,
    format: RenderTextureFormat,
    dimensions: Vector2<u32>,
) -> Result<RenderTextureHandle> {
    let mut params = RenderTextureParams::default();
    params.format = format;
    params.filter = TextureFilter::Linear;
    params.dimensions = dimensions;
    video.create_render_texture(params)
}

fn ping_pong(video: &mut VideoSystem, dimensions: Vector2<u32>) -> Result<PingPong> {
    let color = render_texture(video, RenderTextureFormat::RGBA16F, dimensions)?;
    let depth = render_texture(video, RenderTextureFormat::Depth32F, dimensions)?;

    let mut params = SurfaceParams::default();
    params.colors[0] = Some(color);
    params.depth = Some(depth);
    let surface = video.create_surface(params)?;

    Ok(PingPong {
        surface,
        color,
        depth,
    })
}

fn accumulation(
    video: &mut VideoSystem,
    dimensions: Vector2<u32>,
    accum: RenderTextureFormat,
    aux: RenderTextureFormat,
) -> Result<Accumulation> {
    let accum = render_texture(video, accum, dimensions)?;
    let aux = render_texture(video, aux, dimensions)?;

    let mut params = SurfaceParams::default();
    params.colors[0] = Some(accum);
    params.colors[1] = Some(aux);
    let surface = video.create_surface(params)?;

    Ok(Accumulation {
        surface,
        accum,
        aux,
    })
}

fn image(video: &mut VideoSystem, format: ImageFormat, dimensions: Vector2<u32>) -> Result<ImageHandle> {
    video.create_image(ImageParams { format, dimensions })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::video::Features;

    fn params(w: u32, h: u32) -> PoolParams {
        PoolParams {
            dimensions: Vector2::new(w, h),
            list_dimensions: Vector2::new(16, 16),
        }
    }

    #[test]
    fn allocation() {
        let features = Features {
            image_load_store: true,
        };

        let mut video = VideoSystem::soft(Vector2::new(8, 4), features);
        let pool = FramebufferPool::new(&mut video, params(8, 4)).unwrap();

        let (src, dst) = pool.ping_pong(0);
        assert_eq!(src, pool.ping_pong_a());
        assert_eq!(dst, pool.ping_pong_b());
        assert_eq!(pool.ping_pong(1), (dst, src));
        assert_eq!(pool.acquire(TargetKind::PingPongB), dst.surface);

        let surface = pool.acquire(TargetKind::BavoilMcGuire);
        assert_eq!(video.surface_dimensions(surface), Some(Vector2::new(8, 4)));

        let lists = pool.lists().unwrap();
        assert_eq!(video.image(lists.list).unwrap().dimensions, Vector2::new(16, 16));

        lists.reset(&mut video).unwrap();
        let head = video.read_image(lists.head).unwrap();
        assert_eq!(head.len(), 32);
        assert!(head.iter().all(|&v| v == HEAD_SENTINEL));
        assert_eq!(video.read_counter(lists.counter).unwrap(), 0);
    }

    #[test]
    fn without_storage_images() {
        let mut video = VideoSystem::soft(Vector2::new(4, 4), Features::default());
        let pool = FramebufferPool::new(&mut video, params(4, 4)).unwrap();
        assert!(pool.lists().is_none());
        assert!(pool.visibility().is_none());
    }

    #[test]
    fn resize() {
        let mut video = VideoSystem::soft(Vector2::new(4, 4), Features::default());
        let mut pool = FramebufferPool::new(&mut video, params(4, 4)).unwrap();
        let stale = pool.acquire(TargetKind::PingPongA);

        pool.resize(&mut video, Vector2::new(6, 2)).unwrap();
        let surface = pool.acquire(TargetKind::PingPongA);
        assert_eq!(video.surface_dimensions(surface), Some(Vector2::new(6, 2)));
        assert!(video.bind(stale).is_err());
        assert!(video.bind(surface).is_ok());

        assert!(pool.resize(&mut video, Vector2::new(0, 2)).is_err());
    }
}
