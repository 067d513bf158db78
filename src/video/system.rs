use crate::errors::Result;
use crate::math::prelude::{Color, Vector2};
use crate::utils::prelude::{HandlePool, ObjectPool};

use super::assets::prelude::*;
use super::backends::{self, Barrier, Features, Visitor};
use super::command::Draw;
use super::errors::Error;

/// Per-frame statistics of the video system.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub drawcalls: u32,
    pub triangles: u32,
}

/// The centralized management of video sub-system. Every call is executed
/// immediately on the backend, in the order it was made.
pub struct VideoSystem {
    visitor: Box<dyn Visitor>,
    features: Features,
    bound: Target,
    info: FrameInfo,

    surfaces: ObjectPool<SurfaceHandle, SurfaceParams>,
    render_textures: ObjectPool<RenderTextureHandle, RenderTextureParams>,
    textures: ObjectPool<TextureHandle, TextureParams>,
    images: ObjectPool<ImageHandle, ImageParams>,
    counters: HandlePool<CounterHandle>,
    shaders: ObjectPool<ShaderHandle, ShaderParams>,
    meshes: ObjectPool<MeshHandle, MeshParams>,
}

impl VideoSystem {
    /// Creates a `VideoSystem` on the OpenGL context that is current on this thread.
    pub fn new() -> Result<Self> {
        let visitor = backends::new()?;
        Ok(Self::with_visitor(visitor))
    }

    /// Creates a `VideoSystem` that renders with the software rasterizer into
    /// an off-screen default framebuffer of `dimensions`.
    pub fn soft(dimensions: Vector2<u32>, features: Features) -> Self {
        Self::with_visitor(backends::new_soft(dimensions, features))
    }

    fn with_visitor(visitor: Box<dyn Visitor>) -> Self {
        let features = visitor.features();
        info!("Video system is ready with {:?}.", features);

        VideoSystem {
            visitor,
            features,
            bound: Target::Window,
            info: FrameInfo::default(),
            surfaces: ObjectPool::new(),
            render_textures: ObjectPool::new(),
            textures: ObjectPool::new(),
            images: ObjectPool::new(),
            counters: HandlePool::new(),
            shaders: ObjectPool::new(),
            meshes: ObjectPool::new(),
        }
    }

    #[inline]
    pub fn features(&self) -> Features {
        self.features
    }

    /// Returns the dimensions of the default framebuffer in pixels.
    #[inline]
    pub fn dimensions(&self) -> Vector2<u32> {
        self.visitor.dimensions()
    }

    /// Resizes the default framebuffer.
    pub fn resize(&mut self, dimensions: Vector2<u32>) -> Result<()> {
        unsafe { self.visitor.resize(dimensions) }
    }

    /// Returns the statistics since the last call of `advance`.
    #[inline]
    pub fn frame_info(&self) -> FrameInfo {
        self.info
    }

    /// Starts a new frame.
    pub fn advance(&mut self) {
        self.info = FrameInfo::default();
    }
}

impl VideoSystem {
    /// Creates an surface with `SurfaceParams`. Every attachment must be alive
    /// and share the same dimensions.
    pub fn create_surface(&mut self, params: SurfaceParams) -> Result<SurfaceHandle> {
        let mut dimensions = None;
        let attachments = params
            .colors
            .iter()
            .filter_map(|v| v.map(|rt| (rt, true)))
            .chain(params.depth.map(|rt| (rt, false)));

        for (rt, color) in attachments {
            let rtp = self
                .render_textures
                .get(rt)
                .ok_or_else(|| Error::RenderTextureHandleInvalid(rt))?;

            if rtp.format.is_color() != color {
                let e = format!("{} has a mismatched format {:?}", rt, rtp.format);
                return Err(Error::SurfaceIncomplete(e).into());
            }

            match dimensions {
                Some(v) if v != rtp.dimensions => {
                    let e = format!("{} has different dimensions {:?}", rt, rtp.dimensions);
                    return Err(Error::SurfaceIncomplete(e).into());
                }
                _ => dimensions = Some(rtp.dimensions),
            }
        }

        if dimensions.is_none() {
            return Err(Error::SurfaceIncomplete("no attachment".to_owned()).into());
        }

        let handle = self.surfaces.create(params);
        unsafe { self.visitor.create_surface(handle, params)? };
        Ok(handle)
    }

    /// Gets the `SurfaceParams` if available.
    #[inline]
    pub fn surface(&self, handle: SurfaceHandle) -> Option<SurfaceParams> {
        self.surfaces.get(handle).cloned()
    }

    /// Returns the dimensions of a surface, which are the dimensions of its attachments.
    pub fn surface_dimensions(&self, handle: SurfaceHandle) -> Option<Vector2<u32>> {
        let params = self.surfaces.get(handle)?;
        params
            .colors
            .iter()
            .filter_map(|v| *v)
            .chain(params.depth)
            .filter_map(|v| self.render_textures.get(v))
            .map(|v| v.dimensions)
            .next()
    }

    /// Deletes surface object. The render textures it references are kept alive.
    pub fn delete_surface(&mut self, handle: SurfaceHandle) -> Result<()> {
        if self.surfaces.free(handle).is_some() {
            if self.bound == Target::Surface(handle) {
                self.bound = Target::Window;
            }

            unsafe { self.visitor.delete_surface(handle)? };
        }

        Ok(())
    }
}

impl VideoSystem {
    /// Create render texture object, which could be attached with a framebuffer.
    pub fn create_render_texture(
        &mut self,
        params: RenderTextureParams,
    ) -> Result<RenderTextureHandle> {
        if params.dimensions.x == 0 || params.dimensions.y == 0 {
            return Err(Error::OutOfBounds.into());
        }

        let handle = self.render_textures.create(params);
        unsafe { self.visitor.create_render_texture(handle, params)? };
        Ok(handle)
    }

    /// Gets the `RenderTextureParams` if available.
    #[inline]
    pub fn render_texture(&self, handle: RenderTextureHandle) -> Option<RenderTextureParams> {
        self.render_textures.get(handle).cloned()
    }

    /// Delete the render texture object.
    pub fn delete_render_texture(&mut self, handle: RenderTextureHandle) -> Result<()> {
        if self.render_textures.free(handle).is_some() {
            unsafe { self.visitor.delete_render_texture(handle)? };
        }

        Ok(())
    }

    /// Create texture object. A texture is an image loaded in video memory,
    /// which can be sampled in shaders.
    pub fn create_texture(&mut self, params: TextureParams, bytes: &[u8]) -> Result<TextureHandle> {
        if bytes.len() != params.len() {
            bail!(
                "Texture data has {} bytes while {} is expected.",
                bytes.len(),
                params.len()
            );
        }

        let handle = self.textures.create(params);
        unsafe { self.visitor.create_texture(handle, params, bytes)? };
        Ok(handle)
    }

    /// Gets the `TextureParams` if available.
    #[inline]
    pub fn texture(&self, handle: TextureHandle) -> Option<TextureParams> {
        self.textures.get(handle).cloned()
    }

    /// Delete the texture object.
    pub fn delete_texture(&mut self, handle: TextureHandle) -> Result<()> {
        if self.textures.free(handle).is_some() {
            unsafe { self.visitor.delete_texture(handle)? };
        }

        Ok(())
    }
}

impl VideoSystem {
    /// Creates a storage image. Needs `Features::image_load_store`.
    pub fn create_image(&mut self, params: ImageParams) -> Result<ImageHandle> {
        if !self.features.image_load_store {
            return Err(Error::Requirement("image load/store".to_owned()).into());
        }

        if params.texels() == 0 {
            return Err(Error::OutOfBounds.into());
        }

        let handle = self.images.create(params);
        unsafe { self.visitor.create_image(handle, params)? };
        Ok(handle)
    }

    #[inline]
    pub fn image(&self, handle: ImageHandle) -> Option<ImageParams> {
        self.images.get(handle).cloned()
    }

    pub fn delete_image(&mut self, handle: ImageHandle) -> Result<()> {
        if self.images.free(handle).is_some() {
            unsafe { self.visitor.delete_image(handle)? };
        }

        Ok(())
    }

    /// Creates an atomic counter initialized to zero. Needs `Features::image_load_store`.
    pub fn create_counter(&mut self) -> Result<CounterHandle> {
        if !self.features.image_load_store {
            return Err(Error::Requirement("atomic counters".to_owned()).into());
        }

        let handle = self.counters.create();
        unsafe { self.visitor.create_counter(handle)? };
        Ok(handle)
    }

    pub fn delete_counter(&mut self, handle: CounterHandle) -> Result<()> {
        if self.counters.free(handle) {
            unsafe { self.visitor.delete_counter(handle)? };
        }

        Ok(())
    }

    /// Resets every texel of a storage image to `value`.
    pub fn clear_image(&mut self, handle: ImageHandle, value: ImageValue) -> Result<()> {
        if !self.images.contains(handle) {
            return Err(Error::ImageHandleInvalid(handle).into());
        }

        unsafe { self.visitor.clear_image(handle, value) }
    }

    /// Resets an atomic counter to zero.
    pub fn reset_counter(&mut self, handle: CounterHandle) -> Result<()> {
        if !self.counters.is_alive(handle) {
            return Err(Error::CounterHandleInvalid(handle).into());
        }

        unsafe { self.visitor.reset_counter(handle) }
    }

    /// Orders the storage writes of previous draws before the reads of later ones.
    pub fn memory_barrier(&mut self, barrier: Barrier) -> Result<()> {
        unsafe { self.visitor.memory_barrier(barrier) }
    }
}

impl VideoSystem {
    /// Create a shader object that pairs a program with immutable render states.
    /// Programs that use storage images fail with `Error::Requirement` when the
    /// device lacks image load/store.
    pub fn create_shader(&mut self, params: ShaderParams) -> Result<ShaderHandle> {
        if params.program.requires_image_load_store() && !self.features.image_load_store {
            let e = format!("image load/store, which {:?} needs", params.program);
            return Err(Error::Requirement(e).into());
        }

        let handle = self.shaders.create(params);
        unsafe { self.visitor.create_shader(handle, params)? };
        Ok(handle)
    }

    /// Gets the `ShaderParams` if available.
    #[inline]
    pub fn shader(&self, handle: ShaderHandle) -> Option<ShaderParams> {
        self.shaders.get(handle).cloned()
    }

    /// Delete shader state object.
    pub fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        if self.shaders.free(handle).is_some() {
            unsafe { self.visitor.delete_shader(handle)? };
        }

        Ok(())
    }

    /// Create a new mesh object.
    pub fn create_mesh(&mut self, primitive: MeshPrimitive, verts: &[Vertex]) -> Result<MeshHandle> {
        let params = MeshParams {
            primitive,
            num_verts: verts.len(),
        };

        let handle = self.meshes.create(params);
        unsafe { self.visitor.create_mesh(handle, params, verts)? };
        Ok(handle)
    }

    /// Gets the `MeshParams` if available.
    #[inline]
    pub fn mesh(&self, handle: MeshHandle) -> Option<MeshParams> {
        self.meshes.get(handle).cloned()
    }

    /// Delete mesh object.
    pub fn delete_mesh(&mut self, handle: MeshHandle) -> Result<()> {
        if self.meshes.free(handle).is_some() {
            unsafe { self.visitor.delete_mesh(handle)? };
        }

        Ok(())
    }
}

impl VideoSystem {
    /// Returns the target that draws and clears currently go to.
    #[inline]
    pub fn bound(&self) -> Target {
        self.bound
    }

    /// Binds the destination of following draws and clears.
    pub fn bind<T: Into<Target>>(&mut self, target: T) -> Result<()> {
        let target = target.into();
        if let Target::Surface(handle) = target {
            if !self.surfaces.contains(handle) {
                return Err(Error::SurfaceHandleInvalid(handle).into());
            }
        }

        unsafe { self.visitor.bind(target)? };
        self.bound = target;
        Ok(())
    }

    /// Clears the bound target. `None` leaves the buffer untouched.
    pub fn clear<T>(&mut self, color: T, depth: Option<f32>) -> Result<()>
    where
        T: Into<Option<Color<f32>>>,
    {
        unsafe { self.visitor.clear(color.into(), depth) }
    }

    /// Clears the depth buffer of the bound target only.
    #[inline]
    pub fn clear_depth(&mut self, depth: f32) -> Result<()> {
        unsafe { self.visitor.clear(None, Some(depth)) }
    }

    /// Clears a single color attachment of the bound surface.
    pub fn clear_attachment(&mut self, index: usize, color: Color<f32>) -> Result<()> {
        let attached = match self.bound {
            Target::Window => index == 0,
            Target::Surface(handle) => self
                .surfaces
                .get(handle)
                .and_then(|v| v.colors.get(index).cloned())
                .map(|v| v.is_some())
                .unwrap_or(false),
        };

        if !attached {
            return Err(Error::OutOfBounds.into());
        }

        unsafe { self.visitor.clear_attachment(index, color) }
    }

    /// Copies the whole color (and optionally depth) content of `src` into the
    /// bound target, scaled to its dimensions.
    pub fn blit<T: Into<Target>>(&mut self, src: T, mask: BlitMask) -> Result<()> {
        let src = src.into();
        let src_rect = Rect::with_size(self.target_dimensions(src)?);
        let dst_rect = Rect::with_size(self.target_dimensions(self.bound)?);
        let dst = self.bound;

        unsafe { self.visitor.blit(src, src_rect, dst, dst_rect, mask) }
    }

    /// Returns the dimensions of a target.
    pub fn target_dimensions(&self, target: Target) -> Result<Vector2<u32>> {
        match target {
            Target::Window => Ok(self.visitor.dimensions()),
            Target::Surface(handle) => self
                .surface_dimensions(handle)
                .ok_or_else(|| Error::SurfaceHandleInvalid(handle).into()),
        }
    }

    /// Draws a mesh into the bound target.
    pub fn draw(&mut self, dc: &Draw) -> Result<()> {
        let params = self
            .shaders
            .get(dc.shader)
            .ok_or_else(|| Error::ShaderHandleInvalid(dc.shader))?;

        if !self.meshes.contains(dc.mesh) {
            return Err(Error::MeshHandleInvalid(dc.mesh).into());
        }

        let vars = dc.uniforms();
        params.program.validate(vars)?;

        let attachments = match self.bound {
            Target::Surface(handle) => self.surfaces.get(handle).cloned(),
            Target::Window => None,
        };

        for &(_, v) in vars {
            match v {
                UniformVariable::Texture(h) if !self.textures.contains(h) => {
                    return Err(Error::TextureHandleInvalid(h).into());
                }
                UniformVariable::RenderTexture(h) => {
                    if !self.render_textures.contains(h) {
                        return Err(Error::RenderTextureHandleInvalid(h).into());
                    }

                    if attachments.map(|v| v.is_attached(h)).unwrap_or(false) {
                        return Err(Error::FeedbackLoop(h).into());
                    }
                }
                UniformVariable::Image(h) if !self.images.contains(h) => {
                    return Err(Error::ImageHandleInvalid(h).into());
                }
                UniformVariable::Counter(h) if !self.counters.is_alive(h) => {
                    return Err(Error::CounterHandleInvalid(h).into());
                }
                _ => {}
            }
        }

        let triangles = unsafe { self.visitor.draw(dc.shader, dc.mesh, vars)? };
        self.info.drawcalls += 1;
        self.info.triangles += triangles;
        Ok(())
    }

    /// Blocks until all execution is complete.
    pub fn flush(&mut self) -> Result<()> {
        unsafe { self.visitor.flush() }
    }
}

impl VideoSystem {
    /// Reads the color attachment `index` of `target` back, rows bottom to top.
    pub fn read_pixels<T: Into<Target>>(
        &mut self,
        target: T,
        index: usize,
    ) -> Result<Vec<Color<f32>>> {
        let target = target.into();
        self.target_dimensions(target)?;
        unsafe { self.visitor.read_pixels(target, index) }
    }

    /// Reads every component of every texel of a storage image back.
    pub fn read_image(&mut self, handle: ImageHandle) -> Result<Vec<u32>> {
        if !self.images.contains(handle) {
            return Err(Error::ImageHandleInvalid(handle).into());
        }

        unsafe { self.visitor.read_image(handle) }
    }

    pub fn read_counter(&mut self, handle: CounterHandle) -> Result<u32> {
        if !self.counters.is_alive(handle) {
            return Err(Error::CounterHandleInvalid(handle).into());
        }

        unsafe { self.visitor.read_counter(handle) }
    }
}
