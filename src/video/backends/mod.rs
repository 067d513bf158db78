//! The backend of renderer, which should be responsible for only one thing:
//! executing passes with a low-level device, either OpenGL or the software
//! rasterizer.

mod utils;

pub mod gl;
pub mod soft;

use crate::errors::*;
use crate::math::prelude::{Color, Vector2};

use super::assets::prelude::*;

/// Optional device features, detected once when the backend is created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// Atomic read-modify-write access to storage images and atomic counters.
    pub image_load_store: bool,
}

/// Makes the writes of previous draws visible to the reads of later ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Barrier {
    /// Storage image and atomic counter writes, read back by image loads.
    ImageAccess,
}

pub trait Visitor {
    fn features(&self) -> Features;

    /// Returns the dimensions of the default framebuffer in pixels.
    fn dimensions(&self) -> Vector2<u32>;

    unsafe fn resize(&mut self, dimensions: Vector2<u32>) -> Result<()>;

    unsafe fn create_surface(&mut self, handle: SurfaceHandle, params: SurfaceParams)
        -> Result<()>;

    unsafe fn delete_surface(&mut self, handle: SurfaceHandle) -> Result<()>;

    unsafe fn create_render_texture(
        &mut self,
        handle: RenderTextureHandle,
        params: RenderTextureParams,
    ) -> Result<()>;

    unsafe fn delete_render_texture(&mut self, handle: RenderTextureHandle) -> Result<()>;

    unsafe fn create_texture(
        &mut self,
        handle: TextureHandle,
        params: TextureParams,
        bytes: &[u8],
    ) -> Result<()>;

    unsafe fn delete_texture(&mut self, handle: TextureHandle) -> Result<()>;

    unsafe fn create_image(&mut self, handle: ImageHandle, params: ImageParams) -> Result<()>;

    unsafe fn delete_image(&mut self, handle: ImageHandle) -> Result<()>;

    unsafe fn create_counter(&mut self, handle: CounterHandle) -> Result<()>;

    unsafe fn delete_counter(&mut self, handle: CounterHandle) -> Result<()>;

    unsafe fn create_shader(&mut self, handle: ShaderHandle, params: ShaderParams) -> Result<()>;

    unsafe fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()>;

    unsafe fn create_mesh(
        &mut self,
        handle: MeshHandle,
        params: MeshParams,
        vertices: &[Vertex],
    ) -> Result<()>;

    unsafe fn delete_mesh(&mut self, handle: MeshHandle) -> Result<()>;

    /// Binds the destination of following draws and clears. Render textures
    /// attached to `target` must not stay bound as samplers.
    unsafe fn bind(&mut self, target: Target) -> Result<()>;

    /// Clears every color attachment and/or the depth attachment of the bound target.
    unsafe fn clear(&mut self, color: Option<Color<f32>>, depth: Option<f32>) -> Result<()>;

    /// Clears a single color attachment of the bound target.
    unsafe fn clear_attachment(&mut self, index: usize, color: Color<f32>) -> Result<()>;

    /// Copies a rectangle of `src` into a rectangle of `dst`, scaling with nearest filtering.
    unsafe fn blit(
        &mut self,
        src: Target,
        src_rect: Rect,
        dst: Target,
        dst_rect: Rect,
        mask: BlitMask,
    ) -> Result<()>;

    unsafe fn clear_image(&mut self, handle: ImageHandle, value: ImageValue) -> Result<()>;

    unsafe fn reset_counter(&mut self, handle: CounterHandle) -> Result<()>;

    unsafe fn memory_barrier(&mut self, barrier: Barrier) -> Result<()>;

    /// Draws `mesh` into the bound target and returns the number of assembled primitives.
    unsafe fn draw(
        &mut self,
        shader: ShaderHandle,
        mesh: MeshHandle,
        vars: &[UniformVar],
    ) -> Result<u32>;

    /// Reads the color attachment `index` of `target` back, rows bottom to top.
    unsafe fn read_pixels(&mut self, target: Target, index: usize) -> Result<Vec<Color<f32>>>;

    /// Reads every component of every texel of a storage image back.
    unsafe fn read_image(&mut self, handle: ImageHandle) -> Result<Vec<u32>>;

    unsafe fn read_counter(&mut self, handle: CounterHandle) -> Result<u32>;

    /// Blocks until all execution is complete.
    unsafe fn flush(&mut self) -> Result<()>;
}

/// Creates the OpenGL backend. The GL function pointers must have been loaded
/// from a context that is current on this thread.
pub fn new() -> Result<Box<dyn Visitor>> {
    let visitor = unsafe { self::gl::visitor::GLVisitor::new()? };
    Ok(Box::new(visitor))
}

/// Creates the software backend, rendering into an off-screen default framebuffer.
pub fn new_soft(dimensions: Vector2<u32>, features: Features) -> Box<dyn Visitor> {
    Box::new(self::soft::SoftVisitor::new(dimensions, features))
}
