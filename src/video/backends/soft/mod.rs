//! A software rasterizer implementing every program of the OpenGL backend.
//!
//! A draw runs in three phases: the triangles are rasterized into fragments
//! in primitive order, the fragments are shaded in parallel, and the raster
//! operations (depth test, blending and write masks) are applied in primitive
//! order again. Storage images and counters are shared between the parallel
//! invocations with atomics, the way they are on a GPU.

mod program;
mod raster;
mod storage;

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use crate::errors::*;
use crate::math::prelude::{Color, Vector2};
use crate::utils::prelude::FastHashSet;

use super::super::assets::prelude::*;
use super::super::errors::Error as VideoError;
use super::super::MAX_FRAMEBUFFER_ATTACHMENTS;
use super::utils::DataVec;
use super::{Barrier, Features, Visitor};

use self::program::{Outputs, Uniforms};
use self::raster::Fragment;
use self::storage::{Attachment, ImageStorage, Sampler, Texel};

struct SoftTextureData {
    params: TextureParams,
    texels: Vec<Texel>,
}

impl SoftTextureData {
    fn sampler(&self) -> Sampler {
        Sampler {
            texels: &self.texels,
            dimensions: self.params.dimensions,
            filter: self.params.filter,
            wrap: self.params.wrap,
        }
    }
}

struct SoftMeshData {
    params: MeshParams,
    vertices: Vec<Vertex>,
}

/// An attachment borrowed out of its storage while it is written.
struct Slot {
    handle: Option<RenderTextureHandle>,
    attachment: Attachment,
}

/// The attachments of the target being written.
struct Canvas {
    dimensions: Vector2<u32>,
    colors: Vec<Option<Slot>>,
    depth: Option<Slot>,
}

impl Canvas {
    /// Applies the raster operations of `state` to shaded fragments, in order.
    fn rop(&mut self, state: &RenderState, fragments: &[Fragment], outputs: &[Option<Outputs>]) {
        let mask = state.color_write;
        let mask = [mask.0, mask.1, mask.2, mask.3];
        let width = self.dimensions.x as usize;

        for (frag, out) in fragments.iter().zip(outputs) {
            let out = match *out {
                Some(ref v) => v,
                None => continue,
            };

            let index = frag.y as usize * width + frag.x as usize;

            if state.depth_test != Comparison::Always {
                if let Some(ref mut slot) = self.depth {
                    let stored = slot.attachment.texels[index][0];
                    if !state.depth_test.test(frag.depth, stored) {
                        continue;
                    }

                    if state.depth_write {
                        let v = [frag.depth; 4];
                        slot.attachment.texels[index] = storage::quantize(slot.attachment.format, v);
                    }
                }
            }

            for (i, slot) in self.colors.iter_mut().enumerate() {
                if let Some(ref mut slot) = *slot {
                    let format = slot.attachment.format;
                    let dst = slot.attachment.texels[index];
                    let mut v = match state.color_blend[i] {
                        Some(blend) => storage::blend(blend, out[i], dst, format.is_normalized()),
                        None => out[i],
                    };

                    for c in 0..4 {
                        if !mask[c] {
                            v[c] = dst[c];
                        }
                    }

                    slot.attachment.texels[index] = storage::quantize(format, v);
                }
            }
        }
    }
}

pub struct SoftVisitor {
    features: Features,
    dimensions: Vector2<u32>,
    window_color: Option<Attachment>,
    window_depth: Option<Attachment>,
    bound: Target,
    unsynchronized: FastHashSet<ImageHandle>,

    surfaces: DataVec<SurfaceParams>,
    render_textures: DataVec<Attachment>,
    textures: DataVec<SoftTextureData>,
    images: DataVec<ImageStorage>,
    counters: DataVec<AtomicU32>,
    shaders: DataVec<ShaderParams>,
    meshes: DataVec<SoftMeshData>,
}

fn window_attachments(dimensions: Vector2<u32>) -> (Attachment, Attachment) {
    (
        Attachment::new(RenderTextureFormat::RGBA8, TextureFilter::Nearest, dimensions),
        Attachment::new(RenderTextureFormat::Depth24, TextureFilter::Nearest, dimensions),
    )
}

impl SoftVisitor {
    pub fn new(dimensions: Vector2<u32>, features: Features) -> Self {
        let (color, depth) = window_attachments(dimensions);
        info!("SoftVisitor {:?} with {:?}.", dimensions, features);

        SoftVisitor {
            features,
            dimensions,
            window_color: Some(color),
            window_depth: Some(depth),
            bound: Target::Window,
            unsynchronized: FastHashSet::default(),
            surfaces: DataVec::new(),
            render_textures: DataVec::new(),
            textures: DataVec::new(),
            images: DataVec::new(),
            counters: DataVec::new(),
            shaders: DataVec::new(),
            meshes: DataVec::new(),
        }
    }

    fn target_dimensions(&self, target: Target) -> Result<Vector2<u32>> {
        match target {
            Target::Window => Ok(self.dimensions),
            Target::Surface(handle) => {
                let params = self
                    .surfaces
                    .get(handle)
                    .ok_or_else(|| format_err!("{} is invalid.", handle))?;

                params
                    .colors
                    .iter()
                    .filter_map(|v| *v)
                    .chain(params.depth)
                    .filter_map(|v| self.render_textures.get(v))
                    .map(|v| v.dimensions)
                    .next()
                    .ok_or_else(|| format_err!("{} has no attachment.", handle))
            }
        }
    }

    /// Returns the color attachment `index`, or the depth attachment if `index` is `None`.
    fn attachment(&self, target: Target, index: Option<usize>) -> Result<&Attachment> {
        let attachment = match target {
            Target::Window => match index {
                Some(0) => self.window_color.as_ref(),
                Some(_) => None,
                None => self.window_depth.as_ref(),
            },
            Target::Surface(handle) => {
                let params = self
                    .surfaces
                    .get(handle)
                    .ok_or_else(|| format_err!("{} is invalid.", handle))?;

                let rt = match index {
                    Some(i) => params.colors.get(i).cloned().and_then(|v| v),
                    None => params.depth,
                };

                rt.and_then(|v| self.render_textures.get(v))
            }
        };

        attachment.ok_or_else(|| format_err!("{:?} has no attachment {:?}.", target, index))
    }

    fn take_canvas(&mut self, target: Target) -> Result<Canvas> {
        let dimensions = self.target_dimensions(target)?;
        let mut colors: Vec<Option<Slot>> = (0..MAX_FRAMEBUFFER_ATTACHMENTS).map(|_| None).collect();

        let depth = match target {
            Target::Window => {
                colors[0] = self.window_color.take().map(|attachment| Slot {
                    handle: None,
                    attachment,
                });

                self.window_depth.take().map(|attachment| Slot {
                    handle: None,
                    attachment,
                })
            }

            Target::Surface(handle) => {
                let params = *self
                    .surfaces
                    .get(handle)
                    .ok_or_else(|| format_err!("{} is invalid.", handle))?;

                let all = params.colors.iter().filter_map(|v| *v).chain(params.depth);
                for rt in all {
                    if self.render_textures.get(rt).is_none() {
                        bail!("{} of {} is invalid.", rt, handle);
                    }
                }

                for (i, rt) in params.colors.iter().enumerate() {
                    if let Some(rt) = *rt {
                        colors[i] = self.render_textures.free(rt).map(|attachment| Slot {
                            handle: Some(rt),
                            attachment,
                        });
                    }
                }

                params.depth.and_then(|rt| {
                    self.render_textures.free(rt).map(|attachment| Slot {
                        handle: Some(rt),
                        attachment,
                    })
                })
            }
        };

        Ok(Canvas {
            dimensions,
            colors,
            depth,
        })
    }

    fn put_canvas(&mut self, canvas: Canvas) {
        let mut restore = |slot: Slot, color: bool| match slot.handle {
            Some(rt) => self.render_textures.create(rt, slot.attachment),
            None if color => self.window_color = Some(slot.attachment),
            None => self.window_depth = Some(slot.attachment),
        };

        for slot in canvas.colors.into_iter().filter_map(|v| v) {
            restore(slot, true);
        }

        if let Some(slot) = canvas.depth {
            restore(slot, false);
        }
    }

    fn check_feedback(&self, vars: &[UniformVar]) -> Result<()> {
        if let Target::Surface(handle) = self.bound {
            if let Some(params) = self.surfaces.get(handle) {
                for &(_, v) in vars {
                    if let UniformVariable::RenderTexture(rt) = v {
                        if params.is_attached(rt) {
                            return Err(VideoError::FeedbackLoop(rt).into());
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn bind_uniforms<'a>(&'a self, vars: &[UniformVar], u: &mut Uniforms<'a>) -> Result<()> {
        for &(name, v) in vars {
            match v {
                UniformVariable::Texture(h) => {
                    let texture = self
                        .textures
                        .get(h)
                        .ok_or_else(|| format_err!("{} is invalid.", h))?;
                    u.bind_sampler(name, texture.sampler());
                }
                UniformVariable::RenderTexture(h) => {
                    let rt = self
                        .render_textures
                        .get(h)
                        .ok_or_else(|| format_err!("{} is invalid.", h))?;
                    u.bind_sampler(name, rt.sampler());
                }
                UniformVariable::Image(h) => {
                    let image = self
                        .images
                        .get(h)
                        .ok_or_else(|| format_err!("{} is invalid.", h))?;
                    u.bind_image(name, image);
                }
                UniformVariable::Counter(h) => {
                    let counter = self
                        .counters
                        .get(h)
                        .ok_or_else(|| format_err!("{} is invalid.", h))?;
                    u.counter = Some(counter);
                }
                other => u.bind_value(name, other),
            }
        }

        Ok(())
    }
}

impl Visitor for SoftVisitor {
    fn features(&self) -> Features {
        self.features
    }

    fn dimensions(&self) -> Vector2<u32> {
        self.dimensions
    }

    unsafe fn resize(&mut self, dimensions: Vector2<u32>) -> Result<()> {
        let (color, depth) = window_attachments(dimensions);
        self.dimensions = dimensions;
        self.window_color = Some(color);
        self.window_depth = Some(depth);
        Ok(())
    }

    unsafe fn create_surface(&mut self, handle: SurfaceHandle, params: SurfaceParams) -> Result<()> {
        let mut attached = FastHashSet::default();
        for rt in params.colors.iter().filter_map(|v| *v).chain(params.depth) {
            if !attached.insert(rt) {
                bail!("{} is attached to {} more than once.", rt, handle);
            }
        }

        self.surfaces.create(handle, params);
        Ok(())
    }

    unsafe fn delete_surface(&mut self, handle: SurfaceHandle) -> Result<()> {
        if self.bound == Target::Surface(handle) {
            self.bound = Target::Window;
        }

        self.surfaces.free(handle);
        Ok(())
    }

    unsafe fn create_render_texture(
        &mut self,
        handle: RenderTextureHandle,
        params: RenderTextureParams,
    ) -> Result<()> {
        let attachment = Attachment::new(params.format, params.filter, params.dimensions);
        self.render_textures.create(handle, attachment);
        Ok(())
    }

    unsafe fn delete_render_texture(&mut self, handle: RenderTextureHandle) -> Result<()> {
        self.render_textures.free(handle);
        Ok(())
    }

    unsafe fn create_texture(
        &mut self,
        handle: TextureHandle,
        params: TextureParams,
        bytes: &[u8],
    ) -> Result<()> {
        let stride = params.format.size() as usize;
        let texels = bytes
            .chunks(stride)
            .map(|v| {
                let c = |i: usize| v.get(i).map(|&b| f32::from(b) / 255.0).unwrap_or(1.0);
                [c(0), c(1), c(2), c(3)]
            })
            .collect();

        self.textures.create(handle, SoftTextureData { params, texels });
        Ok(())
    }

    unsafe fn delete_texture(&mut self, handle: TextureHandle) -> Result<()> {
        self.textures.free(handle);
        Ok(())
    }

    unsafe fn create_image(&mut self, handle: ImageHandle, params: ImageParams) -> Result<()> {
        if !self.features.image_load_store {
            return Err(VideoError::Requirement("image load/store".to_owned()).into());
        }

        self.images.create(handle, ImageStorage::new(params));
        Ok(())
    }

    unsafe fn delete_image(&mut self, handle: ImageHandle) -> Result<()> {
        self.unsynchronized.remove(&handle);
        self.images.free(handle);
        Ok(())
    }

    unsafe fn create_counter(&mut self, handle: CounterHandle) -> Result<()> {
        self.counters.create(handle, AtomicU32::new(0));
        Ok(())
    }

    unsafe fn delete_counter(&mut self, handle: CounterHandle) -> Result<()> {
        self.counters.free(handle);
        Ok(())
    }

    unsafe fn create_shader(&mut self, handle: ShaderHandle, params: ShaderParams) -> Result<()> {
        if params.program.requires_image_load_store() && !self.features.image_load_store {
            let e = format!("image load/store, which {:?} needs", params.program);
            return Err(VideoError::Requirement(e).into());
        }

        self.shaders.create(handle, params);
        Ok(())
    }

    unsafe fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        self.shaders.free(handle);
        Ok(())
    }

    unsafe fn create_mesh(
        &mut self,
        handle: MeshHandle,
        params: MeshParams,
        vertices: &[Vertex],
    ) -> Result<()> {
        let vertices = vertices.to_vec();
        self.meshes.create(handle, SoftMeshData { params, vertices });
        Ok(())
    }

    unsafe fn delete_mesh(&mut self, handle: MeshHandle) -> Result<()> {
        self.meshes.free(handle);
        Ok(())
    }

    unsafe fn bind(&mut self, target: Target) -> Result<()> {
        self.target_dimensions(target)?;
        self.bound = target;
        Ok(())
    }

    unsafe fn clear(&mut self, color: Option<Color<f32>>, depth: Option<f32>) -> Result<()> {
        let mut canvas = self.take_canvas(self.bound)?;

        if let Some(color) = color {
            let v: [f32; 4] = color.into();
            for slot in canvas.colors.iter_mut().filter_map(|v| v.as_mut()) {
                slot.attachment.fill(v);
            }
        }

        if let (Some(depth), Some(slot)) = (depth, canvas.depth.as_mut()) {
            slot.attachment.fill([depth; 4]);
        }

        self.put_canvas(canvas);
        Ok(())
    }

    unsafe fn clear_attachment(&mut self, index: usize, color: Color<f32>) -> Result<()> {
        let mut canvas = self.take_canvas(self.bound)?;
        let result = match canvas.colors.get_mut(index).and_then(|v| v.as_mut()) {
            Some(slot) => {
                slot.attachment.fill(color.into());
                Ok(())
            }
            None => Err(VideoError::OutOfBounds.into()),
        };

        self.put_canvas(canvas);
        result
    }

    unsafe fn blit(
        &mut self,
        src: Target,
        src_rect: Rect,
        dst: Target,
        dst_rect: Rect,
        mask: BlitMask,
    ) -> Result<()> {
        if src == dst {
            bail!("Blits from {:?} into itself.", src);
        }

        let color = self.attachment(src, Some(0))?;
        let color = (color.texels.clone(), color.dimensions);
        let depth = match mask {
            BlitMask::ColorDepth => self
                .attachment(src, None)
                .ok()
                .map(|v| (v.texels.clone(), v.dimensions)),
            BlitMask::Color => None,
        };

        let mut canvas = self.take_canvas(dst)?;
        let (w, h) = (canvas.dimensions.x, canvas.dimensions.y);

        for dy in 0..dst_rect.size.y {
            for dx in 0..dst_rect.size.x {
                let (x, y) = (dst_rect.position.x + dx, dst_rect.position.y + dy);
                if x >= w || y >= h {
                    continue;
                }

                let sx = src_rect.position.x
                    + ((dx as f32 + 0.5) * src_rect.size.x as f32 / dst_rect.size.x as f32) as u32;
                let sy = src_rect.position.y
                    + ((dy as f32 + 0.5) * src_rect.size.y as f32 / dst_rect.size.y as f32) as u32;
                let index = (y * w + x) as usize;

                let fetch = |texels: &[Texel], dimensions: Vector2<u32>| {
                    if sx < dimensions.x && sy < dimensions.y {
                        Some(texels[(sy * dimensions.x + sx) as usize])
                    } else {
                        None
                    }
                };

                if let Some(v) = fetch(&color.0, color.1) {
                    for slot in canvas.colors.iter_mut().filter_map(|v| v.as_mut()) {
                        let format = slot.attachment.format;
                        slot.attachment.texels[index] = storage::quantize(format, v);
                    }
                }

                if let Some((ref texels, dimensions)) = depth {
                    if let (Some(v), Some(slot)) = (fetch(texels, dimensions), canvas.depth.as_mut()) {
                        let format = slot.attachment.format;
                        slot.attachment.texels[index] = storage::quantize(format, v);
                    }
                }
            }
        }

        self.put_canvas(canvas);
        Ok(())
    }

    unsafe fn clear_image(&mut self, handle: ImageHandle, value: ImageValue) -> Result<()> {
        let image = self
            .images
            .get(handle)
            .ok_or_else(|| format_err!("{} is invalid.", handle))?;

        image.clear(value);
        Ok(())
    }

    unsafe fn reset_counter(&mut self, handle: CounterHandle) -> Result<()> {
        let counter = self
            .counters
            .get(handle)
            .ok_or_else(|| format_err!("{} is invalid.", handle))?;

        counter.store(0, Ordering::SeqCst);
        Ok(())
    }

    unsafe fn memory_barrier(&mut self, barrier: Barrier) -> Result<()> {
        match barrier {
            Barrier::ImageAccess => self.unsynchronized.clear(),
        }

        Ok(())
    }

    unsafe fn draw(
        &mut self,
        shader: ShaderHandle,
        mesh: MeshHandle,
        vars: &[UniformVar],
    ) -> Result<u32> {
        let params = *self
            .shaders
            .get(shader)
            .ok_or_else(|| format_err!("{} is invalid.", shader))?;

        let program = params.program;
        program.validate(vars)?;
        self.check_feedback(vars)?;

        if !program.writes_images() {
            for &(_, v) in vars {
                if let UniformVariable::Image(h) = v {
                    if self.unsynchronized.contains(&h) {
                        return Err(VideoError::MissingBarrier(h).into());
                    }
                }
            }
        }

        let viewport = self.target_dimensions(self.bound)?;

        let (fragments, outputs, triangles) = {
            let mesh = self
                .meshes
                .get(mesh)
                .ok_or_else(|| format_err!("{} is invalid.", mesh))?;

            let mut u = Uniforms::new(viewport);
            self.bind_uniforms(vars, &mut u)?;

            let (fragments, triangles) = raster::rasterize(
                mesh.params.primitive,
                &mesh.vertices,
                program.vertex_stage(),
                &u.mvp,
                &u.nrp,
                &params.state,
                viewport,
            );

            let outputs: Vec<_> = fragments
                .par_iter()
                .map(|v| program::shade(program, &u, v))
                .collect();

            (fragments, outputs, triangles)
        };

        if program.writes_images() {
            for &(_, v) in vars {
                if let UniformVariable::Image(h) = v {
                    self.unsynchronized.insert(h);
                }
            }
        }

        let mut canvas = self.take_canvas(self.bound)?;
        canvas.rop(&params.state, &fragments, &outputs);
        self.put_canvas(canvas);

        debug!(
            "Draws {:?} with {} fragments into {:?}.",
            program,
            fragments.len(),
            self.bound
        );

        Ok(triangles)
    }

    unsafe fn read_pixels(&mut self, target: Target, index: usize) -> Result<Vec<Color<f32>>> {
        let attachment = self.attachment(target, Some(index))?;
        Ok(attachment.texels.iter().map(|&v| v.into()).collect())
    }

    unsafe fn read_image(&mut self, handle: ImageHandle) -> Result<Vec<u32>> {
        let image = self
            .images
            .get(handle)
            .ok_or_else(|| format_err!("{} is invalid.", handle))?;

        Ok(image.read())
    }

    unsafe fn read_counter(&mut self, handle: CounterHandle) -> Result<u32> {
        let counter = self
            .counters
            .get(handle)
            .ok_or_else(|| format_err!("{} is invalid.", handle))?;

        Ok(counter.load(Ordering::SeqCst))
    }

    unsafe fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
