use std::cell::RefCell;
use std::os::raw::c_void;

use gl;
use gl::types::*;
use smallvec::SmallVec;

use crate::errors::*;
use crate::math::prelude::{Color, Vector2};
use crate::utils::hash::FastHashMap;
use crate::utils::hash_value::HashValue;

use super::super::super::assets::prelude::*;
use super::super::super::errors::Error as VideoError;
use super::super::super::MAX_FRAMEBUFFER_ATTACHMENTS;
use super::super::utils::DataVec;
use super::super::{Barrier, Features, Visitor};
use super::capabilities::{Capabilities, Version};
use super::program;
use super::types;

#[derive(Debug, Clone)]
struct GLSurfaceData {
    id: GLuint,
    dimensions: Vector2<u32>,
    params: SurfaceParams,
}

#[derive(Debug, Clone)]
struct GLShaderData {
    handle: ShaderHandle,
    id: GLuint,
    params: ShaderParams,
    uniforms: RefCell<FastHashMap<HashValue<str>, GLint>>,
}

impl GLShaderData {
    unsafe fn uniform_location(&self, name: &str) -> Result<GLint> {
        let hash = name.into();
        let mut uniforms = self.uniforms.borrow_mut();
        match uniforms.get(&hash).cloned() {
            Some(location) => Ok(location),
            None => {
                let c_name = ::std::ffi::CString::new(name.as_bytes())?;
                let location = gl::GetUniformLocation(self.id, c_name.as_ptr());
                check()?;

                uniforms.insert(hash, location);
                Ok(location)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct GLMeshData {
    vao: GLuint,
    vbo: GLuint,
    params: MeshParams,
}

#[derive(Debug, Clone)]
struct GLTextureData {
    id: GLuint,
    params: TextureParams,
}

#[derive(Debug, Copy, Clone)]
struct GLRenderTextureData {
    id: GLuint,
    params: RenderTextureParams,
}

#[derive(Debug, Copy, Clone)]
struct GLImageData {
    id: GLuint,
    params: ImageParams,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Sampler {
    RenderTexture(RenderTextureHandle),
    Texture(TextureHandle),
}

struct GLMutableState {
    render_state: RenderState,
    viewport: Vector2<u32>,
    binded_target: Target,
    binded_shader: Option<ShaderHandle>,
    binded_texture_index: usize,
    binded_textures: SmallVec<[Option<Sampler>; 8]>,
}

pub struct GLVisitor {
    state: GLMutableState,
    capabilities: Capabilities,
    features: Features,
    dimensions: Vector2<u32>,
    surfaces: DataVec<GLSurfaceData>,
    shaders: DataVec<GLShaderData>,
    meshes: DataVec<GLMeshData>,
    textures: DataVec<GLTextureData>,
    render_textures: DataVec<GLRenderTextureData>,
    images: DataVec<GLImageData>,
    counters: DataVec<GLuint>,
}

impl GLVisitor {
    pub unsafe fn new() -> Result<Self> {
        let capabilities = Capabilities::parse()?;
        info!("GLVisitor {:#?}", capabilities);
        check_capabilities(&capabilities)?;

        let features = capabilities.features();
        if !features.image_load_store {
            warn!("The OpenGL implementation does not support image load/store, techniques based on it are disabled.");
        }

        let mut vp: [GLint; 4] = [0; 4];
        gl::GetIntegerv(gl::VIEWPORT, vp.as_mut_ptr());
        let dimensions = Vector2::new(vp[2].max(0) as u32, vp[3].max(0) as u32);

        let state = GLMutableState {
            render_state: RenderState::default(),
            viewport: dimensions,
            binded_target: Target::Window,
            binded_shader: None,
            binded_texture_index: 0,
            binded_textures: SmallVec::new(),
        };

        let mut visitor = GLVisitor {
            state,
            capabilities,
            features,
            dimensions,
            surfaces: DataVec::new(),
            shaders: DataVec::new(),
            meshes: DataVec::new(),
            textures: DataVec::new(),
            render_textures: DataVec::new(),
            images: DataVec::new(),
            counters: DataVec::new(),
        };

        Self::reset_render_state(&mut visitor.state)?;
        Ok(visitor)
    }

    fn framebuffer(&self, target: Target) -> Result<(GLuint, Vector2<u32>)> {
        match target {
            Target::Window => Ok((0, self.dimensions)),
            Target::Surface(handle) => {
                let surface = self
                    .surfaces
                    .get(handle)
                    .ok_or_else(|| VideoError::SurfaceHandleInvalid(handle))?;

                Ok((surface.id, surface.dimensions))
            }
        }
    }

    /// Returns the attachment point `index` reads from, checking that it exists.
    fn read_buffer(&self, target: Target, index: usize) -> Result<GLenum> {
        match target {
            Target::Window if index == 0 => Ok(gl::BACK),
            Target::Window => Err(VideoError::OutOfBounds.into()),
            Target::Surface(handle) => {
                let surface = self
                    .surfaces
                    .get(handle)
                    .ok_or_else(|| VideoError::SurfaceHandleInvalid(handle))?;

                match surface.params.colors.get(index) {
                    Some(Some(_)) => Ok(gl::COLOR_ATTACHMENT0 + index as GLenum),
                    _ => Err(VideoError::OutOfBounds.into()),
                }
            }
        }
    }
}

impl Visitor for GLVisitor {
    fn features(&self) -> Features {
        self.features
    }

    fn dimensions(&self) -> Vector2<u32> {
        self.dimensions
    }

    unsafe fn resize(&mut self, dimensions: Vector2<u32>) -> Result<()> {
        self.dimensions = dimensions;
        if self.state.binded_target == Target::Window {
            Self::set_viewport(&mut self.state, dimensions)?;
        }

        Ok(())
    }

    unsafe fn create_surface(
        &mut self,
        handle: SurfaceHandle,
        params: SurfaceParams,
    ) -> Result<()> {
        let mut id = 0;
        gl::GenFramebuffers(1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to generate framebuffer of {}.", handle);
        }

        gl::BindFramebuffer(gl::FRAMEBUFFER, id);

        let mut dimensions = None;
        let mut draw_buffers: SmallVec<[GLenum; MAX_FRAMEBUFFER_ATTACHMENTS]> = SmallVec::new();

        for (i, attachment) in params.colors.iter().enumerate() {
            match *attachment {
                Some(v) => {
                    let rt = self
                        .render_textures
                        .get(v)
                        .ok_or_else(|| VideoError::RenderTextureHandleInvalid(v))?;

                    let location = gl::COLOR_ATTACHMENT0 + i as GLenum;
                    gl::FramebufferTexture2D(gl::FRAMEBUFFER, location, gl::TEXTURE_2D, rt.id, 0);
                    draw_buffers.push(location);
                    dimensions = Some(rt.params.dimensions);
                }
                None => draw_buffers.push(gl::NONE),
            }
        }

        if let Some(v) = params.depth {
            let rt = self
                .render_textures
                .get(v)
                .ok_or_else(|| VideoError::RenderTextureHandleInvalid(v))?;

            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                gl::DEPTH_ATTACHMENT,
                gl::TEXTURE_2D,
                rt.id,
                0,
            );

            dimensions = Some(rt.params.dimensions);
        }

        while draw_buffers.last() == Some(&gl::NONE) {
            draw_buffers.pop();
        }

        if draw_buffers.is_empty() {
            gl::DrawBuffer(gl::NONE);
        } else {
            gl::DrawBuffers(draw_buffers.len() as GLsizei, draw_buffers.as_ptr());
        }

        let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
        let (bound, _) = self.framebuffer(self.state.binded_target)?;
        gl::BindFramebuffer(gl::FRAMEBUFFER, bound);

        if status != gl::FRAMEBUFFER_COMPLETE {
            gl::DeleteFramebuffers(1, &id);

            let reason = match status {
                gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => {
                    "not all framebuffer attachment points are framebuffer attachment complete"
                }
                gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => {
                    "no images are attached to the framebuffer"
                }
                gl::FRAMEBUFFER_UNSUPPORTED => {
                    "the combination of internal formats of the attached images violates an \
                     implementation-dependent set of restrictions"
                }
                _ => "unknown status",
            };

            return Err(VideoError::SurfaceIncomplete(reason.to_owned()).into());
        }

        check()?;

        let dimensions = dimensions.ok_or_else(|| {
            VideoError::SurfaceIncomplete("no images are attached to the framebuffer".to_owned())
        })?;

        self.surfaces.create(
            handle,
            GLSurfaceData {
                id,
                dimensions,
                params,
            },
        );

        Ok(())
    }

    unsafe fn delete_surface(&mut self, handle: SurfaceHandle) -> Result<()> {
        let surface = self
            .surfaces
            .free(handle)
            .ok_or_else(|| VideoError::SurfaceHandleInvalid(handle))?;

        if self.state.binded_target == Target::Surface(handle) {
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
            self.state.binded_target = Target::Window;
            Self::set_viewport(&mut self.state, self.dimensions)?;
        }

        gl::DeleteFramebuffers(1, &surface.id);
        check()
    }

    unsafe fn create_render_texture(
        &mut self,
        handle: RenderTextureHandle,
        params: RenderTextureParams,
    ) -> Result<()> {
        let mut id = 0;
        gl::GenTextures(1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to generate texture of {}.", handle);
        }

        let sampler = Some(Sampler::RenderTexture(handle));
        Self::bind_texture(&mut self.state, sampler, 0, id)?;
        Self::bind_texture_params(TextureWrap::Clamp, params.filter)?;

        let (internal_format, format, pixel_type) = types::render_texture_format(params.format);
        gl::TexImage2D(
            gl::TEXTURE_2D,
            0,
            internal_format as GLint,
            params.dimensions.x as GLint,
            params.dimensions.y as GLint,
            0,
            format,
            pixel_type,
            ::std::ptr::null(),
        );

        check()?;
        self.render_textures
            .create(handle, GLRenderTextureData { id, params });
        Ok(())
    }

    unsafe fn delete_render_texture(&mut self, handle: RenderTextureHandle) -> Result<()> {
        let rt = self
            .render_textures
            .free(handle)
            .ok_or_else(|| VideoError::RenderTextureHandleInvalid(handle))?;

        Self::forget_texture(&mut self.state, Sampler::RenderTexture(handle));
        gl::DeleteTextures(1, &rt.id);
        check()
    }

    unsafe fn create_texture(
        &mut self,
        handle: TextureHandle,
        params: TextureParams,
        bytes: &[u8],
    ) -> Result<()> {
        if bytes.len() != params.len() {
            bail!(
                "{} expects {} bytes of data, but {} are provided.",
                handle,
                params.len(),
                bytes.len()
            );
        }

        let mut id = 0;
        gl::GenTextures(1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to generate texture of {}.", handle);
        }

        Self::bind_texture(&mut self.state, Some(Sampler::Texture(handle)), 0, id)?;
        Self::bind_texture_params(params.wrap, params.filter)?;

        let (internal_format, format, pixel_type) = types::texture_format(params.format);
        let value = if bytes.is_empty() {
            ::std::ptr::null()
        } else {
            bytes.as_ptr() as *const c_void
        };

        gl::TexImage2D(
            gl::TEXTURE_2D,
            0,
            internal_format as GLint,
            params.dimensions.x as GLint,
            params.dimensions.y as GLint,
            0,
            format,
            pixel_type,
            value,
        );

        check()?;
        self.textures.create(handle, GLTextureData { id, params });
        Ok(())
    }

    unsafe fn delete_texture(&mut self, handle: TextureHandle) -> Result<()> {
        let texture = self
            .textures
            .free(handle)
            .ok_or_else(|| VideoError::TextureHandleInvalid(handle))?;

        Self::forget_texture(&mut self.state, Sampler::Texture(handle));
        gl::DeleteTextures(1, &texture.id);
        check()
    }

    unsafe fn create_image(&mut self, handle: ImageHandle, params: ImageParams) -> Result<()> {
        if !self.features.image_load_store {
            return Err(VideoError::Requirement("image load/store".to_owned()).into());
        }

        let mut id = 0;
        gl::GenTextures(1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to generate texture of {}.", handle);
        }

        let (internal_format, _, _) = types::image_format(params.format);
        Self::bind_texture(&mut self.state, None, 0, id)?;
        gl::TexStorage2D(
            gl::TEXTURE_2D,
            1,
            internal_format,
            params.dimensions.x as GLsizei,
            params.dimensions.y as GLsizei,
        );

        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);
        check()?;

        self.images.create(handle, GLImageData { id, params });
        Ok(())
    }

    unsafe fn delete_image(&mut self, handle: ImageHandle) -> Result<()> {
        let image = self
            .images
            .free(handle)
            .ok_or_else(|| VideoError::ImageHandleInvalid(handle))?;

        gl::DeleteTextures(1, &image.id);
        check()
    }

    unsafe fn create_counter(&mut self, handle: CounterHandle) -> Result<()> {
        if !self.features.image_load_store {
            return Err(VideoError::Requirement("atomic counters".to_owned()).into());
        }

        let zero = [0u32];
        let id = Self::create_buffer(gl::ATOMIC_COUNTER_BUFFER, gl::DYNAMIC_DRAW, &zero)?;
        self.counters.create(handle, id);
        Ok(())
    }

    unsafe fn delete_counter(&mut self, handle: CounterHandle) -> Result<()> {
        let id = self
            .counters
            .free(handle)
            .ok_or_else(|| VideoError::CounterHandleInvalid(handle))?;

        gl::DeleteBuffers(1, &id);
        check()
    }

    unsafe fn create_shader(&mut self, handle: ShaderHandle, params: ShaderParams) -> Result<()> {
        if params.program.requires_image_load_store() && !self.features.image_load_store {
            let e = format!("image load/store, which {:?} needs", params.program);
            return Err(VideoError::Requirement(e).into());
        }

        if !params.state.is_uniform_blend() && !self.capabilities.has_indexed_blend() {
            let e = format!("blending per attachment, which {} needs", handle);
            return Err(VideoError::Requirement(e).into());
        }

        let sources = program::sources(params.program);
        let vs = Self::compile(gl::VERTEX_SHADER, &sources.vs)?;
        let fs = match Self::compile(gl::FRAGMENT_SHADER, &sources.fs) {
            Ok(fs) => fs,
            Err(err) => {
                gl::DeleteShader(vs);
                return Err(err);
            }
        };

        let id = Self::link(&[vs, fs]);
        if let Ok(&id) = id.as_ref() {
            gl::DetachShader(id, vs);
            gl::DetachShader(id, fs);
        }

        gl::DeleteShader(vs);
        gl::DeleteShader(fs);

        let id = id?;
        check()?;

        debug!("Compiles {:?} of {}.", params.program, handle);

        let shader = GLShaderData {
            handle,
            id,
            params,
            uniforms: RefCell::new(FastHashMap::default()),
        };

        self.shaders.create(handle, shader);
        Ok(())
    }

    unsafe fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        let shader = self
            .shaders
            .free(handle)
            .ok_or_else(|| VideoError::ShaderHandleInvalid(handle))?;

        if self.state.binded_shader == Some(handle) {
            self.state.binded_shader = None;
        }

        gl::DeleteProgram(shader.id);
        check()
    }

    unsafe fn create_mesh(
        &mut self,
        handle: MeshHandle,
        params: MeshParams,
        vertices: &[Vertex],
    ) -> Result<()> {
        let mut vao = 0;
        gl::GenVertexArrays(1, &mut vao);
        gl::BindVertexArray(vao);

        let vbo = Self::create_buffer(gl::ARRAY_BUFFER, gl::STATIC_DRAW, vertices)?;

        // position, normal and color, bound to locations 0, 1 and 2.
        let stride = Vertex::stride() as GLsizei;
        for location in 0..3 {
            let offset = location as usize * 3 * ::std::mem::size_of::<f32>();
            gl::EnableVertexAttribArray(location);
            gl::VertexAttribPointer(
                location,
                3,
                gl::FLOAT,
                gl::FALSE,
                stride,
                offset as *const c_void,
            );
        }

        gl::BindVertexArray(0);
        check()?;

        self.meshes.create(handle, GLMeshData { vao, vbo, params });
        Ok(())
    }

    unsafe fn delete_mesh(&mut self, handle: MeshHandle) -> Result<()> {
        let mesh = self
            .meshes
            .free(handle)
            .ok_or_else(|| VideoError::MeshHandleInvalid(handle))?;

        gl::DeleteVertexArrays(1, &mesh.vao);
        gl::DeleteBuffers(1, &mesh.vbo);
        check()
    }

    unsafe fn bind(&mut self, target: Target) -> Result<()> {
        let (id, dimensions) = self.framebuffer(target)?;

        if let Target::Surface(handle) = target {
            if let Some(surface) = self.surfaces.get(handle) {
                let params = surface.params;
                for (i, v) in self.state.binded_textures.clone().iter().enumerate() {
                    if let Some(Sampler::RenderTexture(rt)) = *v {
                        if params.is_attached(rt) {
                            Self::bind_texture(&mut self.state, None, i, 0)?;
                        }
                    }
                }
            }
        }

        gl::BindFramebuffer(gl::FRAMEBUFFER, id);
        Self::set_viewport(&mut self.state, dimensions)?;
        self.state.binded_target = target;
        check()
    }

    unsafe fn clear(&mut self, color: Option<Color<f32>>, depth: Option<f32>) -> Result<()> {
        let mut bits = 0;

        // Masks apply to clears as well.
        if let Some(v) = color {
            Self::set_color_write(&mut self.state, (true, true, true, true))?;
            gl::ClearColor(v.r, v.g, v.b, v.a);
            bits |= gl::COLOR_BUFFER_BIT;
        }

        if let Some(v) = depth {
            let test = self.state.render_state.depth_test;
            Self::set_depth_test(&mut self.state, true, test)?;
            gl::ClearDepth(f64::from(v));
            bits |= gl::DEPTH_BUFFER_BIT;
        }

        if bits != 0 {
            gl::Clear(bits);
        }

        check()
    }

    unsafe fn clear_attachment(&mut self, index: usize, color: Color<f32>) -> Result<()> {
        self.read_buffer(self.state.binded_target, index)?;

        Self::set_color_write(&mut self.state, (true, true, true, true))?;
        let v: [f32; 4] = color.into();
        gl::ClearBufferfv(gl::COLOR, index as GLint, v.as_ptr());
        check()
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

        let (read, _) = self.framebuffer(src)?;
        let (draw, _) = self.framebuffer(dst)?;
        let read_buffer = self.read_buffer(src, 0)?;

        let bits = match mask {
            BlitMask::Color => gl::COLOR_BUFFER_BIT,
            BlitMask::ColorDepth => gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT,
        };

        gl::BindFramebuffer(gl::READ_FRAMEBUFFER, read);
        gl::ReadBuffer(read_buffer);
        gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, draw);

        gl::BlitFramebuffer(
            src_rect.position.x as GLint,
            src_rect.position.y as GLint,
            (src_rect.position.x + src_rect.size.x) as GLint,
            (src_rect.position.y + src_rect.size.y) as GLint,
            dst_rect.position.x as GLint,
            dst_rect.position.y as GLint,
            (dst_rect.position.x + dst_rect.size.x) as GLint,
            (dst_rect.position.y + dst_rect.size.y) as GLint,
            bits,
            gl::NEAREST,
        );

        let (bound, _) = self.framebuffer(self.state.binded_target)?;
        gl::BindFramebuffer(gl::FRAMEBUFFER, bound);
        check()
    }

    unsafe fn clear_image(&mut self, handle: ImageHandle, value: ImageValue) -> Result<()> {
        let image = *self
            .images
            .get(handle)
            .ok_or_else(|| VideoError::ImageHandleInvalid(handle))?;

        let (_, format, pixel_type) = types::image_format(image.params.format);
        let components = image.params.format.components();
        let len = image.params.texels() * components;

        Self::bind_texture(&mut self.state, None, 0, image.id)?;

        match (image.params.format.snorm_scale(), value) {
            (None, ImageValue::Uint(v)) => {
                let data: Vec<u32> = (0..len).map(|i| v[i % components]).collect();
                Self::update_image(image.params, format, pixel_type, data.as_ptr() as *const c_void);
            }
            (Some(_), ImageValue::Float(v)) => {
                let data: Vec<f32> = (0..len).map(|i| v[i % components]).collect();
                Self::update_image(image.params, format, pixel_type, data.as_ptr() as *const c_void);
            }
            (_, v) => bail!("{} can not be cleared with {:?}.", handle, v),
        }

        check()
    }

    unsafe fn reset_counter(&mut self, handle: CounterHandle) -> Result<()> {
        let id = *self
            .counters
            .get(handle)
            .ok_or_else(|| VideoError::CounterHandleInvalid(handle))?;

        Self::update_buffer(gl::ATOMIC_COUNTER_BUFFER, id, &[0u32])
    }

    unsafe fn memory_barrier(&mut self, barrier: Barrier) -> Result<()> {
        // Without image load/store, framebuffer writes are visible to later
        // texture fetches implicitly.
        if !self.features.image_load_store {
            return Ok(());
        }

        let bits = match barrier {
            Barrier::ImageAccess => {
                gl::SHADER_IMAGE_ACCESS_BARRIER_BIT | gl::ATOMIC_COUNTER_BARRIER_BIT
            }
        };

        gl::MemoryBarrier(bits);
        check()
    }

    unsafe fn draw(
        &mut self,
        shader: ShaderHandle,
        mesh: MeshHandle,
        vars: &[UniformVar],
    ) -> Result<u32> {
        let shader = self
            .shaders
            .get(shader)
            .ok_or_else(|| VideoError::ShaderHandleInvalid(shader))?;

        let program = shader.params.program;
        program.validate(vars)?;

        let attached = match self.state.binded_target {
            Target::Surface(handle) => self.surfaces.get(handle).map(|v| v.params),
            Target::Window => None,
        };

        Self::bind_shader(&mut self.state, shader)?;

        let mut texture_unit = 0;
        let mut image_unit = 0;

        for &(name, _) in program.uniforms() {
            let field: HashValue<str> = name.into();
            let variable = match vars.iter().find(|v| v.0 == field) {
                Some(v) => v.1,
                None => continue,
            };

            let location = shader.uniform_location(name)?;

            match variable {
                UniformVariable::Texture(handle) => {
                    let texture = self
                        .textures
                        .get(handle)
                        .ok_or_else(|| VideoError::TextureHandleInvalid(handle))?;

                    let sampler = Some(Sampler::Texture(handle));
                    Self::bind_texture(&mut self.state, sampler, texture_unit, texture.id)?;
                    gl::Uniform1i(location, texture_unit as GLint);
                    texture_unit += 1;
                }

                UniformVariable::RenderTexture(handle) => {
                    if attached.map(|v| v.is_attached(handle)).unwrap_or(false) {
                        return Err(VideoError::FeedbackLoop(handle).into());
                    }

                    let rt = self
                        .render_textures
                        .get(handle)
                        .ok_or_else(|| VideoError::RenderTextureHandleInvalid(handle))?;

                    let sampler = Some(Sampler::RenderTexture(handle));
                    Self::bind_texture(&mut self.state, sampler, texture_unit, rt.id)?;
                    gl::Uniform1i(location, texture_unit as GLint);
                    texture_unit += 1;
                }

                UniformVariable::Image(handle) => {
                    let image = self
                        .images
                        .get(handle)
                        .ok_or_else(|| VideoError::ImageHandleInvalid(handle))?;

                    let (internal_format, _, _) = types::image_format(image.params.format);
                    gl::BindImageTexture(
                        image_unit,
                        image.id,
                        0,
                        gl::FALSE,
                        0,
                        gl::READ_WRITE,
                        internal_format,
                    );

                    gl::Uniform1i(location, image_unit as GLint);
                    image_unit += 1;
                }

                UniformVariable::Counter(handle) => {
                    let id = *self
                        .counters
                        .get(handle)
                        .ok_or_else(|| VideoError::CounterHandleInvalid(handle))?;

                    gl::BindBufferBase(gl::ATOMIC_COUNTER_BUFFER, 0, id);
                }

                _ => {
                    if location != -1 {
                        Self::bind_uniform_variable(location, &variable)?;
                    }
                }
            }
        }

        check()?;

        let mesh = self
            .meshes
            .get(mesh)
            .ok_or_else(|| VideoError::MeshHandleInvalid(mesh))?;

        gl::BindVertexArray(mesh.vao);
        gl::DrawArrays(
            mesh.params.primitive.into(),
            0,
            mesh.params.num_verts as GLsizei,
        );

        check()?;
        Ok(mesh.params.primitive.assemble(mesh.params.num_verts as u32))
    }

    unsafe fn read_pixels(&mut self, target: Target, index: usize) -> Result<Vec<Color<f32>>> {
        let (id, dimensions) = self.framebuffer(target)?;
        let read_buffer = self.read_buffer(target, index)?;

        let len = (dimensions.x * dimensions.y) as usize;
        let mut buf = vec![[0.0f32; 4]; len];

        gl::BindFramebuffer(gl::READ_FRAMEBUFFER, id);
        gl::ReadBuffer(read_buffer);
        gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
        gl::ReadPixels(
            0,
            0,
            dimensions.x as GLsizei,
            dimensions.y as GLsizei,
            gl::RGBA,
            gl::FLOAT,
            buf.as_mut_ptr() as *mut c_void,
        );

        let (bound, _) = self.framebuffer(self.state.binded_target)?;
        gl::BindFramebuffer(gl::FRAMEBUFFER, bound);
        check()?;

        Ok(buf.into_iter().map(|v| v.into()).collect())
    }

    unsafe fn read_image(&mut self, handle: ImageHandle) -> Result<Vec<u32>> {
        let image = *self
            .images
            .get(handle)
            .ok_or_else(|| VideoError::ImageHandleInvalid(handle))?;

        let (_, format, pixel_type) = types::image_format(image.params.format);
        let len = image.params.texels() * image.params.format.components();

        Self::bind_texture(&mut self.state, None, 0, image.id)?;
        gl::PixelStorei(gl::PACK_ALIGNMENT, 1);

        let data = if image.params.format.snorm_scale().is_some() {
            let mut buf = vec![0.0f32; len];
            gl::GetTexImage(
                gl::TEXTURE_2D,
                0,
                format,
                pixel_type,
                buf.as_mut_ptr() as *mut c_void,
            );
            buf.into_iter().map(f32::to_bits).collect()
        } else {
            let mut buf = vec![0u32; len];
            gl::GetTexImage(
                gl::TEXTURE_2D,
                0,
                format,
                pixel_type,
                buf.as_mut_ptr() as *mut c_void,
            );
            buf
        };

        check()?;
        Ok(data)
    }

    unsafe fn read_counter(&mut self, handle: CounterHandle) -> Result<u32> {
        let id = *self
            .counters
            .get(handle)
            .ok_or_else(|| VideoError::CounterHandleInvalid(handle))?;

        let mut v = 0u32;
        gl::BindBuffer(gl::ATOMIC_COUNTER_BUFFER, id);
        gl::GetBufferSubData(
            gl::ATOMIC_COUNTER_BUFFER,
            0,
            ::std::mem::size_of::<u32>() as isize,
            &mut v as *mut u32 as *mut c_void,
        );

        check()?;
        Ok(v)
    }

    unsafe fn flush(&mut self) -> Result<()> {
        gl::Finish();
        check()
    }
}

impl GLVisitor {
    unsafe fn bind_shader(state: &mut GLMutableState, shader: &GLShaderData) -> Result<()> {
        if state.binded_shader != Some(shader.handle) {
            gl::UseProgram(shader.id);
            state.binded_shader = Some(shader.handle);
            check()?;
        }

        // Clears change the masks behind the back of shaders, so the states
        // are diffed on every draw.
        let rs = shader.params.state;
        Self::set_cull_face(state, rs.cull_face)?;
        Self::set_front_face_order(state, rs.front_face_order)?;
        Self::set_depth_test(state, rs.depth_write, rs.depth_test)?;
        Self::set_color_blend(state, rs.color_blend)?;
        Self::set_color_write(state, rs.color_write)?;
        Ok(())
    }

    unsafe fn bind_uniform_variable(location: GLint, variable: &UniformVariable) -> Result<()> {
        match *variable {
            UniformVariable::I32(v) => gl::Uniform1i(location, v),
            UniformVariable::F32(v) => gl::Uniform1f(location, v),
            UniformVariable::Matrix3f(v) => {
                gl::UniformMatrix3fv(location, 1, gl::FALSE, v[0].as_ptr())
            }
            UniformVariable::Matrix4f(v) => {
                gl::UniformMatrix4fv(location, 1, gl::FALSE, v[0].as_ptr())
            }
            _ => bail!("{:?} is not a plain uniform value.", variable),
        }

        check()
    }

    unsafe fn bind_texture(
        state: &mut GLMutableState,
        sampler: Option<Sampler>,
        index: usize,
        id: GLuint,
    ) -> Result<()> {
        if state.binded_texture_index != index {
            state.binded_texture_index = index;
            gl::ActiveTexture(gl::TEXTURE0 + index as GLuint);
        }

        if state.binded_textures.len() <= index {
            state.binded_textures.resize(index + 1, None);
        }

        // Anonymous bindings, like storage images being cleared, always rebind.
        if sampler.is_none() || state.binded_textures[index] != sampler {
            state.binded_textures[index] = sampler;
            gl::BindTexture(gl::TEXTURE_2D, id);
        }

        check()
    }

    fn forget_texture(state: &mut GLMutableState, sampler: Sampler) {
        for v in state.binded_textures.iter_mut() {
            if *v == Some(sampler) {
                *v = None;
            }
        }
    }

    unsafe fn reset_render_state(state: &mut GLMutableState) -> Result<()> {
        gl::Disable(gl::CULL_FACE);
        state.render_state.cull_face = CullFace::Nothing;

        gl::FrontFace(gl::CCW);
        state.render_state.front_face_order = FrontFaceOrder::CounterClockwise;

        gl::Disable(gl::DEPTH_TEST);
        gl::DepthMask(gl::FALSE);
        state.render_state.depth_write = false;
        gl::DepthFunc(gl::ALWAYS);
        state.render_state.depth_test = Comparison::Always;

        gl::Disable(gl::BLEND);
        state.render_state.color_blend = [None; MAX_FRAMEBUFFER_ATTACHMENTS];

        gl::ColorMask(1, 1, 1, 1);
        state.render_state.color_write = (true, true, true, true);

        gl::Disable(gl::SCISSOR_TEST);
        gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
        gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        state.binded_target = Target::Window;

        let vp = state.viewport;
        gl::Viewport(0, 0, vp.x as GLint, vp.y as GLint);

        check()
    }

    /// Specify whether front- or back-facing polygons can be culled.
    unsafe fn set_cull_face(state: &mut GLMutableState, face: CullFace) -> Result<()> {
        let rs = &mut state.render_state;

        if rs.cull_face != face {
            match face {
                CullFace::Front => {
                    gl::Enable(gl::CULL_FACE);
                    gl::CullFace(gl::FRONT);
                }
                CullFace::Back => {
                    gl::Enable(gl::CULL_FACE);
                    gl::CullFace(gl::BACK);
                }
                CullFace::Nothing => gl::Disable(gl::CULL_FACE),
            }

            rs.cull_face = face;
            check()?;
        }

        Ok(())
    }

    /// Define front- and back-facing polygons.
    unsafe fn set_front_face_order(
        state: &mut GLMutableState,
        front: FrontFaceOrder,
    ) -> Result<()> {
        let rs = &mut state.render_state;

        if rs.front_face_order != front {
            gl::FrontFace(match front {
                FrontFaceOrder::Clockwise => gl::CW,
                FrontFaceOrder::CounterClockwise => gl::CCW,
            });

            rs.front_face_order = front;
            check()?;
        }

        Ok(())
    }

    /// Enable or disable writing into the depth buffer and specify the value used for depth
    /// buffer comparisons.
    unsafe fn set_depth_test(
        state: &mut GLMutableState,
        write: bool,
        comparsion: Comparison,
    ) -> Result<()> {
        let rs = &mut state.render_state;

        // Note that even if the depth buffer exists and the depth mask is non-zero,
        // the depth buffer is not updated if the depth test is disabled.
        let enable = comparsion != Comparison::Always || write;
        let last_enable = rs.depth_test != Comparison::Always || rs.depth_write;
        if enable != last_enable {
            if enable {
                gl::Enable(gl::DEPTH_TEST);
            } else {
                gl::Disable(gl::DEPTH_TEST);
            }
        }

        if rs.depth_write != write {
            gl::DepthMask(if write { gl::TRUE } else { gl::FALSE });
            rs.depth_write = write;
        }

        if rs.depth_test != comparsion {
            gl::DepthFunc(comparsion.into());
            rs.depth_test = comparsion;
        }

        check()
    }

    /// Specifies how source and destination are combined, per color attachment.
    unsafe fn set_color_blend(
        state: &mut GLMutableState,
        blend: [Option<Blend>; MAX_FRAMEBUFFER_ATTACHMENTS],
    ) -> Result<()> {
        let rs = &mut state.render_state;

        if rs.color_blend == blend {
            return Ok(());
        }

        if blend.iter().all(|v| *v == blend[0]) {
            if let Some((equation, src, dst)) = blend[0] {
                gl::Enable(gl::BLEND);
                gl::BlendFunc(src.into(), dst.into());
                gl::BlendEquation(equation.into());
            } else {
                gl::Disable(gl::BLEND);
            }
        } else {
            for (i, v) in blend.iter().enumerate() {
                let i = i as GLuint;
                if let Some((equation, src, dst)) = *v {
                    gl::Enablei(gl::BLEND, i);
                    gl::BlendFunci(i, src.into(), dst.into());
                    gl::BlendEquationi(i, equation.into());
                } else {
                    gl::Disablei(gl::BLEND, i);
                }
            }
        }

        rs.color_blend = blend;
        check()
    }

    /// Enable or disable writing color elements into the color buffer.
    unsafe fn set_color_write(
        state: &mut GLMutableState,
        mask: (bool, bool, bool, bool),
    ) -> Result<()> {
        let rs = &mut state.render_state;

        if rs.color_write != mask {
            rs.color_write = mask;
            gl::ColorMask(mask.0 as u8, mask.1 as u8, mask.2 as u8, mask.3 as u8);
            check()?;
        }

        Ok(())
    }

    /// Set the viewport to cover the bound target.
    unsafe fn set_viewport(state: &mut GLMutableState, dimensions: Vector2<u32>) -> Result<()> {
        if state.viewport != dimensions {
            gl::Viewport(0, 0, dimensions.x as GLint, dimensions.y as GLint);
            state.viewport = dimensions;
            check()?;
        }

        Ok(())
    }

    unsafe fn update_image(params: ImageParams, format: GLenum, pixel_type: GLenum, data: *const c_void) {
        gl::TexSubImage2D(
            gl::TEXTURE_2D,
            0,
            0,
            0,
            params.dimensions.x as GLsizei,
            params.dimensions.y as GLsizei,
            format,
            pixel_type,
            data,
        );
    }

    unsafe fn compile(shader: GLenum, src: &str) -> Result<GLuint> {
        let shader = gl::CreateShader(shader);
        // Attempt to compile the shader
        let c_str = ::std::ffi::CString::new(src.as_bytes())?;
        gl::ShaderSource(shader, 1, &c_str.as_ptr(), ::std::ptr::null());
        gl::CompileShader(shader);

        // Get the compile status
        let mut status = GLint::from(gl::FALSE);
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);

        // Fail on error
        if status != GLint::from(gl::TRUE) {
            let mut len = 0;
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            gl::GetShaderInfoLog(
                shader,
                len,
                ::std::ptr::null_mut(),
                buf.as_mut_ptr() as *mut GLchar,
            );

            gl::DeleteShader(shader);
            buf.pop(); // skip the trailing null character
            let log = String::from_utf8_lossy(&buf);
            Err(VideoError::ShaderCreationFailure(format!("{}\n{}", log, src)).into())
        } else {
            Ok(shader)
        }
    }

    unsafe fn link<'a, T>(shaders: T) -> Result<GLuint>
    where
        T: IntoIterator<Item = &'a GLuint>,
    {
        let program = gl::CreateProgram();
        for shader in shaders {
            gl::AttachShader(program, *shader)
        }

        gl::LinkProgram(program);
        // Get the link status
        let mut status = GLint::from(gl::FALSE);
        gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);

        // Fail on error
        if status != GLint::from(gl::TRUE) {
            let mut len: GLint = 0;
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            gl::GetProgramInfoLog(
                program,
                len,
                ::std::ptr::null_mut(),
                buf.as_mut_ptr() as *mut GLchar,
            );

            gl::DeleteProgram(program);
            buf.pop();
            let log = String::from_utf8_lossy(&buf);
            Err(VideoError::ShaderCreationFailure(log.into_owned()).into())
        } else {
            Ok(program)
        }
    }

    unsafe fn create_buffer<T>(tp: GLenum, hint: GLenum, data: &[T]) -> Result<GLuint> {
        let mut id = 0;
        gl::GenBuffers(1, &mut id);
        if id == 0 {
            bail!("[GL] Failed to generate buffer.");
        }

        gl::BindBuffer(tp, id);

        let size = ::std::mem::size_of::<T>() * data.len();
        let value = if data.is_empty() {
            ::std::ptr::null()
        } else {
            data.as_ptr() as *const c_void
        };

        gl::BufferData(tp, size as isize, value, hint);
        check()?;
        Ok(id)
    }

    unsafe fn update_buffer<T>(tp: GLenum, id: GLuint, data: &[T]) -> Result<()> {
        gl::BindBuffer(tp, id);
        gl::BufferSubData(
            tp,
            0,
            (::std::mem::size_of::<T>() * data.len()) as isize,
            data.as_ptr() as *const c_void,
        );
        check()
    }

    unsafe fn bind_texture_params(wrap: TextureWrap, filter: TextureFilter) -> Result<()> {
        let wrap: GLenum = wrap.into();
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap as GLint);

        let filter = match filter {
            TextureFilter::Nearest => gl::NEAREST,
            TextureFilter::Linear => gl::LINEAR,
        };

        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter as GLint);
        check()
    }
}

unsafe fn check_capabilities(caps: &Capabilities) -> Result<()> {
    if caps.version < Version::GL(3, 3) {
        bail!(
            "The OpenGL implementation {:?} is older than 3.3, which supports neither \
             multiple render targets with float formats nor GLSL 330.",
            caps.version
        );
    }

    if caps.max_color_attachments < 2 {
        bail!("The OpenGL implementation does not supports multiple render targets.");
    }

    Ok(())
}

unsafe fn check() -> Result<()> {
    match gl::GetError() {
        gl::NO_ERROR => Ok(()),

        gl::INVALID_ENUM => {
            bail!("[GL] An unacceptable value is specified for an enumerated argument.")
        }

        gl::INVALID_VALUE => bail!("[GL] A numeric argument is out of range."),

        gl::INVALID_OPERATION => {
            bail!("[GL] The specified operation is not allowed in the current state.")
        }

        gl::INVALID_FRAMEBUFFER_OPERATION => bail!(
            r"[GL] The command is trying to render to or read from the framebuffer while the \
            currently bound framebuffer is not framebuffer complete."
        ),

        gl::OUT_OF_MEMORY => bail!("[GL] There is not enough memory left to execute the command."),
        _ => bail!("[GL] Oops, Unknown OpenGL error."),
    }
}
