//! The scene: sections of geometry, the camera looking at them and the
//! background behind them.

pub mod camera;
pub mod entity;
pub mod motion;

pub use self::camera::Camera;
pub use self::entity::EntityParams;
pub use self::motion::Wobble;

use std::path::Path;

use image;

use crate::errors::*;
use crate::math::prelude::*;
use crate::video::assets::mesh;
use crate::video::prelude::*;

/// A drawable batch of geometry, placed in the scene by its transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub mesh: MeshHandle,
    pub transform: Matrix4<f32>,
}

impl Section {
    #[inline]
    pub fn new(mesh: MeshHandle, transform: Matrix4<f32>) -> Self {
        Section { mesh, transform }
    }
}

/// The colors of the layers of the quad scene, back to front.
pub const QUAD_COLORS: [[f32; 3]; 3] = [[1.0, 0.5, 0.5], [0.5, 1.0, 0.5], [0.5, 0.5, 1.0]];

/// Returns the transform of layer `l` of the quad stack at `x`.
pub fn quad_transform(x: i32, l: usize) -> Matrix4<f32> {
    let l = l as f32;
    Matrix4::from_translation(Vector3::new(x as f32 * 2.0 + l * 0.2, -l * 0.2, l * 0.1))
}

/// Creates the quad scene: stacks of three layered quads. The right stack
/// submits its layers front to back, the others back to front.
pub fn quads(video: &mut VideoSystem, two_objects: bool) -> Result<Vec<Section>> {
    let stacks: &[i32] = if two_objects { &[-1, 1] } else { &[0] };

    let mut sections = Vec::new();
    for &x in stacks {
        for rl in 0..QUAD_COLORS.len() {
            let l = if x < 0 { rl } else { QUAD_COLORS.len() - 1 - rl };

            let vertices: Vec<_> = mesh::screen_quad()
                .into_iter()
                .map(|mut v| {
                    v.color = QUAD_COLORS[l];
                    v
                })
                .collect();

            let mesh = video.create_mesh(MeshPrimitive::TriangleStrip, &vertices)?;
            sections.push(Section::new(mesh, quad_transform(x, l)));
        }
    }

    Ok(sections)
}

/// Loads the background image into a texture.
pub fn background<P: AsRef<Path>>(video: &mut VideoSystem, path: P) -> Result<TextureHandle> {
    let path = path.as_ref();
    let dynamic = image::open(path)
        .map_err(|err| format_err!("Failed to load background {}: {}", path.display(), err))?;

    let rgba = dynamic.flipv().to_rgba();
    let (width, height) = rgba.dimensions();

    let mut params = TextureParams::default();
    params.format = TextureFormat::U8U8U8U8;
    params.dimensions = Vector2::new(width, height);

    info!("Loads background {} of {}x{}.", path.display(), width, height);
    video.create_texture(params, &rgba.into_raw())
}

/// Which set of sections is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objects {
    Entity,
    Quads,
}

/// The sections of both object sets, the camera and the motion.
pub struct Scene {
    entity: Vec<Section>,
    quads: Vec<Section>,
    objects: Objects,
    camera: Camera,
    wobble: Wobble,
}

impl Scene {
    pub fn new(entity: Vec<Section>, quads: Vec<Section>, camera: Camera, wobble: Wobble) -> Self {
        Scene {
            entity,
            quads,
            objects: Objects::Entity,
            camera,
            wobble,
        }
    }

    #[inline]
    pub fn objects(&self) -> Objects {
        self.objects
    }

    /// Returns the sections currently shown.
    pub fn sections(&self) -> &[Section] {
        match self.objects {
            Objects::Entity => &self.entity,
            Objects::Quads => &self.quads,
        }
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Switches between the entity and the quads. The quads are always shown
    /// from the front.
    pub fn toggle(&mut self) -> Objects {
        self.objects = match self.objects {
            Objects::Entity => Objects::Quads,
            Objects::Quads => Objects::Entity,
        };

        info!("Shows {:?}.", self.objects);
        self.objects
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.wobble.toggle_pause()
    }

    /// Advances the motion by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        match self.objects {
            Objects::Entity => self.wobble.update(&mut self.camera, dt),
            Objects::Quads => {
                self.camera.reset();
                self.wobble.reset();
            }
        }
    }

    /// Releases the meshes of every section.
    pub fn delete(self, video: &mut VideoSystem) -> Result<()> {
        for v in self.entity.iter().chain(self.quads.iter()) {
            video.delete_mesh(v.mesh)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::video::Features;

    #[test]
    fn quad_stacks() {
        let mut video = VideoSystem::soft(Vector2::new(4, 4), Features::default());

        let sections = quads(&mut video, true).unwrap();
        assert_eq!(sections.len(), 6);
        assert_eq!(sections[0].transform, quad_transform(-1, 0));
        assert_eq!(sections[3].transform, quad_transform(1, 2));
        assert_eq!(sections[5].transform, quad_transform(1, 0));

        let sections = quads(&mut video, false).unwrap();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[2].transform, quad_transform(0, 2));
    }

    #[test]
    fn toggle() {
        let mut video = VideoSystem::soft(Vector2::new(4, 4), Features::default());
        let quads = quads(&mut video, false).unwrap();
        let camera = Camera::new(Vector2::new(4, 4), false);
        let mut scene = Scene::new(Vec::new(), quads, camera, Wobble::new([3; 16]));

        scene.update(0.5);
        assert!(scene.sections().is_empty());
        assert!(scene.camera().view() != Camera::new(Vector2::new(4, 4), false).view());

        assert_eq!(scene.toggle(), Objects::Quads);
        scene.update(0.5);
        assert_eq!(scene.sections().len(), 3);
        assert_eq!(scene.camera().view(), Camera::new(Vector2::new(4, 4), false).view());
    }
}
