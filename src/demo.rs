//! Ties the scene, the techniques and the window controls together.

use crate::errors::*;
use crate::math::prelude::*;
use crate::scene::entity::{self, Group};
use crate::scene::{self, Camera, EntityParams, Scene, Wobble};
use crate::settings::Settings;
use crate::techniques::prelude::*;
use crate::video::prelude::*;
use crate::video::system::FrameInfo;
use crate::window::prelude::*;

/// The seed of the wobble generator.
pub const WOBBLE_SEED: [u8; 16] = [
    0x19, 0x85, 0x06, 0x11, 0x42, 0x7a, 0x3c, 0x0d, 0x55, 0xe1, 0x9b, 0x20, 0x6f, 0x31, 0xc4, 0x08,
];

/// What a key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NextTechnique,
    PreviousTechnique,
    ToggleObjects,
    TogglePause,
    AdvanceLayer,
    Quit,
}

impl Action {
    /// Maps a released key to its action.
    pub fn from_key(key: Key) -> Option<Action> {
        match key {
            Key::Space => Some(Action::NextTechnique),
            Key::Back => Some(Action::PreviousTechnique),
            Key::Return => Some(Action::ToggleObjects),
            Key::P => Some(Action::TogglePause),
            Key::L => Some(Action::AdvanceLayer),
            Key::Escape => Some(Action::Quit),
        }
    }
}

/// The running demo.
pub struct Demo {
    driver: FrameDriver,
    scene: Scene,
    background: TextureHandle,
}

impl Demo {
    /// Uploads the entity `groups` and the quads, and creates the techniques
    /// named by `settings`. Owns `background` from now on.
    pub fn new(
        video: &mut VideoSystem,
        settings: &Settings,
        groups: &[Group],
        background: TextureHandle,
    ) -> Result<Self> {
        let params = EntityParams {
            gradient: settings.gradient,
            two_objects: settings.two_objects,
        };

        let entity = entity::sections(video, groups, params)?;
        let quads = scene::quads(video, settings.two_objects)?;

        let dimensions = video.dimensions();
        let camera = Camera::new(dimensions, settings.two_objects);
        let scene = Scene::new(entity, quads, camera, Wobble::new(WOBBLE_SEED));

        let params = PoolParams {
            dimensions,
            list_dimensions: settings.list_dimensions,
        };

        let mut driver = FrameDriver::new(video, params, &settings.techniques, background)?;
        driver.set_opacity(settings.opacity);
        info!(
            "Starts with {} techniques at {}x{}.",
            driver.controller().len(),
            dimensions.x,
            dimensions.y
        );

        Ok(Demo {
            driver,
            scene,
            background,
        })
    }

    #[inline]
    pub fn technique(&self) -> TechniqueId {
        self.driver.controller().id()
    }

    #[inline]
    pub fn layer(&self) -> i32 {
        self.driver.controller().layer()
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    /// The title of the window for the active technique.
    pub fn title(&self) -> String {
        format!("transp - {}", self.technique().label())
    }

    /// Performs `action`. Returns false if the demo should quit.
    pub fn perform(&mut self, action: Action) -> bool {
        match action {
            Action::NextTechnique => {
                self.driver.controller_mut().next();
            }
            Action::PreviousTechnique => {
                self.driver.controller_mut().previous();
            }
            Action::ToggleObjects => {
                self.scene.toggle();
            }
            Action::TogglePause => {
                let paused = self.scene.toggle_pause();
                info!("Motion is {}.", if paused { "paused" } else { "resumed" });
            }
            Action::AdvanceLayer => {
                let layer = self.driver.controller_mut().advance_layer();
                info!("Inspects layer {}.", layer);
            }
            Action::Quit => return false,
        }

        true
    }

    /// Handles a window event. Returns false if the demo should quit.
    pub fn on(&mut self, video: &mut VideoSystem, event: &Event) -> Result<bool> {
        match *event {
            Event::Window(WindowEvent::Closed) => Ok(false),
            Event::Window(WindowEvent::Resized(width, height)) => {
                if width > 0 && height > 0 {
                    self.resize(video, Vector2::new(width, height))?;
                }

                Ok(true)
            }
            Event::KeyReleased(key) => match Action::from_key(key) {
                Some(action) => Ok(self.perform(action)),
                None => Ok(true),
            },
            _ => Ok(true),
        }
    }

    /// Reallocates the render targets for a new window size.
    pub fn resize(&mut self, video: &mut VideoSystem, dimensions: Vector2<u32>) -> Result<()> {
        info!("Resizes to {}x{}.", dimensions.x, dimensions.y);
        self.driver.resize(video, dimensions)?;
        self.scene.camera_mut().set_dimensions(dimensions);
        Ok(())
    }

    /// Advances the motion by `dt` seconds and renders a frame.
    pub fn frame(&mut self, video: &mut VideoSystem, dt: f32) -> Result<FrameInfo> {
        self.scene.update(dt);
        self.driver
            .frame(video, self.scene.sections(), self.scene.camera())
    }

    pub fn delete(self, video: &mut VideoSystem) -> Result<()> {
        self.driver.delete(video)?;
        self.scene.delete(video)?;
        video.delete_texture(self.background)
    }
}
