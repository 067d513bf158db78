//! Functions for loading demo settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json;

use crate::errors::*;
use crate::math::prelude::Vector2;
use crate::techniques::TechniqueId;

/// The size of the window when it is borderless.
pub const BORDERLESS_SIZE: (u32, u32) = (1920, 1080);

/// A structure containing the configuration of the demo. Every field is
/// optional in a settings file, and flags given on the command line override
/// what the file says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sets the size in pixels of the client area of the window.
    pub size: Vector2<u32>,
    /// Covers the screen with a borderless window instead.
    pub borderless: bool,
    /// Specifies whether should we have vsync.
    pub vsync: bool,
    /// Shows two copies of the objects side by side.
    pub two_objects: bool,
    /// Colors the entity with a depth gradient instead of its materials.
    pub gradient: bool,
    /// The OBJ file of the entity scene.
    pub entity: PathBuf,
    /// The techniques that could be switched to, in cycling order.
    pub techniques: Vec<TechniqueId>,
    /// The dimensions of the node storage of the A-buffer.
    pub list_dimensions: Vector2<u32>,
    /// Replaces the opacity of transparent fragments, in (0, 1].
    pub opacity: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            size: Vector2::new(1280, 720),
            borderless: false,
            vsync: true,
            two_objects: true,
            gradient: true,
            entity: PathBuf::from("entity.obj"),
            techniques: TechniqueId::ALL.to_vec(),
            list_dimensions: Vector2::new(2048, 2048),
            opacity: None,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|err| format_err!("Failed to read settings {}: {}", path.display(), err))?;

        let settings = Settings::parse(&bytes)
            .map_err(|err| format_err!("Failed to parse settings {}: {}", path.display(), err))?;

        info!("Loads settings from {}.", path.display());
        Ok(settings)
    }

    /// Parses settings from JSON bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let settings: Settings = serde_json::from_slice(bytes)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks the settings describe something that could be shown.
    pub fn validate(&self) -> Result<()> {
        if self.size.x == 0 || self.size.y == 0 {
            bail!("Window size {}x{} is empty.", self.size.x, self.size.y);
        }

        if self.techniques.is_empty() {
            bail!("No technique is enabled.");
        }

        if self.list_dimensions.x == 0 || self.list_dimensions.y == 0 {
            bail!("A-buffer storage of {:?} is empty.", self.list_dimensions);
        }

        if let Some(alpha) = self.opacity {
            if !(alpha > 0.0 && alpha <= 1.0) {
                bail!("Opacity {} is out of (0, 1].", alpha);
            }
        }

        Ok(())
    }

    /// Returns the size of the window, taking borderless mode into account.
    pub fn window_size(&self) -> Vector2<u32> {
        if self.borderless {
            Vector2::new(BORDERLESS_SIZE.0, BORDERLESS_SIZE.1)
        } else {
            self.size
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::parse(b"{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.techniques.len(), 12);
        assert_eq!(settings.window_size(), Vector2::new(1280, 720));
    }

    #[test]
    fn partial() {
        let json = br#"{
            "borderless": true,
            "two_objects": false,
            "techniques": ["alpha-dp", "abuffer", "bavoil-mcguire-weighted"],
            "list_dimensions": { "x": 512, "y": 256 }
        }"#;

        let settings = Settings::parse(json).unwrap();
        assert!(settings.borderless);
        assert!(!settings.two_objects);
        assert!(settings.gradient);
        assert_eq!(
            settings.techniques,
            vec![
                TechniqueId::AlphaDp,
                TechniqueId::ABuffer,
                TechniqueId::BavoilMcGuireWeighted
            ]
        );
        assert_eq!(settings.list_dimensions, Vector2::new(512, 256));
        assert_eq!(settings.window_size(), Vector2::new(1920, 1080));
        assert_eq!(settings.opacity, None);

        let settings = Settings::parse(br#"{ "opacity": 1.0 }"#).unwrap();
        assert_eq!(settings.opacity, Some(1.0));
    }

    #[test]
    fn invalid() {
        assert!(Settings::parse(br#"{ "techniques": ["unknown"] }"#).is_err());
        assert!(Settings::parse(br#"{ "techniques": [] }"#).is_err());
        assert!(Settings::parse(br#"{ "size": { "x": 0, "y": 720 } }"#).is_err());
        assert!(Settings::parse(br#"{ "opacity": 0.0 }"#).is_err());
        assert!(Settings::parse(br#"{ "opacity": 1.5 }"#).is_err());
        assert!(Settings::parse(b"[").is_err());
        assert!(Settings::load("does/not/exist.json").is_err());
    }
}
