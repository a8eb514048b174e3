//! # World Configuration
//!
//! Loaded once at startup, from TOML or from defaults.
//!
//! ```toml
//! screen_count = 2
//! static_arena_bytes = 65536
//! strict_foreach = true
//!
//! [[cameras]]
//! position = { x = 0, y = 0 }
//! offset = { x = 13893632, y = 7864320 }
//! ```

use crate::ecs::{Camera, CAMERA_COUNT, SCREEN_COUNT};
use crate::error::{CoreError, CoreResult};
use crate::math::Vector2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Default size of the static-variable arena (1 MiB).
pub const DEFAULT_STATIC_ARENA_BYTES: usize = 0x10_0000;

/// Configuration for a [`World`](crate::ecs::World).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Number of screens the draw lists are built for (1 to 4).
    pub screen_count: usize,
    /// Cameras the bounds flags are tested against (at most 4).
    pub cameras: Vec<Camera>,
    /// Size of the static-variable arena in bytes.
    pub static_arena_bytes: usize,
    /// Panic on foreach misuse (overflow, leaked loops) instead of logging.
    pub strict_foreach: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            screen_count: 1,
            cameras: vec![Camera::centred(Vector2::ZERO)],
            static_arena_bytes: DEFAULT_STATIC_ARENA_BYTES,
            strict_foreach: cfg!(debug_assertions),
        }
    }
}

impl WorldConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// Missing keys take their default value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the text does not parse or a
    /// value is out of range.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigIo`] if the file cannot be read, otherwise
    /// the errors of [`WorldConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| CoreError::ConfigIo(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded world configuration from {}", path.display());
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] naming the offending key.
    pub fn validate(&self) -> CoreResult<()> {
        if self.screen_count == 0 || self.screen_count > SCREEN_COUNT {
            return Err(CoreError::InvalidConfig(format!(
                "screen_count must be between 1 and {SCREEN_COUNT}, got {}",
                self.screen_count
            )));
        }
        if self.cameras.len() > CAMERA_COUNT {
            return Err(CoreError::InvalidConfig(format!(
                "at most {CAMERA_COUNT} cameras are supported, got {}",
                self.cameras.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = WorldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.screen_count, 1);
        assert_eq!(config.cameras.len(), 1);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = WorldConfig::from_toml_str("screen_count = 2\nstrict_foreach = false\n")
            .expect("valid config");
        assert_eq!(config.screen_count, 2);
        assert!(!config.strict_foreach);
        assert_eq!(config.static_arena_bytes, DEFAULT_STATIC_ARENA_BYTES);
    }

    #[test]
    fn test_cameras_from_toml() {
        let text = r"
            [[cameras]]
            position = { x = 65536, y = 0 }
            offset = { x = 10, y = 20 }

            [[cameras]]
            position = { x = 0, y = 0 }
            offset = { x = 0, y = 0 }
        ";
        let config = WorldConfig::from_toml_str(text).expect("valid config");
        assert_eq!(config.cameras.len(), 2);
        assert_eq!(config.cameras[0].position, Vector2::new(65536, 0));
        assert_eq!(config.cameras[0].offset, Vector2::new(10, 20));
    }

    #[test]
    fn test_rejects_screen_count_out_of_range() {
        let err = WorldConfig::from_toml_str("screen_count = 5").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
        assert!(WorldConfig::from_toml_str("screen_count = 0").is_err());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            WorldConfig::from_toml_str("screen_count = \"two\""),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = WorldConfig::load("/nonexistent/retrograde/world.toml").unwrap_err();
        assert!(matches!(err, CoreError::ConfigIo(_)));
    }
}
