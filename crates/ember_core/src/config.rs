//! # World Configuration
//!
//! Construction-time settings for a [`World`](crate::World), loadable from
//! TOML:
//!
//! ```toml
//! name = "Sandbox"
//! store_capacity = 4096
//! event_channel_capacity = 128
//! create_default_entities = true
//! ```
//!
//! Missing keys fall back to [`WorldConfig::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecs::{EcsError, EcsResult};

/// World construction settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Display name of the world.
    pub name: String,
    /// Records pre-allocated per component store.
    pub store_capacity: usize,
    /// Events buffered per subscriber before new ones are dropped.
    pub event_channel_capacity: usize,
    /// Whether [`World::initialize`](crate::World::initialize) creates the
    /// camera, skybox and directional light.
    pub create_default_entities: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            store_capacity: 1024,
            event_channel_capacity: 64,
            create_default_entities: false,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the document does not parse or
    /// a value is out of range.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| EcsError::InvalidConfig(format!("failed to parse world config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the file cannot be read or
    /// does not hold a valid config.
    pub fn from_toml_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            EcsError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Serializes the config back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> EcsResult<String> {
        toml::to_string(self)
            .map_err(|e| EcsError::InvalidConfig(format!("failed to write world config: {e}")))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> EcsResult<()> {
        if self.store_capacity == 0 {
            return Err(EcsError::InvalidConfig(
                "store_capacity must be greater than zero".to_string(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(EcsError::InvalidConfig(
                "event_channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = WorldConfig::from_toml_str("name = \"Sandbox\"").unwrap();
        assert_eq!(config.name, "Sandbox");
        assert_eq!(config.store_capacity, 1024);
        assert!(!config.create_default_entities);
    }

    #[test]
    fn test_full_document() {
        let config = WorldConfig::from_toml_str(
            r#"
            name = "Arena"
            store_capacity = 16
            event_channel_capacity = 2
            create_default_entities = true
            "#,
        )
        .unwrap();
        assert_eq!(config.store_capacity, 16);
        assert_eq!(config.event_channel_capacity, 2);
        assert!(config.create_default_entities);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = WorldConfig::from_toml_str("store_capacity = 0").unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(WorldConfig::from_toml_str("name = ").is_err());
    }

    #[test]
    fn test_toml_text_reparses() {
        let config = WorldConfig {
            name: "Copy".to_string(),
            ..WorldConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(WorldConfig::from_toml_str(&text).unwrap(), config);
    }
}
