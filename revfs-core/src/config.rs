// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration for the revision filesystem
//!
//! Controls the branch layout superimposed on the commit history, the
//! recursion guard used when walking trees, and the checksum reported for
//! files when the caller does not ask for a specific kind.

use crate::checksum::ChecksumKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default maximum directory depth walked when computing change sets
pub const DEFAULT_MAX_TREE_DEPTH: usize = 512;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid layout: {0}")]
    Layout(String),
}

/// Names of the top-level layout directories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub trunk: String,
    pub branches: String,
    pub tags: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            trunk: "trunk".to_string(),
            branches: "branches".to_string(),
            tags: "tags".to_string(),
        }
    }
}

impl LayoutConfig {
    /// Whether `path` names one of the branch/tag container directories
    pub fn is_container(&self, path: &str) -> bool {
        path == self.branches || path == self.tags
    }

    /// Root directory names in listing order
    pub fn top_level(&self) -> [&str; 3] {
        [self.trunk.as_str(), self.branches.as_str(), self.tags.as_str()]
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for name in self.top_level() {
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::Layout(format!(
                    "'{}' must be a single non-empty path component",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Filesystem configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    pub layout: LayoutConfig,

    /// Trees nested deeper than this are reported as malformed
    pub max_tree_depth: usize,

    /// Checksum kind used by callers that do not pick one
    pub default_checksum: ChecksumKind,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            default_checksum: ChecksumKind::default(),
        }
    }
}

impl FsConfig {
    /// Parse from TOML; missing keys take their defaults
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: FsConfig = toml::from_str(s)?;
        config.layout.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Create a config with a custom recursion guard
    pub fn with_max_tree_depth(max_tree_depth: usize) -> Self {
        Self {
            max_tree_depth,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FsConfig::default();
        assert_eq!(config.max_tree_depth, DEFAULT_MAX_TREE_DEPTH);
        assert_eq!(config.layout.top_level(), ["trunk", "branches", "tags"]);
        assert_eq!(config.default_checksum, ChecksumKind::Sha256);
    }

    #[test]
    fn test_partial_toml() {
        let config = FsConfig::from_toml_str(
            r#"
            max_tree_depth = 16
            default_checksum = "blake3"

            [layout]
            tags = "releases"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_tree_depth, 16);
        assert_eq!(config.default_checksum, ChecksumKind::Blake3);
        assert_eq!(config.layout.trunk, "trunk");
        assert!(config.layout.is_container("releases"));
        assert!(!config.layout.is_container("tags"));
    }

    #[test]
    fn test_invalid_layout() {
        let result = FsConfig::from_toml_str("[layout]\nbranches = \"a/b\"\n");
        assert!(matches!(result, Err(ConfigError::Layout(_))));
        let result = FsConfig::from_toml_str("max_tree_depth = \"deep\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revfs.toml");
        std::fs::write(&path, "max_tree_depth = 8\n").unwrap();
        assert_eq!(FsConfig::load(&path).unwrap().max_tree_depth, 8);
        assert!(matches!(
            FsConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
