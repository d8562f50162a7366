// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bootstrap configuration
//!
//! The values the bundler substitutes into the runtime template, read from a
//! `spacey-pack.toml`:
//!
//! ```toml
//! [browser.shims]
//! console = 1
//! timers = 2
//! buffer = 3
//! process = 4
//!
//! [host]
//! temp_dir = "/tmp"
//! native_addons = true
//! interpreter = "#!/usr/bin/env spacey-node"
//! ```

use crate::error::{Result, RuntimeError};
use crate::globals::ShimIds;
use crate::table::ModuleId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "spacey-pack.toml";

/// Configuration for both bootstrap variants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Browser variant placeholders
    pub browser: BrowserConfig,
    /// Host-process variant placeholders
    pub host: HostConfig,
}

/// Placeholders of the browser bootstrap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Table ids of the four shim modules
    pub shims: ShimIds,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            shims: ShimIds {
                console: ModuleId(1),
                timers: ModuleId(2),
                buffer: ModuleId(3),
                process: ModuleId(4),
            },
        }
    }
}

/// Placeholders of the host-process bootstrap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory native addons are written to before loading
    pub temp_dir: PathBuf,
    /// Whether the addon bootstrap is included
    pub native_addons: bool,
    /// Interpreter directive emitted at the top of the bundle
    pub interpreter: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            native_addons: cfg!(feature = "native-addons"),
            interpreter: None,
        }
    }
}

impl PackConfig {
    /// Read configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| RuntimeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Read configuration from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RuntimeError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = PackConfig::default();
        assert_eq!(config.browser.shims.console, ModuleId(1));
        assert_eq!(config.browser.shims.process, ModuleId(4));
        assert_eq!(config.host.temp_dir, std::env::temp_dir());
        assert!(config.host.interpreter.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = PackConfig::parse(
            r##"
            [host]
            native_addons = false
            interpreter = "#!/usr/bin/env node"
            "##,
        )
        .unwrap();
        assert!(!config.host.native_addons);
        assert_eq!(config.host.interpreter.as_deref(), Some("#!/usr/bin/env node"));
        assert_eq!(config.browser, BrowserConfig::default());
    }

    #[test]
    fn test_shim_ids() {
        let config = PackConfig::parse(
            r#"
            [browser.shims]
            console = 7
            timers = 8
            buffer = 9
            process = 10
            "#,
        )
        .unwrap();
        assert_eq!(
            config.browser.shims.in_order(),
            [ModuleId(7), ModuleId(8), ModuleId(9), ModuleId(10)]
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        assert_eq!(PackConfig::load_or_default(&path).unwrap(), PackConfig::default());

        let mut config = PackConfig::default();
        config.host.temp_dir = dir.path().to_path_buf();
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();
        assert_eq!(PackConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[host]\nnative_addons = \"yes\"\n").unwrap();

        let err = PackConfig::load(&path).unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }
}
