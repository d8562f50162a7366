// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native addon bootstrap
//!
//! Host bundles may embed precompiled addons as base64 text. Loading one
//! writes the decoded bytes to a uniquely named file in the temp directory,
//! hands that path to the dynamic loader and removes the file again on every
//! exit path.

use crate::error::{Result, RuntimeError};
use crate::module_system::ModuleRecord;
use crate::value::Value;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use ring::rand::{SecureRandom, SystemRandom};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Permissions of the temp file: everyone may read, only the owner may write
/// or execute.
#[cfg(unix)]
const TEMP_FILE_MODE: u32 = 0o744;

const BASE32_DIGITS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// The host's dynamic-loading primitive
pub trait DynamicLoader {
    /// Load the library at `path` and return its exports
    fn load(&self, path: &Path, name: &str) -> Result<Value>;
}

/// Loads addons as shared libraries through `libloading`
#[cfg(feature = "native-addons")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LibraryLoader;

#[cfg(feature = "native-addons")]
impl DynamicLoader for LibraryLoader {
    fn load(&self, path: &Path, name: &str) -> Result<Value> {
        // SAFETY: the payload was embedded by the bundler that produced this
        // bundle; running its initializers is the point of loading it.
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
            RuntimeError::AddonLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        Ok(crate::value::NativeHandle::new(name, library).into())
    }
}

/// Writes, loads and removes embedded addons
pub struct AddonBootstrap {
    temp_dir: PathBuf,
    loader: Box<dyn DynamicLoader>,
    rng: SystemRandom,
}

impl AddonBootstrap {
    /// Create a bootstrap writing into `temp_dir`
    pub fn new(temp_dir: impl Into<PathBuf>, loader: impl DynamicLoader + 'static) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            loader: Box::new(loader),
            rng: SystemRandom::new(),
        }
    }

    /// Create a bootstrap backed by the platform dynamic loader
    #[cfg(feature = "native-addons")]
    pub fn native(temp_dir: impl Into<PathBuf>) -> Self {
        Self::new(temp_dir, LibraryLoader)
    }

    /// Directory the temp files are written to
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Decode `payload`, load it and return what the loader produced.
    ///
    /// A name collision in the temp directory is an error and is not retried.
    pub fn load(&self, name: &str, payload: &str) -> Result<Value> {
        let compact: String = payload.split_whitespace().collect();
        let bytes = BASE64_STANDARD
            .decode(compact.as_bytes())
            .map_err(|source| RuntimeError::AddonDecode {
                name: name.to_string(),
                source,
            })?;

        let path = self.temp_dir.join(self.temp_file_name(name)?);
        let _guard = write_exclusive(&path, &bytes)?;
        tracing::debug!("wrote addon {} ({} bytes) to {}", name, bytes.len(), path.display());

        self.loader.load(&path, name)
    }

    /// Load an addon and install it as `target`'s exports
    pub fn load_into(&self, target: &ModuleRecord, name: &str, payload: &str) -> Result<()> {
        let exports = self.load(name, payload)?;
        target.set_exports(exports);
        Ok(())
    }

    fn temp_file_name(&self, name: &str) -> Result<String> {
        let mut bytes = [0u8; 8];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| std::io::Error::other("system random source unavailable"))?;
        let r1 = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let r2 = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(format!("{}{}-{}", to_base32(r1), to_base32(r2), name))
    }
}

/// Render `n` in radix 32 with lowercase digits
fn to_base32(mut n: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE32_DIGITS[(n % 32) as usize]);
        n /= 32;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Create `path` (failing if it exists) and fill it with `bytes`. The
/// returned guard deletes the file when dropped.
fn write_exclusive(path: &Path, bytes: &[u8]) -> Result<TempFile> {
    let write_error = |source| RuntimeError::AddonWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(TEMP_FILE_MODE);
    }

    let mut file = options.open(path).map_err(write_error)?;
    let guard = TempFile {
        path: path.to_path_buf(),
    };
    file.write_all(bytes).map_err(write_error)?;
    file.sync_all().map_err(write_error)?;
    Ok(guard)
}

/// A file that is removed when this value goes out of scope
#[derive(Debug)]
struct TempFile {
    path: PathBuf,
}

impl Drop for TempFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("removed {}", self.path.display()),
            Err(e) => tracing::warn!("failed to remove {}: {}", self.path.display(), e),
        }
    }
}
