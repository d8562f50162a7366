// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the bundle runtime

use std::path::PathBuf;
use thiserror::Error;

/// Result type for bundle runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur while loading a bundle
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The requested id is not an index into the module table
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// The module table or bootstrap placeholders are inconsistent
    #[error("Malformed module table: {0}")]
    MalformedTable(String),

    /// Resolution by path was requested
    #[error("Cannot resolve '{0}': resolving modules by path is not implemented")]
    ResolveNotImplemented(String),

    /// An initializer threw
    #[error("Uncaught {0}")]
    Thrown(String),

    /// Type error (wrong argument type)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Range error (value out of range)
    #[error("RangeError: {0}")]
    RangeError(String),

    /// The embedded addon payload is not valid base64
    #[error("Invalid payload for addon '{name}': {source}")]
    AddonDecode {
        /// Logical addon name
        name: String,
        /// Decoder failure
        #[source]
        source: base64::DecodeError,
    },

    /// The addon could not be written to its temp file
    #[error("Failed to write addon to {}: {source}", .path.display())]
    AddonWrite {
        /// Temp file path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The dynamic loader rejected the addon
    #[error("Failed to load addon {}: {reason}", .path.display())]
    AddonLoad {
        /// Temp file path the loader was pointed at
        path: PathBuf,
        /// Reason reported by the loader
        reason: String,
    },

    /// A module asked for an addon but the bundle was built without them
    #[error("Cannot load addon '{0}': native addons are disabled for this bundle")]
    AddonsUnavailable(String),

    /// The probe was asked about a builtin the runtime does not ship
    #[error("No such built-in module: '{0}'")]
    UnknownBuiltin(String),

    /// The probe subprocess exited unsuccessfully
    #[error("Probe for '{specifier}' failed ({})", describe_exit(.status, .signal))]
    ProbeFailed {
        /// Builtin specifier that was probed
        specifier: String,
        /// Exit status, if the child exited normally
        status: Option<i32>,
        /// Terminating signal, if the child was killed
        signal: Option<i32>,
        /// Captured diagnostic output of the child
        stderr: Vec<u8>,
    },

    /// Configuration could not be read
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RuntimeError {
    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new RangeError
    pub fn range_error(msg: impl Into<String>) -> Self {
        Self::RangeError(msg.into())
    }

    /// Create an error thrown from a module initializer
    pub fn thrown(msg: impl Into<String>) -> Self {
        Self::Thrown(msg.into())
    }

    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound(module.into())
    }

    /// Whether this error is an upstream bundler defect rather than a runtime
    /// condition. Fatal errors must not be handled locally.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ModuleNotFound(_) | Self::MalformedTable(_))
    }
}

fn describe_exit(status: &Option<i32>, signal: &Option<i32>) -> String {
    match (*status, *signal) {
        (_, Some(sig)) => format!("killed by signal {}", sig),
        (Some(code), None) => format!("exit status {}", code),
        (None, None) => "unknown exit status".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(RuntimeError::module_not_found("7").is_fatal());
        assert!(RuntimeError::MalformedTable("empty".into()).is_fatal());
        assert!(!RuntimeError::thrown("boom").is_fatal());
        assert!(!RuntimeError::type_error("bad").is_fatal());
    }

    #[test]
    fn test_probe_failure_message() {
        let err = RuntimeError::ProbeFailed {
            specifier: "fs".into(),
            status: None,
            signal: Some(9),
            stderr: Vec::new(),
        };
        assert_eq!(err.to_string(), "Probe for 'fs' failed (killed by signal 9)");

        let err = RuntimeError::ProbeFailed {
            specifier: "fs".into(),
            status: Some(3),
            signal: None,
            stderr: Vec::new(),
        };
        assert_eq!(err.to_string(), "Probe for 'fs' failed (exit status 3)");
    }
}
