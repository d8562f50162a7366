// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-pack-runtime
//!
//! The runtime substrate injected into every bundle produced by `spacey-pack`.
//!
//! A bundle is a flat table of module initializers addressed by integer id.
//! This crate provides:
//!
//! - A memoizing, synchronous module loader with CommonJS semantics
//!   (`require`, `module.exports`, `require.main`, circular tolerance)
//! - Shim modules for `console`, timers, `Buffer` and `process`, and a
//!   browser bootstrap that binds them before the entry module runs
//! - A host bootstrap that can materialize embedded native addons from
//!   base64 payloads
//! - A probe that lists the export names of a builtin module in a subprocess
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spacey_pack_runtime::{ModuleId, ModuleTable, PackConfig};
//! use spacey_pack_runtime::bootstrap::HostBootstrap;
//!
//! let mut table = ModuleTable::new();
//! table.push("index.js", |scope| {
//!     let lib = scope.require(ModuleId(1))?;
//!     scope.exports().set("answer", lib.get("value"));
//!     Ok(())
//! });
//! table.push("lib.js", |scope| {
//!     scope.exports().set("value", 42);
//!     Ok(())
//! });
//!
//! let runtime = HostBootstrap::new(PackConfig::default().host).run(table)?;
//! assert_eq!(runtime.exports().get("answer").as_number(), Some(42.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod addon;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod error;
pub mod globals;
pub mod module_system;
pub mod probe;
pub mod table;
pub mod value;

// Re-exports
pub use bootstrap::Runtime;
pub use config::PackConfig;
pub use context::RuntimeContext;
pub use error::{Result, RuntimeError};
pub use module_system::{Loader, ModuleRecord, ModuleRef, ModuleScope};
pub use table::{ModuleDescriptor, ModuleId, ModuleTable};
pub use value::{NativeFunction, NativeHandle, Object, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Node.js API level the shims emulate
pub const NODE_API_VERSION: &str = "20.0.0";
