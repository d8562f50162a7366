// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bundle bootstraps
//!
//! Each variant prepares a [`RuntimeContext`], builds a [`Loader`] over the
//! bundle's table and loads the entry module:
//!
//! - [`BrowserBootstrap`] injects the shim modules as ambient bindings first
//! - [`HostBootstrap`] optionally enables native addon loading

mod browser;
mod host;

pub use browser::{BrowserBootstrap, HostBindings};
pub use host::HostBootstrap;

use crate::context::RuntimeContext;
use crate::error::{Result, RuntimeError};
use crate::module_system::{Loader, ModuleRef};
use crate::table::ModuleTable;
use crate::value::Value;

/// A bootstrapped bundle
pub struct Runtime {
    loader: Loader,
    exports: Value,
}

impl Runtime {
    /// The loader, for further `require` calls from the embedder
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Exports of the entry module at the end of its initializer
    pub fn exports(&self) -> &Value {
        &self.exports
    }

    /// The entry module's record
    pub fn main(&self) -> Option<ModuleRef> {
        self.loader.main()
    }

    /// The context the bundle ran with
    pub fn context(&self) -> &RuntimeContext {
        self.loader.context()
    }
}

fn ensure_entry(table: &ModuleTable) -> Result<()> {
    if table.is_empty() {
        return Err(RuntimeError::MalformedTable(
            "module table has no entry module".to_string(),
        ));
    }
    Ok(())
}

fn start(loader: Loader) -> Result<Runtime> {
    let exports = loader.load_main()?;
    tracing::debug!(
        "bundle started: {} of {} modules loaded",
        loader.cache().len(),
        loader.table().len()
    );
    Ok(Runtime { loader, exports })
}
