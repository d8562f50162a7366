// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Id-based CommonJS module system
//!
//! - `require(id)` with synchronous loading and memoization
//! - `module.exports` / `exports`
//! - `module.parent` / `module.children` dependency graph
//! - Partial exports for circular requires

mod cache;
mod loader;
mod record;

pub use cache::ModuleCache;
pub use loader::{Loader, ModuleScope};
pub use record::{ModuleRecord, ModuleRef};
