// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Shim modules for host globals missing from browser scopes
//!
//! Implements:
//! - `console` - Console output, timers and counters
//! - `timers` - `setTimeout`, `setInterval`, `setImmediate` and their
//!   `clear*` counterparts
//! - `buffer` - `Buffer` binary data handling
//! - `process` - Process information
//!
//! The bundler emits these as ordinary table entries; [`ShimSet::install`]
//! appends the runtime's own implementations.

pub mod buffer;
pub mod console;
pub mod process;
pub mod timers;

use crate::table::{ModuleDescriptor, ModuleId, ModuleTable};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use timers::TimerQueue;

/// Specifiers of the builtin shim modules, in injection order
pub const BUILTIN_SHIMS: [&str; 4] = ["console", "timers", "buffer", "process"];

/// Table ids of the four shim modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShimIds {
    /// console shim
    pub console: ModuleId,
    /// timers shim
    pub timers: ModuleId,
    /// buffer shim
    pub buffer: ModuleId,
    /// process shim
    pub process: ModuleId,
}

impl ShimIds {
    /// Ids in injection order
    pub fn in_order(&self) -> [ModuleId; 4] {
        [self.console, self.timers, self.buffer, self.process]
    }
}

/// The runtime's shim implementations
#[derive(Clone, Default)]
pub struct ShimSet {
    timers: TimerQueue,
    args: Vec<String>,
}

impl ShimSet {
    /// Create shims whose `process.argv` ends with `args`
    pub fn new(args: Vec<String>) -> Self {
        Self {
            timers: TimerQueue::new(),
            args,
        }
    }

    /// Queue backing the timer functions
    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Append the four shim modules to `table`
    pub fn install(&self, table: &mut ModuleTable) -> ShimIds {
        ShimIds {
            console: table.push_descriptor(self.descriptor("console")),
            timers: table.push_descriptor(self.descriptor("timers")),
            buffer: table.push_descriptor(self.descriptor("buffer")),
            process: table.push_descriptor(self.descriptor("process")),
        }
    }

    /// Descriptor for one builtin shim, accepting an optional `node:` prefix
    pub fn builtin(&self, specifier: &str) -> Option<ModuleDescriptor> {
        let name = specifier.strip_prefix("node:").unwrap_or(specifier);
        BUILTIN_SHIMS
            .contains(&name)
            .then(|| self.descriptor(name))
    }

    fn descriptor(&self, name: &str) -> ModuleDescriptor {
        let init: crate::table::InitFn = match name {
            "console" => Rc::new(console::init),
            "timers" => Rc::new(timers::initializer(self.timers.clone())),
            "buffer" => Rc::new(buffer::init),
            _ => Rc::new(process::initializer(self.args.clone())),
        };
        ModuleDescriptor {
            name: format!("<shim>/{}.js", name),
            init,
        }
    }
}
