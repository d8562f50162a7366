// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime context handed to every module initializer
//!
//! Bundled modules reach `console`, the timer functions, `Buffer` and
//! `process` through this value rather than through mutable global names.

use crate::addon::AddonBootstrap;
use crate::value::Value;
use std::cell::{Ref, RefCell};

/// Ambient names bound by the browser bootstrap
#[derive(Debug, Clone, Default)]
pub struct Globals {
    /// `console`
    pub console: Value,
    /// `setTimeout`
    pub set_timeout: Value,
    /// `clearTimeout`
    pub clear_timeout: Value,
    /// `setInterval`
    pub set_interval: Value,
    /// `clearInterval`
    pub clear_interval: Value,
    /// `setImmediate`
    pub set_immediate: Value,
    /// `clearImmediate`
    pub clear_immediate: Value,
    /// `Buffer`
    pub buffer: Value,
    /// `process`
    pub process: Value,
}

impl Globals {
    /// Ambient names, in binding order
    pub const NAMES: [&'static str; 9] = [
        "console",
        "setTimeout",
        "clearTimeout",
        "setInterval",
        "clearInterval",
        "setImmediate",
        "clearImmediate",
        "Buffer",
        "process",
    ];

    /// Look up a binding by its ambient name
    pub fn get(&self, name: &str) -> Option<&Value> {
        let value = match name {
            "console" => &self.console,
            "setTimeout" => &self.set_timeout,
            "clearTimeout" => &self.clear_timeout,
            "setInterval" => &self.set_interval,
            "clearInterval" => &self.clear_interval,
            "setImmediate" => &self.set_immediate,
            "clearImmediate" => &self.clear_immediate,
            "Buffer" => &self.buffer,
            "process" => &self.process,
            _ => return None,
        };
        Some(value)
    }

    /// Names that are still null or undefined
    pub fn unbound(&self) -> Vec<&'static str> {
        Self::NAMES
            .into_iter()
            .filter(|name| self.get(name).is_none_or(Value::is_nullish))
            .collect()
    }
}

/// Explicit replacement for the ambient global scope
#[derive(Default)]
pub struct RuntimeContext {
    globals: RefCell<Globals>,
    global_object: Option<Value>,
    addons: Option<AddonBootstrap>,
}

impl RuntimeContext {
    /// Create a context with nothing bound
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the host's global object
    pub fn with_global_object(mut self, global: Option<Value>) -> Self {
        self.global_object = global;
        self
    }

    /// Enable native addon loading
    pub fn with_addons(mut self, addons: AddonBootstrap) -> Self {
        self.addons = Some(addons);
        self
    }

    /// Current ambient bindings
    pub fn globals(&self) -> Ref<'_, Globals> {
        self.globals.borrow()
    }

    /// Look up one ambient binding by name, undefined when unknown
    pub fn get(&self, name: &str) -> Value {
        self.globals().get(name).cloned().unwrap_or_default()
    }

    /// The host global object, if one was found
    pub fn global_object(&self) -> Option<&Value> {
        self.global_object.as_ref()
    }

    /// The native addon bootstrap, in host bundles built with addon support
    pub fn addons(&self) -> Option<&AddonBootstrap> {
        self.addons.as_ref()
    }

    /// Bind `console` to a console shim's exports
    pub fn bind_console(&self, exports: Value) {
        self.globals.borrow_mut().console = exports;
    }

    /// Bind the six timer functions from a timers shim's exports
    pub fn bind_timers(&self, exports: &Value) {
        let mut globals = self.globals.borrow_mut();
        globals.set_timeout = exports.get("setTimeout");
        globals.clear_timeout = exports.get("clearTimeout");
        globals.set_interval = exports.get("setInterval");
        globals.clear_interval = exports.get("clearInterval");
        globals.set_immediate = exports.get("setImmediate");
        globals.clear_immediate = exports.get("clearImmediate");
    }

    /// Bind `Buffer` from a buffer shim's exports
    pub fn bind_buffer(&self, exports: &Value) {
        self.globals.borrow_mut().buffer = exports.get("Buffer");
    }

    /// Bind `process` to a process shim's exports
    pub fn bind_process(&self, exports: Value) {
        self.globals.borrow_mut().process = exports;
    }
}
