// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - runs initializers and memoizes their exports

use crate::context::RuntimeContext;
use crate::error::{Result, RuntimeError};
use crate::module_system::cache::ModuleCache;
use crate::module_system::record::{ModuleRecord, ModuleRef};
use crate::table::{ModuleId, ModuleTable};
use crate::value::{Object, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Synchronous, memoizing module loader
pub struct Loader {
    /// Module table emitted by the bundler
    table: ModuleTable,
    /// Module cache
    cache: ModuleCache,
    /// Record of the entry module, once loaded
    main: RefCell<Option<ModuleRef>>,
    /// Ambient bindings handed to every initializer
    context: RuntimeContext,
}

impl Loader {
    /// Create a loader over `table`
    pub fn new(table: ModuleTable, context: RuntimeContext) -> Self {
        let cache = ModuleCache::with_capacity(table.len());
        Self {
            table,
            cache,
            main: RefCell::new(None),
            context,
        }
    }

    /// Load a module, returning its exports.
    ///
    /// The first load of an id creates its record, registers it in the cache
    /// and links it under `parent` before the initializer runs, so a cycle
    /// back into a loading module observes its exports as they are at that
    /// moment. Later loads return the cached exports and leave the graph
    /// untouched. The entry module never has a parent.
    pub fn load(&self, id: ModuleId, parent: Option<&ModuleRef>) -> Result<Value> {
        let descriptor = self.table.get(id)?;

        if let Some(cached) = self.cache.get(id) {
            tracing::trace!("module {} ({}) served from cache", id, descriptor.name);
            return Ok(cached.exports());
        }

        let parent = if id.is_entry() { None } else { parent };
        let record = ModuleRecord::new(id, &descriptor.name, parent);
        self.cache.insert(Rc::clone(&record));
        if id.is_entry() {
            *self.main.borrow_mut() = Some(Rc::clone(&record));
        }
        if let Some(parent) = parent {
            parent.add_child(Rc::clone(&record));
        }

        tracing::debug!(
            "loading module {} ({}) from {}",
            id,
            descriptor.name,
            parent.map_or_else(|| "<root>".to_string(), |p| p.id().to_string())
        );

        let exports = match record.exports() {
            Value::Object(obj) => obj,
            _ => Object::new(),
        };
        let scope = ModuleScope {
            loader: self,
            module: &record,
            exports,
        };
        // On failure the record stays cached in whatever state the
        // initializer left it.
        (descriptor.init)(&scope)?;

        record.mark_loaded();
        Ok(record.exports())
    }

    /// Load the entry module
    pub fn load_main(&self) -> Result<Value> {
        self.load(ModuleId::ENTRY, None)
    }

    /// Load by a dynamically typed id
    pub fn load_value(&self, id: &Value, parent: Option<&ModuleRef>) -> Result<Value> {
        self.load(ModuleId::from_value(id)?, parent)
    }

    /// The entry module's record (`require.main`)
    pub fn main(&self) -> Option<ModuleRef> {
        self.main.borrow().clone()
    }

    /// The module cache (`require.cache`)
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// The module table
    pub fn table(&self) -> &ModuleTable {
        &self.table
    }

    /// The runtime context
    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }
}

/// Everything an initializer receives: its exports container, `require`,
/// its own record, `__filename`, `__dirname` and the runtime context.
pub struct ModuleScope<'a> {
    loader: &'a Loader,
    module: &'a ModuleRef,
    exports: Object,
}

impl ModuleScope<'_> {
    /// The initial exports container (`exports`)
    pub fn exports(&self) -> &Object {
        &self.exports
    }

    /// This module's record (`module`)
    pub fn module(&self) -> &ModuleRef {
        self.module
    }

    /// `__filename`
    pub fn filename(&self) -> &str {
        self.module.filename()
    }

    /// `__dirname`
    pub fn dirname(&self) -> &str {
        self.module.dirname()
    }

    /// `require(id)` on behalf of this module
    pub fn require(&self, id: ModuleId) -> Result<Value> {
        self.loader.load(id, Some(self.module))
    }

    /// `require(value)` where the id arrives as a dynamic value
    pub fn require_value(&self, id: &Value) -> Result<Value> {
        self.loader.load_value(id, Some(self.module))
    }

    /// `require.resolve(path)`. Modules are only addressable by id.
    pub fn resolve(&self, request: &str) -> Result<ModuleId> {
        Err(RuntimeError::ResolveNotImplemented(request.to_string()))
    }

    /// `require.main`
    pub fn main(&self) -> Option<ModuleRef> {
        self.loader.main()
    }

    /// Ambient bindings
    pub fn context(&self) -> &RuntimeContext {
        self.loader.context()
    }

    /// Materialize an embedded native addon as this module's exports
    pub fn load_addon(&self, name: &str, payload: &str) -> Result<()> {
        let addons = self
            .context()
            .addons()
            .ok_or_else(|| RuntimeError::AddonsUnavailable(name.to_string()))?;
        addons.load_into(self.module, name, payload)
    }
}
