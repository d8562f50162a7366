// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Browser variant: bind the shims, then run the entry module

use super::{Runtime, ensure_entry, start};
use crate::config::BrowserConfig;
use crate::context::RuntimeContext;
use crate::error::{Result, RuntimeError};
use crate::globals::ShimIds;
use crate::module_system::Loader;
use crate::table::ModuleTable;
use crate::value::Value;

/// Candidate global objects of the embedding environment
#[derive(Debug, Clone, Default)]
pub struct HostBindings {
    /// `global`
    pub global: Value,
    /// `self`
    pub self_: Value,
    /// `window`
    pub window: Value,
}

impl HostBindings {
    /// The first of `global`, `self`, `window` that is defined
    pub fn resolve(&self) -> Option<Value> {
        [&self.global, &self.self_, &self.window]
            .into_iter()
            .find(|v| !v.is_undefined())
            .cloned()
    }
}

/// Bootstrap for embeddings that lack the host globals
#[derive(Debug, Clone)]
pub struct BrowserBootstrap {
    shims: ShimIds,
}

impl BrowserBootstrap {
    /// Create a bootstrap using the configured shim ids
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            shims: config.shims,
        }
    }

    /// Load the four shims with no parent, bind their exports, then load the
    /// entry module.
    pub fn run(&self, table: ModuleTable, host: HostBindings) -> Result<Runtime> {
        ensure_entry(&table)?;
        self.validate(&table)?;

        let context = RuntimeContext::new().with_global_object(host.resolve());
        let loader = Loader::new(table, context);
        let context = loader.context();

        context.bind_console(loader.load(self.shims.console, None)?);
        context.bind_timers(&loader.load(self.shims.timers, None)?);
        context.bind_buffer(&loader.load(self.shims.buffer, None)?);
        context.bind_process(loader.load(self.shims.process, None)?);

        let unbound = context.globals().unbound();
        if !unbound.is_empty() {
            return Err(RuntimeError::MalformedTable(format!(
                "shims left globals unbound: {}",
                unbound.join(", ")
            )));
        }

        start(loader)
    }

    fn validate(&self, table: &ModuleTable) -> Result<()> {
        let ids = self.shims.in_order();
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(RuntimeError::MalformedTable(format!(
                    "shim id {} is used by more than one shim",
                    id
                )));
            }
            if id.is_entry() {
                return Err(RuntimeError::MalformedTable(
                    "shim id collides with the entry module".to_string(),
                ));
            }
            if !table.contains(*id) {
                return Err(RuntimeError::MalformedTable(format!(
                    "shim id {} is outside the module table ({} modules)",
                    id,
                    table.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globals::ShimSet;
    use crate::table::ModuleId;
    use crate::value::Object;
    use std::cell::Cell;
    use std::rc::Rc;

    fn bootstrap(shims: ShimIds) -> BrowserBootstrap {
        BrowserBootstrap::new(BrowserConfig { shims })
    }

    #[test]
    fn test_host_resolution_order() {
        let window = Value::from(Object::new());
        let self_ = Value::from(Object::new());

        let host = HostBindings {
            window: window.clone(),
            ..Default::default()
        };
        assert_eq!(host.resolve(), Some(window.clone()));

        let host = HostBindings {
            self_: self_.clone(),
            window,
            ..Default::default()
        };
        assert_eq!(host.resolve(), Some(self_));

        let host = HostBindings {
            global: Value::Null,
            ..Default::default()
        };
        assert_eq!(host.resolve(), Some(Value::Null));
        assert_eq!(HostBindings::default().resolve(), None);
    }

    #[test]
    fn test_globals_bound_before_entry() {
        let mut table = ModuleTable::new();
        table.push("index.js", |scope| {
            let unbound = scope.context().globals().unbound();
            if !unbound.is_empty() {
                return Err(RuntimeError::thrown(format!("unbound: {:?}", unbound)));
            }
            let length = scope
                .context()
                .get("Buffer")
                .get("byteLength")
                .call(&[Value::from("hi")])?;
            scope.exports().set("length", length);
            Ok(())
        });
        let ids = ShimSet::default().install(&mut table);

        let runtime = bootstrap(ids).run(table, HostBindings::default()).unwrap();
        assert_eq!(runtime.exports().get("length"), Value::Number(2.0));
        assert!(runtime.context().global_object().is_none());
    }

    #[test]
    fn test_shims_have_no_parent() {
        let mut table = ModuleTable::new();
        table.push("index.js", |_| Ok(()));
        let ids = ShimSet::default().install(&mut table);

        let runtime = bootstrap(ids).run(table, HostBindings::default()).unwrap();
        let cache = runtime.loader().cache();
        for id in ids.in_order() {
            assert!(cache.get(id).unwrap().parent().is_none());
        }
        assert!(runtime.main().unwrap().children().is_empty());
        assert_eq!(
            runtime.context().get("process"),
            cache.get(ids.process).unwrap().exports()
        );
    }

    #[test]
    fn test_invalid_shim_ids() {
        let mut table = ModuleTable::new();
        table.push("index.js", |_| Ok(()));
        let mut ids = ShimSet::default().install(&mut table);

        ids.buffer = ModuleId(9);
        let err = bootstrap(ids).run(table.clone(), HostBindings::default()).err();
        assert!(matches!(err, Some(RuntimeError::MalformedTable(_))));

        ids.buffer = ModuleId::ENTRY;
        let err = bootstrap(ids).run(table, HostBindings::default()).err();
        assert!(err.is_some_and(|e| e.is_fatal()));
    }

    #[test]
    fn test_duplicate_shim_ids() {
        let entry_ran = Rc::new(Cell::new(false));
        let ran = Rc::clone(&entry_ran);

        let mut table = ModuleTable::new();
        table.push("index.js", move |_| {
            ran.set(true);
            Ok(())
        });
        let mut ids = ShimSet::default().install(&mut table);
        ids.timers = ids.console;

        let err = bootstrap(ids).run(table, HostBindings::default()).err();
        assert!(matches!(err, Some(RuntimeError::MalformedTable(_))));
        assert!(!entry_ran.get());
    }

    #[test]
    fn test_unbound_shim_exports() {
        let mut table = ModuleTable::new();
        table.push("index.js", |_| Ok(()));
        table.push("console.js", |_| Ok(()));
        table.push("timers.js", |_| Ok(()));
        table.push("buffer.js", |scope| {
            scope.exports().set("Buffer", Object::new());
            Ok(())
        });
        table.push("process.js", |_| Ok(()));

        let err = BrowserBootstrap::new(BrowserConfig::default())
            .run(table, HostBindings::default())
            .err();
        match err {
            Some(RuntimeError::MalformedTable(msg)) => {
                assert!(msg.contains("setTimeout"), "{}", msg);
                assert!(!msg.contains("Buffer"), "{}", msg);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_table() {
        let ids = ShimIds {
            console: ModuleId(1),
            timers: ModuleId(2),
            buffer: ModuleId(3),
            process: ModuleId(4),
        };
        let err = bootstrap(ids).run(ModuleTable::new(), HostBindings::default()).err();
        assert!(matches!(err, Some(RuntimeError::MalformedTable(_))));
    }
}
