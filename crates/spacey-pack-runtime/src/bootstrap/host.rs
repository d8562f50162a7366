// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host-process variant

use super::{Runtime, ensure_entry, start};
use crate::addon::AddonBootstrap;
use crate::config::HostConfig;
use crate::context::RuntimeContext;
use crate::error::Result;
use crate::module_system::Loader;
use crate::table::ModuleTable;

/// Bootstrap for bundles that run inside a host process
pub struct HostBootstrap {
    addons: Option<AddonBootstrap>,
}

impl HostBootstrap {
    /// Create a bootstrap from the host placeholders
    pub fn new(config: HostConfig) -> Self {
        Self {
            addons: native_addons(&config),
        }
    }

    /// Use `addons` instead of the configured addon bootstrap
    pub fn with_addons(mut self, addons: AddonBootstrap) -> Self {
        self.addons = Some(addons);
        self
    }

    /// Load the entry module as main
    pub fn run(self, table: ModuleTable) -> Result<Runtime> {
        ensure_entry(&table)?;

        let mut context = RuntimeContext::new();
        if let Some(addons) = self.addons {
            tracing::debug!("native addons enabled in {}", addons.temp_dir().display());
            context = context.with_addons(addons);
        }

        start(Loader::new(table, context))
    }
}

#[cfg(feature = "native-addons")]
fn native_addons(config: &HostConfig) -> Option<AddonBootstrap> {
    config
        .native_addons
        .then(|| AddonBootstrap::native(&config.temp_dir))
}

#[cfg(not(feature = "native-addons"))]
fn native_addons(config: &HostConfig) -> Option<AddonBootstrap> {
    if config.native_addons {
        tracing::warn!("native addons requested but this build has no dynamic loader");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use crate::table::ModuleId;
    use crate::value::Value;

    fn config(native_addons: bool) -> HostConfig {
        HostConfig {
            native_addons,
            ..Default::default()
        }
    }

    #[test]
    fn test_entry_is_main() {
        let mut table = ModuleTable::new();
        table.push("/app/index.js", |scope| {
            scope.require(ModuleId(1))?;
            scope.exports().set("ready", true);
            Ok(())
        });
        table.push("/app/lib.js", |_| Ok(()));

        let runtime = HostBootstrap::new(config(false)).run(table).unwrap();
        let main = runtime.main().unwrap();
        assert_eq!(main.id(), ModuleId::ENTRY);
        assert!(main.is_loaded());
        assert_eq!(main.child_ids(), vec![ModuleId(1)]);
        assert_eq!(runtime.exports().get("ready"), Value::Boolean(true));
    }

    #[test]
    fn test_addons_disabled() {
        let mut table = ModuleTable::new();
        table.push("index.js", |scope| scope.load_addon("fast.node", "AAEC"));

        let err = HostBootstrap::new(config(false)).run(table).err();
        assert!(matches!(err, Some(RuntimeError::AddonsUnavailable(_))));
    }

    #[cfg(feature = "native-addons")]
    #[test]
    fn test_addons_enabled() {
        let runtime = HostBootstrap::new(config(true))
            .run(ModuleTable::from_entries([(
                "index.js",
                |_: &crate::module_system::ModuleScope<'_>| Ok(()),
            )]))
            .unwrap();
        assert!(runtime.context().addons().is_some());
    }

    #[test]
    fn test_empty_table() {
        let err = HostBootstrap::new(config(false)).run(ModuleTable::new()).err();
        assert!(err.is_some_and(|e| e.is_fatal()));
    }
}
