// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The module table emitted by the bundler.
//!
//! Modules are addressed only by their dense integer id. Names are kept for
//! diagnostics and double as each module's `__filename`.

use crate::error::{Result, RuntimeError};
use crate::module_system::ModuleScope;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Index of a module in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub usize);

impl ModuleId {
    /// The entry module
    pub const ENTRY: ModuleId = ModuleId(0);

    /// Whether this is the entry module
    pub fn is_entry(self) -> bool {
        self == Self::ENTRY
    }

    /// Interpret a value passed to `require` as a module id.
    ///
    /// Only non-negative integral numbers are ids; anything else is reported
    /// as a missing module, exactly like an out-of-range index.
    pub fn from_value(value: &Value) -> Result<ModuleId> {
        match value {
            Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= usize::MAX as f64 => {
                Ok(ModuleId(*n as usize))
            }
            other => Err(RuntimeError::module_not_found(other.to_string())),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for ModuleId {
    fn from(id: usize) -> Self {
        ModuleId(id)
    }
}

/// Module initializer, the body of a bundled module
pub type InitFn = Rc<dyn Fn(&ModuleScope<'_>) -> Result<()>>;

/// One entry of the module table
#[derive(Clone)]
pub struct ModuleDescriptor {
    /// Diagnostic path, also used as the module's filename
    pub name: String,
    /// Initializer run on first load
    pub init: InitFn,
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of module descriptors
#[derive(Debug, Clone, Default)]
pub struct ModuleTable {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, initializer)` pairs in id order
    pub fn from_entries<N, F>(entries: impl IntoIterator<Item = (N, F)>) -> Self
    where
        N: Into<String>,
        F: Fn(&ModuleScope<'_>) -> Result<()> + 'static,
    {
        let mut table = Self::new();
        for (name, init) in entries {
            table.push(name, init);
        }
        table
    }

    /// Append a module and return its id
    pub fn push(
        &mut self,
        name: impl Into<String>,
        init: impl Fn(&ModuleScope<'_>) -> Result<()> + 'static,
    ) -> ModuleId {
        self.push_descriptor(ModuleDescriptor {
            name: name.into(),
            init: Rc::new(init),
        })
    }

    /// Append an already built descriptor and return its id
    pub fn push_descriptor(&mut self, descriptor: ModuleDescriptor) -> ModuleId {
        self.modules.push(descriptor);
        ModuleId(self.modules.len() - 1)
    }

    /// Look up a descriptor. An unknown id is an upstream bundler defect.
    pub fn get(&self, id: ModuleId) -> Result<&ModuleDescriptor> {
        self.modules
            .get(id.0)
            .ok_or_else(|| RuntimeError::module_not_found(id.to_string()))
    }

    /// Whether `id` indexes into the table
    pub fn contains(&self, id: ModuleId) -> bool {
        id.0 < self.modules.len()
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterate over `(id, descriptor)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &ModuleDescriptor)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, desc)| (ModuleId(i), desc))
    }
}
