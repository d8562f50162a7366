// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module cache for require()
//!
//! Entries are only ever added. A record is registered before its
//! initializer runs and is never removed or replaced afterwards, even if the
//! initializer fails.

use crate::module_system::record::ModuleRef;
use crate::table::ModuleId;
use std::cell::RefCell;
use std::rc::Rc;

/// Dense id-indexed module cache
#[derive(Debug, Default)]
pub struct ModuleCache {
    slots: RefCell<Vec<Option<ModuleRef>>>,
}

impl ModuleCache {
    /// Create an empty cache sized for `capacity` modules
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: RefCell::new(vec![None; capacity]),
        }
    }

    /// Get a cached module by id
    pub fn get(&self, id: ModuleId) -> Option<ModuleRef> {
        self.slots.borrow().get(id.0).and_then(|slot| slot.clone())
    }

    /// Check if a module is cached
    pub fn has(&self, id: ModuleId) -> bool {
        self.get(id).is_some()
    }

    /// Register a record. The slot must be vacant.
    pub(crate) fn insert(&self, record: ModuleRef) {
        let mut slots = self.slots.borrow_mut();
        let index = record.id().0;
        if slots.len() <= index {
            slots.resize(index + 1, None);
        }
        debug_assert!(slots[index].is_none(), "module {} cached twice", index);
        slots[index].get_or_insert(record);
    }

    /// Ids of all cached modules in id order
    pub fn keys(&self) -> Vec<ModuleId> {
        self.slots
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| ModuleId(i))
            .collect()
    }

    /// All cached records in id order
    pub fn records(&self) -> Vec<ModuleRef> {
        self.slots.borrow().iter().flatten().map(Rc::clone).collect()
    }

    /// Get the number of cached modules
    pub fn len(&self) -> usize {
        self.slots.borrow().iter().flatten().count()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
