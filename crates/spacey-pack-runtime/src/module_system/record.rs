// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime record of a loaded module (the `module` object)

use crate::table::ModuleId;
use crate::value::{Object, Value};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::{Rc, Weak};

/// Shared handle to a module record
pub type ModuleRef = Rc<ModuleRecord>;

/// A module as seen by the loader and by other modules
#[derive(Debug)]
pub struct ModuleRecord {
    id: ModuleId,
    exports: RefCell<Value>,
    parent: Option<Weak<ModuleRecord>>,
    children: RefCell<Vec<ModuleRef>>,
    filename: String,
    dirname: String,
    paths: Vec<String>,
    loaded: Cell<bool>,
}

impl ModuleRecord {
    /// Create a record with an empty exports object
    pub(crate) fn new(id: ModuleId, name: &str, parent: Option<&ModuleRef>) -> ModuleRef {
        let dirname = dirname_of(name);
        let paths = node_module_paths(&dirname);
        Rc::new(Self {
            id,
            exports: RefCell::new(Value::Object(Object::new())),
            parent: parent.map(Rc::downgrade),
            children: RefCell::new(Vec::new()),
            filename: name.to_string(),
            dirname,
            paths,
            loaded: Cell::new(false),
        })
    }

    /// Table id of this module
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Current exports value
    pub fn exports(&self) -> Value {
        self.exports.borrow().clone()
    }

    /// Replace the exports wholesale (`module.exports = ...`)
    pub fn set_exports(&self, value: impl Into<Value>) {
        *self.exports.borrow_mut() = value.into();
    }

    /// The module that first required this one
    pub fn parent(&self) -> Option<ModuleRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Modules first loaded through this one, in load order
    pub fn children(&self) -> Vec<ModuleRef> {
        self.children.borrow().clone()
    }

    /// Ids of [`children`](Self::children)
    pub fn child_ids(&self) -> Vec<ModuleId> {
        self.children.borrow().iter().map(|c| c.id).collect()
    }

    pub(crate) fn add_child(&self, child: ModuleRef) {
        self.children.borrow_mut().push(child);
    }

    /// The module's name as emitted by the bundler
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Directory component of the filename
    pub fn dirname(&self) -> &str {
        &self.dirname
    }

    /// `node_modules` lookup directories, nearest first
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Whether the initializer ran to completion
    pub fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    pub(crate) fn mark_loaded(&self) {
        self.loaded.set(true);
    }
}

fn dirname_of(name: &str) -> String {
    match Path::new(name).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.display().to_string(),
        _ => ".".to_string(),
    }
}

fn node_module_paths(dirname: &str) -> Vec<String> {
    Path::new(dirname)
        .ancestors()
        .filter(|dir| !dir.as_os_str().is_empty())
        .filter(|dir| dir.file_name().is_none_or(|name| name != "node_modules"))
        .map(|dir| dir.join("node_modules").display().to_string())
        .collect()
}
