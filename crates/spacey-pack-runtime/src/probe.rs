// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Builtin export probe
//!
//! The bundler needs the export names of a builtin module to generate named
//! re-exports. Loading a builtin runs arbitrary initialization, so the names
//! are collected in a child process: `<program> __probe-child <specifier>`
//! prints a JSON array of names on stdout.

use crate::context::RuntimeContext;
use crate::error::{Result, RuntimeError};
use crate::globals::ShimSet;
use crate::module_system::Loader;
use crate::table::ModuleTable;
use std::path::Path;
use std::process::{Command, Stdio};

/// Hidden subcommand the probe child is started with
pub const PROBE_CHILD_COMMAND: &str = "__probe-child";

/// Names never re-exported by name
const EXCLUDED_NAMES: [&str; 3] = ["default", "__proto__", "__esModule"];

/// Whether `name` can be re-exported as a named binding
pub fn is_export_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let head = first.is_ascii_alphabetic() || first == '_' || first == '$';
    head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !EXCLUDED_NAMES.contains(&name)
}

/// Keep the names that can be re-exported, in their original order
pub fn filter_export_names<I, S>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    keys.into_iter()
        .map(Into::into)
        .filter(|name| is_export_name(name))
        .collect()
}

/// Load a builtin in this process and list its exportable names
pub fn builtin_exports(specifier: &str) -> Result<Vec<String>> {
    let descriptor = ShimSet::default()
        .builtin(specifier)
        .ok_or_else(|| RuntimeError::UnknownBuiltin(specifier.to_string()))?;

    let mut table = ModuleTable::new();
    table.push_descriptor(descriptor);
    let exports = Loader::new(table, RuntimeContext::new()).load_main()?;

    let keys = exports.as_object().map(|obj| obj.keys()).unwrap_or_default();
    Ok(filter_export_names(keys))
}

/// Body of the probe child: the JSON line to print
pub fn run_child(specifier: &str) -> Result<String> {
    Ok(serde_json::to_string(&builtin_exports(specifier)?)?)
}

/// Ask `program` for the export names of `specifier` in a subprocess
pub fn probe_exports(program: &Path, specifier: &str) -> Result<Vec<String>> {
    tracing::debug!("probing '{}' via {}", specifier, program.display());

    let output = Command::new(program)
        .arg(PROBE_CHILD_COMMAND)
        .arg(specifier)
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(RuntimeError::ProbeFailed {
            specifier: specifier.to_string(),
            status: output.status.code(),
            signal: exit_signal(&output.status),
            stderr: output.stderr,
        });
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}
