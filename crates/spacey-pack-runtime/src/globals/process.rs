// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! `process` shim module

use crate::error::Result;
use crate::module_system::ModuleScope;
use crate::value::{NativeFunction, Object, Value};
use std::path::PathBuf;

/// Create the process object
pub fn create_process_object(args: &[String], cwd: PathBuf) -> Object {
    let process = Object::new();

    // process.argv - array-like object with numeric keys
    let argv = Object::new();
    let exec_path = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "spacey-pack".to_string());
    for (i, arg) in std::iter::once(&exec_path).chain(args).enumerate() {
        argv.set(i.to_string(), arg.as_str());
    }
    argv.set("length", (args.len() + 1) as f64);
    process.set("argv", argv);

    process.set("env", Object::from_entries(std::env::vars()));
    process.set("pid", std::process::id());
    process.set("platform", get_platform());
    process.set("arch", get_arch());
    process.set("version", format!("v{}", crate::NODE_API_VERSION));
    process.set(
        "versions",
        Object::from_entries([
            ("node", crate::NODE_API_VERSION),
            ("spacey-pack", crate::VERSION),
        ]),
    );
    process.set("title", "spacey-pack");
    process.set("execPath", exec_path);
    process.set("exitCode", Value::Undefined);

    let cwd = cwd.display().to_string();
    process.set(
        "cwd",
        NativeFunction::new("cwd", move |_| Ok(Value::from(cwd.as_str()))),
    );

    process.set("stdout", stream_object(1, atty::Stream::Stdout));
    process.set("stderr", stream_object(2, atty::Stream::Stderr));
    process.set("stdin", stream_object(0, atty::Stream::Stdin));

    process
}

/// Build the process shim initializer; the process object is the module's
/// exports.
pub fn initializer(args: Vec<String>) -> impl Fn(&ModuleScope<'_>) -> Result<()> + 'static {
    move |scope| {
        let cwd = std::env::current_dir()?;
        scope
            .module()
            .set_exports(create_process_object(&args, cwd));
        Ok(())
    }
}

/// Get the platform string
fn get_platform() -> &'static str {
    if cfg!(target_os = "windows") {
        "win32"
    } else if cfg!(target_os = "macos") {
        "darwin"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else if cfg!(target_os = "freebsd") {
        "freebsd"
    } else if cfg!(target_os = "openbsd") {
        "openbsd"
    } else {
        "unknown"
    }
}

/// Get the architecture string
fn get_arch() -> &'static str {
    if cfg!(target_arch = "x86_64") {
        "x64"
    } else if cfg!(target_arch = "x86") {
        "ia32"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else if cfg!(target_arch = "arm") {
        "arm"
    } else {
        "unknown"
    }
}

fn stream_object(fd: u32, stream: atty::Stream) -> Object {
    Object::from_entries([
        ("fd", Value::from(fd)),
        ("isTTY", Value::Boolean(atty::is(stream))),
    ])
}
