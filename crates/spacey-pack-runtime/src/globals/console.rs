// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! `console` shim module

use crate::error::Result;
use crate::module_system::ModuleScope;
use crate::value::{NativeFunction, Object, Value};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Console timer tracking
static TIMERS: std::sync::LazyLock<parking_lot::Mutex<HashMap<String, Instant>>> =
    std::sync::LazyLock::new(|| parking_lot::Mutex::new(HashMap::new()));

/// Console count tracking
static COUNTERS: std::sync::LazyLock<parking_lot::Mutex<HashMap<String, u64>>> =
    std::sync::LazyLock::new(|| parking_lot::Mutex::new(HashMap::new()));

/// Current group indentation level
static GROUP_LEVEL: AtomicU32 = AtomicU32::new(0);

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Create the console object
pub fn create_console_object() -> Object {
    let console = Object::new();

    for name in ["log", "info", "debug"] {
        console.set(name, printer(name, Stream::Stdout));
    }
    for name in ["warn", "error"] {
        console.set(name, printer(name, Stream::Stderr));
    }

    console.set(
        "trace",
        NativeFunction::new("trace", |args| {
            emit(Stream::Stderr, &format!("Trace: {}", format_message(args)));
            Ok(Value::Undefined)
        }),
    );
    console.set(
        "assert",
        NativeFunction::new("assert", |args| {
            let condition = args.first().is_some_and(Value::to_boolean);
            if let Some(line) = assertion_message(condition, args.get(1..).unwrap_or_default()) {
                emit(Stream::Stderr, &line);
            }
            Ok(Value::Undefined)
        }),
    );
    console.set(
        "time",
        NativeFunction::new("time", |args| {
            time(&label(args));
            Ok(Value::Undefined)
        }),
    );
    console.set(
        "timeEnd",
        NativeFunction::new("timeEnd", |args| {
            let label = label(args);
            match time_end(&label) {
                Some(ms) => emit(Stream::Stdout, &format!("{}: {:.3}ms", label, ms)),
                None => emit(Stream::Stderr, &format!("Timer '{}' does not exist", label)),
            }
            Ok(Value::Undefined)
        }),
    );
    console.set(
        "count",
        NativeFunction::new("count", |args| {
            let label = label(args);
            let n = count(&label);
            emit(Stream::Stdout, &format!("{}: {}", label, n));
            Ok(Value::Undefined)
        }),
    );
    console.set(
        "countReset",
        NativeFunction::new("countReset", |args| {
            count_reset(&label(args));
            Ok(Value::Undefined)
        }),
    );
    console.set(
        "group",
        NativeFunction::new("group", |args| {
            if !args.is_empty() {
                emit(Stream::Stdout, &format_message(args));
            }
            GROUP_LEVEL.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Undefined)
        }),
    );
    console.set(
        "groupEnd",
        NativeFunction::new("groupEnd", |_| {
            let _ = GROUP_LEVEL.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |level| {
                level.checked_sub(1)
            });
            Ok(Value::Undefined)
        }),
    );

    console
}

/// Module initializer for the console shim; the console object is the
/// module's exports.
pub fn init(scope: &ModuleScope<'_>) -> Result<()> {
    scope.module().set_exports(create_console_object());
    Ok(())
}

fn printer(name: &str, stream: Stream) -> NativeFunction {
    NativeFunction::new(name, move |args| {
        emit(stream, &format_message(args));
        Ok(Value::Undefined)
    })
}

fn label(args: &[Value]) -> String {
    match args.first() {
        None | Some(Value::Undefined) => "default".to_string(),
        Some(value) => value.to_string(),
    }
}

/// Join console arguments the way `console.log` prints them
pub fn format_message(args: &[Value]) -> String {
    args.iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn assertion_message(condition: bool, rest: &[Value]) -> Option<String> {
    if condition {
        None
    } else if rest.is_empty() {
        Some("Assertion failed".to_string())
    } else {
        Some(format!("Assertion failed: {}", format_message(rest)))
    }
}

fn emit(stream: Stream, message: &str) {
    let indent = "  ".repeat(GROUP_LEVEL.load(Ordering::SeqCst) as usize);
    let text: String = message
        .lines()
        .map(|line| format!("{}{}\n", indent, line))
        .collect();
    let text = if text.is_empty() { "\n".to_string() } else { text };
    let _ = match stream {
        Stream::Stdout => std::io::stdout().write_all(text.as_bytes()),
        Stream::Stderr => std::io::stderr().write_all(text.as_bytes()),
    };
}

/// Implementation of console.time
pub fn time(label: &str) {
    TIMERS.lock().insert(label.to_string(), Instant::now());
}

/// Implementation of console.timeEnd, returning elapsed milliseconds
pub fn time_end(label: &str) -> Option<f64> {
    TIMERS
        .lock()
        .remove(label)
        .map(|start| start.elapsed().as_secs_f64() * 1000.0)
}

/// Implementation of console.count
pub fn count(label: &str) -> u64 {
    let mut counters = COUNTERS.lock();
    let count = counters.entry(label.to_string()).or_insert(0);
    *count += 1;
    *count
}

/// Implementation of console.countReset
pub fn count_reset(label: &str) {
    COUNTERS.lock().remove(label);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        let obj = Object::from_entries([("a", 1)]);
        let args = [Value::from("value"), Value::Number(42.0), obj.into()];
        assert_eq!(format_message(&args), "value 42 { a: 1 }");
    }

    #[test]
    fn test_counters() {
        assert_eq!(count("console-test-counter"), 1);
        assert_eq!(count("console-test-counter"), 2);
        count_reset("console-test-counter");
        assert_eq!(count("console-test-counter"), 1);
    }

    #[test]
    fn test_timers() {
        assert!(time_end("console-test-missing").is_none());
        time("console-test-timer");
        assert!(time_end("console-test-timer").is_some());
        assert!(time_end("console-test-timer").is_none());
    }

    #[test]
    fn test_assertion_message() {
        assert_eq!(assertion_message(true, &[]), None);
        assert_eq!(assertion_message(false, &[]).unwrap(), "Assertion failed");
        assert_eq!(
            assertion_message(false, &["bad".into()]).unwrap(),
            "Assertion failed: bad"
        );
    }

    #[test]
    fn test_console_object_shape() {
        let console = create_console_object();
        for name in ["log", "info", "warn", "error", "time", "timeEnd", "count", "group"] {
            assert!(console.get(name).is_function(), "missing console.{}", name);
        }
    }
}
