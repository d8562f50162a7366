// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Values exchanged between bundled modules.
//!
//! Objects and functions are reference types: cloning a [`Value`] that holds
//! one yields another handle to the same container, which is how a module's
//! exports are shared with every module that requires it.

use crate::error::Result;
use crate::globals::buffer::Buffer;
use indexmap::IndexMap;
use std::any::Any;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Shared, mutable property bag
    Object(Object),
    /// Host function
    Function(NativeFunction),
    /// Binary data
    Buffer(Rc<Buffer>),
    /// Opaque host resource, such as a loaded addon library
    Native(NativeHandle),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN != NaN falls out of f64 equality
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Buffer(a), Value::Buffer(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(&a.inner, &b.inner),
            _ => false,
        }
    }
}

impl Value {
    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if this value is nullish (null or undefined).
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns true if this value is a function.
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Converts the value to a boolean (ToBoolean).
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Object(_) | Value::Function(_) | Value::Buffer(_) | Value::Native(_) => true,
        }
    }

    /// Returns the type of this value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Object(_) | Value::Buffer(_) | Value::Native(_) => "object",
        }
    }

    /// Borrow the object container, if this is an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the function, if this is a function.
    pub fn as_function(&self) -> Option<&NativeFunction> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Borrow the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the number, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow the buffer, if this is a buffer.
    pub fn as_buffer(&self) -> Option<&Buffer> {
        match self {
            Value::Buffer(buf) => Some(buf.as_ref()),
            _ => None,
        }
    }

    /// Read a property, yielding undefined for non-objects and missing keys.
    pub fn get(&self, key: &str) -> Value {
        self.as_object().map(|obj| obj.get(key)).unwrap_or_default()
    }

    /// Call this value as a function.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match self {
            Value::Function(func) => func.call(args),
            other => Err(crate::RuntimeError::type_error(format!(
                "{} is not a function",
                other.type_of()
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_value(self, 2))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => f.write_str(&format_value(other, 1)),
        }
    }
}

/// Format a value with a depth limit so that cyclic exports terminate.
pub(crate) fn format_value(value: &Value, depth: u32) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_nan() {
                "NaN".to_string()
            } else if n.is_infinite() {
                if n.is_sign_positive() { "Infinity" } else { "-Infinity" }.to_string()
            } else {
                n.to_string()
            }
        }
        Value::String(s) => s.clone(),
        Value::Function(func) => format!("[Function: {}]", func.name()),
        Value::Buffer(buf) => format!("<Buffer {} bytes>", buf.len()),
        Value::Native(handle) => format!("[native {}]", handle.name()),
        Value::Object(_) if depth == 0 => "[Object]".to_string(),
        Value::Object(obj) => {
            let props = obj.props();
            if props.is_empty() {
                return "{}".to_string();
            }
            let items: Vec<String> = props
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => format!("{}: '{}'", k, s),
                    v => format!("{}: {}", k, format_value(v, depth - 1)),
                })
                .collect();
            format!("{{ {} }}", items.join(", "))
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<NativeFunction> for Value {
    fn from(func: NativeFunction) -> Self {
        Value::Function(func)
    }
}

impl From<Buffer> for Value {
    fn from(buf: Buffer) -> Self {
        Value::Buffer(Rc::new(buf))
    }
}

impl From<NativeHandle> for Value {
    fn from(handle: NativeHandle) -> Self {
        Value::Native(handle)
    }
}

/// An insertion-ordered property bag with reference identity.
#[derive(Clone, Default)]
pub struct Object {
    props: Rc<RefCell<IndexMap<String, Value>>>,
}

impl Object {
    /// Create a new empty object
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an object from key/value pairs
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let props = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            props: Rc::new(RefCell::new(props)),
        }
    }

    /// Get a property, or undefined when absent
    pub fn get(&self, key: &str) -> Value {
        self.props.borrow().get(key).cloned().unwrap_or_default()
    }

    /// Set a property, keeping its original position if it already exists
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.props.borrow_mut().insert(key.into(), value.into());
    }

    /// Check whether a property exists
    pub fn has(&self, key: &str) -> bool {
        self.props.borrow().contains_key(key)
    }

    /// Own property names in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.props.borrow().keys().cloned().collect()
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.props.borrow().len()
    }

    /// Check if the object has no properties
    pub fn is_empty(&self) -> bool {
        self.props.borrow().is_empty()
    }

    /// Whether both handles point at the same container
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.props, &other.props)
    }

    fn props(&self) -> Ref<'_, IndexMap<String, Value>> {
        self.props.borrow()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("keys", &self.keys()).finish()
    }
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value>;

/// A function implemented by the host.
#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    /// Wrap a closure as a callable value
    pub fn new(name: &str, func: impl Fn(&[Value]) -> Result<Value> + 'static) -> Self {
        Self {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    /// The function's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the function
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.func)(args)
    }

    /// Whether both handles refer to the same function
    pub fn ptr_eq(&self, other: &NativeFunction) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// An opaque host resource carried through the value model.
#[derive(Clone)]
pub struct NativeHandle {
    name: Rc<str>,
    inner: Rc<dyn Any>,
}

impl NativeHandle {
    /// Wrap a host resource
    pub fn new<T: Any>(name: &str, inner: T) -> Self {
        Self {
            name: Rc::from(name),
            inner: Rc::new(inner),
        }
    }

    /// Descriptive name of the resource
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Downcast to the concrete resource type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({})", self.name)
    }
}
