// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! `Buffer` shim module
//!
//! Exports `{ Buffer }` where `Buffer` carries the static constructors
//! `from`, `alloc`, `byteLength`, `isBuffer` and `concat`.

use crate::error::{Result, RuntimeError};
use crate::module_system::ModuleScope;
use crate::value::{NativeFunction, Object, Value};
use base64::Engine;
use base64::prelude::BASE64_STANDARD;

/// Largest allocation `Buffer.alloc` accepts
pub const MAX_LENGTH: u64 = 1 << 32;

/// Immutable binary data
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    /// Create a zero-filled buffer
    pub fn alloc(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    /// Create a buffer from bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
        }
    }

    /// Create a buffer from a string with the given encoding.
    ///
    /// Undecodable base64 or hex input yields an empty buffer.
    pub fn from_string(s: &str, encoding: &str) -> Result<Self> {
        let data = match normalize_encoding(encoding)? {
            Encoding::Utf8 => s.as_bytes().to_vec(),
            Encoding::Ascii => s.chars().map(|c| (c as u32 & 0x7f) as u8).collect(),
            Encoding::Latin1 => s.chars().map(|c| (c as u32 & 0xff) as u8).collect(),
            Encoding::Base64 => {
                let compact: String = s.split_whitespace().collect();
                BASE64_STANDARD.decode(compact).unwrap_or_default()
            }
            Encoding::Hex => hex::decode(s).unwrap_or_default(),
        };
        Ok(Self { data })
    }

    /// Concatenate buffers
    pub fn concat<'a>(buffers: impl IntoIterator<Item = &'a Buffer>) -> Self {
        Self {
            data: buffers.into_iter().flat_map(|b| b.data.iter().copied()).collect(),
        }
    }

    /// Get the length of the buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode the contents with the given encoding
    pub fn to_string(&self, encoding: &str) -> Result<String> {
        Ok(match normalize_encoding(encoding)? {
            Encoding::Utf8 => String::from_utf8_lossy(&self.data).into_owned(),
            Encoding::Ascii => self.data.iter().map(|&b| (b & 0x7f) as char).collect(),
            Encoding::Latin1 => self.data.iter().map(|&b| b as char).collect(),
            Encoding::Base64 => BASE64_STANDARD.encode(&self.data),
            Encoding::Hex => hex::encode(&self.data),
        })
    }

    /// Get a byte at the given index
    pub fn get(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    /// Copy out a range, clamped to the buffer's bounds
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.data.len());
        let start = start.min(end);
        Self::from_bytes(&self.data[start..end])
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

enum Encoding {
    Utf8,
    Ascii,
    Latin1,
    Base64,
    Hex,
}

fn normalize_encoding(encoding: &str) -> Result<Encoding> {
    match encoding.to_ascii_lowercase().as_str() {
        "utf8" | "utf-8" => Ok(Encoding::Utf8),
        "ascii" => Ok(Encoding::Ascii),
        "latin1" | "binary" => Ok(Encoding::Latin1),
        "base64" => Ok(Encoding::Base64),
        "hex" => Ok(Encoding::Hex),
        other => Err(RuntimeError::type_error(format!("Unknown encoding: {}", other))),
    }
}

fn encoding_arg(args: &[Value], index: usize) -> &str {
    args.get(index).and_then(Value::as_str).unwrap_or("utf8")
}

/// Create the `Buffer` object
pub fn create_buffer_class() -> Object {
    let class = Object::new();

    class.set(
        "from",
        NativeFunction::new("from", |args| {
            let buffer = match args.first() {
                Some(Value::String(s)) => Buffer::from_string(s, encoding_arg(args, 1))?,
                Some(Value::Buffer(b)) => Buffer::clone(b),
                Some(other) => {
                    return Err(RuntimeError::type_error(format!(
                        "The first argument must be a string or Buffer, received {}",
                        other.type_of()
                    )));
                }
                None => return Err(RuntimeError::type_error("Buffer.from requires an argument")),
            };
            Ok(buffer.into())
        }),
    );

    class.set(
        "alloc",
        NativeFunction::new("alloc", |args| match args.first() {
            Some(Value::Number(n)) if *n >= 0.0 && *n <= MAX_LENGTH as f64 => {
                Ok(Buffer::alloc(*n as usize).into())
            }
            Some(Value::Number(n)) => Err(RuntimeError::range_error(format!(
                "The value of \"size\" is out of range. Received {}",
                n
            ))),
            _ => Err(RuntimeError::type_error("The \"size\" argument must be of type number")),
        }),
    );

    class.set(
        "byteLength",
        NativeFunction::new("byteLength", |args| match args.first() {
            Some(Value::String(s)) => {
                Ok(Value::Number(Buffer::from_string(s, encoding_arg(args, 1))?.len() as f64))
            }
            Some(Value::Buffer(b)) => Ok(Value::Number(b.len() as f64)),
            _ => Err(RuntimeError::type_error(
                "The \"string\" argument must be of type string or Buffer",
            )),
        }),
    );

    class.set(
        "isBuffer",
        NativeFunction::new("isBuffer", |args| {
            Ok(Value::Boolean(matches!(args.first(), Some(Value::Buffer(_)))))
        }),
    );

    class.set(
        "concat",
        NativeFunction::new("concat", |args| {
            let buffers = args
                .iter()
                .map(|arg| {
                    arg.as_buffer()
                        .ok_or_else(|| RuntimeError::type_error("Buffer.concat only accepts buffers"))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Buffer::concat(buffers).into())
        }),
    );

    class.set("poolSize", 8192);
    class
}

/// Module initializer for the buffer shim
pub fn init(scope: &ModuleScope<'_>) -> Result<()> {
    scope.exports().set("Buffer", create_buffer_class());
    Ok(())
}
