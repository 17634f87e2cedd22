// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Semantic values and the parity equality rule.
//!
//! Equality is not Rust's float equality. For parity purposes two floats are
//! equal when they are numerically equal, or when both are NaN with the same
//! bit pattern. So `0.0 == -0.0` holds, `NaN == NaN` holds only if the payloads
//! match, and `NaN(0x7fc00000) != NaN(0x7fc00001)` because a codec that
//! canonicalizes NaN payloads is broken. Integers compare exactly, and a `U16(1)`
//! is never equal to a `U32(1)`.

use std::fmt;

use crate::layout::{child_path, element_path, PrimitiveKind};

/// A value that can be encoded against some [`crate::layout::TypeDescriptor`].
///
/// Unions have no wrapper: a union value is its active member's value, and the
/// member choice travels separately in a [`crate::layout::VariantContext`].
#[derive(Debug, Clone)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Array(Vec<Value>),
    /// Fields in declaration order.
    Struct(Vec<(String, Value)>),
    Enum {
        tag: u8,
        payload: Option<Box<Value>>,
    },
}

impl Value {
    /// Build a struct value from `(name, value)` pairs.
    pub fn structure<N: Into<String>>(fields: impl IntoIterator<Item = (N, Value)>) -> Self {
        Value::Struct(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Build an enum value.
    pub fn variant(tag: u8, payload: Option<Value>) -> Self {
        Value::Enum {
            tag,
            payload: payload.map(Box::new),
        }
    }

    /// Primitive kind of a scalar value, `None` for composites.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Value::U8(_) => PrimitiveKind::U8,
            Value::U16(_) => PrimitiveKind::U16,
            Value::U32(_) => PrimitiveKind::U32,
            Value::U64(_) => PrimitiveKind::U64,
            Value::I8(_) => PrimitiveKind::I8,
            Value::I16(_) => PrimitiveKind::I16,
            Value::I32(_) => PrimitiveKind::I32,
            Value::I64(_) => PrimitiveKind::I64,
            Value::F32(_) => PrimitiveKind::F32,
            Value::F64(_) => PrimitiveKind::F64,
            Value::Array(_) | Value::Struct(_) | Value::Enum { .. } => return None,
        })
    }

    /// Short name of the value's shape, for type-mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Enum { .. } => "enum",
            scalar => scalar.primitive_kind().map_or("?", PrimitiveKind::name),
        }
    }

    /// Field value by name, for struct values.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// First place where `actual` disagrees with `self` under the parity rule.
    pub fn first_difference(&self, actual: &Value) -> Option<ValueDiff> {
        diff_at(self, actual, "")
    }
}

/// Where two values first disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDiff {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

fn leaf_diff(path: &str, expected: &Value, actual: &Value) -> Option<ValueDiff> {
    Some(ValueDiff {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

fn diff_at(expected: &Value, actual: &Value, path: &str) -> Option<ValueDiff> {
    match (expected, actual) {
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Some(ValueDiff {
                    path: path.to_string(),
                    expected: format!("{} elements", a.len()),
                    actual: format!("{} elements", b.len()),
                });
            }
            a.iter()
                .zip(b)
                .enumerate()
                .find_map(|(i, (x, y))| diff_at(x, y, &element_path(path, i)))
        }
        (Value::Struct(a), Value::Struct(b)) => {
            for (name, x) in a {
                let field_path = child_path(path, name);
                match b.iter().find(|(n, _)| n == name) {
                    Some((_, y)) => {
                        if let Some(diff) = diff_at(x, y, &field_path) {
                            return Some(diff);
                        }
                    }
                    None => {
                        return Some(ValueDiff {
                            path: field_path,
                            expected: x.to_string(),
                            actual: "<missing>".to_string(),
                        })
                    }
                }
            }
            b.iter()
                .find(|(name, _)| !a.iter().any(|(n, _)| n == name))
                .map(|(name, y)| ValueDiff {
                    path: child_path(path, name),
                    expected: "<absent>".to_string(),
                    actual: y.to_string(),
                })
        }
        (
            Value::Enum {
                tag: ta,
                payload: pa,
            },
            Value::Enum {
                tag: tb,
                payload: pb,
            },
        ) => {
            if ta != tb {
                return Some(ValueDiff {
                    path: path.to_string(),
                    expected: format!("tag {}", ta),
                    actual: format!("tag {}", tb),
                });
            }
            match (pa, pb) {
                (None, None) => None,
                (Some(x), Some(y)) => diff_at(x, y, &child_path(path, &format!("#{}", ta))),
                _ => leaf_diff(path, expected, actual),
            }
        }
        _ => {
            if scalar_eq(expected, actual) {
                None
            } else {
                leaf_diff(path, expected, actual)
            }
        }
    }
}

fn f32_eq(a: f32, b: f32) -> bool {
    if a.is_nan() || b.is_nan() {
        a.to_bits() == b.to_bits()
    } else {
        a == b
    }
}

fn f64_eq(a: f64, b: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        a.to_bits() == b.to_bits()
    } else {
        a == b
    }
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::U8(x), Value::U8(y)) => x == y,
        (Value::U16(x), Value::U16(y)) => x == y,
        (Value::U32(x), Value::U32(y)) => x == y,
        (Value::U64(x), Value::U64(y)) => x == y,
        (Value::I8(x), Value::I8(y)) => x == y,
        (Value::I16(x), Value::I16(y)) => x == y,
        (Value::I32(x), Value::I32(y)) => x == y,
        (Value::I64(x), Value::I64(y)) => x == y,
        (Value::F32(x), Value::F32(y)) => f32_eq(*x, *y),
        (Value::F64(x), Value::F64(y)) => f64_eq(*x, *y),
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.first_difference(other).is_none()
    }
}

fn fmt_f32(f: &mut fmt::Formatter<'_>, x: f32) -> fmt::Result {
    if x.is_nan() {
        write!(f, "NaN(0x{:08x})", x.to_bits())
    } else {
        write!(f, "{:?}", x)
    }
}

fn fmt_f64(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        write!(f, "NaN(0x{:016x})", x.to_bits())
    } else {
        write!(f, "{:?}", x)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(x) => write!(f, "{}u8", x),
            Value::U16(x) => write!(f, "{}u16", x),
            Value::U32(x) => write!(f, "{}u32", x),
            Value::U64(x) => write!(f, "{}u64", x),
            Value::I8(x) => write!(f, "{}i8", x),
            Value::I16(x) => write!(f, "{}i16", x),
            Value::I32(x) => write!(f, "{}i32", x),
            Value::I64(x) => write!(f, "{}i64", x),
            Value::F32(x) => fmt_f32(f, *x),
            Value::F64(x) => fmt_f64(f, *x),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Struct(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                f.write_str("}")
            }
            Value::Enum { tag, payload } => match payload {
                Some(payload) => write!(f, "#{}({})", tag, payload),
                None => write!(f, "#{}", tag),
            },
        }
    }
}
