// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! JSON form of [`Value`]s, shared by corpus files, the process adapter
//! protocol, and report documents.
//!
//! JSON alone can't say whether `1` is a `u8` or an `i64`, so reading is always
//! driven by a descriptor. The accepted forms:
//!
//! | Shape       | JSON                                                        |
//! |-------------|-------------------------------------------------------------|
//! | integer     | number, or `"0x..."` hex (two's complement when signed)     |
//! | float       | number, `"nan"`, `"inf"`, `"-inf"`, or `"0x..."` raw bits   |
//! | array       | array of exactly `count` elements                           |
//! | struct      | object with every declared field and nothing else           |
//! | enum        | `{"variant": NAME, "payload": ..}`, `{"tag": N, ..}`, `NAME` |
//! | union       | the active member's JSON; the member comes from the context |
//!
//! Writing picks the lossless form: NaN floats come out as raw bits, infinities
//! as `"inf"`/`"-inf"`.

use serde_json::{json, Map, Value as Json};

use super::Value;
use crate::error::CodecError;
use crate::layout::{child_path, element_path, EnumVariant, PrimitiveKind, TypeDescriptor, VariantContext};

// ============================================================================
// READING
// ============================================================================

/// Parse `json` as a value of `desc`.
pub fn value_from_json(
    desc: &TypeDescriptor,
    json: &Json,
    ctx: &VariantContext,
) -> Result<Value, CodecError> {
    from_json_at(desc, json, "", ctx)
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn mismatch(path: &str, expected: &str, json: &Json) -> CodecError {
    CodecError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        found: json_kind(json).to_string(),
    }
}

fn invalid(path: &str, reason: String) -> CodecError {
    CodecError::InvalidValue {
        path: path.to_string(),
        reason,
    }
}

fn parse_hex_u64(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))?;
    u64::from_str_radix(&digits.replace('_', ""), 16).ok()
}

/// Integer forms collapse to i128 so one range check covers every width.
fn integer(json: &Json, kind: PrimitiveKind, path: &str) -> Result<i128, CodecError> {
    match json {
        Json::Number(n) => n
            .as_u64()
            .map(i128::from)
            .or_else(|| n.as_i64().map(i128::from))
            .ok_or_else(|| invalid(path, format!("{} is not an integer", n))),
        Json::String(s) => {
            let bits = parse_hex_u64(s)
                .ok_or_else(|| invalid(path, format!("'{}' is not a hex integer", s)))?;
            Ok(if kind.is_signed() {
                sign_extend(bits, kind.width())
            } else {
                i128::from(bits)
            })
        }
        other => Err(mismatch(path, kind.name(), other)),
    }
}

/// Signed hex is the field's two's-complement bit pattern: `"0xff"` as an
/// `i8` is -1.
fn sign_extend(bits: u64, width: usize) -> i128 {
    let unused = 64 - 8 * width as u32;
    if unused > 0 && bits >> (64 - unused) != 0 {
        // Wider than the field; left for the range check to reject.
        return i128::from(bits);
    }
    i128::from(((bits << unused) as i64) >> unused)
}

fn narrow<T: TryFrom<i128>>(raw: i128, kind: PrimitiveKind, path: &str) -> Result<T, CodecError> {
    T::try_from(raw).map_err(|_| invalid(path, format!("{} out of range for {}", raw, kind)))
}

fn float_bits(json: &Json, kind: PrimitiveKind, path: &str) -> Result<FloatForm, CodecError> {
    match json {
        Json::Number(n) => n
            .as_f64()
            .map(FloatForm::Number)
            .ok_or_else(|| invalid(path, format!("{} is not a float", n))),
        Json::String(s) => match s.to_ascii_lowercase().as_str() {
            "nan" => Ok(FloatForm::Number(f64::NAN)),
            "inf" | "+inf" | "infinity" => Ok(FloatForm::Number(f64::INFINITY)),
            "-inf" | "-infinity" => Ok(FloatForm::Number(f64::NEG_INFINITY)),
            _ => parse_hex_u64(s)
                .map(FloatForm::Bits)
                .ok_or_else(|| invalid(path, format!("'{}' is not a float", s))),
        },
        other => Err(mismatch(path, kind.name(), other)),
    }
}

enum FloatForm {
    Number(f64),
    Bits(u64),
}

fn primitive_from_json(kind: PrimitiveKind, json: &Json, path: &str) -> Result<Value, CodecError> {
    Ok(match kind {
        PrimitiveKind::U8 => Value::U8(narrow(integer(json, kind, path)?, kind, path)?),
        PrimitiveKind::U16 => Value::U16(narrow(integer(json, kind, path)?, kind, path)?),
        PrimitiveKind::U32 => Value::U32(narrow(integer(json, kind, path)?, kind, path)?),
        PrimitiveKind::U64 => Value::U64(narrow(integer(json, kind, path)?, kind, path)?),
        PrimitiveKind::I8 => Value::I8(narrow(integer(json, kind, path)?, kind, path)?),
        PrimitiveKind::I16 => Value::I16(narrow(integer(json, kind, path)?, kind, path)?),
        PrimitiveKind::I32 => Value::I32(narrow(integer(json, kind, path)?, kind, path)?),
        PrimitiveKind::I64 => Value::I64(narrow(integer(json, kind, path)?, kind, path)?),
        PrimitiveKind::F32 => Value::F32(match float_bits(json, kind, path)? {
            FloatForm::Number(x) => x as f32,
            FloatForm::Bits(bits) => f32::from_bits(narrow(i128::from(bits), kind, path)?),
        }),
        PrimitiveKind::F64 => Value::F64(match float_bits(json, kind, path)? {
            FloatForm::Number(x) => x,
            FloatForm::Bits(bits) => f64::from_bits(bits),
        }),
    })
}

/// Bare-name form: `"None"`.
fn enum_by_name<'a>(
    desc: &'a TypeDescriptor,
    json: &Json,
    path: &str,
) -> Result<&'a EnumVariant, CodecError> {
    let Json::String(name) = json else {
        return Err(mismatch(path, "enum", json));
    };
    desc.enum_variant(name)
        .ok_or_else(|| CodecError::UnknownVariant {
            path: path.to_string(),
            variant: format!("'{}'", name),
        })
}

fn enum_from_json(
    desc: &TypeDescriptor,
    json: &Json,
    path: &str,
    ctx: &VariantContext,
) -> Result<Value, CodecError> {
    let (variant, payload_json) = match json {
        Json::Object(map) => {
            let variant = if let Some(name) = map.get("variant") {
                let name = name
                    .as_str()
                    .ok_or_else(|| mismatch(path, "variant name", name))?;
                desc.enum_variant(name)
                    .ok_or_else(|| CodecError::UnknownVariant {
                        path: path.to_string(),
                        variant: format!("'{}'", name),
                    })?
            } else if let Some(tag) = map.get("tag") {
                let tag = tag
                    .as_u64()
                    .and_then(|t| u8::try_from(t).ok())
                    .ok_or_else(|| invalid(path, format!("tag {} is not a byte", tag)))?;
                desc.enum_variant_by_tag(tag)
                    .ok_or_else(|| CodecError::UnknownVariant {
                        path: path.to_string(),
                        variant: format!("tag {}", tag),
                    })?
            } else {
                return Err(CodecError::MissingField {
                    path: path.to_string(),
                    field: "variant".to_string(),
                });
            };
            if let Some(key) = map
                .keys()
                .find(|k| !matches!(k.as_str(), "variant" | "tag" | "payload"))
            {
                return Err(CodecError::UnknownField {
                    path: path.to_string(),
                    field: key.clone(),
                });
            }
            (variant, map.get("payload").filter(|p| !p.is_null()))
        }
        other => (enum_by_name(desc, other, path)?, None),
    };

    let payload = match (&variant.payload, payload_json) {
        (Some(payload_desc), Some(payload_json)) => Some(from_json_at(
            payload_desc,
            payload_json,
            &child_path(path, &variant.name),
            ctx,
        )?),
        (None, None) => None,
        (Some(_), None) => {
            return Err(CodecError::MissingField {
                path: path.to_string(),
                field: "payload".to_string(),
            })
        }
        (None, Some(_)) => {
            return Err(invalid(
                path,
                format!("variant {} carries no payload", variant.name),
            ))
        }
    };
    Ok(Value::variant(variant.tag, payload))
}

fn from_json_at(
    desc: &TypeDescriptor,
    json: &Json,
    path: &str,
    ctx: &VariantContext,
) -> Result<Value, CodecError> {
    match desc {
        TypeDescriptor::Primitive(kind) => primitive_from_json(*kind, json, path),

        TypeDescriptor::FixedArray { elem, count } => {
            let Json::Array(items) = json else {
                return Err(mismatch(path, "array", json));
            };
            if items.len() != *count {
                return Err(CodecError::ArityMismatch {
                    path: path.to_string(),
                    expected: *count,
                    actual: items.len(),
                });
            }
            items
                .iter()
                .enumerate()
                .map(|(i, item)| from_json_at(elem, item, &element_path(path, i), ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }

        TypeDescriptor::Struct { fields } => {
            let Json::Object(map) = json else {
                return Err(mismatch(path, "struct", json));
            };
            if let Some(key) = map.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
                return Err(CodecError::UnknownField {
                    path: path.to_string(),
                    field: key.clone(),
                });
            }
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                let field_json = map.get(&field.name).ok_or_else(|| CodecError::MissingField {
                    path: path.to_string(),
                    field: field.name.clone(),
                })?;
                let value = from_json_at(&field.ty, field_json, &child_path(path, &field.name), ctx)?;
                values.push((field.name.clone(), value));
            }
            Ok(Value::Struct(values))
        }

        TypeDescriptor::Enum { .. } => enum_from_json(desc, json, path, ctx),

        TypeDescriptor::Union { .. } => {
            let name = ctx
                .get(path)
                .ok_or_else(|| CodecError::MissingVariantContext {
                    path: path.to_string(),
                })?;
            let variant = desc
                .union_variant(name)
                .ok_or_else(|| CodecError::UnknownVariant {
                    path: path.to_string(),
                    variant: format!("'{}'", name),
                })?;
            from_json_at(&variant.ty, json, &child_path(path, &variant.name), ctx)
        }
    }
}

// ============================================================================
// WRITING
// ============================================================================

fn f32_json(x: f32) -> Json {
    if x.is_nan() {
        json!(format!("0x{:08x}", x.to_bits()))
    } else if x.is_infinite() {
        json!(if x > 0.0 { "inf" } else { "-inf" })
    } else {
        // Widening is exact; the reader narrows back to the same f32.
        json!(f64::from(x))
    }
}

fn f64_json(x: f64) -> Json {
    if x.is_nan() {
        json!(format!("0x{:016x}", x.to_bits()))
    } else if x.is_infinite() {
        json!(if x > 0.0 { "inf" } else { "-inf" })
    } else {
        json!(x)
    }
}

/// Write a value as JSON using the descriptor's variant names.
///
/// Falls back to [`value_to_json_untyped`] for enum tags the descriptor
/// doesn't know, so a misbehaving codec's output can still be shown.
pub fn value_to_json(desc: &TypeDescriptor, value: &Value, ctx: &VariantContext) -> Json {
    to_json_at(desc, value, "", ctx)
}

fn to_json_at(desc: &TypeDescriptor, value: &Value, path: &str, ctx: &VariantContext) -> Json {
    match (desc, value) {
        (TypeDescriptor::FixedArray { elem, .. }, Value::Array(items)) => Json::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| to_json_at(elem, item, &element_path(path, i), ctx))
                .collect(),
        ),
        (TypeDescriptor::Struct { fields }, Value::Struct(values)) => {
            let mut map = Map::new();
            for (name, field_value) in values {
                let field_path = child_path(path, name);
                let json = match fields.iter().find(|f| &f.name == name) {
                    Some(field) => to_json_at(&field.ty, field_value, &field_path, ctx),
                    None => value_to_json_untyped(field_value),
                };
                map.insert(name.clone(), json);
            }
            Json::Object(map)
        }
        (TypeDescriptor::Enum { .. }, Value::Enum { tag, payload }) => {
            let Some(variant) = desc.enum_variant_by_tag(*tag) else {
                return value_to_json_untyped(value);
            };
            let mut map = Map::new();
            map.insert("variant".to_string(), json!(variant.name));
            if let Some(payload) = payload {
                let payload_path = child_path(path, &variant.name);
                let json = match &variant.payload {
                    Some(payload_desc) => to_json_at(payload_desc, payload, &payload_path, ctx),
                    None => value_to_json_untyped(payload),
                };
                map.insert("payload".to_string(), json);
            }
            Json::Object(map)
        }
        (TypeDescriptor::Union { .. }, _) => {
            match ctx.get(path).and_then(|name| desc.union_variant(name)) {
                Some(variant) => {
                    to_json_at(&variant.ty, value, &child_path(path, &variant.name), ctx)
                }
                None => value_to_json_untyped(value),
            }
        }
        _ => value_to_json_untyped(value),
    }
}

/// Write a value as JSON without a descriptor. Enums come out as
/// `{"tag": N, "payload": ..}`, which [`value_from_json`] reads back.
pub fn value_to_json_untyped(value: &Value) -> Json {
    match value {
        Value::U8(x) => json!(x),
        Value::U16(x) => json!(x),
        Value::U32(x) => json!(x),
        Value::U64(x) => json!(x),
        Value::I8(x) => json!(x),
        Value::I16(x) => json!(x),
        Value::I32(x) => json!(x),
        Value::I64(x) => json!(x),
        Value::F32(x) => f32_json(*x),
        Value::F64(x) => f64_json(*x),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json_untyped).collect()),
        Value::Struct(fields) => Json::Object(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), value_to_json_untyped(v)))
                .collect(),
        ),
        Value::Enum { tag, payload } => match payload {
            Some(payload) => json!({"tag": tag, "payload": value_to_json_untyped(payload)}),
            None => json!({"tag": tag}),
        },
    }
}
