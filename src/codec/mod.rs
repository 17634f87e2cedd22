// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The canonical codec: encode/decode driven purely by the layout model.
//!
//! This is the oracle. Both generated codecs are checked against it, so it
//! stays boring on purpose: one match arm per descriptor shape, little-endian
//! `to_le_bytes`/`from_le_bytes` for scalars, and floats moved through their
//! bit patterns so NaN payloads survive untouched.
//!
//! # Round-trip laws
//!
//! - `decode(d, encode(d, v)) == v` for every well-formed `v`
//! - `encode(d, decode(d, b)) == b` for every `b` of `d`'s exact size
//!
//! # Trailing bytes
//!
//! `decode` stops once the descriptor is satisfied and ignores whatever
//! follows. Whether leftovers are an error is the caller's call; use
//! [`decode_prefix`] to find out how much was consumed.

pub mod json;
mod value;

pub use value::{Value, ValueDiff};

use crate::contracts::check_encoded_len;
use crate::error::CodecError;
use crate::layout::{
    child_path, element_path, has_static_size, size_of, PrimitiveKind, TypeDescriptor,
    VariantContext,
};

// ============================================================================
// ENCODE
// ============================================================================

/// Encode `value` as `desc`, taking union members from `ctx`.
pub fn encode(
    desc: &TypeDescriptor,
    value: &Value,
    ctx: &VariantContext,
) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    encode_into(desc, value, ctx, &mut buf)?;

    if has_static_size(desc) {
        check_encoded_len(size_of(desc, ctx).ok(), buf.len());
    }
    Ok(buf)
}

/// Append the encoding of `value` to `buf`.
pub fn encode_into(
    desc: &TypeDescriptor,
    value: &Value,
    ctx: &VariantContext,
    buf: &mut Vec<u8>,
) -> Result<(), CodecError> {
    encode_at(desc, value, "", ctx, buf)
}

fn mismatch(path: &str, expected: &str, value: &Value) -> CodecError {
    CodecError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        found: value.kind_name().to_string(),
    }
}

fn encode_primitive(
    kind: PrimitiveKind,
    value: &Value,
    path: &str,
    buf: &mut Vec<u8>,
) -> Result<(), CodecError> {
    match (kind, value) {
        (PrimitiveKind::U8, Value::U8(x)) => buf.push(*x),
        (PrimitiveKind::U16, Value::U16(x)) => buf.extend_from_slice(&x.to_le_bytes()),
        (PrimitiveKind::U32, Value::U32(x)) => buf.extend_from_slice(&x.to_le_bytes()),
        (PrimitiveKind::U64, Value::U64(x)) => buf.extend_from_slice(&x.to_le_bytes()),
        (PrimitiveKind::I8, Value::I8(x)) => buf.extend_from_slice(&x.to_le_bytes()),
        (PrimitiveKind::I16, Value::I16(x)) => buf.extend_from_slice(&x.to_le_bytes()),
        (PrimitiveKind::I32, Value::I32(x)) => buf.extend_from_slice(&x.to_le_bytes()),
        (PrimitiveKind::I64, Value::I64(x)) => buf.extend_from_slice(&x.to_le_bytes()),
        // Through the bits: no NaN canonicalization.
        (PrimitiveKind::F32, Value::F32(x)) => buf.extend_from_slice(&x.to_bits().to_le_bytes()),
        (PrimitiveKind::F64, Value::F64(x)) => buf.extend_from_slice(&x.to_bits().to_le_bytes()),
        _ => return Err(mismatch(path, kind.name(), value)),
    }
    Ok(())
}

fn encode_at(
    desc: &TypeDescriptor,
    value: &Value,
    path: &str,
    ctx: &VariantContext,
    buf: &mut Vec<u8>,
) -> Result<(), CodecError> {
    match desc {
        TypeDescriptor::Primitive(kind) => encode_primitive(*kind, value, path, buf),

        TypeDescriptor::FixedArray { elem, count } => {
            let Value::Array(items) = value else {
                return Err(mismatch(path, "array", value));
            };
            if items.len() != *count {
                return Err(CodecError::ArityMismatch {
                    path: path.to_string(),
                    expected: *count,
                    actual: items.len(),
                });
            }
            for (i, item) in items.iter().enumerate() {
                encode_at(elem, item, &element_path(path, i), ctx, buf)?;
            }
            Ok(())
        }

        TypeDescriptor::Struct { fields } => {
            let Value::Struct(values) = value else {
                return Err(mismatch(path, "struct", value));
            };
            if let Some((extra, _)) = values
                .iter()
                .find(|(name, _)| !fields.iter().any(|f| &f.name == name))
            {
                return Err(CodecError::UnknownField {
                    path: path.to_string(),
                    field: extra.clone(),
                });
            }
            for field in fields {
                let field_value = value.field(&field.name).ok_or_else(|| CodecError::MissingField {
                    path: path.to_string(),
                    field: field.name.clone(),
                })?;
                encode_at(&field.ty, field_value, &child_path(path, &field.name), ctx, buf)?;
            }
            Ok(())
        }

        TypeDescriptor::Enum { .. } => {
            let Value::Enum { tag, payload } = value else {
                return Err(mismatch(path, "enum", value));
            };
            let variant = desc
                .enum_variant_by_tag(*tag)
                .ok_or_else(|| CodecError::UnknownVariant {
                    path: path.to_string(),
                    variant: format!("tag {}", tag),
                })?;
            buf.push(variant.tag);
            match (&variant.payload, payload) {
                (Some(payload_desc), Some(payload_value)) => encode_at(
                    payload_desc,
                    payload_value,
                    &child_path(path, &variant.name),
                    ctx,
                    buf,
                ),
                (None, None) => Ok(()),
                (Some(_), None) => Err(CodecError::InvalidValue {
                    path: path.to_string(),
                    reason: format!("variant {} needs a payload", variant.name),
                }),
                (None, Some(_)) => Err(CodecError::InvalidValue {
                    path: path.to_string(),
                    reason: format!("variant {} carries no payload", variant.name),
                }),
            }
        }

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
            encode_at(&variant.ty, value, &child_path(path, &variant.name), ctx, buf)
        }
    }
}

// ============================================================================
// DECODE
// ============================================================================

/// Decode a `desc` from the front of `bytes`. Trailing bytes are ignored.
pub fn decode(
    desc: &TypeDescriptor,
    bytes: &[u8],
    ctx: &VariantContext,
) -> Result<Value, CodecError> {
    decode_prefix(desc, bytes, ctx).map(|(value, _)| value)
}

/// Decode a `desc` from the front of `bytes`, returning the value and the
/// number of bytes consumed.
pub fn decode_prefix(
    desc: &TypeDescriptor,
    bytes: &[u8],
    ctx: &VariantContext,
) -> Result<(Value, usize), CodecError> {
    let mut reader = Reader { bytes, pos: 0 };
    let value = decode_at(desc, &mut reader, "", ctx)?;
    Ok((value, reader.pos))
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, path: &str) -> Result<&'a [u8], CodecError> {
        let available = self.bytes.len() - self.pos;
        if n > available {
            return Err(CodecError::TruncatedInput {
                path: path.to_string(),
                needed: n,
                available,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, path: &str) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, path)?);
        Ok(out)
    }
}

fn decode_primitive(
    kind: PrimitiveKind,
    reader: &mut Reader<'_>,
    path: &str,
) -> Result<Value, CodecError> {
    Ok(match kind {
        PrimitiveKind::U8 => Value::U8(reader.array::<1>(path)?[0]),
        PrimitiveKind::U16 => Value::U16(u16::from_le_bytes(reader.array(path)?)),
        PrimitiveKind::U32 => Value::U32(u32::from_le_bytes(reader.array(path)?)),
        PrimitiveKind::U64 => Value::U64(u64::from_le_bytes(reader.array(path)?)),
        PrimitiveKind::I8 => Value::I8(i8::from_le_bytes(reader.array(path)?)),
        PrimitiveKind::I16 => Value::I16(i16::from_le_bytes(reader.array(path)?)),
        PrimitiveKind::I32 => Value::I32(i32::from_le_bytes(reader.array(path)?)),
        PrimitiveKind::I64 => Value::I64(i64::from_le_bytes(reader.array(path)?)),
        PrimitiveKind::F32 => Value::F32(f32::from_bits(u32::from_le_bytes(reader.array(path)?))),
        PrimitiveKind::F64 => Value::F64(f64::from_bits(u64::from_le_bytes(reader.array(path)?))),
    })
}

fn decode_at(
    desc: &TypeDescriptor,
    reader: &mut Reader<'_>,
    path: &str,
    ctx: &VariantContext,
) -> Result<Value, CodecError> {
    match desc {
        TypeDescriptor::Primitive(kind) => decode_primitive(*kind, reader, path),

        TypeDescriptor::FixedArray { elem, count } => {
            // Cap the reservation by what could possibly fit.
            let mut items = Vec::with_capacity((*count).min(reader.bytes.len() - reader.pos + 1));
            for i in 0..*count {
                items.push(decode_at(elem, reader, &element_path(path, i), ctx)?);
            }
            Ok(Value::Array(items))
        }

        TypeDescriptor::Struct { fields } => {
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                let value = decode_at(&field.ty, reader, &child_path(path, &field.name), ctx)?;
                values.push((field.name.clone(), value));
            }
            Ok(Value::Struct(values))
        }

        TypeDescriptor::Enum { .. } => {
            let tag = reader.array::<1>(path)?[0];
            let variant = desc
                .enum_variant_by_tag(tag)
                .ok_or_else(|| CodecError::UnknownVariant {
                    path: path.to_string(),
                    variant: format!("tag {}", tag),
                })?;
            let payload = match &variant.payload {
                Some(payload_desc) => Some(Box::new(decode_at(
                    payload_desc,
                    reader,
                    &child_path(path, &variant.name),
                    ctx,
                )?)),
                None => None,
            };
            Ok(Value::Enum { tag, payload })
        }

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
            decode_at(&variant.ty, reader, &child_path(path, &variant.name), ctx)
        }
    }
}
