// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The layout model: how many bytes a type takes and where its fields start.
//!
//! The rules are short because the wire format is dense:
//!
//! - primitives have fixed widths, little-endian, always
//! - a fixed array is `count` elements back to back, no length prefix
//! - a struct is its fields back to back in declaration order, no padding,
//!   not even for an `u64` at offset 1
//! - an enum is a one-byte tag followed by the chosen variant's payload
//! - a union is just the active member's bytes, no discriminant
//!
//! Enums and unions have no single size. Each variant has its own, so size
//! queries on them need a [`VariantContext`] naming the variant. The model never
//! invents a union-wide "max of members" size.
//!
//! Everything here is a pure function of the descriptor (and context). No
//! alignment tables, no target-dependent anything.

mod context;
mod descriptor;

pub use context::{child_path, element_path, VariantContext};
pub use descriptor::{EnumVariant, Field, PrimitiveKind, TypeDescriptor, UnionVariant};

use serde::Serialize;

use crate::contracts::check_dense_offsets;
use crate::error::CodecError;

/// Encoded size of `desc`, resolving enum/union variants through `ctx`.
///
/// Fails with `UnresolvedVariant` when an enum or union on the path has no
/// selection in the context, and `UnknownVariant` when the selection names a
/// variant the descriptor doesn't declare.
pub fn size_of(desc: &TypeDescriptor, ctx: &VariantContext) -> Result<usize, CodecError> {
    size_at(desc, "", ctx)
}

/// Size of a descriptor that sits at `path` inside a larger value.
pub(crate) fn size_at(
    desc: &TypeDescriptor,
    path: &str,
    ctx: &VariantContext,
) -> Result<usize, CodecError> {
    match desc {
        TypeDescriptor::Primitive(kind) => Ok(kind.width()),
        TypeDescriptor::FixedArray { elem, count } => {
            if *count == 0 {
                return Ok(0);
            }
            if has_static_size(elem) {
                return size_at(elem, path, ctx)?
                    .checked_mul(*count)
                    .ok_or_else(|| size_overflow(path));
            }
            // Elements with variants may each pick a different one.
            let mut total: usize = 0;
            for i in 0..*count {
                let elem_size = size_at(elem, &element_path(path, i), ctx)?;
                total = total.checked_add(elem_size).ok_or_else(|| size_overflow(path))?;
            }
            Ok(total)
        }
        TypeDescriptor::Struct { fields } => {
            let mut total: usize = 0;
            for field in fields {
                let field_size = size_at(&field.ty, &child_path(path, &field.name), ctx)?;
                total = total.checked_add(field_size).ok_or_else(|| size_overflow(path))?;
            }
            Ok(total)
        }
        TypeDescriptor::Enum { .. } => {
            let name = selected(path, ctx)?;
            let variant = desc
                .enum_variant(name)
                .ok_or_else(|| unknown_variant(path, name))?;
            let payload = match &variant.payload {
                Some(payload) => size_at(payload, &child_path(path, &variant.name), ctx)?,
                None => 0,
            };
            payload.checked_add(1).ok_or_else(|| size_overflow(path))
        }
        TypeDescriptor::Union { .. } => {
            let name = selected(path, ctx)?;
            let variant = desc
                .union_variant(name)
                .ok_or_else(|| unknown_variant(path, name))?;
            size_at(&variant.ty, &child_path(path, &variant.name), ctx)
        }
    }
}

fn selected<'a>(path: &str, ctx: &'a VariantContext) -> Result<&'a str, CodecError> {
    ctx.get(path).ok_or_else(|| CodecError::UnresolvedVariant {
        path: path.to_string(),
    })
}

/// Sizes are `usize` byte counts; a descriptor whose encoding can't be
/// addressed is rejected rather than wrapped.
fn size_overflow(path: &str) -> CodecError {
    CodecError::InvalidDescriptor {
        path: path.to_string(),
        reason: "encoded size overflows usize".to_string(),
    }
}

fn unknown_variant(path: &str, name: &str) -> CodecError {
    CodecError::UnknownVariant {
        path: path.to_string(),
        variant: format!("'{}'", name),
    }
}

/// True when the descriptor's size doesn't depend on any variant choice.
pub fn has_static_size(desc: &TypeDescriptor) -> bool {
    match desc {
        TypeDescriptor::Primitive(_) => true,
        TypeDescriptor::FixedArray { elem, count } => *count == 0 || has_static_size(elem),
        TypeDescriptor::Struct { fields } => fields.iter().all(|f| has_static_size(&f.ty)),
        TypeDescriptor::Enum { .. } | TypeDescriptor::Union { .. } => false,
    }
}

/// Where one struct field lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldLayout {
    pub name: String,
    pub offset: usize,
    pub size: usize,
}

/// Offsets and sizes of every field of a struct descriptor.
pub fn field_layout(
    desc: &TypeDescriptor,
    ctx: &VariantContext,
) -> Result<Vec<FieldLayout>, CodecError> {
    let TypeDescriptor::Struct { fields } = desc else {
        return Err(not_a_struct(desc));
    };

    let mut offset = 0;
    let mut layout = Vec::with_capacity(fields.len());
    for field in fields {
        let size = size_at(&field.ty, &field.name, ctx)?;
        layout.push(FieldLayout {
            name: field.name.clone(),
            offset,
            size,
        });
        offset = checked_offset(offset, size)?;
    }

    check_dense_offsets(&layout);
    Ok(layout)
}

/// Byte offset of `field_name` inside a struct whose preceding fields all have
/// static sizes.
pub fn field_offset(desc: &TypeDescriptor, field_name: &str) -> Result<usize, CodecError> {
    field_offset_in(desc, field_name, &VariantContext::new())
}

/// Byte offset of `field_name`, resolving variable-size predecessors through `ctx`.
pub fn field_offset_in(
    desc: &TypeDescriptor,
    field_name: &str,
    ctx: &VariantContext,
) -> Result<usize, CodecError> {
    let TypeDescriptor::Struct { fields } = desc else {
        return Err(not_a_struct(desc));
    };

    let mut offset = 0;
    for field in fields {
        if field.name == field_name {
            return Ok(offset);
        }
        offset = checked_offset(offset, size_at(&field.ty, &field.name, ctx)?)?;
    }

    Err(CodecError::UnknownField {
        path: String::new(),
        field: field_name.to_string(),
    })
}

fn checked_offset(offset: usize, size: usize) -> Result<usize, CodecError> {
    offset.checked_add(size).ok_or_else(|| size_overflow(""))
}

fn not_a_struct(desc: &TypeDescriptor) -> CodecError {
    CodecError::TypeMismatch {
        path: String::new(),
        expected: "struct".to_string(),
        found: desc.kind_name().to_string(),
    }
}

/// One row of a flattened layout table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutRow {
    pub path: String,
    pub ty: String,
    pub offset: usize,
    pub size: usize,
    pub depth: usize,
}

/// Flatten a descriptor into `(path, type, offset, size)` rows, parents first.
///
/// Enum rows are followed by a one-byte `tag` row and then the selected payload.
/// Array elements are expanded only when they have different layouts; a static
/// element type is described once as `[*]` with the first element's offset.
pub fn describe(desc: &TypeDescriptor, ctx: &VariantContext) -> Result<Vec<LayoutRow>, CodecError> {
    let mut rows = Vec::new();
    describe_at(desc, "", 0, 0, ctx, &mut rows)?;
    Ok(rows)
}

fn describe_at(
    desc: &TypeDescriptor,
    path: &str,
    offset: usize,
    depth: usize,
    ctx: &VariantContext,
    rows: &mut Vec<LayoutRow>,
) -> Result<usize, CodecError> {
    let size = size_at(desc, path, ctx)?;
    rows.push(LayoutRow {
        path: path.to_string(),
        ty: desc.to_string(),
        offset,
        size,
        depth,
    });

    match desc {
        TypeDescriptor::Primitive(_) => {}
        TypeDescriptor::FixedArray { elem, count } => {
            if *count > 0 && has_static_size(elem) {
                describe_at(elem, &format!("{}[*]", path), offset, depth + 1, ctx, rows)?;
            } else {
                let mut at = offset;
                for i in 0..*count {
                    at += describe_at(elem, &element_path(path, i), at, depth + 1, ctx, rows)?;
                }
            }
        }
        TypeDescriptor::Struct { fields } => {
            let mut at = offset;
            for field in fields {
                at += describe_at(&field.ty, &child_path(path, &field.name), at, depth + 1, ctx, rows)?;
            }
        }
        TypeDescriptor::Enum { .. } => {
            rows.push(LayoutRow {
                path: child_path(path, "<tag>"),
                ty: "u8".to_string(),
                offset,
                size: 1,
                depth: depth + 1,
            });
            let name = selected(path, ctx)?;
            if let Some(variant) = desc.enum_variant(name) {
                if let Some(payload) = &variant.payload {
                    let payload_path = child_path(path, &variant.name);
                    describe_at(payload, &payload_path, offset + 1, depth + 1, ctx, rows)?;
                }
            }
        }
        TypeDescriptor::Union { .. } => {
            let name = selected(path, ctx)?;
            if let Some(variant) = desc.union_variant(name) {
                let member_path = child_path(path, &variant.name);
                describe_at(&variant.ty, &member_path, offset, depth + 1, ctx, rows)?;
            }
        }
    }

    Ok(size)
}
