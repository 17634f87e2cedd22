// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Type descriptors: the closed set of shapes a schema can describe.
//!
//! Descriptors serialize with external tagging so corpus files stay readable:
//!
//! ```text
//! {"primitive": "u32"}
//! {"fixed_array": {"elem": {"primitive": "u8"}, "count": 4}}
//! {"struct": {"fields": [{"name": "x", "type": {"primitive": "i32"}}]}}
//! {"enum": {"variants": [{"name": "None", "tag": 0},
//!                        {"name": "Value", "tag": 1, "payload": {"primitive": "u32"}}]}}
//! {"union": {"variants": [{"name": "int_value", "type": {"primitive": "i32"}}]}}
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::context::child_path;
use crate::error::CodecError;

/// Fixed-width scalar kinds. All little-endian, no exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl PrimitiveKind {
    /// Every kind, in declaration order.
    pub const ALL: [PrimitiveKind; 10] = [
        PrimitiveKind::U8,
        PrimitiveKind::U16,
        PrimitiveKind::U32,
        PrimitiveKind::U64,
        PrimitiveKind::I8,
        PrimitiveKind::I16,
        PrimitiveKind::I32,
        PrimitiveKind::I64,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
    ];

    /// Encoded width in bytes.
    pub const fn width(self) -> usize {
        match self {
            PrimitiveKind::U8 | PrimitiveKind::I8 => 1,
            PrimitiveKind::U16 | PrimitiveKind::I16 => 2,
            PrimitiveKind::U32 | PrimitiveKind::I32 | PrimitiveKind::F32 => 4,
            PrimitiveKind::U64 | PrimitiveKind::I64 | PrimitiveKind::F64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::F32 | PrimitiveKind::F64)
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            PrimitiveKind::I8 | PrimitiveKind::I16 | PrimitiveKind::I32 | PrimitiveKind::I64
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named struct member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

/// An enum variant: one tag byte, then the payload (if any).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub tag: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<TypeDescriptor>,
}

/// A union member. Nothing on the wire says which one is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionVariant {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

/// The layout-relevant shape of a schema type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    FixedArray {
        elem: Box<TypeDescriptor>,
        count: usize,
    },
    Struct {
        fields: Vec<Field>,
    },
    Enum {
        variants: Vec<EnumVariant>,
    },
    Union {
        variants: Vec<UnionVariant>,
    },
}

impl TypeDescriptor {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeDescriptor::Primitive(kind)
    }

    pub fn array(elem: TypeDescriptor, count: usize) -> Self {
        TypeDescriptor::FixedArray {
            elem: Box::new(elem),
            count,
        }
    }

    pub fn structure<N: Into<String>>(fields: impl IntoIterator<Item = (N, TypeDescriptor)>) -> Self {
        TypeDescriptor::Struct {
            fields: fields
                .into_iter()
                .map(|(name, ty)| Field {
                    name: name.into(),
                    ty,
                })
                .collect(),
        }
    }

    pub fn enumeration<N: Into<String>>(
        variants: impl IntoIterator<Item = (N, u8, Option<TypeDescriptor>)>,
    ) -> Self {
        TypeDescriptor::Enum {
            variants: variants
                .into_iter()
                .map(|(name, tag, payload)| EnumVariant {
                    name: name.into(),
                    tag,
                    payload,
                })
                .collect(),
        }
    }

    pub fn union<N: Into<String>>(variants: impl IntoIterator<Item = (N, TypeDescriptor)>) -> Self {
        TypeDescriptor::Union {
            variants: variants
                .into_iter()
                .map(|(name, ty)| UnionVariant {
                    name: name.into(),
                    ty,
                })
                .collect(),
        }
    }

    /// Short human name of the descriptor's outermost shape.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Primitive(kind) => kind.name(),
            TypeDescriptor::FixedArray { .. } => "array",
            TypeDescriptor::Struct { .. } => "struct",
            TypeDescriptor::Enum { .. } => "enum",
            TypeDescriptor::Union { .. } => "union",
        }
    }

    /// Enum variant by name.
    pub fn enum_variant(&self, name: &str) -> Option<&EnumVariant> {
        match self {
            TypeDescriptor::Enum { variants } => variants.iter().find(|v| v.name == name),
            _ => None,
        }
    }

    /// Enum variant by tag byte.
    pub fn enum_variant_by_tag(&self, tag: u8) -> Option<&EnumVariant> {
        match self {
            TypeDescriptor::Enum { variants } => variants.iter().find(|v| v.tag == tag),
            _ => None,
        }
    }

    /// Union member by name.
    pub fn union_variant(&self, name: &str) -> Option<&UnionVariant> {
        match self {
            TypeDescriptor::Union { variants } => variants.iter().find(|v| v.name == name),
            _ => None,
        }
    }

    /// Check the structural rules the layout model relies on.
    ///
    /// Enum tags must be unique (contiguity is not required), variant and field
    /// names must be unique within their parent, and enums/unions need at least
    /// one variant.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_at(self, "")
    }
}

fn invalid(path: &str, reason: String) -> CodecError {
    CodecError::InvalidDescriptor {
        path: path.to_string(),
        reason,
    }
}

fn validate_at(desc: &TypeDescriptor, path: &str) -> Result<(), CodecError> {
    match desc {
        TypeDescriptor::Primitive(_) => Ok(()),
        TypeDescriptor::FixedArray { elem, .. } => validate_at(elem, &format!("{}[]", path)),
        TypeDescriptor::Struct { fields } => {
            let mut seen = HashSet::new();
            for field in fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(invalid(path, format!("duplicate field '{}'", field.name)));
                }
                validate_at(&field.ty, &child_path(path, &field.name))?;
            }
            Ok(())
        }
        TypeDescriptor::Enum { variants } => {
            if variants.is_empty() {
                return Err(invalid(path, "enum has no variants".to_string()));
            }
            let mut names = HashSet::new();
            let mut tags = HashSet::new();
            for variant in variants {
                if !names.insert(variant.name.as_str()) {
                    return Err(invalid(path, format!("duplicate variant '{}'", variant.name)));
                }
                if !tags.insert(variant.tag) {
                    return Err(invalid(
                        path,
                        format!("tag {} used by more than one variant", variant.tag),
                    ));
                }
                if let Some(payload) = &variant.payload {
                    validate_at(payload, &child_path(path, &variant.name))?;
                }
            }
            Ok(())
        }
        TypeDescriptor::Union { variants } => {
            if variants.is_empty() {
                return Err(invalid(path, "union has no variants".to_string()));
            }
            let mut names = HashSet::new();
            for variant in variants {
                if !names.insert(variant.name.as_str()) {
                    return Err(invalid(path, format!("duplicate variant '{}'", variant.name)));
                }
                validate_at(&variant.ty, &child_path(path, &variant.name))?;
            }
            Ok(())
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(kind) => write!(f, "{}", kind),
            TypeDescriptor::FixedArray { elem, count } => write!(f, "[{}; {}]", elem, count),
            TypeDescriptor::Struct { fields } => write!(f, "struct({} fields)", fields.len()),
            TypeDescriptor::Enum { variants } => write!(f, "enum({} variants)", variants.len()),
            TypeDescriptor::Union { variants } => write!(f, "union({} variants)", variants.len()),
        }
    }
}
