// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! On-disk shape of `corpus.json` and its includes.
//!
//! These types are the raw deserialization target. Nothing here is resolved:
//! type references are still names, blobs are still paths, values are still
//! JSON. [`super::Corpus::load`] turns them into test vectors.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::layout::PrimitiveKind;

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub version: u32,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub types: BTreeMap<String, Schema>,
    #[serde(default)]
    pub vectors: Vec<VectorEntry>,
}

/// Harness defaults carried by the corpus. CLI flags override every field.
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub mode: Option<String>,
    pub timeout_ms: Option<u64>,
    pub roundtrip: Option<bool>,
}

impl Settings {
    /// Fill unset fields from `other`. Earlier manifests win.
    pub fn merge_missing(&mut self, other: &Settings) {
        if self.mode.is_none() {
            self.mode.clone_from(&other.mode);
        }
        if self.timeout_ms.is_none() {
            self.timeout_ms = other.timeout_ms;
        }
        if self.roundtrip.is_none() {
            self.roundtrip = other.roundtrip;
        }
    }
}

/// A type descriptor that may refer to named types.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    Ref(String),
    Primitive(PrimitiveKind),
    FixedArray { elem: Box<Schema>, count: usize },
    Struct { fields: Vec<SchemaField> },
    Enum { variants: Vec<SchemaEnumVariant> },
    Union { variants: Vec<SchemaUnionVariant> },
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Schema,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct SchemaEnumVariant {
    pub name: String,
    pub tag: u8,
    #[serde(default)]
    pub payload: Option<Schema>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct SchemaUnionVariant {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Schema,
}

/// A vector's `type`: a name from the `types` table (or a primitive name like
/// `"u32"`), or an inline schema.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum TypeRef {
    Name(String),
    Inline(Schema),
}

#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct VectorEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Blob path relative to the manifest that declares the vector.
    pub binary: String,
    pub value: serde_json::Value,
    #[serde(default)]
    pub active_variant: Option<String>,
    #[serde(default)]
    pub variants: BTreeMap<String, String>,
    #[serde(default)]
    pub allow_trailing: bool,
    /// Hex CRC32 (IEEE) of the blob, with or without `0x`.
    #[serde(default)]
    pub crc32: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
