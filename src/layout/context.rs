// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Active-variant context for untagged unions (and size queries on enums).
//!
//! A union's bytes don't say which member they hold, so whoever encodes or
//! decodes one has to be told. `VariantContext` carries that information from
//! outside the bytes, keyed by value path:
//!
//! | Position                | Path             |
//! |-------------------------|------------------|
//! | the root value          | `""`             |
//! | struct field `b` of `a` | `a.b`            |
//! | element 2 of array `a`  | `a[2]`           |
//! | enum/union member `v`   | `<path>.v`       |
//!
//! The single `active_variant` of a test vector is `VariantContext::root(name)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Path of struct field or variant member `segment` under `parent`.
pub fn child_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", parent, segment)
    }
}

/// Path of array element `index` under `parent`.
pub fn element_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Externally supplied variant selections, keyed by value path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantContext {
    selections: BTreeMap<String, String>,
}

impl VariantContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context selecting `variant` for the root value.
    pub fn root(variant: impl Into<String>) -> Self {
        Self::new().with("", variant)
    }

    /// Add (or replace) the selection at `path`.
    pub fn with(mut self, path: impl Into<String>, variant: impl Into<String>) -> Self {
        self.selections.insert(path.into(), variant.into());
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, variant: impl Into<String>) {
        self.selections.insert(path.into(), variant.into());
    }

    /// Variant selected at `path`, if any.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.selections.get(path).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.selections
            .iter()
            .map(|(path, variant)| (path.as_str(), variant.as_str()))
    }

    /// Parse `PATH=NAME` (or a bare `NAME` for the root).
    pub fn parse_selection(spec: &str) -> (String, String) {
        match spec.split_once('=') {
            Some((path, name)) => (path.trim().to_string(), name.trim().to_string()),
            None => (String::new(), spec.trim().to_string()),
        }
    }
}

impl<P: Into<String>, V: Into<String>> FromIterator<(P, V)> for VariantContext {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        let mut ctx = VariantContext::new();
        for (path, variant) in iter {
            ctx.insert(path, variant);
        }
        ctx
    }
}
