// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use crate::codec::{self, Value};
use crate::error::AdapterFailure;
use crate::layout::{TypeDescriptor, VariantContext};

use super::CodecAdapter;

/// The canonical codec behind the adapter seam.
///
/// Useful as a known-good participant: a parity run of a generated codec
/// against `ReferenceAdapter` is a validate run with one more witness.
#[derive(Debug, Clone)]
pub struct ReferenceAdapter {
    name: String,
}

impl ReferenceAdapter {
    pub fn new() -> Self {
        Self::named("reference")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ReferenceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecAdapter for ReferenceAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(
        &self,
        desc: &TypeDescriptor,
        value: &Value,
        ctx: &VariantContext,
    ) -> Result<Vec<u8>, AdapterFailure> {
        Ok(codec::encode(desc, value, ctx)?)
    }

    fn decode(
        &self,
        desc: &TypeDescriptor,
        bytes: &[u8],
        ctx: &VariantContext,
    ) -> Result<Value, AdapterFailure> {
        Ok(codec::decode(desc, bytes, ctx)?)
    }
}
