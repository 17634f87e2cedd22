// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error types for the layout model, the canonical codec, adapters, and the harness.
//!
//! Three tiers, and they never mix:
//!
//! 1. [`CodecError`] describes a malformed descriptor/value pairing. It comes out
//!    of `layout` and `codec`, always names the value path where things went wrong,
//!    and the harness turns it into a finding. It is never fatal.
//! 2. [`AdapterError`] is one generated codec refusing (or failing) to do its job
//!    for one vector. Also a finding, also never fatal.
//! 3. [`HarnessError`] is the only thing that stops a run: the corpus could not be
//!    loaded, or the configuration makes no sense.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Flat classification of every failure the report can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    UnresolvedVariant,
    UnknownField,
    ArityMismatch,
    MissingField,
    UnknownVariant,
    MissingVariantContext,
    TruncatedInput,
    TypeMismatch,
    InvalidDescriptor,
    InvalidValue,
    AdapterError,
    AdapterTimeout,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnresolvedVariant => "unresolved-variant",
            ErrorKind::UnknownField => "unknown-field",
            ErrorKind::ArityMismatch => "arity-mismatch",
            ErrorKind::MissingField => "missing-field",
            ErrorKind::UnknownVariant => "unknown-variant",
            ErrorKind::MissingVariantContext => "missing-variant-context",
            ErrorKind::TruncatedInput => "truncated-input",
            ErrorKind::TypeMismatch => "type-mismatch",
            ErrorKind::InvalidDescriptor => "invalid-descriptor",
            ErrorKind::InvalidValue => "invalid-value",
            ErrorKind::AdapterError => "adapter-error",
            ErrorKind::AdapterTimeout => "adapter-timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders an empty value path as `<root>` in messages.
pub(crate) fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

/// Local failure of the layout model or the canonical codec.
///
/// `path` is the value path (see [`crate::layout::VariantContext`]) of the node
/// that failed, so a report line can point at `shape.bottom_right.x` instead of
/// "somewhere in Rectangle".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("{}: enum/union size depends on an active variant that was not supplied", display_path(.path))]
    UnresolvedVariant { path: String },

    #[error("{}: no field named '{field}'", display_path(.path))]
    UnknownField { path: String, field: String },

    #[error("{}: expected {expected} elements, got {actual}", display_path(.path))]
    ArityMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },

    #[error("{}: declared field '{field}' has no value", display_path(.path))]
    MissingField { path: String, field: String },

    #[error("{}: variant {variant} is not declared", display_path(.path))]
    UnknownVariant { path: String, variant: String },

    #[error("{}: union encoding needs an active variant", display_path(.path))]
    MissingVariantContext { path: String },

    #[error("{}: need {needed} bytes, only {available} available", display_path(.path))]
    TruncatedInput {
        path: String,
        needed: usize,
        available: usize,
    },

    #[error("{}: expected {expected}, found {found}", display_path(.path))]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("{}: invalid descriptor: {reason}", display_path(.path))]
    InvalidDescriptor { path: String, reason: String },

    #[error("{}: invalid value: {reason}", display_path(.path))]
    InvalidValue { path: String, reason: String },
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::UnresolvedVariant { .. } => ErrorKind::UnresolvedVariant,
            CodecError::UnknownField { .. } => ErrorKind::UnknownField,
            CodecError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            CodecError::MissingField { .. } => ErrorKind::MissingField,
            CodecError::UnknownVariant { .. } => ErrorKind::UnknownVariant,
            CodecError::MissingVariantContext { .. } => ErrorKind::MissingVariantContext,
            CodecError::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            CodecError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            CodecError::InvalidDescriptor { .. } => ErrorKind::InvalidDescriptor,
            CodecError::InvalidValue { .. } => ErrorKind::InvalidValue,
        }
    }

    /// Value path of the failing node (empty for the root).
    pub fn path(&self) -> &str {
        match self {
            CodecError::UnresolvedVariant { path }
            | CodecError::UnknownField { path, .. }
            | CodecError::ArityMismatch { path, .. }
            | CodecError::MissingField { path, .. }
            | CodecError::UnknownVariant { path, .. }
            | CodecError::MissingVariantContext { path }
            | CodecError::TruncatedInput { path, .. }
            | CodecError::TypeMismatch { path, .. }
            | CodecError::InvalidDescriptor { path, .. }
            | CodecError::InvalidValue { path, .. } => path,
        }
    }
}

/// A generated codec failed to encode or decode one vector.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("[{ecosystem}] {case_name}: {message}")]
pub struct AdapterError {
    pub ecosystem: String,
    pub case_name: String,
    pub message: String,
}

/// What an adapter reports back through the capability seam.
///
/// Adapters don't know which test case they are serving; the harness attaches
/// the ecosystem and case name when it turns this into an [`AdapterError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterFailure {
    /// The codec ran and reported an error.
    #[error("{0}")]
    Failed(String),
    /// The adapter enforced its own deadline and gave up.
    #[error("timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
}

impl AdapterFailure {
    pub fn failed(message: impl Into<String>) -> Self {
        AdapterFailure::Failed(message.into())
    }
}

impl From<CodecError> for AdapterFailure {
    fn from(err: CodecError) -> Self {
        AdapterFailure::Failed(err.to_string())
    }
}

/// Fatal harness errors. Everything else becomes a finding.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to load corpus {}: {reason}", .path.display())]
    CorpusLoad { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HarnessError {
    pub(crate) fn corpus(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        HarnessError::CorpusLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        HarnessError::InvalidConfig(reason.into())
    }
}
