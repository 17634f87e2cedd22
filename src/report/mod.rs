// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Parity reports: what the harness found, and how it leaves the process.
//!
//! The harness builds a [`ParityReport`]; this module only shapes and exports
//! it. No comparison happens here. Every byte offset and value path in a
//! [`Finding`] was computed by the harness before the report existed.
//!
//! Two outputs:
//!
//! - a human log ([`render`]), one line per finding, grouped by vector
//! - a machine-readable JSON document ([`document`]) with full detail
//!
//! And one process-level result: [`ParityReport::exit_code`].

pub mod document;
pub mod render;

pub use render::{render_log, vector_lines, LineKind, LogLine};

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::error::{AdapterError, ErrorKind};
use crate::harness::Mode;

/// Every vector passed.
pub const EXIT_SUCCESS: u8 = 0;
/// The run completed and found divergences.
pub const EXIT_FINDINGS: u8 = 1;
/// The run never started: corpus load failure or invalid configuration.
pub const EXIT_FATAL: u8 = 2;

/// Which step of the per-vector algorithm produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Phase {
    #[serde(rename = "encode")]
    Encode,
    #[serde(rename = "decode")]
    Decode,
    #[serde(rename = "reencode")]
    Reencode,
    #[serde(rename = "cross-parity/encode")]
    CrossParityEncode,
    #[serde(rename = "cross-parity/decode")]
    CrossParityDecode,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Encode => "encode",
            Phase::Decode => "decode",
            Phase::Reencode => "reencode",
            Phase::CrossParityEncode => "cross-parity/encode",
            Phase::CrossParityDecode => "cross-parity/decode",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who disagreed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// The canonical codec disagrees with the corpus itself.
    Oracle,
    Adapter(String),
    /// Two adapters disagree with each other.
    Pair(String, String),
}

impl Subject {
    /// True if the finding involves adapter `name`.
    pub fn involves(&self, name: &str) -> bool {
        match self {
            Subject::Oracle => false,
            Subject::Adapter(a) => a == name,
            Subject::Pair(a, b) => a == name || b == name,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Oracle => f.write_str("oracle"),
            Subject::Adapter(name) => f.write_str(name),
            Subject::Pair(a, b) => write!(f, "{}<>{}", a, b),
        }
    }
}

impl Serialize for Subject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// First differing byte between two encodings.
///
/// When one encoding is a strict prefix of the other, `offset` is the shorter
/// length and the missing side's byte is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByteMismatch {
    pub offset: usize,
    pub expected_byte: Option<u8>,
    pub actual_byte: Option<u8>,
    pub expected_len: usize,
    pub actual_len: usize,
    pub expected_hex: String,
    pub actual_hex: String,
}

/// First differing leaf between two decoded values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueMismatch {
    pub path: String,
    pub expected: String,
    pub actual: String,
    pub expected_json: serde_json::Value,
    pub actual_json: serde_json::Value,
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "class", rename_all = "kebab-case")]
pub enum FindingKind {
    ByteMismatch(ByteMismatch),
    ValueMismatch(ValueMismatch),
    /// The canonical decode stopped before the end of the blob.
    TrailingBytes { consumed: usize, total: usize },
    /// The canonical codec rejected the vector.
    Codec { kind: ErrorKind, path: String, message: String },
    #[serde(rename = "adapter-error")]
    Adapter(AdapterError),
    #[serde(rename = "adapter-timeout")]
    Timeout {
        ecosystem: String,
        case_name: String,
        timeout_ms: u64,
    },
}

impl FindingKind {
    /// Stable class name, used for summary counts.
    pub fn class(&self) -> &'static str {
        match self {
            FindingKind::ByteMismatch(_) => "byte-mismatch",
            FindingKind::ValueMismatch(_) => "value-mismatch",
            FindingKind::TrailingBytes { .. } => "trailing-bytes",
            FindingKind::Codec { kind, .. } => kind.as_str(),
            FindingKind::Adapter(_) => ErrorKind::AdapterError.as_str(),
            FindingKind::Timeout { .. } => ErrorKind::AdapterTimeout.as_str(),
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::ByteMismatch(m) => {
                write!(f, "byte {}: expected {}, got {}", m.offset, hex_byte(m.expected_byte), hex_byte(m.actual_byte))?;
                if m.expected_len != m.actual_len {
                    write!(f, " (length {} vs {})", m.expected_len, m.actual_len)?;
                }
                Ok(())
            }
            FindingKind::ValueMismatch(m) => write!(
                f,
                "{}: expected {}, got {}",
                crate::error::display_path(&m.path),
                m.expected,
                m.actual
            ),
            FindingKind::TrailingBytes { consumed, total } => write!(
                f,
                "decode consumed {} of {} bytes ({} trailing)",
                consumed,
                total,
                total - consumed
            ),
            FindingKind::Codec { kind, message, .. } => write!(f, "{}: {}", kind, message),
            FindingKind::Adapter(err) => write!(f, "adapter error: {}", err.message),
            FindingKind::Timeout { timeout_ms, .. } => {
                write!(f, "adapter timed out after {}ms", timeout_ms)
            }
        }
    }
}

fn hex_byte(byte: Option<u8>) -> String {
    match byte {
        Some(b) => format!("0x{:02X}", b),
        None => "<end>".to_string(),
    }
}

/// One discrepancy for one vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub phase: Phase,
    pub subject: Subject,
    #[serde(flatten)]
    pub kind: FindingKind,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.phase, self.subject, self.kind)
    }
}

/// Everything the harness learned about one vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorResult {
    /// Position in corpus iteration order.
    pub index: usize,
    pub case_name: String,
    pub type_name: String,
    pub findings: Vec<Finding>,
    #[serde(serialize_with = "document::as_micros")]
    pub duration: Duration,
}

impl VectorResult {
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }
}

/// The outcome of one harness run.
#[derive(Debug, Clone, PartialEq)]
pub struct ParityReport {
    pub mode: Mode,
    pub adapters: Vec<String>,
    /// In corpus order, regardless of how vectors were scheduled.
    pub results: Vec<VectorResult>,
    pub duration: Duration,
}

impl ParityReport {
    /// No findings anywhere.
    pub fn success(&self) -> bool {
        self.results.iter().all(VectorResult::passed)
    }

    pub fn exit_code(&self) -> u8 {
        if self.success() {
            EXIT_SUCCESS
        } else {
            EXIT_FINDINGS
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn findings(&self) -> impl Iterator<Item = (&VectorResult, &Finding)> {
        self.results
            .iter()
            .flat_map(|r| r.findings.iter().map(move |f| (r, f)))
    }

    pub fn finding_count(&self) -> usize {
        self.results.iter().map(|r| r.findings.len()).sum()
    }

    /// Findings per class, e.g. `{"byte-mismatch": 3, "adapter-timeout": 1}`.
    pub fn counts_by_class(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for (_, finding) in self.findings() {
            *counts.entry(finding.kind.class()).or_insert(0) += 1;
        }
        counts
    }

    pub fn result(&self, case_name: &str) -> Option<&VectorResult> {
        self.results.iter().find(|r| r.case_name == case_name)
    }
}
