// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Machine-readable report document.
//!
//! ```text
//! {
//!   "harness_version": "0.3.0",
//!   "mode": "parity",
//!   "adapters": ["rust", "typescript"],
//!   "success": false,
//!   "total": 24, "passed": 23, "failed": 1, "findings": 2,
//!   "counts": {"byte-mismatch": 2},
//!   "duration_ms": 41,
//!   "results": [
//!     {"index": 0, "case_name": "...", "type_name": "...", "passed": true,
//!      "duration_us": 120, "findings": []},
//!     ...
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Serialize, Serializer};

use super::{Finding, ParityReport, VectorResult};
use crate::harness::Mode;

pub const HARNESS_VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) fn as_micros<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_micros() as u64)
}

#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub harness_version: &'static str,
    pub mode: Mode,
    pub adapters: &'a [String],
    pub success: bool,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub findings: usize,
    pub counts: BTreeMap<&'static str, usize>,
    pub duration_ms: u64,
    pub results: Vec<ResultEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ResultEntry<'a> {
    pub index: usize,
    pub case_name: &'a str,
    pub type_name: &'a str,
    pub passed: bool,
    pub duration_us: u64,
    pub findings: &'a [Finding],
}

impl<'a> From<&'a VectorResult> for ResultEntry<'a> {
    fn from(result: &'a VectorResult) -> Self {
        Self {
            index: result.index,
            case_name: &result.case_name,
            type_name: &result.type_name,
            passed: result.passed(),
            duration_us: result.duration.as_micros() as u64,
            findings: &result.findings,
        }
    }
}

impl<'a> ReportDocument<'a> {
    pub fn new(report: &'a ParityReport) -> Self {
        Self {
            harness_version: HARNESS_VERSION,
            mode: report.mode,
            adapters: &report.adapters,
            success: report.success(),
            total: report.total(),
            passed: report.passed(),
            failed: report.failed(),
            findings: report.finding_count(),
            counts: report.counts_by_class(),
            duration_ms: report.duration.as_millis() as u64,
            results: report.results.iter().map(ResultEntry::from).collect(),
        }
    }
}

impl ParityReport {
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(ReportDocument::new(self))
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ReportDocument::new(self))
    }

    /// Write the JSON document to `path`, creating parent directories.
    pub fn write_json(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = self.to_json_string().map_err(io::Error::other)?;
        fs::write(path, json)
    }
}
