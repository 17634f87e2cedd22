// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Human-readable report log.
//!
//! Plain text, one line per finding:
//!
//! ```text
//! FAIL u16/ten (u16)
//!   [encode] typescript: byte 0: expected 0x0A, got 0x00
//! PASS u8/one (u8)                      <- only with verbose
//! ```
//!
//! Lines come back tagged with a [`LineKind`] so a terminal front end can
//! color them without parsing text.

use super::{ParityReport, VectorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Pass,
    Fail,
    Finding,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub kind: LineKind,
    pub text: String,
}

impl LogLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

fn vector_header(result: &VectorResult) -> String {
    format!("{} ({})", result.case_name, result.type_name)
}

/// Per-vector lines. Clean vectors are listed only when `verbose`.
pub fn vector_lines(report: &ParityReport, verbose: bool) -> Vec<LogLine> {
    let mut lines = Vec::new();
    for result in &report.results {
        if result.passed() {
            if verbose {
                lines.push(LogLine::new(
                    LineKind::Pass,
                    format!("PASS {}", vector_header(result)),
                ));
            }
            continue;
        }
        lines.push(LogLine::new(
            LineKind::Fail,
            format!("FAIL {}", vector_header(result)),
        ));
        for finding in &result.findings {
            lines.push(LogLine::new(LineKind::Finding, format!("  {}", finding)));
        }
    }
    lines
}

/// Totals, findings by class, and wall time.
pub fn summary_lines(report: &ParityReport) -> Vec<LogLine> {
    let mut lines = vec![LogLine::new(
        LineKind::Summary,
        format!(
            "{} mode, adapters: {}",
            report.mode,
            report.adapters.join(", ")
        ),
    )];
    lines.push(LogLine::new(
        LineKind::Summary,
        format!(
            "{} vectors: {} passed, {} failed ({} findings) in {:.1}ms",
            report.total(),
            report.passed(),
            report.failed(),
            report.finding_count(),
            report.duration.as_secs_f64() * 1000.0
        ),
    ));
    for (class, count) in report.counts_by_class() {
        lines.push(LogLine::new(LineKind::Summary, format!("  {:<24} {}", class, count)));
    }
    lines
}

/// The whole log as one string.
pub fn render_log(report: &ParityReport, verbose: bool) -> String {
    vector_lines(report, verbose)
        .into_iter()
        .chain(summary_lines(report))
        .map(|line| line.text)
        .collect::<Vec<_>>()
        .join("\n")
}
