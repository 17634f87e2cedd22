// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The parity harness: runs every vector through the oracle and every adapter,
//! and writes down every disagreement.
//!
//! # Per-vector algorithm
//!
//! ```text
//!  vector ─┬─ oracle encode(value)  ──── vs canonical bytes ───────────┐
//!          ├─ oracle decode(bytes)  ──── vs semantic value ────────────┤
//!          │                        └─── consumed == len (or allowed) ─┤
//!          ├─ adapter[i] encode     ──── vs canonical bytes ───────────┤
//!          ├─ adapter[i] decode     ──── vs semantic value ────────────┼──► findings
//!          ├─ adapter[i] re-encode  ──── vs canonical bytes (opt) ─────┤
//!          └─ parity mode: adapter[i] vs adapter[j], bytes and value ──┘
//! ```
//!
//! Nothing short-circuits. A failing encode doesn't skip decode, a failing
//! adapter doesn't skip the next one, and a failing vector doesn't stop the
//! run. One run surfaces everything.
//!
//! # Concurrency
//!
//! With the `parallel` feature vectors are evaluated on a rayon pool. Results
//! are sorted back into corpus order before the report is built, so output is
//! byte-for-byte reproducible no matter how work was scheduled. Every adapter
//! call runs under [`call_with_timeout`]; a hung codec costs one finding, not
//! the run.

pub mod compare;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use indicatif::ProgressBar;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Span};

use crate::adapter::{call_with_timeout, CodecAdapter};
use crate::codec::{self, Value};
use crate::contracts::check_corpus_order;
use crate::corpus::{Corpus, Settings, TestVector};
use crate::error::{AdapterError, AdapterFailure, CodecError, HarnessError};
use crate::layout::size_of;
use crate::report::{Finding, FindingKind, ParityReport, Phase, Subject, VectorResult};

use compare::{first_byte_mismatch, value_mismatch};

/// Default per-call adapter timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// What gets compared against what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Each adapter against the oracle only.
    #[default]
    Validate,
    /// Validate, plus every adapter against every other adapter.
    Parity,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::Validate => "validate",
            Mode::Parity => "parity",
        }
    }
}

impl FromStr for Mode {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "validate" => Ok(Mode::Validate),
            "parity" => Ok(Mode::Parity),
            other => Err(HarnessError::config(format!(
                "unknown mode '{}' (expected 'validate' or 'parity')",
                other
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub mode: Mode,
    /// Upper bound on every single adapter call.
    pub call_timeout: Duration,
    /// Worker threads. `None` uses every core.
    pub jobs: Option<usize>,
    /// Also re-encode each adapter's decoded value.
    pub roundtrip: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Validate,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            jobs: None,
            roundtrip: false,
        }
    }
}

impl HarnessConfig {
    /// Defaults overridden by the corpus manifest's `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, HarnessError> {
        let mut config = Self::default();
        if let Some(mode) = &settings.mode {
            config.mode = mode.parse()?;
        }
        if let Some(ms) = settings.timeout_ms {
            config.call_timeout = Duration::from_millis(ms);
        }
        if let Some(roundtrip) = settings.roundtrip {
            config.roundtrip = roundtrip;
        }
        Ok(config)
    }

    fn check(&self, adapters: &[Arc<dyn CodecAdapter>]) -> Result<(), HarnessError> {
        if adapters.is_empty() {
            return Err(HarnessError::config("no adapters configured"));
        }
        if self.mode == Mode::Parity && adapters.len() < 2 {
            return Err(HarnessError::config(format!(
                "parity mode needs at least two adapters, got {}",
                adapters.len()
            )));
        }
        for (i, adapter) in adapters.iter().enumerate() {
            if adapters[..i].iter().any(|a| a.name() == adapter.name()) {
                return Err(HarnessError::config(format!(
                    "adapter name '{}' used more than once",
                    adapter.name()
                )));
            }
        }
        if self.call_timeout.is_zero() {
            return Err(HarnessError::config("call timeout must be positive"));
        }
        if self.jobs == Some(0) {
            return Err(HarnessError::config("jobs must be at least 1"));
        }
        Ok(())
    }
}

/// Acquired adapters, released on drop in reverse order.
struct AdapterLease<'a> {
    adapters: &'a [Arc<dyn CodecAdapter>],
    acquired: usize,
}

impl<'a> AdapterLease<'a> {
    fn acquire(adapters: &'a [Arc<dyn CodecAdapter>]) -> Result<Self, HarnessError> {
        let mut lease = Self {
            adapters,
            acquired: 0,
        };
        for adapter in adapters {
            adapter.acquire().map_err(|e| {
                HarnessError::config(format!("adapter '{}' failed to start: {}", adapter.name(), e))
            })?;
            lease.acquired += 1;
        }
        Ok(lease)
    }
}

impl Drop for AdapterLease<'_> {
    fn drop(&mut self) {
        for adapter in self.adapters[..self.acquired].iter().rev() {
            adapter.release();
        }
    }
}

/// What one adapter produced for one vector, kept for cross-parity.
#[derive(Default)]
struct AdapterOutcome {
    encoded: Option<Vec<u8>>,
    decoded: Option<Value>,
}

/// Runs corpora against a fixed set of adapters.
pub struct Harness {
    config: HarnessConfig,
    adapters: Vec<Arc<dyn CodecAdapter>>,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            adapters: Vec::new(),
        }
    }

    pub fn with_adapter<A: CodecAdapter + 'static>(self, adapter: A) -> Self {
        self.with_shared_adapter(Arc::new(adapter))
    }

    pub fn with_shared_adapter(mut self, adapter: Arc<dyn CodecAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn adapter_names(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.name().to_string()).collect()
    }

    /// Evaluate every vector of `corpus`.
    ///
    /// Fails only on invalid configuration. Everything that goes wrong with a
    /// vector is a finding in the returned report.
    pub fn run(&self, corpus: &Corpus) -> Result<ParityReport, HarnessError> {
        self.run_inner(corpus, &|| {})
    }

    /// [`Harness::run`], ticking `progress` once per evaluated vector.
    #[cfg(feature = "parallel")]
    pub fn run_with_progress(
        &self,
        corpus: &Corpus,
        progress: &ProgressBar,
    ) -> Result<ParityReport, HarnessError> {
        self.run_inner(corpus, &|| progress.inc(1))
    }

    fn run_inner(
        &self,
        corpus: &Corpus,
        on_done: &(dyn Fn() + Sync),
    ) -> Result<ParityReport, HarnessError> {
        self.config.check(&self.adapters)?;
        let names = self.adapter_names();
        let span = info_span!(
            "parity_run",
            mode = %self.config.mode,
            vectors = corpus.len(),
            adapters = %names.join(",")
        );
        let _entered = span.enter();

        let start = Instant::now();
        let lease = AdapterLease::acquire(&self.adapters)?;
        let mut results = self.evaluate_all(corpus, &span, on_done)?;
        drop(lease);

        results.sort_by_key(|r| r.index);
        check_corpus_order(results.iter().map(|r| r.index));

        let report = ParityReport {
            mode: self.config.mode,
            adapters: names,
            results,
            duration: start.elapsed(),
        };
        info!(
            passed = report.passed(),
            failed = report.failed(),
            findings = report.finding_count(),
            "parity run finished"
        );
        Ok(report)
    }

    #[cfg(feature = "parallel")]
    fn evaluate_all(
        &self,
        corpus: &Corpus,
        span: &Span,
        on_done: &(dyn Fn() + Sync),
    ) -> Result<Vec<VectorResult>, HarnessError> {
        let work = || {
            corpus
                .vectors
                .par_iter()
                .enumerate()
                .map(|(index, vector)| {
                    let result = self.evaluate(index, vector, span);
                    on_done();
                    result
                })
                .collect::<Vec<_>>()
        };
        match self.config.jobs {
            Some(jobs) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .thread_name(|i| format!("parity-worker-{}", i))
                    .build()
                    .map_err(|e| HarnessError::config(format!("cannot start {} workers: {}", jobs, e)))?;
                Ok(pool.install(work))
            }
            None => Ok(work()),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate_all(
        &self,
        corpus: &Corpus,
        span: &Span,
        on_done: &(dyn Fn() + Sync),
    ) -> Result<Vec<VectorResult>, HarnessError> {
        Ok(corpus
            .vectors
            .iter()
            .enumerate()
            .map(|(index, vector)| {
                let result = self.evaluate(index, vector, span);
                on_done();
                result
            })
            .collect())
    }

    fn evaluate(&self, index: usize, vector: &TestVector, span: &Span) -> VectorResult {
        let start = Instant::now();
        let mut findings = Vec::new();

        let covered = self.check_oracle(vector, &mut findings);
        let expected = expected_encoding(vector, covered);

        let outcomes: Vec<AdapterOutcome> = self
            .adapters
            .iter()
            .map(|adapter| self.exercise(adapter, vector, expected, &mut findings))
            .collect();

        if self.config.mode == Mode::Parity {
            self.cross_check(vector, &outcomes, &mut findings);
        }

        debug!(
            parent: span,
            case = %vector.case_name,
            index,
            findings = findings.len(),
            "evaluated vector"
        );

        VectorResult {
            index,
            case_name: vector.case_name.clone(),
            type_name: vector.type_name.clone(),
            findings,
            duration: start.elapsed(),
        }
    }

    /// The canonical codec has to agree with the corpus before anyone else is
    /// held to it.
    ///
    /// Returns how many leading blob bytes the descriptor covers, when known.
    fn check_oracle(&self, vector: &TestVector, findings: &mut Vec<Finding>) -> Option<usize> {
        let desc = &vector.descriptor;
        let ctx = &vector.context;

        let decoded = codec::decode_prefix(desc, &vector.canonical_bytes, ctx);
        let covered = match &decoded {
            Ok((_, consumed)) => Some(*consumed),
            Err(_) => size_of(desc, ctx).ok(),
        };
        let expected = expected_encoding(vector, covered);

        match codec::encode(desc, &vector.value, ctx) {
            Ok(bytes) => {
                if let Some(m) = first_byte_mismatch(expected, &bytes) {
                    findings.push(finding(Phase::Encode, Subject::Oracle, FindingKind::ByteMismatch(m)));
                }
            }
            Err(err) => findings.push(codec_finding(Phase::Encode, err)),
        }

        match decoded {
            Ok((value, consumed)) => {
                if let Some(m) = value_mismatch(desc, ctx, &vector.value, &value) {
                    findings.push(finding(Phase::Decode, Subject::Oracle, FindingKind::ValueMismatch(m)));
                }
                let total = vector.canonical_bytes.len();
                if consumed < total && !vector.allow_trailing {
                    findings.push(finding(
                        Phase::Decode,
                        Subject::Oracle,
                        FindingKind::TrailingBytes { consumed, total },
                    ));
                }
            }
            Err(err) => findings.push(codec_finding(Phase::Decode, err)),
        }

        covered
    }

    fn exercise(
        &self,
        adapter: &Arc<dyn CodecAdapter>,
        vector: &TestVector,
        expected: &[u8],
        findings: &mut Vec<Finding>,
    ) -> AdapterOutcome {
        let name = adapter.name().to_string();
        let subject = || Subject::Adapter(name.clone());
        let mut outcome = AdapterOutcome::default();

        match self.call_encode(adapter, vector, vector.value.clone()) {
            Ok(bytes) => {
                if let Some(m) = first_byte_mismatch(expected, &bytes) {
                    findings.push(finding(Phase::Encode, subject(), FindingKind::ByteMismatch(m)));
                }
                outcome.encoded = Some(bytes);
            }
            Err(failure) => findings.push(self.adapter_finding(Phase::Encode, &name, vector, failure)),
        }

        match self.call_decode(adapter, vector) {
            Ok(value) => {
                if let Some(m) =
                    value_mismatch(&vector.descriptor, &vector.context, &vector.value, &value)
                {
                    findings.push(finding(Phase::Decode, subject(), FindingKind::ValueMismatch(m)));
                }
                outcome.decoded = Some(value);
            }
            Err(failure) => findings.push(self.adapter_finding(Phase::Decode, &name, vector, failure)),
        }

        if self.config.roundtrip {
            if let Some(decoded) = &outcome.decoded {
                match self.call_encode(adapter, vector, decoded.clone()) {
                    Ok(bytes) => {
                        if let Some(m) = first_byte_mismatch(expected, &bytes) {
                            findings.push(finding(Phase::Reencode, subject(), FindingKind::ByteMismatch(m)));
                        }
                    }
                    Err(failure) => {
                        findings.push(self.adapter_finding(Phase::Reencode, &name, vector, failure))
                    }
                }
            }
        }

        outcome
    }

    /// Every unordered adapter pair, compared directly with no oracle involved.
    fn cross_check(&self, vector: &TestVector, outcomes: &[AdapterOutcome], findings: &mut Vec<Finding>) {
        for i in 0..self.adapters.len() {
            for j in i + 1..self.adapters.len() {
                let pair = || {
                    Subject::Pair(
                        self.adapters[i].name().to_string(),
                        self.adapters[j].name().to_string(),
                    )
                };
                if let (Some(a), Some(b)) = (&outcomes[i].encoded, &outcomes[j].encoded) {
                    if let Some(m) = first_byte_mismatch(a, b) {
                        findings.push(finding(Phase::CrossParityEncode, pair(), FindingKind::ByteMismatch(m)));
                    }
                }
                if let (Some(a), Some(b)) = (&outcomes[i].decoded, &outcomes[j].decoded) {
                    if let Some(m) = value_mismatch(&vector.descriptor, &vector.context, a, b) {
                        findings.push(finding(Phase::CrossParityDecode, pair(), FindingKind::ValueMismatch(m)));
                    }
                }
            }
        }
    }

    fn call_encode(
        &self,
        adapter: &Arc<dyn CodecAdapter>,
        vector: &TestVector,
        value: Value,
    ) -> Result<Vec<u8>, AdapterFailure> {
        let adapter = Arc::clone(adapter);
        let desc = Arc::clone(&vector.descriptor);
        let ctx = vector.context.clone();
        let label = adapter.name().to_string();
        call_with_timeout(&label, self.config.call_timeout, move || {
            adapter.encode(&desc, &value, &ctx)
        })
    }

    fn call_decode(&self, adapter: &Arc<dyn CodecAdapter>, vector: &TestVector) -> Result<Value, AdapterFailure> {
        let adapter = Arc::clone(adapter);
        let desc = Arc::clone(&vector.descriptor);
        let ctx = vector.context.clone();
        let bytes = vector.canonical_bytes.clone();
        let label = adapter.name().to_string();
        call_with_timeout(&label, self.config.call_timeout, move || {
            adapter.decode(&desc, &bytes, &ctx)
        })
    }

    fn adapter_finding(
        &self,
        phase: Phase,
        name: &str,
        vector: &TestVector,
        failure: AdapterFailure,
    ) -> Finding {
        let kind = match failure {
            AdapterFailure::TimedOut(timeout) => {
                warn!(adapter = name, case = %vector.case_name, %phase, "adapter call timed out");
                FindingKind::Timeout {
                    ecosystem: name.to_string(),
                    case_name: vector.case_name.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            }
            AdapterFailure::Failed(message) => {
                warn!(adapter = name, case = %vector.case_name, %phase, error = %message, "adapter call failed");
                FindingKind::Adapter(AdapterError {
                    ecosystem: name.to_string(),
                    case_name: vector.case_name.clone(),
                    message,
                })
            }
        };
        finding(phase, Subject::Adapter(name.to_string()), kind)
    }
}

/// Bytes an encoder must produce: the whole blob, or with `allow_trailing`
/// only the prefix the descriptor covers.
fn expected_encoding(vector: &TestVector, covered: Option<usize>) -> &[u8] {
    let bytes = vector.canonical_bytes.as_slice();
    match covered {
        Some(len) if vector.allow_trailing && len <= bytes.len() => &bytes[..len],
        _ => bytes,
    }
}

fn finding(phase: Phase, subject: Subject, kind: FindingKind) -> Finding {
    Finding {
        phase,
        subject,
        kind,
    }
}

fn codec_finding(phase: Phase, err: CodecError) -> Finding {
    finding(
        phase,
        Subject::Oracle,
        FindingKind::Codec {
            kind: err.kind(),
            path: err.path().to_string(),
            message: err.to_string(),
        },
    )
}

/// Run `corpus` against two adapters with default settings.
pub fn run(
    corpus: &Corpus,
    adapter_a: Arc<dyn CodecAdapter>,
    adapter_b: Arc<dyn CodecAdapter>,
    mode: Mode,
) -> Result<ParityReport, HarnessError> {
    Harness::new(HarnessConfig {
        mode,
        ..HarnessConfig::default()
    })
    .with_shared_adapter(adapter_a)
    .with_shared_adapter(adapter_b)
    .run(corpus)
}
