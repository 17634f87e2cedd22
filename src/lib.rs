// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Bit-for-bit parity verification for generated binary codecs.
//!
//! Two code generators emit encoders and decoders for the same schema, in two
//! languages. This crate checks that both produce exactly the bytes of a
//! canonical little-endian layout, and decode those bytes back into exactly the
//! same values, using a corpus of known-good test vectors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   layout    │────▶│    codec     │────▶│    corpus    │
//! │ (size_of,   │     │ (encode,     │     │ (corpus.json,│
//! │  offsets)   │     │  decode)     │     │  blobs, crc) │
//! └─────────────┘     └──────────────┘     └──────────────┘
//!                            │                     │
//!                            ▼                     ▼
//! ┌─────────────┐     ┌──────────────────────────────────────┐
//! │   adapter   │────▶│               harness                │
//! │ (reference, │     │ (oracle check, per-adapter checks,   │
//! │  process)   │     │  cross-parity, timeouts, ordering)   │
//! └─────────────┘     └──────────────────────────────────────┘
//!                                      │
//!                                      ▼
//!                         ┌──────────────────────────┐
//!                         │          report          │
//!                         │ (findings, JSON, log,    │
//!                         │  exit code)              │
//!                         └──────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! | Module      | Property                                                 |
//! |-------------|----------------------------------------------------------|
//! | `layout`    | Fields are dense: offset(i+1) = offset(i) + size(i)      |
//! | `codec`     | `decode(encode(v)) == v`, `encode(decode(b)) == b`       |
//! | `codec`     | NaN payload bits survive both directions                 |
//! | `harness`   | Results come back in corpus order, nothing short-circuits|
//! | `report`    | Exit code is 0 only when every vector passed             |
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use codec_parity::{run, Corpus, Mode, ProcessAdapter, ReferenceAdapter};
//!
//! let corpus = Corpus::load("data/corpus")?;
//! let report = run(
//!     &corpus,
//!     Arc::new(ProcessAdapter::new("typescript", "node").arg("codec.js")),
//!     Arc::new(ReferenceAdapter::named("rust")),
//!     Mode::Parity,
//! )?;
//! std::process::exit(report.exit_code().into());
//! # Ok::<(), codec_parity::HarnessError>(())
//! ```

pub mod adapter;
pub mod codec;
pub mod contracts;
pub mod corpus;
pub mod error;
pub mod harness;
pub mod layout;
pub mod report;
pub mod testing;

pub use adapter::{call_with_timeout, CodecAdapter, ProcessAdapter, ReferenceAdapter};
pub use codec::{decode, decode_prefix, encode, encode_into, Value, ValueDiff};
pub use corpus::{Corpus, TestVector};
pub use error::{AdapterError, AdapterFailure, CodecError, ErrorKind, HarnessError};
pub use harness::{run, Harness, HarnessConfig, Mode, DEFAULT_CALL_TIMEOUT};
pub use layout::{
    describe, field_offset, field_offset_in, size_of, LayoutRow, PrimitiveKind, TypeDescriptor,
    VariantContext,
};
pub use report::{
    Finding, FindingKind, ParityReport, Phase, Subject, VectorResult, EXIT_FATAL, EXIT_FINDINGS,
    EXIT_SUCCESS,
};
