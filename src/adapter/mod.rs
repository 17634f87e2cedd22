// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The capability seam between the harness and a generated codec.
//!
//! ```text
//!            ┌──────────────────────┐
//!  harness ──┤ CodecAdapter (trait) ├──┬── ReferenceAdapter   (canonical codec)
//!            └──────────────────────┘  ├── ProcessAdapter     (external program, JSON over stdio)
//!                                      └── anything else      (in-process bindings, test doubles)
//! ```
//!
//! Adapters adapt invocation only. They must not touch the bytes or the values
//! on the way through: if a generated codec writes big-endian, the adapter hands
//! back big-endian bytes and the harness reports it.

mod process;
mod reference;
mod timeout;

pub use process::ProcessAdapter;
pub use reference::ReferenceAdapter;
pub use timeout::call_with_timeout;

use crate::codec::Value;
use crate::error::AdapterFailure;
use crate::layout::{TypeDescriptor, VariantContext};

/// A generated codec, as the harness sees it.
///
/// Calls may block. The harness bounds each one with a per-call timeout and
/// runs it on a worker thread, which is why implementations must be
/// `Send + Sync`.
pub trait CodecAdapter: Send + Sync {
    /// Ecosystem name used in reports (`rust`, `typescript`, ...). Must be
    /// unique within one harness run.
    fn name(&self) -> &str;

    fn encode(
        &self,
        desc: &TypeDescriptor,
        value: &Value,
        ctx: &VariantContext,
    ) -> Result<Vec<u8>, AdapterFailure>;

    fn decode(
        &self,
        desc: &TypeDescriptor,
        bytes: &[u8],
        ctx: &VariantContext,
    ) -> Result<Value, AdapterFailure>;

    /// Called once before the first vector of a run.
    fn acquire(&self) -> Result<(), AdapterFailure> {
        Ok(())
    }

    /// Called once when the run ends, on every exit path.
    fn release(&self) {}
}
