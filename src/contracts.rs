// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Runtime contracts for the layout and harness invariants.
//!
//! Debug-mode assertions that mirror the wire-format guarantees:
//!
//! 1. Are **zero-cost in release builds** (use `debug_assert!`)
//! 2. Provide **early failure detection** during development
//! 3. State the layout rules exactly as the format defines them
//!
//! # INVARIANTS (DO NOT REMOVE THESE CHECKS)
//!
//! | Contract Function              | Invariant                                     |
//! |--------------------------------|-----------------------------------------------|
//! | `check_dense_offsets`          | offset(field i) = Σ size(fields before i)     |
//! | `check_encoded_len`            | encode output length = size_of(desc, ctx)     |
//! | `check_corpus_order`           | report results follow corpus iteration order  |

use crate::layout::{FieldLayout, PrimitiveKind};

// ============================================================================
// COMPILE-TIME ASSERTIONS (evaluated at build time)
// ============================================================================

/// The ten primitive widths packed densely take 42 bytes (the AllPrimitives
/// fixture). Any alignment sneaking into the width table breaks this.
const _: () = {
    let mut total = 0;
    let mut i = 0;
    while i < PrimitiveKind::ALL.len() {
        total += PrimitiveKind::ALL[i].width();
        i += 1;
    }
    assert!(total == 42);
};

// ============================================================================
// LAYOUT CONTRACTS
// ============================================================================

/// Check that struct fields are packed with no gaps and no overlap.
///
/// # Panics (debug builds only)
/// Panics if any field starts anywhere other than the end of its predecessor.
#[inline]
pub fn check_dense_offsets(layout: &[FieldLayout]) {
    #[cfg(debug_assertions)]
    {
        let mut expected = 0;
        for field in layout {
            debug_assert_eq!(
                field.offset, expected,
                "Contract violation: field '{}' at offset {} but dense packing puts it at {}",
                field.name, field.offset, expected
            );
            expected += field.size;
        }
    }
    #[cfg(not(debug_assertions))]
    let _ = layout;
}

/// Check that an encoding is exactly as long as the layout model says.
///
/// `expected` is `None` when the size could not be resolved up front (for
/// example an array of enums without per-element selections); the check is
/// skipped then.
///
/// # Panics (debug builds only)
/// Panics if the lengths differ.
#[inline]
pub fn check_encoded_len(expected: Option<usize>, actual: usize) {
    if let Some(expected) = expected {
        debug_assert_eq!(
            expected, actual,
            "Contract violation: encoded {} bytes but layout size is {}",
            actual, expected
        );
    }
}

// ============================================================================
// HARNESS CONTRACTS
// ============================================================================

/// Check that per-vector results are in corpus order after parallel evaluation.
///
/// # Panics (debug builds only)
/// Panics if the indices are not exactly `0..n` in order.
#[inline]
pub fn check_corpus_order(indices: impl Iterator<Item = usize>) {
    #[cfg(debug_assertions)]
    for (position, index) in indices.enumerate() {
        debug_assert_eq!(
            position, index,
            "Contract violation: result for vector {} emitted at position {}",
            index, position
        );
    }
    #[cfg(not(debug_assertions))]
    let _ = indices;
}
