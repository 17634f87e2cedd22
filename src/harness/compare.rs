// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Byte and value comparison, producing finding details.

use crate::codec::json::value_to_json;
use crate::codec::Value;
use crate::layout::{TypeDescriptor, VariantContext};
use crate::report::{ByteMismatch, ValueMismatch};

/// First byte where `actual` departs from `expected`, or `None` if identical.
pub fn first_byte_mismatch(expected: &[u8], actual: &[u8]) -> Option<ByteMismatch> {
    let offset = expected
        .iter()
        .zip(actual)
        .position(|(a, b)| a != b)
        .or_else(|| (expected.len() != actual.len()).then_some(expected.len().min(actual.len())))?;

    Some(ByteMismatch {
        offset,
        expected_byte: expected.get(offset).copied(),
        actual_byte: actual.get(offset).copied(),
        expected_len: expected.len(),
        actual_len: actual.len(),
        expected_hex: hex::encode(expected),
        actual_hex: hex::encode(actual),
    })
}

/// First differing leaf under the parity equality rule, or `None` if equal.
pub fn value_mismatch(
    desc: &TypeDescriptor,
    ctx: &VariantContext,
    expected: &Value,
    actual: &Value,
) -> Option<ValueMismatch> {
    let diff = expected.first_difference(actual)?;
    Some(ValueMismatch {
        path: diff.path,
        expected: diff.expected,
        actual: diff.actual,
        expected_json: value_to_json(desc, expected, ctx),
        actual_json: value_to_json(desc, actual, ctx),
    })
}
