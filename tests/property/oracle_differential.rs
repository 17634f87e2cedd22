// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The canonical codec against a deliberately naive little-endian encoder.
//!
//! The oracle walks the value alone: scalars via `to_le_bytes`, arrays and
//! structs back to back, enums as tag then payload. Unions need no handling
//! because a union value is just its member's value.

use std::sync::Arc;

use proptest::prelude::*;

use crate::strategies::{arb_kind, arb_sample};
use codec_parity::testing::FnAdapter;
use codec_parity::{decode, encode, run, Corpus, Mode, ReferenceAdapter, TestVector, TypeDescriptor, Value, VariantContext};

fn oracle_encode(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::U8(x) => out.extend_from_slice(&x.to_le_bytes()),
        Value::U16(x) => out.extend_from_slice(&x.to_le_bytes()),
        Value::U32(x) => out.extend_from_slice(&x.to_le_bytes()),
        Value::U64(x) => out.extend_from_slice(&x.to_le_bytes()),
        Value::I8(x) => out.extend_from_slice(&x.to_le_bytes()),
        Value::I16(x) => out.extend_from_slice(&x.to_le_bytes()),
        Value::I32(x) => out.extend_from_slice(&x.to_le_bytes()),
        Value::I64(x) => out.extend_from_slice(&x.to_le_bytes()),
        Value::F32(x) => out.extend_from_slice(&x.to_bits().to_le_bytes()),
        Value::F64(x) => out.extend_from_slice(&x.to_bits().to_le_bytes()),
        Value::Array(items) => items.iter().for_each(|item| oracle_encode(item, out)),
        Value::Struct(fields) => fields.iter().for_each(|(_, v)| oracle_encode(v, out)),
        Value::Enum { tag, payload } => {
            out.push(*tag);
            if let Some(payload) = payload {
                oracle_encode(payload, out);
            }
        }
    }
}

fn oracle(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    oracle_encode(value, &mut out);
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_canonical_encode_matches_oracle(sample in arb_sample()) {
        let canonical = encode(&sample.desc, &sample.value, &sample.ctx).unwrap();
        prop_assert_eq!(hex::encode(&canonical), hex::encode(oracle(&sample.value)));
    }

    #[test]
    fn prop_primitive_decode_matches_from_le_bytes(kind in arb_kind(), raw in any::<[u8; 8]>()) {
        let desc = TypeDescriptor::primitive(kind);
        let bytes = &raw[..kind.width()];
        let value = decode(&desc, bytes, &VariantContext::new()).unwrap();
        prop_assert_eq!(oracle(&value), bytes.to_vec());
    }

    /// Swapping in the oracle as an adapter yields a clean parity run.
    #[test]
    fn prop_oracle_adapter_agrees_with_reference(samples in prop::collection::vec(arb_sample(), 1..6)) {
        let vectors: Vec<TestVector> = samples
            .iter()
            .enumerate()
            .map(|(i, s)| {
                TestVector::new(format!("random/{}", i), s.desc.clone(), s.value.clone(), oracle(&s.value))
                    .with_context(s.ctx.clone())
            })
            .collect();
        let corpus = Corpus::from_vectors(vectors).unwrap();
        let naive = FnAdapter::new("oracle").on_encode(|_, value, _| Ok(oracle(value)));
        let report = run(&corpus, Arc::new(naive), Arc::new(ReferenceAdapter::new()), Mode::Parity).unwrap();
        let findings: Vec<String> = report.findings().map(|(_, f)| f.to_string()).collect();
        prop_assert!(report.success(), "{:#?}", findings);
    }
}
