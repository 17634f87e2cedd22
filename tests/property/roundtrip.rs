// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Round-trip laws of the canonical codec.

use proptest::prelude::*;

use crate::strategies::{arb_kind, arb_plain_descriptor, arb_sample};
use codec_parity::{decode, decode_prefix, encode, encode_into, size_of, TypeDescriptor, Value, VariantContext};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// decode(encode(v)) == v, under parity equality.
    #[test]
    fn prop_decode_inverts_encode(sample in arb_sample()) {
        let bytes = encode(&sample.desc, &sample.value, &sample.ctx).unwrap();
        let back = decode(&sample.desc, &bytes, &sample.ctx).unwrap();
        prop_assert_eq!(&back, &sample.value, "bytes {}", hex::encode(&bytes));
    }

    /// The encoding is exactly as long as the layout says, and decoding
    /// consumes all of it.
    #[test]
    fn prop_encoded_length_matches_layout(sample in arb_sample()) {
        let bytes = encode(&sample.desc, &sample.value, &sample.ctx).unwrap();
        prop_assert_eq!(bytes.len(), size_of(&sample.desc, &sample.ctx).unwrap());
        let (_, consumed) = decode_prefix(&sample.desc, &bytes, &sample.ctx).unwrap();
        prop_assert_eq!(consumed, bytes.len());
    }

    /// encode(decode(b)) == b for any bytes of the right length.
    #[test]
    fn prop_encode_inverts_decode(
        (desc, bytes) in arb_plain_descriptor().prop_flat_map(|desc| {
            let len = size_of(&desc, &VariantContext::new()).unwrap();
            (Just(desc), prop::collection::vec(any::<u8>(), len))
        })
    ) {
        let ctx = VariantContext::new();
        let value = decode(&desc, &bytes, &ctx).unwrap();
        prop_assert_eq!(encode(&desc, &value, &ctx).unwrap(), bytes);
    }

    /// Trailing bytes never change what the prefix decodes to.
    #[test]
    fn prop_trailing_bytes_ignored(sample in arb_sample(), tail in prop::collection::vec(any::<u8>(), 1..8)) {
        let mut bytes = encode(&sample.desc, &sample.value, &sample.ctx).unwrap();
        let len = bytes.len();
        bytes.extend_from_slice(&tail);
        let (value, consumed) = decode_prefix(&sample.desc, &bytes, &sample.ctx).unwrap();
        prop_assert_eq!(consumed, len);
        prop_assert_eq!(&value, &sample.value);
    }

    /// Any strict prefix of an encoding is a decode error, not a panic.
    #[test]
    fn prop_truncation_is_an_error(sample in arb_sample(), cut in any::<prop::sample::Index>()) {
        let bytes = encode(&sample.desc, &sample.value, &sample.ctx).unwrap();
        prop_assume!(!bytes.is_empty());
        let short = &bytes[..cut.index(bytes.len())];
        prop_assert!(decode(&sample.desc, short, &sample.ctx).is_err());
    }

    /// Float bit patterns survive exactly, NaN payloads included.
    #[test]
    fn prop_float_bits_survive(bits32 in any::<u32>(), bits64 in any::<u64>()) {
        let ctx = VariantContext::new();
        let f32_desc = TypeDescriptor::primitive(codec_parity::PrimitiveKind::F32);
        let bytes = encode(&f32_desc, &Value::F32(f32::from_bits(bits32)), &ctx).unwrap();
        prop_assert_eq!(&bytes, &bits32.to_le_bytes().to_vec());
        let Value::F32(x) = decode(&f32_desc, &bytes, &ctx).unwrap() else {
            panic!("f32 decoded to another kind");
        };
        prop_assert_eq!(x.to_bits(), bits32);

        let f64_desc = TypeDescriptor::primitive(codec_parity::PrimitiveKind::F64);
        let bytes = encode(&f64_desc, &Value::F64(f64::from_bits(bits64)), &ctx).unwrap();
        let Value::F64(y) = decode(&f64_desc, &bytes, &ctx).unwrap() else {
            panic!("f64 decoded to another kind");
        };
        prop_assert_eq!(y.to_bits(), bits64);
    }

    /// A value of the wrong kind never encodes.
    #[test]
    fn prop_kind_mismatch_rejected(
        (kind, other) in (arb_kind(), arb_kind()).prop_filter("distinct kinds", |(a, b)| a != b),
    ) {
        let value = one_of(other);
        prop_assert!(encode(&TypeDescriptor::primitive(kind), &value, &VariantContext::new()).is_err());
    }

    /// encode_into appends and leaves existing bytes alone.
    #[test]
    fn prop_encode_into_appends(sample in arb_sample(), prefix in prop::collection::vec(any::<u8>(), 0..8)) {
        let mut buf = prefix.clone();
        encode_into(&sample.desc, &sample.value, &sample.ctx, &mut buf).unwrap();
        let alone = encode(&sample.desc, &sample.value, &sample.ctx).unwrap();
        prop_assert_eq!(&buf[..prefix.len()], &prefix[..]);
        prop_assert_eq!(&buf[prefix.len()..], &alone[..]);
    }
}

/// The value one, as `kind`.
fn one_of(kind: codec_parity::PrimitiveKind) -> Value {
    use codec_parity::PrimitiveKind::*;
    match kind {
        U8 => Value::U8(1),
        U16 => Value::U16(1),
        U32 => Value::U32(1),
        U64 => Value::U64(1),
        I8 => Value::I8(1),
        I16 => Value::I16(1),
        I32 => Value::I32(1),
        I64 => Value::I64(1),
        F32 => Value::F32(1.0),
        F64 => Value::F64(1.0),
    }
}

#[test]
fn test_nan_payloads_are_distinct_values() {
    let a = Value::F32(f32::from_bits(0x7fc0_0000));
    let b = Value::F32(f32::from_bits(0x7fc0_0001));
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
    assert_eq!(Value::F64(0.0), Value::F64(-0.0));
}
