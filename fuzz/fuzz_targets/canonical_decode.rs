// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The canonical decoder under arbitrary bytes.
//!
//! Adapters hand us whatever their codec produced, so the decoder sees
//! garbage in practice: short buffers, unknown enum tags, NaN payloads.
//! It must answer with an error, never a panic, and whatever it does accept
//! must re-encode to exactly the bytes it consumed.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use codec_parity::testing::{all_primitives, fixed_arrays, rectangle, simple_enum, simple_struct, simple_union};
use codec_parity::{decode_prefix, encode, TypeDescriptor, VariantContext};

#[derive(Arbitrary, Debug)]
struct Input {
    shape: u8,
    member: u8,
    bytes: Vec<u8>,
}

fn pick(shape: u8, member: u8) -> (TypeDescriptor, VariantContext) {
    let union_member = ["int_value", "float_value", "bytes", "wide"][member as usize % 4];
    match shape % 7 {
        0 => (all_primitives(), VariantContext::new()),
        1 => (rectangle(), VariantContext::new()),
        2 => (simple_struct(), VariantContext::new()),
        3 => (simple_enum(), VariantContext::new()),
        4 => (simple_union(), VariantContext::root(union_member)),
        5 => (
            TypeDescriptor::array(simple_union(), 3),
            VariantContext::new()
                .with("[0]", union_member)
                .with("[1]", "bytes")
                .with("[2]", "wide"),
        ),
        _ => {
            let arrays = fixed_arrays();
            let (_, desc) = &arrays[member as usize % arrays.len()];
            (desc.clone(), VariantContext::new())
        }
    }
}

fuzz_target!(|input: Input| {
    let (desc, ctx) = pick(input.shape, input.member);

    if let Ok((value, consumed)) = decode_prefix(&desc, &input.bytes, &ctx) {
        assert!(consumed <= input.bytes.len());
        let reencoded = encode(&desc, &value, &ctx).expect("decoded value re-encodes");
        assert_eq!(reencoded, &input.bytes[..consumed], "re-encode differs for {}", value);
    }
});
