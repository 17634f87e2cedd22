// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! JSON value parsing against fixture descriptors.
//!
//! Manifest values and adapter responses are JSON written by other
//! ecosystems. Anything the parser accepts must encode, and must decode
//! back to an equal value.

#![no_main]

use libfuzzer_sys::fuzz_target;

use codec_parity::codec::json::{value_from_json, value_to_json};
use codec_parity::testing::{all_primitives, rectangle, simple_enum, simple_union};
use codec_parity::{decode, encode, VariantContext};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(rest) else {
        return;
    };

    let (desc, ctx) = match selector % 4 {
        0 => (all_primitives(), VariantContext::new()),
        1 => (rectangle(), VariantContext::new()),
        2 => (simple_enum(), VariantContext::new()),
        _ => (simple_union(), VariantContext::root("float_value")),
    };

    if let Ok(value) = value_from_json(&desc, &json, &ctx) {
        let bytes = encode(&desc, &value, &ctx).expect("parsed value encodes");
        let back = decode(&desc, &bytes, &ctx).expect("encoded value decodes");
        assert_eq!(back, value);

        // The rendered form parses back to the same value.
        let rendered = value_to_json(&desc, &value, &ctx);
        let reparsed = value_from_json(&desc, &rendered, &ctx).expect("rendered JSON parses");
        assert_eq!(reparsed, value);
    }
});
