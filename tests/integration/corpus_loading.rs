// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Corpus loading against the checked-in sample and on-disk edge cases.

use serde_json::json;

use crate::common::{crc32_hex, load_sample, CorpusDir, SAMPLE_CORPUS};
use codec_parity::{size_of, Corpus, HarnessError, Value, VariantContext};

#[test]
fn test_sample_corpus_loads() {
    let corpus = load_sample();
    assert_eq!(corpus.len(), 25);
    assert_eq!(corpus.settings.mode.as_deref(), Some("validate"));
    assert_eq!(corpus.settings.timeout_ms, Some(5000));
    for name in ["AllPrimitives", "Point2D", "Rectangle", "SimpleEnum", "SimpleUnion", "Shape"] {
        assert!(corpus.type_named(name).is_some(), "missing type {}", name);
    }
}

#[test]
fn test_main_manifest_vectors_come_first() {
    let corpus = load_sample();
    let names: Vec<&str> = corpus.iter().map(|v| v.case_name.as_str()).collect();
    assert_eq!(names[0], "primitives/all_zeros");
    let first_include = names.iter().position(|n| n.starts_with("structs/")).unwrap();
    assert!(names[..first_include].iter().all(|n| !n.starts_with("enums/")));
    assert_eq!(names.last(), Some(&"unions/nested_shape"));
}

#[test]
fn test_all_primitives_is_42_bytes() {
    let corpus = load_sample();
    let desc = corpus.type_named("AllPrimitives").unwrap();
    assert_eq!(size_of(&desc, &VariantContext::new()).unwrap(), 42);
    for vector in corpus.iter().filter(|v| v.case_name.starts_with("primitives/")) {
        assert_eq!(vector.canonical_bytes.len(), 42, "{}", vector.case_name);
    }
}

#[test]
fn test_sample_values_parse_as_written() {
    let corpus = load_sample();

    let common = corpus.get("primitives/common_values").unwrap();
    assert_eq!(common.value.field("u32_val"), Some(&Value::U32(0x1234_5678)));
    assert_eq!(common.value.field("i16_val"), Some(&Value::I16(-1234)));

    let le = corpus.get("scalars/u32_le").unwrap();
    assert_eq!(le.canonical_bytes, vec![0x78, 0x56, 0x34, 0x12]);

    let hex = corpus.get("scalars/i64_hex").unwrap();
    assert_eq!(hex.value, Value::I64(-2));

    let nan = corpus.get("scalars/f32_nan_payload").unwrap();
    let Value::F32(x) = nan.value else {
        panic!("expected f32, got {}", nan.value);
    };
    assert_eq!(x.to_bits(), 0x7fc0_0001);

    let none = corpus.get("enums/none").unwrap();
    assert_eq!(none.value, Value::variant(0, None));
    assert_eq!(none.canonical_bytes, vec![0x00]);

    let union = corpus.get("unions/int_value").unwrap();
    assert_eq!(union.context.get(""), Some("int_value"));
    assert_eq!(union.canonical_bytes, vec![0xD6, 0xFF, 0xFF, 0xFF]);

    let nested = corpus.get("unions/nested_shape").unwrap();
    assert_eq!(nested.context.get("body"), Some("wide"));
    assert_eq!(nested.canonical_bytes.len(), 2 + 8 + 5);
}

#[test]
fn test_manifest_file_path_also_loads() {
    let corpus = Corpus::load(format!("{}/corpus.json", SAMPLE_CORPUS)).unwrap();
    assert_eq!(corpus.len(), 25);
}

#[test]
fn test_filter_by_prefix() {
    let corpus = load_sample().filter("unions/");
    assert_eq!(corpus.len(), 4);
    assert!(corpus.iter().all(|v| v.tags.contains(&"unions".to_string())));
}

#[test]
fn test_missing_corpus_is_fatal() {
    let err = Corpus::load("/nonexistent/corpus").unwrap_err();
    assert!(matches!(err, HarnessError::CorpusLoad { .. }));
}

#[test]
fn test_crc_mismatch_rejected() {
    let corpus = CorpusDir::new();
    corpus.blob("ten.bin", &[0x0A, 0x00]);
    corpus.manifest(
        "corpus.json",
        json!({
            "version": 1,
            "vectors": [{"name": "ten", "type": "u16", "binary": "ten.bin", "value": 10,
                         "crc32": "00000000"}]
        }),
    );
    let err = corpus.load().unwrap_err().to_string();
    assert!(err.contains("crc32 mismatch"), "{}", err);
}

#[test]
fn test_crc_accepts_0x_prefix() {
    let corpus = CorpusDir::new();
    corpus.blob("ten.bin", &[0x0A, 0x00]);
    corpus.manifest(
        "corpus.json",
        json!({
            "version": 1,
            "vectors": [{"name": "ten", "type": "u16", "binary": "ten.bin", "value": 10,
                         "crc32": format!("0x{}", crc32_hex(&[0x0A, 0x00]))}]
        }),
    );
    assert_eq!(corpus.load().unwrap().len(), 1);
}

#[test]
fn test_duplicate_case_across_include() {
    let corpus = CorpusDir::new();
    corpus.blob("one.bin", &[1]);
    corpus.manifest(
        "corpus.json",
        json!({"version": 1, "include": ["more.json"],
               "vectors": [{"name": "one", "type": "u8", "binary": "one.bin", "value": 1}]}),
    );
    corpus.manifest(
        "more.json",
        json!({"version": 1,
               "vectors": [{"name": "one", "type": "u8", "binary": "one.bin", "value": 1}]}),
    );
    let err = corpus.load().unwrap_err().to_string();
    assert!(err.contains("duplicate case name 'one'"), "{}", err);
}

#[test]
fn test_include_cycle_rejected() {
    let corpus = CorpusDir::new();
    corpus.manifest("corpus.json", json!({"version": 1, "include": ["b.json"]}));
    corpus.manifest("b.json", json!({"version": 1, "include": ["corpus.json"]}));
    let err = corpus.load().unwrap_err().to_string();
    assert!(err.contains("included more than once"), "{}", err);
}

#[test]
fn test_recursive_type_rejected() {
    let corpus = CorpusDir::new();
    corpus.manifest(
        "corpus.json",
        json!({"version": 1, "types": {
            "A": {"struct": {"fields": [{"name": "b", "type": {"ref": "B"}}]}},
            "B": {"fixed_array": {"elem": {"ref": "A"}, "count": 2}}
        }}),
    );
    let err = corpus.load().unwrap_err().to_string();
    assert!(err.contains("recursive type: A -> B -> A"), "{}", err);
}

#[test]
fn test_unknown_type_rejected() {
    let corpus = CorpusDir::new();
    corpus.blob("x.bin", &[0]);
    corpus.manifest(
        "corpus.json",
        json!({"version": 1,
               "vectors": [{"name": "x", "type": "Mystery", "binary": "x.bin", "value": 0}]}),
    );
    let err = corpus.load().unwrap_err().to_string();
    assert!(err.contains("unknown type 'Mystery'"), "{}", err);
}

#[test]
fn test_union_vector_needs_active_variant() {
    let corpus = CorpusDir::new();
    corpus.blob("u.bin", &[0xD6, 0xFF, 0xFF, 0xFF]);
    corpus.manifest(
        "corpus.json",
        json!({"version": 1,
               "types": {"U": {"union": {"variants": [
                   {"name": "int_value", "type": {"primitive": "i32"}},
                   {"name": "float_value", "type": {"primitive": "f32"}}
               ]}}},
               "vectors": [{"name": "u", "type": "U", "binary": "u.bin", "value": -42}]}),
    );
    let err = corpus.load().unwrap_err().to_string();
    assert!(err.contains("union encoding needs an active variant"), "{}", err);
}

#[test]
fn test_unsupported_version_rejected() {
    let corpus = CorpusDir::new();
    corpus.manifest("corpus.json", json!({"version": 2}));
    let err = corpus.load().unwrap_err().to_string();
    assert!(err.contains("unsupported manifest version 2"), "{}", err);
}
