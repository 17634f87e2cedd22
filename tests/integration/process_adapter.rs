// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! External-process adapters, driven by small shell scripts.

#![cfg(unix)]

use std::fs;
use std::time::{Duration, Instant};

use crate::common::u16_vector;
use codec_parity::{
    AdapterFailure, CodecAdapter, Corpus, FindingKind, Harness, HarnessConfig, PrimitiveKind,
    ProcessAdapter, TypeDescriptor, Value, VariantContext,
};

/// `sh -c SCRIPT`, with `$1` bound to `arg`.
fn shell(name: &str, script: &str, arg: &str) -> ProcessAdapter {
    ProcessAdapter::new(name, "sh").args(["-c", script, name, arg])
}

/// Answers every encode with `hex` and every decode with `value`.
fn fixed_answers(name: &str, hex: &str, value: &str) -> ProcessAdapter {
    let script = format!(
        r#"input=$(cat)
case "$input" in
  *'"op":"encode"'*) echo '{{"ok":true,"hex":"{}"}}' ;;
  *) echo '{{"ok":true,"value":{}}}' ;;
esac"#,
        hex, value
    );
    shell(name, &script, "")
}

fn u16_desc() -> TypeDescriptor {
    TypeDescriptor::primitive(PrimitiveKind::U16)
}

#[test]
fn test_correct_process_codec_passes() {
    let corpus = Corpus::from_vectors(vec![u16_vector("u16/ten", 10)]).unwrap();
    let report = Harness::new(HarnessConfig::default())
        .with_adapter(fixed_answers("ts", "0a00", "10"))
        .run(&corpus)
        .unwrap();
    let findings: Vec<String> = report.findings().map(|(_, f)| f.to_string()).collect();
    assert!(report.success(), "{:#?}", findings);
}

#[test]
fn test_big_endian_process_codec_flagged() {
    let corpus = Corpus::from_vectors(vec![u16_vector("u16/ten", 10)]).unwrap();
    let report = Harness::new(HarnessConfig::default())
        .with_adapter(fixed_answers("ts", "000a", "2560"))
        .run(&corpus)
        .unwrap();
    let classes: Vec<&str> = report.findings().map(|(_, f)| f.kind.class()).collect();
    assert_eq!(classes, vec!["byte-mismatch", "value-mismatch"]);
    let (_, first) = report.findings().next().unwrap();
    let FindingKind::ByteMismatch(m) = &first.kind else {
        panic!("expected byte mismatch");
    };
    assert_eq!(m.offset, 0);
    assert_eq!(m.actual_hex, "000a");
}

#[test]
fn test_request_carries_type_value_and_variants() {
    let dir = tempfile::tempdir().unwrap();
    let capture = dir.path().join("request.json");
    let adapter = shell(
        "capture",
        r#"cat > "$1"; echo '{"ok":true,"hex":"d6ffffff"}'"#,
        capture.to_str().unwrap(),
    );
    let desc = codec_parity::testing::simple_union();
    let ctx = VariantContext::root("int_value");

    let bytes = adapter.encode(&desc, &Value::I32(-42), &ctx).unwrap();
    assert_eq!(bytes, vec![0xD6, 0xFF, 0xFF, 0xFF]);

    let request: serde_json::Value = serde_json::from_str(&fs::read_to_string(&capture).unwrap()).unwrap();
    assert_eq!(request["op"], "encode");
    assert_eq!(request["value"], -42);
    assert_eq!(request["variants"], serde_json::json!({"": "int_value"}));
    assert!(request["type"]["union"]["variants"].is_array());
}

#[test]
fn test_decode_request_sends_hex() {
    let dir = tempfile::tempdir().unwrap();
    let capture = dir.path().join("request.json");
    let adapter = shell(
        "capture",
        r#"cat > "$1"; echo '{"ok":true,"value":10}'"#,
        capture.to_str().unwrap(),
    );
    let value = adapter
        .decode(&u16_desc(), &[0x0A, 0x00], &VariantContext::new())
        .unwrap();
    assert_eq!(value, Value::U16(10));
    let request: serde_json::Value = serde_json::from_str(&fs::read_to_string(&capture).unwrap()).unwrap();
    assert_eq!(request["op"], "decode");
    assert_eq!(request["hex"], "0a00");
}

fn failure_of(adapter: &ProcessAdapter) -> String {
    match adapter.encode(&u16_desc(), &Value::U16(10), &VariantContext::new()) {
        Err(AdapterFailure::Failed(message)) => message,
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_nonzero_exit_is_a_failure() {
    let adapter = shell("crashy", "cat >/dev/null; echo 'segfault in writer' >&2; exit 3", "");
    let message = failure_of(&adapter);
    assert!(message.contains("exited with"), "{}", message);
    assert!(message.contains("segfault in writer"), "{}", message);
}

#[test]
fn test_malformed_response_is_a_failure() {
    let adapter = shell("garbled", "cat >/dev/null; echo 'not json at all'", "");
    let message = failure_of(&adapter);
    assert!(message.starts_with("malformed response"), "{}", message);
}

#[test]
fn test_codec_error_is_passed_through() {
    let adapter = shell(
        "picky",
        r#"cat >/dev/null; echo '{"ok":false,"error":"RangeError: offset out of bounds"}'"#,
        "",
    );
    assert_eq!(failure_of(&adapter), "RangeError: offset out of bounds");
}

#[test]
fn test_missing_hex_is_a_failure() {
    let adapter = shell("empty", r#"cat >/dev/null; echo '{"ok":true}'"#, "");
    assert!(failure_of(&adapter).contains("no 'hex'"));
}

#[test]
fn test_deadline_kills_child() {
    let adapter = shell("hung", "exec sleep 5", "").with_deadline(Duration::from_millis(100));
    let start = Instant::now();
    let err = adapter
        .encode(&u16_desc(), &Value::U16(10), &VariantContext::new())
        .unwrap_err();
    assert_eq!(err, AdapterFailure::TimedOut(Duration::from_millis(100)));
    assert!(start.elapsed() < Duration::from_secs(4));
    assert_eq!(adapter.live_children(), 0);
}

#[test]
fn test_parse_spec_runs_program() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("codec.sh");
    fs::write(&script, "cat >/dev/null\necho '{\"ok\":true,\"hex\":\"0a00\"}'\n").unwrap();
    let adapter = ProcessAdapter::parse(&format!("script=sh {}", script.display())).unwrap();
    let bytes = adapter
        .encode(&u16_desc(), &Value::U16(10), &VariantContext::new())
        .unwrap();
    assert_eq!(bytes, vec![0x0A, 0x00]);
}
