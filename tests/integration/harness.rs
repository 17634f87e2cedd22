// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Harness behavior: divergence detection, isolation, timeouts, ordering.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::{load_sample, reference, u16_vector};
use codec_parity::testing::{
    FailingAdapter, FnAdapter, LifecycleAdapter, LifecycleCounter, SlowAdapter, SwappedEndianAdapter,
};
use codec_parity::{
    run, AdapterFailure, Corpus, FindingKind, Harness, HarnessConfig, HarnessError, Mode, Phase,
    ReferenceAdapter, Subject, Value,
};

fn five_vectors() -> Corpus {
    Corpus::from_vectors((1..=5).map(|i| u16_vector(&format!("v{}", i), i)).collect()).unwrap()
}

fn config(mode: Mode) -> HarnessConfig {
    HarnessConfig {
        mode,
        ..HarnessConfig::default()
    }
}

// ============================================================================
// DIVERGENCE DETECTION
// ============================================================================

#[test]
fn test_sample_corpus_is_clean_against_reference() {
    let corpus = load_sample();
    let report = run(&corpus, reference("rust"), reference("typescript"), Mode::Parity).unwrap();
    let findings: Vec<String> = report.findings().map(|(r, f)| format!("{}: {}", r.case_name, f)).collect();
    assert!(findings.is_empty(), "{:#?}", findings);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn test_big_endian_adapter_in_both_modes() {
    let corpus = Corpus::from_vectors(vec![u16_vector("u16/ten", 10)]).unwrap();
    for mode in [Mode::Validate, Mode::Parity] {
        let report = run(
            &corpus,
            Arc::new(SwappedEndianAdapter::new("a")),
            reference("b"),
            mode,
        )
        .unwrap();

        let a_findings: Vec<_> = report
            .findings()
            .filter(|(_, f)| f.subject == Subject::Adapter("a".into()))
            .collect();
        let encode = a_findings
            .iter()
            .find(|(_, f)| f.phase == Phase::Encode)
            .expect("encode mismatch for a");
        let FindingKind::ByteMismatch(m) = &encode.1.kind else {
            panic!("expected byte mismatch, got {:?}", encode.1.kind);
        };
        assert_eq!((m.offset, m.expected_byte, m.actual_byte), (0, Some(0x0A), Some(0x00)));

        assert!(!report.findings().any(|(_, f)| f.subject == Subject::Adapter("b".into())));
        assert_eq!(report.exit_code(), 1);

        let pair_findings = report
            .findings()
            .filter(|(_, f)| matches!(f.subject, Subject::Pair(..)))
            .count();
        match mode {
            Mode::Validate => assert_eq!(pair_findings, 0),
            Mode::Parity => assert!(pair_findings > 0),
        }
    }
}

#[test]
fn test_single_byte_vectors_survive_swapped_endian() {
    let corpus = load_sample();
    let report = Harness::new(config(Mode::Validate))
        .with_adapter(SwappedEndianAdapter::new("be"))
        .run(&corpus)
        .unwrap();
    assert!(report.result("arrays/u8_array_4").unwrap().passed());
    assert!(report.result("enums/none").unwrap().passed());
    assert!(!report.result("scalars/u32_le").unwrap().passed());
    assert!(!report.result("primitives/common_values").unwrap().passed());
}

#[test]
fn test_cross_parity_pair_subject() {
    let corpus = Corpus::from_vectors(vec![u16_vector("ten", 10)]).unwrap();
    let report = Harness::new(config(Mode::Parity))
        .with_adapter(ReferenceAdapter::named("rust"))
        .with_adapter(SwappedEndianAdapter::new("ts"))
        .with_adapter(ReferenceAdapter::named("go"))
        .run(&corpus)
        .unwrap();
    let pairs: Vec<String> = report
        .findings()
        .filter(|(_, f)| f.phase == Phase::CrossParityEncode)
        .map(|(_, f)| f.subject.to_string())
        .collect();
    assert_eq!(pairs, vec!["rust<>ts", "ts<>go"]);
}

#[test]
fn test_oracle_disagreement_is_reported() {
    let mut vector = u16_vector("lying", 10);
    vector.canonical_bytes = vec![0x0B, 0x00];
    let corpus = Corpus::from_vectors(vec![vector]).unwrap();
    let report = Harness::new(config(Mode::Validate))
        .with_adapter(ReferenceAdapter::new())
        .run(&corpus)
        .unwrap();
    assert!(report
        .findings()
        .any(|(_, f)| f.subject == Subject::Oracle && f.phase == Phase::Encode));
    assert!(report
        .findings()
        .any(|(_, f)| f.subject == Subject::Oracle && f.phase == Phase::Decode));
}

#[test]
fn test_roundtrip_catches_lossy_decode() {
    let corpus = five_vectors();
    let lossy = FnAdapter::new("lossy").on_decode(|_, bytes, _| {
        let raw = u16::from_le_bytes([bytes[0], bytes[1]]);
        Ok(Value::U16(raw.wrapping_add(1)))
    });

    let without = Harness::new(config(Mode::Validate))
        .with_adapter(FnAdapter::new("lossy").on_decode(|_, bytes, _| {
            Ok(Value::U16(u16::from_le_bytes([bytes[0], bytes[1]]).wrapping_add(1)))
        }))
        .run(&corpus)
        .unwrap();
    assert!(!without.findings().any(|(_, f)| f.phase == Phase::Reencode));

    let with = Harness::new(HarnessConfig {
        roundtrip: true,
        ..HarnessConfig::default()
    })
    .with_adapter(lossy)
    .run(&corpus)
    .unwrap();
    assert_eq!(with.findings().filter(|(_, f)| f.phase == Phase::Reencode).count(), 5);
}

// ============================================================================
// ISOLATION
// ============================================================================

#[test]
fn test_no_early_abort() {
    let corpus = five_vectors();
    let flaky = FnAdapter::new("flaky").on_encode(|desc, value, ctx| {
        if *value == Value::U16(3) {
            return Err(AdapterFailure::failed("cannot encode 3"));
        }
        Ok(codec_parity::encode(desc, value, ctx)?)
    });
    let report = Harness::new(config(Mode::Validate))
        .with_adapter(flaky)
        .run(&corpus)
        .unwrap();

    assert_eq!(report.total(), 5);
    let passed: Vec<bool> = report.results.iter().map(|r| r.passed()).collect();
    assert_eq!(passed, vec![true, true, false, true, true]);
    let failed = report.result("v3").unwrap();
    assert_eq!(failed.findings.len(), 1);
    assert_eq!(failed.findings[0].kind.class(), "adapter-error");
    assert_eq!(failed.findings[0].phase, Phase::Encode);
}

#[test]
fn test_failing_adapter_does_not_taint_the_other() {
    let corpus = load_sample();
    let report = Harness::new(config(Mode::Parity))
        .with_adapter(FailingAdapter::new("broken", "runtime exploded"))
        .with_adapter(ReferenceAdapter::named("rust"))
        .run(&corpus)
        .unwrap();

    assert_eq!(report.total(), corpus.len());
    assert!(!report.findings().any(|(_, f)| f.subject.involves("rust")));
    // Two calls per vector, both failed; nothing to cross-check.
    assert_eq!(report.finding_count(), 2 * corpus.len());
    let (_, first) = report.findings().next().unwrap();
    let FindingKind::Adapter(err) = &first.kind else {
        panic!("expected adapter error, got {:?}", first.kind);
    };
    assert_eq!(err.ecosystem, "broken");
    assert_eq!(err.case_name, corpus.vectors[0].case_name);
    assert_eq!(err.message, "runtime exploded");
}

#[test]
fn test_panicking_adapter_is_a_finding() {
    let corpus = Corpus::from_vectors(vec![u16_vector("ten", 10)]).unwrap();
    let report = Harness::new(config(Mode::Validate))
        .with_adapter(FnAdapter::new("panicky").on_decode(|_, _, _| panic!("decoder bug")))
        .run(&corpus)
        .unwrap();
    let messages: Vec<String> = report.findings().map(|(_, f)| f.to_string()).collect();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("adapter panicked"), "{}", messages[0]);
}

// ============================================================================
// TIMEOUTS
// ============================================================================

#[test]
fn test_hung_adapter_times_out() {
    let corpus = Corpus::from_vectors(vec![u16_vector("a", 1), u16_vector("b", 2)]).unwrap();
    let start = Instant::now();
    let report = Harness::new(HarnessConfig {
        call_timeout: Duration::from_millis(50),
        jobs: Some(2),
        ..HarnessConfig::default()
    })
    .with_adapter(SlowAdapter::new("sleepy", Duration::from_secs(2)))
    .with_adapter(ReferenceAdapter::named("rust"))
    .run(&corpus)
    .unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
    let timeouts: Vec<_> = report
        .findings()
        .filter_map(|(_, f)| match &f.kind {
            FindingKind::Timeout {
                ecosystem,
                timeout_ms,
                ..
            } => Some((ecosystem.clone(), *timeout_ms)),
            _ => None,
        })
        .collect();
    assert_eq!(timeouts.len(), 4);
    assert!(timeouts.iter().all(|(e, ms)| e == "sleepy" && *ms == 50));
    assert!(!report.findings().any(|(_, f)| f.subject.involves("rust")));
}

// ============================================================================
// ORDERING
// ============================================================================

#[test]
fn test_results_in_corpus_order_under_parallelism() {
    let vectors: Vec<_> = (0..64u16).map(|i| u16_vector(&format!("case/{:02}", i), i)).collect();
    let corpus = Corpus::from_vectors(vectors).unwrap();
    // Early vectors are slowest, so completion order is roughly reversed.
    let skewed = FnAdapter::new("skewed").on_encode(|desc, value, ctx| {
        if let Value::U16(i) = value {
            std::thread::sleep(Duration::from_millis(u64::from(64 - *i) / 8));
        }
        Ok(codec_parity::encode(desc, value, ctx)?)
    });

    let report = Harness::new(HarnessConfig {
        jobs: Some(8),
        ..HarnessConfig::default()
    })
    .with_adapter(skewed)
    .run(&corpus)
    .unwrap();

    let indices: Vec<usize> = report.results.iter().map(|r| r.index).collect();
    assert_eq!(indices, (0..64).collect::<Vec<_>>());
    let names: Vec<&str> = report.results.iter().map(|r| r.case_name.as_str()).collect();
    let expected: Vec<&str> = corpus.iter().map(|v| v.case_name.as_str()).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_parallel_and_sequential_agree() {
    let corpus = load_sample();
    let run_with = |jobs| {
        Harness::new(HarnessConfig {
            mode: Mode::Parity,
            jobs: Some(jobs),
            ..HarnessConfig::default()
        })
        .with_adapter(SwappedEndianAdapter::new("be"))
        .with_adapter(ReferenceAdapter::named("le"))
        .run(&corpus)
        .unwrap()
    };
    let one = run_with(1);
    let many = run_with(4);
    let summarize = |r: &codec_parity::ParityReport| -> Vec<String> {
        r.findings().map(|(v, f)| format!("{} {}", v.case_name, f)).collect()
    };
    assert_eq!(summarize(&one), summarize(&many));
}

// ============================================================================
// LIFECYCLE AND CONFIGURATION
// ============================================================================

#[test]
fn test_adapters_released_after_run() {
    let counter = LifecycleCounter::default();
    let report = Harness::new(config(Mode::Validate))
        .with_adapter(LifecycleAdapter::new("tracked", counter.clone()))
        .run(&five_vectors())
        .unwrap();
    assert!(report.success());
    assert_eq!((counter.acquired(), counter.released()), (1, 1));
}

#[test]
fn test_start_failure_releases_earlier_adapters() {
    let first = LifecycleCounter::default();
    let second = LifecycleCounter::default();
    let err = Harness::new(config(Mode::Parity))
        .with_adapter(LifecycleAdapter::new("first", first.clone()))
        .with_adapter(LifecycleAdapter::new("second", second.clone()).refusing_start())
        .run(&five_vectors())
        .unwrap_err();

    assert!(matches!(err, HarnessError::InvalidConfig(ref m) if m.contains("second")));
    assert_eq!((first.acquired(), first.released()), (1, 1));
    assert_eq!((second.acquired(), second.released()), (0, 0));
}

#[test]
fn test_invalid_configurations_are_fatal() {
    let corpus = five_vectors();
    assert!(Harness::new(config(Mode::Validate)).run(&corpus).is_err());
    assert!(Harness::new(HarnessConfig {
        call_timeout: Duration::ZERO,
        ..HarnessConfig::default()
    })
    .with_adapter(ReferenceAdapter::new())
    .run(&corpus)
    .is_err());
    assert!(Harness::new(HarnessConfig {
        jobs: Some(0),
        ..HarnessConfig::default()
    })
    .with_adapter(ReferenceAdapter::new())
    .run(&corpus)
    .is_err());
}

#[test]
fn test_empty_corpus_succeeds() {
    let corpus = Corpus::from_vectors(Vec::new()).unwrap();
    let report = Harness::new(config(Mode::Validate))
        .with_adapter(ReferenceAdapter::new())
        .run(&corpus)
        .unwrap();
    assert!(report.success());
    assert_eq!(report.total(), 0);
}
