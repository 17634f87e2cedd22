// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Custom cargo commands for codec-parity.
//!
//! Usage:
//!   cargo xtask verify    - Run full verification suite
//!   cargo xtask test      - Run all tests
//!   cargo xtask corpus    - Check the sample corpus against the reference codec
//!   cargo xtask kani      - Run the Kani proofs (needs cargo-kani)
//!   cargo xtask check     - Quick check (no Kani)

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn main() -> Result<()> {
    let task = env::args().nth(1);
    match task.as_deref() {
        Some("verify") => verify()?,
        Some("test") => test()?,
        Some("corpus") => corpus()?,
        Some("kani") => kani()?,
        Some("check") => check()?,
        Some("bench") => bench()?,
        _ => print_help(),
    }
    Ok(())
}

fn print_help() {
    eprintln!(
        r#"
cargo xtask <COMMAND>

Commands:
  verify    Run full verification suite (contracts + tests + clippy + corpus + Kani)
  test      Run all Rust tests, with and without the parallel feature
  corpus    Run the sample corpus through the reference adapter
  kani      Run the Kani proofs only
  check     Quick check (cargo test + clippy, no Kani)
  bench     Run benchmarks
"#
    );
}

/// Full verification suite
fn verify() -> Result<()> {
    println!("==========================================");
    println!("codec-parity Verification Suite");
    println!("==========================================\n");

    println!("[1/5] Checking runtime contracts are wired in...");
    check_contracts_called()?;
    println!("✓ Every contract has a call site\n");

    println!("[2/5] Running Rust tests...");
    test()?;
    println!("✓ All Rust tests passed\n");

    println!("[3/5] Running clippy...");
    run_cargo(&["clippy", "--quiet", "--all-targets", "--", "-D", "warnings"])?;
    println!("✓ Clippy passed\n");

    println!("[4/5] Checking the sample corpus...");
    corpus()?;
    println!("✓ Sample corpus matches the reference codec\n");

    println!("[5/5] Running Kani proofs...");
    kani()?;
    println!("✓ Kani proofs done\n");

    println!("==========================================");
    println!("✓ ALL VERIFICATION CHECKS PASSED");
    println!("==========================================");

    Ok(())
}

/// Run all tests, in both harness scheduling modes
fn test() -> Result<()> {
    run_cargo(&["test", "--quiet"])?;
    run_cargo(&["test", "--quiet", "--no-default-features"])
}

/// The checked-in corpus must be clean against the canonical codec.
fn corpus() -> Result<()> {
    let root = project_root()?;
    let corpus_dir = root.join("data/corpus");
    if !corpus_dir.join("corpus.json").exists() {
        bail!("no sample corpus at {}", corpus_dir.display());
    }
    run_cargo(&[
        "run",
        "--quiet",
        "--",
        "run",
        &corpus_dir.to_string_lossy(),
        "--reference",
        "--roundtrip",
    ])
}

/// Run the Kani proofs
fn kani() -> Result<()> {
    let proofs_dir = project_root()?.join("kani-proofs");
    if !has_cargo_subcommand("kani") {
        println!("  (cargo-kani not installed, skipping)");
        return Ok(());
    }

    let status = Command::new("cargo")
        .arg("kani")
        .current_dir(&proofs_dir)
        .status()
        .context("Failed to run cargo kani")?;

    if !status.success() {
        bail!("Kani proofs failed");
    }

    Ok(())
}

/// Quick check (no Kani)
fn check() -> Result<()> {
    println!("Running quick checks...\n");

    println!("[1/3] cargo check...");
    run_cargo(&["check", "--all-targets"])?;

    println!("[2/3] cargo test...");
    run_cargo(&["test", "--quiet"])?;

    println!("[3/3] cargo clippy...");
    run_cargo(&["clippy", "--quiet", "--", "-D", "warnings"])?;

    println!("\n✓ Quick checks passed");
    Ok(())
}

/// Run benchmarks
fn bench() -> Result<()> {
    run_cargo(&["bench"])
}

// ============================================================================
// Helper functions
// ============================================================================

fn project_root() -> Result<PathBuf> {
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => env::current_dir().context("no current directory")?,
    };

    // xtask is in project_root/xtask, so go up one level
    let root = manifest_dir.parent().unwrap_or(&manifest_dir);
    Ok(root.to_path_buf())
}

fn run_cargo(args: &[&str]) -> Result<()> {
    let root = project_root()?;

    let status = Command::new("cargo")
        .args(args)
        .current_dir(&root)
        .status()
        .with_context(|| format!("Failed to run cargo {:?}", args))?;

    if !status.success() {
        bail!("cargo {:?} failed", args);
    }

    Ok(())
}

fn has_cargo_subcommand(name: &str) -> bool {
    Command::new("cargo")
        .args([name, "--version"])
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Contract functions listed in the `contracts.rs` table.
fn contract_names(contracts: &str) -> Vec<String> {
    contracts
        .lines()
        .filter(|line| line.starts_with("//! | `"))
        .filter_map(|line| line.split('`').nth(1))
        .map(str::to_string)
        .collect()
}

/// Every documented contract must be called from somewhere outside
/// `contracts.rs`, or the invariant it guards is unchecked.
fn check_contracts_called() -> Result<()> {
    let src = project_root()?.join("src");
    let contracts = fs::read_to_string(src.join("contracts.rs")).context("Failed to read contracts.rs")?;
    let names = contract_names(&contracts);
    if names.is_empty() {
        bail!("contracts.rs lists no contracts; the invariants table is gone");
    }

    let mut sources = Vec::new();
    collect_sources(&src, &mut sources)?;
    let callers: Vec<String> = sources
        .iter()
        .filter(|path| !path.ends_with("contracts.rs"))
        .map(fs::read_to_string)
        .collect::<Result<_, _>>()
        .context("Failed to read sources")?;

    let missing: Vec<&String> = names
        .iter()
        .filter(|name| !callers.iter().any(|text| text.contains(&format!("{}(", name))))
        .collect();
    if !missing.is_empty() {
        bail!("contracts with no call site: {:?}", missing);
    }
    Ok(())
}

fn collect_sources(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            collect_sources(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
    Ok(())
}
