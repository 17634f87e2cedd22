// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use codec_parity::codec::json::value_to_json;
use codec_parity::corpus::Settings;
use codec_parity::report::render::{summary_lines, vector_lines};
use codec_parity::{
    decode_prefix, describe, Corpus, Harness, HarnessConfig, Mode, ParityReport, ProcessAdapter,
    ReferenceAdapter, TypeDescriptor, VariantContext, EXIT_FATAL, EXIT_SUCCESS,
};

mod cli;
use cli::display::{self, pad_right, row, section_bot, section_top, type_label, verdict};
use cli::{Cli, Commands, RunArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let outcome = match cli.command {
        Commands::Run(args) => run_corpus(&args, cli.verbose),
        Commands::Layout {
            corpus,
            type_name,
            variants,
        } => print_layout(&corpus, type_name.as_deref(), &variants).map(|()| EXIT_SUCCESS),
        Commands::Decode {
            corpus,
            type_name,
            file,
            variants,
        } => decode_blob(&corpus, &type_name, &file, &variants).map(|()| EXIT_SUCCESS),
    };

    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{} {:#}", display::themed(display::RED, &[display::BOLD], "error:"), err);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// `RUST_LOG` when set, else `info` under `--verbose`, else `warn`.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    // A second init (tests, embedding) is harmless; keep the first subscriber.
    let _ = if json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
}

fn variant_context(selections: &[String]) -> VariantContext {
    selections
        .iter()
        .map(|s| VariantContext::parse_selection(s))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// RUN
// ═══════════════════════════════════════════════════════════════════════════

/// CLI flags over manifest settings over defaults.
fn harness_config(args: &RunArgs, settings: &Settings) -> Result<HarnessConfig> {
    let mut config = HarnessConfig::from_settings(settings)?;
    if args.parity {
        config.mode = Mode::Parity;
    } else if let Some(mode) = &args.mode {
        config.mode = mode.parse()?;
    }
    if let Some(ms) = args.timeout_ms {
        config.call_timeout = Duration::from_millis(ms);
    }
    if args.jobs.is_some() {
        config.jobs = args.jobs;
    }
    if args.roundtrip {
        config.roundtrip = true;
    }
    Ok(config)
}

fn run_corpus(args: &RunArgs, verbose: bool) -> Result<u8> {
    let mut corpus = Corpus::load(&args.corpus)?;
    if let Some(prefix) = &args.filter {
        corpus = corpus.filter(prefix);
    }
    let config = harness_config(args, &corpus.settings)?;
    let deadline = config.call_timeout;

    let mut harness = Harness::new(config);
    for spec in &args.adapters {
        harness = harness.with_adapter(ProcessAdapter::parse(spec)?.with_deadline(deadline));
    }
    if args.reference {
        harness = harness.with_adapter(ReferenceAdapter::new());
    }

    info!(
        corpus = %args.corpus.display(),
        vectors = corpus.len(),
        "starting parity run"
    );
    let report = execute(&harness, &corpus)?;

    print_report(&report, verbose);
    if let Some(path) = &args.output {
        report
            .write_json(path)
            .with_context(|| format!("cannot write report to {}", path.display()))?;
        info!(path = %path.display(), "wrote JSON report");
    }
    Ok(report.exit_code())
}

#[cfg(feature = "parallel")]
fn execute(harness: &Harness, corpus: &Corpus) -> Result<ParityReport> {
    use indicatif::{ProgressBar, ProgressStyle};

    if !atty::is(atty::Stream::Stderr) {
        return Ok(harness.run(corpus)?);
    }
    let progress = ProgressBar::new(corpus.len() as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:<10} [{bar:40.cyan/dim}] {pos}/{len} {msg}",
    ) {
        progress.set_style(style.progress_chars("━━╸"));
    }
    progress.set_prefix("Vectors");
    let report = harness.run_with_progress(corpus, &progress);
    progress.finish_and_clear();
    Ok(report?)
}

#[cfg(not(feature = "parallel"))]
fn execute(harness: &Harness, corpus: &Corpus) -> Result<ParityReport> {
    Ok(harness.run(corpus)?)
}

fn print_report(report: &ParityReport, verbose: bool) {
    for line in vector_lines(report, verbose) {
        println!("{}", display::log_line(&line));
    }
    if !report.results.is_empty() && (verbose || !report.success()) {
        println!();
    }
    for line in summary_lines(report) {
        println!("{}", display::log_line(&line));
    }
    println!("{}", verdict(report.success()));
}

// ═══════════════════════════════════════════════════════════════════════════
// LAYOUT
// ═══════════════════════════════════════════════════════════════════════════

fn print_layout(corpus_path: &Path, type_name: Option<&str>, variants: &[String]) -> Result<()> {
    let corpus = Corpus::load(corpus_path)?;
    let ctx = variant_context(variants);

    match type_name {
        Some(name) => {
            let desc = lookup_type(&corpus, name)?;
            print_type_layout(name, &desc, &ctx)?;
        }
        None => {
            if corpus.types.is_empty() {
                println!("corpus declares no types");
            }
            for (name, desc) in &corpus.types {
                // One type needing a variant must not hide the rest.
                if let Err(err) = print_type_layout(name, desc, &ctx) {
                    warn!(type_name = %name, error = %err, "cannot lay out type");
                    section_top(name);
                    row(&display::themed(display::YELLOW, &[], &format!("{:#}", err)));
                    section_bot();
                }
            }
        }
    }
    Ok(())
}

fn print_type_layout(name: &str, desc: &TypeDescriptor, ctx: &VariantContext) -> Result<()> {
    let rows = describe(desc, ctx).with_context(|| format!("layout of '{}'", name))?;
    section_top(&format!("{} ({})", name, desc));
    row(&display::themed(
        display::GRAY,
        &[],
        &format!("{}  {:>6}  {:>6}  type", pad_right("path", 32), "offset", "size"),
    ));
    for layout_row in rows {
        let path = if layout_row.path.is_empty() {
            "<root>".to_string()
        } else {
            layout_row.path.clone()
        };
        let indented = format!("{}{}", "  ".repeat(layout_row.depth), path);
        row(&format!(
            "{}  {:>6}  {:>6}  {}",
            pad_right(&indented, 32),
            layout_row.offset,
            layout_row.size,
            type_label(&layout_row.ty)
        ));
    }
    section_bot();
    Ok(())
}

fn lookup_type(corpus: &Corpus, name: &str) -> Result<Arc<TypeDescriptor>> {
    corpus.type_named(name).ok_or_else(|| {
        let known: Vec<&str> = corpus.types.keys().map(String::as_str).collect();
        anyhow!("unknown type '{}' (corpus declares: {})", name, known.join(", "))
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// DECODE
// ═══════════════════════════════════════════════════════════════════════════

fn decode_blob(corpus_path: &Path, type_name: &str, file: &Path, variants: &[String]) -> Result<()> {
    let corpus = Corpus::load(corpus_path)?;
    let desc = lookup_type(&corpus, type_name)?;
    let ctx = variant_context(variants);

    let bytes = fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
    let (value, consumed) = decode_prefix(&desc, &bytes, &ctx)
        .with_context(|| format!("decoding {} as '{}'", file.display(), type_name))?;
    if consumed == 0 && !bytes.is_empty() {
        bail!("'{}' consumed no bytes", type_name);
    }
    if consumed < bytes.len() {
        eprintln!(
            "{}",
            display::themed(
                display::YELLOW,
                &[],
                &format!("{} trailing bytes after {} consumed", bytes.len() - consumed, consumed)
            )
        );
    }

    let json = value_to_json(&desc, &value, &ctx);
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
