// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the codec-parity command-line interface.
//!
//! Three subcommands: `run` checks generated codecs against a corpus, `layout`
//! prints where every field of a corpus type lands, and `decode` reads a blob
//! with the canonical codec. Flags on `run` override the corpus manifest's
//! `settings`, which override the built-in defaults.

pub mod display;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "codec-parity",
    about = "Bit-for-bit parity verification for generated binary codecs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log at info level (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit diagnostics as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Args)]
pub struct RunArgs {
    /// Corpus directory (containing corpus.json) or manifest file
    pub corpus: PathBuf,

    /// Parity mode: also compare adapters against each other
    #[arg(long, conflicts_with = "mode")]
    pub parity: bool,

    /// Harness mode: validate or parity
    #[arg(long)]
    pub mode: Option<String>,

    /// External codec as NAME=PROGRAM [ARGS...] (repeatable)
    ///
    /// The program receives one JSON request on stdin per call and answers
    /// with one JSON response on stdout.
    #[arg(short, long = "adapter", value_name = "NAME=CMD")]
    pub adapters: Vec<String>,

    /// Add the canonical codec as an adapter named "reference"
    #[arg(long)]
    pub reference: bool,

    /// Per-call adapter timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Worker threads (default: all cores)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Re-encode each adapter's decoded value and compare again
    #[arg(long)]
    pub roundtrip: bool,

    /// Only run vectors whose case name starts with PREFIX
    #[arg(long, value_name = "PREFIX")]
    pub filter: Option<String>,

    /// Write the JSON report to FILE
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every corpus vector through the oracle and each adapter
    Run(RunArgs),

    /// Print the byte layout of corpus types
    Layout {
        /// Corpus directory or manifest file
        corpus: PathBuf,

        /// Type to describe (default: every type)
        #[arg(value_name = "TYPE")]
        type_name: Option<String>,

        /// Variant selection as PATH=NAME, or NAME for the root (repeatable)
        #[arg(long = "variant", value_name = "PATH=NAME")]
        variants: Vec<String>,
    },

    /// Decode a blob with the canonical codec and print it as JSON
    Decode {
        /// Corpus directory or manifest file
        corpus: PathBuf,

        /// Type name from the corpus
        #[arg(value_name = "TYPE")]
        type_name: String,

        /// Binary file to decode
        file: PathBuf,

        /// Variant selection as PATH=NAME, or NAME for the root (repeatable)
        #[arg(long = "variant", value_name = "PATH=NAME")]
        variants: Vec<String>,
    },
}
