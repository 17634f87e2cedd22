// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Shared test utilities and fixtures.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use codec_parity::{CodecAdapter, Corpus, ReferenceAdapter};

// Re-export canonical test utilities from codec_parity::testing
pub use codec_parity::testing::{
    all_primitives, canonical_vector, point2d, rectangle, simple_enum, simple_struct, simple_union,
    u16_vector,
};

/// The checked-in sample corpus.
pub const SAMPLE_CORPUS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/corpus");

pub fn load_sample() -> Corpus {
    Corpus::load(SAMPLE_CORPUS).expect("sample corpus loads")
}

pub fn reference(name: &str) -> Arc<dyn CodecAdapter> {
    Arc::new(ReferenceAdapter::named(name))
}

pub fn crc32_hex(bytes: &[u8]) -> String {
    format!("{:08x}", crc32fast::hash(bytes))
}

/// A corpus on disk: manifests plus blobs, in a temporary directory.
pub struct CorpusDir {
    pub dir: tempfile::TempDir,
}

impl CorpusDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn manifest(&self, name: &str, json: serde_json::Value) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
        path
    }

    pub fn blob(&self, name: &str, bytes: &[u8]) -> &Self {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, bytes).unwrap();
        self
    }

    pub fn load(&self) -> Result<Corpus, codec_parity::HarnessError> {
        Corpus::load(self.dir.path())
    }
}
