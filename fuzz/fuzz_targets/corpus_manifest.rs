// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Corpus manifests from untrusted bytes.
//!
//! A manifest can name recursive types, missing blobs, bad CRCs and values
//! that don't fit their types. Loading must end in a corpus or an error.

#![no_main]

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;

use codec_parity::corpus::{Manifest, MANIFEST_FILE};
use codec_parity::{encode, Corpus};

/// One scratch corpus per fuzzing process, with a couple of blobs to point at.
fn scratch() -> &'static PathBuf {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = std::env::temp_dir().join(format!("codec-parity-fuzz-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("scratch dir");
        fs::write(dir.join("a.bin"), [0x0A, 0x00]).expect("blob");
        fs::write(dir.join("b.bin"), [0x00; 16]).expect("blob");
        dir
    })
}

fuzz_target!(|data: &[u8]| {
    if serde_json::from_slice::<Manifest>(data).is_err() {
        return;
    }

    let dir = scratch();
    fs::write(dir.join(MANIFEST_FILE), data).expect("write manifest");

    if let Ok(corpus) = Corpus::load(dir) {
        for vector in corpus.iter() {
            // The loader only checks that values fit their types, so the
            // blob may still disagree. Encoding the value must not.
            encode(&vector.descriptor, &vector.value, &vector.context).expect("loaded value encodes");
        }
    }
});
