// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Per-call timeouts via a thread + channel race.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::AdapterFailure;

/// Run `f` on a worker thread and wait at most `timeout` for it.
///
/// On expiry the caller gets `AdapterFailure::TimedOut` right away. The worker
/// is detached and finishes (or hangs) on its own; adapters that own external
/// resources clean those up in `release`. A panicking `f` is reported as a
/// failure instead of unwinding into the harness.
pub fn call_with_timeout<T, F>(label: &str, timeout: Duration, f: F) -> Result<T, AdapterFailure>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AdapterFailure> + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name(format!("adapter-{}", label))
        .spawn(move || {
            let _ = tx.send(f());
        })
        .map_err(|e| AdapterFailure::failed(format!("cannot spawn worker: {}", e)))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(AdapterFailure::TimedOut(timeout)),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(AdapterFailure::failed("adapter panicked"))
        }
    }
}
