// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Adapter for a generated codec that lives in another ecosystem's runtime.
//!
//! One process per call. The program reads a single JSON request on stdin and
//! writes a single JSON response on stdout:
//!
//! ```text
//! → {"op": "encode", "type": {...}, "value": ..., "variants": {"": "int_value"}}
//! ← {"ok": true, "hex": "d6ffffff"}
//!
//! → {"op": "decode", "type": {...}, "hex": "d6ffffff", "variants": {...}}
//! ← {"ok": true, "value": -42}
//!
//! ← {"ok": false, "error": "RangeError: offset out of bounds"}
//! ```
//!
//! `type` is the descriptor in its serde form, `value` uses the corpus JSON
//! value mapping. A non-zero exit, garbage on stdout, or `ok: false` is an
//! adapter failure.
//!
//! Children are tracked while they run. A call that outlives the adapter's
//! deadline has its child killed, and `release` kills whatever is left.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec::json::{value_from_json, value_to_json};
use crate::codec::Value;
use crate::error::{AdapterFailure, HarnessError};
use crate::layout::{TypeDescriptor, VariantContext};

use super::CodecAdapter;

const POLL_INTERVAL: Duration = Duration::from_millis(2);

#[derive(Serialize)]
struct Request<'a> {
    op: &'static str,
    #[serde(rename = "type")]
    ty: &'a TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hex: Option<String>,
    variants: &'a VariantContext,
}

#[derive(Deserialize)]
struct Response {
    ok: bool,
    #[serde(default)]
    hex: Option<String>,
    #[serde(default)]
    value: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

type LiveChildren = Mutex<HashMap<u32, Arc<Mutex<Child>>>>;

/// Runs an external program per encode/decode call.
pub struct ProcessAdapter {
    name: String,
    program: String,
    args: Vec<String>,
    deadline: Option<Duration>,
    live: LiveChildren,
}

impl ProcessAdapter {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            deadline: None,
            live: Mutex::new(HashMap::new()),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Kill any child still running after `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Parse the CLI form `NAME=PROGRAM [ARGS...]`.
    pub fn parse(spec: &str) -> Result<Self, HarnessError> {
        let (name, command) = spec
            .split_once('=')
            .ok_or_else(|| HarnessError::config(format!("adapter '{}' is not NAME=PROGRAM", spec)))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(HarnessError::config(format!("adapter '{}' has no name", spec)));
        }
        let mut words = command.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| HarnessError::config(format!("adapter '{}' has no program", name)))?;
        Ok(Self::new(name, program).args(words))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Number of children currently running.
    pub fn live_children(&self) -> usize {
        self.live.lock().len()
    }

    fn exchange(&self, request: &Request<'_>) -> Result<Response, AdapterFailure> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| AdapterFailure::failed(format!("cannot serialize request: {}", e)))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AdapterFailure::failed(format!("cannot run {}: {}", self.program, e)))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let pid = child.id();
        let child = Arc::new(Mutex::new(child));
        self.live.lock().insert(pid, Arc::clone(&child));
        debug!(adapter = %self.name, pid, op = request.op, "spawned codec process");

        // Pipes are drained on their own threads so a chatty child can't block.
        let writer = stdin.map(|mut pipe| {
            thread::spawn(move || {
                let _ = pipe.write_all(&payload);
            })
        });
        let out_reader = stdout.map(|pipe| thread::spawn(move || read_all(pipe)));
        let err_reader = stderr.map(|pipe| thread::spawn(move || read_all(pipe)));

        let status = self.wait(&child, pid);
        self.live.lock().remove(&pid);

        if let Some(writer) = writer {
            let _ = writer.join();
        }
        let stdout = out_reader
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        let stderr = err_reader
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        let status = status?;
        if !status.success() {
            let detail = String::from_utf8_lossy(&stderr);
            return Err(AdapterFailure::failed(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                detail.trim()
            )));
        }

        let response: Response = serde_json::from_slice(&stdout).map_err(|e| {
            AdapterFailure::failed(format!(
                "malformed response ({}): {}",
                e,
                String::from_utf8_lossy(&stdout).trim()
            ))
        })?;
        if !response.ok {
            return Err(AdapterFailure::failed(
                response
                    .error
                    .unwrap_or_else(|| "codec reported failure".to_string()),
            ));
        }
        Ok(response)
    }

    fn wait(&self, child: &Mutex<Child>, pid: u32) -> Result<ExitStatus, AdapterFailure> {
        let start = Instant::now();
        loop {
            {
                let mut guard = child.lock();
                match guard.try_wait() {
                    Ok(Some(status)) => return Ok(status),
                    Ok(None) => {}
                    Err(e) => return Err(AdapterFailure::failed(format!("wait failed: {}", e))),
                }
                if let Some(deadline) = self.deadline {
                    if start.elapsed() >= deadline {
                        warn!(adapter = %self.name, pid, "killing codec process past deadline");
                        let _ = guard.kill();
                        let _ = guard.wait();
                        return Err(AdapterFailure::TimedOut(deadline));
                    }
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn read_all(mut pipe: impl Read) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf);
    buf
}

impl CodecAdapter for ProcessAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(
        &self,
        desc: &TypeDescriptor,
        value: &Value,
        ctx: &VariantContext,
    ) -> Result<Vec<u8>, AdapterFailure> {
        let response = self.exchange(&Request {
            op: "encode",
            ty: desc,
            value: Some(value_to_json(desc, value, ctx)),
            hex: None,
            variants: ctx,
        })?;
        let hex_bytes = response
            .hex
            .ok_or_else(|| AdapterFailure::failed("encode response has no 'hex'"))?;
        hex::decode(hex_bytes.trim())
            .map_err(|e| AdapterFailure::failed(format!("encode response 'hex' is not hex: {}", e)))
    }

    fn decode(
        &self,
        desc: &TypeDescriptor,
        bytes: &[u8],
        ctx: &VariantContext,
    ) -> Result<Value, AdapterFailure> {
        let response = self.exchange(&Request {
            op: "decode",
            ty: desc,
            value: None,
            hex: Some(hex::encode(bytes)),
            variants: ctx,
        })?;
        let json = response
            .value
            .ok_or_else(|| AdapterFailure::failed("decode response has no 'value'"))?;
        value_from_json(desc, &json, ctx)
            .map_err(|e| AdapterFailure::failed(format!("decode response value: {}", e)))
    }

    fn release(&self) {
        let children: Vec<(u32, Arc<Mutex<Child>>)> = self.live.lock().drain().collect();
        for (pid, child) in children {
            warn!(adapter = %self.name, pid, "killing leftover codec process");
            let mut guard = child.lock();
            let _ = guard.kill();
            let _ = guard.wait();
        }
    }
}

impl Drop for ProcessAdapter {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ProcessAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessAdapter")
            .field("name", &self.name)
            .field("program", &self.program)
            .field("args", &self.args)
            .field("deadline", &self.deadline)
            .finish()
    }
}
