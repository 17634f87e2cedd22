// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides the fixture schemas every test talks about (AllPrimitives,
//! Point2D, Rectangle, SimpleEnum, SimpleUnion, ...) and adapters with known
//! faults for exercising the harness.

#![doc(hidden)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::adapter::{CodecAdapter, ReferenceAdapter};
use crate::codec::{self, Value};
use crate::corpus::TestVector;
use crate::error::{AdapterFailure, CodecError};
use crate::layout::{PrimitiveKind, TypeDescriptor, VariantContext};

fn prim(kind: PrimitiveKind) -> TypeDescriptor {
    TypeDescriptor::primitive(kind)
}

// ============================================================================
// FIXTURE SCHEMAS
// ============================================================================

/// One field of every primitive kind, 42 bytes packed.
pub fn all_primitives() -> TypeDescriptor {
    TypeDescriptor::structure(
        PrimitiveKind::ALL.map(|kind| (format!("{}_val", kind.name()), prim(kind))),
    )
}

pub fn point2d() -> TypeDescriptor {
    TypeDescriptor::structure([("x", prim(PrimitiveKind::I32)), ("y", prim(PrimitiveKind::I32))])
}

pub fn rectangle() -> TypeDescriptor {
    TypeDescriptor::structure([
        ("top_left", point2d()),
        ("bottom_right", point2d()),
        ("color", prim(PrimitiveKind::U32)),
    ])
}

/// `{id: u64, flags: u8, value: u16}`, 11 bytes with the u64 first.
pub fn simple_struct() -> TypeDescriptor {
    TypeDescriptor::structure([
        ("id", prim(PrimitiveKind::U64)),
        ("flags", prim(PrimitiveKind::U8)),
        ("value", prim(PrimitiveKind::U16)),
    ])
}

/// `None = 0`, `Value(u32) = 1`, `Pair { first: u16, second: u16 } = 2`.
pub fn simple_enum() -> TypeDescriptor {
    TypeDescriptor::enumeration([
        ("None", 0, None),
        ("Value", 1, Some(prim(PrimitiveKind::U32))),
        (
            "Pair",
            2,
            Some(TypeDescriptor::structure([
                ("first", prim(PrimitiveKind::U16)),
                ("second", prim(PrimitiveKind::U16)),
            ])),
        ),
    ])
}

/// Four members of different widths; nothing on the wire says which.
pub fn simple_union() -> TypeDescriptor {
    TypeDescriptor::union([
        ("int_value", prim(PrimitiveKind::I32)),
        ("float_value", prim(PrimitiveKind::F32)),
        ("bytes", TypeDescriptor::array(prim(PrimitiveKind::U8), 4)),
        ("wide", prim(PrimitiveKind::U64)),
    ])
}

/// The fixed-array fixtures: `u8[4]`, `u16[3]`, `u32[2]`, `i32[5]`.
pub fn fixed_arrays() -> Vec<(&'static str, TypeDescriptor)> {
    vec![
        ("u8_array_4", TypeDescriptor::array(prim(PrimitiveKind::U8), 4)),
        ("u16_array_3", TypeDescriptor::array(prim(PrimitiveKind::U16), 3)),
        ("u32_array_2", TypeDescriptor::array(prim(PrimitiveKind::U32), 2)),
        ("i32_array_5", TypeDescriptor::array(prim(PrimitiveKind::I32), 5)),
    ]
}

// ============================================================================
// VECTORS
// ============================================================================

/// A vector whose canonical bytes come from the canonical codec.
pub fn canonical_vector(
    name: &str,
    desc: TypeDescriptor,
    value: Value,
    ctx: VariantContext,
) -> Result<TestVector, CodecError> {
    let bytes = codec::encode(&desc, &value, &ctx)?;
    Ok(TestVector::new(name, desc, value, bytes).with_context(ctx))
}

/// A plain `u16` vector.
pub fn u16_vector(name: &str, value: u16) -> TestVector {
    TestVector::new(
        name,
        prim(PrimitiveKind::U16),
        Value::U16(value),
        value.to_le_bytes().to_vec(),
    )
}

// ============================================================================
// ADAPTERS WITH KNOWN FAULTS
// ============================================================================

/// Byte-swap every scalar inside a value.
///
/// Encoding the swapped value little-endian gives the big-endian encoding of
/// the original, and the same trick reads big-endian bytes back.
pub fn swap_scalars(value: &Value) -> Value {
    match value {
        Value::U8(x) => Value::U8(*x),
        Value::I8(x) => Value::I8(*x),
        Value::U16(x) => Value::U16(x.swap_bytes()),
        Value::U32(x) => Value::U32(x.swap_bytes()),
        Value::U64(x) => Value::U64(x.swap_bytes()),
        Value::I16(x) => Value::I16(x.swap_bytes()),
        Value::I32(x) => Value::I32(x.swap_bytes()),
        Value::I64(x) => Value::I64(x.swap_bytes()),
        Value::F32(x) => Value::F32(f32::from_bits(x.to_bits().swap_bytes())),
        Value::F64(x) => Value::F64(f64::from_bits(x.to_bits().swap_bytes())),
        Value::Array(items) => Value::Array(items.iter().map(swap_scalars).collect()),
        Value::Struct(fields) => Value::Struct(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), swap_scalars(v)))
                .collect(),
        ),
        Value::Enum { tag, payload } => Value::Enum {
            tag: *tag,
            payload: payload.as_ref().map(|p| Box::new(swap_scalars(p))),
        },
    }
}

/// A generated codec that writes and reads big-endian.
#[derive(Debug, Clone)]
pub struct SwappedEndianAdapter {
    name: String,
}

impl SwappedEndianAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl CodecAdapter for SwappedEndianAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, desc: &TypeDescriptor, value: &Value, ctx: &VariantContext) -> Result<Vec<u8>, AdapterFailure> {
        Ok(codec::encode(desc, &swap_scalars(value), ctx)?)
    }

    fn decode(&self, desc: &TypeDescriptor, bytes: &[u8], ctx: &VariantContext) -> Result<Value, AdapterFailure> {
        Ok(swap_scalars(&codec::decode(desc, bytes, ctx)?))
    }
}

/// Fails every call with the same message.
#[derive(Debug, Clone)]
pub struct FailingAdapter {
    name: String,
    message: String,
}

impl FailingAdapter {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl CodecAdapter for FailingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, _: &TypeDescriptor, _: &Value, _: &VariantContext) -> Result<Vec<u8>, AdapterFailure> {
        Err(AdapterFailure::failed(self.message.clone()))
    }

    fn decode(&self, _: &TypeDescriptor, _: &[u8], _: &VariantContext) -> Result<Value, AdapterFailure> {
        Err(AdapterFailure::failed(self.message.clone()))
    }
}

/// The canonical codec, after a nap.
#[derive(Debug, Clone)]
pub struct SlowAdapter {
    inner: ReferenceAdapter,
    delay: Duration,
}

impl SlowAdapter {
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            inner: ReferenceAdapter::named(name),
            delay,
        }
    }
}

impl CodecAdapter for SlowAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn encode(&self, desc: &TypeDescriptor, value: &Value, ctx: &VariantContext) -> Result<Vec<u8>, AdapterFailure> {
        std::thread::sleep(self.delay);
        self.inner.encode(desc, value, ctx)
    }

    fn decode(&self, desc: &TypeDescriptor, bytes: &[u8], ctx: &VariantContext) -> Result<Value, AdapterFailure> {
        std::thread::sleep(self.delay);
        self.inner.decode(desc, bytes, ctx)
    }
}

type EncodeFn = dyn Fn(&TypeDescriptor, &Value, &VariantContext) -> Result<Vec<u8>, AdapterFailure> + Send + Sync;
type DecodeFn = dyn Fn(&TypeDescriptor, &[u8], &VariantContext) -> Result<Value, AdapterFailure> + Send + Sync;

/// An adapter made of two closures. Defaults to the canonical codec for
/// whichever side isn't overridden.
pub struct FnAdapter {
    name: String,
    encode: Box<EncodeFn>,
    decode: Box<DecodeFn>,
}

impl FnAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encode: Box::new(|desc, value, ctx| Ok(codec::encode(desc, value, ctx)?)),
            decode: Box::new(|desc, bytes, ctx| Ok(codec::decode(desc, bytes, ctx)?)),
        }
    }

    pub fn on_encode<F>(mut self, f: F) -> Self
    where
        F: Fn(&TypeDescriptor, &Value, &VariantContext) -> Result<Vec<u8>, AdapterFailure> + Send + Sync + 'static,
    {
        self.encode = Box::new(f);
        self
    }

    pub fn on_decode<F>(mut self, f: F) -> Self
    where
        F: Fn(&TypeDescriptor, &[u8], &VariantContext) -> Result<Value, AdapterFailure> + Send + Sync + 'static,
    {
        self.decode = Box::new(f);
        self
    }
}

impl CodecAdapter for FnAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, desc: &TypeDescriptor, value: &Value, ctx: &VariantContext) -> Result<Vec<u8>, AdapterFailure> {
        (self.encode)(desc, value, ctx)
    }

    fn decode(&self, desc: &TypeDescriptor, bytes: &[u8], ctx: &VariantContext) -> Result<Value, AdapterFailure> {
        (self.decode)(desc, bytes, ctx)
    }
}

/// Counts lifecycle calls, optionally refusing to start.
#[derive(Debug, Clone, Default)]
pub struct LifecycleCounter {
    pub acquired: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
}

impl LifecycleCounter {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleAdapter {
    inner: ReferenceAdapter,
    counter: LifecycleCounter,
    refuse_start: bool,
}

impl LifecycleAdapter {
    pub fn new(name: impl Into<String>, counter: LifecycleCounter) -> Self {
        Self {
            inner: ReferenceAdapter::named(name),
            counter,
            refuse_start: false,
        }
    }

    pub fn refusing_start(mut self) -> Self {
        self.refuse_start = true;
        self
    }
}

impl CodecAdapter for LifecycleAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn encode(&self, desc: &TypeDescriptor, value: &Value, ctx: &VariantContext) -> Result<Vec<u8>, AdapterFailure> {
        self.inner.encode(desc, value, ctx)
    }

    fn decode(&self, desc: &TypeDescriptor, bytes: &[u8], ctx: &VariantContext) -> Result<Value, AdapterFailure> {
        self.inner.decode(desc, bytes, ctx)
    }

    fn acquire(&self) -> Result<(), AdapterFailure> {
        if self.refuse_start {
            return Err(AdapterFailure::failed("runtime not installed"));
        }
        self.counter.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) {
        self.counter.released.fetch_add(1, Ordering::SeqCst);
    }
}
