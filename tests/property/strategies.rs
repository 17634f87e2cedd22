// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Proptest strategies: random descriptors and matching values.
//!
//! A [`Sample`] is a descriptor, a value of that descriptor, and the variant
//! selections needed to encode it (unions) or size it (enums and unions).

#![allow(dead_code)]

use proptest::prelude::*;

use codec_parity::layout::{child_path, element_path};
use codec_parity::{PrimitiveKind, TypeDescriptor, Value, VariantContext};

#[derive(Debug, Clone)]
pub struct Sample {
    pub desc: TypeDescriptor,
    pub value: Value,
    pub ctx: VariantContext,
}

pub fn arb_kind() -> impl Strategy<Value = PrimitiveKind> {
    prop::sample::select(PrimitiveKind::ALL.to_vec())
}

/// Any value of `kind`. Floats come from raw bits so NaN payloads, infinities,
/// subnormals and negative zero all show up.
pub fn arb_primitive(kind: PrimitiveKind) -> BoxedStrategy<Value> {
    match kind {
        PrimitiveKind::U8 => any::<u8>().prop_map(Value::U8).boxed(),
        PrimitiveKind::U16 => any::<u16>().prop_map(Value::U16).boxed(),
        PrimitiveKind::U32 => any::<u32>().prop_map(Value::U32).boxed(),
        PrimitiveKind::U64 => any::<u64>().prop_map(Value::U64).boxed(),
        PrimitiveKind::I8 => any::<i8>().prop_map(Value::I8).boxed(),
        PrimitiveKind::I16 => any::<i16>().prop_map(Value::I16).boxed(),
        PrimitiveKind::I32 => any::<i32>().prop_map(Value::I32).boxed(),
        PrimitiveKind::I64 => any::<i64>().prop_map(Value::I64).boxed(),
        PrimitiveKind::F32 => any::<u32>().prop_map(|b| Value::F32(f32::from_bits(b))).boxed(),
        PrimitiveKind::F64 => any::<u64>().prop_map(|b| Value::F64(f64::from_bits(b))).boxed(),
    }
}

/// Primitives, arrays and structs only: every such descriptor has a static size.
pub fn arb_plain_descriptor() -> impl Strategy<Value = TypeDescriptor> {
    let leaf = arb_kind().prop_map(TypeDescriptor::primitive);
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (inner.clone(), 0usize..4).prop_map(|(elem, count)| TypeDescriptor::array(elem, count)),
            prop::collection::vec(inner, 1..5).prop_map(named_struct),
        ]
    })
}

/// Any descriptor shape, enums and unions included.
pub fn arb_descriptor() -> impl Strategy<Value = TypeDescriptor> {
    let leaf = arb_kind().prop_map(TypeDescriptor::primitive);
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (inner.clone(), 0usize..4).prop_map(|(elem, count)| TypeDescriptor::array(elem, count)),
            prop::collection::vec(inner.clone(), 1..5).prop_map(named_struct),
            (prop::collection::vec(prop::option::of(inner.clone()), 1..4), any::<u8>())
                .prop_map(|(payloads, base)| tagged_enum(payloads, base)),
            prop::collection::vec(inner, 1..4).prop_map(|members| {
                TypeDescriptor::union(
                    members
                        .into_iter()
                        .enumerate()
                        .map(|(i, ty)| (format!("m{}", i), ty)),
                )
            }),
        ]
    })
}

fn named_struct(fields: Vec<TypeDescriptor>) -> TypeDescriptor {
    TypeDescriptor::structure(
        fields
            .into_iter()
            .enumerate()
            .map(|(i, ty)| (format!("f{}", i), ty)),
    )
}

/// Distinct tags starting at `base`, wrapping past 255.
fn tagged_enum(payloads: Vec<Option<TypeDescriptor>>, base: u8) -> TypeDescriptor {
    TypeDescriptor::enumeration(
        payloads
            .into_iter()
            .enumerate()
            .map(|(i, payload)| (format!("V{}", i), base.wrapping_add(i as u8), payload)),
    )
}

/// Re-root a relative value path under `prefix`.
fn rebase(prefix: &str, rel: &str) -> String {
    if rel.is_empty() {
        prefix.to_string()
    } else if rel.starts_with('[') {
        format!("{}{}", prefix, rel)
    } else {
        child_path(prefix, rel)
    }
}

type Selections = Vec<(String, String)>;

fn nest(prefix: &str, selections: Selections) -> Selections {
    selections
        .into_iter()
        .map(|(path, variant)| (rebase(prefix, &path), variant))
        .collect()
}

/// A value of `desc` plus the variant selections it was built with.
pub fn arb_value(desc: &TypeDescriptor) -> BoxedStrategy<(Value, Selections)> {
    match desc {
        TypeDescriptor::Primitive(kind) => arb_primitive(*kind).prop_map(|v| (v, Vec::new())).boxed(),
        TypeDescriptor::FixedArray { elem, count } => {
            prop::collection::vec(arb_value(elem), *count)
                .prop_map(|items| {
                    let mut selections = Vec::new();
                    let mut values = Vec::with_capacity(items.len());
                    for (i, (value, inner)) in items.into_iter().enumerate() {
                        selections.extend(nest(&element_path("", i), inner));
                        values.push(value);
                    }
                    (Value::Array(values), selections)
                })
                .boxed()
        }
        TypeDescriptor::Struct { fields } => {
            let names: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
            let strategies: Vec<_> = fields.iter().map(|f| arb_value(&f.ty)).collect();
            strategies
                .prop_map(move |items| {
                    let mut selections = Vec::new();
                    let mut values = Vec::with_capacity(items.len());
                    for (name, (value, inner)) in names.iter().zip(items) {
                        selections.extend(nest(name, inner));
                        values.push((name.clone(), value));
                    }
                    (Value::Struct(values), selections)
                })
                .boxed()
        }
        TypeDescriptor::Enum { variants } => {
            let options: Vec<BoxedStrategy<(Value, Selections)>> = variants
                .iter()
                .map(|variant| {
                    let name = variant.name.clone();
                    let tag = variant.tag;
                    match &variant.payload {
                        Some(payload) => arb_value(payload)
                            .prop_map(move |(value, inner)| {
                                let mut selections = vec![(String::new(), name.clone())];
                                selections.extend(nest(&name, inner));
                                (Value::variant(tag, Some(value)), selections)
                            })
                            .boxed(),
                        None => Just((Value::variant(tag, None), vec![(String::new(), name)])).boxed(),
                    }
                })
                .collect();
            prop::strategy::Union::new(options).boxed()
        }
        TypeDescriptor::Union { variants } => {
            let options: Vec<BoxedStrategy<(Value, Selections)>> = variants
                .iter()
                .map(|variant| {
                    let name = variant.name.clone();
                    arb_value(&variant.ty)
                        .prop_map(move |(value, inner)| {
                            let mut selections = vec![(String::new(), name.clone())];
                            selections.extend(nest(&name, inner));
                            (value, selections)
                        })
                        .boxed()
                })
                .collect();
            prop::strategy::Union::new(options).boxed()
        }
    }
}

pub fn arb_sample() -> impl Strategy<Value = Sample> {
    arb_descriptor().prop_flat_map(sample_of)
}

pub fn arb_plain_sample() -> impl Strategy<Value = Sample> {
    arb_plain_descriptor().prop_flat_map(sample_of)
}

fn sample_of(desc: TypeDescriptor) -> impl Strategy<Value = Sample> {
    arb_value(&desc).prop_map(move |(value, selections)| {
        let mut ctx = VariantContext::new();
        for (path, variant) in selections {
            ctx.insert(path, variant);
        }
        Sample {
            desc: desc.clone(),
            value,
            ctx,
        }
    })
}

#[test]
fn test_rebase_paths() {
    assert_eq!(rebase("a", ""), "a");
    assert_eq!(rebase("a", "[2]"), "a[2]");
    assert_eq!(rebase("a", "b.c"), "a.b.c");
    assert_eq!(rebase("", "b"), "b");
    assert_eq!(rebase("[0]", "m1"), "[0].m1");
}
