// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Kani model checking proofs for the canonical wire rules.
//!
//! This standalone crate extracts the scalar encoding and the dense struct
//! offset rule from the main crate and proves them with Kani.
//!
//! Run with: `cargo kani`
//!
//! ## Verified Properties
//!
//! 1. **Roundtrip**: decode(encode(x)) == x for every scalar width, floats by bits
//! 2. **Byte order**: byte `i` of an encoding is bits `8i..8i+8` of the value
//! 3. **No panics**: decoding any buffer returns a value or `Truncated`
//! 4. **Dense offsets**: field `i` starts at the sum of the widths before it

/// Widths of the primitive kinds, in declaration order
/// (u8 u16 u32 u64 i8 i16 i32 i64 f32 f64).
pub const WIDTHS: [usize; 10] = [1, 2, 4, 8, 1, 2, 4, 8, 4, 8];

/// Largest struct the offset proofs consider.
pub const MAX_FIELDS: usize = 6;

// ============================================================================
// SCALARS (mirrors src/codec/mod.rs)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncated {
    pub needed: usize,
    pub available: usize,
}

/// Little-endian bytes of the low `width` bytes of `bits`.
pub fn encode_scalar(bits: u64, width: usize, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&bits.to_le_bytes()[..width]);
}

/// Read `width` little-endian bytes from the front of `bytes`.
pub fn decode_scalar(bytes: &[u8], width: usize) -> Result<u64, Truncated> {
    if bytes.len() < width {
        return Err(Truncated {
            needed: width,
            available: bytes.len(),
        });
    }
    let mut raw = [0u8; 8];
    raw[..width].copy_from_slice(&bytes[..width]);
    Ok(u64::from_le_bytes(raw))
}

fn mask(width: usize) -> u64 {
    if width == 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

// ============================================================================
// LAYOUT (mirrors src/layout/mod.rs)
// ============================================================================

/// Offsets of fields with the given widths, back to back.
pub fn dense_offsets(widths: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(widths.len());
    let mut at = 0;
    for &w in widths {
        offsets.push(at);
        at += w;
    }
    offsets
}

// ============================================================================
// KANI MODEL CHECKING PROOFS
// ============================================================================

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    fn any_width() -> usize {
        let index: usize = kani::any_where(|&i| i < WIDTHS.len());
        WIDTHS[index]
    }

    /// Roundtrip for every width, masking to the encoded bytes.
    #[kani::proof]
    #[kani::unwind(9)]
    fn verify_scalar_roundtrip() {
        let bits: u64 = kani::any();
        let width = any_width();
        let mut buf = Vec::new();
        encode_scalar(bits, width, &mut buf);

        kani::assert(buf.len() == width, "encoding is exactly width bytes");
        let decoded = decode_scalar(&buf, width);
        kani::assert(decoded == Ok(bits & mask(width)), "roundtrip preserves the low bytes");
    }

    /// Least significant byte first.
    #[kani::proof]
    #[kani::unwind(9)]
    fn verify_byte_order() {
        let bits: u64 = kani::any();
        let mut buf = Vec::new();
        encode_scalar(bits, 8, &mut buf);
        let i: usize = kani::any_where(|&i| i < 8);
        kani::assert(buf[i] == (bits >> (8 * i)) as u8, "byte i holds bits 8i..8i+8");
    }

    /// f32 bit patterns, NaN payloads included, survive unchanged.
    #[kani::proof]
    #[kani::unwind(9)]
    fn verify_f32_bits_survive() {
        let x = f32::from_bits(kani::any());
        let mut buf = Vec::new();
        encode_scalar(u64::from(x.to_bits()), 4, &mut buf);
        let decoded = decode_scalar(&buf, 4).map(|b| f32::from_bits(b as u32));
        kani::assert(decoded.map(f32::to_bits) == Ok(x.to_bits()), "f32 bits survive");
    }

    /// Short buffers are an error, never a panic.
    #[kani::proof]
    #[kani::unwind(9)]
    fn verify_decode_no_panic() {
        let len: usize = kani::any_where(|&n| n <= 8);
        let bytes: [u8; 8] = kani::any();
        let width = any_width();
        match decode_scalar(&bytes[..len], width) {
            Ok(bits) => kani::assert(bits & !mask(width) == 0, "no bits beyond width"),
            Err(e) => kani::assert(e.needed == width && e.available < width, "truncation reported"),
        }
    }

    /// Offsets are prefix sums: no padding, whatever the widths.
    #[kani::proof]
    #[kani::unwind(7)]
    fn verify_dense_offsets() {
        let count: usize = kani::any_where(|&n| n >= 1 && n <= MAX_FIELDS);
        let mut widths = [0usize; MAX_FIELDS];
        for w in widths.iter_mut().take(count) {
            *w = any_width();
        }
        let offsets = dense_offsets(&widths[..count]);

        kani::assert(offsets[0] == 0, "first field at offset 0");
        let i: usize = kani::any_where(|&i| i + 1 < count);
        kani::assert(offsets[i + 1] == offsets[i] + widths[i], "next field starts where this one ends");
    }
}
