//! Scalar (non-SIMD) reference kernels
//!
//! Portable baseline implementations of all eight table operations, written
//! as plain indexed loops in the exact evaluation order the operation
//! contracts promise. These are the semantic ground truth: strict-mode
//! tables must match them bit-for-bit, and every specialized kernel is
//! tested against them.
//!
//! # Performance
//!
//! Correctness reference only. Expect the SIMD kernels to be 3-8x faster on
//! codec-sized frames.

use super::contract;

/// `dst[i] = src0[i] * src1[i]`
pub fn vector_fmul(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    contract(&[&*dst, src0, src1], 32, 16);
    for i in 0..dst.len() {
        dst[i] = src0[i] * src1[i];
    }
}

/// `dst[i] += src[i] * mul`
pub fn vector_fmac_scalar(dst: &mut [f32], src: &[f32], mul: f32) {
    contract(&[&*dst, src], 32, 16);
    for i in 0..dst.len() {
        dst[i] += src[i] * mul;
    }
}

/// `dst[i] = src[i] * mul`
pub fn vector_fmul_scalar(dst: &mut [f32], src: &[f32], mul: f32) {
    contract(&[&*dst, src], 16, 4);
    for i in 0..dst.len() {
        dst[i] = src[i] * mul;
    }
}

/// `dst[i] = src[i] * mul`, double precision
pub fn vector_dmul_scalar(dst: &mut [f64], src: &[f64], mul: f64) {
    contract(&[&*dst, src], 32, 8);
    for i in 0..dst.len() {
        dst[i] = src[i] * mul;
    }
}

/// Windowed overlap-add: `dst[i] = src0[i] * win[len-1-i] - src1[i] * win[i]`
///
/// `win` is a half-window of length `len`; consumed forward against `src1`
/// and backward against `src0`, which is the cross-fade an MDCT coder needs
/// to stitch the tail of one frame onto the head of the next. With an
/// all-ones window this degenerates to `dst[i] = src0[i] - src1[i]`.
pub fn vector_fmul_window(dst: &mut [f32], src0: &[f32], src1: &[f32], win: &[f32]) {
    contract(&[&*dst, src0, src1, win], 16, 4);
    let len = dst.len();
    for i in 0..len {
        dst[i] = src0[i] * win[len - 1 - i] - src1[i] * win[i];
    }
}

/// `dst[i] = src0[i] * src1[i] + src2[i]`
pub fn vector_fmul_add(dst: &mut [f32], src0: &[f32], src1: &[f32], src2: &[f32]) {
    contract(&[&*dst, src0, src1, src2], 32, 16);
    for i in 0..dst.len() {
        dst[i] = src0[i] * src1[i] + src2[i];
    }
}

/// `dst[i] = src0[i] * src1[len-1-i]` — second operand consumed back-to-front
pub fn vector_fmul_reverse(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    contract(&[&*dst, src0, src1], 32, 16);
    let len = dst.len();
    for i in 0..len {
        dst[i] = src0[i] * src1[len - 1 - i];
    }
}

/// Radix-2 butterfly: `(v1[i], v2[i]) = (v1[i] + v2[i], v1[i] - v2[i])`
pub fn butterflies(v1: &mut [f32], v2: &mut [f32]) {
    contract(&[&*v1, &*v2], 16, 4);
    for i in 0..v1.len() {
        let a = v1[i];
        let b = v2[i];
        v1[i] = a + b;
        v2[i] = a - b;
    }
}
