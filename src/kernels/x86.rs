//! x86_64 kernels: SSE2 (128-bit) and AVX2 with FMA (256-bit)
//!
//! The SSE2 kernels cover all eight operations and use only per-lane
//! multiply/add/subtract, so they are bit-identical to the reference and
//! install under either strictness. The AVX2 pass widens the multiple-of-16
//! operations to 8 lanes; its FMA variants of the two accumulating
//! operations round once instead of twice and therefore install only when
//! the table is not strict.
//!
//! # Safety
//!
//! Every intrinsic body is an `unsafe fn` gated by `#[target_feature]`. The
//! safe wrappers around them are installed exclusively by [`install`], which
//! runs after the table's level has been validated against runtime CPU
//! feature detection — that detection is what makes the wrapper calls sound.
//!
//! The length-multiple contract means the vector loops consume their inputs
//! exactly; there are no scalar tails.

use std::arch::x86_64::*;

use super::contract;
use crate::dsp::FloatDsp;
use crate::SimdLevel;

/// x86_64 override pass. SSE2 entries first, then AVX2 upgrades for the
/// operations wide registers actually help.
pub(crate) fn install(dsp: &mut FloatDsp) {
    let (sse2, avx2) = match dsp.level {
        SimdLevel::Avx2 => (true, true),
        SimdLevel::Sse2 => (true, false),
        _ => (false, false),
    };

    if sse2 {
        dsp.vector_fmul = fmul_sse2;
        dsp.vector_fmac_scalar = fmac_scalar_sse2;
        dsp.vector_fmul_scalar = fmul_scalar_sse2;
        dsp.vector_dmul_scalar = dmul_scalar_sse2;
        dsp.vector_fmul_window = fmul_window_sse2;
        dsp.vector_fmul_add = fmul_add_sse2;
        dsp.vector_fmul_reverse = fmul_reverse_sse2;
        dsp.butterflies = butterflies_sse2;
    }

    if avx2 {
        dsp.vector_fmul = fmul_avx2;
        dsp.vector_fmul_reverse = fmul_reverse_avx2;
        dsp.vector_dmul_scalar = dmul_scalar_avx2;
        if !dsp.strict {
            // Fused multiply-add rounds once where the reference rounds
            // twice; excluded from strict tables.
            dsp.vector_fmac_scalar = fmac_scalar_fma;
            dsp.vector_fmul_add = fmul_add_fma;
        }
    }
}

// ---------------------------------------------------------------- SSE2

fn fmul_sse2(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    contract(&[&*dst, src0, src1], 32, 16);
    // SAFETY: installed only for levels validated against SSE2 detection.
    unsafe { fmul_sse2_impl(dst, src0, src1) }
}

#[target_feature(enable = "sse2")]
unsafe fn fmul_sse2_impl(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    let mut i = 0;
    while i + 4 <= dst.len() {
        let a = _mm_loadu_ps(src0.as_ptr().add(i));
        let b = _mm_loadu_ps(src1.as_ptr().add(i));
        _mm_storeu_ps(dst.as_mut_ptr().add(i), _mm_mul_ps(a, b));
        i += 4;
    }
}

fn fmac_scalar_sse2(dst: &mut [f32], src: &[f32], mul: f32) {
    contract(&[&*dst, src], 32, 16);
    // SAFETY: installed only for levels validated against SSE2 detection.
    unsafe { fmac_scalar_sse2_impl(dst, src, mul) }
}

#[target_feature(enable = "sse2")]
unsafe fn fmac_scalar_sse2_impl(dst: &mut [f32], src: &[f32], mul: f32) {
    let m = _mm_set1_ps(mul);
    let mut i = 0;
    while i + 4 <= dst.len() {
        let d = _mm_loadu_ps(dst.as_ptr().add(i));
        let s = _mm_loadu_ps(src.as_ptr().add(i));
        // Separate multiply and add keep this bit-exact with the reference.
        _mm_storeu_ps(dst.as_mut_ptr().add(i), _mm_add_ps(d, _mm_mul_ps(s, m)));
        i += 4;
    }
}

fn fmul_scalar_sse2(dst: &mut [f32], src: &[f32], mul: f32) {
    contract(&[&*dst, src], 16, 4);
    // SAFETY: installed only for levels validated against SSE2 detection.
    unsafe { fmul_scalar_sse2_impl(dst, src, mul) }
}

#[target_feature(enable = "sse2")]
unsafe fn fmul_scalar_sse2_impl(dst: &mut [f32], src: &[f32], mul: f32) {
    let m = _mm_set1_ps(mul);
    let mut i = 0;
    while i + 4 <= dst.len() {
        let s = _mm_loadu_ps(src.as_ptr().add(i));
        _mm_storeu_ps(dst.as_mut_ptr().add(i), _mm_mul_ps(s, m));
        i += 4;
    }
}

fn dmul_scalar_sse2(dst: &mut [f64], src: &[f64], mul: f64) {
    contract(&[&*dst, src], 32, 8);
    // SAFETY: installed only for levels validated against SSE2 detection.
    unsafe { dmul_scalar_sse2_impl(dst, src, mul) }
}

#[target_feature(enable = "sse2")]
unsafe fn dmul_scalar_sse2_impl(dst: &mut [f64], src: &[f64], mul: f64) {
    let m = _mm_set1_pd(mul);
    let mut i = 0;
    while i + 2 <= dst.len() {
        let s = _mm_loadu_pd(src.as_ptr().add(i));
        _mm_storeu_pd(dst.as_mut_ptr().add(i), _mm_mul_pd(s, m));
        i += 2;
    }
}

fn fmul_window_sse2(dst: &mut [f32], src0: &[f32], src1: &[f32], win: &[f32]) {
    contract(&[&*dst, src0, src1, win], 16, 4);
    // SAFETY: installed only for levels validated against SSE2 detection.
    unsafe { fmul_window_sse2_impl(dst, src0, src1, win) }
}

#[target_feature(enable = "sse2")]
unsafe fn fmul_window_sse2_impl(dst: &mut [f32], src0: &[f32], src1: &[f32], win: &[f32]) {
    let len = dst.len();
    let mut i = 0;
    while i + 4 <= len {
        let s0 = _mm_loadu_ps(src0.as_ptr().add(i));
        let s1 = _mm_loadu_ps(src1.as_ptr().add(i));
        let wi = _mm_loadu_ps(win.as_ptr().add(i));
        // Window consumed backward against src0: load the mirrored block and
        // reverse its lanes.
        let wr = _mm_loadu_ps(win.as_ptr().add(len - i - 4));
        let wr = _mm_shuffle_ps::<0x1b>(wr, wr);
        let r = _mm_sub_ps(_mm_mul_ps(s0, wr), _mm_mul_ps(s1, wi));
        _mm_storeu_ps(dst.as_mut_ptr().add(i), r);
        i += 4;
    }
}

fn fmul_add_sse2(dst: &mut [f32], src0: &[f32], src1: &[f32], src2: &[f32]) {
    contract(&[&*dst, src0, src1, src2], 32, 16);
    // SAFETY: installed only for levels validated against SSE2 detection.
    unsafe { fmul_add_sse2_impl(dst, src0, src1, src2) }
}

#[target_feature(enable = "sse2")]
unsafe fn fmul_add_sse2_impl(dst: &mut [f32], src0: &[f32], src1: &[f32], src2: &[f32]) {
    let mut i = 0;
    while i + 4 <= dst.len() {
        let a = _mm_loadu_ps(src0.as_ptr().add(i));
        let b = _mm_loadu_ps(src1.as_ptr().add(i));
        let c = _mm_loadu_ps(src2.as_ptr().add(i));
        _mm_storeu_ps(dst.as_mut_ptr().add(i), _mm_add_ps(_mm_mul_ps(a, b), c));
        i += 4;
    }
}

fn fmul_reverse_sse2(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    contract(&[&*dst, src0, src1], 32, 16);
    // SAFETY: installed only for levels validated against SSE2 detection.
    unsafe { fmul_reverse_sse2_impl(dst, src0, src1) }
}

#[target_feature(enable = "sse2")]
unsafe fn fmul_reverse_sse2_impl(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    let len = dst.len();
    let mut i = 0;
    while i + 4 <= len {
        let a = _mm_loadu_ps(src0.as_ptr().add(i));
        let b = _mm_loadu_ps(src1.as_ptr().add(len - i - 4));
        let b = _mm_shuffle_ps::<0x1b>(b, b);
        _mm_storeu_ps(dst.as_mut_ptr().add(i), _mm_mul_ps(a, b));
        i += 4;
    }
}

fn butterflies_sse2(v1: &mut [f32], v2: &mut [f32]) {
    contract(&[&*v1, &*v2], 16, 4);
    // SAFETY: installed only for levels validated against SSE2 detection.
    unsafe { butterflies_sse2_impl(v1, v2) }
}

#[target_feature(enable = "sse2")]
unsafe fn butterflies_sse2_impl(v1: &mut [f32], v2: &mut [f32]) {
    let mut i = 0;
    while i + 4 <= v1.len() {
        let a = _mm_loadu_ps(v1.as_ptr().add(i));
        let b = _mm_loadu_ps(v2.as_ptr().add(i));
        _mm_storeu_ps(v1.as_mut_ptr().add(i), _mm_add_ps(a, b));
        _mm_storeu_ps(v2.as_mut_ptr().add(i), _mm_sub_ps(a, b));
        i += 4;
    }
}

// ---------------------------------------------------------------- AVX2

fn fmul_avx2(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    contract(&[&*dst, src0, src1], 32, 16);
    // SAFETY: installed only for levels validated against AVX2 detection.
    unsafe { fmul_avx2_impl(dst, src0, src1) }
}

#[target_feature(enable = "avx2")]
unsafe fn fmul_avx2_impl(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    let mut i = 0;
    while i + 8 <= dst.len() {
        let a = _mm256_loadu_ps(src0.as_ptr().add(i));
        let b = _mm256_loadu_ps(src1.as_ptr().add(i));
        _mm256_storeu_ps(dst.as_mut_ptr().add(i), _mm256_mul_ps(a, b));
        i += 8;
    }
}

fn fmul_reverse_avx2(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    contract(&[&*dst, src0, src1], 32, 16);
    // SAFETY: installed only for levels validated against AVX2 detection.
    unsafe { fmul_reverse_avx2_impl(dst, src0, src1) }
}

#[target_feature(enable = "avx2")]
unsafe fn fmul_reverse_avx2_impl(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    let len = dst.len();
    let mut i = 0;
    while i + 8 <= len {
        let a = _mm256_loadu_ps(src0.as_ptr().add(i));
        let b = _mm256_loadu_ps(src1.as_ptr().add(len - i - 8));
        // Full 8-lane reverse: flip within each 128-bit lane, then swap lanes.
        let b = _mm256_shuffle_ps::<0x1b>(b, b);
        let b = _mm256_permute2f128_ps::<0x01>(b, b);
        _mm256_storeu_ps(dst.as_mut_ptr().add(i), _mm256_mul_ps(a, b));
        i += 8;
    }
}

fn dmul_scalar_avx2(dst: &mut [f64], src: &[f64], mul: f64) {
    contract(&[&*dst, src], 32, 8);
    // SAFETY: installed only for levels validated against AVX2 detection.
    unsafe { dmul_scalar_avx2_impl(dst, src, mul) }
}

#[target_feature(enable = "avx2")]
unsafe fn dmul_scalar_avx2_impl(dst: &mut [f64], src: &[f64], mul: f64) {
    let m = _mm256_set1_pd(mul);
    let mut i = 0;
    while i + 4 <= dst.len() {
        let s = _mm256_loadu_pd(src.as_ptr().add(i));
        _mm256_storeu_pd(dst.as_mut_ptr().add(i), _mm256_mul_pd(s, m));
        i += 4;
    }
}

fn fmac_scalar_fma(dst: &mut [f32], src: &[f32], mul: f32) {
    contract(&[&*dst, src], 32, 16);
    // SAFETY: installed only for levels validated against AVX2+FMA detection.
    unsafe { fmac_scalar_fma_impl(dst, src, mul) }
}

#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn fmac_scalar_fma_impl(dst: &mut [f32], src: &[f32], mul: f32) {
    let m = _mm256_set1_ps(mul);
    let mut i = 0;
    while i + 8 <= dst.len() {
        let d = _mm256_loadu_ps(dst.as_ptr().add(i));
        let s = _mm256_loadu_ps(src.as_ptr().add(i));
        _mm256_storeu_ps(dst.as_mut_ptr().add(i), _mm256_fmadd_ps(s, m, d));
        i += 8;
    }
}

fn fmul_add_fma(dst: &mut [f32], src0: &[f32], src1: &[f32], src2: &[f32]) {
    contract(&[&*dst, src0, src1, src2], 32, 16);
    // SAFETY: installed only for levels validated against AVX2+FMA detection.
    unsafe { fmul_add_fma_impl(dst, src0, src1, src2) }
}

#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn fmul_add_fma_impl(dst: &mut [f32], src0: &[f32], src1: &[f32], src2: &[f32]) {
    let mut i = 0;
    while i + 8 <= dst.len() {
        let a = _mm256_loadu_ps(src0.as_ptr().add(i));
        let b = _mm256_loadu_ps(src1.as_ptr().add(i));
        let c = _mm256_loadu_ps(src2.as_ptr().add(i));
        _mm256_storeu_ps(dst.as_mut_ptr().add(i), _mm256_fmadd_ps(a, b, c));
        i += 8;
    }
}
