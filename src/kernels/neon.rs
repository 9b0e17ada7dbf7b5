//! aarch64 NEON kernels (128-bit)
//!
//! NEON is architectural baseline on aarch64, so the pass installs whenever
//! the table level is [`SimdLevel::Neon`]. AArch64 NEON arithmetic is fully
//! IEEE-754 compliant (no flush-to-zero surprises as on 32-bit ARM), so the
//! unfused kernels are bit-identical to the reference; the `vfmaq` fused
//! variants of the two accumulating operations round once and install only
//! when the table is not strict.
//!
//! # Safety
//!
//! Same discipline as the x86 module: `unsafe fn` intrinsic bodies behind
//! `#[target_feature]`, safe wrappers installed only for a level the running
//! CPU supports. No scalar tails; the length-multiple contract makes the
//! 4-wide (f32) and 2-wide (f64) loops exact.

use std::arch::aarch64::*;

use super::contract;
use crate::dsp::FloatDsp;
use crate::SimdLevel;

/// aarch64 override pass.
pub(crate) fn install(dsp: &mut FloatDsp) {
    if dsp.level != SimdLevel::Neon {
        return;
    }

    dsp.vector_fmul = fmul_neon;
    dsp.vector_fmac_scalar = fmac_scalar_neon;
    dsp.vector_fmul_scalar = fmul_scalar_neon;
    dsp.vector_dmul_scalar = dmul_scalar_neon;
    dsp.vector_fmul_window = fmul_window_neon;
    dsp.vector_fmul_add = fmul_add_neon;
    dsp.vector_fmul_reverse = fmul_reverse_neon;
    dsp.butterflies = butterflies_neon;

    if !dsp.strict {
        // Fused multiply-add rounds once where the reference rounds twice;
        // excluded from strict tables.
        dsp.vector_fmac_scalar = fmac_scalar_neon_fused;
        dsp.vector_fmul_add = fmul_add_neon_fused;
    }
}

/// Reverse the four lanes of a vector: [a b c d] -> [d c b a]
#[inline(always)]
unsafe fn reverse_f32(v: float32x4_t) -> float32x4_t {
    let half_swapped = vrev64q_f32(v);
    vextq_f32::<2>(half_swapped, half_swapped)
}

fn fmul_neon(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    contract(&[&*dst, src0, src1], 32, 16);
    // SAFETY: installed only for the NEON level on aarch64.
    unsafe { fmul_neon_impl(dst, src0, src1) }
}

#[target_feature(enable = "neon")]
unsafe fn fmul_neon_impl(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    let mut i = 0;
    while i + 4 <= dst.len() {
        let a = vld1q_f32(src0.as_ptr().add(i));
        let b = vld1q_f32(src1.as_ptr().add(i));
        vst1q_f32(dst.as_mut_ptr().add(i), vmulq_f32(a, b));
        i += 4;
    }
}

fn fmac_scalar_neon(dst: &mut [f32], src: &[f32], mul: f32) {
    contract(&[&*dst, src], 32, 16);
    // SAFETY: installed only for the NEON level on aarch64.
    unsafe { fmac_scalar_neon_impl(dst, src, mul) }
}

#[target_feature(enable = "neon")]
unsafe fn fmac_scalar_neon_impl(dst: &mut [f32], src: &[f32], mul: f32) {
    let mut i = 0;
    while i + 4 <= dst.len() {
        let d = vld1q_f32(dst.as_ptr().add(i));
        let s = vld1q_f32(src.as_ptr().add(i));
        // Separate multiply and add keep this bit-exact with the reference.
        vst1q_f32(dst.as_mut_ptr().add(i), vaddq_f32(d, vmulq_n_f32(s, mul)));
        i += 4;
    }
}

fn fmac_scalar_neon_fused(dst: &mut [f32], src: &[f32], mul: f32) {
    contract(&[&*dst, src], 32, 16);
    // SAFETY: installed only for the NEON level on aarch64.
    unsafe { fmac_scalar_neon_fused_impl(dst, src, mul) }
}

#[target_feature(enable = "neon")]
unsafe fn fmac_scalar_neon_fused_impl(dst: &mut [f32], src: &[f32], mul: f32) {
    let mut i = 0;
    while i + 4 <= dst.len() {
        let d = vld1q_f32(dst.as_ptr().add(i));
        let s = vld1q_f32(src.as_ptr().add(i));
        vst1q_f32(dst.as_mut_ptr().add(i), vfmaq_n_f32(d, s, mul));
        i += 4;
    }
}

fn fmul_scalar_neon(dst: &mut [f32], src: &[f32], mul: f32) {
    contract(&[&*dst, src], 16, 4);
    // SAFETY: installed only for the NEON level on aarch64.
    unsafe { fmul_scalar_neon_impl(dst, src, mul) }
}

#[target_feature(enable = "neon")]
unsafe fn fmul_scalar_neon_impl(dst: &mut [f32], src: &[f32], mul: f32) {
    let mut i = 0;
    while i + 4 <= dst.len() {
        let s = vld1q_f32(src.as_ptr().add(i));
        vst1q_f32(dst.as_mut_ptr().add(i), vmulq_n_f32(s, mul));
        i += 4;
    }
}

fn dmul_scalar_neon(dst: &mut [f64], src: &[f64], mul: f64) {
    contract(&[&*dst, src], 32, 8);
    // SAFETY: installed only for the NEON level on aarch64.
    unsafe { dmul_scalar_neon_impl(dst, src, mul) }
}

#[target_feature(enable = "neon")]
unsafe fn dmul_scalar_neon_impl(dst: &mut [f64], src: &[f64], mul: f64) {
    let mut i = 0;
    while i + 2 <= dst.len() {
        let s = vld1q_f64(src.as_ptr().add(i));
        vst1q_f64(dst.as_mut_ptr().add(i), vmulq_n_f64(s, mul));
        i += 2;
    }
}

fn fmul_window_neon(dst: &mut [f32], src0: &[f32], src1: &[f32], win: &[f32]) {
    contract(&[&*dst, src0, src1, win], 16, 4);
    // SAFETY: installed only for the NEON level on aarch64.
    unsafe { fmul_window_neon_impl(dst, src0, src1, win) }
}

#[target_feature(enable = "neon")]
unsafe fn fmul_window_neon_impl(dst: &mut [f32], src0: &[f32], src1: &[f32], win: &[f32]) {
    let len = dst.len();
    let mut i = 0;
    while i + 4 <= len {
        let s0 = vld1q_f32(src0.as_ptr().add(i));
        let s1 = vld1q_f32(src1.as_ptr().add(i));
        let wi = vld1q_f32(win.as_ptr().add(i));
        let wr = reverse_f32(vld1q_f32(win.as_ptr().add(len - i - 4)));
        let r = vsubq_f32(vmulq_f32(s0, wr), vmulq_f32(s1, wi));
        vst1q_f32(dst.as_mut_ptr().add(i), r);
        i += 4;
    }
}

fn fmul_add_neon(dst: &mut [f32], src0: &[f32], src1: &[f32], src2: &[f32]) {
    contract(&[&*dst, src0, src1, src2], 32, 16);
    // SAFETY: installed only for the NEON level on aarch64.
    unsafe { fmul_add_neon_impl(dst, src0, src1, src2) }
}

#[target_feature(enable = "neon")]
unsafe fn fmul_add_neon_impl(dst: &mut [f32], src0: &[f32], src1: &[f32], src2: &[f32]) {
    let mut i = 0;
    while i + 4 <= dst.len() {
        let a = vld1q_f32(src0.as_ptr().add(i));
        let b = vld1q_f32(src1.as_ptr().add(i));
        let c = vld1q_f32(src2.as_ptr().add(i));
        vst1q_f32(dst.as_mut_ptr().add(i), vaddq_f32(vmulq_f32(a, b), c));
        i += 4;
    }
}

fn fmul_add_neon_fused(dst: &mut [f32], src0: &[f32], src1: &[f32], src2: &[f32]) {
    contract(&[&*dst, src0, src1, src2], 32, 16);
    // SAFETY: installed only for the NEON level on aarch64.
    unsafe { fmul_add_neon_fused_impl(dst, src0, src1, src2) }
}

#[target_feature(enable = "neon")]
unsafe fn fmul_add_neon_fused_impl(dst: &mut [f32], src0: &[f32], src1: &[f32], src2: &[f32]) {
    let mut i = 0;
    while i + 4 <= dst.len() {
        let a = vld1q_f32(src0.as_ptr().add(i));
        let b = vld1q_f32(src1.as_ptr().add(i));
        let c = vld1q_f32(src2.as_ptr().add(i));
        vst1q_f32(dst.as_mut_ptr().add(i), vfmaq_f32(c, a, b));
        i += 4;
    }
}

fn fmul_reverse_neon(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    contract(&[&*dst, src0, src1], 32, 16);
    // SAFETY: installed only for the NEON level on aarch64.
    unsafe { fmul_reverse_neon_impl(dst, src0, src1) }
}

#[target_feature(enable = "neon")]
unsafe fn fmul_reverse_neon_impl(dst: &mut [f32], src0: &[f32], src1: &[f32]) {
    let len = dst.len();
    let mut i = 0;
    while i + 4 <= len {
        let a = vld1q_f32(src0.as_ptr().add(i));
        let b = reverse_f32(vld1q_f32(src1.as_ptr().add(len - i - 4)));
        vst1q_f32(dst.as_mut_ptr().add(i), vmulq_f32(a, b));
        i += 4;
    }
}

fn butterflies_neon(v1: &mut [f32], v2: &mut [f32]) {
    contract(&[&*v1, &*v2], 16, 4);
    // SAFETY: installed only for the NEON level on aarch64.
    unsafe { butterflies_neon_impl(v1, v2) }
}

#[target_feature(enable = "neon")]
unsafe fn butterflies_neon_impl(v1: &mut [f32], v2: &mut [f32]) {
    let mut i = 0;
    while i + 4 <= v1.len() {
        let a = vld1q_f32(v1.as_ptr().add(i));
        let b = vld1q_f32(v2.as_ptr().add(i));
        vst1q_f32(v1.as_mut_ptr().add(i), vaddq_f32(a, b));
        vst1q_f32(v2.as_mut_ptr().add(i), vsubq_f32(a, b));
        i += 4;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::scalar;
    use crate::AlignedBuf;

    fn ramp(len: usize) -> AlignedBuf<f32> {
        let data: Vec<f32> = (0..len).map(|i| (i as f32 - 7.5) * 0.37).collect();
        AlignedBuf::from_slice(&data).unwrap()
    }

    #[test]
    fn test_neon_kernels_match_reference_bit_for_bit() {
        let src0 = ramp(32);
        let src1 = ramp(32);
        let src2 = ramp(32);

        let mut fast = AlignedBuf::<f32>::zeroed(32).unwrap();
        let mut reference = AlignedBuf::<f32>::zeroed(32).unwrap();

        fmul_neon(&mut fast, &src0, &src1);
        scalar::vector_fmul(&mut reference, &src0, &src1);
        assert_eq!(&fast[..], &reference[..]);

        fmul_reverse_neon(&mut fast, &src0, &src1);
        scalar::vector_fmul_reverse(&mut reference, &src0, &src1);
        assert_eq!(&fast[..], &reference[..]);

        fmul_add_neon(&mut fast, &src0, &src1, &src2);
        scalar::vector_fmul_add(&mut reference, &src0, &src1, &src2);
        assert_eq!(&fast[..], &reference[..]);

        fmul_window_neon(&mut fast, &src0, &src1, &src2);
        scalar::vector_fmul_window(&mut reference, &src0, &src1, &src2);
        assert_eq!(&fast[..], &reference[..]);

        let mut fast_acc = ramp(32);
        let mut ref_acc = fast_acc.clone();
        fmac_scalar_neon(&mut fast_acc, &src0, 2.75);
        scalar::vector_fmac_scalar(&mut ref_acc, &src0, 2.75);
        assert_eq!(&fast_acc[..], &ref_acc[..]);

        fmul_scalar_neon(&mut fast, &src0, -0.125);
        scalar::vector_fmul_scalar(&mut reference, &src0, -0.125);
        assert_eq!(&fast[..], &reference[..]);

        let mut v1a = ramp(32);
        let mut v2a = ramp(32);
        let mut v1b = v1a.clone();
        let mut v2b = v2a.clone();
        butterflies_neon(&mut v1a, &mut v2a);
        scalar::butterflies(&mut v1b, &mut v2b);
        assert_eq!(&v1a[..], &v1b[..]);
        assert_eq!(&v2a[..], &v2b[..]);

        let dsrc =
            AlignedBuf::from_slice(&(0..16).map(|i| i as f64 * 0.7 - 3.0).collect::<Vec<_>>())
                .unwrap();
        let mut dfast = AlignedBuf::<f64>::zeroed(16).unwrap();
        let mut dref = AlignedBuf::<f64>::zeroed(16).unwrap();
        dmul_scalar_neon(&mut dfast, &dsrc, 1.0 / 3.0);
        scalar::vector_dmul_scalar(&mut dref, &dsrc, 1.0 / 3.0);
        assert_eq!(&dfast[..], &dref[..]);
    }

    #[test]
    fn test_fused_kernels_within_tolerance_of_reference() {
        let src0 = ramp(48);
        let src1 = ramp(48);
        let src2 = ramp(48);

        let mut fast = AlignedBuf::<f32>::zeroed(48).unwrap();
        let mut reference = AlignedBuf::<f32>::zeroed(48).unwrap();
        fmul_add_neon_fused(&mut fast, &src0, &src1, &src2);
        scalar::vector_fmul_add(&mut reference, &src0, &src1, &src2);
        for i in 0..48 {
            let scale = reference[i].abs().max(1.0);
            assert!((fast[i] - reference[i]).abs() <= 1e-6 * scale, "index {i}");
        }

        let mut fast_acc = ramp(48);
        let mut ref_acc = fast_acc.clone();
        fmac_scalar_neon_fused(&mut fast_acc, &src0, 0.33);
        scalar::vector_fmac_scalar(&mut ref_acc, &src0, 0.33);
        for i in 0..48 {
            let scale = ref_acc[i].abs().max(1.0);
            assert!((fast_acc[i] - ref_acc[i]).abs() <= 1e-6 * scale, "index {i}");
        }
    }

    #[test]
    fn test_install_respects_strict() {
        let strict = crate::FloatDsp::with_level(SimdLevel::Neon, true).unwrap();
        let fast = crate::FloatDsp::with_level(SimdLevel::Neon, false).unwrap();
        assert!(strict.vector_fmac_scalar as usize == fmac_scalar_neon as usize);
        assert!(fast.vector_fmac_scalar as usize == fmac_scalar_neon_fused as usize);
    }
}
