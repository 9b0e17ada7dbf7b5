//! The float DSP capability table and its initializer
//!
//! [`FloatDsp`] is the one public entry point of this crate: a plain value
//! holding one function reference per vector operation, selected once at
//! construction time. Codec code keeps a `FloatDsp` around (typically built
//! at decoder start-up) and calls operations through it in hot loops; it
//! never names an architecture-specific kernel directly.
//!
//! Initialization fills every entry with the portable reference kernel, then
//! runs an ordered list of per-architecture override passes. Each pass
//! overwrites only the entries it can improve for the selected level and
//! strictness, so the table is complete by construction — there is no
//! failure path and no partially-populated state.
//!
//! Once built, the table is immutable. It carries no interior state, so any
//! number of threads may invoke the same or different entries concurrently
//! on disjoint buffers without coordination.

use crate::error::{DspError, Result};
use crate::kernels::scalar;
use crate::SimdLevel;

pub(crate) type FmulFn = fn(&mut [f32], &[f32], &[f32]);
pub(crate) type FmacScalarFn = fn(&mut [f32], &[f32], f32);
pub(crate) type FmulScalarFn = fn(&mut [f32], &[f32], f32);
pub(crate) type DmulScalarFn = fn(&mut [f64], &[f64], f64);
pub(crate) type FmulWindowFn = fn(&mut [f32], &[f32], &[f32], &[f32]);
pub(crate) type FmulAddFn = fn(&mut [f32], &[f32], &[f32], &[f32]);
pub(crate) type FmulReverseFn = fn(&mut [f32], &[f32], &[f32]);
pub(crate) type ButterfliesFn = fn(&mut [f32], &mut [f32]);

/// An architecture override pass. Runs after the reference fill and may
/// overwrite any subset of entries; leaving an entry untouched means the
/// reference stands for that operation.
type OverridePass = fn(&mut FloatDsp);

/// Override passes in selection order. The initializer is architecture
/// agnostic: it only walks this list, and on targets with no specialized
/// kernels the list is empty and the reference kernels are authoritative.
#[cfg(target_arch = "x86_64")]
const OVERRIDE_PASSES: &[OverridePass] = &[crate::kernels::x86::install];
#[cfg(target_arch = "aarch64")]
const OVERRIDE_PASSES: &[OverridePass] = &[crate::kernels::neon::install];
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
const OVERRIDE_PASSES: &[OverridePass] = &[];

/// Runtime-selected table of float DSP kernels.
///
/// # Buffer contracts
///
/// Every operation requires all of its buffers to have equal length, a
/// length that is a multiple of the documented stride, and the documented
/// alignment (see [`AlignedBuf`](crate::AlignedBuf)). These are caller
/// obligations checked only in debug builds; release builds perform no
/// validation and violating a contract there is undefined by this crate's
/// interface. Rust's borrow rules already rule out source/destination
/// overlap at these signatures.
///
/// # Strict mode
///
/// A table built with `strict = true` contains only kernels that are
/// bit-for-bit identical to the reference implementation; in particular it
/// excludes FMA-fused multiply-adds, whose single-rounding intermediates
/// diverge from plain IEEE-754 mul-then-add.
///
/// # Examples
///
/// ```
/// use onda::{AlignedBuf, FloatDsp};
///
/// let dsp = FloatDsp::new(false);
/// let src0 = AlignedBuf::from_slice(&[3.0f32; 16]).unwrap();
/// let src1 = AlignedBuf::from_slice(&[0.5f32; 16]).unwrap();
/// let mut dst = AlignedBuf::<f32>::zeroed(16).unwrap();
///
/// dsp.vector_fmul(&mut dst, &src0, &src1);
/// assert_eq!(&dst[..], &[1.5f32; 16]);
/// ```
#[derive(Clone, Copy)]
pub struct FloatDsp {
    pub(crate) vector_fmul: FmulFn,
    pub(crate) vector_fmac_scalar: FmacScalarFn,
    pub(crate) vector_fmul_scalar: FmulScalarFn,
    pub(crate) vector_dmul_scalar: DmulScalarFn,
    pub(crate) vector_fmul_window: FmulWindowFn,
    pub(crate) vector_fmul_add: FmulAddFn,
    pub(crate) vector_fmul_reverse: FmulReverseFn,
    pub(crate) butterflies: ButterfliesFn,
    pub(crate) level: SimdLevel,
    pub(crate) strict: bool,
}

impl FloatDsp {
    /// Build a table with the best kernels for the running CPU.
    ///
    /// `strict` restricts selection to kernels that match the reference
    /// implementation bit-for-bit. Construction cannot fail: the reference
    /// kernels are the unconditional floor for every entry.
    pub fn new(strict: bool) -> Self {
        Self::init(SimdLevel::detect(), strict)
    }

    /// Build a table for a specific SIMD level (for testing and benchmarks).
    ///
    /// # Errors
    ///
    /// Returns [`DspError::UnsupportedLevel`] if the running CPU cannot
    /// execute kernels of `level`.
    ///
    /// # Examples
    ///
    /// ```
    /// use onda::{FloatDsp, SimdLevel};
    ///
    /// let reference = FloatDsp::with_level(SimdLevel::Scalar, true).unwrap();
    /// assert_eq!(reference.level(), SimdLevel::Scalar);
    /// ```
    pub fn with_level(level: SimdLevel, strict: bool) -> Result<Self> {
        if !level.is_supported() {
            return Err(DspError::UnsupportedLevel(level));
        }
        Ok(Self::init(level, strict))
    }

    fn init(level: SimdLevel, strict: bool) -> Self {
        // Step 1: every entry starts at the portable reference.
        let mut dsp = Self {
            vector_fmul: scalar::vector_fmul,
            vector_fmac_scalar: scalar::vector_fmac_scalar,
            vector_fmul_scalar: scalar::vector_fmul_scalar,
            vector_dmul_scalar: scalar::vector_dmul_scalar,
            vector_fmul_window: scalar::vector_fmul_window,
            vector_fmul_add: scalar::vector_fmul_add,
            vector_fmul_reverse: scalar::vector_fmul_reverse,
            butterflies: scalar::butterflies,
            level,
            strict,
        };

        // Step 2: let each architecture pass upgrade what it can.
        for pass in OVERRIDE_PASSES {
            pass(&mut dsp);
        }

        tracing::debug!(level = ?dsp.level, strict = dsp.strict, "float DSP table initialized");
        dsp
    }

    /// SIMD level this table was built for
    pub fn level(&self) -> SimdLevel {
        self.level
    }

    /// Whether this table was built in strict (bit-exact) mode
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// `dst[i] = src0[i] * src1[i]`
    ///
    /// Contract: 32-byte aligned, lengths equal and a multiple of 16.
    #[inline]
    pub fn vector_fmul(&self, dst: &mut [f32], src0: &[f32], src1: &[f32]) {
        (self.vector_fmul)(dst, src0, src1);
    }

    /// `dst[i] += src[i] * mul`
    ///
    /// Contract: 32-byte aligned, lengths equal and a multiple of 16.
    #[inline]
    pub fn vector_fmac_scalar(&self, dst: &mut [f32], src: &[f32], mul: f32) {
        (self.vector_fmac_scalar)(dst, src, mul);
    }

    /// `dst[i] = src[i] * mul`
    ///
    /// Contract: 16-byte aligned, lengths equal and a multiple of 4.
    #[inline]
    pub fn vector_fmul_scalar(&self, dst: &mut [f32], src: &[f32], mul: f32) {
        (self.vector_fmul_scalar)(dst, src, mul);
    }

    /// `dst[i] = src[i] * mul`, double precision
    ///
    /// Contract: 32-byte aligned, lengths equal and a multiple of 8.
    #[inline]
    pub fn vector_dmul_scalar(&self, dst: &mut [f64], src: &[f64], mul: f64) {
        (self.vector_dmul_scalar)(dst, src, mul);
    }

    /// Windowed overlap-add: `dst[i] = src0[i] * win[len-1-i] - src1[i] * win[i]`
    ///
    /// The cross-fade used by MDCT-based coders to reconstruct a frame from
    /// the previous frame's tail (`src0`) and the current frame's head
    /// (`src1`); `win` is the rising half of a window whose full length is
    /// `2 * len`.
    ///
    /// Contract: 16-byte aligned, lengths equal and a multiple of 4.
    #[inline]
    pub fn vector_fmul_window(
        &self,
        dst: &mut [f32],
        src0: &[f32],
        src1: &[f32],
        win: &[f32],
    ) {
        (self.vector_fmul_window)(dst, src0, src1, win);
    }

    /// `dst[i] = src0[i] * src1[i] + src2[i]`
    ///
    /// Contract: 32-byte aligned, lengths equal and a multiple of 16.
    #[inline]
    pub fn vector_fmul_add(&self, dst: &mut [f32], src0: &[f32], src1: &[f32], src2: &[f32]) {
        (self.vector_fmul_add)(dst, src0, src1, src2);
    }

    /// `dst[i] = src0[i] * src1[len-1-i]` — second operand consumed back-to-front
    ///
    /// Contract: 32-byte aligned, lengths equal and a multiple of 16.
    #[inline]
    pub fn vector_fmul_reverse(&self, dst: &mut [f32], src0: &[f32], src1: &[f32]) {
        (self.vector_fmul_reverse)(dst, src0, src1);
    }

    /// Radix-2 butterfly: `(v1[i], v2[i]) = (v1[i] + v2[i], v1[i] - v2[i])`
    ///
    /// Both vectors are mutated in place.
    ///
    /// Contract: 16-byte aligned, lengths equal and a multiple of 4.
    #[inline]
    pub fn butterflies(&self, v1: &mut [f32], v2: &mut [f32]) {
        (self.butterflies)(v1, v2);
    }
}

impl std::fmt::Debug for FloatDsp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloatDsp")
            .field("level", &self.level)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlignedBuf;

    fn buf(data: &[f32]) -> AlignedBuf<f32> {
        AlignedBuf::from_slice(data).unwrap()
    }

    /// Every level the running CPU can execute, reference first.
    fn supported_levels() -> Vec<SimdLevel> {
        [
            SimdLevel::Scalar,
            SimdLevel::Sse2,
            SimdLevel::Avx2,
            SimdLevel::Neon,
        ]
        .into_iter()
        .filter(|level| level.is_supported())
        .collect()
    }

    #[test]
    fn test_new_uses_detected_level() {
        let dsp = FloatDsp::new(false);
        assert_eq!(dsp.level(), SimdLevel::detect());
        assert!(!dsp.strict());
    }

    #[test]
    fn test_with_level_rejects_unsupported() {
        #[cfg(target_arch = "x86_64")]
        let foreign = SimdLevel::Neon;
        #[cfg(not(target_arch = "x86_64"))]
        let foreign = SimdLevel::Avx2;

        let result = FloatDsp::with_level(foreign, false);
        assert_eq!(result.unwrap_err(), DspError::UnsupportedLevel(foreign));
    }

    #[test]
    fn test_with_level_scalar_always_works() {
        let dsp = FloatDsp::with_level(SimdLevel::Scalar, true).unwrap();
        assert_eq!(dsp.level(), SimdLevel::Scalar);
        assert!(dsp.strict());
    }

    /// Table completeness: all eight entries are callable for every
    /// supported level and both strictness settings.
    #[test]
    fn test_all_entries_populated_for_every_level() {
        for level in supported_levels() {
            for strict in [false, true] {
                let dsp = FloatDsp::with_level(level, strict).unwrap();

                let a = buf(&[1.0; 16]);
                let b = buf(&[2.0; 16]);
                let c = buf(&[3.0; 16]);
                let mut dst = AlignedBuf::<f32>::zeroed(16).unwrap();

                dsp.vector_fmul(&mut dst, &a, &b);
                assert_eq!(&dst[..], &[2.0; 16], "{level:?} strict={strict}");
                dsp.vector_fmac_scalar(&mut dst, &a, 1.0);
                assert_eq!(&dst[..], &[3.0; 16]);
                dsp.vector_fmul_scalar(&mut dst, &a, 4.0);
                assert_eq!(&dst[..], &[4.0; 16]);
                dsp.vector_fmul_add(&mut dst, &a, &b, &c);
                assert_eq!(&dst[..], &[5.0; 16]);
                dsp.vector_fmul_reverse(&mut dst, &b, &c);
                assert_eq!(&dst[..], &[6.0; 16]);

                let win = buf(&[0.5; 16]);
                dsp.vector_fmul_window(&mut dst, &b, &a, &win);
                assert_eq!(&dst[..], &[0.5; 16]);

                let mut v1 = buf(&[5.0; 16]);
                let mut v2 = buf(&[3.0; 16]);
                dsp.butterflies(&mut v1, &mut v2);
                assert_eq!(&v1[..], &[8.0; 16]);
                assert_eq!(&v2[..], &[2.0; 16]);

                let d = AlignedBuf::from_slice(&[1.5f64; 8]).unwrap();
                let mut dd = AlignedBuf::<f64>::zeroed(8).unwrap();
                dsp.vector_dmul_scalar(&mut dd, &d, 2.0);
                assert_eq!(&dd[..], &[3.0f64; 8]);
            }
        }
    }

    #[test]
    fn test_table_is_pure_value() {
        // Identical inputs through the same table produce identical outputs.
        let dsp = FloatDsp::new(false);
        let src0 = buf(&[1.0, -2.0, 3.5, 0.0, 7.25, -0.5, 100.0, 1.0e-3].repeat(2));
        let src1 = buf(&[0.5; 16]);
        let mut first = AlignedBuf::<f32>::zeroed(16).unwrap();
        let mut second = AlignedBuf::<f32>::zeroed(16).unwrap();
        dsp.vector_fmul(&mut first, &src0, &src1);
        dsp.vector_fmul(&mut second, &src0, &src1);
        assert_eq!(&first[..], &second[..]);
    }

    #[test]
    fn test_table_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FloatDsp>();
    }

    #[test]
    fn test_debug_formatting_names_level() {
        let dsp = FloatDsp::with_level(SimdLevel::Scalar, false).unwrap();
        let text = format!("{dsp:?}");
        assert!(text.contains("Scalar"), "{text}");
    }
}
