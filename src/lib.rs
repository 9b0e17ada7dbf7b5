//! Onda: Runtime-Dispatched Float DSP Kernels for Audio Codecs
//!
//! **Onda** (Spanish: "wave") provides the small set of vector-math primitives
//! that transform-based audio codecs spend most of their time in: elementwise
//! multiplies, scalar multiply-accumulates, windowed overlap-add for MDCT
//! frame reconstruction, reversed multiplies, and radix-2 butterflies.
//!
//! # Design Principles
//!
//! - **One table, many callers**: a [`FloatDsp`] value holds one function
//!   reference per operation, selected once at construction and never swapped
//!   afterward. Callers invoke operations through the table, never through
//!   architecture-specific names.
//! - **Runtime dispatch**: the best kernel for the running CPU is picked via
//!   feature detection (AVX2/SSE2 on x86_64, NEON on aarch64), with a
//!   portable scalar reference as the unconditional fallback.
//! - **Strict mode**: constructing with `strict = true` excludes any kernel
//!   whose rounding can diverge from plain IEEE-754 arithmetic (FMA fusion),
//!   guaranteeing bit-exact agreement with the reference kernels.
//! - **Contracts, not checks**: alignment, length-multiple, and equal-length
//!   preconditions are caller obligations, asserted in debug builds and free
//!   in release builds. [`AlignedBuf`] makes the alignment contract easy to
//!   satisfy.
//! - **Zero unsafe in the public API**: `unsafe` is isolated inside the
//!   architecture kernel modules.
//!
//! # Quick Start
//!
//! ```rust
//! use onda::{AlignedBuf, FloatDsp};
//!
//! let dsp = FloatDsp::new(false);
//!
//! let src0 = AlignedBuf::from_slice(&[1.0f32; 16]).unwrap();
//! let src1 = AlignedBuf::from_slice(&[2.0f32; 16]).unwrap();
//! let mut dst = AlignedBuf::<f32>::zeroed(16).unwrap();
//!
//! dsp.vector_fmul(&mut dst, &src0, &src1);
//! assert_eq!(&dst[..], &[2.0f32; 16]);
//! ```

pub mod aligned;
pub mod dsp;
pub mod error;
pub mod kernels;

pub use aligned::AlignedBuf;
pub use dsp::FloatDsp;
pub use error::{DspError, Result};

/// SIMD capability level a [`FloatDsp`] table is built for.
///
/// Levels are instruction-set families, not individual kernels: a table built
/// for [`SimdLevel::Avx2`] may still carry SSE2 or scalar entries for
/// operations where the wider unit buys nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    /// Portable reference kernels (no SIMD)
    Scalar,
    /// SSE2 (x86_64 baseline, 128-bit)
    Sse2,
    /// AVX2 with FMA (256-bit)
    Avx2,
    /// ARM NEON (128-bit)
    Neon,
}

impl SimdLevel {
    /// Detect the best level available on the running CPU.
    ///
    /// **x86_64**: AVX2 (requires both `avx2` and `fma`) > SSE2.
    /// **aarch64**: NEON (architectural baseline).
    /// **Other platforms**: Scalar.
    ///
    /// Detection is deterministic: repeated calls return the same level.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            detect_x86_level()
        }

        #[cfg(target_arch = "aarch64")]
        {
            SimdLevel::Neon
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            SimdLevel::Scalar
        }
    }

    /// Whether the running CPU can execute kernels of this level.
    pub fn is_supported(self) -> bool {
        match self {
            SimdLevel::Scalar => true,
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Sse2 => is_x86_feature_detected!("sse2"),
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Avx2 => {
                is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
            }
            #[cfg(target_arch = "aarch64")]
            SimdLevel::Neon => true,
            _ => false,
        }
    }
}

/// Detect the best SIMD level on x86_64
#[cfg(target_arch = "x86_64")]
fn detect_x86_level() -> SimdLevel {
    if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
        return SimdLevel::Avx2;
    }
    // SSE2 is the x86_64 baseline, but honor the detection result anyway.
    if is_x86_feature_detected!("sse2") {
        return SimdLevel::Sse2;
    }
    SimdLevel::Scalar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_enum() {
        assert_eq!(SimdLevel::Scalar, SimdLevel::Scalar);
        assert_ne!(SimdLevel::Scalar, SimdLevel::Avx2);
    }

    #[test]
    fn test_scalar_always_supported() {
        assert!(SimdLevel::Scalar.is_supported());
    }

    #[test]
    fn test_detect_returns_supported_level() {
        assert!(SimdLevel::detect().is_supported());
    }

    #[test]
    fn test_detect_is_deterministic() {
        let level1 = SimdLevel::detect();
        let level2 = SimdLevel::detect();
        assert_eq!(level1, level2);
    }

    #[test]
    fn test_detect_x86_baseline() {
        // x86_64 guarantees SSE2, so Scalar should never win there.
        #[cfg(target_arch = "x86_64")]
        {
            let level = SimdLevel::detect();
            assert_ne!(level, SimdLevel::Scalar);
            assert!(matches!(level, SimdLevel::Sse2 | SimdLevel::Avx2));
        }
    }

    #[test]
    fn test_foreign_levels_unsupported() {
        #[cfg(target_arch = "x86_64")]
        assert!(!SimdLevel::Neon.is_supported());

        #[cfg(target_arch = "aarch64")]
        {
            assert!(!SimdLevel::Sse2.is_supported());
            assert!(!SimdLevel::Avx2.is_supported());
        }
    }
}
