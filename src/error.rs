//! Error types for Onda operations
//!
//! The kernel hot path has no error surface at all: alignment, length, and
//! overlap preconditions are contracts checked only by debug assertions.
//! Errors exist solely at the edges — forcing an unsupported SIMD level and
//! allocating aligned buffers.

use thiserror::Error;

use crate::SimdLevel;

/// Result type for Onda operations
pub type Result<T> = std::result::Result<T, DspError>;

/// Errors that can occur outside the kernel hot path
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DspError {
    /// SIMD level not executable on the running CPU
    #[error("SIMD level not supported on this CPU: {0:?}")]
    UnsupportedLevel(SimdLevel),

    /// Aligned buffer allocation failed
    #[error("failed to allocate {bytes} bytes with 32-byte alignment")]
    AllocationFailed {
        /// Requested allocation size in bytes
        bytes: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_level_error() {
        let err = DspError::UnsupportedLevel(SimdLevel::Avx2);
        assert_eq!(err.to_string(), "SIMD level not supported on this CPU: Avx2");
    }

    #[test]
    fn test_allocation_failed_error() {
        let err = DspError::AllocationFailed { bytes: 4096 };
        assert_eq!(
            err.to_string(),
            "failed to allocate 4096 bytes with 32-byte alignment"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DspError::AllocationFailed { bytes: 64 };
        let err2 = DspError::AllocationFailed { bytes: 64 };
        assert_eq!(err1, err2);
    }
}
