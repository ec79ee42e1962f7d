//! Firmware status codes.
//!
//! A reduced `EFI_STATUS` surface covering the codes the MOK manager
//! actually produces or propagates. The numeric values match the UEFI error
//! code assignments (the high "error" bit is implied and omitted).

use thiserror::Error;

/// Status returned by firmware-facing operations.
///
/// `Success` never travels through `Err`; fallible operations return
/// `Result<T, Status>` where the error is one of the failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Status {
    #[error("EFI_SUCCESS")]
    Success,
    #[error("EFI_INVALID_PARAMETER")]
    InvalidParameter,
    #[error("EFI_UNSUPPORTED")]
    Unsupported,
    #[error("EFI_BUFFER_TOO_SMALL")]
    BufferTooSmall,
    #[error("EFI_DEVICE_ERROR")]
    DeviceError,
    #[error("EFI_OUT_OF_RESOURCES")]
    OutOfResources,
    #[error("EFI_NOT_FOUND")]
    NotFound,
    #[error("EFI_ACCESS_DENIED")]
    AccessDenied,
    #[error("EFI_TIMEOUT")]
    Timeout,
    /// Any other firmware error, carrying the raw code.
    #[error("EFI_ERROR({0})")]
    Other(u64),
}

impl Status {
    /// The UEFI error code number (without the high error bit).
    pub fn code(self) -> u64 {
        match self {
            Self::Success => 0,
            Self::InvalidParameter => 2,
            Self::Unsupported => 3,
            Self::BufferTooSmall => 5,
            Self::DeviceError => 7,
            Self::OutOfResources => 9,
            Self::NotFound => 14,
            Self::AccessDenied => 15,
            Self::Timeout => 18,
            Self::Other(code) => code,
        }
    }

    /// Maps `Success` to `Ok(())` and anything else to `Err(self)`.
    pub fn into_result(self) -> Result<(), Status> {
        match self {
            Self::Success => Ok(()),
            err => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Status::Success.code(), 0);
        assert_eq!(Status::NotFound.code(), 14);
        assert_eq!(Status::AccessDenied.code(), 15);
        assert_eq!(Status::Other(33).code(), 33);
    }

    #[test]
    fn test_into_result() {
        assert!(Status::Success.into_result().is_ok());
        assert_eq!(
            Status::AccessDenied.into_result(),
            Err(Status::AccessDenied)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::NotFound.to_string(), "EFI_NOT_FOUND");
        assert_eq!(Status::Other(33).to_string(), "EFI_ERROR(33)");
    }
}
