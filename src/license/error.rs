// License Errors
// Failures of issuance and verification, and the caller-facing status

use std::fmt;
use std::io;

use thiserror::Error;

use super::fingerprint::{CollectorError, FingerprintError};
use crate::rsa::CryptoError;

/// License-level failures.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Blob absent, unreadable, or not a whole number of blocks.
    #[error("license missing: {0}")]
    Missing(String),

    /// A block failed to verify or the recovered content is malformed.
    #[error("license corrupt: {0}")]
    Corrupt(String),

    /// License was issued for different machine fields.
    #[error("license was issued for a different machine")]
    MachineMismatch,

    /// Too many days since issuance.
    #[error("license expired: issued {elapsed_days} days ago, tolerance is {tolerance_days}")]
    Expired {
        elapsed_days: i64,
        tolerance_days: i64,
    },

    /// Primitive failure during issuance.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Fingerprint could not be parsed.
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),

    /// Fingerprint could not be collected.
    #[error(transparent)]
    Collector(#[from] CollectorError),

    /// Writing the blob failed.
    #[error("license I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

/// Caller-facing outcome of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseStatus {
    Valid,
    Missing,
    MachineMismatch,
    Expired,
    Corrupt,
}

impl LicenseStatus {
    pub fn is_valid(self) -> bool {
        self == LicenseStatus::Valid
    }
}

impl<T> From<&LicenseResult<T>> for LicenseStatus {
    fn from(result: &LicenseResult<T>) -> Self {
        match result {
            Ok(_) => LicenseStatus::Valid,
            // A machine that cannot be identified cannot match
            Err(LicenseError::MachineMismatch | LicenseError::Collector(_)) => {
                LicenseStatus::MachineMismatch
            }
            Err(LicenseError::Expired { .. }) => LicenseStatus::Expired,
            Err(LicenseError::Missing(_) | LicenseError::Io(_)) => LicenseStatus::Missing,
            // Anything else means the recovered content cannot be trusted
            Err(_) => LicenseStatus::Corrupt,
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LicenseStatus::Valid => "valid",
            LicenseStatus::Missing => "missing",
            LicenseStatus::MachineMismatch => "machine mismatch",
            LicenseStatus::Expired => "expired",
            LicenseStatus::Corrupt => "corrupt",
        };
        f.write_str(text)
    }
}
