// License Module - Main module file
// The issuer signs a machine fingerprint block by block with the private
// exponent; the protected program opens the blocks with the public exponent
// and compares the recovered fingerprint with its own

pub mod error;
pub mod fingerprint;
pub mod framing;
pub mod issue;
pub mod payload;
pub mod verify;

pub use error::{LicenseError, LicenseResult, LicenseStatus};
pub use fingerprint::{
    current_day_count, day_count_at, CollectorError, Fingerprint, FingerprintError,
    FingerprintSource, StaticFingerprintSource, SystemFingerprintSource,
};
pub use framing::{deframe, frame, BlockLayout};
pub use issue::{sign_payload, Issuer};
pub use payload::{PayloadEncoding, PayloadError};
pub use verify::{open_blocks, VerifiedLicense, Verifier, DEFAULT_TOLERANCE_DAYS};
