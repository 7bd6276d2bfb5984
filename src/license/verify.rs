// License Verification
// Opens each fixed-width block with the public exponent, reassembles the
// fingerprint and checks it against the running machine and the expiry
// tolerance. Verification never writes the blob.

use std::path::Path;

use tracing::{debug, info, warn};

use super::error::{LicenseError, LicenseResult, LicenseStatus};
use super::fingerprint::{Fingerprint, FingerprintSource};
use super::framing::{deframe, BlockLayout};
use super::payload::PayloadEncoding;
use crate::rsa::{
    integer_to_octets, octets_to_integer, transform, unpad_pkcs1_v15, CryptoResult, RsaPublicKey,
};
use crate::util::read_file;

/// Days a license stays valid after issuance.
pub const DEFAULT_TOLERANCE_DAYS: i64 = 30;

/// A license that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedLicense {
    /// Fingerprint recovered from the blob.
    pub fingerprint: Fingerprint,
    /// Days between issuance and now.
    pub elapsed_days: i64,
}

/// Checks license blobs against the running machine.
#[derive(Debug, Clone)]
pub struct Verifier {
    key: RsaPublicKey,
    layout: BlockLayout,
    encoding: PayloadEncoding,
    tolerance_days: i64,
}

impl Verifier {
    pub fn new(key: RsaPublicKey) -> CryptoResult<Self> {
        let layout = BlockLayout::for_key(&key)?;
        Ok(Self {
            key,
            layout,
            encoding: PayloadEncoding::default(),
            tolerance_days: DEFAULT_TOLERANCE_DAYS,
        })
    }

    pub fn with_encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_tolerance_days(mut self, tolerance_days: i64) -> Self {
        self.tolerance_days = tolerance_days;
        self
    }

    pub fn tolerance_days(&self) -> i64 {
        self.tolerance_days
    }

    /// Verify `blob` against the freshly computed `current` fingerprint.
    pub fn verify(&self, blob: &[u8], current: &Fingerprint) -> LicenseResult<VerifiedLicense> {
        let width = self.encoding.block_width(self.layout.modulus_bytes());
        if blob.is_empty() || blob.len() % width != 0 {
            warn!(len = blob.len(), width, "license length is not a whole number of blocks");
            return Err(LicenseError::Missing(format!(
                "{} bytes is not a positive multiple of {width}",
                blob.len()
            )));
        }

        let ciphertext = self
            .encoding
            .decode_blob(blob)
            .map_err(|e| LicenseError::Corrupt(e.to_string()))?;

        let payload = open_blocks(&ciphertext, &self.key, self.layout)
            .map_err(|e| LicenseError::Corrupt(e.to_string()))?;

        let text = self
            .encoding
            .unpack(&payload)
            .map_err(|e| LicenseError::Corrupt(e.to_string()))?;

        let stored =
            Fingerprint::parse(&text).map_err(|e| LicenseError::Corrupt(e.to_string()))?;

        if stored.fields() != current.fields() {
            warn!("license fingerprint does not match this machine");
            return Err(LicenseError::MachineMismatch);
        }

        let elapsed_days = current
            .day_count()
            .checked_sub(stored.day_count())
            .ok_or_else(|| {
                LicenseError::Corrupt(format!(
                    "day counters {} and {} are too far apart",
                    stored.day_count(),
                    current.day_count()
                ))
            })?;
        if elapsed_days > self.tolerance_days {
            warn!(elapsed_days, tolerance = self.tolerance_days, "license expired");
            return Err(LicenseError::Expired {
                elapsed_days,
                tolerance_days: self.tolerance_days,
            });
        }
        if elapsed_days < 0 {
            warn!(elapsed_days, "license issued after the current date");
        }

        info!(elapsed_days, "license valid");
        Ok(VerifiedLicense {
            fingerprint: stored,
            elapsed_days,
        })
    }

    /// Read the blob at `path` and verify it.
    pub fn verify_file(&self, path: &Path, current: &Fingerprint) -> LicenseResult<VerifiedLicense> {
        let blob = read_file(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "cannot read license");
            LicenseError::Missing(format!("{}: {e}", path.display()))
        })?;
        self.verify(&blob, current)
    }

    /// Verify the file at `path` against a fingerprint taken from `source`.
    pub fn verify_with_source(
        &self,
        path: &Path,
        source: &dyn FingerprintSource,
    ) -> LicenseResult<VerifiedLicense> {
        let current = source.fingerprint()?;
        self.verify_file(path, &current)
    }

    /// Collapse a file verification into its caller-facing outcome.
    pub fn status(&self, path: &Path, current: &Fingerprint) -> LicenseStatus {
        LicenseStatus::from(&self.verify_file(path, current))
    }
}

/// Open every `modulus_bytes` block of `ciphertext` with the public exponent
/// and concatenate the recovered payloads.
pub fn open_blocks(
    ciphertext: &[u8],
    key: &RsaPublicKey,
    layout: BlockLayout,
) -> CryptoResult<Vec<u8>> {
    let k = layout.modulus_bytes();
    let mut chunks = Vec::with_capacity(ciphertext.len() / k);

    for (index, block) in ciphertext.chunks(k).enumerate() {
        let c = octets_to_integer(block, k);
        let m = transform(&c, &key.public_exponent, &key.modulus)?;
        let padded = integer_to_octets(&m, k)?;
        let chunk = unpad_pkcs1_v15(&padded, k)?;
        debug!(block = index, len = chunk.len(), "opened block");
        chunks.push(chunk);
    }

    Ok(deframe(chunks))
}
