// License Issuance
// Frames the packed fingerprint, pads each chunk, signs it with the private
// exponent and concatenates the fixed-width ciphertext blocks

use std::path::Path;

use rand::{thread_rng, Rng};
use tracing::{debug, info};

use super::error::LicenseResult;
use super::fingerprint::Fingerprint;
use super::framing::BlockLayout;
use super::payload::PayloadEncoding;
use crate::rsa::{
    integer_to_octets, octets_to_integer, pad_pkcs1_v15, transform, CryptoResult, RsaKeyPair,
};
use crate::util::write_file_atomic;

/// Signs fingerprints into license blobs.
#[derive(Debug, Clone)]
pub struct Issuer {
    key: RsaKeyPair,
    layout: BlockLayout,
    encoding: PayloadEncoding,
}

impl Issuer {
    pub fn new(key: RsaKeyPair) -> CryptoResult<Self> {
        let layout = BlockLayout::new(key.modulus_bytes())?;
        Ok(Self {
            key,
            layout,
            encoding: PayloadEncoding::default(),
        })
    }

    pub fn with_encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    /// Produce the blob bytes for `fingerprint`.
    ///
    /// Fingerprints stamped before the epoch are refused.
    pub fn issue(&self, fingerprint: &Fingerprint) -> LicenseResult<Vec<u8>> {
        self.issue_with_rng(fingerprint, &mut thread_rng())
    }

    pub fn issue_with_rng<R: Rng + ?Sized>(
        &self,
        fingerprint: &Fingerprint,
        rng: &mut R,
    ) -> LicenseResult<Vec<u8>> {
        fingerprint.check_day_count()?;
        let payload = self.encoding.pack(&fingerprint.to_bytes());
        let ciphertext = sign_payload(&payload, &self.key, self.layout, rng)?;
        Ok(self.encoding.encode_blob(&ciphertext))
    }

    /// Issue and overwrite the license file at `path`. Returns the number of
    /// bytes written.
    pub fn issue_to_file(&self, fingerprint: &Fingerprint, path: &Path) -> LicenseResult<usize> {
        let blob = self.issue(fingerprint)?;
        write_file_atomic(path, &blob)?;

        info!(
            path = %path.display(),
            bytes = blob.len(),
            day = fingerprint.day_count(),
            "license issued"
        );
        Ok(blob.len())
    }
}

/// Frame `payload` and sign every chunk with the private exponent.
///
/// Output is `blocks * modulus_bytes` octets; block order follows chunk
/// order.
pub fn sign_payload<R: Rng + ?Sized>(
    payload: &[u8],
    key: &RsaKeyPair,
    layout: BlockLayout,
    rng: &mut R,
) -> CryptoResult<Vec<u8>> {
    let k = layout.modulus_bytes();
    let chunks = layout.frame(payload);
    let mut out = Vec::with_capacity(chunks.len() * k);

    for (index, chunk) in chunks.iter().enumerate() {
        let padded = pad_pkcs1_v15(chunk, k, rng)?;
        let m = octets_to_integer(&padded, k);
        let s = transform(&m, &key.private_exponent, &key.modulus)?;
        out.extend_from_slice(&integer_to_octets(&s, k)?);
        debug!(block = index, len = chunk.len(), "signed block");
    }

    Ok(out)
}
