// Block Framing
// The payload is cut into chunks that each fit one padded block. No block
// count or length is transmitted: the number of blocks follows from the blob
// length and the final chunk length from the padding separator, so framer and
// padding codec take the block size from the same BlockLayout

use crate::rsa::{CryptoError, CryptoResult, RsaPublicKey, PADDING_OVERHEAD};

/// Block geometry derived from the modulus width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    modulus_bytes: usize,
}

impl BlockLayout {
    /// Fails when the modulus leaves no room for even one payload octet.
    pub fn new(modulus_bytes: usize) -> CryptoResult<Self> {
        if modulus_bytes <= PADDING_OVERHEAD {
            return Err(CryptoError::InvalidKeySize((modulus_bytes * 8) as u32));
        }
        Ok(Self { modulus_bytes })
    }

    pub fn for_key(key: &RsaPublicKey) -> CryptoResult<Self> {
        Self::new(key.modulus_bytes())
    }

    /// Octets per ciphertext block (and per padded plaintext block).
    pub fn modulus_bytes(&self) -> usize {
        self.modulus_bytes
    }

    /// Maximum payload octets carried by one block.
    pub fn plain_block_size(&self) -> usize {
        self.modulus_bytes - PADDING_OVERHEAD
    }

    pub fn frame<'a>(&self, payload: &'a [u8]) -> Vec<&'a [u8]> {
        frame(payload, self.plain_block_size())
    }
}

/// Split `payload` into chunks of `plain_block_size`, the last one holding
/// the remainder.
///
/// An empty payload still yields one (empty) chunk so that there is always a
/// signed block to check.
pub fn frame(payload: &[u8], plain_block_size: usize) -> Vec<&[u8]> {
    if payload.is_empty() || plain_block_size == 0 {
        return vec![payload];
    }
    payload.chunks(plain_block_size).collect()
}

/// Concatenate decoded chunks in order.
pub fn deframe<I>(chunks: I) -> Vec<u8>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    chunks.into_iter().fold(Vec::new(), |mut acc, chunk| {
        acc.extend_from_slice(chunk.as_ref());
        acc
    })
}
