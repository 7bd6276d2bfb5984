// Payload Encoding
// Bit-payload packing and on-disk blob encoding

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors turning decoded octets back into fingerprint text.
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("license text is not hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("octet {value:#04x} at offset {offset} is not a bit pair")]
    StrayOctet { offset: usize, value: u8 },

    #[error("bit payload of {0} octets does not end on a byte boundary")]
    Truncated(usize),
}

/// How the fingerprint is packed into block payloads and how ciphertext is
/// stored.
///
/// `LegacyHex` reproduces the files written by the earlier issuing tool,
/// which treated a string of `'0'`/`'1'` characters as hex digits: every
/// payload octet carries two bits as its nibbles (`00`, `01`, `10`, `11`) and
/// the ciphertext is stored as lowercase hex text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadEncoding {
    #[default]
    Raw,
    LegacyHex,
}

impl PayloadEncoding {
    /// Bytes occupied on disk by one ciphertext block.
    pub fn block_width(self, modulus_bytes: usize) -> usize {
        match self {
            PayloadEncoding::Raw => modulus_bytes,
            PayloadEncoding::LegacyHex => modulus_bytes * 2,
        }
    }

    /// Fingerprint bytes to bit-payload, eight bits per byte, MSB first.
    pub fn pack(self, text: &[u8]) -> Vec<u8> {
        match self {
            PayloadEncoding::Raw => text.to_vec(),
            PayloadEncoding::LegacyHex => text
                .iter()
                .flat_map(|&byte| {
                    (0..4).map(move |pair| {
                        let shift = 6 - 2 * pair;
                        let hi = (byte >> (shift + 1)) & 1;
                        let lo = (byte >> shift) & 1;
                        (hi << 4) | lo
                    })
                })
                .collect(),
        }
    }

    /// Inverse of [`pack`](Self::pack).
    pub fn unpack(self, payload: &[u8]) -> Result<Vec<u8>, PayloadError> {
        match self {
            PayloadEncoding::Raw => Ok(payload.to_vec()),
            PayloadEncoding::LegacyHex => {
                if payload.len() % 4 != 0 {
                    return Err(PayloadError::Truncated(payload.len()));
                }

                let mut text = Vec::with_capacity(payload.len() / 4);
                for (index, quad) in payload.chunks(4).enumerate() {
                    let mut byte = 0u8;
                    for (pos, &value) in quad.iter().enumerate() {
                        let (hi, lo) = (value >> 4, value & 0x0f);
                        if hi > 1 || lo > 1 {
                            return Err(PayloadError::StrayOctet {
                                offset: index * 4 + pos,
                                value,
                            });
                        }
                        byte = (byte << 2) | (hi << 1) | lo;
                    }
                    text.push(byte);
                }
                Ok(text)
            }
        }
    }

    /// Ciphertext octets to the bytes written to disk.
    pub fn encode_blob(self, ciphertext: &[u8]) -> Vec<u8> {
        match self {
            PayloadEncoding::Raw => ciphertext.to_vec(),
            PayloadEncoding::LegacyHex => hex::encode(ciphertext).into_bytes(),
        }
    }

    /// Bytes read from disk to ciphertext octets.
    pub fn decode_blob(self, blob: &[u8]) -> Result<Vec<u8>, PayloadError> {
        match self {
            PayloadEncoding::Raw => Ok(blob.to_vec()),
            PayloadEncoding::LegacyHex => Ok(hex::decode(blob)?),
        }
    }
}
