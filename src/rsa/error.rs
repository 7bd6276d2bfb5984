// RSA Primitive Errors
// Failures raised by the bignum codec, the RSA primitive and the padding codec

use thiserror::Error;

/// Errors produced below the license protocol layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Value does not fit the requested octet width.
    #[error("integer too large for a {length}-octet string")]
    IntegerTooLarge { length: usize },

    /// Base of a modular exponentiation is not below the modulus.
    #[error("message representative out of range")]
    OutOfRange,

    /// Chunk exceeds what one padded block can carry.
    #[error("payload too long: max {max} bytes, got {actual}")]
    PayloadTooLong { max: usize, actual: usize },

    /// Decoded block fails the type-2 structural checks.
    #[error("invalid padding: {0}")]
    PaddingInvalid(&'static str),

    /// Prime search gave up after the retry budget.
    #[error("key generation failed after {0} attempts")]
    KeyGenerationFailed(u32),

    /// Modulus size the generator does not support.
    #[error("unsupported modulus size: {0} bits")]
    InvalidKeySize(u32),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
