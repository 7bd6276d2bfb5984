// RSA Module - Main module file
// Exports the bignum codec, key generation, transform and padding

pub mod bigint;
pub mod error;
pub mod keygen;
pub mod padding;
pub mod transform;

pub use bigint::{integer_to_octets, octets_to_integer, RsaBigInt};
pub use error::{CryptoError, CryptoResult};
pub use keygen::{generate_keypair, generate_keypair_with_rng, RsaKeyPair, RsaPublicKey};
pub use padding::{pad_pkcs1_v15, unpad_pkcs1_v15, PADDING_OVERHEAD};
pub use transform::transform;
