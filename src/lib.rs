// RSA License Library
// rsa: octet/integer codec, key generation, the modular transform and
// PKCS#1 v1.5 type 2 padding
// license: fingerprints, block framing, issuance and verification
// config: JSON configuration for the rsa-license tool

pub mod config;
pub mod license;
pub mod rsa;
pub mod util;

pub use license::{
    Fingerprint, FingerprintSource, Issuer, LicenseError, LicenseStatus, PayloadEncoding,
    Verifier,
};
pub use rsa::{RsaKeyPair, RsaPublicKey};
