//! Shared test helpers for license tests.

#![allow(dead_code)]

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rsa_license::rsa::generate_keypair_with_rng;
use rsa_license::RsaKeyPair;

/// Fields used by the machine-mismatch scenario; only the CPU id differs.
pub const ISSUED_FIELDS: &str = "AA:BB:CC,10.0.0.1,SN123,CPU456";
pub const OTHER_CPU_FIELDS: &str = "AA:BB:CC,10.0.0.1,SN123,CPU999";

/// A 512-bit key pair generated once per test binary from a fixed seed.
pub fn test_keypair() -> &'static RsaKeyPair {
    static KEY: OnceLock<RsaKeyPair> = OnceLock::new();
    KEY.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        generate_keypair_with_rng(512, &mut rng).expect("test key generation")
    })
}

/// A 1024-bit key pair, the reference modulus size.
pub fn reference_keypair() -> &'static RsaKeyPair {
    static KEY: OnceLock<RsaKeyPair> = OnceLock::new();
    KEY.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(1024);
        generate_keypair_with_rng(1024, &mut rng).expect("reference key generation")
    })
}
