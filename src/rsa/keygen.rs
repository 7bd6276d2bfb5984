// RSA Key Generation
// Key pair types and the bounded prime search that produces them

use num_bigint::RandBigInt;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::bigint::{self, from_u64, gcd, mod_inverse, next_prime, RsaBigInt};
use super::error::{CryptoError, CryptoResult};

/// Fixed public exponent
pub const PUBLIC_EXPONENT: u64 = 65537;

/// Upper bound on full prime draws before giving up
pub const MAX_KEYGEN_ATTEMPTS: u32 = 256;

/// Smallest modulus the generator accepts
pub const MIN_MODULUS_BITS: u32 = 256;

/// RSA Public Key
///
/// The half of the key pair that ships with the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaPublicKey {
    #[serde(with = "bigint::decimal")]
    pub modulus: RsaBigInt,
    #[serde(with = "bigint::decimal")]
    pub public_exponent: RsaBigInt,
}

/// RSA Key Pair
///
/// Held by the issuing authority. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaKeyPair {
    #[serde(with = "bigint::decimal")]
    pub modulus: RsaBigInt,
    #[serde(with = "bigint::decimal")]
    pub public_exponent: RsaBigInt,
    #[serde(with = "bigint::decimal")]
    pub private_exponent: RsaBigInt,
}

impl RsaPublicKey {
    pub fn new(modulus: RsaBigInt, public_exponent: RsaBigInt) -> Self {
        Self {
            modulus,
            public_exponent,
        }
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u32 {
        (self.modulus_bytes() * 8) as u32
    }

    /// Width of the modulus in octets
    pub fn modulus_bytes(&self) -> usize {
        ((self.modulus.bits() + 7) / 8) as usize
    }
}

impl RsaKeyPair {
    pub fn from_parts(
        modulus: RsaBigInt,
        public_exponent: RsaBigInt,
        private_exponent: RsaBigInt,
    ) -> Self {
        Self {
            modulus,
            public_exponent,
            private_exponent,
        }
    }

    /// The verifier's half of this pair
    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey::new(self.modulus.clone(), self.public_exponent.clone())
    }

    /// Get the bit length of the key
    pub fn bit_length(&self) -> u32 {
        self.public_key().bit_length()
    }

    pub fn modulus_bytes(&self) -> usize {
        ((self.modulus.bits() + 7) / 8) as usize
    }
}

/// Generate an RSA key pair whose modulus is exactly `modulus_bits` wide,
/// using the thread-local random generator.
pub fn generate_keypair(modulus_bits: u32) -> CryptoResult<RsaKeyPair> {
    generate_keypair_with_rng(modulus_bits, &mut thread_rng())
}

/// Generate an RSA key pair from the given random source.
///
/// Each attempt draws two odd candidates of `modulus_bits/2 - 1` and
/// `modulus_bits/2 + 1` random bits and advances both to the next probable
/// prime. The attempt is discarded when the primes coincide, when
/// `gcd((p-1)(q-1), e) != 1`, or when the modulus does not fill exactly
/// `modulus_bits/8` octets.
pub fn generate_keypair_with_rng<R: Rng + ?Sized>(
    modulus_bits: u32,
    rng: &mut R,
) -> CryptoResult<RsaKeyPair> {
    if modulus_bits < MIN_MODULUS_BITS || modulus_bits % 16 != 0 {
        return Err(CryptoError::InvalidKeySize(modulus_bits));
    }

    let e = from_u64(PUBLIC_EXPONENT);
    let half_bits = u64::from(modulus_bits / 2);
    let modulus_bytes = (modulus_bits / 8) as u64;

    for attempt in 1..=MAX_KEYGEN_ATTEMPTS {
        let p = next_prime(&(rng.gen_biguint(half_bits - 1) | from_u64(1)));
        let q = next_prime(&(rng.gen_biguint(half_bits + 1) | from_u64(1)));
        if p == q {
            continue;
        }

        let n = &p * &q;
        let phi_n = (&p - 1u8) * (&q - 1u8);

        if (n.bits() + 7) / 8 != modulus_bytes {
            debug!(attempt, bits = n.bits(), "modulus width off, redrawing");
            continue;
        }
        if gcd(&phi_n, &e) != from_u64(1) {
            debug!(attempt, "public exponent not coprime with phi, redrawing");
            continue;
        }

        let d = match mod_inverse(&e, &phi_n) {
            Some(d) => d,
            None => continue,
        };

        debug!(attempt, modulus_bits, "key pair generated");
        return Ok(RsaKeyPair::from_parts(n, e, d));
    }

    Err(CryptoError::KeyGenerationFailed(MAX_KEYGEN_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::transform::transform;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_keypair(seed: u64) -> RsaKeyPair {
        let mut rng = StdRng::seed_from_u64(seed);
        generate_keypair_with_rng(512, &mut rng).unwrap()
    }

    #[test]
    fn test_key_generation() {
        let keypair = seeded_keypair(7);

        assert_eq!(keypair.bit_length(), 512);
        assert_eq!(keypair.modulus_bytes(), 64);
        assert_eq!(keypair.public_exponent, from_u64(PUBLIC_EXPONENT));

        // Top octet is non-zero
        let octets = keypair.modulus.to_bytes_be();
        assert_eq!(octets.len(), 64);
        assert_ne!(octets[0], 0);
    }

    #[test]
    fn test_key_properties() {
        let keypair = seeded_keypair(11);
        let e = &keypair.public_exponent;
        let d = &keypair.private_exponent;

        // e * d ≡ 1 (mod ord) is observable through the transform itself
        for m in [2u64, 3, 0xdead_beef, u64::MAX] {
            let m = from_u64(m);
            let s = transform(&m, d, &keypair.modulus).unwrap();
            assert_eq!(transform(&s, e, &keypair.modulus).unwrap(), m);
        }
    }

    #[test]
    fn test_random_messages_round_trip() {
        let keypair = seeded_keypair(3);
        let n = &keypair.modulus;
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..100 {
            let m = rng.gen_biguint_below(n);

            let signed = transform(&m, &keypair.private_exponent, n).unwrap();
            assert_eq!(transform(&signed, &keypair.public_exponent, n).unwrap(), m);

            let sealed = transform(&m, &keypair.public_exponent, n).unwrap();
            assert_eq!(transform(&sealed, &keypair.private_exponent, n).unwrap(), m);
        }
    }

    #[test]
    fn test_invalid_sizes() {
        assert_eq!(
            generate_keypair(128).unwrap_err(),
            CryptoError::InvalidKeySize(128)
        );
        assert_eq!(
            generate_keypair(520).unwrap_err(),
            CryptoError::InvalidKeySize(520)
        );
    }

    #[test]
    fn test_public_key_split() {
        let keypair = seeded_keypair(5);
        let public = keypair.public_key();
        assert_eq!(public.modulus, keypair.modulus);
        assert_eq!(public.modulus_bytes(), 64);
    }

    #[test]
    fn test_key_json_round_trip() {
        let keypair = seeded_keypair(13);
        let json = serde_json::to_string(&keypair).unwrap();
        assert!(json.contains(r#""public_exponent":"65537""#));

        let back: RsaKeyPair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, keypair);

        // A key pair file also reads as a public key
        let public: RsaPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(public, keypair.public_key());
    }
}
