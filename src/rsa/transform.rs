// RSA Transform
// The single modular exponentiation used for both signing (private exponent)
// and verifying (public exponent)

use super::bigint::{mod_pow, RsaBigInt};
use super::error::{CryptoError, CryptoResult};

/// Compute `base^exponent mod modulus`.
///
/// Fails with `OutOfRange` when `base >= modulus`.
pub fn transform(
    base: &RsaBigInt,
    exponent: &RsaBigInt,
    modulus: &RsaBigInt,
) -> CryptoResult<RsaBigInt> {
    if base >= modulus {
        return Err(CryptoError::OutOfRange);
    }
    Ok(mod_pow(base, exponent, modulus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::bigint::from_u64;

    // p = 61, q = 53, e = 17, d = 2753
    fn textbook() -> (RsaBigInt, RsaBigInt, RsaBigInt) {
        (from_u64(3233), from_u64(17), from_u64(2753))
    }

    #[test]
    fn test_transform_textbook() {
        let (n, e, d) = textbook();
        let c = transform(&from_u64(65), &e, &n).unwrap();
        assert_eq!(c, from_u64(2790));
        assert_eq!(transform(&c, &d, &n).unwrap(), from_u64(65));
    }

    #[test]
    fn test_transform_is_symmetric() {
        let (n, e, d) = textbook();
        for m in [0u64, 1, 2, 1000, 3232] {
            let m = from_u64(m);
            let signed = transform(&m, &d, &n).unwrap();
            assert_eq!(transform(&signed, &e, &n).unwrap(), m);
        }
    }

    #[test]
    fn test_transform_out_of_range() {
        let (n, e, _) = textbook();
        assert_eq!(transform(&n, &e, &n), Err(CryptoError::OutOfRange));
        assert_eq!(transform(&(&n + 1u8), &e, &n), Err(CryptoError::OutOfRange));
    }
}
