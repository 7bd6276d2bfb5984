// RSA Big Integer Operations
// Octet string conversions and number theory on top of num-bigint

use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::thread_rng;

use super::error::{CryptoError, CryptoResult};

/// RSA Big Integer type alias
pub type RsaBigInt = BigUint;

/// Miller-Rabin rounds used by `next_prime`
pub const PRIMALITY_ROUNDS: u32 = 20;

const SMALL_PRIMES: [u32; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Create a big integer from u64
pub fn from_u64(n: u64) -> RsaBigInt {
    RsaBigInt::from(n)
}

/// OS2IP: interpret `length` octets as a big-endian unsigned integer.
///
/// Callers pass exactly `length` octets. Anything past `length` is ignored and
/// a shorter slice is read as-is; there is no error path.
pub fn octets_to_integer(bytes: &[u8], length: usize) -> RsaBigInt {
    let end = length.min(bytes.len());
    RsaBigInt::from_bytes_be(&bytes[..end])
}

/// I2OSP: render `value` as exactly `length` big-endian octets, zero padded
/// on the left.
///
/// Fails with `IntegerTooLarge` when `value >= 256^length`.
pub fn integer_to_octets(value: &RsaBigInt, length: usize) -> CryptoResult<Vec<u8>> {
    if value.bits() > (length as u64) * 8 {
        return Err(CryptoError::IntegerTooLarge { length });
    }

    let mut out = vec![0u8; length];
    if value.is_zero() {
        return Ok(out);
    }

    let digits = value.to_bytes_be();
    let start = length - digits.len();
    out[start..].copy_from_slice(&digits);
    Ok(out)
}

/// Modular exponentiation: base^exp mod modulus
/// Uses square-and-multiply algorithm
pub fn mod_pow(base: &RsaBigInt, exp: &RsaBigInt, modulus: &RsaBigInt) -> RsaBigInt {
    if modulus.is_one() {
        return RsaBigInt::zero();
    }

    let mut result = RsaBigInt::one();
    let mut base = base % modulus;
    let mut exp = exp.clone();

    while !exp.is_zero() {
        if exp.is_odd() {
            result = (&result * &base) % modulus;
        }
        base = (&base * &base) % modulus;
        exp >>= 1;
    }

    result
}

/// Compute modular inverse: a^(-1) mod m
/// Returns None if inverse doesn't exist
pub fn mod_inverse(a: &RsaBigInt, m: &RsaBigInt) -> Option<RsaBigInt> {
    if m.is_zero() {
        return None;
    }

    let m_signed = BigInt::from_biguint(Sign::Plus, m.clone());
    let mut old_r = BigInt::from_biguint(Sign::Plus, a % m);
    let mut r = m_signed.clone();
    let mut old_s = BigInt::one();
    let mut s = BigInt::zero();

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return None;
    }

    old_s.mod_floor(&m_signed).to_biguint()
}

/// Greatest common divisor
pub fn gcd(a: &RsaBigInt, b: &RsaBigInt) -> RsaBigInt {
    a.gcd(b)
}

/// Miller-Rabin primality test
/// Returns true if n is probably prime
pub fn is_probable_prime(n: &RsaBigInt, iterations: u32) -> bool {
    let two = RsaBigInt::from(2u8);
    if n < &two {
        return false;
    }
    if n == &two {
        return true;
    }
    if n.is_even() {
        return false;
    }

    for &p in SMALL_PRIMES.iter() {
        let p = RsaBigInt::from(p);
        if n == &p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    // Write n-1 as d * 2^s with d odd
    let n_minus_one = n - 1u32;
    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    let mut rng = thread_rng();
    let n_minus_two = n - &two;

    'witness: for _ in 0..iterations {
        let a = rng.gen_biguint_range(&two, &n_minus_two);
        let mut x = mod_pow(&a, &d, n);

        if x.is_one() || x == n_minus_one {
            continue;
        }

        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }

        return false;
    }

    true
}

/// Smallest probable prime that is >= n
pub fn next_prime(n: &RsaBigInt) -> RsaBigInt {
    let two = RsaBigInt::from(2u8);
    if n <= &two {
        return two;
    }

    let mut candidate = n.clone();
    if candidate.is_even() {
        candidate += 1u8;
    }
    while !is_probable_prime(&candidate, PRIMALITY_ROUNDS) {
        candidate += 2u8;
    }
    candidate
}

/// Serde adapter storing a big integer as a decimal string
pub mod decimal {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::RsaBigInt;

    pub fn serialize<S: Serializer>(value: &RsaBigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RsaBigInt, D::Error> {
        let text = String::deserialize(deserializer)?;
        RsaBigInt::parse_bytes(text.trim().as_bytes(), 10)
            .ok_or_else(|| D::Error::custom(format!("not a decimal integer: {text:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_pow() {
        // 3^5 mod 7 = 243 mod 7 = 5
        let base = from_u64(3);
        let exp = from_u64(5);
        let modulus = from_u64(7);
        assert_eq!(mod_pow(&base, &exp, &modulus), from_u64(5));
    }

    #[test]
    fn test_mod_pow_matches_num_bigint() {
        let base = from_u64(0xdead_beef);
        let exp = from_u64(65537);
        let modulus = from_u64(0xffff_fffb);
        assert_eq!(mod_pow(&base, &exp, &modulus), base.modpow(&exp, &modulus));
    }

    #[test]
    fn test_mod_inverse() {
        // 3 * 5 = 15 ≡ 1 mod 7
        let a = from_u64(3);
        let m = from_u64(7);
        let inv = mod_inverse(&a, &m).unwrap();
        assert_eq!(inv, from_u64(5));
        assert_eq!((a * inv) % m, from_u64(1));
    }

    #[test]
    fn test_mod_inverse_textbook_key() {
        // 17 * 2753 ≡ 1 mod 3120
        let e = from_u64(17);
        let phi = from_u64(3120);
        let d = mod_inverse(&e, &phi).unwrap();
        assert_eq!(d, from_u64(2753));
    }

    #[test]
    fn test_mod_inverse_missing() {
        assert!(mod_inverse(&from_u64(6), &from_u64(9)).is_none());
    }

    #[test]
    fn test_is_probable_prime() {
        assert!(is_probable_prime(&from_u64(2), 5));
        assert!(is_probable_prime(&from_u64(3), 5));
        assert!(is_probable_prime(&from_u64(7), 5));
        assert!(is_probable_prime(&from_u64(104_729), 5));
        assert!(!is_probable_prime(&from_u64(4), 5));
        assert!(!is_probable_prime(&from_u64(9), 5));
        // Carmichael number
        assert!(!is_probable_prime(&from_u64(561), 5));
    }

    #[test]
    fn test_next_prime() {
        assert_eq!(next_prime(&from_u64(0)), from_u64(2));
        assert_eq!(next_prime(&from_u64(14)), from_u64(17));
        assert_eq!(next_prime(&from_u64(17)), from_u64(17));
        assert_eq!(next_prime(&from_u64(104_724)), from_u64(104_729));
    }

    #[test]
    fn test_octets_to_integer() {
        assert_eq!(octets_to_integer(&[0x00, 0x01, 0x00], 3), from_u64(256));
        assert_eq!(octets_to_integer(&[], 0), from_u64(0));
    }

    #[test]
    fn test_integer_to_octets_pads_left() {
        let out = integer_to_octets(&from_u64(0x0102), 4).unwrap();
        assert_eq!(out, vec![0x00, 0x00, 0x01, 0x02]);
        assert_eq!(integer_to_octets(&from_u64(0), 3).unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn test_integer_to_octets_boundary() {
        for length in 0..=16usize {
            let limit = RsaBigInt::one() << (8 * length);
            let largest = &limit - 1u8;

            let out = integer_to_octets(&largest, length).unwrap();
            assert_eq!(out.len(), length);
            assert!(out.iter().all(|&b| b == 0xff));

            assert_eq!(
                integer_to_octets(&limit, length),
                Err(CryptoError::IntegerTooLarge { length })
            );
        }
    }

    #[test]
    fn test_decimal_serde() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(with = "decimal")]
            value: RsaBigInt,
        }

        let json = serde_json::to_string(&Wrapper { value: from_u64(65537) }).unwrap();
        assert_eq!(json, r#"{"value":"65537"}"#);

        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value, from_u64(65537));

        assert!(serde_json::from_str::<Wrapper>(r#"{"value":"12ab"}"#).is_err());
    }
}
