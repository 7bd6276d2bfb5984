// PKCS#1 v1.5 Padding
// Block type 2 encoding over raw octets

use rand::Rng;

use super::error::{CryptoError, CryptoResult};

/// Marker octets, minimum filler and separator
pub const PADDING_OVERHEAD: usize = 11;

/// Minimum number of non-zero filler octets
pub const MIN_FILLER_LEN: usize = 8;

const BLOCK_TYPE: u8 = 0x02;

/// PKCS#1 v1.5 type 2 padding
/// Format: 0x00 || 0x02 || PS || 0x00 || payload
/// PS = `block_size - payload.len() - 3` random non-zero octets (at least 8)
pub fn pad_pkcs1_v15<R: Rng + ?Sized>(
    payload: &[u8],
    block_size: usize,
    rng: &mut R,
) -> CryptoResult<Vec<u8>> {
    let max = block_size.saturating_sub(PADDING_OVERHEAD);
    if block_size < PADDING_OVERHEAD || payload.len() > max {
        return Err(CryptoError::PayloadTooLong {
            max,
            actual: payload.len(),
        });
    }

    let ps_len = block_size - payload.len() - 3;

    let mut block = Vec::with_capacity(block_size);
    block.push(0x00);
    block.push(BLOCK_TYPE);
    block.extend((0..ps_len).map(|_| rng.gen_range(1..=u8::MAX)));
    block.push(0x00);
    block.extend_from_slice(payload);

    debug_assert_eq!(block.len(), block_size);
    Ok(block)
}

/// Remove PKCS#1 v1.5 type 2 padding
/// Validates the block structure and returns every octet after the separator
pub fn unpad_pkcs1_v15(block: &[u8], block_size: usize) -> CryptoResult<Vec<u8>> {
    if block.len() != block_size || block_size < PADDING_OVERHEAD {
        return Err(CryptoError::PaddingInvalid("wrong block length"));
    }

    if block[0] != 0x00 || block[1] != BLOCK_TYPE {
        return Err(CryptoError::PaddingInvalid("missing type 2 marker"));
    }

    let ps_len = block[2..]
        .iter()
        .position(|&b| b == 0x00)
        .ok_or(CryptoError::PaddingInvalid("no separator octet"))?;

    if ps_len < MIN_FILLER_LEN {
        return Err(CryptoError::PaddingInvalid("filler too short"));
    }

    Ok(block[2 + ps_len + 1..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const BLOCK: usize = 64;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_pad_layout() {
        let data = b"Hello";
        let padded = pad_pkcs1_v15(data, BLOCK, &mut rng()).unwrap();
        assert_eq!(padded.len(), BLOCK);

        assert_eq!(padded[0], 0x00);
        assert_eq!(padded[1], 0x02);
        assert_eq!(padded[BLOCK - data.len() - 1], 0x00);
        assert_eq!(&padded[BLOCK - data.len()..], data);

        // Filler is non-zero
        for &byte in &padded[2..BLOCK - data.len() - 1] {
            assert_ne!(byte, 0x00);
        }
    }

    #[test]
    fn test_pad_max_size() {
        // 64 - 11 = 53 octets fit, with exactly 8 filler octets
        let data = vec![0u8; 53];
        let padded = pad_pkcs1_v15(&data, BLOCK, &mut rng()).unwrap();
        assert_eq!(padded.len(), BLOCK);
        assert_eq!(padded[10], 0x00);
        assert_eq!(unpad_pkcs1_v15(&padded, BLOCK).unwrap(), data);
    }

    #[test]
    fn test_pad_too_large() {
        let data = vec![0u8; 54];
        assert_eq!(
            pad_pkcs1_v15(&data, BLOCK, &mut rng()),
            Err(CryptoError::PayloadTooLong { max: 53, actual: 54 })
        );
    }

    #[test]
    fn test_empty_payload() {
        let padded = pad_pkcs1_v15(&[], BLOCK, &mut rng()).unwrap();
        assert_eq!(padded[BLOCK - 1], 0x00);
        assert!(unpad_pkcs1_v15(&padded, BLOCK).unwrap().is_empty());
    }

    #[test]
    fn test_roundtrip() {
        let test_data: Vec<&[u8]> = vec![
            b"A",
            b"AB",
            b"Hello",
            b"Hello, World!",
            b"\x00\x00 leading zero octets survive",
        ];

        for data in test_data {
            let padded = pad_pkcs1_v15(data, BLOCK, &mut rng()).unwrap();
            assert_eq!(unpad_pkcs1_v15(&padded, BLOCK).unwrap(), data);
        }
    }

    #[test]
    fn test_invalid_marker() {
        let mut block = pad_pkcs1_v15(b"data", BLOCK, &mut rng()).unwrap();
        block[1] = 0x01;
        assert_eq!(
            unpad_pkcs1_v15(&block, BLOCK),
            Err(CryptoError::PaddingInvalid("missing type 2 marker"))
        );

        let mut block = pad_pkcs1_v15(b"data", BLOCK, &mut rng()).unwrap();
        block[0] = 0x01;
        assert!(unpad_pkcs1_v15(&block, BLOCK).is_err());
    }

    #[test]
    fn test_short_filler() {
        // Separator after only 7 filler octets
        let mut block = vec![0xAAu8; BLOCK];
        block[0] = 0x00;
        block[1] = 0x02;
        block[9] = 0x00;
        assert_eq!(
            unpad_pkcs1_v15(&block, BLOCK),
            Err(CryptoError::PaddingInvalid("filler too short"))
        );

        // Exactly 8 is fine
        block[9] = 0xAA;
        block[10] = 0x00;
        assert_eq!(unpad_pkcs1_v15(&block, BLOCK).unwrap().len(), BLOCK - 11);
    }

    #[test]
    fn test_missing_separator() {
        let mut block = vec![0xFFu8; BLOCK];
        block[0] = 0x00;
        block[1] = 0x02;
        assert_eq!(
            unpad_pkcs1_v15(&block, BLOCK),
            Err(CryptoError::PaddingInvalid("no separator octet"))
        );
    }

    #[test]
    fn test_wrong_length() {
        let block = pad_pkcs1_v15(b"data", BLOCK, &mut rng()).unwrap();
        assert!(unpad_pkcs1_v15(&block[1..], BLOCK).is_err());
    }
}
