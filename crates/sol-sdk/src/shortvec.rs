//! Compact length prefixes ("shortvec" encoding).
//!
//! Every variable-length array in the wire format is prefixed with its
//! element count encoded as 7-bit groups in little-endian group order,
//! with the high bit (0x80) of each byte as the continuation flag:
//!
//! - 0..=0x7f            -> 1 byte
//! - 0x80..=0x3fff       -> 2 bytes
//! - 0x4000..=0x1f_ffff  -> 3 bytes, and so on up to u32::MAX (5 bytes)

use crate::error::SdkError;

/// Encode a length as a compact prefix. Values up to `u32::MAX` are
/// supported, which comfortably covers every array in the format.
pub fn encode_len(len: usize) -> Vec<u8> {
    debug_assert!(len <= u32::MAX as usize);
    let mut rem = len as u64;
    let mut out = Vec::with_capacity(5);

    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if rem == 0 {
            break;
        }
    }

    out
}

/// Longest valid encoding: five 7-bit groups cover the u32 range.
const MAX_ENCODING_BYTES: usize = 5;

/// Decode a compact length prefix, returning the value and the unconsumed
/// remainder of the input. Running out of input mid-prefix, or a prefix
/// longer than five bytes, is a fatal parse failure.
pub fn decode_len(bytes: &[u8]) -> Result<(usize, &[u8]), SdkError> {
    let mut len: u64 = 0;
    let mut size = 0usize;

    loop {
        let elem = *bytes.get(size).ok_or_else(|| {
            SdkError::SerializationError("unexpected end of data while decoding length".into())
        })?;
        len |= u64::from(elem & 0x7f) << (size * 7);
        size += 1;
        if elem & 0x80 == 0 {
            break;
        }
        if size >= MAX_ENCODING_BYTES {
            return Err(SdkError::SerializationError(
                "length prefix longer than 5 bytes".into(),
            ));
        }
    }

    if len > u32::MAX as u64 {
        return Err(SdkError::SerializationError("length prefix overflow".into()));
    }

    Ok((len as usize, &bytes[size..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_zero() {
        assert_eq!(encode_len(0), vec![0x00]);
    }

    #[test]
    fn encode_one_byte_max() {
        assert_eq!(encode_len(0x7f), vec![0x7f]);
    }

    #[test]
    fn encode_boundary_128() {
        // 128 = 0x80 -> two bytes: (0x00 | 0x80), 0x01
        assert_eq!(encode_len(128), vec![0x80, 0x01]);
    }

    #[test]
    fn encode_two_byte_max() {
        // 16383 = 0x3fff -> two bytes: (0x7f | 0x80), 0x7f
        assert_eq!(encode_len(16383), vec![0xff, 0x7f]);
    }

    #[test]
    fn encode_boundary_16384() {
        assert_eq!(encode_len(16384), vec![0x80, 0x80, 0x01]);
    }

    #[test]
    fn encode_u32_max() {
        // 2^32 - 1 needs five 7-bit groups.
        assert_eq!(
            encode_len(u32::MAX as usize),
            vec![0xff, 0xff, 0xff, 0xff, 0x0f]
        );
    }

    #[test]
    fn roundtrip_boundary_values() {
        for value in [0usize, 1, 127, 128, 16383, 16384, 4294967295] {
            let encoded = encode_len(value);
            let (decoded, rest) = decode_len(&encoded).unwrap();
            assert_eq!(decoded, value, "roundtrip failed for {value}");
            assert!(rest.is_empty());
        }
    }

    #[test]
    fn decode_returns_remainder() {
        let mut bytes = encode_len(300);
        bytes.extend_from_slice(&[0xaa, 0xbb]);
        let (value, rest) = decode_len(&bytes).unwrap();
        assert_eq!(value, 300);
        assert_eq!(rest, &[0xaa, 0xbb]);
    }

    #[test]
    fn decode_empty_input_fails() {
        assert!(decode_len(&[]).is_err());
    }

    #[test]
    fn decode_truncated_continuation_fails() {
        // Continuation bit set but no following byte.
        assert!(decode_len(&[0x80]).is_err());
    }

    #[test]
    fn decode_overlong_continuation_fails() {
        // Ten continuation bytes would shift past the accumulator width;
        // anything past five bytes must be rejected, not evaluated.
        let mut bytes = vec![0x80u8; 10];
        bytes.push(0x01);
        let err = decode_len(&bytes).unwrap_err();
        assert!(err.to_string().contains("longer than 5 bytes"));
    }

    #[test]
    fn decode_five_bytes_with_continuation_fails() {
        // Exactly at the boundary: a fifth byte may terminate the prefix
        // but not continue it.
        assert!(decode_len(&[0xff, 0xff, 0xff, 0xff, 0x8f, 0x00]).is_err());
    }
}
