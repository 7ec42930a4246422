//! Primitive encodings of the legacy file formats.
//!
//! Variable-length integers store 7 bits per byte, least significant group
//! first, with the high bit set on every byte but the last. Fixed-width
//! integers are big-endian.

/// Encode a u32 as a variable-length integer
pub fn encode_varint(mut value: u32, buf: &mut Vec<u8>) {
    loop {
        if value < 0x80 {
            buf.push(value as u8);
            break;
        }
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
}

/// Decode a variable-length integer from a slice
/// Returns (value, bytes_consumed)
pub fn decode_varint(buf: &[u8]) -> Option<(u32, usize)> {
    let mut result: u32 = 0;
    let mut shift = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 32 {
            return None; // Overflow
        }

        result |= ((byte & 0x7F) as u32) << shift;

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }

        shift += 7;
    }

    None // Incomplete
}

/// Encode a u64 as a variable-length integer
pub fn encode_varint_u64(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        if value < 0x80 {
            buf.push(value as u8);
            break;
        }
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
}

/// Decode a u64 variable-length integer
pub fn decode_varint_u64(buf: &[u8]) -> Option<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 64 {
            return None;
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }

        shift += 7;
    }

    None
}

/// Encode a signed "VInt". Negative values take the full five bytes.
pub fn encode_vint(value: i32, buf: &mut Vec<u8>) {
    encode_varint(value as u32, buf);
}

/// Encode a signed "VLong".
pub fn encode_vlong(value: i64, buf: &mut Vec<u8>) {
    encode_varint_u64(value as u64, buf);
}

/// Write a big-endian i32
pub fn encode_int(value: i32, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&value.to_be_bytes());
}

/// Write a big-endian i64
pub fn encode_long(value: i64, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&value.to_be_bytes());
}

/// Write a length-prefixed byte string
pub fn encode_string(bytes: &[u8], buf: &mut Vec<u8>) {
    encode_vint(bytes.len() as i32, buf);
    buf.extend_from_slice(bytes);
}
