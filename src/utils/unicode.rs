//! UTF-8 helpers for the two term orders.
//!
//! Legacy dictionaries are sorted by UTF-16 code unit, which differs from
//! Unicode code point order (plain UTF-8 byte order) exactly for characters
//! in U+E000..U+FFFF versus supplementary characters: UTF-16 puts the
//! surrogate pairs (0xD800..0xDFFF) before the former.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Write;

/// Compare two UTF-8 byte strings as if they were UTF-16 code unit sequences.
///
/// Only lead bytes at or above 0xee need adjusting: 0xee/0xef (U+E000..U+FFFF)
/// move above 0xf0..0xf4 (supplementary). They are mapped to 0xfc/0xfd so
/// 0xff stays free as a "past every character" sentinel.
pub fn compare_utf8_as_utf16(a: &[u8], b: &[u8]) -> Ordering {
    for (&a_byte, &b_byte) in a.iter().zip(b.iter()) {
        if a_byte != b_byte {
            let (mut a_byte, mut b_byte) = (a_byte as u32, b_byte as u32);
            if a_byte >= 0xee && b_byte >= 0xee {
                if (a_byte & 0xfe) == 0xee {
                    a_byte += 0xe;
                }
                if (b_byte & 0xfe) == 0xee {
                    b_byte += 0xe;
                }
            }
            return a_byte.cmp(&b_byte);
        }
    }
    a.len().cmp(&b.len())
}

/// Compare two strings by UTF-16 code units (the order of field names).
pub fn compare_str_as_utf16(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Lead byte of a supplementary (4-byte) character.
#[inline]
pub fn is_non_bmp_lead(b: u8) -> bool {
    (b & 0xf0) == 0xf0
}

/// Lead byte of a character in U+E000..U+FFFF (also matches the 0xff sentinel).
#[inline]
pub fn is_high_bmp_lead(b: u8) -> bool {
    (b & 0xee) == 0xee
}

/// First byte of any UTF-8 sequence (not a continuation byte).
#[inline]
pub fn is_char_start(b: u8) -> bool {
    (b & 0xc0) == 0xc0 || (b & 0x80) == 0
}

/// The order in which a term enumerator yields terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermOrder {
    /// Unicode code point order (plain byte order of UTF-8)
    Unicode,
    /// UTF-16 code unit order, as stored on disk
    Utf16,
}

impl TermOrder {
    pub fn compare(self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            TermOrder::Unicode => a.cmp(b),
            TermOrder::Utf16 => compare_utf8_as_utf16(a, b),
        }
    }
}

/// Render a term for logs: printable ASCII as-is, everything else as
/// `0x<codepoint>`; bytes that do not decode are shown as `\x<byte>`.
pub fn to_debug_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            if c.is_ascii_graphic() {
                out.push(c);
            } else {
                let _ = write!(out, "0x{:x}", c as u32);
            }
            out.push(' ');
        }
        for b in chunk.invalid() {
            let _ = write!(out, "\\x{b:02x} ");
        }
    }
    out.pop();
    out
}
