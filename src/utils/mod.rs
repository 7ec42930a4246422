//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`bits`] - Live-document bitsets
//! - [`encoding`] - Variable-length and big-endian integer encoding
//! - [`paged_bytes`] - Append-only paged byte arena for the terms index
//! - [`progress`] - Progress bars (no-op without the `progress` feature)
//! - [`unicode`] - UTF-16 vs code point ordering of UTF-8 terms

pub mod bits;
pub mod encoding;
pub mod paged_bytes;
pub mod progress;
pub mod unicode;

pub use bits::*;
pub use encoding::*;
pub use paged_bytes::*;
pub use unicode::*;
