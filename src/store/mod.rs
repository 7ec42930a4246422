//! Access to the files of a segment.
//!
//! - [`IndexInput`] - cloneable random-access cursor over one file
//! - [`Directory`] - where segment files come from
//! - [`MmapDirectory`] - files mapped from disk
//! - [`RamDirectory`] - files held in memory

mod input;
mod mmap;
mod ram;

pub use input::{FileBytes, IndexInput};
pub use mmap::MmapDirectory;
pub use ram::RamDirectory;

use crate::error::Result;

/// Term dictionary
pub const TERMS_EXTENSION: &str = "tis";
/// Sampled terms index
pub const TERMS_INDEX_EXTENSION: &str = "tii";
/// Document numbers and frequencies
pub const FREQ_EXTENSION: &str = "frq";
/// Positions and payloads
pub const PROX_EXTENSION: &str = "prx";
/// Field schema
pub const FIELD_INFOS_EXTENSION: &str = "fnm";

/// Name of a per-segment file, e.g. `_0.tis`.
pub fn segment_file_name(segment: &str, extension: &str) -> String {
    format!("{segment}.{extension}")
}

/// A flat namespace of immutable files.
pub trait Directory: Send + Sync {
    fn open_input(&self, name: &str) -> Result<IndexInput>;

    fn file_length(&self, name: &str) -> Result<u64>;

    fn file_exists(&self, name: &str) -> bool;
}
