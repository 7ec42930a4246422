use crate::error::{Error, Result};
use crate::utils::compare_utf8_as_utf16;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Document number within a segment
pub type DocId = u32;

/// Returned by postings iterators once they are exhausted
pub const NO_MORE_DOCS: DocId = i32::MAX as DocId;

/// How much is indexed for a field, in increasing order of detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexOptions {
    DocsOnly,
    DocsAndFreqs,
    DocsAndFreqsAndPositions,
}

impl IndexOptions {
    pub fn has_freqs(self) -> bool {
        self >= IndexOptions::DocsAndFreqs
    }

    pub fn has_positions(self) -> bool {
        self >= IndexOptions::DocsAndFreqsAndPositions
    }
}

/// Outcome of a ceiling seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekStatus {
    /// Positioned on exactly the requested term
    Found,
    /// Positioned on the smallest term greater than the requested one
    NotFound,
    /// No term at or after the requested one in this field
    End,
}

/// Integer stand-in for a field name in term comparisons.
///
/// Keys compare in the UTF-16 order of the names they stand for. The
/// dictionary's "" pseudo-field (number -1) has the smallest key. Names that
/// are not in the schema get an odd key between their neighbours, so they
/// sort correctly but never equal a real field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKey {
    ord: u32,
    number: i32,
}

impl FieldKey {
    /// The "" field heading the terms index
    pub const EMPTY: FieldKey = FieldKey { ord: 0, number: -1 };

    pub(crate) fn known(rank: usize, number: u32) -> Self {
        Self {
            ord: 2 * (rank as u32 + 1),
            number: number as i32,
        }
    }

    pub(crate) fn unknown(insertion_rank: usize) -> Self {
        Self {
            ord: 2 * insertion_rank as u32 + 1,
            number: i32::MIN,
        }
    }

    /// Field number in the schema, `None` for the pseudo-field or unknown names
    pub fn number(&self) -> Option<u32> {
        (self.number >= 0).then_some(self.number as u32)
    }

    pub fn is_empty_field(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl Ord for FieldKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ord.cmp(&other.ord)
    }
}

impl PartialOrd for FieldKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A term as callers name it: field name plus UTF-8 term bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    pub field: String,
    pub bytes: Vec<u8>,
}

impl Term {
    pub fn new(field: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            field: field.into(),
            bytes: bytes.into(),
        }
    }

    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.text())
    }
}

/// Borrowed term with a resolved field key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermRef<'a> {
    pub field: FieldKey,
    pub bytes: &'a [u8],
}

impl<'a> TermRef<'a> {
    pub fn new(field: FieldKey, bytes: &'a [u8]) -> Self {
        Self { field, bytes }
    }

    pub fn to_owned(self) -> TermKey {
        TermKey {
            field: self.field,
            bytes: self.bytes.to_vec(),
        }
    }

    /// Dictionary order: field first, then UTF-16 order of the text.
    pub fn compare(self, other: TermRef<'_>) -> Ordering {
        self.field
            .cmp(&other.field)
            .then_with(|| compare_utf8_as_utf16(self.bytes, other.bytes))
    }
}

/// Owned term with a resolved field key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TermKey {
    pub field: FieldKey,
    pub bytes: Vec<u8>,
}

impl TermKey {
    pub fn as_ref(&self) -> TermRef<'_> {
        TermRef {
            field: self.field,
            bytes: &self.bytes,
        }
    }
}

/// Per-term metadata stored in the dictionary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermInfo {
    /// Number of documents containing the term
    pub doc_freq: u32,
    /// Start of the term's postings in the frequency file
    pub freq_pointer: u64,
    /// Start of the term's positions in the prox file
    pub prox_pointer: u64,
    /// Offset of the skip list from `freq_pointer`; meaningful only when
    /// `doc_freq >= skip_interval`
    pub skip_offset: u32,
}

/// Reader settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Keep only every Nth entry of the sampled terms index in memory
    pub index_divisor: u32,
    /// Total entries in the term lookup cache
    pub term_cache_size: usize,
    /// Independently locked partitions of the term cache
    pub term_cache_shards: usize,
    /// Yield terms in Unicode code point order instead of on-disk UTF-16 order
    pub sort_terms_by_unicode: bool,
    /// Per-thread lookup cursors kept by a term dictionary; the least
    /// recently used thread's cursor is dropped beyond this
    pub max_thread_enums: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            index_divisor: 1,
            term_cache_size: 1024,
            term_cache_shards: 8,
            sort_terms_by_unicode: true,
            max_thread_enums: 64,
        }
    }
}

impl ReaderConfig {
    /// Load from a JSON file; missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        let config: ReaderConfig = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| Error::invalid_arg(path.display().to_string(), e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.index_divisor == 0 {
            return Err(Error::invalid_arg("index_divisor", "must be at least 1"));
        }
        if self.term_cache_size == 0 {
            return Err(Error::invalid_arg("term_cache_size", "must be at least 1"));
        }
        if self.max_thread_enums == 0 {
            return Err(Error::invalid_arg("max_thread_enums", "must be at least 1"));
        }
        if self.term_cache_shards == 0 || self.term_cache_shards > self.term_cache_size {
            return Err(Error::invalid_arg(
                "term_cache_shards",
                format!("must be between 1 and term_cache_size ({})", self.term_cache_size),
            ));
        }
        Ok(())
    }
}
