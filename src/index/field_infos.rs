//! Field schema of a segment (`.fnm`).

use crate::error::{Error, Result};
use crate::index::types::{FieldKey, IndexOptions, Term, TermKey};
use crate::store::{Directory, FIELD_INFOS_EXTENSION, IndexInput, segment_file_name};
use crate::utils::compare_str_as_utf16;
use log::debug;
use rustc_hash::FxHashMap;

/// Original layout
pub const FORMAT_START: i32 = -2;
/// Adds the omit-positions flag
pub const FORMAT_OMIT_POSITIONS: i32 = -3;
pub const FORMAT_MINIMUM: i32 = FORMAT_START;
pub const FORMAT_CURRENT: i32 = FORMAT_OMIT_POSITIONS;

const IS_INDEXED: u8 = 0x1;
const STORE_TERMVECTOR: u8 = 0x2;
const OMIT_NORMS: u8 = 0x10;
const STORE_PAYLOADS: u8 = 0x20;
const OMIT_TERM_FREQ_AND_POSITIONS: u8 = 0x40;
const OMIT_POSITIONS: u8 = 0x80;

/// Schema entry for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub number: u32,
    pub indexed: bool,
    /// `None` for fields that are not indexed
    pub index_options: Option<IndexOptions>,
    pub store_payloads: bool,
    pub store_term_vectors: bool,
    pub omit_norms: bool,
}

impl FieldInfo {
    /// An indexed field.
    pub fn new(name: impl Into<String>, number: u32, index_options: IndexOptions) -> Self {
        Self {
            name: name.into(),
            number,
            indexed: true,
            index_options: Some(index_options),
            store_payloads: false,
            store_term_vectors: false,
            omit_norms: false,
        }
    }

    pub fn with_payloads(mut self) -> Self {
        self.store_payloads = true;
        self
    }

    pub fn has_freqs(&self) -> bool {
        self.index_options.is_some_and(|o| o.has_freqs())
    }

    pub fn has_positions(&self) -> bool {
        self.index_options.is_some_and(|o| o.has_positions())
    }

    pub fn has_payloads(&self) -> bool {
        self.store_payloads
    }
}

/// All fields of a segment, addressable by number and by name
#[derive(Debug, Clone)]
pub struct FieldInfos {
    by_number: Vec<Option<FieldInfo>>,
    by_name: FxHashMap<String, u32>,
    keys: Vec<Option<FieldKey>>,
    /// Names in UTF-16 order, parallel to key ranks
    sorted_names: Vec<String>,
}

impl FieldInfos {
    pub fn new(infos: impl IntoIterator<Item = FieldInfo>) -> Result<Self> {
        let mut by_number: Vec<Option<FieldInfo>> = Vec::new();
        let mut by_name = FxHashMap::default();
        for info in infos {
            let number = info.number as usize;
            if by_name.contains_key(&info.name) {
                return Err(Error::corrupt(
                    "field infos",
                    format!("duplicate field name {:?}", info.name),
                ));
            }
            if by_number.len() <= number {
                by_number.resize(number + 1, None);
            }
            if by_number[number].is_some() {
                return Err(Error::corrupt(
                    "field infos",
                    format!("duplicate field number {number}"),
                ));
            }
            by_name.insert(info.name.clone(), info.number);
            by_number[number] = Some(info);
        }

        let mut sorted: Vec<&FieldInfo> = by_number.iter().flatten().collect();
        sorted.sort_by(|a, b| compare_str_as_utf16(&a.name, &b.name));
        let mut keys = vec![None; by_number.len()];
        for (rank, info) in sorted.iter().enumerate() {
            keys[info.number as usize] = Some(FieldKey::known(rank, info.number));
        }
        let sorted_names = sorted.iter().map(|i| i.name.clone()).collect();

        Ok(Self {
            by_number,
            by_name,
            keys,
            sorted_names,
        })
    }

    /// Read `<segment>.fnm`.
    pub fn read(dir: &dyn Directory, segment: &str) -> Result<Self> {
        let name = segment_file_name(segment, FIELD_INFOS_EXTENSION);
        let mut input = dir.open_input(&name)?;
        let infos = Self::decode(&mut input)?;
        debug!("read {} fields from {}", infos.len(), name);
        Ok(infos)
    }

    pub fn decode(input: &mut IndexInput) -> Result<Self> {
        let resource = input.name().to_string();
        let format = input.read_vint()?;
        if format > FORMAT_MINIMUM {
            return Err(Error::too_old(resource, format, FORMAT_MINIMUM, FORMAT_CURRENT));
        }
        if format < FORMAT_CURRENT {
            return Err(Error::too_new(resource, format, FORMAT_MINIMUM, FORMAT_CURRENT));
        }

        let count = input.read_vint()?;
        if count < 0 {
            return Err(Error::corrupt(resource, format!("negative field count {count}")));
        }

        let mut infos = Vec::with_capacity((count as u64).min(input.len()) as usize);
        for number in 0..count as u32 {
            let name = input.read_string()?;
            let bits = input.read_byte()?;
            let indexed = bits & IS_INDEXED != 0;

            let index_options = if !indexed {
                None
            } else if bits & OMIT_TERM_FREQ_AND_POSITIONS != 0 {
                Some(IndexOptions::DocsOnly)
            } else if bits & OMIT_POSITIONS != 0 {
                if format > FORMAT_OMIT_POSITIONS {
                    return Err(Error::corrupt(
                        resource,
                        format!("field {name:?} omits positions in a format that cannot"),
                    ));
                }
                Some(IndexOptions::DocsAndFreqs)
            } else {
                Some(IndexOptions::DocsAndFreqsAndPositions)
            };

            // Payloads only exist alongside positions
            let store_payloads = bits & STORE_PAYLOADS != 0
                && index_options.is_some_and(|o| o.has_positions());

            infos.push(FieldInfo {
                name,
                number,
                indexed,
                index_options,
                store_payloads,
                store_term_vectors: bits & STORE_TERMVECTOR != 0,
                omit_norms: bits & OMIT_NORMS != 0,
            });
        }

        if input.file_pointer() != input.len() {
            return Err(Error::corrupt(
                resource,
                format!(
                    "did not read all bytes: read {} of {}",
                    input.file_pointer(),
                    input.len()
                ),
            ));
        }

        Self::new(infos)
    }

    /// Encode in the current `.fnm` layout.
    pub fn encode(&self) -> Vec<u8> {
        use crate::utils::{encode_string, encode_vint};
        let mut buf = Vec::new();
        encode_vint(FORMAT_CURRENT, &mut buf);
        encode_vint(self.by_number.len() as i32, &mut buf);
        for info in self.by_number.iter() {
            let Some(info) = info else {
                encode_string(b"", &mut buf);
                buf.push(0);
                continue;
            };
            let mut bits = 0u8;
            if info.indexed {
                bits |= IS_INDEXED;
            }
            if info.store_term_vectors {
                bits |= STORE_TERMVECTOR;
            }
            if info.omit_norms {
                bits |= OMIT_NORMS;
            }
            if info.store_payloads {
                bits |= STORE_PAYLOADS;
            }
            match info.index_options {
                Some(IndexOptions::DocsOnly) => bits |= OMIT_TERM_FREQ_AND_POSITIONS,
                Some(IndexOptions::DocsAndFreqs) => bits |= OMIT_POSITIONS,
                _ => {}
            }
            encode_string(info.name.as_bytes(), &mut buf);
            buf.push(bits);
        }
        buf
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn by_number(&self, number: u32) -> Option<&FieldInfo> {
        self.by_number.get(number as usize)?.as_ref()
    }

    pub fn by_name(&self, name: &str) -> Option<&FieldInfo> {
        self.by_name.get(name).and_then(|&n| self.by_number(n))
    }

    /// Fields in number order
    pub fn iter(&self) -> impl Iterator<Item = &FieldInfo> {
        self.by_number.iter().flatten()
    }

    /// Field names in UTF-16 order
    pub fn sorted_names(&self) -> &[String] {
        &self.sorted_names
    }

    /// Comparison key for a field number as stored in the dictionary; -1 is
    /// the "" pseudo-field.
    pub fn key_for_number(&self, number: i32) -> Option<FieldKey> {
        if number == -1 {
            return Some(FieldKey::EMPTY);
        }
        if number < 0 {
            return None;
        }
        self.keys.get(number as usize).copied().flatten()
    }

    /// Comparison key for any field name, known or not.
    pub fn key(&self, name: &str) -> FieldKey {
        if let Some(&number) = self.by_name.get(name) {
            if let Some(key) = self.key_for_number(number as i32) {
                return key;
            }
        }
        let rank = self
            .sorted_names
            .partition_point(|n| compare_str_as_utf16(n, name).is_lt());
        FieldKey::unknown(rank)
    }

    /// Resolve a caller-named term for dictionary comparisons.
    pub fn term_key(&self, term: &Term) -> TermKey {
        TermKey {
            field: self.key(&term.field),
            bytes: term.bytes.clone(),
        }
    }

    /// Name behind a key, if it denotes a real field.
    pub fn name_of(&self, key: FieldKey) -> Option<&str> {
        if key.is_empty_field() {
            return Some("");
        }
        key.number()
            .and_then(|n| self.by_number(n))
            .map(|i| i.name.as_str())
    }

    /// True if any indexed field records positions.
    pub fn has_prox(&self) -> bool {
        self.iter().any(|i| i.indexed && i.has_positions())
    }
}
