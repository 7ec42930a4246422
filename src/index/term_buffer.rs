use crate::error::{Error, Result};
use crate::index::field_infos::FieldInfos;
use crate::index::types::{FieldKey, TermRef};
use crate::store::IndexInput;
use std::cmp::Ordering;

/// Reusable holder of the term most recently decoded from a dictionary.
///
/// Terms are prefix-compressed against their predecessor, so decoding keeps
/// the previous bytes and overwrites only the suffix.
#[derive(Debug, Clone, Default)]
pub struct TermBuffer {
    field: Option<FieldKey>,
    field_number: Option<i32>,
    bytes: Vec<u8>,
    new_suffix_start: usize,
}

impl TermBuffer {
    /// Decode `vint prefix, vint suffix length, suffix, vint field number`.
    pub fn read(&mut self, input: &mut IndexInput, field_infos: &FieldInfos) -> Result<()> {
        let start = input.read_vint()?;
        let length = input.read_vint()?;
        if start < 0 || length < 0 || start as usize > self.bytes.len() {
            return Err(Error::corrupt(
                input.name().to_string(),
                format!(
                    "bad term prefix/suffix {start}/{length} after a {}-byte term",
                    self.bytes.len()
                ),
            ));
        }
        let remaining = input.len().saturating_sub(input.file_pointer());
        if length as u64 > remaining {
            return Err(Error::corrupt(
                input.name().to_string(),
                format!("term suffix of {length} bytes with {remaining} left in the file"),
            ));
        }
        let start = start as usize;
        self.bytes.truncate(start);
        self.bytes.resize(start + length as usize, 0);
        input.read_bytes(&mut self.bytes[start..])?;
        self.new_suffix_start = start;

        let number = input.read_vint()?;
        if self.field_number != Some(number) {
            let key = field_infos.key_for_number(number).ok_or_else(|| {
                Error::corrupt(
                    input.name().to_string(),
                    format!("unknown field number {number}"),
                )
            })?;
            self.field = Some(key);
            self.field_number = Some(number);
        }
        Ok(())
    }

    pub fn set(&mut self, other: &TermBuffer) {
        self.field = other.field;
        self.field_number = other.field_number;
        self.bytes.clear();
        self.bytes.extend_from_slice(&other.bytes);
        self.new_suffix_start = other.new_suffix_start;
    }

    pub fn set_term(&mut self, term: TermRef<'_>) {
        self.field = Some(term.field);
        self.field_number = if term.field.is_empty_field() {
            Some(-1)
        } else {
            term.field.number().map(|n| n as i32)
        };
        self.bytes.clear();
        self.bytes.extend_from_slice(term.bytes);
        self.new_suffix_start = 0;
    }

    pub fn reset(&mut self) {
        self.field = None;
        self.field_number = None;
        self.bytes.clear();
        self.new_suffix_start = 0;
    }

    pub fn field(&self) -> Option<FieldKey> {
        self.field
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn new_suffix_start(&self) -> usize {
        self.new_suffix_start
    }

    pub fn term(&self) -> Option<TermRef<'_>> {
        self.field.map(|field| TermRef::new(field, &self.bytes))
    }

    /// Dictionary order; an empty (reset) buffer sorts first.
    pub fn compare(&self, other: &TermBuffer) -> Ordering {
        match (self.term(), other.term()) {
            (Some(a), Some(b)) => a.compare(b),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
        }
    }
}
