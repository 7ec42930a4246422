//! Sequential cursor over a `.tis` dictionary or its `.tii` sample.

use crate::error::{Error, Result};
use crate::index::field_infos::FieldInfos;
use crate::index::term_buffer::TermBuffer;
use crate::index::types::{Term, TermInfo, TermRef};
use crate::store::IndexInput;
use std::cmp::Ordering;
use std::sync::Arc;

/// Term lengths are counted in UTF-8 bytes
pub const FORMAT_VERSION_UTF8_LENGTH_IN_BYTES: i32 = -4;
pub const FORMAT_CURRENT: i32 = FORMAT_VERSION_UTF8_LENGTH_IN_BYTES;
pub const FORMAT_MINIMUM: i32 = FORMAT_VERSION_UTF8_LENGTH_IN_BYTES;

/// format, size, index interval, skip interval, max skip levels
pub const HEADER_LENGTH: u64 = 4 + 8 + 4 + 4 + 4;

/// Offset of the term count, rewritten once the dictionary is complete
pub const SIZE_OFFSET: u64 = 4;

/// Cursor over the entries of a term dictionary.
///
/// `position` is the ordinal of the current entry, -1 before the first.
/// Cloning yields an independent cursor at the same place.
#[derive(Debug, Clone)]
pub struct SegmentTermEnum {
    input: IndexInput,
    field_infos: Arc<FieldInfos>,
    format: i32,
    size: i64,
    position: i64,
    first: bool,
    is_index: bool,
    term_buffer: TermBuffer,
    prev_buffer: TermBuffer,
    scan_buffer: TermBuffer,
    term_info: TermInfo,
    index_pointer: u64,
    index_interval: u32,
    skip_interval: u32,
    max_skip_levels: u32,
}

impl SegmentTermEnum {
    /// Validate the header and position before the first entry.
    pub fn open(mut input: IndexInput, field_infos: Arc<FieldInfos>, is_index: bool) -> Result<Self> {
        let resource = input.name().to_string();
        let format = input.read_int()?;

        // A non-negative first int is a pre-versioning dictionary
        if format >= 0 || format > FORMAT_MINIMUM {
            return Err(Error::too_old(resource, format, FORMAT_MINIMUM, FORMAT_CURRENT));
        }
        if format < FORMAT_CURRENT {
            return Err(Error::too_new(resource, format, FORMAT_MINIMUM, FORMAT_CURRENT));
        }

        let size = input.read_long()?;
        let index_interval = input.read_int()?;
        let skip_interval = input.read_int()?;
        let max_skip_levels = input.read_int()?;
        if size < 0 || index_interval <= 0 || skip_interval <= 0 || max_skip_levels <= 0 {
            return Err(Error::corrupt(
                resource,
                format!(
                    "bad header: size={size} indexInterval={index_interval} \
                     skipInterval={skip_interval} maxSkipLevels={max_skip_levels}"
                ),
            ));
        }

        Ok(Self {
            input,
            field_infos,
            format,
            size,
            position: -1,
            first: false,
            is_index,
            term_buffer: TermBuffer::default(),
            prev_buffer: TermBuffer::default(),
            scan_buffer: TermBuffer::default(),
            term_info: TermInfo::default(),
            index_pointer: 0,
            index_interval: index_interval as u32,
            skip_interval: skip_interval as u32,
            max_skip_levels: max_skip_levels as u32,
        })
    }

    /// Teleport to a known entry: `pointer` is the file offset just after it,
    /// `position` its ordinal (-1 for the slot before the first term).
    pub fn seek(
        &mut self,
        pointer: u64,
        position: i64,
        term: TermRef<'_>,
        term_info: TermInfo,
    ) -> Result<()> {
        self.input.seek(pointer)?;
        self.position = position;
        self.term_buffer.set_term(term);
        self.prev_buffer.reset();
        self.term_info = term_info;
        self.first = position == -1;
        Ok(())
    }

    /// Advance to the next entry. Returns false once past the last one, after
    /// which `term()` is `None`.
    pub fn next(&mut self) -> Result<bool> {
        self.prev_buffer.set(&self.term_buffer);
        let position = self.position;
        self.position += 1;
        if position >= self.size - 1 {
            self.term_buffer.reset();
            return Ok(false);
        }

        self.term_buffer.read(&mut self.input, &self.field_infos)?;

        let doc_freq = self.input.read_vint()?;
        if doc_freq < 0 {
            return Err(self.corrupt(format!("negative docFreq {doc_freq}")));
        }
        self.term_info.doc_freq = doc_freq as u32;
        self.term_info.freq_pointer = self.add_delta(self.term_info.freq_pointer)?;
        self.term_info.prox_pointer = self.add_delta(self.term_info.prox_pointer)?;
        self.term_info.skip_offset = if self.term_info.doc_freq >= self.skip_interval {
            self.input.read_vint()? as u32
        } else {
            0
        };
        if self.is_index {
            self.index_pointer = self.add_delta(self.index_pointer)?;
        }
        Ok(true)
    }

    /// Advance until the current term is at or after `target`, returning how
    /// many entries were read.
    pub fn scan_to(&mut self, target: TermRef<'_>) -> Result<u32> {
        self.scan_buffer.set_term(target);
        let mut count = 0;
        if self.first {
            // Forced, the target may itself be the "" pseudo-term
            self.next()?;
            self.first = false;
            count += 1;
        }
        while self.scan_buffer.compare(&self.term_buffer) == Ordering::Greater && self.next()? {
            count += 1;
        }
        Ok(count)
    }

    /// [`scan_to`](Self::scan_to) with a caller-named term.
    pub fn scan_to_term(&mut self, target: &Term) -> Result<u32> {
        let key = self.field_infos.term_key(target);
        self.scan_to(key.as_ref())
    }

    fn add_delta(&mut self, base: u64) -> Result<u64> {
        let delta = self.input.read_vlong()?;
        base.checked_add_signed(delta)
            .ok_or_else(|| self.corrupt(format!("pointer {base} + {delta} out of range")))
    }

    fn corrupt(&self, message: String) -> Error {
        Error::corrupt(self.input.name().to_string(), message)
    }

    /// Current term, `None` before the first entry or after the last.
    pub fn term(&self) -> Option<TermRef<'_>> {
        self.term_buffer.term()
    }

    /// Current term with its field name resolved.
    pub fn to_term(&self) -> Option<Term> {
        let term = self.term()?;
        let field = self.field_infos.name_of(term.field)?;
        Some(Term::new(field, term.bytes))
    }

    /// Term before the current one, if the cursor moved there by `next`.
    pub fn prev(&self) -> Option<TermRef<'_>> {
        self.prev_buffer.term()
    }

    pub fn term_info(&self) -> TermInfo {
        self.term_info
    }

    pub fn doc_freq(&self) -> u32 {
        self.term_info.doc_freq
    }

    pub fn freq_pointer(&self) -> u64 {
        self.term_info.freq_pointer
    }

    pub fn prox_pointer(&self) -> u64 {
        self.term_info.prox_pointer
    }

    /// Offset in `.tis` of the entry following this one (index cursors only).
    pub fn index_pointer(&self) -> u64 {
        self.index_pointer
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    /// Number of entries in the file.
    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn format(&self) -> i32 {
        self.format
    }

    /// Length of the prefix shared with the previous term.
    pub fn new_suffix_start(&self) -> usize {
        self.term_buffer.new_suffix_start()
    }

    pub fn index_interval(&self) -> u32 {
        self.index_interval
    }

    pub fn skip_interval(&self) -> u32 {
        self.skip_interval
    }

    pub fn max_skip_levels(&self) -> u32 {
        self.max_skip_levels
    }

    pub fn field_infos(&self) -> &Arc<FieldInfos> {
        &self.field_infos
    }

    pub fn is_index(&self) -> bool {
        self.is_index
    }
}
