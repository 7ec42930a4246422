//! Per-field term iteration in Unicode code point order.
//!
//! The dictionary is sorted by UTF-16 code unit, which places supplementary
//! characters (surrogate pairs, "S") before U+E000..U+FFFF ("E") although
//! they come after it by code point. Characters below the surrogates ("A")
//! agree in both orders. Reading "ASE" as "AES" takes three kinds of seek,
//! done relative to the cursor after each step:
//!
//! * push: the new suffix holds an S; if terms with an E at that position
//!   exist, jump forward to them first.
//! * continue: the suffix that was just left held an E; if terms with an S
//!   at that position exist, jump back to them.
//! * pop: the cursor moved from an S back into an E at the same position;
//!   those E terms were already returned, so jump past all of them.
//!
//! No state beyond the previous and current term is needed, nesting at
//! deeper positions included.

use crate::error::{Error, Result};
use crate::index::field_infos::FieldInfo;
use crate::index::postings::{PreDocsAndPositionsEnum, PreDocsEnum};
use crate::index::reader::FieldsShared;
use crate::index::segment_term_enum::SegmentTermEnum;
use crate::index::term_infos_reader::TermInfosReader;
use crate::index::types::{FieldKey, IndexOptions, SeekStatus, TermRef};
use crate::utils::{Bits, TermOrder, is_char_start, is_high_bmp_lead, is_non_bmp_lead, to_debug_string};
use log::trace;
use std::sync::Arc;

/// Smallest supplementary character, U+10000
const NON_BMP_PROBE: [u8; 4] = [0xf0, 0x90, 0x80, 0x80];
/// Smallest character after the surrogates, U+E000
const HIGH_BMP_PROBE: [u8; 3] = [0xee, 0x80, 0x80];

/// Bytes of the cursor's term if it is still inside `field`.
fn field_term(terms: &SegmentTermEnum, field: FieldKey) -> Option<&[u8]> {
    terms
        .term()
        .filter(|term| term.field == field)
        .map(|term| term.bytes)
}

fn copy_bytes(dst: &mut Vec<u8>, src: &[u8]) {
    dst.clear();
    dst.extend_from_slice(src);
}

/// The terms of one field.
pub struct PreTerms {
    shared: Arc<FieldsShared>,
    field: FieldInfo,
    key: FieldKey,
}

impl PreTerms {
    pub(crate) fn new(shared: Arc<FieldsShared>, field: FieldInfo, key: FieldKey) -> Self {
        Self { shared, field, key }
    }

    pub fn field(&self) -> &FieldInfo {
        &self.field
    }

    /// A fresh enum positioned before the field's first term.
    pub fn iterator(&self) -> Result<PreTermsEnum> {
        PreTermsEnum::new(self.shared.clone(), self.field.clone(), self.key)
    }

    pub fn order(&self) -> TermOrder {
        if self.shared.sort_terms_by_unicode {
            TermOrder::Unicode
        } else {
            TermOrder::Utf16
        }
    }

    /// Per-field term count; this format does not record it.
    pub fn size(&self) -> Option<u64> {
        None
    }

    pub fn sum_total_term_freq(&self) -> Option<u64> {
        None
    }

    pub fn sum_doc_freq(&self) -> Option<u64> {
        None
    }

    pub fn doc_count(&self) -> Option<u32> {
        None
    }

    pub fn has_freqs(&self) -> bool {
        self.field.has_freqs()
    }

    pub fn has_positions(&self) -> bool {
        self.field.has_positions()
    }

    pub fn has_payloads(&self) -> bool {
        self.field.has_payloads()
    }

    pub fn has_offsets(&self) -> bool {
        false
    }
}

/// Cursor over one field's terms.
///
/// Before the first `next`/`advance` the enum is unpositioned; after a
/// `seek_ceil` it sits on the returned term and `next` continues from there.
pub struct PreTermsEnum {
    shared: Arc<FieldsShared>,
    field: FieldInfo,
    key: FieldKey,
    unicode_sort_order: bool,

    /// Cursor whose entry is the current term
    term_enum: SegmentTermEnum,
    /// Scratch cursor for probing seeks
    seek_term_enum: SegmentTermEnum,
    /// The cursor already sits on the term `next` should return
    skip_next: bool,

    current: Vec<u8>,
    positioned: bool,

    prev_term: Vec<u8>,
    scratch_term: Vec<u8>,
    new_suffix_start: usize,
}

impl PreTermsEnum {
    fn new(shared: Arc<FieldsShared>, field: FieldInfo, key: FieldKey) -> Result<Self> {
        let start = TermRef::new(key, b"");
        let term_enum = shared.tis.terms_from_key(start)?;
        let seek_term_enum = shared.tis.terms_from_key(start)?;
        let mut terms = Self {
            unicode_sort_order: shared.sort_terms_by_unicode,
            shared,
            field,
            key,
            term_enum,
            seek_term_enum,
            skip_next: true,
            current: Vec::new(),
            positioned: false,
            prev_term: Vec::new(),
            scratch_term: Vec::new(),
            new_suffix_start: 0,
        };
        if field_term(&terms.term_enum, key).is_some() {
            terms.surrogate_dance()?;
        }
        Ok(terms)
    }

    pub fn order(&self) -> TermOrder {
        if self.unicode_sort_order {
            TermOrder::Unicode
        } else {
            TermOrder::Utf16
        }
    }

    /// Seek `terms` to `term` with the E at `pos` swapped for the smallest
    /// S, and report whether it landed on a term of this field that shares
    /// the prefix and has an S at `pos`.
    fn seek_to_non_bmp(
        tis: &TermInfosReader,
        key: FieldKey,
        terms: &mut SegmentTermEnum,
        term: &[u8],
        pos: usize,
    ) -> Result<bool> {
        debug_assert!(is_high_bmp_lead(term[pos]));
        let mut probe = Vec::with_capacity(pos + NON_BMP_PROBE.len());
        probe.extend_from_slice(&term[..pos]);
        probe.extend_from_slice(&NON_BMP_PROBE);
        trace!("try seek term={}", to_debug_string(&probe));

        tis.seek_enum(terms, TermRef::new(key, &probe), true)?;

        // At worst this lands back on the current term, except from seek_ceil
        let Some(found) = field_term(terms, key) else {
            return Ok(false);
        };
        trace!("got term={}", to_debug_string(found));
        Ok(found.len() >= probe.len() && is_non_bmp_lead(found[pos]) && found[..pos] == term[..pos])
    }

    /// Scan the suffix stripped from the previous term, backwards, for an E;
    /// if S terms exist at that position, resume there.
    fn do_continue(&mut self) -> Result<bool> {
        trace!("try cont");
        let limit = (self.new_suffix_start as isize).min(self.scratch_term.len() as isize - 1);
        let mut down_to = self.prev_term.len() as isize - 1;

        while down_to > limit {
            let pos = down_to as usize;
            if is_high_bmp_lead(self.prev_term[pos]) {
                trace!("found E pos={pos} vs len={}", self.prev_term.len());
                if Self::seek_to_non_bmp(
                    &self.shared.tis,
                    self.key,
                    &mut self.seek_term_enum,
                    &self.prev_term,
                    pos,
                )? {
                    if let Some(found) = self.seek_term_enum.term() {
                        self.shared.tis.seek_enum(&mut self.term_enum, found, true)?;
                    }
                    self.new_suffix_start = pos;
                    copy_bytes(
                        &mut self.scratch_term,
                        field_term(&self.term_enum, self.key).unwrap_or_default(),
                    );
                    trace!("seek!");
                    return Ok(true);
                }
                trace!("no seek");
            }

            // Shorten in place so a later pass does not redo this position
            if is_char_start(self.prev_term[pos]) {
                self.prev_term.truncate(pos);
            }
            down_to -= 1;
        }
        Ok(false)
    }

    /// If the step replaced an S by an E at the suffix start, the E terms
    /// were visited before the S terms: seek past all of them.
    fn do_pop(&mut self) -> Result<bool> {
        trace!("try pop");
        let nss = self.new_suffix_start;
        if !(self.prev_term.len() > nss
            && nss < self.scratch_term.len()
            && is_non_bmp_lead(self.prev_term[nss])
            && is_high_bmp_lead(self.scratch_term[nss]))
        {
            return Ok(false);
        }

        self.scratch_term[nss] = 0xff;
        self.scratch_term.truncate(nss + 1);
        trace!("seek to term={}", to_debug_string(&self.scratch_term));
        self.shared.tis.seek_enum(
            &mut self.term_enum,
            TermRef::new(self.key, &self.scratch_term),
            true,
        )?;

        // A forward seek may leave the field or the dictionary
        if let Some(found) = field_term(&self.term_enum, self.key) {
            trace!("got term={}", to_debug_string(found));
            copy_bytes(&mut self.scratch_term, found);
            self.set_new_suffix_start_from_prev();
            Ok(true)
        } else if nss != 0 || !self.scratch_term.is_empty() {
            trace!("got term=null (or next field)");
            self.new_suffix_start = 0;
            self.scratch_term.clear();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Scan the newly added suffix for an S; if E terms exist at that
    /// position, visit them first.
    fn do_pushes(&mut self) -> Result<()> {
        let nss = self.new_suffix_start;
        trace!("try push newSuffixStart={nss} scratchLen={}", self.scratch_term.len());
        let mut up_to = nss;

        while up_to < self.scratch_term.len() {
            let starts_dance = is_non_bmp_lead(self.scratch_term[up_to])
                && (up_to > nss
                    || up_to >= self.prev_term.len()
                    || (!is_non_bmp_lead(self.prev_term[up_to])
                        && !is_high_bmp_lead(self.prev_term[up_to])));
            if !starts_dance {
                up_to += 1;
                continue;
            }

            let mut probe = Vec::with_capacity(up_to + HIGH_BMP_PROBE.len());
            probe.extend_from_slice(&self.scratch_term[..up_to]);
            probe.extend_from_slice(&HIGH_BMP_PROBE);
            trace!("try seek 1 pos={up_to} term={}", to_debug_string(&probe));

            // Seek forward
            self.shared.tis.seek_enum(
                &mut self.seek_term_enum,
                TermRef::new(self.key, &probe),
                true,
            )?;

            let matches = field_term(&self.seek_term_enum, self.key).is_some_and(|found| {
                found.len() >= up_to + HIGH_BMP_PROBE.len()
                    && is_high_bmp_lead(found[up_to])
                    && found[..up_to] == self.scratch_term[..up_to]
            });

            if matches {
                trace!("matches!");
                if let Some(found) = self.seek_term_enum.term() {
                    self.shared.tis.seek_enum(&mut self.term_enum, found, true)?;
                    copy_bytes(&mut self.scratch_term, found.bytes);
                }
                // The character at up_to is known to be an E now; later
                // positions of the new suffix may need their own dance
                up_to += HIGH_BMP_PROBE.len();
            } else {
                up_to += 1;
            }
        }
        Ok(())
    }

    /// Called after every underlying step to move to the right term in
    /// code point order.
    fn surrogate_dance(&mut self) -> Result<()> {
        if !self.unicode_sort_order {
            return Ok(());
        }

        copy_bytes(
            &mut self.scratch_term,
            field_term(&self.term_enum, self.key).unwrap_or_default(),
        );
        trace!(
            "dance prev={} term={}",
            to_debug_string(&self.prev_term),
            to_debug_string(&self.scratch_term)
        );

        // cont | pop, cont | pop, pop, cont | nothing
        while !self.do_continue()? {
            if !self.do_pop()? {
                break;
            }
        }

        trace!("finish bmp ends");
        self.do_pushes()
    }

    fn set_new_suffix_start_from_prev(&mut self) {
        self.new_suffix_start = new_suffix_start(&self.prev_term, &self.scratch_term);
    }

    fn set_current(&mut self) -> bool {
        match field_term(&self.term_enum, self.key) {
            Some(term) => {
                copy_bytes(&mut self.current, term);
                self.positioned = true;
            }
            None => {
                self.current.clear();
                self.positioned = false;
            }
        }
        self.positioned
    }

    /// Position on `target` or the smallest term after it.
    pub fn seek_ceil(&mut self, target: &[u8]) -> Result<SeekStatus> {
        trace!("seek target={}", to_debug_string(target));
        self.shared.ensure_open()?;
        self.skip_next = false;
        self.shared
            .tis
            .seek_enum(&mut self.term_enum, TermRef::new(self.key, target), false)?;

        match field_term(&self.term_enum, self.key) {
            Some(found) if found == target => {
                // Exact hits need no dance
                trace!("seek exact match");
                self.set_current();
                Ok(SeekStatus::Found)
            }
            None => self.seek_ceil_past_end(target),
            Some(found) => {
                // Treat the target as the previous term of a `next`
                trace!("seek hit non-exact term={}", to_debug_string(found));
                self.new_suffix_start = new_suffix_start(target, found);
                copy_bytes(&mut self.prev_term, target);
                self.surrogate_dance()?;
                if self.set_current() {
                    debug_assert!(!self.unicode_sort_order || target < self.current.as_slice());
                    Ok(SeekStatus::NotFound)
                } else {
                    Ok(SeekStatus::End)
                }
            }
        }
    }

    /// Nothing at or after `target` in UTF-16 order. In code point order,
    /// terms with an S where the target has an E still qualify.
    fn seek_ceil_past_end(&mut self, target: &[u8]) -> Result<SeekStatus> {
        trace!("seek hit EOF");
        if self.unicode_sort_order {
            copy_bytes(&mut self.scratch_term, target);
            for pos in (0..self.scratch_term.len()).rev() {
                if !is_high_bmp_lead(self.scratch_term[pos]) {
                    continue;
                }
                trace!("found E pos={pos}; try seek");
                if Self::seek_to_non_bmp(
                    &self.shared.tis,
                    self.key,
                    &mut self.seek_term_enum,
                    &self.scratch_term,
                    pos,
                )? {
                    if let Some(found) = self.seek_term_enum.term() {
                        copy_bytes(&mut self.scratch_term, found.bytes);
                        self.shared.tis.seek_enum(&mut self.term_enum, found, false)?;
                    }
                    self.new_suffix_start = pos + 1;
                    self.do_pushes()?;
                    self.set_current();
                    return Ok(SeekStatus::NotFound);
                }
            }
        }

        trace!("seek END");
        self.positioned = false;
        self.current.clear();
        Ok(SeekStatus::End)
    }

    /// True if positioned exactly on `target`.
    pub fn seek_exact(&mut self, target: &[u8]) -> Result<bool> {
        Ok(self.seek_ceil(target)? == SeekStatus::Found)
    }

    pub fn seek_exact_ord(&mut self, _ord: u64) -> Result<()> {
        Err(Error::unsupported("seek by term ordinal"))
    }

    pub fn ord(&self) -> Result<u64> {
        Err(Error::unsupported("term ordinal"))
    }

    /// Move to the next term; false once the field is exhausted.
    pub fn advance(&mut self) -> Result<bool> {
        self.shared.ensure_open()?;
        if self.skip_next {
            self.skip_next = false;
            return Ok(self.set_current());
        }

        // Exhausted, or ended by a seek
        let Some(prev) = field_term(&self.term_enum, self.key).filter(|_| self.positioned) else {
            self.positioned = false;
            return Ok(false);
        };
        copy_bytes(&mut self.prev_term, prev);

        if self.term_enum.next()? && field_term(&self.term_enum, self.key).is_some() {
            self.new_suffix_start = self.term_enum.new_suffix_start();
            trace!("newSuffixStart={}", self.new_suffix_start);
        } else {
            // The field is exhausted in UTF-16 order, but an E left behind
            // may still have S terms to come back to
            trace!("force cont");
            self.new_suffix_start = 0;
        }
        self.surrogate_dance()?;
        Ok(self.set_current())
    }

    /// [`advance`](Self::advance) returning the new term.
    pub fn next(&mut self) -> Result<Option<&[u8]>> {
        if self.advance()? {
            Ok(Some(&self.current))
        } else {
            Ok(None)
        }
    }

    /// Current term, `None` when unpositioned or exhausted.
    pub fn term(&self) -> Option<&[u8]> {
        self.positioned.then_some(self.current.as_slice())
    }

    /// Documents containing the current term, deleted ones included.
    pub fn doc_freq(&self) -> u32 {
        self.term_enum.doc_freq()
    }

    /// Not recorded by this format.
    pub fn total_term_freq(&self) -> Option<u64> {
        None
    }

    fn ensure_positioned(&self) -> Result<()> {
        if self.positioned {
            Ok(())
        } else {
            Err(Error::illegal_state("terms enum is not positioned on a term"))
        }
    }

    /// Postings of the current term. A previous iterator passed as `reuse`
    /// is reset in place if it reads the same segment.
    pub fn docs(
        &self,
        live_docs: Option<Arc<dyn Bits>>,
        reuse: Option<PreDocsEnum>,
    ) -> Result<PreDocsEnum> {
        self.shared.ensure_open()?;
        self.ensure_positioned()?;
        let docs = match reuse {
            Some(docs) if docs.belongs_to(&self.shared) => docs,
            _ => PreDocsEnum::new(&self.shared),
        };
        docs.reset(&self.term_enum, live_docs)
    }

    /// Postings with positions of the current term; `None` if the field
    /// does not index positions.
    pub fn docs_and_positions(
        &self,
        live_docs: Option<Arc<dyn Bits>>,
        reuse: Option<PreDocsAndPositionsEnum>,
    ) -> Result<Option<PreDocsAndPositionsEnum>> {
        self.shared.ensure_open()?;
        if self.field.index_options != Some(IndexOptions::DocsAndFreqsAndPositions) {
            return Ok(None);
        }
        self.ensure_positioned()?;
        let positions = match reuse {
            Some(positions) if positions.belongs_to(&self.shared) => positions,
            _ => PreDocsAndPositionsEnum::new(&self.shared),
        };
        positions.reset(&self.term_enum, live_docs).map(Some)
    }

    pub fn field(&self) -> &FieldInfo {
        &self.field
    }
}

/// Start of the last character shared by `a` and `b`: the byte position
/// from which their code points differ.
fn new_suffix_start(a: &[u8], b: &[u8]) -> usize {
    let limit = a.len().min(b.len());
    let mut last_start = 0;
    for i in 0..limit {
        if is_char_start(a[i]) {
            last_start = i;
        }
        if a[i] != b[i] {
            return last_start;
        }
    }
    limit
}
