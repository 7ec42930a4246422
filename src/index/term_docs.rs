//! Document/frequency iteration over one term's postings in `.frq`.

use crate::error::Result;
use crate::index::field_infos::FieldInfos;
use crate::index::segment_term_enum::SegmentTermEnum;
use crate::index::skip_list::Lucene3xSkipListReader;
use crate::index::term_infos_reader::TermInfosReader;
use crate::index::types::{DocId, FieldKey, IndexOptions, Term, TermInfo};
use crate::store::IndexInput;
use crate::utils::Bits;
use std::sync::Arc;

/// Callbacks through which a positions reader follows document iteration.
pub trait ProxSkipper {
    /// A document was stepped over without its positions being read.
    fn skipping_doc(&mut self, freq: u32) -> Result<()>;

    /// Iteration jumped through the skip list; positions resume at
    /// `prox_pointer` with `payload_length` in effect.
    fn skip_prox(&mut self, prox_pointer: u64, payload_length: u32) -> Result<()>;
}

/// Document-only iteration has nothing to follow.
pub struct NoProx;

impl ProxSkipper for NoProx {
    fn skipping_doc(&mut self, _freq: u32) -> Result<()> {
        Ok(())
    }

    fn skip_prox(&mut self, _prox_pointer: u64, _payload_length: u32) -> Result<()> {
        Ok(())
    }
}

/// Iterates `(doc, freq)` pairs of one term, optionally hiding deleted docs.
///
/// Each document is a vint `code`: for docs-only fields it is the doc delta;
/// otherwise the delta is `code >> 1` and the low bit says the frequency is
/// 1, else a vint frequency follows.
pub struct SegmentTermDocs {
    tis: Arc<TermInfosReader>,
    field_infos: Arc<FieldInfos>,
    freq_stream: IndexInput,
    skip_interval: u32,
    max_skip_levels: u32,
    live_docs: Option<Arc<dyn Bits>>,

    count: u32,
    df: u32,
    doc: DocId,
    freq: u32,

    skip_list: Option<Lucene3xSkipListReader>,
    have_skipped: bool,
    freq_base_pointer: u64,
    prox_base_pointer: u64,
    skip_pointer: u64,

    index_options: IndexOptions,
    stores_payloads: bool,
}

impl SegmentTermDocs {
    pub fn new(
        freq_stream: IndexInput,
        tis: Arc<TermInfosReader>,
        field_infos: Arc<FieldInfos>,
    ) -> Self {
        Self {
            skip_interval: tis.skip_interval(),
            max_skip_levels: tis.max_skip_levels(),
            tis,
            field_infos,
            freq_stream,
            live_docs: None,
            count: 0,
            df: 0,
            doc: 0,
            freq: 1,
            skip_list: None,
            have_skipped: false,
            freq_base_pointer: 0,
            prox_base_pointer: 0,
            skip_pointer: 0,
            index_options: IndexOptions::DocsAndFreqsAndPositions,
            stores_payloads: false,
        }
    }

    pub fn set_live_docs(&mut self, live_docs: Option<Arc<dyn Bits>>) {
        self.live_docs = live_docs;
    }

    /// Position on a term looked up in the dictionary.
    pub fn seek_term(&mut self, term: &Term) -> Result<()> {
        let info = self.tis.get(term)?;
        let field = self.field_infos.key(&term.field);
        self.seek(info, field)
    }

    /// Position on the current term of a dictionary cursor.
    pub fn seek_enum(&mut self, terms: &SegmentTermEnum) -> Result<()> {
        if Arc::ptr_eq(terms.field_infos(), &self.field_infos) {
            let (info, field) = match terms.term() {
                Some(term) => (Some(terms.term_info()), term.field),
                None => (None, FieldKey::EMPTY),
            };
            self.seek(info, field)
        } else {
            // Cursor from another segment: look the term up here
            match terms.to_term() {
                Some(term) => self.seek_term(&term),
                None => self.seek(None, FieldKey::EMPTY),
            }
        }
    }

    /// Position on a term's postings; `None` means an absent term.
    pub fn seek(&mut self, info: Option<TermInfo>, field: FieldKey) -> Result<()> {
        self.count = 0;
        let field_info = field.number().and_then(|n| self.field_infos.by_number(n));
        self.index_options = field_info
            .and_then(|fi| fi.index_options)
            .unwrap_or(IndexOptions::DocsAndFreqsAndPositions);
        self.stores_payloads = field_info.is_some_and(|fi| fi.store_payloads);

        match info {
            None => self.df = 0,
            Some(info) => {
                self.df = info.doc_freq;
                self.doc = 0;
                self.freq = 1;
                self.freq_base_pointer = info.freq_pointer;
                self.prox_base_pointer = info.prox_pointer;
                self.skip_pointer = info.freq_pointer + info.skip_offset as u64;
                self.freq_stream.seek(info.freq_pointer)?;
                self.have_skipped = false;
            }
        }
        Ok(())
    }

    /// Current document.
    pub fn doc(&self) -> DocId {
        self.doc
    }

    /// Occurrences of the term in the current document (1 for docs-only fields).
    pub fn freq(&self) -> u32 {
        self.freq
    }

    /// Documents containing the term, deleted ones included.
    pub fn doc_freq(&self) -> u32 {
        self.df
    }

    pub fn index_options(&self) -> IndexOptions {
        self.index_options
    }

    pub fn stores_payloads(&self) -> bool {
        self.stores_payloads
    }

    pub(crate) fn prox_base_pointer(&self) -> u64 {
        self.prox_base_pointer
    }

    fn is_live(&self, doc: DocId) -> bool {
        self.live_docs.as_ref().is_none_or(|live| live.get(doc))
    }

    /// Advance to the next live document.
    pub fn next(&mut self) -> Result<bool> {
        self.next_with(&mut NoProx)
    }

    pub(crate) fn next_with(&mut self, prox: &mut impl ProxSkipper) -> Result<bool> {
        loop {
            if self.count == self.df {
                return Ok(false);
            }
            let code = self.freq_stream.read_vint()? as u32;
            if self.index_options == IndexOptions::DocsOnly {
                self.doc = self.doc.wrapping_add(code);
            } else {
                self.doc = self.doc.wrapping_add(code >> 1);
                self.freq = if code & 1 != 0 {
                    1
                } else {
                    self.freq_stream.read_vint()? as u32
                };
            }
            self.count += 1;

            if self.is_live(self.doc) {
                return Ok(true);
            }
            prox.skipping_doc(self.freq)?;
        }
    }

    /// Fill `docs`/`freqs` with the next live documents, returning how many
    /// were written (0 when exhausted).
    pub fn read(&mut self, docs: &mut [DocId], freqs: &mut [u32]) -> Result<usize> {
        let length = docs.len().min(freqs.len());
        let mut i = 0;
        while i < length && self.count < self.df {
            let code = self.freq_stream.read_vint()? as u32;
            if self.index_options == IndexOptions::DocsOnly {
                self.doc = self.doc.wrapping_add(code);
                self.freq = 1;
            } else {
                self.doc = self.doc.wrapping_add(code >> 1);
                self.freq = if code & 1 != 0 {
                    1
                } else {
                    self.freq_stream.read_vint()? as u32
                };
            }
            self.count += 1;

            if self.is_live(self.doc) {
                docs[i] = self.doc;
                freqs[i] = self.freq;
                i += 1;
            }
        }
        Ok(i)
    }

    /// Advance to the first live document at or after `target`.
    pub fn skip_to(&mut self, target: DocId) -> Result<bool> {
        self.skip_forward(target, &mut NoProx)?;
        loop {
            if !self.next()? {
                return Ok(false);
            }
            if target <= self.doc {
                return Ok(true);
            }
        }
    }

    /// Use the skip list to jump close to `target` without passing it; the
    /// caller scans the rest of the way.
    pub(crate) fn skip_forward(&mut self, target: DocId, prox: &mut impl ProxSkipper) -> Result<()> {
        // Close targets are cheaper to reach by scanning
        if target as i64 - self.skip_interval as i64 >= self.doc as i64 && self.df >= self.skip_interval {
            let skip_list = self.skip_list.get_or_insert_with(|| {
                Lucene3xSkipListReader::for_postings(
                    self.freq_stream.clone(),
                    self.max_skip_levels as usize,
                    self.skip_interval,
                )
            });
            if !self.have_skipped {
                skip_list.init_postings(
                    self.skip_pointer,
                    self.freq_base_pointer,
                    self.prox_base_pointer,
                    self.df,
                    self.stores_payloads,
                );
                self.have_skipped = true;
            }

            let new_count = skip_list.skip_to(target as i64)?;
            if new_count > self.count as i64 {
                self.freq_stream.seek(skip_list.freq_pointer())?;
                prox.skip_prox(skip_list.prox_pointer(), skip_list.payload_length())?;
                self.doc = skip_list.doc() as DocId;
                self.count = new_count as u32;
            }
        }
        Ok(())
    }
}
