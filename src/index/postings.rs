//! Postings iterators handed out by a terms enum.
//!
//! [`DocsEnum`] is the document-level capability; [`PositionsEnum`] adds
//! per-occurrence positions and payloads on top of it.

use crate::error::Result;
use crate::index::reader::FieldsShared;
use crate::index::segment_term_enum::SegmentTermEnum;
use crate::index::term_docs::SegmentTermDocs;
use crate::index::term_positions::SegmentTermPositions;
use crate::index::types::{DocId, NO_MORE_DOCS};
use crate::utils::Bits;
use std::sync::Arc;

/// Forward-only iteration over the documents of one term.
pub trait DocsEnum {
    /// Current document; `None` before the first `next_doc`/`advance`,
    /// [`NO_MORE_DOCS`] once exhausted.
    fn doc_id(&self) -> Option<DocId>;

    /// Move to the next live document.
    fn next_doc(&mut self) -> Result<DocId>;

    /// Move to the first live document at or after `target`.
    fn advance(&mut self, target: DocId) -> Result<DocId>;

    /// Occurrences in the current document.
    fn freq(&self) -> u32;

    /// Upper bound on the documents this iterator visits.
    fn cost(&self) -> u64;
}

/// Documents plus the positions and payloads within each.
pub trait PositionsEnum: DocsEnum {
    /// Next position in the current document; call at most `freq()` times.
    fn next_position(&mut self) -> Result<u32>;

    /// Payload at the position just returned, if it has one.
    fn payload(&mut self) -> Result<Option<&[u8]>>;

    /// This format does not record offsets.
    fn start_offset(&self) -> Option<u32> {
        None
    }

    fn end_offset(&self) -> Option<u32> {
        None
    }
}

fn settle(found: bool, doc: DocId) -> DocId {
    if found { doc } else { NO_MORE_DOCS }
}

/// Documents and frequencies of a term.
pub struct PreDocsEnum {
    shared: Arc<FieldsShared>,
    docs: SegmentTermDocs,
    doc_id: Option<DocId>,
}

impl PreDocsEnum {
    pub(crate) fn new(shared: &Arc<FieldsShared>) -> Self {
        Self {
            docs: SegmentTermDocs::new(
                shared.freq_stream.clone(),
                shared.tis.clone(),
                shared.field_infos.clone(),
            ),
            shared: shared.clone(),
            doc_id: None,
        }
    }

    /// True if this iterator reads the same segment files as `shared`.
    pub(crate) fn belongs_to(&self, shared: &Arc<FieldsShared>) -> bool {
        Arc::ptr_eq(&self.shared, shared)
    }

    pub(crate) fn reset(
        mut self,
        terms: &SegmentTermEnum,
        live_docs: Option<Arc<dyn Bits>>,
    ) -> Result<Self> {
        self.docs.set_live_docs(live_docs);
        self.docs.seek_enum(terms)?;
        self.doc_id = None;
        Ok(self)
    }
}

impl DocsEnum for PreDocsEnum {
    fn doc_id(&self) -> Option<DocId> {
        self.doc_id
    }

    fn next_doc(&mut self) -> Result<DocId> {
        self.shared.ensure_open()?;
        let found = self.docs.next()?;
        let doc = settle(found, self.docs.doc());
        self.doc_id = Some(doc);
        Ok(doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.shared.ensure_open()?;
        let found = self.docs.skip_to(target)?;
        let doc = settle(found, self.docs.doc());
        self.doc_id = Some(doc);
        Ok(doc)
    }

    fn freq(&self) -> u32 {
        self.docs.freq()
    }

    fn cost(&self) -> u64 {
        self.docs.doc_freq() as u64
    }
}

/// Documents, frequencies, positions and payloads of a term.
pub struct PreDocsAndPositionsEnum {
    shared: Arc<FieldsShared>,
    positions: SegmentTermPositions,
    doc_id: Option<DocId>,
}

impl PreDocsAndPositionsEnum {
    pub(crate) fn new(shared: &Arc<FieldsShared>) -> Self {
        Self {
            positions: SegmentTermPositions::new(
                shared.freq_stream.clone(),
                shared.prox_stream.clone(),
                shared.tis.clone(),
                shared.field_infos.clone(),
            ),
            shared: shared.clone(),
            doc_id: None,
        }
    }

    pub(crate) fn belongs_to(&self, shared: &Arc<FieldsShared>) -> bool {
        Arc::ptr_eq(&self.shared, shared)
    }

    pub(crate) fn reset(
        mut self,
        terms: &SegmentTermEnum,
        live_docs: Option<Arc<dyn Bits>>,
    ) -> Result<Self> {
        self.positions.set_live_docs(live_docs);
        self.positions.seek_enum(terms)?;
        self.doc_id = None;
        Ok(self)
    }

    /// Length of the payload at the current position, 0 if none.
    pub fn payload_length(&self) -> u32 {
        self.positions.payload_length()
    }
}

impl DocsEnum for PreDocsAndPositionsEnum {
    fn doc_id(&self) -> Option<DocId> {
        self.doc_id
    }

    fn next_doc(&mut self) -> Result<DocId> {
        self.shared.ensure_open()?;
        let found = self.positions.next()?;
        let doc = settle(found, self.positions.doc());
        self.doc_id = Some(doc);
        Ok(doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.shared.ensure_open()?;
        let found = self.positions.skip_to(target)?;
        let doc = settle(found, self.positions.doc());
        self.doc_id = Some(doc);
        Ok(doc)
    }

    fn freq(&self) -> u32 {
        self.positions.freq()
    }

    fn cost(&self) -> u64 {
        self.positions.doc_freq() as u64
    }
}

impl PositionsEnum for PreDocsAndPositionsEnum {
    fn next_position(&mut self) -> Result<u32> {
        self.shared.ensure_open()?;
        debug_assert!(self.doc_id.is_some_and(|d| d != NO_MORE_DOCS));
        self.positions.next_position()
    }

    fn payload(&mut self) -> Result<Option<&[u8]>> {
        self.shared.ensure_open()?;
        self.positions.payload()
    }
}
