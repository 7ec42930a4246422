//! Position and payload iteration over `.prx`, layered on [`SegmentTermDocs`].

use crate::error::{Error, Result};
use crate::index::field_infos::FieldInfos;
use crate::index::segment_term_enum::SegmentTermEnum;
use crate::index::term_docs::{ProxSkipper, SegmentTermDocs};
use crate::index::term_infos_reader::TermInfosReader;
use crate::index::types::{DocId, FieldKey, IndexOptions, Term, TermInfo};
use crate::store::IndexInput;
use crate::utils::Bits;
use std::sync::Arc;

/// Prox-side state. Skipping is lazy: passing documents only accumulates
/// how many positions to skip and where to seek, and the work is done when a
/// position is actually requested.
struct ProxCursor {
    /// Shared prox file, cloned into `stream` on first use
    source: Option<IndexInput>,
    stream: Option<IndexInput>,
    stores_payloads: bool,
    has_positions: bool,

    prox_count: u32,
    position: u32,
    payload_length: u32,
    need_to_load_payload: bool,
    payload: Vec<u8>,

    lazy_skip_pointer: Option<u64>,
    lazy_skip_prox_count: u32,
}

impl ProxCursor {
    fn stream(&mut self) -> Result<&mut IndexInput> {
        if self.stream.is_none() {
            let source = self
                .source
                .as_ref()
                .ok_or_else(|| Error::illegal_state("positions requested but no prox file is open"))?;
            self.stream = Some(source.clone());
        }
        self.stream
            .as_mut()
            .ok_or_else(|| Error::illegal_state("prox stream unavailable"))
    }

    fn read_delta_position(&mut self) -> Result<u32> {
        let stores_payloads = self.stores_payloads;
        let stream = self.stream()?;
        let mut delta = stream.read_vint()?;
        if stores_payloads {
            if delta & 1 != 0 {
                let length = stream.read_vint()?;
                if length < 0 {
                    return Err(Error::corrupt(
                        stream.name().to_string(),
                        format!("negative payload length {length}"),
                    ));
                }
                self.payload_length = length as u32;
            }
            delta = ((delta as u32) >> 1) as i32;
            self.need_to_load_payload = true;
        } else if delta == -1 {
            // Some writers stored position 0 deltas as -1
            delta = 0;
        }
        Ok(delta as u32)
    }

    fn skip_payload(&mut self) -> Result<()> {
        if self.need_to_load_payload && self.payload_length > 0 {
            let length = self.payload_length as u64;
            self.stream()?.skip_bytes(length)?;
        }
        self.need_to_load_payload = false;
        Ok(())
    }

    fn skip_positions(&mut self, count: u32) -> Result<()> {
        for _ in 0..count {
            self.read_delta_position()?;
            self.skip_payload()?;
        }
        Ok(())
    }

    fn lazy_skip(&mut self) -> Result<()> {
        self.stream()?;
        // The current payload may not have been read
        self.skip_payload()?;
        if let Some(pointer) = self.lazy_skip_pointer.take() {
            self.stream()?.seek(pointer)?;
        }
        if self.lazy_skip_prox_count != 0 {
            let count = std::mem::take(&mut self.lazy_skip_prox_count);
            self.skip_positions(count)?;
        }
        Ok(())
    }
}

impl ProxSkipper for ProxCursor {
    fn skipping_doc(&mut self, freq: u32) -> Result<()> {
        self.lazy_skip_prox_count += freq;
        Ok(())
    }

    fn skip_prox(&mut self, prox_pointer: u64, payload_length: u32) -> Result<()> {
        self.lazy_skip_pointer = Some(prox_pointer);
        self.lazy_skip_prox_count = 0;
        self.prox_count = 0;
        self.payload_length = payload_length;
        self.need_to_load_payload = false;
        Ok(())
    }
}

/// Iterates documents of a term and, within each, its positions and payloads.
///
/// Each position is a vint delta from the previous one in the document. For
/// payload-storing fields the delta is shifted left by one; a set low bit
/// means a new payload length (vint) follows, and the payload bytes of that
/// length come after every position.
pub struct SegmentTermPositions {
    docs: SegmentTermDocs,
    prox: ProxCursor,
}

impl SegmentTermPositions {
    pub fn new(
        freq_stream: IndexInput,
        prox_stream: Option<IndexInput>,
        tis: Arc<TermInfosReader>,
        field_infos: Arc<FieldInfos>,
    ) -> Self {
        Self {
            docs: SegmentTermDocs::new(freq_stream, tis, field_infos),
            prox: ProxCursor {
                source: prox_stream,
                stream: None,
                stores_payloads: false,
                has_positions: true,
                prox_count: 0,
                position: 0,
                payload_length: 0,
                need_to_load_payload: false,
                payload: Vec::new(),
                lazy_skip_pointer: None,
                lazy_skip_prox_count: 0,
            },
        }
    }

    pub fn set_live_docs(&mut self, live_docs: Option<Arc<dyn Bits>>) {
        self.docs.set_live_docs(live_docs);
    }

    pub fn seek_term(&mut self, term: &Term) -> Result<()> {
        self.docs.seek_term(term)?;
        self.after_seek();
        Ok(())
    }

    pub fn seek_enum(&mut self, terms: &SegmentTermEnum) -> Result<()> {
        self.docs.seek_enum(terms)?;
        self.after_seek();
        Ok(())
    }

    pub fn seek(&mut self, info: Option<TermInfo>, field: FieldKey) -> Result<()> {
        self.docs.seek(info, field)?;
        self.after_seek();
        Ok(())
    }

    fn after_seek(&mut self) {
        let prox = &mut self.prox;
        if self.docs.doc_freq() > 0 {
            prox.lazy_skip_pointer = Some(self.docs.prox_base_pointer());
        }
        prox.stores_payloads = self.docs.stores_payloads();
        prox.has_positions = self.docs.index_options() == IndexOptions::DocsAndFreqsAndPositions;
        prox.lazy_skip_prox_count = 0;
        prox.prox_count = 0;
        prox.payload_length = 0;
        prox.need_to_load_payload = false;
    }

    pub fn doc(&self) -> DocId {
        self.docs.doc()
    }

    pub fn freq(&self) -> u32 {
        self.docs.freq()
    }

    pub fn doc_freq(&self) -> u32 {
        self.docs.doc_freq()
    }

    pub fn next(&mut self) -> Result<bool> {
        // Positions of the document being left still have to be skipped
        self.prox.lazy_skip_prox_count += self.prox.prox_count;
        if self.docs.next_with(&mut self.prox)? {
            self.prox.prox_count = self.docs.freq();
            self.prox.position = 0;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn skip_to(&mut self, target: DocId) -> Result<bool> {
        self.docs.skip_forward(target, &mut self.prox)?;
        loop {
            if !self.next()? {
                return Ok(false);
            }
            if target <= self.doc() {
                return Ok(true);
            }
        }
    }

    /// Bulk reads would lose the positions.
    pub fn read(&mut self, _docs: &mut [DocId], _freqs: &mut [u32]) -> Result<usize> {
        Err(Error::unsupported("bulk read of a positions iterator"))
    }

    /// Next position in the current document; 0 for fields without positions.
    pub fn next_position(&mut self) -> Result<u32> {
        if !self.prox.has_positions {
            return Ok(0);
        }
        self.prox.lazy_skip()?;
        self.prox.prox_count = self.prox.prox_count.saturating_sub(1);
        let delta = self.prox.read_delta_position()?;
        self.prox.position += delta;
        Ok(self.prox.position)
    }

    /// Length of the payload at the current position.
    pub fn payload_length(&self) -> u32 {
        self.prox.payload_length
    }

    /// True if the current position has a payload that was not read yet.
    pub fn is_payload_available(&self) -> bool {
        self.prox.need_to_load_payload && self.prox.payload_length > 0
    }

    /// Payload of the current position, read on first request.
    pub fn payload(&mut self) -> Result<Option<&[u8]>> {
        let prox = &mut self.prox;
        if prox.payload_length == 0 {
            return Ok(None);
        }
        if prox.need_to_load_payload {
            let length = prox.payload_length as usize;
            let mut payload = std::mem::take(&mut prox.payload);
            payload.resize(length, 0);
            prox.stream()?.read_bytes(&mut payload)?;
            prox.payload = payload;
            prox.need_to_load_payload = false;
        }
        Ok(Some(&prox.payload))
    }
}
