//! Multi-level skip lists over a term's postings.
//!
//! Level 0 has an entry every `skip_interval` documents; each higher level
//! has an entry every `skip_multiplier` entries of the level below, plus a
//! pointer to the matching position in that child level. The upper levels
//! are stored first, each prefixed with its byte length; level 0 follows.

use crate::error::{Error, Result};
use crate::store::IndexInput;

/// Enough levels for any doc count with a skip interval of 2
const MAX_SKIP_LEVELS: usize = 32;

/// Format-specific payload of a skip entry.
pub trait SkipLevelData {
    /// Decode the entry payload at `level`, returning the document delta.
    fn read_skip_data(&mut self, level: usize, input: &mut IndexInput) -> Result<u32>;

    /// `level` resumes from the last entry taken on the level above it.
    fn seek_child(&mut self, level: usize);

    /// The entry just read at `level` becomes the current skip point.
    fn set_last_skip_data(&mut self, level: usize);
}

/// Generic reader; `D` decodes what each entry carries besides the doc.
#[derive(Debug, Clone)]
pub struct MultiLevelSkipListReader<D> {
    max_number_of_skip_levels: usize,
    number_of_skip_levels: usize,
    doc_count: u32,
    have_skipped: bool,
    skip_stream: Vec<Option<IndexInput>>,
    skip_pointer: Vec<u64>,
    skip_interval: Vec<i64>,
    skip_multiplier: u32,
    num_skipped: Vec<i64>,
    skip_doc: Vec<i64>,
    last_doc: i64,
    child_pointer: Vec<u64>,
    last_child_pointer: u64,
    data: D,
}

impl<D: SkipLevelData> MultiLevelSkipListReader<D> {
    pub fn new(
        skip_stream: IndexInput,
        max_skip_levels: usize,
        skip_interval: u32,
        skip_multiplier: u32,
        data: D,
    ) -> Self {
        let max_skip_levels = max_skip_levels.clamp(1, MAX_SKIP_LEVELS);
        let mut streams = vec![None; max_skip_levels];
        streams[0] = Some(skip_stream);

        let mut intervals = Vec::with_capacity(max_skip_levels);
        let mut interval = skip_interval as i64;
        for _ in 0..max_skip_levels {
            intervals.push(interval);
            interval = interval.saturating_mul(skip_multiplier as i64);
        }

        Self {
            max_number_of_skip_levels: max_skip_levels,
            number_of_skip_levels: 0,
            doc_count: 0,
            have_skipped: false,
            skip_stream: streams,
            skip_pointer: vec![0; max_skip_levels],
            skip_interval: intervals,
            skip_multiplier,
            num_skipped: vec![0; max_skip_levels],
            skip_doc: vec![0; max_skip_levels],
            last_doc: 0,
            child_pointer: vec![0; max_skip_levels],
            last_child_pointer: 0,
            data,
        }
    }

    /// Prepare for a new term whose skip data starts at `skip_pointer`.
    pub fn init(&mut self, skip_pointer: u64, doc_count: u32) {
        self.skip_pointer[0] = skip_pointer;
        self.doc_count = doc_count;
        self.skip_doc.fill(0);
        self.num_skipped.fill(0);
        self.child_pointer.fill(0);
        self.last_doc = 0;
        self.last_child_pointer = 0;
        self.have_skipped = false;
        for stream in self.skip_stream.iter_mut().skip(1) {
            *stream = None;
        }
    }

    /// Last document skipped to.
    pub fn doc(&self) -> i64 {
        self.last_doc
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    /// Skip entries until the last one before `target`, returning how many
    /// documents precede the chosen skip point (negative if none was taken).
    pub fn skip_to(&mut self, target: i64) -> Result<i64> {
        if !self.have_skipped {
            self.load_skip_levels()?;
            self.have_skipped = true;
        }

        // Highest level that still has an entry before the target
        let mut level = 0usize;
        while level + 1 < self.number_of_skip_levels && target > self.skip_doc[level + 1] {
            level += 1;
        }

        loop {
            if target > self.skip_doc[level] {
                if !self.load_next_skip(level)? {
                    continue;
                }
            } else {
                if level > 0 {
                    let child_pos = self.stream(level - 1)?.file_pointer();
                    if self.last_child_pointer > child_pos {
                        self.seek_child(level - 1)?;
                    }
                }
                if level == 0 {
                    break;
                }
                level -= 1;
            }
        }

        Ok(self.num_skipped[0] - self.skip_interval[0] - 1)
    }

    fn stream(&mut self, level: usize) -> Result<&mut IndexInput> {
        self.skip_stream[level]
            .as_mut()
            .ok_or_else(|| Error::corrupt("skip list", format!("level {level} is not loaded")))
    }

    fn load_next_skip(&mut self, level: usize) -> Result<bool> {
        self.set_last_skip_data(level);

        self.num_skipped[level] += self.skip_interval[level];
        if self.num_skipped[level] > self.doc_count as i64 {
            // Exhausted on this level
            self.skip_doc[level] = i32::MAX as i64;
            if self.number_of_skip_levels > level {
                self.number_of_skip_levels = level;
            }
            return Ok(false);
        }

        let Some(stream) = self.skip_stream[level].as_mut() else {
            return Err(Error::corrupt("skip list", format!("level {level} is not loaded")));
        };
        self.skip_doc[level] += self.data.read_skip_data(level, stream)? as i64;

        if level != 0 {
            self.child_pointer[level] = stream.read_vlong()? as u64 + self.skip_pointer[level - 1];
        }
        Ok(true)
    }

    fn seek_child(&mut self, level: usize) -> Result<()> {
        let pointer = self.last_child_pointer;
        self.stream(level)?.seek(pointer)?;
        self.num_skipped[level] = self.num_skipped[level + 1] - self.skip_interval[level + 1];
        self.skip_doc[level] = self.last_doc;
        if level > 0 {
            let child = self.stream(level)?.read_vlong()? as u64;
            self.child_pointer[level] = child + self.skip_pointer[level - 1];
        }
        self.data.seek_child(level);
        Ok(())
    }

    fn set_last_skip_data(&mut self, level: usize) {
        self.last_doc = self.skip_doc[level];
        self.last_child_pointer = self.child_pointer[level];
        self.data.set_last_skip_data(level);
    }

    fn load_skip_levels(&mut self) -> Result<()> {
        self.number_of_skip_levels = if self.doc_count as i64 <= self.skip_interval[0] {
            1
        } else {
            1 + log_base(
                self.doc_count as i64 / self.skip_interval[0],
                self.skip_multiplier as i64,
            )
        };
        self.number_of_skip_levels = self.number_of_skip_levels.min(self.max_number_of_skip_levels);

        let base_pointer = self.skip_pointer[0];
        let base = self.stream(0)?;
        base.seek(base_pointer)?;

        for level in (1..self.number_of_skip_levels).rev() {
            let base = self.stream(0)?;
            let length = base.read_vlong()?;
            if length < 0 {
                return Err(Error::corrupt(
                    base.name().to_string(),
                    format!("negative skip level length {length}"),
                ));
            }
            let start = base.file_pointer();
            let level_stream = base.clone();
            base.seek(start + length as u64)?;
            self.skip_pointer[level] = start;
            self.skip_stream[level] = Some(level_stream);
        }

        // The base stream serves the lowest level
        self.skip_pointer[0] = self.stream(0)?.file_pointer();
        Ok(())
    }
}

/// Number of times `x` can be divided by `base` before dropping below it.
fn log_base(mut x: i64, base: i64) -> usize {
    if base <= 1 {
        return 0;
    }
    let mut levels = 0;
    while x >= base {
        x /= base;
        levels += 1;
    }
    levels
}

/// Skip entry payload of the legacy postings: freq/prox file pointers and,
/// for payload-storing fields, the payload length in effect.
#[derive(Debug, Clone)]
pub struct PostingsSkipData {
    stores_payloads: bool,
    freq_pointer: Vec<u64>,
    prox_pointer: Vec<u64>,
    payload_length: Vec<u32>,
    last_freq_pointer: u64,
    last_prox_pointer: u64,
    last_payload_length: u32,
}

impl PostingsSkipData {
    pub fn new(max_skip_levels: usize) -> Self {
        let levels = max_skip_levels.clamp(1, MAX_SKIP_LEVELS);
        Self {
            stores_payloads: false,
            freq_pointer: vec![0; levels],
            prox_pointer: vec![0; levels],
            payload_length: vec![0; levels],
            last_freq_pointer: 0,
            last_prox_pointer: 0,
            last_payload_length: 0,
        }
    }
}

impl SkipLevelData for PostingsSkipData {
    fn read_skip_data(&mut self, level: usize, input: &mut IndexInput) -> Result<u32> {
        let mut delta = input.read_vint()? as u32;
        if self.stores_payloads {
            if delta & 1 != 0 {
                self.payload_length[level] = input.read_vint()? as u32;
            }
            delta >>= 1;
        }
        self.freq_pointer[level] += input.read_vint()? as u32 as u64;
        self.prox_pointer[level] += input.read_vint()? as u32 as u64;
        Ok(delta)
    }

    fn seek_child(&mut self, level: usize) {
        self.freq_pointer[level] = self.last_freq_pointer;
        self.prox_pointer[level] = self.last_prox_pointer;
        self.payload_length[level] = self.last_payload_length;
    }

    fn set_last_skip_data(&mut self, level: usize) {
        self.last_freq_pointer = self.freq_pointer[level];
        self.last_prox_pointer = self.prox_pointer[level];
        self.last_payload_length = self.payload_length[level];
    }
}

/// Skip list reader of the legacy postings format.
pub type Lucene3xSkipListReader = MultiLevelSkipListReader<PostingsSkipData>;

impl MultiLevelSkipListReader<PostingsSkipData> {
    /// Reader whose multiplier equals its interval, as the format requires.
    pub fn for_postings(freq_stream: IndexInput, max_skip_levels: usize, skip_interval: u32) -> Self {
        Self::new(
            freq_stream,
            max_skip_levels,
            skip_interval,
            skip_interval,
            PostingsSkipData::new(max_skip_levels),
        )
    }

    pub fn init_postings(
        &mut self,
        skip_pointer: u64,
        freq_base_pointer: u64,
        prox_base_pointer: u64,
        doc_freq: u32,
        stores_payloads: bool,
    ) {
        self.init(skip_pointer, doc_freq);
        let data = self.data_mut();
        data.stores_payloads = stores_payloads;
        data.last_freq_pointer = freq_base_pointer;
        data.last_prox_pointer = prox_base_pointer;
        data.last_payload_length = 0;
        data.freq_pointer.fill(freq_base_pointer);
        data.prox_pointer.fill(prox_base_pointer);
        data.payload_length.fill(0);
    }

    /// Freq file offset of the document after the skip point.
    pub fn freq_pointer(&self) -> u64 {
        self.data().last_freq_pointer
    }

    /// Prox file offset of the document after the skip point.
    pub fn prox_pointer(&self) -> u64 {
        self.data().last_prox_pointer
    }

    /// Payload length in effect at the skip point.
    pub fn payload_length(&self) -> u32 {
        self.data().last_payload_length
    }
}
