//! Writes real Lucene 3.x segment files for tests: `.fnm`, `.tis`, `.tii`,
//! `.frq` (with multi-level skip data) and `.prx` (with payloads).

use lucene3x::index::{FieldInfo, FieldInfos, IndexOptions};
use lucene3x::store::RamDirectory;
use lucene3x::utils::{
    compare_str_as_utf16, compare_utf8_as_utf16, encode_int, encode_long, encode_vint, encode_vlong,
};

pub const TIS_FORMAT: i32 = -4;

/// One occurrence of a term within a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub position: u32,
    pub payload: Option<Vec<u8>>,
}

/// A document of a term's postings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub doc: u32,
    pub freq: u32,
    pub positions: Vec<Position>,
}

impl Posting {
    pub fn doc(doc: u32) -> Self {
        Self { doc, freq: 1, positions: Vec::new() }
    }

    pub fn freq(doc: u32, freq: u32) -> Self {
        Self { doc, freq, positions: Vec::new() }
    }

    /// Positions without payloads; freq is their count.
    pub fn positions(doc: u32, positions: &[u32]) -> Self {
        Self {
            doc,
            freq: positions.len() as u32,
            positions: positions
                .iter()
                .map(|&position| Position { position, payload: None })
                .collect(),
        }
    }

    /// Attach a payload to the `index`-th position.
    pub fn with_payload(mut self, index: usize, payload: &[u8]) -> Self {
        self.positions[index].payload = Some(payload.to_vec());
        self
    }
}

struct PendingTerm {
    field: u32,
    text: Vec<u8>,
    postings: Vec<Posting>,
}

/// Collects fields and terms, then encodes a whole segment.
pub struct SegmentBuilder {
    fields: Vec<FieldInfo>,
    terms: Vec<PendingTerm>,
    pub index_interval: i32,
    pub skip_interval: i32,
    pub max_skip_levels: i32,
}

impl Default for SegmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentBuilder {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            terms: Vec::new(),
            index_interval: 4,
            skip_interval: 4,
            max_skip_levels: 10,
        }
    }

    pub fn intervals(mut self, index_interval: i32, skip_interval: i32, max_skip_levels: i32) -> Self {
        self.index_interval = index_interval;
        self.skip_interval = skip_interval;
        self.max_skip_levels = max_skip_levels;
        self
    }

    /// Add a field; numbers are assigned in call order.
    pub fn field(mut self, name: &str, options: IndexOptions, payloads: bool) -> Self {
        let mut info = FieldInfo::new(name, self.fields.len() as u32, options);
        if payloads {
            info = info.with_payloads();
        }
        self.fields.push(info);
        self
    }

    pub fn term(mut self, field: &str, text: &str, postings: Vec<Posting>) -> Self {
        self.add_term(field, text.as_bytes(), postings);
        self
    }

    pub fn add_term(&mut self, field: &str, text: &[u8], postings: Vec<Posting>) {
        let number = self
            .fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.number)
            .unwrap_or_else(|| panic!("unknown field {field}"));
        self.terms.push(PendingTerm {
            field: number,
            text: text.to_vec(),
            postings,
        });
    }

    /// Term with docs-only postings.
    pub fn docs_term(self, field: &str, text: &str, docs: &[u32]) -> Self {
        let postings = docs.iter().map(|&d| Posting::doc(d)).collect();
        self.term(field, text, postings)
    }

    pub fn field_infos(&self) -> FieldInfos {
        FieldInfos::new(self.fields.iter().cloned()).expect("valid fields")
    }

    /// Encode every file of `segment`.
    pub fn build(&self, segment: &str) -> Vec<(String, Vec<u8>)> {
        let mut order: Vec<usize> = (0..self.terms.len()).collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&self.terms[a], &self.terms[b]);
            compare_str_as_utf16(&self.fields[a.field as usize].name, &self.fields[b.field as usize].name)
                .then_with(|| compare_utf8_as_utf16(&a.text, &b.text))
        });

        let mut tis = TermsWriter::new(false, self);
        let mut tii = TermsWriter::new(true, self);
        let mut frq = Vec::new();
        let mut prx = Vec::new();

        // The index samples the entry preceding every index_interval-th term,
        // starting with the "" pseudo-term
        let mut last_field = -1;
        let mut last_text: Vec<u8> = Vec::new();
        let mut last_info = Info::default();

        for (i, &t) in order.iter().enumerate() {
            let term = &self.terms[t];
            let field = &self.fields[term.field as usize];

            if i as i32 % self.index_interval == 0 {
                let pointer = tis.out.len() as i64;
                tii.add(last_field, &last_text, last_info, Some(pointer));
            }

            let info = self.write_postings(field, &term.postings, &mut frq, &mut prx);
            tis.add(term.field as i32, &term.text, info, None);

            last_field = term.field as i32;
            last_text = term.text.clone();
            last_info = info;
        }

        let fnm = self.field_infos().encode();
        vec![
            (format!("{segment}.fnm"), fnm),
            (format!("{segment}.tis"), tis.finish()),
            (format!("{segment}.tii"), tii.finish()),
            (format!("{segment}.frq"), frq),
            (format!("{segment}.prx"), prx),
        ]
    }

    /// Encode `segment` into a fresh in-memory directory.
    pub fn write(&self, segment: &str) -> RamDirectory {
        let dir = RamDirectory::new();
        self.write_into(&dir, segment);
        dir
    }

    pub fn write_into(&self, dir: &RamDirectory, segment: &str) {
        for (name, bytes) in self.build(segment) {
            dir.write_file(name, bytes);
        }
    }

    /// Encode `segment` as files under `path`.
    pub fn write_to_path(&self, path: &std::path::Path, segment: &str) {
        for (name, bytes) in self.build(segment) {
            std::fs::write(path.join(name), bytes).expect("write segment file");
        }
    }

    fn write_postings(
        &self,
        field: &FieldInfo,
        postings: &[Posting],
        frq: &mut Vec<u8>,
        prx: &mut Vec<u8>,
    ) -> Info {
        let options = field.index_options.expect("indexed field");
        let df = postings.len() as u32;
        let freq_start = frq.len() as u64;
        let prox_start = prx.len() as u64;
        let interval = self.skip_interval as u32;
        let mut skip = SkipWriter::new(
            interval,
            self.max_skip_levels as usize,
            df,
            freq_start,
            prox_start,
            field.store_payloads,
        );

        let mut last_doc = 0u32;
        let mut last_payload_length = -1i32;
        for (i, posting) in postings.iter().enumerate() {
            let count = i as u32 + 1;
            if count % interval == 0 {
                skip.buffer(count, last_doc, frq.len() as u64, prx.len() as u64, last_payload_length);
            }

            let delta = posting.doc - last_doc;
            match options {
                IndexOptions::DocsOnly => encode_vint(delta as i32, frq),
                _ if posting.freq == 1 => encode_vint((delta << 1 | 1) as i32, frq),
                _ => {
                    encode_vint((delta << 1) as i32, frq);
                    encode_vint(posting.freq as i32, frq);
                }
            }
            last_doc = posting.doc;

            if options == IndexOptions::DocsAndFreqsAndPositions {
                assert_eq!(posting.positions.len() as u32, posting.freq, "freq must match positions");
                let mut last_position = 0;
                for p in &posting.positions {
                    let delta = (p.position - last_position) as i32;
                    last_position = p.position;
                    if field.store_payloads {
                        let length = p.payload.as_ref().map_or(0, |b| b.len() as i32);
                        if length != last_payload_length {
                            last_payload_length = length;
                            encode_vint(delta << 1 | 1, prx);
                            encode_vint(length, prx);
                        } else {
                            encode_vint(delta << 1, prx);
                        }
                        if let Some(payload) = &p.payload {
                            prx.extend_from_slice(payload);
                        }
                    } else {
                        encode_vint(delta, prx);
                    }
                }
            }
        }

        let skip_offset = if df >= interval {
            let pointer = frq.len() as u64;
            skip.write_to(frq);
            (pointer - freq_start) as u32
        } else {
            0
        };

        Info {
            doc_freq: df,
            freq_pointer: freq_start,
            prox_pointer: prox_start,
            skip_offset,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Info {
    doc_freq: u32,
    freq_pointer: u64,
    prox_pointer: u64,
    skip_offset: u32,
}

/// Prefix-compressed dictionary entries with pointer deltas.
struct TermsWriter {
    out: Vec<u8>,
    is_index: bool,
    size: i64,
    skip_interval: u32,
    last_text: Vec<u8>,
    last_info: Info,
    last_index_pointer: i64,
}

impl TermsWriter {
    fn new(is_index: bool, builder: &SegmentBuilder) -> Self {
        let mut out = Vec::new();
        encode_int(TIS_FORMAT, &mut out);
        encode_long(0, &mut out);
        encode_int(builder.index_interval, &mut out);
        encode_int(builder.skip_interval, &mut out);
        encode_int(builder.max_skip_levels, &mut out);
        Self {
            out,
            is_index,
            size: 0,
            skip_interval: builder.skip_interval as u32,
            last_text: Vec::new(),
            last_info: Info::default(),
            last_index_pointer: 0,
        }
    }

    fn add(&mut self, field: i32, text: &[u8], info: Info, index_pointer: Option<i64>) {
        let prefix = text
            .iter()
            .zip(&self.last_text)
            .take_while(|(a, b)| a == b)
            .count();
        encode_vint(prefix as i32, &mut self.out);
        encode_vint((text.len() - prefix) as i32, &mut self.out);
        self.out.extend_from_slice(&text[prefix..]);
        encode_vint(field, &mut self.out);

        encode_vint(info.doc_freq as i32, &mut self.out);
        encode_vlong(info.freq_pointer as i64 - self.last_info.freq_pointer as i64, &mut self.out);
        encode_vlong(info.prox_pointer as i64 - self.last_info.prox_pointer as i64, &mut self.out);
        if info.doc_freq >= self.skip_interval {
            encode_vint(info.skip_offset as i32, &mut self.out);
        }
        if self.is_index {
            let pointer = index_pointer.expect("index entries carry a pointer");
            encode_vlong(pointer - self.last_index_pointer, &mut self.out);
            self.last_index_pointer = pointer;
        }

        self.last_text = text.to_vec();
        self.last_info = info;
        self.size += 1;
    }

    fn finish(mut self) -> Vec<u8> {
        self.out[4..12].copy_from_slice(&self.size.to_be_bytes());
        self.out
    }
}

/// Buffers skip entries per level and appends them after a term's docs.
struct SkipWriter {
    interval: u32,
    levels: usize,
    store_payloads: bool,
    buffers: Vec<Vec<u8>>,
    last_doc: Vec<u32>,
    last_payload_length: Vec<i32>,
    last_freq_pointer: Vec<u64>,
    last_prox_pointer: Vec<u64>,
}

impl SkipWriter {
    fn new(
        interval: u32,
        max_levels: usize,
        df: u32,
        freq_start: u64,
        prox_start: u64,
        store_payloads: bool,
    ) -> Self {
        let mut levels = 1;
        if df > interval {
            let mut x = df / interval;
            while x >= interval {
                x /= interval;
                levels += 1;
            }
        }
        let levels = levels.min(max_levels.max(1));
        Self {
            interval,
            levels,
            store_payloads,
            buffers: vec![Vec::new(); levels],
            last_doc: vec![0; levels],
            last_payload_length: vec![-1; levels],
            last_freq_pointer: vec![freq_start; levels],
            last_prox_pointer: vec![prox_start; levels],
        }
    }

    fn buffer(&mut self, df: u32, doc: u32, freq_pointer: u64, prox_pointer: u64, payload_length: i32) {
        let mut num_levels = 1;
        let mut x = df / self.interval;
        while x % self.interval == 0 && num_levels < self.levels {
            num_levels += 1;
            x /= self.interval;
        }

        let mut child_pointer = 0u64;
        for level in 0..num_levels {
            let buf = &mut self.buffers[level];
            let delta = doc - self.last_doc[level];
            if self.store_payloads {
                if payload_length == self.last_payload_length[level] {
                    encode_vint((delta * 2) as i32, buf);
                } else {
                    encode_vint((delta * 2 + 1) as i32, buf);
                    encode_vint(payload_length, buf);
                    self.last_payload_length[level] = payload_length;
                }
            } else {
                encode_vint(delta as i32, buf);
            }
            encode_vint((freq_pointer - self.last_freq_pointer[level]) as i32, buf);
            encode_vint((prox_pointer - self.last_prox_pointer[level]) as i32, buf);
            self.last_doc[level] = doc;
            self.last_freq_pointer[level] = freq_pointer;
            self.last_prox_pointer[level] = prox_pointer;

            let new_child_pointer = buf.len() as u64;
            if level != 0 {
                encode_vlong(child_pointer as i64, buf);
            }
            child_pointer = new_child_pointer;
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        for level in (1..self.levels).rev() {
            let buf = &self.buffers[level];
            if !buf.is_empty() {
                encode_vlong(buf.len() as i64, out);
                out.extend_from_slice(buf);
            }
        }
        out.extend_from_slice(&self.buffers[0]);
    }
}
