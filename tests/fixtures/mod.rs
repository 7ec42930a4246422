//! Shared helpers for integration tests: an in-test Lucene 3.x segment
//! writer and shortcuts to open what it writes.

#![allow(dead_code)]

pub mod writer;

pub use writer::{Position, Posting, SegmentBuilder};

use lucene3x::index::{IndexOptions, Lucene3xFields, ReaderConfig, TermInfosReader};
use lucene3x::store::RamDirectory;
use std::sync::Arc;

pub const SEGMENT: &str = "_0";

/// Open the segment `builder` describes, held in memory.
pub fn open(builder: &SegmentBuilder) -> Lucene3xFields {
    open_with(builder, &ReaderConfig::default())
}

pub fn open_with(builder: &SegmentBuilder, config: &ReaderConfig) -> Lucene3xFields {
    let dir = builder.write(SEGMENT);
    let field_infos = Arc::new(builder.field_infos());
    Lucene3xFields::open(&dir, SEGMENT, field_infos, config).expect("open segment")
}

/// Just the dictionary of `builder`'s segment.
pub fn open_tis(builder: &SegmentBuilder) -> (RamDirectory, Arc<TermInfosReader>) {
    let dir = builder.write(SEGMENT);
    let field_infos = Arc::new(builder.field_infos());
    let tis = TermInfosReader::open(&dir, SEGMENT, field_infos, Some(1), &ReaderConfig::default())
        .expect("open term dictionary");
    (dir, Arc::new(tis))
}

/// Every term of `field`, in the order the enum returns them.
pub fn collect_terms(fields: &Lucene3xFields, field: &str) -> Vec<String> {
    let mut terms_enum = fields.terms(field).expect("indexed field").iterator().expect("iterator");
    let mut out = Vec::new();
    while let Some(term) = terms_enum.next().expect("next term") {
        out.push(String::from_utf8(term.to_vec()).expect("utf-8 term"));
    }
    out
}

/// One docs-only field `f` holding `terms`, each in document 0.
pub fn single_field(terms: &[&str]) -> SegmentBuilder {
    let mut builder = SegmentBuilder::new().field("f", IndexOptions::DocsOnly, false);
    for term in terms {
        builder.add_term("f", term.as_bytes(), vec![Posting::doc(0)]);
    }
    builder
}

/// A docs-and-freqs field `body` with `count` terms `t000`, `t001`, ...
/// where term `i` occurs in documents `0..=i`.
pub fn numbered_terms(count: usize, index_interval: i32) -> SegmentBuilder {
    let mut builder = SegmentBuilder::new()
        .intervals(index_interval, 4, 10)
        .field("body", IndexOptions::DocsAndFreqs, false);
    for i in 0..count {
        let postings = (0..=i as u32).map(|d| Posting::freq(d, d % 3 + 1)).collect();
        builder.add_term("body", format!("t{i:03}").as_bytes(), postings);
    }
    builder
}
