//! Document, frequency, position and payload iteration, with and without
//! the skip lists.

mod fixtures;

use fixtures::{Posting, SEGMENT, SegmentBuilder, open};
use lucene3x::ErrorKind;
use lucene3x::index::{
    DocsEnum, IndexOptions, NO_MORE_DOCS, PositionsEnum, ReaderConfig, SegmentTermDocs,
    SegmentTermPositions, Term, TermInfosReader,
};
use lucene3x::store::Directory;
use lucene3x::utils::{Bits, FixedBits};
use proptest::prelude::*;
use roaring::RoaringBitmap;
use std::sync::Arc;

/// Positions of `doc` in the generated positional fixtures
fn positions_of(doc: u32) -> Vec<u32> {
    let first = doc % 5;
    (0..doc % 3 + 1).map(|i| first + i * 4).collect()
}

fn positional_term(docs: &[u32], skip_interval: i32, payloads: bool) -> SegmentBuilder {
    let postings = docs
        .iter()
        .map(|&doc| {
            let mut posting = Posting::positions(doc, &positions_of(doc));
            if payloads && doc % 4 == 0 {
                posting = posting.with_payload(0, &doc.to_be_bytes());
            }
            posting
        })
        .collect();
    SegmentBuilder::new()
        .intervals(4, skip_interval, 3)
        .field("body", IndexOptions::DocsAndFreqsAndPositions, payloads)
        .term("body", "x", postings)
}

#[test]
fn test_skip_then_next() {
    let builder = SegmentBuilder::new()
        .intervals(4, 2, 10)
        .field("body", IndexOptions::DocsAndFreqs, false)
        .term(
            "body",
            "a",
            vec![Posting::freq(1, 2), Posting::freq(5, 1), Posting::freq(9, 3)],
        );
    let fields = open(&builder);
    let mut terms = fields.terms("body").unwrap().iterator().unwrap();
    assert!(terms.seek_exact(b"a").unwrap());
    assert_eq!(terms.doc_freq(), 3);

    let mut docs = terms.docs(None, None).unwrap();
    assert_eq!(docs.doc_id(), None);
    assert_eq!(docs.cost(), 3);
    assert_eq!(docs.advance(5).unwrap(), 5);
    assert_eq!(docs.freq(), 1);
    assert_eq!(docs.next_doc().unwrap(), 9);
    assert_eq!(docs.freq(), 3);
    assert_eq!(docs.next_doc().unwrap(), NO_MORE_DOCS);
    assert_eq!(docs.doc_id(), Some(NO_MORE_DOCS));
}

#[test]
fn test_positions_and_payload_after_skip() {
    let mut postings: Vec<Posting> = (0..12).map(|d| Posting::positions(d, &[1])).collect();
    postings.push(Posting::positions(12, &[0, 3, 7]).with_payload(1, b"abcd"));
    postings.extend((13..20).map(|d| Posting::positions(d, &[2])));
    let builder = SegmentBuilder::new()
        .intervals(4, 2, 3)
        .field("body", IndexOptions::DocsAndFreqsAndPositions, true)
        .term("body", "x", postings);
    let fields = open(&builder);
    let mut terms = fields.terms("body").unwrap().iterator().unwrap();
    assert!(terms.seek_exact(b"x").unwrap());

    let mut positions = terms.docs_and_positions(None, None).unwrap().unwrap();
    assert_eq!(positions.advance(12).unwrap(), 12);
    assert_eq!(positions.freq(), 3);

    assert_eq!(positions.next_position().unwrap(), 0);
    assert_eq!(positions.payload().unwrap(), None);
    assert_eq!(positions.next_position().unwrap(), 3);
    assert_eq!(positions.payload_length(), 4);
    assert_eq!(positions.payload().unwrap(), Some(&b"abcd"[..]));
    assert_eq!(positions.next_position().unwrap(), 7);
    assert_eq!(positions.payload().unwrap(), None);
    assert_eq!(positions.start_offset(), None);

    assert_eq!(positions.next_doc().unwrap(), 13);
    assert_eq!(positions.next_position().unwrap(), 2);
}

#[test]
fn test_unread_positions_are_skipped() {
    let docs: Vec<u32> = (0..40).map(|i| i * 3).collect();
    let fields = open(&positional_term(&docs, 4, true));
    let mut terms = fields.terms("body").unwrap().iterator().unwrap();
    terms.next().unwrap();

    let mut positions = terms.docs_and_positions(None, None).unwrap().unwrap();
    let mut visited = 0;
    loop {
        let doc = positions.next_doc().unwrap();
        if doc == NO_MORE_DOCS {
            break;
        }
        visited += 1;
        // Read positions of every other doc, payloads of every fourth
        if visited % 2 == 0 {
            continue;
        }
        let expected = positions_of(doc);
        assert_eq!(positions.freq() as usize, expected.len());
        for (i, &want) in expected.iter().enumerate() {
            assert_eq!(positions.next_position().unwrap(), want, "doc {doc}");
            if visited % 4 == 1 {
                let payload = positions.payload().unwrap().map(<[u8]>::to_vec);
                let want_payload = (doc % 4 == 0 && i == 0).then(|| doc.to_be_bytes().to_vec());
                assert_eq!(payload, want_payload, "doc {doc}");
            }
        }
    }
    assert_eq!(visited, 40);
}

#[test]
fn test_docs_only_field() {
    let builder = SegmentBuilder::new()
        .field("id", IndexOptions::DocsOnly, false)
        .docs_term("id", "k", &[3, 4, 10]);
    let fields = open(&builder);
    let mut terms = fields.terms("id").unwrap().iterator().unwrap();
    terms.next().unwrap();
    assert!(terms.docs_and_positions(None, None).unwrap().is_none());

    let mut docs = terms.docs(None, None).unwrap();
    let mut seen = Vec::new();
    while docs.next_doc().unwrap() != NO_MORE_DOCS {
        assert_eq!(docs.freq(), 1);
        seen.push(docs.doc_id().unwrap());
    }
    assert_eq!(seen, [3, 4, 10]);
}

#[test]
fn test_live_docs() {
    let docs: Vec<u32> = (0..30).collect();
    let fields = open(&positional_term(&docs, 4, false));
    let mut terms = fields.terms("body").unwrap().iterator().unwrap();
    terms.next().unwrap();

    let mut live: RoaringBitmap = (0..30).collect();
    for deleted in [0, 1, 7, 8, 9, 20, 29] {
        live.remove(deleted);
    }
    let expected: Vec<u32> = live.iter().collect();
    let live: Arc<dyn Bits> = Arc::new(live);

    let mut postings = terms.docs(Some(live.clone()), None).unwrap();
    let mut seen = Vec::new();
    while postings.next_doc().unwrap() != NO_MORE_DOCS {
        seen.push(postings.doc_id().unwrap());
    }
    assert_eq!(seen, expected);

    // Skipping onto a deleted doc lands on the next live one
    let mut positions = terms.docs_and_positions(Some(live), None).unwrap().unwrap();
    assert_eq!(positions.advance(7).unwrap(), 10);
    for want in positions_of(10) {
        assert_eq!(positions.next_position().unwrap(), want);
    }
    assert_eq!(positions.next_doc().unwrap(), 11);
    assert_eq!(positions.next_position().unwrap(), positions_of(11)[0]);
}

#[test]
fn test_fixed_bits_live_docs() {
    let builder = SegmentBuilder::new()
        .field("id", IndexOptions::DocsAndFreqs, false)
        .term("id", "k", (0..10).map(|d| Posting::freq(d, d + 1)).collect());
    let fields = open(&builder);
    let mut terms = fields.terms("id").unwrap().iterator().unwrap();
    terms.next().unwrap();

    let mut live = FixedBits::all(10);
    live.clear(2);
    live.clear(3);
    assert_eq!(live.count_ones(), 8);
    let mut docs = terms.docs(Some(Arc::new(live)), None).unwrap();
    assert_eq!(docs.next_doc().unwrap(), 0);
    assert_eq!(docs.next_doc().unwrap(), 1);
    assert_eq!(docs.next_doc().unwrap(), 4);
    assert_eq!(docs.freq(), 5);
}

#[test]
fn test_reuse_across_terms() {
    let builder = SegmentBuilder::new()
        .field("body", IndexOptions::DocsAndFreqs, false)
        .term("body", "a", vec![Posting::freq(1, 1), Posting::freq(2, 2)])
        .term("body", "b", vec![Posting::freq(7, 3)]);
    let fields = open(&builder);
    let mut terms = fields.terms("body").unwrap().iterator().unwrap();

    terms.next().unwrap();
    let mut docs = terms.docs(None, None).unwrap();
    assert_eq!(docs.next_doc().unwrap(), 1);

    terms.next().unwrap();
    let mut docs = terms.docs(None, Some(docs)).unwrap();
    assert_eq!(docs.doc_id(), None);
    assert_eq!(docs.next_doc().unwrap(), 7);
    assert_eq!(docs.freq(), 3);
    assert_eq!(docs.next_doc().unwrap(), NO_MORE_DOCS);
}

#[test]
fn test_term_docs_bulk_read() {
    let builder = SegmentBuilder::new()
        .field("body", IndexOptions::DocsAndFreqs, false)
        .term("body", "a", (0..10).map(|d| Posting::freq(d * 2, d + 1)).collect());
    let dir = builder.write(SEGMENT);
    let field_infos = Arc::new(builder.field_infos());
    let tis = Arc::new(
        TermInfosReader::open(&dir, SEGMENT, field_infos.clone(), Some(1), &ReaderConfig::default())
            .unwrap(),
    );
    let freq = dir.open_input("_0.frq").unwrap();

    let mut term_docs = SegmentTermDocs::new(freq.clone(), tis.clone(), field_infos.clone());
    let mut live = FixedBits::all(20);
    live.clear(4);
    term_docs.set_live_docs(Some(Arc::new(live)));
    term_docs.seek_term(&Term::new("body", "a")).unwrap();
    assert_eq!(term_docs.doc_freq(), 10);

    let mut docs = [0u32; 4];
    let mut freqs = [0u32; 4];
    let mut all = Vec::new();
    loop {
        let n = term_docs.read(&mut docs, &mut freqs).unwrap();
        if n == 0 {
            break;
        }
        all.extend(docs[..n].iter().copied().zip(freqs[..n].iter().copied()));
    }
    let expected: Vec<(u32, u32)> = (0..10).filter(|&d| d != 2).map(|d| (d * 2, d + 1)).collect();
    assert_eq!(all, expected);

    // Absent terms have no postings
    term_docs.seek_term(&Term::new("body", "zzz")).unwrap();
    assert_eq!(term_docs.doc_freq(), 0);
    assert!(!term_docs.next().unwrap());

    let mut positions = SegmentTermPositions::new(freq, None, tis, field_infos);
    positions.seek_term(&Term::new("body", "a")).unwrap();
    let err = positions.read(&mut docs, &mut freqs).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Unsupported { .. }));
    // The field has no positions
    assert!(positions.next().unwrap());
    assert_eq!(positions.next_position().unwrap(), 0);
}

fn sorted_docs() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::btree_set(0u32..3000, 1..400).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_advance_matches_linear_scan(
        docs in sorted_docs(),
        targets in prop::collection::vec(0u32..3200, 1..30),
        skip_interval in 2i32..5,
    ) {
        let fields = open(&positional_term(&docs, skip_interval, true));
        let mut terms = fields.terms("body").unwrap().iterator().unwrap();
        prop_assert!(terms.seek_exact(b"x").unwrap());

        let mut targets = targets;
        targets.sort_unstable();
        let mut plain = terms.docs(None, None).unwrap();
        let mut positional = terms.docs_and_positions(None, None).unwrap().unwrap();
        let mut current: Option<u32> = None;

        for target in targets {
            let target = match current {
                Some(doc) if target <= doc => doc + 1,
                _ => target,
            };
            let expected = docs.iter().copied().find(|&d| d >= target).unwrap_or(NO_MORE_DOCS);

            prop_assert_eq!(plain.advance(target).unwrap(), expected);
            prop_assert_eq!(positional.advance(target).unwrap(), expected);
            if expected == NO_MORE_DOCS {
                break;
            }
            prop_assert_eq!(plain.freq(), positions_of(expected).len() as u32);

            let mut read = Vec::new();
            for _ in 0..positional.freq() {
                read.push(positional.next_position().unwrap());
            }
            prop_assert_eq!(read, positions_of(expected));
            let payload = positional.payload().unwrap().map(<[u8]>::to_vec);
            let single = positions_of(expected).len() == 1;
            let want = (expected % 4 == 0 && single).then(|| expected.to_be_bytes().to_vec());
            prop_assert_eq!(payload, want);
            current = Some(expected);
        }
    }
}
