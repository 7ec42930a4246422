//! Code point order over a UTF-16 sorted dictionary: iteration and seeks
//! around supplementary and U+E000..U+FFFF characters.

mod fixtures;

use fixtures::{Posting, SegmentBuilder, collect_terms, open, open_with, single_field};
use lucene3x::ErrorKind;
use lucene3x::index::{DocsEnum, IndexOptions, ReaderConfig, SeekStatus};
use lucene3x::utils::compare_str_as_utf16;
use proptest::prelude::*;
use std::collections::BTreeSet;

const SUPPLEMENTARY: &str = "\u{10000}y";
const HIGH_BMP: &str = "\u{E000}x";

fn utf16_order() -> ReaderConfig {
    ReaderConfig {
        sort_terms_by_unicode: false,
        ..ReaderConfig::default()
    }
}

#[test]
fn test_code_point_order() {
    let builder = single_field(&["a", "b", HIGH_BMP, SUPPLEMENTARY]);
    let fields = open(&builder);
    assert_eq!(collect_terms(&fields, "f"), ["a", "b", HIGH_BMP, SUPPLEMENTARY]);
}

#[test]
fn test_utf16_order() {
    let builder = single_field(&["a", "b", HIGH_BMP, SUPPLEMENTARY]);
    let fields = open_with(&builder, &utf16_order());
    assert_eq!(collect_terms(&fields, "f"), ["a", "b", SUPPLEMENTARY, HIGH_BMP]);
}

#[test]
fn test_nested_positions() {
    let terms = [
        "a\u{10000}",
        "a\u{E000}",
        "a\u{E000}\u{10000}",
        "a\u{E000}\u{E000}",
        "a\u{E000}z",
        "\u{10000}\u{E000}",
        "\u{10000}\u{10000}",
        "\u{E000}",
        "\u{FFFF}a",
        "\u{1F600}",
    ];
    let fields = open(&single_field(&terms));
    let mut expected: Vec<&str> = terms.to_vec();
    expected.sort();
    assert_eq!(collect_terms(&fields, "f"), expected);
}

#[test]
fn test_field_boundaries() {
    let builder = SegmentBuilder::new()
        .field("a", IndexOptions::DocsOnly, false)
        .field("m", IndexOptions::DocsOnly, false)
        .field("z", IndexOptions::DocsOnly, false)
        .docs_term("a", "\u{E000}", &[0])
        .docs_term("a", "\u{10000}", &[1])
        .docs_term("m", "q\u{10000}", &[2])
        .docs_term("m", "q\u{E000}", &[3])
        .docs_term("m", "\u{10400}", &[4])
        .docs_term("z", "\u{E000}", &[5])
        .docs_term("z", "a", &[6]);
    let fields = open(&builder);
    assert_eq!(fields.fields().collect::<Vec<_>>(), ["a", "m", "z"]);
    assert_eq!(collect_terms(&fields, "a"), ["\u{E000}", "\u{10000}"]);
    assert_eq!(collect_terms(&fields, "m"), ["q\u{E000}", "q\u{10000}", "\u{10400}"]);
    assert_eq!(collect_terms(&fields, "z"), ["a", "\u{E000}"]);
}

#[test]
fn test_seek_ceil() {
    let builder = single_field(&["a", "b", HIGH_BMP, SUPPLEMENTARY]);
    let fields = open(&builder);
    let mut terms = fields.terms("f").unwrap().iterator().unwrap();

    assert_eq!(terms.seek_ceil(b"b").unwrap(), SeekStatus::Found);
    assert_eq!(terms.term(), Some(&b"b"[..]));
    assert_eq!(terms.next().unwrap(), Some(HIGH_BMP.as_bytes()));
    assert_eq!(terms.next().unwrap(), Some(SUPPLEMENTARY.as_bytes()));
    assert_eq!(terms.next().unwrap(), None);

    // Between the BMP terms and the supplementary one in code point order
    assert_eq!(terms.seek_ceil("\u{E000}y".as_bytes()).unwrap(), SeekStatus::NotFound);
    assert_eq!(terms.term(), Some(SUPPLEMENTARY.as_bytes()));
    assert_eq!(terms.next().unwrap(), None);

    assert_eq!(terms.seek_ceil(b"c").unwrap(), SeekStatus::NotFound);
    assert_eq!(terms.term(), Some(HIGH_BMP.as_bytes()));

    assert_eq!(terms.seek_ceil("\u{10001}".as_bytes()).unwrap(), SeekStatus::End);
    assert_eq!(terms.term(), None);
    assert_eq!(terms.next().unwrap(), None);

    assert!(terms.seek_exact(SUPPLEMENTARY.as_bytes()).unwrap());
    assert!(!terms.seek_exact(b"ab").unwrap());
}

#[test]
fn test_postings_follow_the_dance() {
    let builder = SegmentBuilder::new()
        .field("f", IndexOptions::DocsAndFreqs, false)
        .term("f", HIGH_BMP, vec![Posting::freq(4, 2)])
        .term("f", SUPPLEMENTARY, vec![Posting::freq(9, 1), Posting::freq(11, 5)]);
    let fields = open(&builder);
    let mut terms = fields.terms("f").unwrap().iterator().unwrap();

    assert_eq!(terms.next().unwrap(), Some(HIGH_BMP.as_bytes()));
    assert_eq!(terms.doc_freq(), 1);
    assert_eq!(terms.next().unwrap(), Some(SUPPLEMENTARY.as_bytes()));
    assert_eq!(terms.doc_freq(), 2);

    let mut docs = terms.docs(None, None).unwrap();
    assert_eq!(docs.next_doc().unwrap(), 9);
    assert_eq!(docs.next_doc().unwrap(), 11);
    assert_eq!(docs.freq(), 5);
}

#[test]
fn test_unsupported_and_unpositioned() {
    let fields = open(&single_field(&["a"]));
    let terms = fields.terms("f").unwrap();
    assert_eq!(terms.size(), None);
    assert_eq!(terms.sum_doc_freq(), None);
    assert!(!terms.has_offsets());

    let mut terms_enum = terms.iterator().unwrap();
    assert!(matches!(
        terms_enum.ord().unwrap_err().kind(),
        ErrorKind::Unsupported { .. }
    ));
    assert!(matches!(
        terms_enum.seek_exact_ord(0).unwrap_err().kind(),
        ErrorKind::Unsupported { .. }
    ));
    assert_eq!(terms_enum.term(), None);
    assert!(matches!(
        terms_enum.docs(None, None).err().map(|e| e.into_kind()),
        Some(ErrorKind::IllegalState { .. })
    ));
    assert_eq!(terms_enum.total_term_freq(), None);
}

fn alphabet() -> impl Strategy<Value = char> {
    prop::sample::select(vec![
        'a', 'm', '\u{7FF}', '\u{D7FF}', '\u{E000}', '\u{E001}', '\u{FFFF}', '\u{10000}',
        '\u{10001}', '\u{1F600}',
    ])
}

fn term() -> impl Strategy<Value = String> {
    prop::collection::vec(alphabet(), 1..5).prop_map(|chars| chars.into_iter().collect())
}

fn build(terms: &BTreeSet<String>, index_interval: i32) -> SegmentBuilder {
    let mut builder = SegmentBuilder::new()
        .intervals(index_interval, 4, 10)
        .field("body", IndexOptions::DocsOnly, false)
        .field("zeta", IndexOptions::DocsOnly, false)
        .field("alpha", IndexOptions::DocsOnly, false)
        .docs_term("zeta", "\u{10000}", &[0])
        .docs_term("alpha", "\u{E000}", &[0]);
    for (doc, term) in terms.iter().enumerate() {
        builder.add_term("body", term.as_bytes(), vec![Posting::doc(doc as u32)]);
    }
    builder
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_iteration_in_code_point_order(
        terms in prop::collection::btree_set(term(), 1..40),
        index_interval in 2i32..6,
    ) {
        let fields = open(&build(&terms, index_interval));
        // BTreeSet<String> iterates in byte order, which is code point order
        let expected: Vec<String> = terms.iter().cloned().collect();
        prop_assert_eq!(collect_terms(&fields, "body"), expected);
    }

    #[test]
    fn prop_iteration_in_utf16_order(
        terms in prop::collection::btree_set(term(), 1..40),
        index_interval in 2i32..6,
    ) {
        let fields = open_with(&build(&terms, index_interval), &utf16_order());
        let mut expected: Vec<String> = terms.iter().cloned().collect();
        expected.sort_by(|a, b| compare_str_as_utf16(a, b));
        prop_assert_eq!(collect_terms(&fields, "body"), expected);
    }

    #[test]
    fn prop_seek_ceil_then_next(
        terms in prop::collection::btree_set(term(), 1..40),
        targets in prop::collection::vec(term(), 1..10),
        index_interval in 2i32..6,
    ) {
        let fields = open(&build(&terms, index_interval));
        let sorted: Vec<&String> = terms.iter().collect();
        let mut terms_enum = fields.terms("body").unwrap().iterator().unwrap();

        for target in targets.iter().chain(terms.iter().take(3)) {
            let ceil = sorted.partition_point(|t| t.as_str() < target.as_str());
            let status = terms_enum.seek_ceil(target.as_bytes()).unwrap();
            match sorted.get(ceil) {
                None => {
                    prop_assert_eq!(status, SeekStatus::End);
                    prop_assert_eq!(terms_enum.term(), None);
                    continue;
                }
                Some(found) => {
                    let want = if found.as_str() == target.as_str() {
                        SeekStatus::Found
                    } else {
                        SeekStatus::NotFound
                    };
                    prop_assert_eq!(status, want);
                    prop_assert_eq!(terms_enum.term(), Some(found.as_bytes()));
                }
            }
            // Iteration resumes right after the sought term
            for expected in sorted.iter().skip(ceil + 1).take(3) {
                prop_assert_eq!(terms_enum.next().unwrap(), Some(expected.as_bytes()));
            }
        }
    }
}
