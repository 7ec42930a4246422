#![no_main]

use libfuzzer_sys::fuzz_target;
use lucene3x::index::{FieldInfo, FieldInfos, IndexOptions, ReaderConfig, TermInfosReader};
use lucene3x::store::RamDirectory;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as both dictionary files: errors are fine, panics are not
    let dir = RamDirectory::new();
    dir.write_file("_0.tis", data.to_vec());
    dir.write_file("_0.tii", data.to_vec());
    let Ok(field_infos) = FieldInfos::new([
        FieldInfo::new("a", 0, IndexOptions::DocsOnly),
        FieldInfo::new("b", 1, IndexOptions::DocsAndFreqsAndPositions),
    ]) else {
        return;
    };
    let config = ReaderConfig::default();
    let Ok(tis) = TermInfosReader::open(&dir, "_0", Arc::new(field_infos), Some(1), &config) else {
        return;
    };
    let Ok(mut terms) = tis.terms() else {
        return;
    };
    for _ in 0..1024 {
        match terms.next() {
            Ok(true) => {
                if let Some(term) = terms.to_term() {
                    let _ = tis.get(&term);
                }
            }
            _ => break,
        }
    }
});
