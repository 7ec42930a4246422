//! # lucene3x - Legacy Lucene 3.x postings reader
//!
//! Read-only access to the term dictionary (`.tis`/`.tii`), frequency
//! postings (`.frq`) and positions (`.prx`) of segments written by Lucene
//! 3.x, presented through a per-field terms / postings API.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`store`] - Random-access inputs over memory-mapped or in-memory files
//! - [`index`] - Format readers: dictionary, sampled index, skip lists, postings
//! - [`output`] - Coloured terminal rendering of terms and postings
//! - [`utils`] - Varint codecs, paged byte arena, UTF-16 ordering, bitsets
//!
//! ## Quick Start
//!
//! ```ignore
//! use lucene3x::index::{DocsEnum, FieldInfos, Lucene3xFields, ReaderConfig, NO_MORE_DOCS};
//! use lucene3x::store::MmapDirectory;
//! use std::sync::Arc;
//!
//! let dir = MmapDirectory::open("/path/to/index")?;
//! let field_infos = Arc::new(FieldInfos::read(&dir, "_0")?);
//! let fields = Lucene3xFields::open(&dir, "_0", field_infos, &ReaderConfig::default())?;
//!
//! let mut terms = fields.terms("body").unwrap().iterator()?;
//! while let Some(term) = terms.next()? {
//!     println!("{} df={}", String::from_utf8_lossy(term), terms.doc_freq());
//!     let mut docs = terms.docs(None, None)?;
//!     while docs.next_doc()? != NO_MORE_DOCS {
//!         println!("  doc {} freq {}", docs.doc_id().unwrap(), docs.freq());
//!     }
//! }
//! ```
//!
//! ## Ordering
//!
//! The dictionary is sorted by UTF-16 code unit. Unless disabled in
//! [`index::ReaderConfig`], terms enums reorder supplementary characters on
//! the fly so terms come back in Unicode code point order.

pub mod error;
pub mod index;
pub mod output;
pub mod store;
pub mod utils;

pub use error::{Error, ErrorKind, Result};
