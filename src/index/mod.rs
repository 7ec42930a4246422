//! Readers for the legacy term dictionary and postings formats.
//!
//! ## Modules
//!
//! - [`field_infos`] - Field schema (`.fnm`)
//! - [`segment_term_enum`] - Sequential cursor over `.tis`/`.tii`
//! - [`term_infos_reader`] - Term lookups with cache and sampled index
//! - [`term_docs`] / [`term_positions`] - Postings iteration over `.frq`/`.prx`
//! - [`reader`] - Per-segment entry point, [`Lucene3xFields`]
//! - [`terms_enum`] - Unicode-ordered term iteration
//! - [`stats`] - Per-field statistics and consistency checks

pub mod field_infos;
pub mod postings;
pub mod reader;
pub mod segment_term_enum;
pub mod skip_list;
pub mod stats;
pub mod term_buffer;
pub mod term_cache;
pub mod term_docs;
pub mod term_infos_reader;
pub mod term_infos_reader_index;
pub mod term_positions;
pub mod terms_enum;
pub mod types;

pub use field_infos::{FieldInfo, FieldInfos};
pub use postings::{DocsEnum, PositionsEnum, PreDocsAndPositionsEnum, PreDocsEnum};
pub use reader::Lucene3xFields;
pub use segment_term_enum::SegmentTermEnum;
pub use skip_list::{Lucene3xSkipListReader, MultiLevelSkipListReader};
pub use term_docs::SegmentTermDocs;
pub use term_infos_reader::TermInfosReader;
pub use term_positions::SegmentTermPositions;
pub use terms_enum::{PreTerms, PreTermsEnum};
pub use types::*;
