use crate::error::{Error, Result};
use crate::index::field_infos::FieldInfos;
use crate::index::term_infos_reader::TermInfosReader;
use crate::index::terms_enum::PreTerms;
use crate::index::types::ReaderConfig;
use crate::store::{Directory, FREQ_EXTENSION, IndexInput, PROX_EXTENSION, segment_file_name};
use log::debug;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Files and settings shared by every terms enum and postings iterator of
/// one segment. Iterators clone the streams before reading.
pub(crate) struct FieldsShared {
    pub(crate) segment: String,
    pub(crate) tis: Arc<TermInfosReader>,
    pub(crate) freq_stream: IndexInput,
    /// Only opened when some indexed field records positions
    pub(crate) prox_stream: Option<IndexInput>,
    pub(crate) field_infos: Arc<FieldInfos>,
    pub(crate) sort_terms_by_unicode: bool,
    closed: AtomicBool,
}

impl FieldsShared {
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::already_closed(format!("postings of {}", self.segment)));
        }
        Ok(())
    }
}

/// Read access to the postings of one legacy segment, field by field.
///
/// Terms are returned in Unicode code point order unless
/// [`ReaderConfig::sort_terms_by_unicode`] is off.
pub struct Lucene3xFields {
    shared: Arc<FieldsShared>,
    /// Indexed field names in UTF-16 order
    fields: Vec<String>,
    terms: FxHashMap<String, PreTerms>,
}

impl Lucene3xFields {
    /// Open the dictionary, terms index and postings files of `segment`.
    /// Nothing stays open if any of them fails.
    pub fn open(
        dir: &dyn Directory,
        segment: &str,
        field_infos: Arc<FieldInfos>,
        config: &ReaderConfig,
    ) -> Result<Self> {
        Self::open_files(dir, segment, field_infos, config)
            .inspect_err(|e| debug!("failed to open postings of {segment}: {e}"))
    }

    fn open_files(
        dir: &dyn Directory,
        segment: &str,
        field_infos: Arc<FieldInfos>,
        config: &ReaderConfig,
    ) -> Result<Self> {
        config.validate()?;

        // The terms index is always loaded: the surrogate dance seeks even
        // during sequential scans
        let tis = Arc::new(TermInfosReader::open(
            dir,
            segment,
            field_infos.clone(),
            Some(config.index_divisor),
            config,
        )?);

        let freq_stream = dir.open_input(&segment_file_name(segment, FREQ_EXTENSION))?;
        let prox_stream = if field_infos.has_prox() {
            Some(dir.open_input(&segment_file_name(segment, PROX_EXTENSION))?)
        } else {
            None
        };

        let shared = Arc::new(FieldsShared {
            segment: segment.to_string(),
            tis,
            freq_stream,
            prox_stream,
            field_infos: field_infos.clone(),
            sort_terms_by_unicode: config.sort_terms_by_unicode,
            closed: AtomicBool::new(false),
        });

        let mut fields = Vec::new();
        let mut terms = FxHashMap::default();
        for name in field_infos.sorted_names() {
            let Some(info) = field_infos.by_name(name).filter(|i| i.indexed) else {
                continue;
            };
            let key = field_infos.key(name);
            fields.push(name.clone());
            terms.insert(name.clone(), PreTerms::new(shared.clone(), info.clone(), key));
        }

        debug!(
            "opened postings of {}: {} indexed fields, prox file {}",
            segment,
            fields.len(),
            if shared.prox_stream.is_some() { "open" } else { "absent" }
        );

        Ok(Self {
            shared,
            fields,
            terms,
        })
    }

    pub fn segment(&self) -> &str {
        &self.shared.segment
    }

    pub fn field_infos(&self) -> &Arc<FieldInfos> {
        &self.shared.field_infos
    }

    pub fn term_infos(&self) -> &Arc<TermInfosReader> {
        &self.shared.tis
    }

    /// Indexed field names in UTF-16 order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Terms of `field`, `None` if it is not indexed in this segment.
    pub fn terms(&self, field: &str) -> Option<&PreTerms> {
        self.terms.get(field)
    }

    /// Number of indexed fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Terms across all fields, as recorded in the dictionary header.
    pub fn unique_term_count(&self) -> i64 {
        self.shared.tis.size()
    }

    pub fn ram_bytes_used(&self) -> usize {
        self.shared.tis.ram_bytes_used()
    }

    /// The format carries no checksums.
    pub fn check_integrity(&self) -> Result<()> {
        Ok(())
    }

    /// Release cached state. Enums and iterators created earlier fail on
    /// their next read.
    pub fn close(&self) {
        if !self.shared.closed.swap(true, Ordering::AcqRel) {
            self.shared.tis.close();
            debug!("closed postings of {}", self.shared.segment);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}
