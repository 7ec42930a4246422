//! Term lookups against a segment's dictionary.

use crate::error::{Error, Result};
use crate::index::field_infos::FieldInfos;
use crate::index::segment_term_enum::SegmentTermEnum;
use crate::index::term_cache::{CachedTermInfo, TermInfoCache};
use crate::index::term_infos_reader_index::TermInfosReaderIndex;
use crate::index::types::{ReaderConfig, Term, TermInfo, TermRef};
use crate::store::{Directory, TERMS_EXTENSION, TERMS_INDEX_EXTENSION, segment_file_name};
use ahash::RandomState;
use log::debug;
use lru::LruCache;
use std::cmp::Ordering;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Answers "what is the TermInfo for this term" for one segment.
///
/// Lookups go through a bounded cache, then try to continue scanning the
/// calling thread's own cursor when the target lies shortly ahead of it, and
/// only otherwise binary-search the in-memory terms index and scan forward
/// from the nearest sample. Safe to share between threads.
pub struct TermInfosReader {
    segment: String,
    field_infos: Arc<FieldInfos>,
    orig_enum: SegmentTermEnum,
    size: i64,
    index: Option<TermInfosReaderIndex>,
    total_index_interval: i64,
    cache: TermInfoCache,
    /// Cursors of recent calling threads, bounded so exited threads do not
    /// accumulate
    thread_enums: Mutex<LruCache<ThreadId, SegmentTermEnum, RandomState>>,
    closed: AtomicBool,
}

impl TermInfosReader {
    /// Open `<segment>.tis` and, unless `index_divisor` is `None`, load every
    /// `index_divisor`-th sample of `<segment>.tii`.
    pub fn open(
        dir: &dyn Directory,
        segment: &str,
        field_infos: Arc<FieldInfos>,
        index_divisor: Option<u32>,
        config: &ReaderConfig,
    ) -> Result<Self> {
        Self::open_files(dir, segment, field_infos, index_divisor, config)
            .inspect_err(|e| debug!("failed to open term dictionary of {segment}: {e}"))
    }

    fn open_files(
        dir: &dyn Directory,
        segment: &str,
        field_infos: Arc<FieldInfos>,
        index_divisor: Option<u32>,
        config: &ReaderConfig,
    ) -> Result<Self> {
        let tis_name = segment_file_name(segment, TERMS_EXTENSION);
        let orig_enum = SegmentTermEnum::open(dir.open_input(&tis_name)?, field_infos.clone(), false)?;
        let size = orig_enum.size();

        let (index, total_index_interval) = match index_divisor {
            Some(0) => return Err(Error::invalid_arg("index_divisor", "must be at least 1")),
            Some(divisor) => {
                let total_index_interval = orig_enum.index_interval() as i64 * divisor as i64;
                let tii_name = segment_file_name(segment, TERMS_INDEX_EXTENSION);
                let mut index_enum =
                    SegmentTermEnum::open(dir.open_input(&tii_name)?, field_infos.clone(), true)?;
                let index = TermInfosReaderIndex::build(
                    &mut index_enum,
                    divisor,
                    dir.file_length(&tii_name)?,
                    total_index_interval,
                )?;
                (Some(index), total_index_interval)
            }
            None => (None, -1),
        };

        debug!(
            "opened term dictionary {}: {} terms, index interval {}, skip interval {}, {} samples",
            tis_name,
            size,
            orig_enum.index_interval(),
            orig_enum.skip_interval(),
            index.as_ref().map_or(0, |i| i.len())
        );

        Ok(Self {
            segment: segment.to_string(),
            field_infos,
            orig_enum,
            size,
            index,
            total_index_interval,
            cache: TermInfoCache::new(config.term_cache_size, config.term_cache_shards),
            thread_enums: Mutex::new(LruCache::with_hasher(
                NonZeroUsize::new(config.max_thread_enums).unwrap_or(NonZeroUsize::MIN),
                RandomState::new(),
            )),
            closed: AtomicBool::new(false),
        })
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn field_infos(&self) -> &Arc<FieldInfos> {
        &self.field_infos
    }

    /// Number of terms in the dictionary.
    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn index_interval(&self) -> u32 {
        self.orig_enum.index_interval()
    }

    pub fn skip_interval(&self) -> u32 {
        self.orig_enum.skip_interval()
    }

    pub fn max_skip_levels(&self) -> u32 {
        self.orig_enum.max_skip_levels()
    }

    /// Samples held in memory.
    pub fn index_len(&self) -> usize {
        self.index.as_ref().map_or(0, |i| i.len())
    }

    /// Threads currently holding a lookup cursor.
    pub fn thread_enum_count(&self) -> usize {
        self.thread_enums().len()
    }

    /// Terms currently held by the lookup cache.
    pub fn cached_terms(&self) -> usize {
        self.cache.len()
    }

    pub fn ram_bytes_used(&self) -> usize {
        self.index.as_ref().map_or(0, |i| i.ram_bytes_used())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(AtomicOrdering::Acquire) {
            return Err(Error::already_closed(format!("term dictionary of {}", self.segment)));
        }
        Ok(())
    }

    fn ensure_index(&self) -> Result<&TermInfosReaderIndex> {
        self.index.as_ref().ok_or_else(|| {
            Error::illegal_state("terms index was not loaded when this reader was created")
        })
    }

    fn thread_enums(&self) -> MutexGuard<'_, LruCache<ThreadId, SegmentTermEnum, RandomState>> {
        self.thread_enums.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` on the calling thread's private cursor. The cursor is taken
    /// out of the map for the duration so no lock is held while scanning.
    fn with_thread_enum<R>(&self, f: impl FnOnce(&mut SegmentTermEnum) -> Result<R>) -> Result<R> {
        let id = thread::current().id();
        let taken = self.thread_enums().pop(&id);
        let mut enumerator = taken.unwrap_or_else(|| self.orig_enum.clone());
        let result = f(&mut enumerator);
        self.thread_enums().put(id, enumerator);
        result
    }

    /// TermInfo of `term`, `None` if it is not in the dictionary.
    pub fn get(&self, term: &Term) -> Result<Option<TermInfo>> {
        let key = self.field_infos.term_key(term);
        self.get_key(key.as_ref(), false)
    }

    /// Lookup by resolved term. With `must_seek_enum` the thread's cursor is
    /// left on the term (or its successor) even on a cache hit.
    pub fn get_key(&self, term: TermRef<'_>, must_seek_enum: bool) -> Result<Option<TermInfo>> {
        self.ensure_open()?;
        if self.size == 0 {
            return Ok(None);
        }
        let index = self.ensure_index()?;

        let cached = self.cache.get(term);
        if let Some(cached) = cached {
            if !must_seek_enum {
                return Ok(Some(cached.info));
            }
        }
        self.with_thread_enum(|enumerator| self.seek_with(index, enumerator, term, cached, true))
    }

    /// Move `enumerator` to `term` or its successor, returning the term's
    /// info when present.
    pub fn seek_enum(
        &self,
        enumerator: &mut SegmentTermEnum,
        term: TermRef<'_>,
        use_cache: bool,
    ) -> Result<Option<TermInfo>> {
        self.ensure_open()?;
        if self.size == 0 {
            return Ok(None);
        }
        let index = self.ensure_index()?;
        let cached = if use_cache { self.cache.get(term) } else { None };
        self.seek_with(index, enumerator, term, cached, use_cache)
    }

    fn seek_with(
        &self,
        index: &TermInfosReaderIndex,
        enumerator: &mut SegmentTermEnum,
        term: TermRef<'_>,
        cached: Option<CachedTermInfo>,
        use_cache: bool,
    ) -> Result<Option<TermInfo>> {
        // Sequential access: the target is at or past the cursor and before
        // the next sample, so keep scanning without a seek
        let at_or_ahead = match enumerator.term() {
            Some(current) => {
                enumerator
                    .prev()
                    .is_some_and(|prev| term.compare(prev) == Ordering::Greater)
                    || term.compare(current) != Ordering::Less
            }
            None => false,
        };
        if at_or_ahead {
            let enum_offset = (enumerator.position() / self.total_index_interval + 1) as usize;
            if enum_offset >= index.len() || index.compare_to(term, enum_offset)? == Ordering::Less {
                let scans = enumerator.scan_to(term)?;
                if !Self::positioned_on(enumerator, term) {
                    return Ok(None);
                }
                let info = enumerator.term_info();
                // A single step is sequential iteration; caching it would
                // flush the cache during range scans
                if scans > 1 && cached.is_none() && use_cache {
                    self.cache.put(
                        term,
                        CachedTermInfo {
                            info,
                            ord: enumerator.position(),
                        },
                    );
                }
                return Ok(Some(info));
            }
        }

        let index_pos = match cached {
            Some(cached) => (cached.ord / self.total_index_interval) as usize,
            None => index.index_offset(term)?,
        };
        index.seek_enum(enumerator, index_pos)?;
        enumerator.scan_to(term)?;

        if !Self::positioned_on(enumerator, term) {
            return Ok(None);
        }
        let info = enumerator.term_info();
        if cached.is_none() && use_cache {
            self.cache.put(
                term,
                CachedTermInfo {
                    info,
                    ord: enumerator.position(),
                },
            );
        }
        Ok(Some(info))
    }

    fn positioned_on(enumerator: &SegmentTermEnum, term: TermRef<'_>) -> bool {
        enumerator
            .term()
            .is_some_and(|current| term.compare(current) == Ordering::Equal)
    }

    /// Ordinal of `term` in the dictionary.
    pub fn position(&self, term: &Term) -> Result<Option<u64>> {
        self.ensure_open()?;
        if self.size == 0 {
            return Ok(None);
        }
        let index = self.ensure_index()?;
        let key = self.field_infos.term_key(term);
        let term = key.as_ref();
        self.with_thread_enum(|enumerator| {
            index.seek_enum(enumerator, index.index_offset(term)?)?;
            while enumerator
                .term()
                .is_some_and(|current| term.compare(current) == Ordering::Greater)
                && enumerator.next()?
            {}
            Ok(Self::positioned_on(enumerator, term).then(|| enumerator.position() as u64))
        })
    }

    /// Position `enumerator` on the closest sample at or before `term`,
    /// returning the sample ordinal.
    pub fn seek_to_sample(&self, enumerator: &mut SegmentTermEnum, term: &Term) -> Result<usize> {
        self.ensure_open()?;
        let index = self.ensure_index()?;
        let key = self.field_infos.term_key(term);
        let sample = index.index_offset(key.as_ref())?;
        index.seek_enum(enumerator, sample)?;
        Ok(sample)
    }

    /// Remember the cursor's current term.
    pub fn cache_current_term(&self, enumerator: &SegmentTermEnum) {
        if let Some(term) = enumerator.term() {
            self.cache.put(
                term,
                CachedTermInfo {
                    info: enumerator.term_info(),
                    ord: enumerator.position(),
                },
            );
        }
    }

    /// A fresh cursor before the first term.
    pub fn terms(&self) -> Result<SegmentTermEnum> {
        self.ensure_open()?;
        Ok(self.orig_enum.clone())
    }

    /// A cursor positioned on `term` or, if absent, its successor.
    pub fn terms_from(&self, term: &Term) -> Result<SegmentTermEnum> {
        let key = self.field_infos.term_key(term);
        self.terms_from_key(key.as_ref())
    }

    pub fn terms_from_key(&self, term: TermRef<'_>) -> Result<SegmentTermEnum> {
        self.ensure_open()?;
        if self.size == 0 {
            return Ok(self.orig_enum.clone());
        }
        let index = self.ensure_index()?;
        let cached = self.cache.get(term);
        self.with_thread_enum(|enumerator| {
            self.seek_with(index, enumerator, term, cached, true)?;
            Ok(enumerator.clone())
        })
    }

    /// Release per-thread cursors and cached entries. Further calls fail.
    pub fn close(&self) {
        if !self.closed.swap(true, AtomicOrdering::AcqRel) {
            self.cache.clear();
            self.thread_enums().clear();
            debug!("closed term dictionary of {}", self.segment);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(AtomicOrdering::Acquire)
    }
}
