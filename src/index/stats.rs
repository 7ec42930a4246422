use crate::error::Result;
use crate::index::postings::DocsEnum;
use crate::index::reader::Lucene3xFields;
use crate::index::types::{NO_MORE_DOCS, SeekStatus};
use crate::utils::progress::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Term statistics of one field
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldStats {
    pub field: String,
    pub terms: u64,
    pub sum_doc_freq: u64,
    pub max_doc_freq: u32,
    /// Term with the highest doc freq
    pub max_doc_freq_term: Option<String>,
    pub first_term: Option<String>,
    pub last_term: Option<String>,
    pub has_positions: bool,
    pub has_payloads: bool,
}

/// Statistics of a whole segment
#[derive(Debug, Clone, Serialize)]
pub struct SegmentStats {
    pub segment: String,
    pub unique_terms: i64,
    pub index_interval: u32,
    pub skip_interval: u32,
    pub max_skip_levels: u32,
    pub index_samples: usize,
    pub ram_bytes_used: usize,
    pub fields: Vec<FieldStats>,
}

/// Walk every field's terms, one field per task.
pub fn collect_stats(fields: &Lucene3xFields, progress: Option<&ProgressBar>) -> Result<SegmentStats> {
    let names: Vec<&str> = fields.fields().collect();
    let per_field = names
        .par_iter()
        .map(|name| {
            let stats = field_stats(fields, name);
            if let Some(pb) = progress {
                pb.inc(1);
            }
            stats
        })
        .collect::<Result<Vec<_>>>()?;

    let tis = fields.term_infos();
    Ok(SegmentStats {
        segment: fields.segment().to_string(),
        unique_terms: fields.unique_term_count(),
        index_interval: tis.index_interval(),
        skip_interval: tis.skip_interval(),
        max_skip_levels: tis.max_skip_levels(),
        index_samples: tis.index_len(),
        ram_bytes_used: fields.ram_bytes_used(),
        fields: per_field,
    })
}

fn field_stats(fields: &Lucene3xFields, name: &str) -> Result<FieldStats> {
    let mut stats = FieldStats {
        field: name.to_string(),
        ..Default::default()
    };
    let Some(terms) = fields.terms(name) else {
        return Ok(stats);
    };
    stats.has_positions = terms.has_positions();
    stats.has_payloads = terms.has_payloads();

    let mut terms_enum = terms.iterator()?;
    let mut last = Vec::new();
    while let Some(term) = terms_enum.next()? {
        let text = String::from_utf8_lossy(term).into_owned();
        if stats.first_term.is_none() {
            stats.first_term = Some(text.clone());
        }
        last.clear();
        last.extend_from_slice(term);

        let doc_freq = terms_enum.doc_freq();
        stats.terms += 1;
        stats.sum_doc_freq += doc_freq as u64;
        if doc_freq > stats.max_doc_freq {
            stats.max_doc_freq = doc_freq;
            stats.max_doc_freq_term = Some(text);
        }
    }
    if stats.terms > 0 {
        stats.last_term = Some(String::from_utf8_lossy(&last).into_owned());
    }
    Ok(stats)
}

/// Outcome of checking one field
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldReport {
    pub field: String,
    pub terms_checked: u64,
    pub postings_checked: u64,
    pub problems: Vec<String>,
}

impl FieldReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check that terms come back strictly ordered, that every term can be
/// sought back, and that its postings are ascending and match its doc freq.
pub fn verify_field(fields: &Lucene3xFields, name: &str) -> Result<FieldReport> {
    let mut report = FieldReport {
        field: name.to_string(),
        ..Default::default()
    };
    let Some(terms) = fields.terms(name) else {
        report.problems.push(format!("field {name:?} is not indexed"));
        return Ok(report);
    };
    let order = terms.order();

    let mut walker = terms.iterator()?;
    let mut seeker = terms.iterator()?;
    let mut docs = None;
    let mut prev: Option<Vec<u8>> = None;

    while let Some(term) = walker.next()? {
        let term = term.to_vec();
        report.terms_checked += 1;

        if let Some(prev) = prev.as_deref().filter(|p| order.compare(p, &term) != Ordering::Less) {
            report.problems.push(format!(
                "term {} does not sort after {}",
                String::from_utf8_lossy(&term),
                String::from_utf8_lossy(prev)
            ));
        }

        match seeker.seek_ceil(&term)? {
            SeekStatus::Found if seeker.term() == Some(term.as_slice()) => {}
            status => report.problems.push(format!(
                "seeking {} gave {status:?} at {:?}",
                String::from_utf8_lossy(&term),
                seeker.term().map(String::from_utf8_lossy)
            )),
        }

        let mut postings = walker.docs(None, docs.take())?;
        let mut count = 0u32;
        let mut last_doc = None;
        loop {
            let doc = postings.next_doc()?;
            if doc == NO_MORE_DOCS {
                break;
            }
            if last_doc.is_some_and(|last| last >= doc) {
                report.problems.push(format!(
                    "postings of {} not ascending at doc {doc}",
                    String::from_utf8_lossy(&term)
                ));
            }
            last_doc = Some(doc);
            count += 1;
        }
        if count != walker.doc_freq() {
            report.problems.push(format!(
                "{} has doc freq {} but {count} postings",
                String::from_utf8_lossy(&term),
                walker.doc_freq()
            ));
        }
        report.postings_checked += count as u64;
        docs = Some(postings);
        prev = Some(term);
    }
    Ok(report)
}

/// [`verify_field`] over every field in parallel.
pub fn verify_all(fields: &Lucene3xFields, progress: Option<&ProgressBar>) -> Result<Vec<FieldReport>> {
    let names: Vec<&str> = fields.fields().collect();
    names
        .par_iter()
        .map(|name| {
            let report = verify_field(fields, name);
            if let Some(pb) = progress {
                pb.inc(1);
            }
            report
        })
        .collect()
}

impl fmt::Display for SegmentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Segment Statistics")?;
        writeln!(f, "==================")?;
        writeln!(f)?;
        writeln!(f, "Segment:          {}", self.segment)?;
        writeln!(f, "Unique terms:     {}", self.unique_terms)?;
        writeln!(f, "Index interval:   {}", self.index_interval)?;
        writeln!(f, "Skip interval:    {}", self.skip_interval)?;
        writeln!(f, "Max skip levels:  {}", self.max_skip_levels)?;
        writeln!(f, "Index samples:    {}", self.index_samples)?;
        writeln!(f, "Terms index RAM:  {}", format_size(self.ram_bytes_used as u64))?;
        writeln!(f)?;
        writeln!(f, "Fields:")?;
        for field in &self.fields {
            let flags = match (field.has_positions, field.has_payloads) {
                (true, true) => " [positions, payloads]",
                (true, false) => " [positions]",
                _ => "",
            };
            writeln!(f, "  {}{}", field.field, flags)?;
            writeln!(
                f,
                "    terms {}  sum docFreq {}  max docFreq {}{}",
                field.terms,
                field.sum_doc_freq,
                field.max_doc_freq,
                field
                    .max_doc_freq_term
                    .as_ref()
                    .map(|t| format!(" ({t})"))
                    .unwrap_or_default()
            )?;
            if let (Some(first), Some(last)) = (&field.first_term, &field.last_term) {
                writeln!(f, "    range {first} .. {last}")?;
            }
        }
        Ok(())
    }
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
