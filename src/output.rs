//! Output formatting for terms, postings and check reports

use crate::index::stats::FieldReport;
use crate::index::{DocId, FieldInfo};
use std::io;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Stdout with colours when requested and supported
pub fn stdout(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Term bytes as text, or as hex when they are not valid UTF-8
pub fn term_display(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
            format!("[{}]", hex.join(" "))
        }
    }
}

/// One line per indexed field with its options
pub fn print_fields<'a>(
    out: &mut impl WriteColor,
    fields: impl IntoIterator<Item = &'a FieldInfo>,
) -> io::Result<()> {
    for info in fields {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        write!(out, "{}", info.name)?;
        out.reset()?;

        let options = match info.index_options {
            Some(options) => format!("{options:?}"),
            None => "not indexed".to_string(),
        };
        write!(out, "  #{} {}", info.number, options)?;
        if info.store_payloads {
            write!(out, " +payloads")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// A term and its doc freq
pub fn print_term(out: &mut impl WriteColor, term: &[u8], doc_freq: u32) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "{}", term_display(term))?;
    out.reset()?;
    writeln!(out, "  df={doc_freq}")
}

/// A position with the payload recorded there, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionEntry {
    pub position: u32,
    pub payload: Option<Vec<u8>>,
}

/// A document, its freq and optionally its positions
pub fn print_posting(
    out: &mut impl WriteColor,
    doc: DocId,
    freq: u32,
    positions: Option<&[PositionEntry]>,
) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    write!(out, "{doc}")?;
    out.reset()?;
    write!(out, ":")?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    write!(out, "{freq}")?;
    out.reset()?;

    if let Some(positions) = positions {
        write!(out, " ")?;
        for (i, entry) in positions.iter().enumerate() {
            if i > 0 {
                write!(out, ",")?;
            }
            write!(out, "{}", entry.position)?;
            if let Some(payload) = &entry.payload {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                write!(out, "{}", term_display(payload))?;
                out.reset()?;
            }
        }
    }
    writeln!(out)
}

/// Per-field check outcome; returns true if every field passed
pub fn print_reports(out: &mut impl WriteColor, reports: &[FieldReport]) -> io::Result<bool> {
    let mut all_ok = true;
    for report in reports {
        let (color, label) = if report.is_ok() {
            (Color::Green, "OK")
        } else {
            all_ok = false;
            (Color::Red, "FAILED")
        };
        out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(out, "{label:>6}")?;
        out.reset()?;
        writeln!(
            out,
            "  {}  ({} terms, {} postings)",
            report.field, report.terms_checked, report.postings_checked
        )?;
        for problem in &report.problems {
            writeln!(out, "        {problem}")?;
        }
    }
    Ok(all_ok)
}
