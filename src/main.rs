use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use log::{Level, LevelFilter, Log, Metadata, Record};
use lucene3x::index::stats::{self, FieldReport};
use lucene3x::index::{
    DocsEnum, FieldInfos, Lucene3xFields, NO_MORE_DOCS, PositionsEnum, ReaderConfig, SeekStatus,
};
use lucene3x::output::{self, PositionEntry};
use lucene3x::store::MmapDirectory;
use lucene3x::utils::progress::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(Parser)]
#[command(name = "lucene3x")]
#[command(about = "Inspect the terms and postings of a Lucene 3.x segment")]
struct Cli {
    /// Index directory
    dir: PathBuf,

    /// Segment name, e.g. _0
    segment: String,

    #[command(subcommand)]
    command: Commands,

    /// Reader settings as JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the indexed fields
    Fields,
    /// List the terms of a field
    Terms {
        field: String,

        /// Start at the first term at or after this one
        #[arg(long)]
        from: Option<String>,

        /// Stop after this many terms
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show the postings of a term
    Postings {
        field: String,
        term: String,

        /// Include positions and payloads
        #[arg(short, long)]
        positions: bool,
    },
    /// Show per-field term statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Verify term order, seeks and postings
    Check {
        /// Only this field
        #[arg(long)]
        field: Option<String>,
    },
}

/// Log records to stderr with a coloured level tag
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => Color::Red,
            Level::Warn => Color::Yellow,
            Level::Info => Color::Green,
            Level::Debug => Color::Cyan,
            Level::Trace => Color::Magenta,
        };
        let mut stderr = StandardStream::stderr(ColorChoice::Auto);
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(stderr, "{:>5}", record.level());
        let _ = stderr.reset();
        let _ = writeln!(stderr, " {}: {}", record.target(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn progress_bar(len: usize, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓▒░  "));
    }
    pb.set_message(message);
    pb
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => ReaderConfig::load(path)
            .with_context(|| format!("loading reader config {}", path.display()))?,
        None => ReaderConfig::default(),
    };

    let dir = MmapDirectory::open(&cli.dir)
        .with_context(|| format!("opening index directory {}", cli.dir.display()))?;
    let field_infos = Arc::new(
        FieldInfos::read(&dir, &cli.segment)
            .with_context(|| format!("reading field infos of {}", cli.segment))?,
    );
    let fields = Lucene3xFields::open(&dir, &cli.segment, field_infos.clone(), &config)
        .with_context(|| format!("opening segment {}", cli.segment))?;

    let mut out = output::stdout(!cli.no_color);

    match cli.command {
        Commands::Fields => {
            let infos = fields.fields().filter_map(|name| field_infos.by_name(name));
            output::print_fields(&mut out, infos)?;
        }
        Commands::Terms { field, from, limit } => {
            let terms = fields
                .terms(&field)
                .with_context(|| format!("field {field:?} is not indexed"))?;
            let mut terms_enum = terms.iterator()?;
            let limit = limit.unwrap_or(usize::MAX);
            let mut printed = 0;

            if let Some(from) = from {
                if terms_enum.seek_ceil(from.as_bytes())? == SeekStatus::End {
                    return Ok(());
                }
                if let Some(term) = terms_enum.term().filter(|_| limit > 0) {
                    output::print_term(&mut out, term, terms_enum.doc_freq())?;
                    printed += 1;
                }
            }
            while printed < limit && terms_enum.advance()? {
                let Some(term) = terms_enum.term() else {
                    break;
                };
                output::print_term(&mut out, term, terms_enum.doc_freq())?;
                printed += 1;
            }
        }
        Commands::Postings {
            field,
            term,
            positions,
        } => {
            let terms = fields
                .terms(&field)
                .with_context(|| format!("field {field:?} is not indexed"))?;
            let mut terms_enum = terms.iterator()?;
            if !terms_enum.seek_exact(term.as_bytes())? {
                bail!("term {field}:{term} not found");
            }
            output::print_term(&mut out, term.as_bytes(), terms_enum.doc_freq())?;

            if positions {
                let Some(mut postings) = terms_enum.docs_and_positions(None, None)? else {
                    bail!("field {field:?} does not index positions");
                };
                let mut entries = Vec::new();
                while postings.next_doc()? != NO_MORE_DOCS {
                    entries.clear();
                    for _ in 0..postings.freq() {
                        let position = postings.next_position()?;
                        let payload = postings.payload()?.map(<[u8]>::to_vec);
                        entries.push(PositionEntry { position, payload });
                    }
                    let doc = postings.doc_id().unwrap_or(NO_MORE_DOCS);
                    output::print_posting(&mut out, doc, postings.freq(), Some(&entries))?;
                }
            } else {
                let mut postings = terms_enum.docs(None, None)?;
                while postings.next_doc()? != NO_MORE_DOCS {
                    let doc = postings.doc_id().unwrap_or(NO_MORE_DOCS);
                    output::print_posting(&mut out, doc, postings.freq(), None)?;
                }
            }
        }
        Commands::Stats { json } => {
            let pb = (!json).then(|| progress_bar(fields.len(), "Collecting statistics..."));
            let segment_stats = stats::collect_stats(&fields, pb.as_ref())?;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            if json {
                serde_json::to_writer_pretty(&mut out, &segment_stats)?;
                writeln!(out)?;
            } else {
                write!(out, "{segment_stats}")?;
            }
        }
        Commands::Check { field } => {
            let reports: Vec<FieldReport> = match field {
                Some(field) => vec![stats::verify_field(&fields, &field)?],
                None => {
                    let pb = progress_bar(fields.len(), "Checking fields...");
                    let reports = stats::verify_all(&fields, Some(&pb))?;
                    pb.finish_and_clear();
                    reports
                }
            };
            if !output::print_reports(&mut out, &reports)? {
                bail!("segment {} failed the check", cli.segment);
            }
        }
    }

    fields.close();
    Ok(())
}
