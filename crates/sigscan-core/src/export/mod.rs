//! Rendering a snapshot's signatures to text, JSON, CSV, and Markdown files.
//!
//! Every export overwrites files of the same name; nothing is merged with
//! previous output.

pub mod csv;
pub mod json;
pub mod markdown;
pub mod text;

use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::errors::{SigscanError, SigscanResult};
use crate::models::{
    Category, ContractRecord, ProjectLayout, ProjectSnapshot, ScanStats, SignatureEntry,
    SignatureKind, Visibility,
};

pub use self::csv::CsvWriter;
pub use self::json::JsonWriter;
pub use self::markdown::MarkdownWriter;
pub use self::text::TextWriter;

pub const UPDATE_NOTE: &str = "This file is automatically updated. Previous content has been replaced.";

// ---------------------------------------------------------------------------
// Formats and options
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = SigscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(SigscanError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Whether a function of visibility `v` is listed. Public and external are
/// always listed.
pub fn include_visibility(v: Visibility, include_internal: bool, include_private: bool) -> bool {
    match v {
        Visibility::Public | Visibility::External => true,
        Visibility::Internal => include_internal,
        Visibility::Private => include_private,
    }
}

/// `2023-01-01T12:00:00Z` -> `2023-01-01T12-00-00`, safe for file names.
pub fn format_file_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S").to_string()
}

#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Requested format names; each is parsed and written independently.
    pub formats: Vec<String>,
    pub output_dir: PathBuf,
    pub include_internal: bool,
    pub include_private: bool,
    pub include_events: bool,
    pub include_errors: bool,
    pub separate_by_category: bool,
    pub deduplicate: bool,
    pub update_existing: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            formats: vec!["txt".to_string(), "json".to_string()],
            output_dir: PathBuf::from("signatures"),
            include_internal: false,
            include_private: false,
            include_events: true,
            include_errors: true,
            separate_by_category: true,
            deduplicate: true,
            update_existing: true,
        }
    }
}

impl ExportOptions {
    pub fn include_function(&self, entry: &SignatureEntry) -> bool {
        entry.visibility.map_or(true, |v| {
            include_visibility(v, self.include_internal, self.include_private)
        })
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// One contract's entries after visibility filtering and deduplication.
#[derive(Debug)]
pub struct ContractView<'a> {
    pub contract: &'a ContractRecord,
    pub functions: Vec<&'a SignatureEntry>,
    pub events: Vec<&'a SignatureEntry>,
    pub errors: Vec<&'a SignatureEntry>,
}

impl ContractView<'_> {
    fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.events.is_empty() && self.errors.is_empty()
    }
}

/// Everything a writer needs to render one output file.
#[derive(Debug)]
pub struct ExportView<'a> {
    pub category: Category,
    pub layout: &'a ProjectLayout,
    pub generated_at: DateTime<Utc>,
    /// Set when the file carries an "updated, previous content replaced"
    /// marker.
    pub updated_at: Option<DateTime<Utc>>,
    pub deduplicated: bool,
    pub contracts: Vec<ContractView<'a>>,
}

#[derive(Default)]
struct SeenSignatures<'a> {
    functions: HashSet<&'a str>,
    events: HashSet<&'a str>,
    errors: HashSet<&'a str>,
}

impl<'a> SeenSignatures<'a> {
    fn first_sighting(&mut self, entry: &'a SignatureEntry) -> bool {
        let set = match entry.kind {
            SignatureKind::Function => &mut self.functions,
            SignatureKind::Event => &mut self.events,
            SignatureKind::Error => &mut self.errors,
        };
        set.insert(entry.signature.as_str())
    }
}

impl<'a> ExportView<'a> {
    /// Filter `contracts` per `options`. With deduplication, only the first
    /// occurrence of each canonical signature in iteration order survives and
    /// contracts left empty are dropped.
    pub fn build(
        snapshot: &'a ProjectSnapshot,
        category: Category,
        contracts: impl IntoIterator<Item = &'a ContractRecord>,
        options: &ExportOptions,
        now: DateTime<Utc>,
    ) -> Self {
        let mut seen = SeenSignatures::default();
        let mut views = Vec::new();

        for contract in contracts {
            let mut view = ContractView {
                contract,
                functions: contract
                    .functions
                    .iter()
                    .filter(|f| options.include_function(f))
                    .collect(),
                events: if options.include_events {
                    contract.events.iter().collect()
                } else {
                    Vec::new()
                },
                errors: if options.include_errors {
                    contract.errors.iter().collect()
                } else {
                    Vec::new()
                },
            };
            if options.deduplicate {
                view.functions.retain(|e| seen.first_sighting(*e));
                view.events.retain(|e| seen.first_sighting(*e));
                view.errors.retain(|e| seen.first_sighting(*e));
                if view.is_empty() {
                    continue;
                }
            }
            views.push(view);
        }

        Self {
            category,
            layout: &snapshot.layout,
            generated_at: snapshot.scan_time,
            updated_at: options.update_existing.then_some(now),
            deduplicated: options.deduplicate,
            contracts: views,
        }
    }

    pub fn stats(&self) -> ScanStats {
        ScanStats {
            contracts: self.contracts.len(),
            functions: self.contracts.iter().map(|c| c.functions.len()).sum(),
            events: self.contracts.iter().map(|c| c.events.len()).sum(),
            errors: self.contracts.iter().map(|c| c.errors.len()).sum(),
        }
    }

    pub fn functions(&self) -> impl Iterator<Item = &'a SignatureEntry> + '_ {
        self.contracts.iter().flat_map(|c| c.functions.iter().copied())
    }

    pub fn events(&self) -> impl Iterator<Item = &'a SignatureEntry> + '_ {
        self.contracts.iter().flat_map(|c| c.events.iter().copied())
    }

    pub fn errors(&self) -> impl Iterator<Item = &'a SignatureEntry> + '_ {
        self.contracts.iter().flat_map(|c| c.errors.iter().copied())
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

pub trait SignatureWriter {
    fn write_view(&mut self, view: &ExportView<'_>) -> SigscanResult<()>;
}

/// Render `view` in `format` into a byte buffer.
pub fn render(format: ExportFormat, view: &ExportView<'_>) -> SigscanResult<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        ExportFormat::Text => TextWriter::new(&mut buffer).write_view(view)?,
        ExportFormat::Json => JsonWriter::new(&mut buffer).write_view(view)?,
        ExportFormat::Csv => CsvWriter::new(&mut buffer).write_view(view)?,
        ExportFormat::Markdown => MarkdownWriter::new(&mut buffer).write_view(view)?,
    }
    Ok(buffer)
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

/// Files written and per-format failures of one export call.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<(String, SigscanError)>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Exporter;

impl Exporter {
    pub fn new() -> Self {
        Self
    }

    pub fn export(
        &self,
        snapshot: &ProjectSnapshot,
        options: &ExportOptions,
    ) -> SigscanResult<ExportReport> {
        self.export_at(snapshot, options, Utc::now())
    }

    /// Export with an explicit clock, for reproducible file names and update
    /// markers.
    pub fn export_at(
        &self,
        snapshot: &ProjectSnapshot,
        options: &ExportOptions,
        now: DateTime<Utc>,
    ) -> SigscanResult<ExportReport> {
        std::fs::create_dir_all(&options.output_dir)
            .map_err(|e| SigscanError::io(&options.output_dir, e))?;

        let targets: Vec<(ExportView<'_>, String)> = if options.separate_by_category {
            Category::EXPORTED
                .into_iter()
                .filter(|category| snapshot.contracts_in(*category).next().is_some())
                .map(|category| {
                    let view = ExportView::build(
                        snapshot,
                        category,
                        snapshot.contracts_in(category),
                        options,
                        now,
                    );
                    (view, format!("signatures-{category}"))
                })
                .collect()
        } else {
            let view = ExportView::build(
                snapshot,
                Category::Contracts,
                snapshot.listed_contracts(),
                options,
                now,
            );
            vec![(view, format!("signatures_{}", format_file_timestamp(now)))]
        };

        let mut report = ExportReport::default();
        for name in &options.formats {
            let format = match name.parse::<ExportFormat>() {
                Ok(format) => format,
                Err(e) => {
                    warn!("skipping export format {name:?}: {e}");
                    report.failures.push((name.clone(), e));
                    continue;
                }
            };
            for (view, stem) in &targets {
                let path = options
                    .output_dir
                    .join(format!("{stem}.{}", format.extension()));
                match write_file(&path, format, view) {
                    Ok(()) => report.written.push(path),
                    Err(e) => {
                        warn!(path = %path.display(), "export failed: {e}");
                        report.failures.push((name.clone(), e));
                    }
                }
            }
        }

        info!(
            dir = %options.output_dir.display(),
            written = report.written.len(),
            failed = report.failures.len(),
            "export complete"
        );
        Ok(report)
    }
}

fn write_file(path: &Path, format: ExportFormat, view: &ExportView<'_>) -> SigscanResult<()> {
    let bytes = render(format, view)?;
    let mut file = std::fs::File::create(path).map_err(|e| SigscanError::io(path, e))?;
    file.write_all(&bytes)
        .map_err(|e| SigscanError::io(path, e))?;
    Ok(())
}

/// Double embedded quotes and wrap in quotes.
pub(crate) fn quote_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
