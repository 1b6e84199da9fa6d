use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::SigscanResult;
use crate::export::{ExportView, SignatureWriter, UPDATE_NOTE};
use crate::models::{Category, SignatureEntry};

/// Pretty-printed JSON document with a metadata block.
///
/// Deduplicated views are flattened into a `signatures` object keyed by
/// kind; full views keep the per-contract structure under `contracts`.
pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata<'a> {
    category: Category,
    generated_at: DateTime<Utc>,
    project_type: &'static str,
    project_path: &'a Path,
    total_contracts: usize,
    total_functions: usize,
    total_events: usize,
    total_errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
}

#[derive(Serialize)]
struct Signatures<'a> {
    functions: Vec<&'a SignatureEntry>,
    events: Vec<&'a SignatureEntry>,
    errors: Vec<&'a SignatureEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContractDocument<'a> {
    name: &'a str,
    file_path: &'a Path,
    category: Category,
    last_modified: DateTime<Utc>,
    functions: &'a [&'a SignatureEntry],
    events: &'a [&'a SignatureEntry],
    errors: &'a [&'a SignatureEntry],
}

#[derive(Serialize)]
#[serde(untagged)]
enum Body<'a> {
    Deduplicated { signatures: Signatures<'a> },
    Full { contracts: Vec<ContractDocument<'a>> },
}

#[derive(Serialize)]
struct Document<'a> {
    metadata: Metadata<'a>,
    #[serde(flatten)]
    body: Body<'a>,
}

impl<W: Write> SignatureWriter for JsonWriter<W> {
    fn write_view(&mut self, view: &ExportView<'_>) -> SigscanResult<()> {
        let stats = view.stats();
        let metadata = Metadata {
            category: view.category,
            generated_at: view.generated_at,
            project_type: view.layout.kind.as_str(),
            project_path: &view.layout.root,
            total_contracts: stats.contracts,
            total_functions: stats.functions,
            total_events: stats.events,
            total_errors: stats.errors,
            last_updated: view.updated_at,
            note: view.updated_at.map(|_| UPDATE_NOTE),
        };

        let body = if view.deduplicated {
            Body::Deduplicated {
                signatures: Signatures {
                    functions: view.functions().collect(),
                    events: view.events().collect(),
                    errors: view.errors().collect(),
                },
            }
        } else {
            Body::Full {
                contracts: view
                    .contracts
                    .iter()
                    .map(|c| ContractDocument {
                        name: &c.contract.name,
                        file_path: &c.contract.file_path,
                        category: c.contract.category,
                        last_modified: c.contract.last_modified,
                        functions: &c.functions,
                        events: &c.events,
                        errors: &c.errors,
                    })
                    .collect(),
            }
        };

        serde_json::to_writer_pretty(&mut self.writer, &Document { metadata, body })?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
