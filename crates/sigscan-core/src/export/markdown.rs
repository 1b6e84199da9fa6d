use std::io::Write;

use crate::errors::SigscanResult;
use crate::export::{ExportView, SignatureWriter};
use crate::models::SignatureEntry;

/// Markdown document with one table per entry kind per contract.
pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_function_table(&mut self, functions: &[&SignatureEntry]) -> SigscanResult<()> {
        if functions.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "### Functions")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Signature | Selector | Visibility | State Mutability |")?;
        writeln!(self.writer, "|-----------|----------|------------|------------------|")?;
        for f in functions {
            writeln!(
                self.writer,
                "| `{}` | `{}` | {} | {} |",
                f.signature,
                f.selector,
                f.visibility.map_or("", |v| v.as_str()),
                f.state_mutability.map_or("", |m| m.as_str())
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_selector_table(&mut self, title: &str, entries: &[&SignatureEntry]) -> SigscanResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "### {title}")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Signature | Selector |")?;
        writeln!(self.writer, "|-----------|----------|")?;
        for e in entries {
            writeln!(self.writer, "| `{}` | `{}` |", e.signature, e.selector)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> SignatureWriter for MarkdownWriter<W> {
    fn write_view(&mut self, view: &ExportView<'_>) -> SigscanResult<()> {
        if let Some(updated) = view.updated_at {
            writeln!(
                self.writer,
                "> **Last updated:** {} (previous content replaced)",
                updated.to_rfc3339()
            )?;
            writeln!(self.writer)?;
        }
        writeln!(self.writer, "# Smart Contract Signatures")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "**Category:** {}", view.category)?;
        writeln!(self.writer, "**Generated:** {}", view.generated_at.to_rfc3339())?;
        writeln!(self.writer, "**Project Type:** {}", view.layout.kind)?;
        writeln!(self.writer, "**Project Path:** {}", view.layout.root.display())?;
        writeln!(self.writer, "**Total Contracts:** {}", view.stats().contracts)?;
        writeln!(self.writer)?;

        for contract in &view.contracts {
            writeln!(self.writer, "## {}", contract.contract.name)?;
            writeln!(self.writer)?;
            writeln!(self.writer, "**File:** `{}`", contract.contract.file_name())?;
            writeln!(self.writer)?;
            self.write_function_table(&contract.functions)?;
            self.write_selector_table("Events", &contract.events)?;
            self.write_selector_table("Errors", &contract.errors)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
