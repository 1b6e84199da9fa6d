use std::io::Write;

use crate::errors::SigscanResult;
use crate::export::{ExportView, SignatureWriter};
use crate::models::SignatureEntry;

const SIGNATURE_COLUMN: usize = 40;

/// Plain-text listing: `signature --> selector`, grouped by contract.
pub struct TextWriter<W: Write> {
    writer: W,
}

impl<W: Write> TextWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_section(&mut self, title: &str, entries: &[&SignatureEntry]) -> SigscanResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "### {title}:")?;
        for entry in entries {
            writeln!(
                self.writer,
                "{:<width$} --> {}",
                entry.signature,
                entry.selector,
                width = SIGNATURE_COLUMN
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> SignatureWriter for TextWriter<W> {
    fn write_view(&mut self, view: &ExportView<'_>) -> SigscanResult<()> {
        if let Some(updated) = view.updated_at {
            writeln!(
                self.writer,
                "# Last updated: {} (previous content replaced)",
                updated.to_rfc3339()
            )?;
        }
        let stats = view.stats();
        writeln!(self.writer, "# Smart Contract Signatures")?;
        writeln!(self.writer, "# Category: {}", view.category)?;
        writeln!(self.writer, "# Generated: {}", view.generated_at.to_rfc3339())?;
        writeln!(
            self.writer,
            "# Project: {} ({})",
            view.layout.kind,
            view.layout.root.display()
        )?;
        writeln!(self.writer, "# Total Contracts: {}", stats.contracts)?;
        writeln!(self.writer)?;

        for contract in &view.contracts {
            writeln!(
                self.writer,
                "## Contract: {} ({})",
                contract.contract.name,
                contract.contract.file_name()
            )?;
            writeln!(self.writer)?;
            self.write_section("Functions", &contract.functions)?;
            self.write_section("Events", &contract.events)?;
            self.write_section("Errors", &contract.errors)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::{fixed_time, sample_snapshot};
    use crate::export::ExportOptions;
    use crate::models::Category;

    fn render(options: &ExportOptions) -> String {
        let snapshot = sample_snapshot();
        let view = ExportView::build(
            &snapshot,
            Category::Contracts,
            snapshot.contracts_in(Category::Contracts),
            options,
            fixed_time(),
        );
        let mut out = Vec::new();
        TextWriter::new(&mut out).write_view(&view).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_layout() {
        let text = render(&ExportOptions {
            update_existing: false,
            ..ExportOptions::default()
        });
        assert!(text.starts_with("# Smart Contract Signatures\n# Category: contracts\n"));
        assert!(text.contains("# Project: foundry (/work/token)"));
        assert!(text.contains("## Contract: Token (Token.sol)"));
        assert!(text.contains("### Functions:\ntransfer(address,uint256)                --> 0xa9059cbb\n"));
        assert!(text.contains(
            "Transfer(address,address,uint256)        --> 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        ));
        assert!(!text.contains("Wrapper"));
        assert!(!text.contains("Last updated"));
    }

    #[test]
    fn test_text_update_marker_first_line() {
        let text = render(&ExportOptions::default());
        assert_eq!(
            text.lines().next().unwrap(),
            "# Last updated: 2024-05-01T12:00:00+00:00 (previous content replaced)"
        );
    }
}
