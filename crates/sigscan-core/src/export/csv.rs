use std::io::Write;

use crate::errors::SigscanResult;
use crate::export::{quote_field, ExportView, SignatureWriter};
use crate::models::{ContractRecord, SignatureEntry};

const HEADER: &str = "Type,Contract,Name,Signature,Selector,Visibility,StateMutability,FilePath,Category";

/// One quoted row per entry under a fixed header.
pub struct CsvWriter<W: Write> {
    writer: W,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_row(&mut self, contract: &ContractRecord, entry: &SignatureEntry) -> SigscanResult<()> {
        let file_path = contract.file_path.to_string_lossy();
        let fields = [
            entry.kind.label(),
            contract.name.as_str(),
            entry.name.as_str(),
            entry.signature.as_str(),
            entry.selector.as_str(),
            entry.visibility.map_or("", |v| v.as_str()),
            entry.state_mutability.map_or("", |m| m.as_str()),
            file_path.as_ref(),
            contract.category.as_str(),
        ];
        let row: Vec<String> = fields.iter().map(|f| quote_field(f)).collect();
        writeln!(self.writer, "{}", row.join(","))?;
        Ok(())
    }
}

impl<W: Write> SignatureWriter for CsvWriter<W> {
    fn write_view(&mut self, view: &ExportView<'_>) -> SigscanResult<()> {
        if let Some(updated) = view.updated_at {
            writeln!(
                self.writer,
                "# Last updated: {} (previous content replaced)",
                updated.to_rfc3339()
            )?;
        }
        writeln!(self.writer, "{HEADER}")?;
        for contract in &view.contracts {
            for entry in contract
                .functions
                .iter()
                .chain(contract.events.iter())
                .chain(contract.errors.iter())
            {
                self.write_row(contract.contract, entry)?;
            }
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

    fn render(options: &ExportOptions, category: Category) -> Vec<String> {
        let snapshot = sample_snapshot();
        let view = ExportView::build(
            &snapshot,
            category,
            snapshot.contracts_in(category),
            options,
            fixed_time(),
        );
        let mut out = Vec::new();
        CsvWriter::new(&mut out).write_view(&view).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_csv_rows() {
        let lines = render(
            &ExportOptions {
                update_existing: false,
                ..ExportOptions::default()
            },
            Category::Contracts,
        );
        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            "\"Function\",\"Token\",\"transfer\",\"transfer(address,uint256)\",\"0xa9059cbb\",\"public\",\"nonpayable\",\"/work/token/src/Token.sol\",\"contracts\""
        );
        let event = lines.iter().find(|l| l.starts_with("\"Event\"")).unwrap();
        assert!(event.contains(",\"\",\"\","));
        // transfer, Transfer, Unauthorized, deposit
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_csv_marker_precedes_header() {
        let lines = render(&ExportOptions::default(), Category::Libs);
        assert!(lines[0].contains("previous content replaced"));
        assert_eq!(lines[1], HEADER);
        assert!(lines[2].contains("\"owner()\""));
        assert!(lines[2].ends_with("\"libs\""));
    }
}
