//! Import and inheritance relationships between source files.
//!
//! Used by the scanner to decide which library records are actually pulled in
//! by the project's own contracts.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ContractRecord, ImportRecord};

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\bimport\s+(?:[^;"']*?\bfrom\s+)?["']([^"']+)["'][^;]*;"#).unwrap()
});

static INHERIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\b(?:contract|interface|library)\s+[A-Za-z_$][A-Za-z0-9_$]*\s+is\s+([^{]+)\{")
        .unwrap()
});

const LIBRARY_SEGMENTS: &[&str] = &["lib", "libs"];

/// Collect every import statement with its quoted path.
pub fn extract_imports(source: &str) -> Vec<ImportRecord> {
    IMPORT_RE
        .captures_iter(source)
        .map(|caps| ImportRecord {
            statement: caps[0].split_whitespace().collect::<Vec<_>>().join(" "),
            path: caps[1].to_string(),
        })
        .collect()
}

/// Names listed in `is A, B(args), C` clauses, in declaration order.
pub fn extract_inherits(source: &str) -> Vec<String> {
    let mut bases = Vec::new();
    for caps in INHERIT_RE.captures_iter(source) {
        for chunk in split_top_level(&caps[1]) {
            let name: String = chunk
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$' || *c == '.')
                .collect();
            let name = name.rsplit('.').next().unwrap_or_default().to_string();
            if !name.is_empty() && !bases.contains(&name) {
                bases.push(name);
            }
        }
    }
    bases
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// True when the import path has a `lib`/`libs` directory segment.
pub fn import_targets_library(import_path: &str) -> bool {
    import_path
        .split(['/', '\\'])
        .any(|segment| LIBRARY_SEGMENTS.contains(&segment))
}

/// File stem of an import path (`../lib/oz/ERC20.sol` -> `ERC20`).
pub fn import_base_name(import_path: &str) -> String {
    Path::new(import_path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Base names of every library file imported by the given contracts.
pub fn inherited_library_names<'a>(
    contracts: impl IntoIterator<Item = &'a ContractRecord>,
) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for contract in contracts {
        for import in &contract.imports {
            if import_targets_library(&import.path) {
                let base = import_base_name(&import.path);
                if !base.is_empty() {
                    names.insert(base);
                }
            }
        }
    }
    names
}

/// True when `contract` inherits from `name`, or its source has an `import`
/// and mentions `name` anywhere. The mention is plain substring containment,
/// so `ERC20` also matches a source that only says `ERC20Permit`.
pub fn references_contract(contract: &ContractRecord, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    contract.inherits.iter().any(|base| base == name)
        || (contains_word(&contract.source, "import") && contract.source.contains(name))
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Whole-word containment: `name` must not be flanked by identifier chars.
pub fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    text.match_indices(word).any(|(idx, _)| {
        let before = text[..idx].chars().next_back();
        let after = text[idx + word.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    use crate::models::Category;

    fn contract_with(imports: Vec<ImportRecord>, inherits: Vec<String>) -> ContractRecord {
        ContractRecord {
            name: "Vault".to_string(),
            file_path: PathBuf::from("src/Vault.sol"),
            category: Category::Contracts,
            functions: vec![],
            events: vec![],
            errors: vec![],
            imports,
            inherits,
            last_modified: Utc::now(),
            source: String::new(),
        }
    }

    #[test]
    fn test_extract_import_forms() {
        let src = r#"
import "./Base.sol";
import {ERC20, IERC20} from "../lib/openzeppelin/contracts/token/ERC20/ERC20.sol";
import * as Math from 'lib/math/Math.sol';
import "./Alias.sol" as Alias;
"#;
        let imports = extract_imports(src);
        let paths: Vec<&str> = imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "./Base.sol",
                "../lib/openzeppelin/contracts/token/ERC20/ERC20.sol",
                "lib/math/Math.sol",
                "./Alias.sol",
            ]
        );
        assert!(imports[1].statement.starts_with("import {ERC20, IERC20} from"));
    }

    #[test]
    fn test_extract_inherits_with_constructor_args() {
        let src = r#"
contract Token is ERC20("Token", "TKN"), Ownable(msg.sender), Lib.Pausable {
}
abstract contract Base is Context {}
"#;
        assert_eq!(
            extract_inherits(src),
            vec!["ERC20", "Ownable", "Pausable", "Context"]
        );
    }

    #[test]
    fn test_extract_inherits_none() {
        assert!(extract_inherits("contract Plain { }").is_empty());
    }

    #[test]
    fn test_import_targets_library() {
        assert!(import_targets_library("../lib/oz/ERC20.sol"));
        assert!(import_targets_library("libs/Math.sol"));
        assert!(!import_targets_library("./library/Math.sol"));
        assert!(!import_targets_library("@openzeppelin/contracts/Ownable.sol"));
    }

    #[test]
    fn test_import_base_name() {
        assert_eq!(import_base_name("../lib/oz/ERC20.sol"), "ERC20");
        assert_eq!(import_base_name("Math.sol"), "Math");
    }

    #[test]
    fn test_inherited_library_names() {
        let contract = contract_with(
            vec![
                ImportRecord {
                    statement: r#"import "../lib/oz/ERC20.sol";"#.to_string(),
                    path: "../lib/oz/ERC20.sol".to_string(),
                },
                ImportRecord {
                    statement: r#"import "./Local.sol";"#.to_string(),
                    path: "./Local.sol".to_string(),
                },
            ],
            vec![],
        );
        let names = inherited_library_names([&contract]);
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["ERC20"]);
    }

    #[test]
    fn test_references_contract() {
        let mut contract = contract_with(vec![], vec!["Ownable".to_string()]);
        contract.source = "import \"@oz/token/ERC20Permit.sol\";\ncontract Vault is Ownable {\n  using SafeMath for uint256;\n}".to_string();
        assert!(references_contract(&contract, "SafeMath"));
        assert!(references_contract(&contract, "Ownable"));
        assert!(references_contract(&contract, "ERC20"));
        assert!(!references_contract(&contract, "Pausable"));
        assert!(!references_contract(&contract, ""));
    }

    #[test]
    fn test_references_contract_needs_import() {
        let mut contract = contract_with(vec![], vec![]);
        contract.source = "contract Vault {\n  using SafeMath for uint256;\n}".to_string();
        assert!(!references_contract(&contract, "SafeMath"));
        contract.source = "contract Vault {\n  uint256 importance;\n  using SafeMath for uint256;\n}".to_string();
        assert!(!references_contract(&contract, "SafeMath"));
    }

    #[test]
    fn test_contains_word_boundaries() {
        assert!(contains_word("import {A, B} from 'x';", "B"));
        assert!(!contains_word("import {AB} from 'x';", "A"));
        assert!(!contains_word("anything", ""));
    }
}
