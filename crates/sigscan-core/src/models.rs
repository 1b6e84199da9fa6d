//! Shared typed models used across extraction, scanning, and export layers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 1. Enumerations
// ---------------------------------------------------------------------------

/// Declared visibility of a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    External,
    Internal,
    Private,
}

impl Visibility {
    pub const ALL: [Visibility; 4] = [
        Visibility::Public,
        Visibility::External,
        Visibility::Internal,
        Visibility::Private,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::External => "external",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(Visibility::Public),
            "external" => Some(Visibility::External),
            "internal" => Some(Visibility::Internal),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// Declared state mutability of a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    Nonpayable,
    Payable,
}

impl StateMutability {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::Nonpayable => "nonpayable",
            StateMutability::Payable => "payable",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "pure" => Some(StateMutability::Pure),
            "view" => Some(StateMutability::View),
            "nonpayable" => Some(StateMutability::Nonpayable),
            "payable" => Some(StateMutability::Payable),
            _ => None,
        }
    }
}

/// Which kind of ABI entry a signature describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    Function,
    Event,
    Error,
}

impl SignatureKind {
    /// Label used in tabular outputs (`Function`, `Event`, `Error`).
    pub fn label(&self) -> &'static str {
        match self {
            SignatureKind::Function => "Function",
            SignatureKind::Event => "Event",
            SignatureKind::Error => "Error",
        }
    }
}

/// Role of a source file within the project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Contracts,
    Libs,
    Tests,
    Scripts,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Contracts,
        Category::Libs,
        Category::Tests,
        Category::Scripts,
    ];

    /// Categories that get their own export file. Scripts are scanned but not
    /// exported separately.
    pub const EXPORTED: [Category; 3] = [Category::Contracts, Category::Libs, Category::Tests];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Contracts => "contracts",
            Category::Libs => "libs",
            Category::Tests => "tests",
            Category::Scripts => "scripts",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build-tool convention detected at the project root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Foundry,
    Hardhat,
    Unknown,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Foundry => "foundry",
            ProjectKind::Hardhat => "hardhat",
            ProjectKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// 2. Parameter
// ---------------------------------------------------------------------------

/// A single declared parameter. `indexed` is only set for event parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
}

impl Parameter {
    pub fn new(type_: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_: type_.into(),
            indexed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// 3. SignatureEntry
// ---------------------------------------------------------------------------

/// A function, event, or custom error declaration with its canonical
/// signature and selector (event topic for events).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureEntry {
    pub kind: SignatureKind,
    pub name: String,
    pub signature: String,
    pub selector: String,
    pub inputs: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<StateMutability>,
    pub contract_name: String,
    pub file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// 4. ContractRecord
// ---------------------------------------------------------------------------

/// An import statement found in a source file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub statement: String,
    pub path: String,
}

/// Everything extracted from one source file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub name: String,
    pub file_path: PathBuf,
    pub category: Category,
    pub functions: Vec<SignatureEntry>,
    pub events: Vec<SignatureEntry>,
    pub errors: Vec<SignatureEntry>,
    pub imports: Vec<ImportRecord>,
    /// Base contracts named in `is ...` clauses.
    pub inherits: Vec<String>,
    pub last_modified: DateTime<Utc>,
    /// Comment-stripped source text, consulted when deciding which
    /// libraries the project uses.
    #[serde(skip)]
    pub source: String,
}

impl ContractRecord {
    pub fn signature_count(&self) -> usize {
        self.functions.len() + self.events.len() + self.errors.len()
    }

    /// Every entry of the record, functions first.
    pub fn entries(&self) -> impl Iterator<Item = &SignatureEntry> {
        self.functions
            .iter()
            .chain(self.events.iter())
            .chain(self.errors.iter())
    }

    /// File name of the source, for display.
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// 5. ProjectLayout
// ---------------------------------------------------------------------------

/// Detected project convention and the directories it implies, relative to
/// `root`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLayout {
    pub kind: ProjectKind,
    pub root: PathBuf,
    pub source_dirs: Vec<String>,
    pub script_dirs: Vec<String>,
}

impl ProjectLayout {
    pub fn is_script_path(&self, path: &Path) -> bool {
        self.script_dirs
            .iter()
            .any(|dir| path.starts_with(self.root.join(dir)))
    }
}

// ---------------------------------------------------------------------------
// 6. ProjectSnapshot
// ---------------------------------------------------------------------------

/// A file that could not be processed during a scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDiagnostic {
    pub path: PathBuf,
    pub message: String,
}

/// Aggregate counts over a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub contracts: usize,
    pub functions: usize,
    pub events: usize,
    pub errors: usize,
}

/// The complete aggregated scan result at one point in time.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub layout: ProjectLayout,
    pub contracts: IndexMap<PathBuf, ContractRecord>,
    /// Paths listed per category; pruned library records are absent here but
    /// stay in `contracts`.
    pub by_category: BTreeMap<Category, Vec<PathBuf>>,
    pub inherited_names: BTreeSet<String>,
    pub unique_signatures: IndexMap<String, SignatureEntry>,
    pub scan_time: DateTime<Utc>,
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl ProjectSnapshot {
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            layout,
            contracts: IndexMap::new(),
            by_category: BTreeMap::new(),
            inherited_names: BTreeSet::new(),
            unique_signatures: IndexMap::new(),
            scan_time: Utc::now(),
            diagnostics: Vec::new(),
        }
    }

    /// Contract records listed under `category`, in listing order.
    pub fn contracts_in(&self, category: Category) -> impl Iterator<Item = &ContractRecord> {
        self.by_category
            .get(&category)
            .into_iter()
            .flatten()
            .filter_map(|path| self.contracts.get(path))
    }

    /// Every listed contract record, category by category.
    pub fn listed_contracts(&self) -> impl Iterator<Item = &ContractRecord> {
        Category::ALL
            .into_iter()
            .flat_map(move |category| self.contracts_in(category))
    }

    pub fn stats(&self) -> ScanStats {
        self.contracts
            .values()
            .fold(ScanStats::default(), |mut acc, contract| {
                acc.contracts += 1;
                acc.functions += contract.functions.len();
                acc.events += contract.events.len();
                acc.errors += contract.errors.len();
                acc
            })
    }

    /// All function entries whose name matches exactly.
    pub fn functions_named<'a>(&'a self, name: &'a str) -> Vec<&'a SignatureEntry> {
        self.contracts
            .values()
            .flat_map(|c| c.functions.iter())
            .filter(|f| f.name == name)
            .collect()
    }
}

impl fmt::Display for ProjectSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        writeln!(f, "Project Information:")?;
        writeln!(f, "  Type: {}", self.layout.kind)?;
        writeln!(f, "  Path: {}", self.layout.root.display())?;
        writeln!(
            f,
            "  Contract Directories: {}",
            self.layout.source_dirs.join(", ")
        )?;
        writeln!(f, "  Script Directories: {}", self.layout.script_dirs.join(", "))?;
        writeln!(f, "  Total Contracts: {}", stats.contracts)?;
        writeln!(f, "  Total Functions: {}", stats.functions)?;
        writeln!(f, "  Total Events: {}", stats.events)?;
        write!(f, "  Total Errors: {}", stats.errors)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: SignatureKind, name: &str) -> SignatureEntry {
        SignatureEntry {
            kind,
            name: name.to_string(),
            signature: format!("{name}()"),
            selector: "0x00000000".to_string(),
            inputs: vec![],
            outputs: vec![],
            visibility: None,
            state_mutability: None,
            contract_name: "Token".to_string(),
            file_path: PathBuf::from("/p/src/Token.sol"),
        }
    }

    fn record(path: &str, category: Category) -> ContractRecord {
        ContractRecord {
            name: "Token".to_string(),
            file_path: PathBuf::from(path),
            category,
            functions: vec![entry(SignatureKind::Function, "mint")],
            events: vec![entry(SignatureKind::Event, "Minted")],
            errors: vec![],
            imports: vec![],
            inherits: vec![],
            last_modified: Utc::now(),
            source: String::new(),
        }
    }

    fn layout() -> ProjectLayout {
        ProjectLayout {
            kind: ProjectKind::Foundry,
            root: PathBuf::from("/p"),
            source_dirs: vec!["src".to_string()],
            script_dirs: vec!["script".to_string()],
        }
    }

    #[test]
    fn test_keyword_round_trip() {
        for v in Visibility::ALL {
            assert_eq!(Visibility::from_keyword(v.as_str()), Some(v));
        }
        assert_eq!(StateMutability::from_keyword("view"), Some(StateMutability::View));
        assert_eq!(Visibility::from_keyword("virtual"), None);
    }

    #[test]
    fn test_stats_counts_all_records() {
        let mut snapshot = ProjectSnapshot::new(layout());
        snapshot
            .contracts
            .insert(PathBuf::from("/p/src/A.sol"), record("/p/src/A.sol", Category::Contracts));
        snapshot
            .contracts
            .insert(PathBuf::from("/p/lib/B.sol"), record("/p/lib/B.sol", Category::Libs));
        let stats = snapshot.stats();
        assert_eq!(stats.contracts, 2);
        assert_eq!(stats.functions, 2);
        assert_eq!(stats.events, 2);
        assert_eq!(stats.errors, 0);
    }

    #[test]
    fn test_contracts_in_skips_unknown_paths() {
        let mut snapshot = ProjectSnapshot::new(layout());
        let path = PathBuf::from("/p/src/A.sol");
        snapshot
            .contracts
            .insert(path.clone(), record("/p/src/A.sol", Category::Contracts));
        snapshot.by_category.insert(
            Category::Contracts,
            vec![path, PathBuf::from("/p/src/Gone.sol")],
        );
        assert_eq!(snapshot.contracts_in(Category::Contracts).count(), 1);
        assert_eq!(snapshot.contracts_in(Category::Libs).count(), 0);
    }

    #[test]
    fn test_functions_named() {
        let mut snapshot = ProjectSnapshot::new(layout());
        snapshot
            .contracts
            .insert(PathBuf::from("/p/src/A.sol"), record("/p/src/A.sol", Category::Contracts));
        assert_eq!(snapshot.functions_named("mint").len(), 1);
        assert!(snapshot.functions_named("burn").is_empty());
    }

    #[test]
    fn test_script_path_detection() {
        let layout = layout();
        assert!(layout.is_script_path(Path::new("/p/script/Deploy.s.sol")));
        assert!(!layout.is_script_path(Path::new("/p/src/Token.sol")));
    }

    #[test]
    fn test_parameter_serializes_type_field() {
        let json = serde_json::to_value(Parameter::new("address", "to")).unwrap();
        assert_eq!(json["type"], "address");
        assert!(json.get("indexed").is_none());
    }
}
