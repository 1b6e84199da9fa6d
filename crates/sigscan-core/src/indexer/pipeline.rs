//! Scanning pipeline: discovery, extraction, categorisation, library pruning,
//! and incremental refresh of a project snapshot.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::indexer::filesystem::{
    detect_project_layout, has_file_changed, is_source_file, iter_source_files,
};
use crate::indexer::imports::{inherited_library_names, references_contract};
use crate::indexer::symbols::extract_file;
use crate::models::{Category, ContractRecord, ProjectLayout, ProjectSnapshot, ScanDiagnostic};

const TEST_SEGMENTS: &[&str] = &["test", "tests", "Test", "Tests"];
const SCRIPT_SEGMENTS: &[&str] = &["script", "scripts", "Script", "Scripts", "deploy"];
const LIBRARY_SEGMENTS: &[&str] = &["lib", "libs"];

/// Outcome of an incremental refresh.
#[derive(Debug, Default)]
pub struct IncrementalUpdate {
    /// Records that were re-extracted or newly discovered.
    pub changed: Vec<ContractRecord>,
    /// Paths dropped from the snapshot: deleted, unreadable, or no longer
    /// declaring anything.
    pub removed: Vec<PathBuf>,
}

impl IncrementalUpdate {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Outcome of reprocessing a single path.
#[derive(Debug, PartialEq, Eq)]
pub enum PathOutcome {
    Updated,
    Removed,
    Skipped,
}

/// Assign a category from path segments relative to the project root.
///
/// Precedence: test, then script, then lib, then contracts. Foundry's
/// `.t.sol` and `.s.sol` suffixes count as test and script markers.
pub fn classify_path(root: &Path, path: &Path) -> Category {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(os) => Some(os.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    let file_name = segments.last().cloned().unwrap_or_default();
    let dirs = &segments[..segments.len().saturating_sub(1)];
    let has_segment = |names: &[&str]| dirs.iter().any(|s| names.contains(&s.as_str()));

    if has_segment(TEST_SEGMENTS) || file_name.ends_with(".t.sol") {
        Category::Tests
    } else if has_segment(SCRIPT_SEGMENTS) || file_name.ends_with(".s.sol") {
        Category::Scripts
    } else if has_segment(LIBRARY_SEGMENTS) {
        Category::Libs
    } else {
        Category::Contracts
    }
}

/// Result of reading one file.
enum Extraction {
    Record(ContractRecord),
    /// Readable, but declares nothing.
    Empty,
    /// Recorded as a diagnostic.
    Unreadable,
}

/// Walks a project and builds [`ProjectSnapshot`]s.
#[derive(Clone, Debug, Default)]
pub struct Scanner {
    ignored_dirs: Vec<String>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip directories with these names in addition to `.git` and
    /// `node_modules`.
    pub fn with_ignored_dirs(mut self, dirs: Vec<String>) -> Self {
        self.ignored_dirs = dirs;
        self
    }

    /// Category for a path: script-directory membership first, then path
    /// segments.
    pub fn category_for(&self, layout: &ProjectLayout, path: &Path) -> Category {
        if layout.is_script_path(path) {
            Category::Scripts
        } else {
            classify_path(&layout.root, path)
        }
    }

    /// Every source file under the layout's source and script directories. A
    /// file reachable from more than one configured directory is listed once.
    fn discover(&self, layout: &ProjectLayout) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for dir in layout.source_dirs.iter().chain(layout.script_dirs.iter()) {
            for path in iter_source_files(&layout.root.join(dir), &self.ignored_dirs) {
                if seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }
        files
    }

    /// Extract `path`, replacing any diagnostic previously recorded for it.
    fn extract_into(&self, snapshot: &mut ProjectSnapshot, path: &Path) -> Extraction {
        snapshot.diagnostics.retain(|d| d.path != path);
        match extract_file(path) {
            Ok(Some(mut record)) => {
                record.category = self.category_for(&snapshot.layout, path);
                Extraction::Record(record)
            }
            Ok(None) => {
                debug!(path = %path.display(), "no declarations found");
                Extraction::Empty
            }
            Err(e) => {
                warn!(path = %path.display(), "skipping unreadable file: {e}");
                snapshot.diagnostics.push(ScanDiagnostic {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
                Extraction::Unreadable
            }
        }
    }

    /// Full scan of `root`. Unreadable files are recorded as diagnostics and
    /// skipped.
    pub fn scan_project(&self, root: &Path) -> ProjectSnapshot {
        let started = Instant::now();
        let layout = detect_project_layout(root);
        let mut snapshot = ProjectSnapshot::new(layout);

        for path in self.discover(&snapshot.layout) {
            if let Extraction::Record(record) = self.extract_into(&mut snapshot, &path) {
                snapshot.contracts.insert(path, record);
            }
        }

        snapshot.inherited_names = inherited_library_names(
            snapshot
                .contracts
                .values()
                .filter(|c| c.category == Category::Contracts),
        );
        let retained_libs = self.retained_libraries(&snapshot);
        rebuild_indexes(&mut snapshot, &retained_libs);
        snapshot.scan_time = Utc::now();

        let stats = snapshot.stats();
        info!(
            root = %root.display(),
            kind = %snapshot.layout.kind,
            contracts = stats.contracts,
            functions = stats.functions,
            events = stats.events,
            errors = stats.errors,
            unique = snapshot.unique_signatures.len(),
            skipped = snapshot.diagnostics.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scan complete"
        );
        snapshot
    }

    /// Library records kept in the `libs` listing: imported from a `lib`
    /// path by a project contract, inherited by one, or mentioned in the
    /// source of one that has an `import`.
    fn retained_libraries(&self, snapshot: &ProjectSnapshot) -> HashSet<PathBuf> {
        let project_contracts: Vec<&ContractRecord> = snapshot
            .contracts
            .values()
            .filter(|c| c.category == Category::Contracts)
            .collect();

        snapshot
            .contracts
            .iter()
            .filter(|(_, c)| c.category == Category::Libs)
            .filter(|(_, lib)| {
                snapshot.inherited_names.contains(&lib.name)
                    || project_contracts
                        .iter()
                        .any(|c| references_contract(c, &lib.name))
            })
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Re-extract files modified after `since`, pick up new files, and drop
    /// vanished ones. A changed file that no longer declares anything, or
    /// can no longer be read, is dropped as well. Library pruning is not
    /// re-run: a library discovered here is listed only if its name is
    /// already an inherited name.
    pub fn apply_incremental_update(
        &self,
        snapshot: &mut ProjectSnapshot,
        since: DateTime<Utc>,
    ) -> IncrementalUpdate {
        let mut update = IncrementalUpdate::default();
        let retained_libs = listed_libraries(snapshot);

        let known: Vec<PathBuf> = snapshot.contracts.keys().cloned().collect();
        for path in known {
            if !path.exists() {
                update.removed.push(path);
                continue;
            }
            if has_file_changed(&path, since) {
                match self.extract_into(snapshot, &path) {
                    Extraction::Record(record) => {
                        snapshot.contracts.insert(path, record.clone());
                        update.changed.push(record);
                    }
                    Extraction::Empty | Extraction::Unreadable => update.removed.push(path),
                }
            }
        }

        for path in self.discover(&snapshot.layout) {
            if snapshot.contracts.contains_key(&path) {
                continue;
            }
            if let Extraction::Record(record) = self.extract_into(snapshot, &path) {
                snapshot.contracts.insert(path, record.clone());
                update.changed.push(record);
            }
        }

        for path in &update.removed {
            snapshot.contracts.shift_remove(path);
        }
        snapshot.diagnostics.retain(|d| d.path.exists());

        rebuild_indexes(snapshot, &retained_libs);
        snapshot.scan_time = Utc::now();
        info!(
            changed = update.changed.len(),
            removed = update.removed.len(),
            "incremental update applied"
        );
        update
    }

    /// Reprocess one path after a change notification: re-extract it if it
    /// exists, otherwise drop it. A file that now declares nothing, or cannot
    /// be read, loses its record; the latter keeps a diagnostic.
    pub fn process_path(&self, snapshot: &mut ProjectSnapshot, path: &Path) -> PathOutcome {
        if !is_source_file(path) {
            return PathOutcome::Skipped;
        }
        if !path.exists() {
            return self.remove_path(snapshot, path);
        }
        let retained_libs = listed_libraries(snapshot);
        match self.extract_into(snapshot, path) {
            Extraction::Record(record) => {
                snapshot.contracts.insert(path.to_path_buf(), record);
                rebuild_indexes(snapshot, &retained_libs);
                PathOutcome::Updated
            }
            Extraction::Empty | Extraction::Unreadable => drop_record(snapshot, path),
        }
    }

    /// Drop a deleted path's record and any diagnostic for it.
    pub fn remove_path(&self, snapshot: &mut ProjectSnapshot, path: &Path) -> PathOutcome {
        snapshot.diagnostics.retain(|d| d.path != path);
        drop_record(snapshot, path)
    }
}

fn drop_record(snapshot: &mut ProjectSnapshot, path: &Path) -> PathOutcome {
    if snapshot.contracts.shift_remove(path).is_none() {
        return PathOutcome::Skipped;
    }
    let retained_libs = listed_libraries(snapshot);
    rebuild_indexes(snapshot, &retained_libs);
    PathOutcome::Removed
}

fn listed_libraries(snapshot: &ProjectSnapshot) -> HashSet<PathBuf> {
    snapshot
        .by_category
        .get(&Category::Libs)
        .map(|paths| paths.iter().cloned().collect())
        .unwrap_or_default()
}

/// Recompute category listings and the unique-signature index from
/// `contracts`. Library records are listed only when in `retained_libs` or
/// named in `inherited_names`.
fn rebuild_indexes(snapshot: &mut ProjectSnapshot, retained_libs: &HashSet<PathBuf>) {
    snapshot.by_category.clear();
    snapshot.unique_signatures.clear();

    for (path, contract) in &snapshot.contracts {
        if contract.category == Category::Libs
            && !retained_libs.contains(path)
            && !snapshot.inherited_names.contains(&contract.name)
        {
            continue;
        }
        snapshot
            .by_category
            .entry(contract.category)
            .or_default()
            .push(path.clone());
        for entry in contract.entries() {
            snapshot
                .unique_signatures
                .insert(entry.signature.clone(), entry.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
