//! A scan session: one project root, its settings, and the live snapshot.
//!
//! Updates take the write lock; exports and lookups take the read lock, so an
//! export always renders a complete point-in-time snapshot.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::SigscanConfig;
use crate::errors::{SigscanError, SigscanResult};
use crate::export::{ExportOptions, ExportReport, Exporter};
use crate::indexer::pipeline::{IncrementalUpdate, PathOutcome, Scanner};
use crate::models::{ProjectSnapshot, ScanStats};
use crate::watcher::ChangeEvent;

pub struct Session {
    root: PathBuf,
    config: SigscanConfig,
    scanner: Scanner,
    exporter: Exporter,
    snapshot: RwLock<Option<ProjectSnapshot>>,
}

impl Session {
    /// Open a session on `root`, loading `sigscan.json` and environment
    /// overrides.
    pub fn open(root: impl Into<PathBuf>) -> SigscanResult<Self> {
        let root = root.into();
        let config = SigscanConfig::load(&root)?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: impl Into<PathBuf>, config: SigscanConfig) -> Self {
        let scanner = Scanner::new().with_ignored_dirs(config.extra_ignored_dirs.clone());
        Self {
            root: root.into(),
            config,
            scanner,
            exporter: Exporter::new(),
            snapshot: RwLock::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SigscanConfig {
        &self.config
    }

    pub fn export_options(&self) -> ExportOptions {
        self.config.export_options(&self.root)
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.read().is_some()
    }

    /// Full scan; replaces any previous snapshot.
    pub fn scan(&self) -> ScanStats {
        let snapshot = self.scanner.scan_project(&self.root);
        let stats = snapshot.stats();
        *self.snapshot.write() = Some(snapshot);
        stats
    }

    /// Incremental refresh of files modified after `since`.
    pub fn refresh(&self, since: DateTime<Utc>) -> SigscanResult<IncrementalUpdate> {
        let mut guard = self.snapshot.write();
        let snapshot = guard.as_mut().ok_or(SigscanError::NotScanned)?;
        Ok(self.scanner.apply_incremental_update(snapshot, since))
    }

    /// Apply one change notification to the live snapshot.
    pub fn apply_event(&self, event: &ChangeEvent) -> SigscanResult<PathOutcome> {
        let mut guard = self.snapshot.write();
        let snapshot = guard.as_mut().ok_or(SigscanError::NotScanned)?;
        let outcome = match event {
            ChangeEvent::Added(path) | ChangeEvent::Changed(path) => {
                self.scanner.process_path(snapshot, &self.resolve(path))
            }
            ChangeEvent::Removed(path) => self.scanner.remove_path(snapshot, &self.resolve(path)),
            ChangeEvent::Error(reason) => {
                warn!("watcher reported an error: {reason}");
                PathOutcome::Skipped
            }
        };
        debug!(?event, ?outcome, "change event applied");
        Ok(outcome)
    }

    /// Export the current snapshot with the session's settings.
    pub fn export(&self) -> SigscanResult<ExportReport> {
        self.export_with(&self.export_options(), Utc::now())
    }

    pub fn export_with(
        &self,
        options: &ExportOptions,
        now: DateTime<Utc>,
    ) -> SigscanResult<ExportReport> {
        let guard = self.snapshot.read();
        let snapshot = guard.as_ref().ok_or(SigscanError::NotScanned)?;
        let report = self.exporter.export_at(snapshot, options, now)?;
        info!(
            root = %self.root.display(),
            files = report.written.len(),
            "session export finished"
        );
        Ok(report)
    }

    /// Run `f` against the current snapshot under the read lock.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&ProjectSnapshot) -> R) -> SigscanResult<R> {
        let guard = self.snapshot.read();
        guard.as_ref().map(f).ok_or(SigscanError::NotScanned)
    }

    /// `signature → selector` lines for every function called `name`.
    pub fn lookup(&self, name: &str) -> SigscanResult<Vec<String>> {
        self.with_snapshot(|snapshot| {
            snapshot
                .functions_named(name)
                .into_iter()
                .map(|f| format!("{} → {}", f.signature, f.selector))
                .collect()
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            self.root.join(path)
        } else {
            path.to_path_buf()
        }
    }
}
