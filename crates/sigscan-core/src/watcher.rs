//! Change notifications and the sequential loop that applies them.
//!
//! Filesystem watching itself lives outside this crate; a watcher reports
//! through a [`ChangeNotifier`] and a single [`UpdateLoop`] applies events in
//! arrival order.

use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::errors::{SigscanError, SigscanResult};
use crate::indexer::pipeline::PathOutcome;
use crate::session::Session;

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    Added(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
    Error(String),
}

/// Sending half handed to a filesystem watcher.
#[derive(Clone, Debug)]
pub struct ChangeNotifier {
    sender: Sender<ChangeEvent>,
}

impl ChangeNotifier {
    pub fn added(&self, path: impl Into<PathBuf>) -> SigscanResult<()> {
        self.send(ChangeEvent::Added(path.into()))
    }

    pub fn changed(&self, path: impl Into<PathBuf>) -> SigscanResult<()> {
        self.send(ChangeEvent::Changed(path.into()))
    }

    pub fn removed(&self, path: impl Into<PathBuf>) -> SigscanResult<()> {
        self.send(ChangeEvent::Removed(path.into()))
    }

    pub fn error(&self, reason: impl Into<String>) -> SigscanResult<()> {
        self.send(ChangeEvent::Error(reason.into()))
    }

    /// Blocks while the queue is full.
    pub fn send(&self, event: ChangeEvent) -> SigscanResult<()> {
        self.sender
            .send(event)
            .map_err(|e| SigscanError::Channel(format!("update loop stopped: {:?}", e.0)))
    }
}

/// A bounded queue of change events.
pub fn change_channel(capacity: usize) -> (ChangeNotifier, Receiver<ChangeEvent>) {
    let (sender, receiver) = bounded(capacity.max(1));
    (ChangeNotifier { sender }, receiver)
}

/// Counts reported when an [`UpdateLoop`] finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub processed: usize,
    pub updated: usize,
    pub removed: usize,
    pub skipped: usize,
    pub exports: usize,
}

/// Applies change events to a session one at a time.
pub struct UpdateLoop {
    session: Arc<Session>,
    receiver: Receiver<ChangeEvent>,
    auto_export: bool,
}

impl UpdateLoop {
    pub fn new(session: Arc<Session>, receiver: Receiver<ChangeEvent>) -> Self {
        Self {
            session,
            receiver,
            auto_export: false,
        }
    }

    /// Re-export after every event that changed the snapshot.
    pub fn with_auto_export(mut self, enabled: bool) -> Self {
        self.auto_export = enabled;
        self
    }

    /// Process events until every notifier is dropped. Fails only when the
    /// session has not been scanned yet.
    pub fn run(self) -> SigscanResult<LoopSummary> {
        let mut summary = LoopSummary::default();
        info!(root = %self.session.root().display(), "update loop started");

        for event in self.receiver.iter() {
            summary.processed += 1;
            let outcome = self.session.apply_event(&event)?;
            match outcome {
                PathOutcome::Updated => summary.updated += 1,
                PathOutcome::Removed => summary.removed += 1,
                PathOutcome::Skipped => {
                    summary.skipped += 1;
                    continue;
                }
            }
            if self.auto_export {
                match self.session.export() {
                    Ok(report) => {
                        summary.exports += 1;
                        debug!(files = report.written.len(), "auto-export done");
                    }
                    Err(e) => warn!("auto-export failed: {e}"),
                }
            }
        }

        info!(
            processed = summary.processed,
            updated = summary.updated,
            removed = summary.removed,
            exports = summary.exports,
            "update loop stopped"
        );
        Ok(summary)
    }
}
