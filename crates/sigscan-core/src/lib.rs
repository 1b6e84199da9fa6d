//! sigscan core library: function selectors, event topics, and error
//! selectors for Solidity projects.
//!
//! The crate scans a Foundry, Hardhat, or plain project, extracts every
//! function, event, and custom error declaration with its canonical ABI
//! signature, keeps the result current as files change, and exports it as
//! text, JSON, CSV, or Markdown.
//!
//! ```no_run
//! use sigscan_core::Session;
//!
//! let session = Session::open("path/to/project")?;
//! session.scan();
//! let report = session.export()?;
//! println!("{} files written", report.written.len());
//! # Ok::<(), sigscan_core::SigscanError>(())
//! ```

pub mod config;
pub mod errors;
pub mod export;
pub mod indexer;
pub mod models;
pub mod session;
pub mod watcher;

pub use config::SigscanConfig;
pub use errors::{SigscanError, SigscanResult};
pub use export::{ExportFormat, ExportOptions, ExportReport, Exporter};
pub use indexer::canonical::{canonicalize, event_topic, function_selector, normalize_type};
pub use indexer::pipeline::{IncrementalUpdate, PathOutcome, Scanner};
pub use indexer::symbols::{extract_contract, extract_file};
pub use models::{
    Category, ContractRecord, Parameter, ProjectKind, ProjectSnapshot, ScanStats, SignatureEntry,
    SignatureKind, StateMutability, Visibility,
};
pub use session::Session;
pub use watcher::{change_channel, ChangeEvent, ChangeNotifier, UpdateLoop};
