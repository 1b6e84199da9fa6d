//! Filesystem helpers: project-convention detection and source enumeration.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::models::{ProjectKind, ProjectLayout};

pub const SOURCE_EXTENSION: &str = "sol";

const FOUNDRY_MARKERS: &[&str] = &["foundry.toml"];
const HARDHAT_MARKERS: &[&str] = &["hardhat.config.js", "hardhat.config.ts"];

const FOUNDRY_SOURCE_DIRS: &[&str] = &["src", "lib", "test"];
const FOUNDRY_SCRIPT_DIRS: &[&str] = &["script"];
const HARDHAT_SOURCE_DIRS: &[&str] = &["contracts", "test"];
const HARDHAT_SCRIPT_DIRS: &[&str] = &["scripts", "deploy"];
const DEFAULT_SOURCE_DIRS: &[&str] = &["src", "contracts"];
const DEFAULT_SCRIPT_DIRS: &[&str] = &["script", "scripts"];

pub const IMPLICIT_IGNORED_DIRS: &[&str] = &[".git", "node_modules"];

fn owned(dirs: &[&str]) -> Vec<String> {
    dirs.iter().map(|d| d.to_string()).collect()
}

fn has_any_marker(root: &Path, markers: &[&str]) -> bool {
    markers.iter().any(|m| root.join(m).is_file())
}

/// Classify the project by its build-tool marker file. Foundry wins when both
/// markers are present.
pub fn detect_project_layout(root: &Path) -> ProjectLayout {
    let (kind, source_dirs, script_dirs) = if has_any_marker(root, FOUNDRY_MARKERS) {
        (ProjectKind::Foundry, FOUNDRY_SOURCE_DIRS, FOUNDRY_SCRIPT_DIRS)
    } else if has_any_marker(root, HARDHAT_MARKERS) {
        (ProjectKind::Hardhat, HARDHAT_SOURCE_DIRS, HARDHAT_SCRIPT_DIRS)
    } else {
        (ProjectKind::Unknown, DEFAULT_SOURCE_DIRS, DEFAULT_SCRIPT_DIRS)
    };
    debug!(root = %root.display(), kind = %kind, "detected project layout");
    ProjectLayout {
        kind,
        root: root.to_path_buf(),
        source_dirs: owned(source_dirs),
        script_dirs: owned(script_dirs),
    }
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

fn is_ignored_dir(entry: &DirEntry, ignored: &[String]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    IMPLICIT_IGNORED_DIRS.contains(&name.as_ref()) || ignored.iter().any(|d| d == name.as_ref())
}

/// Recursively list source files under `dir`, sorted by file name within each
/// directory. A missing directory yields nothing.
pub fn iter_source_files(dir: &Path, extra_ignored: &[String]) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored_dir(entry, extra_ignored))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                debug!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_source_file(e.path()))
        .map(|e| e.into_path())
        .collect()
}

/// Modification time of `path`, if it can be read.
pub fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

/// True when `path` was modified after `since`, or cannot be stat'ed.
pub fn has_file_changed(path: &Path, since: DateTime<Utc>) -> bool {
    match modified_time(path) {
        Some(mtime) => mtime > since,
        None => true,
    }
}

/// Interpret an environment switch; `0/false/no/off` are false, anything else
/// true.
pub fn parse_env_flag(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    !matches!(v.as_str(), "0" | "false" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "contract X {}").unwrap();
        path
    }

    #[test]
    fn test_detect_foundry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("foundry.toml"), "[profile.default]").unwrap();
        let layout = detect_project_layout(dir.path());
        assert_eq!(layout.kind, ProjectKind::Foundry);
        assert_eq!(layout.source_dirs, vec!["src", "lib", "test"]);
        assert_eq!(layout.script_dirs, vec!["script"]);
    }

    #[test]
    fn test_detect_hardhat_ts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hardhat.config.ts"), "export default {}").unwrap();
        let layout = detect_project_layout(dir.path());
        assert_eq!(layout.kind, ProjectKind::Hardhat);
        assert_eq!(layout.source_dirs, vec!["contracts", "test"]);
    }

    #[test]
    fn test_detect_unknown_fallback() {
        let dir = TempDir::new().unwrap();
        let layout = detect_project_layout(dir.path());
        assert_eq!(layout.kind, ProjectKind::Unknown);
        assert_eq!(layout.source_dirs, vec!["src", "contracts"]);
    }

    #[test]
    fn test_foundry_wins_over_hardhat() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("foundry.toml"), "").unwrap();
        fs::write(dir.path().join("hardhat.config.js"), "").unwrap();
        assert_eq!(detect_project_layout(dir.path()).kind, ProjectKind::Foundry);
    }

    #[test]
    fn test_iter_source_files_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/b/Beta.sol");
        touch(dir.path(), "src/Alpha.sol");
        touch(dir.path(), "src/notes.md");
        touch(dir.path(), "src/node_modules/Dep.sol");
        touch(dir.path(), "src/cache/Skip.sol");

        let files = iter_source_files(&dir.path().join("src"), &["cache".to_string()]);
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["Alpha.sol", "Beta.sol"]);
    }

    #[test]
    fn test_iter_source_files_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(iter_source_files(&dir.path().join("nope"), &[]).is_empty());
    }

    #[test]
    fn test_has_file_changed() {
        let dir = TempDir::new().unwrap();
        let path = touch(dir.path(), "src/A.sol");
        let hour_ago = SystemTime::now() - Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(hour_ago)
            .unwrap();

        let half_hour_ago = Utc::now() - chrono::Duration::minutes(30);
        assert!(!has_file_changed(&path, half_hour_ago));
        assert!(has_file_changed(&path, Utc::now() - chrono::Duration::hours(2)));
        assert!(has_file_changed(&dir.path().join("gone.sol"), half_hour_ago));
    }

    #[test]
    fn test_parse_env_flag() {
        assert!(!parse_env_flag("0"));
        assert!(!parse_env_flag(" Off "));
        assert!(!parse_env_flag("false"));
        assert!(parse_env_flag("1"));
        assert!(parse_env_flag("yes"));
    }
}
