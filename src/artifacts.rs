//! Removal of generated build artifacts.
//!
//! `clean` is idempotent and never aborts half-way: an entry that cannot be
//! removed is logged and recorded, and the sweep moves on.
use crate::paths::ArtifactPaths;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// An entry `clean` could not remove.
#[derive(Debug)]
pub struct CleanFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

/// What a `clean` run did.
#[derive(Debug, Default)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<CleanFailure>,
}

impl CleanReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, paths: &ArtifactPaths, path: PathBuf, outcome: io::Result<()>) {
        match outcome {
            Ok(()) => self.removed.push(path),
            Err(error) => {
                tracing::debug!(path = %paths.display(&path), %error, "failed to delete");
                println!("Failed to delete {}: {error}", paths.display(&path));
                self.failures.push(CleanFailure { path, error });
            }
        }
    }
}

/// Remove every generated artifact under the project root.
///
/// The coverage working directory itself survives and keeps its placeholder
/// entry; everything else inside it is removed.
pub fn clean(paths: &ArtifactPaths) -> CleanReport {
    println!("--- Cleaning ---");
    let mut report = CleanReport::default();

    for file in paths.clean_files() {
        if !exists(&file) {
            continue;
        }
        let outcome = fs::remove_file(&file);
        if outcome.is_ok() {
            println!("Removed {}", paths.display(&file));
        }
        report.record(paths, file, outcome);
    }

    for dir in paths.clean_dirs() {
        if !dir.is_dir() {
            continue;
        }
        let outcome = fs::remove_dir_all(&dir);
        if outcome.is_ok() {
            println!("Removed directory {}", paths.display(&dir));
        }
        report.record(paths, dir, outcome);
    }

    empty_workdir(paths, &mut report);
    report
}

fn empty_workdir(paths: &ArtifactPaths, report: &mut CleanReport) {
    let workdir = paths.coverage_workdir();
    if !workdir.is_dir() {
        return;
    }
    let placeholder = paths.placeholder_name();
    println!(
        "Cleaning {} (preserving {placeholder})...",
        paths.display(&workdir)
    );
    let entries = match fs::read_dir(&workdir) {
        Ok(entries) => entries,
        Err(error) => {
            report.record(paths, workdir, Err(error));
            return;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                report.record(paths, workdir.clone(), Err(error));
                continue;
            }
        };
        if entry.file_name() == placeholder {
            continue;
        }
        let path = entry.path();
        let outcome = remove_entry(&path);
        report.record(paths, path, outcome);
    }
}

fn remove_entry(path: &Path) -> io::Result<()> {
    let file_type = fs::symlink_metadata(path)?.file_type();
    if file_type.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// True for anything present at `path`, including dangling symlinks.
fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
