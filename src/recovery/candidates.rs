//! Candidate file discovery

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// A reference file the broken snippet is compared against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub path: PathBuf,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Read the full contents; never cached
    pub fn read(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

/// List files directly inside `dir` whose name ends with `.{extension}`.
///
/// Entries come back in the order the filesystem yields them; no sorting.
pub fn scan_candidates(dir: &Path, extension: &str) -> io::Result<Vec<CandidateFile>> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut candidates = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(into_io_error(e)),
            Err(e) => {
                // Unresolvable entry (dangling symlink, permissions). A matching
                // name still counts so the failure surfaces when it is read.
                let Some(path) = e.path().map(Path::to_path_buf) else {
                    return Err(into_io_error(e));
                };
                let name = file_name(&path);
                if name.ends_with(&suffix) {
                    candidates.push(CandidateFile::new(name, path));
                } else {
                    debug!("Skipping unreadable entry {}: {}", path.display(), e);
                }
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = file_name(entry.path());
        if name.ends_with(&suffix) {
            candidates.push(CandidateFile::new(name, entry.path()));
        }
    }

    Ok(candidates)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn into_io_error(err: walkdir::Error) -> io::Error {
    let message = err.to_string();
    err.into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message))
}
