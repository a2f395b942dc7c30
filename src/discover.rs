//! Source-file discovery.
//!
//! Walks a project root recursively and classifies regular files into
//! dialects through the parser registry; files with no registered parser are
//! skipped. Output order is the directory-walk order of the underlying
//! filesystem — stable within one run, not guaranteed across platforms.

use std::path::Path;

use walkdir::WalkDir;

use crate::parser::{self, Dialect};

/// A classified source file, relative to the scanned root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Relative path, `/`-normalized for portability.
    pub rel_path: String,
    pub dialect: Dialect,
}

/// Recursively enumerate and classify the source files under `root`.
///
/// Hidden directories are pruned; symlinks are not followed. Unreadable
/// entries are skipped with a warning, never fatal.
pub fn discover<P: AsRef<Path>>(root: P) -> Vec<DiscoveredFile> {
    let root = root.as_ref();
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            // depth 0 is the root itself; never prune it
            let name = e.file_name().to_string_lossy();
            !(e.depth() > 0 && e.file_type().is_dir() && name.starts_with('.'))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                eprintln!("Warning: skipping unreadable entry: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let Some(dialect_parser) = parser::for_extension(ext) else {
            continue;
        };

        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        files.push(DiscoveredFile {
            rel_path: normalize_path(rel),
            dialect: dialect_parser.dialect(),
        });
    }

    files
}

/// Join path components with `/` regardless of platform separator.
pub fn normalize_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
