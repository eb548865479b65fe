//! Large file survey of a working tree.
//!
//! Walks every regular file under a root, skipping `.git` directories,
//! and records the total size plus any file strictly larger than the
//! threshold. Entries that cannot be read or stat'ed are skipped: the survey
//! is advisory and never fails.

use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::git::state::GIT_METADATA;
use crate::types::{FileSurvey, LargeFile};

/// Files strictly larger than this are flagged (100 MiB).
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Survey `root` on the current thread.
pub fn scan_tree(root: &Path, threshold: u64) -> FileSurvey {
    let mut survey = FileSurvey::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == GIT_METADATA));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => {
                debug!(path = %entry.path().display(), error = %err, "skipping file");
                continue;
            }
        };

        survey.total_size_bytes = survey.total_size_bytes.saturating_add(size);
        if size > threshold {
            survey.large_files.push(LargeFile {
                path: entry.into_path(),
                size_bytes: size,
            });
        }
    }

    debug!(
        root = %root.display(),
        total = survey.total_size_bytes,
        large = survey.large_files.len(),
        "survey complete"
    );
    survey
}

/// Survey `root` on a blocking worker, delivering the result as a task.
pub fn spawn_scan(root: PathBuf, threshold: u64) -> JoinHandle<FileSurvey> {
    tokio::task::spawn_blocking(move || scan_tree(&root, threshold))
}

/// Await a survey task, treating a crashed worker as "no survey".
pub async fn join_scan(handle: JoinHandle<FileSurvey>) -> Option<FileSurvey> {
    match handle.await {
        Ok(survey) => Some(survey),
        Err(err) => {
            warn!(error = %err, "file survey worker failed");
            None
        }
    }
}

/// Human-readable size, e.g. `150.0 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sized_file(path: &Path, len: u64) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create_dir_all should succeed");
        }
        let file = fs::File::create(path).expect("create should succeed");
        file.set_len(len).expect("set_len should succeed");
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        sized_file(&tmp.path().join("exact.bin"), LARGE_FILE_THRESHOLD);
        sized_file(&tmp.path().join("over.bin"), LARGE_FILE_THRESHOLD + 1);

        let survey = scan_tree(tmp.path(), LARGE_FILE_THRESHOLD);
        assert_eq!(survey.large_files.len(), 1);
        assert_eq!(survey.large_files[0].path, tmp.path().join("over.bin"));
        assert_eq!(survey.large_files[0].size_bytes, LARGE_FILE_THRESHOLD + 1);
        assert_eq!(survey.total_size_bytes, 2 * LARGE_FILE_THRESHOLD + 1);
    }

    #[test]
    fn git_directory_is_skipped() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        sized_file(&tmp.path().join(".git").join("objects").join("pack"), 50);
        sized_file(&tmp.path().join("src").join("main.rs"), 10);

        let survey = scan_tree(tmp.path(), 20);
        assert_eq!(survey.total_size_bytes, 10);
        assert!(survey.large_files.is_empty());
    }

    #[test]
    fn nested_files_are_ordered_by_walk() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        sized_file(&tmp.path().join("b").join("big.iso"), 30);
        sized_file(&tmp.path().join("a.zip"), 40);

        let survey = scan_tree(tmp.path(), 20);
        let paths: Vec<_> = survey.large_files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![tmp.path().join("a.zip"), tmp.path().join("b").join("big.iso")]
        );
    }

    #[test]
    fn missing_root_yields_empty_survey() {
        let survey = scan_tree(Path::new("/nonexistent/path/for/scan"), 1);
        assert_eq!(survey, FileSurvey::default());
    }

    #[tokio::test]
    async fn spawned_scan_delivers_result() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        sized_file(&tmp.path().join("data.db"), 5);

        let survey = join_scan(spawn_scan(tmp.path().to_path_buf(), 1)).await;
        assert_eq!(survey.map(|s| s.total_size_bytes), Some(5));
    }

    #[test]
    fn formats_sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(150 * 1024 * 1024), "150.0 MB");
    }
}
