//! Filesystem helpers: tree survey and starter ignore file.

pub mod gitignore;
pub mod scan;

pub use gitignore::ensure_starter_gitignore;
pub use scan::{LARGE_FILE_THRESHOLD, format_size, join_scan, scan_tree, spawn_scan};
