//! Starter `.gitignore` for freshly initialized projects.

use std::path::Path;

use crate::error::{Result, SyncError};

const NOISE: &str = "\
# Python
__pycache__/
*.py[cod]

# IDE
.vscode/
.idea/

# OS
.DS_Store
Thumbs.db
";

/// Write a `.gitignore` listing `local_config` plus common noise.
///
/// Returns `false` without touching anything when the file already exists.
pub fn ensure_starter_gitignore(root: &Path, local_config: &[&str]) -> Result<bool> {
    let path = root.join(".gitignore");
    if path.exists() {
        return Ok(false);
    }

    let mut content = String::from("# hubsync local configuration\n");
    for entry in local_config {
        content.push_str(entry);
        content.push('\n');
    }
    content.push('\n');
    content.push_str(NOISE);

    std::fs::write(&path, content).map_err(|err| SyncError::io(&path, err))?;
    Ok(true)
}
