use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Platform data directory for keygate, created if missing.
///
/// Linux: `~/.local/share/keygate`, macOS: `~/Library/Application Support/keygate`.
pub fn data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "keygate")
        .context("could not determine a home directory for the data dir")?;
    let dir = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create data dir {}", dir.display()))?;
    Ok(dir)
}
