use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// The listing goes next to the compiled source, same stem, `.ll` extension.
pub fn ll_path_for(source: &Path) -> PathBuf {
    source.with_extension("ll")
}

pub fn write_next_to_source(source: &Path, contents: &str) -> Result<PathBuf> {
    let path = ll_path_for(source);
    fs::write(&path, contents)
        .with_context(|| format!("Failed to write IR listing to {}", path.display()))?;
    Ok(path)
}
