use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

pub fn ensure_output_dir_does_not_exist(out_dir: &Path) -> anyhow::Result<()> {
    if out_dir.exists() {
        anyhow::bail!("output directory already exists: {}", out_dir.display());
    }
    Ok(())
}

/// Write `contents` to `path`, creating parent directories.
///
/// The data goes to a temporary file next to `path` first and is renamed into place, so the
/// target is either fully written or untouched.
pub fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("create parent dir: {}", parent_dir.display()))?;

    let mut file = tempfile::NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("create temp file in: {}", parent_dir.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("flush: {}", path.display()))?;
    file.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("persist: {}", path.display()))?;

    Ok(())
}

pub fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read: {}", path.display()))
}
