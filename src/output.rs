//! Writing generated Markdown to the output directory.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

/// Write `content` to `<dir>/<stem>.md`, creating `dir` if needed.
///
/// The file is written to a temporary sibling first and renamed into place,
/// so an interrupted write never leaves a partial report. An existing file
/// with the same name is replaced.
pub fn write_markdown(dir: &Path, stem: &str, content: &str) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(format!("{}.md", stem));

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    file.persist(&target).map_err(|e| e.error)?;

    debug!("Wrote {} bytes to {}", content.len(), target.display());
    Ok(target)
}
