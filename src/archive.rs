//! Moving processed originals into an `originals/` folder.
//!
//! An existing file is never overwritten. On a name collision the first free
//! `name_N.ext` (N = 1, 2, …) is used instead.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Pick a destination inside `dir` for `file_name` that does not exist yet.
///
/// Only the last `.` separates the extension: `a.b.jpg` → `a.b_1.jpg`.
/// Names without an extension get a plain suffix: `README` → `README_1`.
/// Fails with `AlreadyExists` once every suffix is taken.
pub fn unique_destination(dir: &Path, file_name: &str) -> io::Result<PathBuf> {
    unique_destination_within(dir, file_name, u32::MAX)
}

fn unique_destination_within(dir: &Path, file_name: &str, max_suffix: u32) -> io::Result<PathBuf> {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return Ok(candidate);
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };

    (1..=max_suffix)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem}_{n}.{ext}")),
            None => dir.join(format!("{stem}_{n}")),
        })
        .find(|p| !p.exists())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("no free name for {file_name} in {}", dir.display()),
            )
        })
}

/// Move `source` into `originals_dir`, returning where it ended up.
///
/// Creates the directory if needed. Falls back to copy + remove when a plain
/// rename fails (e.g. across filesystems).
pub fn archive_original(source: &Path, originals_dir: &Path) -> io::Result<PathBuf> {
    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("source has no usable file name: {}", source.display()),
            )
        })?;

    fs::create_dir_all(originals_dir)?;
    let dest = unique_destination(originals_dir, file_name)?;
    if dest.file_name().and_then(|n| n.to_str()) != Some(file_name) {
        log::info!(
            "{} already archived, using {}",
            file_name,
            dest.display()
        );
    }

    if let Err(rename_err) = fs::rename(source, &dest) {
        log::debug!(
            "rename {} -> {} failed ({rename_err}), copying instead",
            source.display(),
            dest.display()
        );
        fs::copy(source, &dest)?;
        fs::remove_file(source)?;
    }
    Ok(dest)
}
