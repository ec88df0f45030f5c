//! Lookup of templates inside local directories.

use crate::error::{Error, Result};
use crate::fs::{DirEntry, FileSystem};
use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};

/// A template directory found on disk, with its top-level listing.
#[derive(Debug, Clone)]
pub struct TemplateMatch {
    pub path: PathBuf,
    pub entries: Vec<DirEntry>,
}

/// Looks for a subdirectory `name` of `dir` holding `config_file`.
///
/// A missing `dir` is not an error.
pub fn search_template_on_dir(
    fs: &dyn FileSystem,
    dir: &Path,
    name: &str,
    config_file: &str,
) -> Result<Option<TemplateMatch>> {
    let listing = match fs.read_dir(dir) {
        Ok(listing) => listing,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Templates directory {} does not exist", dir.display());
            return Ok(None);
        }
        Err(e) => return Err(Error::IoError(e)),
    };

    let mut found = None;
    for entry in listing.iter().filter(|entry| entry.is_dir && entry.name == name) {
        let path = dir.join(&entry.name);
        let entries = fs.read_dir(&path)?;
        if entries.iter().any(|e| !e.is_dir && e.name == config_file) {
            debug!("Found template at {}", path.display());
            found = Some(TemplateMatch { path, entries });
        } else {
            warn!("Skipping {}: no {} inside", path.display(), config_file);
        }
    }

    Ok(found)
}

/// Searches every directory of `dirs` for the template `identifier`.
///
/// `identifier` may contain path separators, in which case its parent part is
/// joined with each search directory. Every directory is scanned and the last
/// match wins.
pub fn search_local(
    fs: &dyn FileSystem,
    dirs: &[PathBuf],
    identifier: &str,
    config_file: &str,
) -> Result<Option<TemplateMatch>> {
    let identifier = Path::new(identifier);
    let Some(base) = identifier.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Ok(None);
    };
    let parent = identifier.parent().unwrap_or_else(|| Path::new(""));

    let mut found = None;
    for dir in dirs {
        let dir = dir.join(parent);
        if let Some(template) = search_template_on_dir(fs, &dir, &base, config_file)? {
            found = Some(template);
        }
    }

    Ok(found)
}
