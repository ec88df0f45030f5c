//! Copy of a resolved template into the new project root.
//!
//! Files are copied byte for byte with their permission mode. Entries
//! matched by the `.owlignore` rules in effect, the ignore files themselves,
//! the template config file and the `.git` directory at the template root
//! are never copied.

use crate::constants::{DIR_MODE, GIT_DIR, IGNORE_FILE};
use crate::error::{Error, Result};
use crate::fs::{DirEntry, FileSystem};
use crate::ignore::IgnoreRules;
use log::debug;
use std::io::Write;
use std::path::Path;

/// Creates project directories from template trees.
pub struct Materializer<'a> {
    fs: &'a dyn FileSystem,
    config_file: String,
}

impl<'a> Materializer<'a> {
    /// `config_file` is the template config file name, e.g. `owl_config.toml`.
    pub fn new<S: Into<String>>(fs: &'a dyn FileSystem, config_file: S) -> Self {
        Self { fs, config_file: config_file.into() }
    }

    /// Creates the project root.
    ///
    /// # Errors
    /// * `Error::DirExists` if `path` already exists
    pub fn create_root(&self, path: &Path) -> Result<()> {
        if self.fs.exists(path) {
            return Err(Error::DirExists { path: path.display().to_string() });
        }
        debug!("Creating project folder {}", path.display());
        self.fs.mkdir(path, DIR_MODE)?;
        Ok(())
    }

    /// Copies the template at `source_root` into the existing `dest_root`.
    pub fn copy_template(&self, source_root: &Path, dest_root: &Path) -> Result<()> {
        self.copy_dir(source_root, dest_root, &IgnoreRules::default(), true)
    }

    /// Copies `source` into `destination` depth-first: the files of a
    /// directory are copied before its subdirectories are entered.
    ///
    /// `inherited` holds the ignore rules of the ancestors of `source`.
    pub fn copy_tree(
        &self,
        source: &Path,
        destination: &Path,
        inherited: &IgnoreRules,
    ) -> Result<()> {
        self.copy_dir(source, destination, inherited, false)
    }

    fn copy_dir(
        &self,
        source: &Path,
        destination: &Path,
        inherited: &IgnoreRules,
        is_template_root: bool,
    ) -> Result<()> {
        let entries = self.fs.read_dir(source)?;
        let rules = inherited.merged_with_dir(self.fs, source)?;
        let mut pending_dirs: Vec<&DirEntry> = Vec::new();

        for entry in &entries {
            if self.is_reserved(entry, is_template_root) {
                continue;
            }
            let source_path = source.join(&entry.name);
            if rules.is_match(&source_path) {
                debug!("Skipping {} from {}", source_path.display(), IGNORE_FILE);
                continue;
            }
            if entry.is_dir {
                pending_dirs.push(entry);
                continue;
            }
            self.copy_file(&source_path, &destination.join(&entry.name), entry.mode)?;
        }

        for dir in pending_dirs {
            let destination_dir = destination.join(&dir.name);
            debug!("Creating directory: {}", destination_dir.display());
            self.fs.mkdir(&destination_dir, dir.mode)?;
            self.copy_dir(&source.join(&dir.name), &destination_dir, &rules, false)?;
        }

        Ok(())
    }

    fn is_reserved(&self, entry: &DirEntry, is_template_root: bool) -> bool {
        entry.name == IGNORE_FILE
            || entry.name == self.config_file
            || (is_template_root && entry.is_dir && entry.name == GIT_DIR)
    }

    fn copy_file(&self, source: &Path, destination: &Path, mode: u32) -> Result<()> {
        debug!("Copying file: {}", destination.display());
        let content = self.fs.read_file(source)?;
        let mut file = self.fs.create_file(destination, mode)?;
        file.write_all(&content)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    #[test]
    fn test_git_dir_only_skipped_at_template_root() {
        let fs = MemoryFs::new();
        fs.add_file("/t/base/.git/HEAD", b"ref", 0o644).unwrap();
        fs.add_file("/t/base/vendor/.git/HEAD", b"ref", 0o644).unwrap();
        fs.mkdir_all(Path::new("/out"), 0o755).unwrap();

        let materializer = Materializer::new(&fs, "owl_config.toml");
        materializer.copy_template(Path::new("/t/base"), Path::new("/out")).unwrap();

        assert!(!fs.exists(Path::new("/out/.git")));
        assert!(fs.exists(Path::new("/out/vendor/.git/HEAD")));
    }
}
