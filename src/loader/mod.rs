//! Template resolution for owl.
//! Finds a template in the local template directories, or clones a remote
//! repository into the cache directory and reuses that clone afterwards.

use crate::config::TemplateConfig;
use crate::constants::DIR_MODE;
use crate::error::{Error, Result};
use crate::fs::{DirEntry, FileSystem};
use log::{debug, info};
use std::path::{Path, PathBuf};

pub mod git;
pub mod local;

pub use git::{GitCloner, GitCommandCloner, Git2Cloner};
pub use local::TemplateMatch;

/// Where a template identifier points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Template name or relative path inside the template directories
    Local(String),
    /// Repository path with the URL scheme removed, e.g. `github.com/acme/tmpl`
    Remote(String),
}

impl std::fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateSource::Local(name) => write!(f, "local templates: '{name}'"),
            TemplateSource::Remote(repo) => write!(f, "remote repository: 'https://{repo}'"),
        }
    }
}

impl TemplateSource {
    /// Classifies a template identifier.
    pub fn from_identifier(identifier: &str) -> Self {
        if git::is_remote(identifier) {
            Self::Remote(git::strip_scheme(identifier))
        } else {
            Self::Local(identifier.to_string())
        }
    }
}

/// A template located on disk. Read-only once resolved.
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    config: TemplateConfig,
    entries: Vec<DirEntry>,
}

impl ResolvedTemplate {
    fn new(mut config: TemplateConfig, found: TemplateMatch) -> Self {
        config.path = Some(found.path);
        Self { config, entries: found.entries }
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Root directory of the template.
    pub fn path(&self) -> &Path {
        self.config.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Path of the template config file.
    pub fn config_path(&self) -> PathBuf {
        self.path().join(self.config.file_name())
    }

    /// Entries at the root of the template.
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }
}

/// Resolves template identifiers to template directories.
pub struct TemplateResolver<'a> {
    fs: &'a dyn FileSystem,
    cloner: &'a dyn GitCloner,
    cache_dir: PathBuf,
    template_config: TemplateConfig,
}

impl<'a> TemplateResolver<'a> {
    pub fn new<P: Into<PathBuf>>(
        fs: &'a dyn FileSystem,
        cloner: &'a dyn GitCloner,
        cache_dir: P,
        template_config: TemplateConfig,
    ) -> Self {
        Self { fs, cloner, cache_dir: cache_dir.into(), template_config }
    }

    /// Resolves `identifier` against `search_dirs`, then against the cache
    /// and the remote repository it names.
    ///
    /// # Errors
    /// * `Error::TemplateNotPassed` if `identifier` is empty
    /// * `Error::TemplateNotFound` if no directory holds the template
    /// * `Error::CloneFailed` if cloning the remote repository fails
    pub fn resolve(&self, search_dirs: &[PathBuf], identifier: &str) -> Result<ResolvedTemplate> {
        if identifier.trim().is_empty() {
            return Err(Error::TemplateNotPassed);
        }
        let config_file = self.template_config.file_name();

        debug!("Searching template {} locally", identifier);
        if let Some(found) = local::search_local(self.fs, search_dirs, identifier, &config_file)? {
            return Ok(ResolvedTemplate::new(self.template_config.clone(), found));
        }

        match TemplateSource::from_identifier(identifier) {
            TemplateSource::Remote(repo) => self.resolve_remote(&repo, &config_file),
            TemplateSource::Local(_) => {
                Err(Error::TemplateNotFound { template: identifier.to_string() })
            }
        }
    }

    fn resolve_remote(&self, repo: &str, config_file: &str) -> Result<ResolvedTemplate> {
        if !self.fs.exists(&self.cache_dir) {
            debug!("Creating cache directory {}", self.cache_dir.display());
            self.fs.mkdir_all(&self.cache_dir, DIR_MODE)?;
        }

        let cache_dirs = [self.cache_dir.clone()];
        if let Some(found) = local::search_local(self.fs, &cache_dirs, repo, config_file)? {
            info!("Using cached template {}", found.path.display());
            return Ok(ResolvedTemplate::new(self.template_config.clone(), found));
        }

        let destination = self.cache_dir.join(repo);
        if let Some(parent) = destination.parent() {
            self.fs.mkdir_all(parent, DIR_MODE)?;
        }
        let url = format!("https://{repo}");
        info!("Cloning {}", url);
        self.cloner.clone_repo(&url, &destination)?;

        local::search_local(self.fs, &cache_dirs, repo, config_file)?
            .map(|found| ResolvedTemplate::new(self.template_config.clone(), found))
            .ok_or_else(|| Error::TemplateNotFound { template: url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_source_display() {
        let local = TemplateSource::from_identifier("base");
        assert_eq!(format!("{}", local), "local templates: 'base'");

        let remote = TemplateSource::from_identifier("https://github.com/acme/tmpl");
        assert_eq!(remote, TemplateSource::Remote("github.com/acme/tmpl".to_string()));
        assert_eq!(format!("{}", remote), "remote repository: 'https://github.com/acme/tmpl'");
    }
}
