//! Cloning of remote templates.

use crate::error::{Error, Result};
use log::debug;
use regex::Regex;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use url::Url;

/// Clones a repository into a local directory.
pub trait GitCloner {
    /// Clones `url` into `destination`.
    ///
    /// # Errors
    /// * `Error::CloneFailed` carrying the clone's own error message
    fn clone_repo(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Clones through libgit2.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Cloner;

impl GitCloner for Git2Cloner {
    fn clone_repo(&self, url: &str, destination: &Path) -> Result<()> {
        debug!("Cloning '{}' to '{}' with libgit2.", url, destination.display());

        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(git2::FetchOptions::new());

        builder.clone(url, destination).map(|_| ()).map_err(|e| Error::CloneFailed {
            url: url.to_string(),
            message: e.message().to_string(),
        })
    }
}

/// Clones by running the `git` executable. Its stderr becomes the error
/// message on failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCommandCloner;

impl GitCloner for GitCommandCloner {
    fn clone_repo(&self, url: &str, destination: &Path) -> Result<()> {
        debug!("Cloning '{}' to '{}' with git.", url, destination.display());

        let child = Command::new("git")
            .arg("clone")
            .arg(url)
            .arg(destination)
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::CloneFailed { url: url.to_string(), message: e.to_string() })?;

        let output = child
            .wait_with_output()
            .map_err(|e| Error::CloneFailed { url: url.to_string(), message: e.to_string() })?;

        if !output.status.success() {
            return Err(Error::CloneFailed {
                url: url.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

fn scheme_regex() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| Regex::new(r"^https?://").expect("valid scheme regex"))
}

/// Removes a leading `http://` or `https://` and any trailing slash.
pub fn strip_scheme(identifier: &str) -> String {
    scheme_regex().replace(identifier, "").trim_end_matches('/').to_string()
}

/// Returns true if `identifier` names a remote repository: an http(s) URL or
/// a host-qualified path such as `github.com/acme/tmpl`.
pub fn is_remote(identifier: &str) -> bool {
    if let Ok(url) = Url::parse(identifier) {
        return matches!(url.scheme(), "http" | "https");
    }

    match identifier.split_once('/') {
        Some((host, rest)) => {
            !host.starts_with('.') && host.contains('.') && !rest.trim_matches('/').is_empty()
        }
        None => false,
    }
}
