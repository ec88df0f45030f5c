//! Hook scripts declared by a template config.
//!
//! Scripts live under `scripts.<phase>.<bucket>.<key>` as lists of command
//! templates. Loading renders every command against the template context and
//! splits the result into an executable and its arguments.

use crate::config::ConfigSource;
use crate::error::{Error, Result};
use crate::renderer::TemplateRenderer;
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use std::fmt;

/// The two hook points of a project creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    /// Runs in the empty project root, before the template is copied.
    OnCreate,
    /// Runs after the template has been copied.
    OnMount,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::OnCreate, Phase::OnMount];

    /// Key of the phase in the config file.
    pub fn key(&self) -> &'static str {
        match self {
            Phase::OnCreate => "oncreate",
            Phase::OnMount => "onmount",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::OnCreate => f.write_str("on create"),
            Phase::OnMount => f.write_str("on mount"),
        }
    }
}

/// OS scope of a group of scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Runs on every OS.
    Universal,
    Linux,
    Macos,
    Windows,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::Universal, Bucket::Linux, Bucket::Macos, Bucket::Windows];

    pub fn key(&self) -> &'static str {
        match self {
            Bucket::Universal => "universal",
            Bucket::Linux => "linux",
            Bucket::Macos => "macos",
            Bucket::Windows => "windows",
        }
    }

    /// The bucket of the running OS, if it has one.
    pub fn current() -> Option<Bucket> {
        if cfg!(target_os = "linux") {
            Some(Bucket::Linux)
        } else if cfg!(target_os = "macos") {
            Some(Bucket::Macos)
        } else if cfg!(target_os = "windows") {
            Some(Bucket::Windows)
        } else {
            None
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A rendered command line ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RenderedCommand {
    /// Splits a rendered command line on whitespace.
    ///
    /// There is no shell quoting: `echo "a b"` yields the arguments `"a` and
    /// `b"`. Returns `None` when the line holds no executable.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self { program, args: parts.collect() })
    }
}

impl fmt::Display for RenderedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Script key to its ordered commands, in config document order.
pub type Scripts = IndexMap<String, Vec<RenderedCommand>>;

/// Scripts of one phase, grouped by bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseScripts {
    pub universal: Scripts,
    pub linux: Scripts,
    pub macos: Scripts,
    pub windows: Scripts,
}

impl PhaseScripts {
    pub fn bucket(&self, bucket: Bucket) -> &Scripts {
        match bucket {
            Bucket::Universal => &self.universal,
            Bucket::Linux => &self.linux,
            Bucket::Macos => &self.macos,
            Bucket::Windows => &self.windows,
        }
    }

    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut Scripts {
        match bucket {
            Bucket::Universal => &mut self.universal,
            Bucket::Linux => &mut self.linux,
            Bucket::Macos => &mut self.macos,
            Bucket::Windows => &mut self.windows,
        }
    }

    pub fn is_empty(&self) -> bool {
        Bucket::ALL.iter().all(|b| self.bucket(*b).is_empty())
    }
}

/// All scripts of a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScriptTable {
    pub on_create: PhaseScripts,
    pub on_mount: PhaseScripts,
}

impl ScriptTable {
    pub fn phase(&self, phase: Phase) -> &PhaseScripts {
        match phase {
            Phase::OnCreate => &self.on_create,
            Phase::OnMount => &self.on_mount,
        }
    }

    pub fn phase_mut(&mut self, phase: Phase) -> &mut PhaseScripts {
        match phase {
            Phase::OnCreate => &mut self.on_create,
            Phase::OnMount => &mut self.on_mount,
        }
    }
}

/// Loads the scripts of every phase and bucket from `config`, rendering the
/// commands against `context`.
///
/// # Errors
/// * `Error::ConfigParseFailed` naming the bucket when a command fails to
///   render or renders to nothing
/// * `Error::ConfigError` when a script entry is not a list of strings
pub fn load_scripts(
    config: &dyn ConfigSource,
    renderer: &dyn TemplateRenderer,
    context: &serde_json::Value,
) -> Result<ScriptTable> {
    let mut table = ScriptTable::default();

    for phase in Phase::ALL {
        for bucket in Bucket::ALL {
            let bucket_key = format!("scripts.{}.{}", phase.key(), bucket.key());
            let scripts = load_bucket(config, renderer, context, &bucket_key, bucket)?;
            debug!("Loaded {} scripts from {}", scripts.len(), bucket_key);
            *table.phase_mut(phase).bucket_mut(bucket) = scripts;
        }
    }

    Ok(table)
}

fn load_bucket(
    config: &dyn ConfigSource,
    renderer: &dyn TemplateRenderer,
    context: &serde_json::Value,
    bucket_key: &str,
    bucket: Bucket,
) -> Result<Scripts> {
    let mut scripts = Scripts::new();

    for (script, raw_commands) in config.get_string_lists_at(bucket_key)? {
        let mut commands = Vec::with_capacity(raw_commands.len());
        for raw in raw_commands {
            let rendered =
                renderer.render(&script, &raw, context).map_err(|e| Error::ConfigParseFailed {
                    bucket: bucket.to_string(),
                    message: e.to_string(),
                })?;
            let command =
                RenderedCommand::parse(&rendered).ok_or_else(|| Error::ConfigParseFailed {
                    bucket: bucket.to_string(),
                    message: format!("command '{raw}' of script '{script}' renders to nothing"),
                })?;
            commands.push(command);
        }
        scripts.insert(script, commands);
    }

    Ok(scripts)
}
