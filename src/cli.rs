//! Command-line interface implementation for owl.
//! Provides argument parsing and help text formatting using clap.

use crate::config::{default_cache_dir, ConfigFormat, ProjectConfig, TemplateConfig};
use crate::constants::CONFIG_FILE_NAME;
use anyhow::{anyhow, Context};
use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments structure for owl.
#[derive(Parser, Debug)]
#[command(author, version, about = "owl: create projects from templates", long_about = None)]
pub struct Args {
    /// Name of the project directory to create
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Template name, or repository such as github.com/user/template
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Directory to search for local templates. Can be repeated; when several
    /// directories hold the template, the last one wins.
    #[arg(short = 't', long = "templates-dir", value_name = "DIR")]
    pub templates_dirs: Vec<PathBuf>,

    /// Directory where remote templates are cloned
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Format of the template config file
    #[arg(long, value_enum, default_value_t = ConfigFormat::Toml)]
    pub config_format: ConfigFormat,

    /// Base name of the template config file
    #[arg(long, default_value = CONFIG_FILE_NAME)]
    pub config_name: String,

    /// Value available to script templates, as KEY=VALUE. Can be repeated.
    #[arg(short, long = "context", value_name = "KEY=VALUE", value_parser = parse_context_pair)]
    pub context: Vec<(String, serde_json::Value)>,

    /// Clone remote templates with the git executable instead of libgit2
    #[arg(long)]
    pub git_cli: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses `KEY=VALUE`. The value is read as JSON when possible, otherwise it
/// is kept as a string.
pub fn parse_context_pair(s: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid KEY=VALUE: no '=' found in '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("invalid KEY=VALUE: empty key in '{s}'"));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl Args {
    /// Builds the project settings. The project is created in the current
    /// working directory.
    pub fn project_config(&self) -> anyhow::Result<ProjectConfig> {
        let base_dir = std::env::current_dir().context("cannot read the current directory")?;
        Ok(ProjectConfig {
            name: self.name.clone(),
            template: self.template.clone(),
            templates_dirs: self.templates_dirs.clone(),
            verbose: self.verbose,
            cache_dir: self.cache_dir.clone().unwrap_or_else(default_cache_dir),
            base_dir,
            use_git_cli: self.git_cli,
        })
    }

    /// Builds the template settings. The context holds `name` and every
    /// `--context` value.
    pub fn template_config(&self) -> TemplateConfig {
        let mut context = serde_json::Map::new();
        context.insert("name".to_string(), serde_json::Value::String(self.name.clone()));
        for (key, value) in &self.context {
            context.insert(key.clone(), value.clone());
        }

        TemplateConfig {
            path: None,
            format: self.config_format,
            name: self.config_name.clone(),
            context: serde_json::Value::Object(context),
        }
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
