//! owl creates new projects from directory templates.
//! A template is a directory tree plus a config file declaring hook scripts
//! that run before and after the tree is copied into the new project.

/// Command-line interface module for the owl application
pub mod cli;

/// Project and template settings, and the template config file reader
/// Supports TOML, YAML and JSON (owl_config.toml, owl_config.yaml, owl_config.json)
pub mod config;

/// Common constants
pub mod constants;

/// Error types and handling for the owl application
pub mod error;

/// Filesystem capability shared by the resolver and the materializer
pub mod fs;

/// On create and on mount hook script execution
pub mod hooks;

/// File and directory ignore patterns
/// Processes .owlignore files to exclude specific paths
pub mod ignore;

/// Local and remote template resolution
pub mod loader;

/// Copy of a template tree into the project root
pub mod processor;

/// Orchestration of a project creation
pub mod project;

/// Text templating of script commands
pub mod renderer;

/// Hook scripts declared by the template config
pub mod scripts;
