//! Common constants used throughout owl.

/// Base name of the template config file (`owl_config.<ext>`).
pub const CONFIG_FILE_NAME: &str = "owl_config";

/// owl's ignore file name
pub const IGNORE_FILE: &str = ".owlignore";

/// Version-control directory skipped at the template root.
pub const GIT_DIR: &str = ".git";

/// Mode used for the project root and the template cache directory.
pub const DIR_MODE: u32 = 0o755;

/// Directory name of the template cache under the system temp directory.
pub const CACHE_DIR_NAME: &str = "owl";
