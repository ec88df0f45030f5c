//! Creation of a project from a template.
//!
//! The steps run strictly in order: resolve the template, load its scripts,
//! create the project root, run the on create scripts, copy the template and
//! run the on mount scripts. Failures before the root is created leave
//! nothing behind; later failures leave the partial project on disk.

use std::path::PathBuf;

use log::info;

use crate::config::{ProjectConfig, StructuredConfig, TemplateConfig};
use crate::error::{Error, Result};
use crate::fs::{FileSystem, OsFs};
use crate::hooks::{CommandRunner, ScriptExecutor, SystemCommandRunner};
use crate::loader::{
    Git2Cloner, GitCloner, GitCommandCloner, ResolvedTemplate, TemplateResolver, TemplateSource,
};
use crate::processor::Materializer;
use crate::renderer::{MiniJinjaRenderer, TemplateRenderer};
use crate::scripts::{load_scripts, Bucket, Phase, ScriptTable};

/// A project to be created from a template, with the collaborators used to
/// create it.
pub struct Project {
    config: ProjectConfig,
    template_config: TemplateConfig,
    fs: Box<dyn FileSystem>,
    cloner: Box<dyn GitCloner>,
    renderer: Box<dyn TemplateRenderer>,
    runner: Box<dyn CommandRunner>,
    os_bucket: Option<Bucket>,
}

impl Project {
    /// Creates a project working on the host filesystem.
    pub fn new(config: ProjectConfig, template_config: TemplateConfig) -> Self {
        let cloner: Box<dyn GitCloner> =
            if config.use_git_cli { Box::new(GitCommandCloner) } else { Box::new(Git2Cloner) };

        Self {
            config,
            template_config,
            fs: Box::new(OsFs::new()),
            cloner,
            renderer: Box::new(MiniJinjaRenderer::new()),
            runner: Box::new(SystemCommandRunner),
            os_bucket: Bucket::current(),
        }
    }

    pub fn with_filesystem<F: FileSystem + 'static>(mut self, fs: F) -> Self {
        self.fs = Box::new(fs);
        self
    }

    pub fn with_cloner<C: GitCloner + 'static>(mut self, cloner: C) -> Self {
        self.cloner = Box::new(cloner);
        self
    }

    pub fn with_renderer<R: TemplateRenderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_command_runner<R: CommandRunner + 'static>(mut self, runner: R) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Selects which OS bucket runs next to the universal scripts.
    pub fn with_os_bucket(mut self, os_bucket: Option<Bucket>) -> Self {
        self.os_bucket = os_bucket;
        self
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// The project root left on disk by a failed `create`, if there is one.
    pub fn leftover_root(&self, err: &Error) -> Option<PathBuf> {
        let root = self.config.project_root();
        (!err.is_recoverable() && self.fs.exists(&root)).then_some(root)
    }

    fn step(&self, message: &str) {
        info!("{}", message);
        if self.config.verbose {
            println!("{message}");
        }
    }

    /// Resolves the template and loads its scripts without touching the
    /// project directory.
    pub fn load_template(&self) -> Result<(ResolvedTemplate, ScriptTable)> {
        self.step("Loading template");
        println!(
            "Using template from the {}",
            TemplateSource::from_identifier(&self.config.template)
        );

        let resolver = TemplateResolver::new(
            &*self.fs,
            &*self.cloner,
            &self.config.cache_dir,
            self.template_config.clone(),
        );
        let template = resolver.resolve(&self.config.templates_dirs, &self.config.template)?;

        self.step("Loading scripts");
        let config_file =
            StructuredConfig::load(&*self.fs, &template.config_path(), template.config().format)?;
        let scripts = load_scripts(&config_file, &*self.renderer, &template.config().context)?;

        if self.config.verbose {
            if let Ok(dump) = serde_json::to_string_pretty(&scripts) {
                println!("Scripts: {dump}");
            }
        }

        Ok((template, scripts))
    }

    /// Creates the project and returns its root directory.
    ///
    /// # Errors
    /// * Any resolution or config error, before the root is created
    /// * `Error::DirExists` if the project root already exists
    /// * `Error::ScriptFailed` or I/O errors after the root is created
    pub fn create(&self) -> Result<PathBuf> {
        let (template, scripts) = self.load_template()?;

        let root = self.config.project_root();
        let materializer = Materializer::new(&*self.fs, template.config().file_name());
        self.step("Creating project folder");
        materializer.create_root(&root)?;

        let mut executor =
            ScriptExecutor::new(&*self.runner, &root).with_os_bucket(self.os_bucket);

        self.step("Running on create scripts");
        executor.run(&scripts, Phase::OnCreate)?;

        self.step("Copying template");
        materializer.copy_template(template.path(), &root)?;

        self.step("Running on mount scripts");
        executor.set_working_dir(&root);
        executor.run(&scripts, Phase::OnMount)?;

        Ok(root)
    }
}
