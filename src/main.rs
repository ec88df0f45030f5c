//! owl's main application entry point.
//! Parses the command line, sets up logging and creates the project.

use owl::{
    cli::{get_args, Args},
    error::default_error_handler,
    project::Project,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    // Logger configuration
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Off
        })
        .init();

    if let Err(err) = run(args) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

/// Creates the project described by `args`.
///
/// Engine failures, hook script failures included, end the process with
/// status 1 through the default error handler.
fn run(args: Args) -> anyhow::Result<()> {
    let project = Project::new(args.project_config()?, args.template_config());

    match project.create() {
        Ok(root) => {
            println!("Project created successfully in {}.", root.display());
            Ok(())
        }
        Err(err) => {
            log::error!("{}", err);
            if let Some(root) = project.leftover_root(&err) {
                eprintln!("The partially created project was left at {}.", root.display());
            }
            default_error_handler(err)
        }
    }
}
