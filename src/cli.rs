//! Command-line interface for incubator.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments structure for incubator.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "incubator: scaffold projects from templates",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new project directory from a template
    New(NewArgs),

    /// Scaffold a template into an existing directory without overwriting files
    Init(InitArgs),

    /// List available templates
    List,

    /// Fetch or update the configured template repositories
    Update,

    /// Create a starter local template
    CreateTemplate {
        /// Name of the template (letters, numbers, dashes and underscores)
        name: String,
    },

    /// Add a template repository (owner/repo or git URL)
    AddRepo { repo: String },

    /// Remove a previously added template repository
    RemoveRepo { repo: String },

    /// Print the current configuration
    Config {
        /// Edit the settings interactively and save them
        #[arg(short, long)]
        edit: bool,
    },
}

/// Options shared by `new` and `init`.
#[derive(clap::Args, Debug, Default)]
pub struct TemplateArgs {
    /// Name of the template to use
    #[arg(short, long)]
    pub template: Option<String>,

    /// Read answers as a JSON object from stdin
    #[arg(short, long)]
    pub stdin: bool,

    /// Accept defaults and skip confirmation prompts
    #[arg(short, long)]
    pub yes: bool,

    /// Do not run the template's post-create hook
    #[arg(long)]
    pub skip_hooks: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub template: TemplateArgs,

    /// Parent directory of the new project (defaults to the configured project_dir)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the files that would be created and exit
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    #[command(flatten)]
    pub template: TemplateArgs,

    /// Directory to scaffold into
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 and the help text if no subcommand is given
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if matches!(
                e.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::MissingSubcommand
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
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
