//! The command line interface for the program.
use crate::formulation::{Formulation, build_problem};
use crate::input::load_model;
use crate::log;
use crate::output::{
    create_output_directory, get_output_dir, write_constraint_families, write_objective,
    write_variables,
};
use crate::settings::Settings;
use crate::solver::solve;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod demo;
use demo::DemoSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for commands which write output files
#[derive(Args, Default)]
pub struct OutputOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Whether to write the bounds (and values, if solved) of every variable
    #[arg(long)]
    pub write_variables: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Formulate the problem for a model and summarise its constraint families.
    Build {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Output options. Nothing is written unless an output directory is given.
        #[command(flatten)]
        opts: OutputOpts,
    },
    /// Formulate the problem for a model and solve it with HiGHS.
    Solve {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Output options
        #[command(flatten)]
        opts: OutputOpts,
    },
    /// Validate a model.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
    /// Manage demo models.
    Demo {
        /// The available subcommands for managing demo models.
        #[command(subcommand)]
        subcommand: DemoSubcommands,
    },
    /// Manage the program settings file.
    Settings {
        /// The available subcommands for the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Build { model_dir, opts } => handle_build_command(&model_dir, &opts, None),
            Self::Solve { model_dir, opts } => handle_solve_command(&model_dir, &opts, None),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Demo { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ esform --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided, and apply command-line overrides
fn get_settings(settings: Option<Settings>, opts: &OutputOpts) -> Result<Settings> {
    let mut settings = match settings {
        Some(settings) => settings,
        None => Settings::load().context("Failed to load settings.")?,
    };
    if opts.overwrite {
        settings.overwrite = true;
    }
    if opts.write_variables {
        settings.write_variables = true;
    }

    Ok(settings)
}

/// Create the output directory and start logging.
///
/// Returns the output path, or `None` if nothing is to be written.
fn prepare_output(
    output_path: Option<PathBuf>,
    settings: &Settings,
) -> Result<Option<PathBuf>> {
    let Some(output_path) = output_path else {
        log::init(&settings.log_level, None).context("Failed to initialise logging.")?;
        return Ok(None);
    };

    let overwrite =
        create_output_directory(&output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;
    log::init(&settings.log_level, Some(&output_path))
        .context("Failed to initialise logging.")?;
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    Ok(Some(output_path))
}

/// Load the model and formulate its problem
fn formulate(model_path: &Path) -> Result<Formulation> {
    let model = load_model(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());

    build_problem(&model).context("Failed to formulate problem.")
}

/// Log the number of instances in each constraint family
fn log_summary(formulation: &Formulation) {
    let problem = &formulation.problem;
    for family in problem.iter_families() {
        info!(
            "{}: {} instances, {} skipped",
            family.name,
            family.len(),
            family.skipped
        );
    }
    info!(
        "Problem has {} variables and {} constraints",
        problem.num_variables(),
        problem.num_constraints()
    );
}

/// Handle the `build` command.
pub fn handle_build_command(
    model_path: &Path,
    opts: &OutputOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = get_settings(settings, opts)?;
    let output_path = prepare_output(opts.output_dir.clone(), &settings)?;

    let formulation = formulate(model_path)?;
    log_summary(&formulation);

    if let Some(output_path) = output_path {
        write_constraint_families(&output_path, &formulation.problem)?;
        if settings.write_variables {
            write_variables(&output_path, &formulation.problem, None)?;
        }
    }

    Ok(())
}

/// Handle the `solve` command.
pub fn handle_solve_command(
    model_path: &Path,
    opts: &OutputOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = get_settings(settings, opts)?;
    let output_path = match &opts.output_dir {
        Some(path) => path.clone(),
        None => get_output_dir(model_path)?,
    };
    let output_path = prepare_output(Some(output_path), &settings)?
        .context("No output folder for solve command")?;

    let formulation = formulate(model_path)?;
    log_summary(&formulation);

    let solution = solve(&formulation.problem).context("Failed to solve problem.")?;
    write_constraint_families(&output_path, &formulation.problem)?;
    write_variables(&output_path, &formulation.problem, Some(&solution))?;
    write_objective(&output_path, &solution)?;
    info!("Solved with objective value {}", solution.objective_value);

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = match settings {
        Some(settings) => settings,
        None => Settings::load().context("Failed to load settings.")?,
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(&settings.log_level, None).context("Failed to initialise logging.")?;

    // Formulating checks that the parameters cover every constraint family
    formulate(model_path).context("Failed to validate model.")?;
    info!("Model validation successful!");

    Ok(())
}
