use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use argocheck::{logging, validation, CheckOptions, OsFs, RepositoryWalker};

#[derive(Parser)]
#[command(name = "argocheck", version)]
#[command(about = "Checks the Argo CD configuration of a GitOps repository", long_about = None)]
struct Cli {
    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that Applications point at valid components and that components are clean and build.
    CheckConfig {
        /// Base directory of the repository.
        #[arg(long, env = "ARGOCHECK_BASE_DIR", default_value = ".")]
        base_dir: PathBuf,

        /// Path(s) to the applications (comma-separated, relative to --base-dir).
        #[arg(long, value_delimiter = ',', required = true)]
        apps: Vec<String>,

        /// Path(s) to the components (comma-separated, relative to --base-dir).
        #[arg(long, value_delimiter = ',', required = true)]
        components: Vec<String>,

        /// Program used to build components.
        #[arg(long, env = "ARGOCHECK_KUSTOMIZE", default_value = "kustomize")]
        kustomize: String,

        /// Only check references, do not build components.
        #[arg(long)]
        skip_build: bool,
    },

    /// List the Applications and ApplicationSets in a directory.
    ListApplications {
        /// Path to the Applications and ApplicationSets.
        #[arg(short, long)]
        apps: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match cli.cmd {
        Commands::CheckConfig {
            base_dir,
            apps,
            components,
            kustomize,
            skip_build,
        } => {
            let options = CheckOptions::new(base_dir)
                .with_apps(apps)
                .with_components(components)
                .with_kustomize(kustomize)
                .with_skip_build(skip_build);

            log::info!(
                "Checking Argo CD configuration in {}",
                options.base_dir.display()
            );
            match validation::run(&OsFs, &options) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    log::error!("{}", e.operator_message());
                    ExitCode::FAILURE
                }
            }
        }
        Commands::ListApplications { apps } => {
            match RepositoryWalker::new(&OsFs).lookup_applications(&apps) {
                Ok(found) => {
                    log::info!("Applications:    {}", found.application_names());
                    log::info!("ApplicationSets: {}", found.application_set_names());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    log::error!("{}", e.operator_message());
                    ExitCode::FAILURE
                }
            }
        }
    }
}
