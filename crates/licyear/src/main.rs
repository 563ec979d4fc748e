use clap::Parser;
use licyear_lib::commands;
use licyear_lib::commands::app::AppError;
use licyear_lib::config::{Config, DEFAULT_LICENSE_PATH, Settings};
use licyear_lib::infrastructure::GITHUB_API_BASE;
use log::{LevelFilter, debug};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the licyear CLI binary
#[derive(Debug, Error)]
enum CliError {
    /// The `.env` file exists but could not be loaded.
    #[error("failed to load .env file")]
    DotEnv(#[source] dotenvy::Error),

    /// Command orchestration failed.
    #[error(transparent)]
    App(#[from] AppError),
}

#[derive(Parser)]
#[command(name = "licyear")]
#[command(
    about = "Refresh the copyright year of the LICENSE file in every repository of a Github account",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Github account whose repositories are processed
    #[arg(value_name = "ACCOUNT")]
    account: String,

    /// Path of the license file inside each repository
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LICENSE_PATH)]
    file: String,

    /// Directory for transient clones [default: <system temp>/licyear]
    #[arg(long, value_name = "DIR")]
    clone_root: Option<PathBuf>,

    /// Root URL of the Github REST API
    #[arg(long, value_name = "URL", env = "LICYEAR_API_URL", default_value = GITHUB_API_BASE)]
    api_url: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), CliError> {
    // Read `.env` before parsing so it can provide LICYEAR_API_URL
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    init_logging(&cli);
    check_dotenv(dotenv)?;

    let mut config = Config::new(&cli.account, Settings::from_env())
        .with_license_path(&cli.file)
        .with_api_base(&cli.api_url);
    if let Some(root) = cli.clone_root {
        config = config.with_clone_root(root);
    }

    commands::app::refresh(&config)?;
    Ok(())
}

/// A missing `.env` file is not an error
fn check_dotenv(result: Result<PathBuf, dotenvy::Error>) -> Result<(), CliError> {
    match result {
        Ok(path) => {
            debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(CliError::DotEnv(e)),
    }
}

/// Initialize logging based on the verbosity level specified in the CLI
fn init_logging(cli: &Cli) {
    let mut builder = env_logger::builder();
    builder
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .format(|buf, record| {
            let level = record.level();
            let style = &buf.default_level_style(level);
            writeln!(buf, "[{style}{level}{style:#}] {}", record.args())
        });

    if !cli.verbose {
        builder.format_timestamp(None);
    }

    builder.init();
}
