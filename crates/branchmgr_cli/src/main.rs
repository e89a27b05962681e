use branchmgr_cli::{
    commands::{
        protect_cmd::{self, ProtectArgs},
        protection_cmd::{self, ProtectionArgs},
    },
    config::AppConfig,
    credentials::load_token,
    errors::Error,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use github_client::{create_token_client, GitHubClient};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// branchmgr CLI: Inspect and apply GitHub branch protection
#[derive(Parser, Debug)]
#[command(name = "branchmgr")]
#[command(about = "Inspect and apply GitHub branch protection", long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./branchmgr.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report whether a branch requires pull request review
    Protection(ProtectionArgs),

    /// Apply a protection policy to one or more branches
    Protect(ProtectArgs),

    /// Show the CLI version
    Version,
}

/// Loads the configuration and builds an authenticated client from it.
fn connect(config_path: Option<&str>) -> Result<(AppConfig, GitHubClient), Error> {
    let config = AppConfig::load_or_default(config_path)?;
    let token = load_token()?;
    let client = create_token_client(&token, &config.client_settings())?;
    Ok((config, client))
}

async fn run(cli: &Cli) -> Result<(), Error> {
    match &cli.command {
        Commands::Protection(args) => {
            let (_, client) = connect(cli.config.as_deref())?;
            let line = protection_cmd::execute(args, &client).await?;
            println!("{line}");
            Ok(())
        }
        Commands::Protect(args) => {
            let (config, client) = connect(cli.config.as_deref())?;
            let report = protect_cmd::execute(args, &config, &client).await?;
            for line in report.lines() {
                println!("{line}");
            }

            let protected = report.into_result()?;
            info!(protected, "All branches protected");
            Ok(())
        }
        Commands::Version => {
            println!("branchmgr version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Logs go to stderr so stdout only carries command output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("BRANCHMGR_LOG"))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli).await {
        error!("Error: {e}");
        eprintln!("{} {e}", "Error:".red());
        std::process::exit(e.exit_code());
    }
}
