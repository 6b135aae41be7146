use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shuxin_client::{DecisionClient, spawn_worker};
use shuxin_core::{EmotionalState, ProblemCategory};
use tracing::info;

mod app;
mod ask;
mod config;
mod logging;
mod state;
mod tui;

use logging::LogTarget;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SHUXIN_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "shuxin", version = VERSION, about = "舒心助手: talk a worry through, one small step at a time")]
struct Cli {
    /// Decision service base URL (overrides SHUXIN_API_BASE and config.toml)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full-screen guided intake (default)
    Wizard,

    /// Send one problem without the wizard and print the cards
    Ask {
        /// Emotional state: 1-4 or the exact label
        #[arg(long, value_parser = ask::parse_state)]
        state: Option<EmotionalState>,

        /// Problem category: 1-4 or the exact label
        #[arg(long, value_parser = ask::parse_category)]
        category: Option<ProblemCategory>,

        /// What happened, in your own words
        #[arg(long)]
        text: String,

        /// Print the outcome as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Inspect or create ~/.shuxin/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,

    /// Print the effective settings after overrides
    Show,

    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let flag = cli.api_base.as_deref();

    match cli.command.unwrap_or(Command::Wizard) {
        Command::Wizard => {
            let resolved = config::resolve_from_env(flag)?;
            let _guard =
                logging::init_logging(&resolved.log_level, LogTarget::File(resolved.log_dir.clone()))?;
            info!(api_base = %resolved.api_base, timeout = ?resolved.timeout, "starting wizard");

            let client = DecisionClient::new(&resolved.api_base, resolved.timeout)?;
            let (jobs, events) = spawn_worker(client);

            tokio::task::spawn_blocking(move || tui::run_wizard(jobs, events))
                .await
                .context("wizard task panicked")??;
            info!("wizard closed");
        }

        Command::Ask {
            state,
            category,
            text,
            json,
        } => {
            let resolved = config::resolve_from_env(flag)?;
            let _guard = logging::init_logging(&resolved.log_level, LogTarget::Stderr)?;
            let client = DecisionClient::new(&resolved.api_base, resolved.timeout)?;
            ask::run_ask(&client, state, category, &text, json).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let resolved = config::resolve_from_env(flag)?;
                match config::config_path() {
                    Ok(p) => println!("config file: {}", p.display()),
                    Err(_) => println!("config file: (none, HOME is not set)"),
                }
                println!("api base:    {}", resolved.api_base);
                println!("endpoint:    {}", shuxin_client::decision_url(&resolved.api_base));
                println!("timeout:     {}s", resolved.timeout.as_secs());
                println!("log level:   {}", resolved.log_level);
                println!("log dir:     {}", resolved.log_dir.display());
            }
            ConfigCommand::Path => println!("{}", config::config_path()?.display()),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_carries_build_sha() {
        let sha = env!("SHUXIN_BUILD_SHA");
        assert!(!sha.is_empty());
        assert_eq!(VERSION, format!("{} ({sha})", env!("CARGO_PKG_VERSION")));
        assert!(Cli::command().render_version().contains(VERSION));
    }

    #[test]
    fn test_no_subcommand_means_wizard() {
        let cli = Cli::try_parse_from(["shuxin", "--api-base", "http://127.0.0.1:9"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.api_base.as_deref(), Some("http://127.0.0.1:9"));
    }
}
