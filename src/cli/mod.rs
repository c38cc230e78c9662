//! CLI module for ServerGuard
//!
//! Provides:
//! - `serve`: run the HTTP/WebSocket server (default)
//! - `check-config`: print the effective configuration
//! - `check-command`: test a command line against the blocklists

use clap::{Parser, Subcommand};

use crate::server::AppConfig;

pub mod check;

/// ServerGuard CLI
#[derive(Parser, Debug)]
#[command(name = "serverguard")]
#[command(about = "Remote server administration backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve {
        /// Override server.host
        #[arg(long)]
        host: Option<String>,
        /// Override server.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the effective configuration with secrets redacted
    CheckConfig,
    /// Check whether a command line would be rejected
    CheckCommand {
        /// Command line to check
        command: String,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            crate::server::run(config).await
        }
        None => crate::server::run(config).await,
        Some(Commands::CheckConfig) => check::print_config(&config),
        Some(Commands::CheckCommand { command }) => {
            println!("{}", check::describe_command(&command));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["serverguard", "serve", "--host", "0.0.0.0", "--port", "9000"]);
        match cli.command {
            Some(Commands::Serve { host, port }) => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let cli = Cli::parse_from(["serverguard"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::parse_from(["serverguard", "check-command", "rm -rf /"]);
        assert!(matches!(
            cli.command,
            Some(Commands::CheckCommand { command }) if command == "rm -rf /"
        ));
    }
}
