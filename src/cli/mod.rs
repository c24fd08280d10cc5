pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "datecal")]
#[command(about = "datecal CLI - administration for the dating calendar API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Database migrations and health")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },

    #[command(about = "Token balance administration")]
    Tokens {
        #[command(subcommand)]
        cmd: commands::tokens::TokenCommands,
    },

    #[command(about = "Zipcode reference data")]
    Zipcodes {
        #[command(subcommand)]
        cmd: commands::zipcodes::ZipcodeCommands,
    },

    #[command(about = "Development token issuing")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Db { cmd } => commands::db::handle(cmd, output_format).await,
        Commands::Tokens { cmd } => commands::tokens::handle(cmd, output_format).await,
        Commands::Zipcodes { cmd } => commands::zipcodes::handle(cmd, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grant_with_reason() {
        let cli = Cli::try_parse_from(["datecal", "--json", "tokens", "grant", "auth0|1", "25", "--reason", "support"])
            .unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::Tokens {
                cmd: commands::tokens::TokenCommands::Grant { user_id, amount, reason },
            } => {
                assert_eq!(user_id, "auth0|1");
                assert_eq!(amount, 25);
                assert_eq!(reason, "support");
            }
            _ => panic!("expected tokens grant"),
        }
    }

    #[test]
    fn defaults_to_text_output() {
        let cli = Cli::try_parse_from(["datecal", "db", "ping"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Text));
    }
}
