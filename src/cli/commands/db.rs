use clap::Subcommand;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::database::manager::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply embedded schema migrations")]
    Migrate,

    #[command(about = "Check that the database is reachable")]
    Ping,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DbCommands::Migrate => {
            DatabaseManager::migrate().await?;
            output_success(&output_format, "Migrations applied", None)
        }
        DbCommands::Ping => match DatabaseManager::health_check().await {
            Ok(()) => output_success(&output_format, "Database is reachable", None),
            Err(e) => {
                output_error(&output_format, &e.to_string(), Some("DATABASE_UNAVAILABLE"))?;
                Err(e.into())
            }
        },
    }
}
