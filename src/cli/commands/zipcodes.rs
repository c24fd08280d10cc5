use clap::Subcommand;
use serde_json::json;
use std::fs::File;
use std::path::PathBuf;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::manager::DatabaseManager;
use crate::services::zipcode_service;

#[derive(Subcommand)]
pub enum ZipcodeCommands {
    #[command(about = "Load zipcode,latitude,longitude rows from a CSV file")]
    Import {
        #[arg(help = "CSV file with a header row")]
        path: PathBuf,
    },
}

pub async fn handle(cmd: ZipcodeCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ZipcodeCommands::Import { path } => {
            let file = File::open(&path).map_err(|e| anyhow::anyhow!("cannot open {}: {}", path.display(), e))?;
            let (records, skipped) = zipcode_service::parse_csv(file);
            if skipped > 0 {
                tracing::warn!("Skipped {} invalid rows in {}", skipped, path.display());
            }

            let pool = DatabaseManager::main_pool().await?;
            let imported = zipcode_service::import(&pool, &records).await?;
            output_success(
                &output_format,
                &format!("Imported {} zipcodes ({} skipped)", imported, skipped),
                Some(json!({ "imported": imported, "skipped": skipped })),
            )
        }
    }
}
