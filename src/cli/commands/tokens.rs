use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::services::transaction_service::TransactionService;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Run the monthly token reset for every user")]
    Replenish,

    #[command(about = "Grant tokens to a user")]
    Grant {
        #[arg(help = "User id (identity provider subject)")]
        user_id: String,
        #[arg(help = "Number of tokens to add")]
        amount: i32,
        #[arg(long, default_value = "Admin grant", help = "Ledger description")]
        reason: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = TransactionService::new().await?;

    match cmd {
        TokenCommands::Replenish => {
            let summary = service.replenish_all(config().tokens.monthly_amount).await?;
            output_success(
                &output_format,
                &format!(
                    "Replenished {} users ({} failed)",
                    summary.success_count, summary.error_count
                ),
                Some(serde_json::to_value(&summary)?),
            )
        }
        TokenCommands::Grant { user_id, amount, reason } => {
            let change = service.grant(&user_id, amount, &reason).await?;
            output_success(
                &output_format,
                &format!("Granted {} tokens to {} (balance {})", amount, user_id, change.new_token_balance),
                Some(json!({ "newTokenBalance": change.new_token_balance })),
            )
        }
    }
}
