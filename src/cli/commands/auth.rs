use clap::Subcommand;
use serde_json::{json, Value};

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::is_development;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Issue an HS256 token for a user id (development and tests)")]
    Token {
        #[arg(help = "Subject (user id)")]
        sub: String,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Token { sub } => {
            if !is_development!() {
                tracing::warn!("Issuing a shared-secret token outside development");
            }

            let mut claims = Claims::new(sub.clone());
            claims.aud = config().security.auth0_audience.clone().map(Value::String);
            let token = generate_jwt(claims)?;

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    &format!("Token issued for {}", sub),
                    Some(json!({ "token": token })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
    }
}
