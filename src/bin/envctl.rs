use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use serde_json::Value;

use multienv::http::PropagateEnvironment;

#[derive(Parser)]
#[command(name = "envctl")]
#[command(about = "Query a running multienv server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Environment to scope requests to (server default when omitted)
    #[arg(short, long)]
    environment: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server status
    Status,
    /// List configured environments
    Environments,
    /// Show configuration for an environment
    Config {
        /// Environment to look up by path instead of by selector
        name: Option<String>,
    },
    /// Show the guest domain
    Domain,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let path = match &cli.command {
        Commands::Status => "/health".to_string(),
        Commands::Environments => "/environments".to_string(),
        Commands::Config { name: Some(name) } => format!("/config/{name}"),
        Commands::Config { name: None } => "/config".to_string(),
        Commands::Domain => "/config/domain".to_string(),
    };

    let res = client
        .get(format!("{}{}", cli.url, path))
        .propagate_environment(cli.environment.as_deref())
        .send()
        .await?;
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(status_error(status, &text).into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Error reported for a non-success answer, carrying the server's message.
fn status_error(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string());
    if message.is_empty() {
        format!("server returned status {status}")
    } else {
        format!("server returned status {status}: {message}")
    }
}
