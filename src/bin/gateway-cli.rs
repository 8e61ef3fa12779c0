use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the API gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// Show route table sizes and resolver hit counters
    Routes,
    /// Probe every backend service through the gateway
    Health,
    /// Resolve a path without forwarding it
    Resolve {
        /// Inbound path, e.g. /api/devis/12/
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match &cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)).headers(headers),
        Commands::Routes => client.get(format!("{}/admin/routes", base)).headers(headers),
        Commands::Health => client.get(format!("{}/health/", base)),
        Commands::Resolve { path } => client
            .get(format!("{}/admin/resolve", base))
            .query(&[("path", path)])
            .headers(headers),
    };

    let res = request.send().await?;
    // The health endpoint reports a degraded gateway with 503 and a full body.
    let accept_503 = matches!(cli.command, Commands::Health);
    print_response(res, accept_503).await
}

async fn print_response(
    res: reqwest::Response,
    accept_503: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let readable = status.is_success() || (accept_503 && status.as_u16() == 503);
    if !readable {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
