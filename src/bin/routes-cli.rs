use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "routes-cli")]
#[command(about = "Management CLI for the gateway route table", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresher state, health and last cycle
    Status,
    /// List the published routes in match order, or one by pattern
    Routes {
        #[arg(short, long)]
        pattern: Option<String>,
    },
    /// Queue a route refresh
    Refresh,
    /// Cancel a queued refresh that has not started
    Cancel,
    /// Show which route and upstream a path resolves to
    Resolve { path: String },
    /// List services known to discovery
    Services,
    /// Register an endpoint (host:port) for a service
    Register { service: String, endpoint: String },
    /// Remove an endpoint from a service
    Deregister { service: String, endpoint: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")),
        Commands::Routes { pattern: None } => client.get(format!("{base}/admin/routes")),
        Commands::Routes { pattern: Some(pattern) } => client
            .get(format!("{base}/admin/routes"))
            .query(&[("pattern", pattern)]),
        Commands::Refresh => client.post(format!("{base}/admin/refresh")),
        Commands::Cancel => client.delete(format!("{base}/admin/refresh")),
        Commands::Resolve { path } => client
            .get(format!("{base}/admin/resolve"))
            .query(&[("path", path)]),
        Commands::Services => client.get(format!("{base}/admin/discovery")),
        Commands::Register { service, endpoint } => client
            .post(format!("{base}/admin/discovery/{service}"))
            .json(&serde_json::json!({ "endpoint": endpoint })),
        Commands::Deregister { service, endpoint } => {
            client.delete(format!("{base}/admin/discovery/{service}/{endpoint}"))
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if !text.is_empty() => println!("{}", text),
        Err(_) => {}
    }
    Ok(())
}
