use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "ssn-cli")]
#[command(about = "Client for a running SSN validation service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one or more SSNs
    Validate {
        #[arg(required = true)]
        ssns: Vec<String>,
    },
    /// Check service liveness
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Validate { ssns } => {
            for ssn in ssns {
                let res = client
                    .post(format!("{}/api/v1/ssn/validate", cli.url))
                    .json(&json!({ "ssn": ssn }))
                    .send()
                    .await?;
                print_response(res).await?;
            }
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let header = |name: &str| {
        res.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };
    eprintln!(
        "{} (limit {}, remaining {})",
        status,
        header("x-ratelimit-limit"),
        header("x-ratelimit-remaining"),
    );

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
