mod server;

use std::net::{IpAddr, SocketAddr};

use clap::{Parser, Subcommand};
use keypanel::{BackendClient, DEFAULT_BACKEND, PanelError};

#[derive(Parser, Debug)]
#[command(name = "keypanel", version, about = "API key panel & call statistics dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the panel web UI.
    Serve {
        /// Backend API base URL.
        #[arg(long, env = "KEYPANEL_BACKEND", default_value = DEFAULT_BACKEND)]
        backend: String,
        /// Address to bind.
        #[arg(long, env = "KEYPANEL_BIND", default_value = "127.0.0.1")]
        bind: IpAddr,
        /// Port to listen on.
        #[arg(long, env = "KEYPANEL_PORT", default_value_t = 8090)]
        port: u16,
    },
    /// Fetch one statistics snapshot and print it as JSON.
    Snapshot {
        #[arg(long, env = "KEYPANEL_BACKEND", default_value = DEFAULT_BACKEND)]
        backend: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            backend,
            bind,
            port,
        } => {
            let client = match BackendClient::new(&backend) {
                Ok(client) => client,
                Err(err) => {
                    report_error(&err);
                    std::process::exit(1);
                }
            };
            println!("backend: {}", client.endpoint());
            let addr = SocketAddr::new(bind, port);
            if let Err(err) = server::serve(addr, client).await {
                eprintln!("server error: {err}");
                std::process::exit(1);
            }
        }
        Command::Snapshot { backend } => {
            if let Err(err) = print_snapshot(&backend).await {
                report_error(&err);
                std::process::exit(1);
            }
        }
    }
}

async fn print_snapshot(backend: &str) -> Result<(), PanelError> {
    let client = BackendClient::new(backend)?;
    let snapshot = client.fetch_stats().await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn report_error(err: &PanelError) {
    match err {
        PanelError::InvalidEndpoint { endpoint, .. } => {
            eprintln!("invalid backend endpoint: {endpoint}");
        }
        PanelError::Http(source) => {
            eprintln!("request failed: {source}");
        }
        PanelError::UnexpectedStatus(status) => {
            eprintln!("backend answered with status {status}");
        }
        PanelError::Payload(source) => {
            eprintln!("could not decode backend payload: {source}");
        }
        PanelError::Backend { message } => {
            eprintln!("backend error: {message}");
        }
    }
}
