// src/main.rs — aerolog entry point

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use aerolog::api::{self, ApiState};
use aerolog::infra::config::Config;
use aerolog::infra::logger;
use aerolog::provider::openai_compat::OpenAiCompatProvider;
use aerolog::session::SessionRegistry;

/// UAV flight-log analysis service.
#[derive(Parser, Debug)]
#[command(name = "aerolog", version, about)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind address (host:port).
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() {
    // Respects RUST_LOG
    logger::init("info");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    // The key is read once here and carried in the client from then on.
    let api_key = std::env::var("TOGETHER_API_KEY")
        .map_err(|_| anyhow::anyhow!("TOGETHER_API_KEY is not set; the chat provider cannot authenticate"))?;

    tokio::fs::create_dir_all(&config.storage.upload_dir).await?;

    let provider = OpenAiCompatProvider::new("together", api_key, config.chat.base_url.clone());
    let sessions = SessionRegistry::new(config.sessions.max_sessions, config.sessions.idle_ttl());

    let state = ApiState {
        config: Arc::new(config),
        sessions: Arc::new(sessions),
        provider: Arc::new(provider),
    };

    api::start_server(state).await
}
