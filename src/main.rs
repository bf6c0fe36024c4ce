use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ai_studio::{
    cache::{HistoryCache, LocalFileStorage},
    client::GenerationClient,
    config::{self, StudioConfig},
    image_processing,
    intake::UploadCandidate,
    mock_backend::{self, MockBackend},
    models::Style,
    studio::Studio,
};

#[derive(Parser)]
#[command(name = "ai-studio", about = "Image styling studio with a mock generation backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the mock generation backend and the studio page
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        fault_rate: Option<f64>,
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Run one generation against a running backend
    Generate {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        prompt: String,
        #[arg(long, default_value_t = Style::Editorial)]
        style: Style,
        #[arg(long)]
        endpoint: Option<String>,
        /// Write the returned image to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the available styles
    Styles,
    /// Print the saved generation history
    History,
    /// Remove the saved generation history
    ClearHistory,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_studio=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings = StudioConfig::from_env();
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve {
        port: None,
        fault_rate: None,
        delay_ms: None,
    }) {
        Command::Serve {
            port,
            fault_rate,
            delay_ms,
        } => {
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(rate) = fault_rate {
                settings.fault_rate = config::clamp_fault_rate(rate);
            }
            if let Some(delay_ms) = delay_ms {
                settings.generation_delay = Duration::from_millis(delay_ms);
            }
            serve(&settings).await
        }
        Command::Generate {
            image,
            prompt,
            style,
            endpoint,
            output,
        } => {
            if let Some(endpoint) = endpoint {
                settings.endpoint = config::normalize_endpoint(&endpoint);
            }
            generate(&settings, &image, &prompt, style, output).await
        }
        Command::Styles => {
            for style in Style::ALL {
                println!("{:<12} {:<12} {}", style.as_str(), style.label(), style.description());
            }
            Ok(())
        }
        Command::History => {
            let history = history_cache(&settings).load();
            println!("{}", serde_json::to_string_pretty(&history)?);
            Ok(())
        }
        Command::ClearHistory => {
            history_cache(&settings).clear();
            println!("History cleared ({})", settings.history_dir.display());
            Ok(())
        }
    }
}

fn history_cache(config: &StudioConfig) -> HistoryCache {
    HistoryCache::new(Arc::new(LocalFileStorage::new(config.history_dir.clone())))
}

async fn serve(config: &StudioConfig) -> Result<()> {
    let backend = MockBackend::new(config.generation_delay, config.fault_rate);
    let router = mock_backend::router(backend);
    let bind_address = config.bind_address();
    let tcp_listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("bind {bind_address}"))?;

    tracing::info!(
        address = %bind_address,
        fault_rate = config.fault_rate,
        delay_ms = config.generation_delay.as_millis() as u64,
        "AI Studio mock backend started"
    );

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn generate(
    config: &StudioConfig,
    image: &Path,
    prompt: &str,
    style: Style,
    output: Option<PathBuf>,
) -> Result<()> {
    let candidate = UploadCandidate::from_path(image)?;
    let client = GenerationClient::new(&config.endpoint)?;
    tracing::info!(
        endpoint = %client.endpoint(),
        file = %candidate.file_name,
        "starting generation"
    );
    let studio = Studio::new(client, history_cache(config));

    let generation = studio
        .generate(&candidate, prompt, style)
        .await?
        .context("a generation is already in progress")?;

    if let Some(path) = output {
        let (_, bytes) = image_processing::decode_data_uri(&generation.image_url)?;
        std::fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        tracing::info!(path = %path.display(), "result image written");
    }
    println!("{}", serde_json::to_string_pretty(&generation)?);
    Ok(())
}
