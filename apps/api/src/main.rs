mod cache;
mod compile;
mod config;
mod errors;
mod generation;
mod resume;
mod routes;
mod state;

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{CacheManager, CacheSettings};
use crate::compile::XelatexCompiler;
use crate::config::Config;
use crate::generation::{generator::CvGenerator, service::GenerationService};
use crate::resume::RawInput;
use crate::routes::build_router;
use crate::state::AppState;

/// CV Forge - résumé generator for Awesome-CV templates
#[derive(Parser)]
#[command(name = "cvforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Generate a résumé from a JSON or text file
    Generate {
        /// Input file (.json, anything else is read as text)
        input: PathBuf,

        /// Output name, without extension
        #[arg(short, long, default_value = "resume")]
        output: String,

        /// Template directory holding resume.tex and awesome-cv.cls
        #[arg(short, long)]
        template_dir: Option<PathBuf>,

        /// Color theme
        #[arg(short, long)]
        style: Option<String>,

        /// Compile to PDF instead of writing LaTeX
        #[arg(short, long)]
        compile: bool,
    },

    /// Inspect or clear the artifact cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Print cache statistics as JSON
    Stats,
    /// Remove every cached artifact
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Generate {
            input,
            output,
            template_dir,
            style,
            compile,
        } => {
            let template_dir = template_dir.unwrap_or_else(|| config.template_dir.clone());
            let style = style.unwrap_or_else(|| config.default_style.clone());
            generate(&config, &template_dir, &input, &output, &style, compile).await
        }
        Commands::Cache { command } => {
            let mut cache = open_cache(&config)?;
            match command {
                CacheCommands::Stats => {
                    println!("{}", serde_json::to_string_pretty(&cache.stats())?);
                }
                CacheCommands::Clear => {
                    cache.clear()?;
                    println!("Cache cleared: {}", cache.dir().display());
                }
            }
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting CV Forge API v{}", env!("CARGO_PKG_VERSION"));

    let service = build_service(&config, &config.template_dir)?;
    let status = service.compiler_status().await;
    if status.available {
        info!("LaTeX engine ready: {}", status.program);
    } else {
        warn!(
            "LaTeX engine {} unavailable; PDF requests will fail",
            status.program
        );
    }

    // Build app state
    let state = AppState {
        config: config.clone(),
        service: Arc::new(service),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn generate(
    config: &Config,
    template_dir: &Path,
    input: &Path,
    output: &str,
    style: &str,
    compile: bool,
) -> Result<()> {
    let service = build_service(config, template_dir)?;

    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let outcome = service
        .generate(RawInput::from_file(&file_name, &content), style, compile)
        .await?;

    tokio::fs::create_dir_all(&config.output_dir).await?;
    let destination = config
        .output_dir
        .join(format!("{output}.{}", outcome.kind.extension()));
    tokio::fs::copy(&outcome.artifact, &destination)
        .await
        .with_context(|| format!("failed to write {}", destination.display()))?;

    if outcome.fallback {
        warn!("Compilation failed; wrote error document instead");
    }
    println!("{}", destination.display());
    Ok(())
}

fn open_cache(config: &Config) -> Result<CacheManager> {
    let cache = CacheManager::open(CacheSettings {
        dir: config.cache_dir.clone(),
        ttl_secs: config.cache_ttl_secs,
        max_bytes: config.cache_max_bytes,
    })?;
    Ok(cache)
}

/// Wires templates, the LaTeX engine and the cache into one pipeline.
fn build_service(config: &Config, template_dir: &Path) -> Result<GenerationService> {
    let generator = CvGenerator::load(template_dir)?;
    let compiler = Arc::new(XelatexCompiler::new(config.latex_program.clone()));
    let cache = open_cache(config)?;

    Ok(GenerationService::new(
        generator,
        compiler,
        cache,
        config.output_dir.clone(),
        config.fallback_timeout,
    ))
}
