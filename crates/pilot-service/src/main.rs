use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pilot_config::{ConfigLoader, PilotConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod pipeline;

use pipeline::{IntentRequest, Pipeline};

const DEFAULT_CONFIG_PATH: &str = "config/pilot.toml";

#[derive(Parser)]
#[command(name = "wallet-pilot")]
#[command(about = "Intent-to-execution pipeline for wallet operations", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
	config: PathBuf,

	#[arg(long, env = "PILOT_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the HTTP service
	Serve,
	/// Resolve a message and print the plan without executing
	Plan {
		/// Natural-language instruction
		#[arg(long)]
		text: Option<String>,
		/// Structured intent JSON instead of text
		#[arg(long, value_name = "JSON")]
		structured: Option<String>,
	},
	/// Resolve a message and execute the plan
	Exec {
		/// Natural-language instruction
		#[arg(long)]
		text: Option<String>,
		/// Structured intent JSON instead of text
		#[arg(long, value_name = "JSON")]
		structured: Option<String>,
	},
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	// Initialize tracing
	setup_tracing(&cli.log_level)?;

	let config_path = cli.config.clone();

	// Handle commands
	match cli.command {
		Some(Commands::Serve) | None => serve(&config_path).await,
		Some(Commands::Plan { text, structured }) => run_plan(&config_path, text, structured).await,
		Some(Commands::Exec { text, structured }) => run_exec(&config_path, text, structured).await,
		Some(Commands::Validate) => validate_config(&config_path).await,
	}
}

async fn serve(config_path: &Path) -> Result<()> {
	info!("Starting wallet-pilot service");
	info!("Loading configuration from: {:?}", config_path);

	let config = load_config(config_path).await?;

	info!("Service name: {}", config.service.name);
	info!("HTTP port: {}", config.service.port);
	info!("Signer backend: {}", config.signer.backend);

	let host = config.service.host.clone();
	let port = config.service.port;
	let pipeline = Arc::new(Pipeline::new(config).context("Failed to build pipeline")?);

	// Start HTTP server
	let http_handle =
		tokio::spawn(async move { api::start_http_server(pipeline, host, port).await });

	// Setup graceful shutdown
	let shutdown_signal = setup_shutdown_signal();

	info!("wallet-pilot started successfully");

	// Wait for shutdown signal
	shutdown_signal.await;

	info!("Shutdown signal received, stopping service...");

	// Cancel the server task
	http_handle.abort();

	info!("wallet-pilot stopped");
	Ok(())
}

async fn run_plan(
	config_path: &Path,
	text: Option<String>,
	structured: Option<String>,
) -> Result<()> {
	let config = load_config(config_path).await?;
	let pipeline = Pipeline::new(config).context("Failed to build pipeline")?;
	let request = build_request(text, structured)?;

	let outcome = pipeline
		.plan(&request)
		.await
		.context("Plan request failed")?;
	println!("{}", serde_json::to_string_pretty(&outcome)?);
	Ok(())
}

async fn run_exec(
	config_path: &Path,
	text: Option<String>,
	structured: Option<String>,
) -> Result<()> {
	let config = load_config(config_path).await?;
	let pipeline = Pipeline::new(config).context("Failed to build pipeline")?;
	let request = build_request(text, structured)?;

	let outcome = pipeline
		.execute(&request)
		.await
		.context("Execute request failed")?;
	println!("{}", serde_json::to_string_pretty(&outcome)?);
	Ok(())
}

async fn validate_config(config_path: &Path) -> Result<()> {
	info!("Validating configuration file: {:?}", config_path);

	// Try to load the configuration
	let config = ConfigLoader::new()
		.with_file(config_path)
		.load()
		.await
		.context("Failed to load configuration")?;

	info!("Configuration is valid");
	info!("Service name: {}", config.service.name);
	info!("Signer backend: {}", config.signer.backend);
	info!(
		"Model stage: {}",
		if config.resolver.model_enabled() {
			"enabled"
		} else {
			"disabled"
		}
	);

	Ok(())
}

/// Loads the configuration, falling back to built-in defaults only when
/// the default path is absent. An explicitly passed path must exist.
async fn load_config(path: &Path) -> Result<PilotConfig> {
	if path == Path::new(DEFAULT_CONFIG_PATH) && !path.exists() {
		info!("No configuration file at {:?}, using built-in defaults", path);
		return Ok(PilotConfig::default());
	}

	ConfigLoader::new()
		.with_file(path)
		.load()
		.await
		.context("Failed to load configuration")
}

fn build_request(text: Option<String>, structured: Option<String>) -> Result<IntentRequest> {
	if let Some(raw) = structured {
		let intent = serde_json::from_str(&raw).context("Invalid --structured JSON")?;
		return Ok(IntentRequest::from_intent(intent));
	}
	match text {
		Some(text) => Ok(IntentRequest::from_text(text)),
		None => anyhow::bail!("Provide --text or --structured"),
	}
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

async fn setup_shutdown_signal() {
	let ctrl_c = async {
		signal::ctrl_c()
			.await
			.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.expect("failed to install signal handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
