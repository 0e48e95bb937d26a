use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mb_core::{config::default_data_dir, Core};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod routes;

/// Markbook backend server
#[derive(Parser)]
#[command(name = "mb-server")]
struct Args {
	/// Data directory holding the config, database and project folders
	#[arg(long, env = "MARKBOOK_DATA_DIR")]
	data_dir: Option<PathBuf>,

	/// Port to listen on (overrides the configured one)
	#[arg(long, env = "PORT")]
	port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let args = Args::parse();
	let data_dir = match args.data_dir {
		Some(dir) => dir,
		None => default_data_dir()?,
	};

	let core = Core::new(data_dir).await?;
	let port = args.port.unwrap_or(core.config.port);

	let app = routes::router(core);

	let mut addr = "[::]:8080".parse::<SocketAddr>()?; // This listens on IPv6 and IPv4
	addr.set_port(port);
	info!("Listening on http://localhost:{}", port);

	let listener = TcpListener::bind(addr).await?;
	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}

async fn shutdown_signal() {
	let _ = tokio::signal::ctrl_c().await;
	info!("Shutdown signal received");
}
