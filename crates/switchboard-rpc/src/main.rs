//! Switchboard RPC Server - standalone route-dispatch server.
//!
//! This binary serves the builtin route set over framed TCP and prints the
//! bound port on stdout for a supervising process to read.

mod routes;

use anyhow::Result;
use clap::Parser;
use switchboard_core::Server;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "switchboard-rpc")]
#[command(about = "Route-dispatch RPC server")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Switchboard RPC Server");

    let table = routes::builtin_routes();
    let mut handle = Server::new(args.host, args.port, table).serve().await?;

    // Print port for the supervising process to read (intentional stdout)
    println!("RPC_PORT={}", handle.port());

    info!("RPC server running on {}", handle.addr());

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");
    handle.shutdown();

    Ok(())
}
