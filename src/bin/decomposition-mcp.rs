//! Decomposition MCP Server Binary
//!
//! Runs the decomposition tools as an MCP server with stdio transport.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin decomposition-mcp
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Log level filter (e.g., `info`, `debug`, `decomposition=debug`)
//! - `OPENAI_API_KEY` - Backend credential (required)
//! - `DECOMPOSITION_CUTOFF_DATE` - Replay every call as of this date
//!
//! A `.env` file in the working directory is loaded first if present.

use anyhow::Context;
use decomposition::{DecompositionServer, ServerConfig};
use rmcp::{transport::stdio, ServiceExt};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before logging, so RUST_LOG may come from .env
    let dotenv = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the MCP transport
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,decomposition=debug")),
        )
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!(error = %e, "Failed to load .env file");
        }
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting decomposition MCP server"
    );

    let config = ServerConfig::from_env()
        .inspect_err(|e| error!(error = %e, "Invalid configuration"))
        .context("failed to load configuration")?;
    let client = config
        .build_client()
        .context("failed to build backend client")?;

    info!(
        model = %config.model,
        reasoning_effort = %config.reasoning_effort,
        cutoff_date = config.cutoff_date.as_deref().unwrap_or("today"),
        "Configuration loaded"
    );

    let server = DecompositionServer::new(Arc::new(client), config);
    server
        .verify_backtest_contracts()
        .context("tool schema leaks a backtesting parameter")?;

    let shutdown = async {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C, shutting down");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down");
            }
        }
    };

    info!("Listening on stdio transport");

    let service = server.serve(stdio()).await.inspect_err(|e| {
        error!(error = %e, "Failed to start MCP server");
    })?;

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(_) => info!("MCP service completed"),
                Err(e) => warn!(error = %e, "MCP service error"),
            }
        }
        _ = shutdown => {
            info!("Graceful shutdown complete");
        }
    }

    info!("Decomposition MCP server stopped");
    Ok(())
}
