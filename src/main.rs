use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;
mod metrics;
mod middleware;
mod probe;
mod server;

use config::{Args, ProbeDefaults};
use probe::{Iperf3Runner, Runner};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState<R: Runner = Iperf3Runner> {
    /// Process-wide probe settings; query parameters override per request.
    pub defaults: ProbeDefaults,

    /// Executes iperf3. Swapped for a canned runner in tests.
    pub runner: R,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // ── 1. Logging ───────────────────────────────────────────────
    let filter = match EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
    {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("invalid log filter {:?}: {e}", args.log_level);
            process::exit(2);
        }
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting iperf3-exporter");

    // ── 2. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState {
        defaults: ProbeDefaults::from(&args),
        runner: Iperf3Runner,
    });
    info!(
        iperf3_path = %state.defaults.iperf3_path.display(),
        timeout = ?state.defaults.timeout,
        "probe defaults loaded"
    );

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = match tokio::net::TcpListener::bind(args.listen_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(address = %args.listen_address, error = %e, "failed to bind");
            process::exit(1);
        }
    };
    info!(address = %args.listen_address, "starting to listen");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server exited with error");
        process::exit(1);
    }
}
