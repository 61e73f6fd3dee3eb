use dotenvy::dotenv;
use tracing::{error, info};

use service::bootstrap::Runtime;

fn init_logging() {
    // Load .env early so RUST_LOG and the broker/cache URLs are visible.
    dotenv().ok();
    common::utils::logging::init_logging_default();
    info!(service = "worker", event = "logger_init", "tracing subscriber initialized");
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_logging();

    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "worker", event = "panic", pid, message = %info, "unhandled panic occurred");
    }));

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "worker", event = "config_invalid", error = %e, "configuration rejected");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(service = "worker", event = "start", pid, version, "consumer worker starting");

    let runtime = match Runtime::start(&cfg).await {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(service = "worker", event = "start_failed", error = %e, "runtime start failed");
            return std::process::ExitCode::FAILURE;
        }
    };

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(service = "worker", event = "shutdown_signal", pid, "received Ctrl+C, shutting down"),
        Err(e) => error!(service = "worker", event = "signal_error", error = %e, "signal listener failed"),
    }

    runtime.shutdown().await;
    info!(service = "worker", event = "stop", pid, "consumer worker stopped");
    std::process::ExitCode::SUCCESS
}
