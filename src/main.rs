use std::sync::Arc;

use clap::Parser;
use tokio::sync::Notify;
use upload_validator::config::{AppState, Config, DEFAULT_CONFIG_PATH};
use upload_validator::{logger, server};

#[derive(Parser, Debug)]
#[command(
    name = "upload-validator",
    version,
    about = "Validate multipart file uploads over HTTP",
    after_help = "Environment variables prefixed with UPLOAD_ override the file, e.g. UPLOAD_SERVER__PORT=9000"
)]
struct Cli {
    /// Configuration file path without extension
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config_path: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cfg = Config::load_from(&cli.config_path)?;
    logger::init(&cfg)?;

    // Tokio runtime, thread count from `server.workers`
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(AppState::new(cfg));
    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    // LocalSet for spawn_local connection tasks. The loop returns after the
    // drain, and anything still open is aborted when the set is dropped.
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, state, shutdown))
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["upload-validator"]).unwrap();
        assert_eq!(cli.config_path, "config");
    }

    #[test]
    fn test_explicit_config_path() {
        let cli = Cli::try_parse_from(["upload-validator", "deploy/prod"]).unwrap();
        assert_eq!(cli.config_path, "deploy/prod");
    }

    #[test]
    fn test_help_and_version_exit_early() {
        let err = Cli::try_parse_from(["upload-validator", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let err = Cli::try_parse_from(["upload-validator", "-V"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["upload-validator", "--port"]).is_err());
        assert!(Cli::try_parse_from(["upload-validator", "a", "b"]).is_err());
    }
}
