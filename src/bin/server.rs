use std::{fs::OpenOptions, net::SocketAddr, path::Path, process::ExitCode, sync::Arc};

use axum_server::Handle;
use clap::Parser;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use expense_tracker::{
    AppState, Config, OtpSender, PasswordHash, ResendSender, RunMode, build_router, create_pool,
    graceful_shutdown,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    if let Err(error) = setup_logging(config.mode, &config.log_path) {
        eprintln!("Could not open the log file {:?}: {error}", config.log_path);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Opening database at {:?}", config.db_path);
    let db_pool = create_pool(&config.db_path, &config.pool_config())?;

    let otp_sender: Option<Arc<dyn OtpSender>> = match config.email_api_key() {
        Some(api_key) => Some(Arc::new(ResendSender::new(api_key, &config.email_from)?)),
        None => {
            tracing::warn!("RESEND_API_KEY is not set, password reset emails are disabled.");
            None
        }
    };

    let state = AppState::new(
        db_pool,
        &config.jwt_secret,
        otp_sender,
        PasswordHash::DEFAULT_COST,
    )?;

    let allowed_origins = config.allowed_origins();
    tracing::info!("Allowing cross-origin requests from {allowed_origins:?}");
    let router = build_router(state, &allowed_origins);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

/// Log to stdout and append everything from the debug level up to `log_path`.
///
/// `RUST_LOG` overrides the stdout level.
fn setup_logging(mode: RunMode, log_path: &Path) -> std::io::Result<()> {
    let default_level = match mode {
        RunMode::Debug => "debug",
        RunMode::Release => "info",
    };
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(stdout_log.with_filter(stdout_filter))
        .with(debug_log.with_filter(filter::LevelFilter::DEBUG))
        .init();

    Ok(())
}
