use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tokio::net::TcpListener;
use tourney::{
    config::{Settings, create_app},
    state::{AppState, make_pool, run_migrations},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Serves tournament results, team ratings and live chat")]
struct Args {
    /// TOML file to read settings from. Environment variables take
    /// precedence over it.
    #[clap(long, short)]
    config: Option<PathBuf>,
    /// Address to listen on, e.g. `0.0.0.0:8000`.
    #[clap(long)]
    bind: Option<String>,
    #[clap(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        settings.bind = bind;
    }
    if let Some(url) = args.database_url {
        settings.database_url = url;
    }

    let keys = settings.token_keys()?;

    tracing::info!(location = %settings.database_url, "opening database");
    let pool = make_pool(&settings.database_url)?;
    run_migrations(&pool)?;

    let state = AppState::new(pool, keys);
    let app = create_app(state.clone());

    let listener = TcpListener::bind(&settings.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    Ok(())
}

/// Resolves on ctrl-c (or SIGTERM), after the live sockets have been closed
/// so that they do not hold up the shutdown.
async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down");
    state.close_sockets().await;
}
