mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header::{AUTHORIZATION, CONTENT_TYPE}};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use tipline_api::access::ACCESS_CODE_HEADER;
use tipline_api::state::{AppState, AppStateInner};
use tipline_crypto::{CodeHasher, SessionTokens, secret};
use tipline_db::Database;

use crate::config::Config;

/// Used when `RUST_LOG` is unset. Every workspace crate gets a directive.
const DEFAULT_LOG_FILTER: &str =
    "tipline=debug,tipline_api=debug,tipline_db=info,tipline_crypto=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = Config::from_env()?;

    let signing_key = match &config.secret_key {
        Some(key) => key.as_bytes().to_vec(),
        None => {
            warn!("TIPLINE_SECRET_KEY is unset or a placeholder; using a random key.");
            warn!("Every session token becomes invalid when this process restarts.");
            secret::generate_signing_key().to_vec()
        }
    };

    // Init database
    let db = Database::open(&config.db_path)?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        hasher: CodeHasher::new(),
        tokens: SessionTokens::new(&signing_key),
        token_max_age: config.token_max_age,
    });

    let app = tipline_api::router(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config)?)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Tipline server listening on {}", addr);
    info!(
        "Sessions expire after {} days",
        config.token_max_age.as_secs() / 86_400
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origin = match &config.cors_origins {
        None => AllowOrigin::any(),
        Some(list) => AllowOrigin::list(
            list.iter()
                .map(|o| HeaderValue::from_str(o))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(ACCESS_CODE_HEADER),
        ])
        .allow_credentials(false))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            warn!("Failed to install SIGTERM handler; only Ctrl+C will stop the server");
            ctrl_c.await.ok();
            return;
        };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
