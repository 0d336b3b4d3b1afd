mod api;
mod config;
mod range;
mod state;
mod users;
mod utils;

use api::api_router;
use axum::extract::DefaultBodyLimit;
use config::{
    config_path_from_env, effective_secret, load_or_create_config, resolve_data_root,
    INSECURE_SECRET,
};
use state::AppState;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use users::UserStore;
use vault::{Resolver, Roots, VaultWriter};

// one upload can carry a whole album as a zip archive
const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;

    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let data_root = resolve_data_root(&config_path, &config);
    let roots = Roots::new(data_root.clone());
    roots.ensure_layout()?;
    info!("Serving vault at {:?}", data_root);

    let secret_key = effective_secret(&config);
    if secret_key == INSECURE_SECRET {
        warn!("No secret_key configured; falling back to the development secret.");
    }

    let state = AppState {
        secret_key,
        roots: roots.clone(),
        resolver: Resolver::new(roots.clone()),
        writer: VaultWriter::new(roots.clone()),
        users: UserStore::new(roots.users_db()),
    };

    let app = api_router(state)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
