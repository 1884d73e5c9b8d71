//! Quiz Round Back binary entrypoint wiring REST, SSE, and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_round_back::{
    config::AppConfig,
    dao::{memory::MemoryQuizStore, storage::StorageError, store::QuizStore},
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    spawn_store_supervisor(app_state.clone());

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Spawn the storage supervisor against the backend selected by `QUIZ_STORE`.
///
/// `memory` keeps everything in process (useful for local runs and demos);
/// anything else connects to MongoDB when the `mongo-store` feature is
/// compiled in.
fn spawn_store_supervisor(state: SharedState) {
    let backend = env::var("QUIZ_STORE").unwrap_or_else(|_| default_backend().into());

    match backend.as_str() {
        "memory" => {
            info!("using in-memory store backend");
            tokio::spawn(storage_supervisor::run(state, || async {
                Ok::<_, StorageError>(Arc::new(MemoryQuizStore::new()) as Arc<dyn QuizStore>)
            }));
        }
        #[cfg(feature = "mongo-store")]
        _ => {
            use quiz_round_back::dao::mongodb::{MongoQuizStore, config::MongoConfig};

            let uri =
                env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
            let db_name = env::var("MONGO_DB").ok();

            info!("using MongoDB store backend");
            tokio::spawn(storage_supervisor::run(state, move || {
                let uri = uri.clone();
                let db_name = db_name.clone();
                async move {
                    let config = MongoConfig::from_uri(&uri, db_name.as_deref())
                        .await
                        .map_err(StorageError::from)?;
                    let store = MongoQuizStore::connect(config)
                        .await
                        .map_err(StorageError::from)?;
                    Ok(Arc::new(store) as Arc<dyn QuizStore>)
                }
            }));
        }
        #[cfg(not(feature = "mongo-store"))]
        other => {
            panic!("unknown QUIZ_STORE backend `{other}` (built without mongo-store)");
        }
    }
}

fn default_backend() -> &'static str {
    if cfg!(feature = "mongo-store") {
        "mongo"
    } else {
        "memory"
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
