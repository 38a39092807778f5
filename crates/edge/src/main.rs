//! Still Waters Counselling edge proxy binary.
//!
//! Listens on port 3080 and proxies to the site on port 3000. The proxy
//! installs in the background and forwards requests uncached until it is
//! active.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tokio_util::task::TaskTracker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stillwaters_edge::config::EdgeConfig;
use stillwaters_edge::network::OriginNetwork;
use stillwaters_edge::storage::{CacheStorage, DiskCacheStorage, MemoryCacheStorage};
use stillwaters_edge::{Buckets, CacheRouter, EdgeWorker, Precache, app};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &EdgeConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = EdgeConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stillwaters_edge=info,tower_http=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let storage: Arc<dyn CacheStorage> = match &config.cache_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Using disk cache");
            Arc::new(
                DiskCacheStorage::open(dir)
                    .await
                    .expect("Failed to open cache directory"),
            )
        }
        None => {
            tracing::info!("Using in-memory cache");
            Arc::new(MemoryCacheStorage::new())
        }
    };
    let network =
        Arc::new(OriginNetwork::new(&config.origin_url).expect("Failed to create origin client"));

    let tracker = TaskTracker::new();
    let router = CacheRouter::new(
        storage,
        network,
        Buckets::new(&config.cache_version),
        tracker.clone(),
    );
    let worker = EdgeWorker::new(router, Precache::default());

    let installer = worker.clone();
    let wait_for_skip = config.wait_for_skip;
    tracker.spawn(async move { installer.start(wait_for_skip).await });

    let app = app(worker)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!(origin = %config.origin_url, "edge listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    tracker.close();
    tracker.wait().await;
    tracing::info!("Background refreshes finished");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
