//! HTTP server lifecycle.
//!
//! [`RelayServer`] owns the listener, the reading store and the sink
//! dispatcher. Running it serves requests until the shutdown future
//! resolves, lets in-flight requests finish, then performs the single
//! reset notification and waits for the sinks to drain.

use crate::config::{MetricTarget, ServerConfig};
use crate::metrics::{MetricsError, MetricsRegistry};
use crate::router::{build_router, AppState};
use crate::sink::{SinkDispatcher, Sinks};
use crate::store::ReadingStore;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

/// Errors that can occur during server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    /// The metrics registry could not be built.
    #[error("failed to set up metrics: {0}")]
    Metrics(#[from] MetricsError),

    /// Serving stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}

/// The heart-rate relay HTTP server.
pub struct RelayServer {
    listener: TcpListener,
    store: Arc<ReadingStore>,
    metrics: Arc<MetricsRegistry>,
    dispatcher: SinkDispatcher,
}

impl RelayServer {
    /// Binds the listener and starts the sink dispatcher.
    pub async fn bind(
        config: &ServerConfig,
        target: MetricTarget,
        sinks: Sinks,
    ) -> Result<Self, ServerError> {
        let metrics = Arc::new(MetricsRegistry::new(target)?);
        let listener = TcpListener::bind(config.socket_addr()).await?;
        let (store, dispatcher) = ReadingStore::with_sinks(sinks);

        Ok(Self {
            listener,
            store: Arc::new(store),
            metrics,
            dispatcher,
        })
    }

    /// Returns the address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Returns a handle to the reading store.
    pub fn store(&self) -> Arc<ReadingStore> {
        Arc::clone(&self.store)
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serves until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            listener,
            store,
            metrics,
            dispatcher,
        } = self;

        let app = build_router(AppState::new(Arc::clone(&store), metrics));

        tracing::info!(
            addr = %listener.local_addr()?,
            "Heart rate relay listening"
        );

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Server(e.to_string()));

        tracing::info!("Stopping heart rate relay");

        // Runs even if serving failed so downstream consumers see zero.
        store.reset();
        store.close();
        dispatcher.join().await;

        served
    }
}

/// Resolves on Ctrl+C, or on SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
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
}
