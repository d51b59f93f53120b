//! StaffGate API Server
//!
//! HTTP surface over the access-control and audit core.
//!
//! # Architecture
//!
//! - **Routes**: endpoint definitions, each wrapped in a guard
//! - **Middleware**: the guard pipeline and the session carrier
//! - **Session**: server-side session storage
//! - **Facility**: demo facility records, also the facility registry

#![warn(clippy::all)]

pub mod config;
pub mod demo;
pub mod error;
pub mod facility;
pub mod middleware;
pub mod request;
pub mod response;
pub mod routes;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use anyhow::{anyhow, Context};
use axum::Router;
use facility::FacilityStore;
use middleware::{SessionCarrier, TokenDecoder};
use session::InMemorySessionStore;
use staffgate_access::{InMemoryDirectory, PermissionCatalog};
use staffgate_audit_capture::{AuditRecorder, AuditSink};
use staffgate_audit_search::{AuditQuery, InMemoryAuditStore, SqliteAuditStore};
use staffgate_common_config::load_access_policy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, warn};

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Server builder for constructing and running the API server.
pub struct Server {
    config: ServerConfig,
    state: AppState,
    directory: Arc<InMemoryDirectory>,
    sessions: Arc<InMemorySessionStore>,
    writer: JoinHandle<()>,
}

impl Server {
    /// Assemble the server from configuration. Must run inside a Tokio
    /// runtime; the audit writer is spawned here.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let catalog = match &config.access.policy_path {
            Some(path) => {
                let policy = load_access_policy(path)
                    .with_context(|| format!("Failed to load access policy from {}", path.display()))?;
                let catalog = PermissionCatalog::from_policy(&policy).context("Invalid access policy")?;
                info!(path = %path.display(), "Loaded access policy");
                catalog
            }
            None => PermissionCatalog::builtin(),
        };

        let (sink, query) = match &config.audit.sqlite_path {
            Some(path) => audit_backend(SqliteAuditStore::open(path).context("Failed to open audit store")?),
            None => {
                warn!("No audit database configured, keeping the audit trail in memory");
                audit_backend(InMemoryAuditStore::new())
            }
        };
        let (recorder, writer) = AuditRecorder::spawn(sink, config.audit.capture());

        let directory = Arc::new(InMemoryDirectory::new());
        let sessions = Arc::new(InMemorySessionStore::new(config.auth.session_ttl()));
        let facilities = Arc::new(FacilityStore::default());
        let carrier = SessionCarrier::new(
            config.auth.session_cookie.as_str(),
            TokenDecoder::new(config.auth.jwt_secret.clone()),
        );

        if config.demo.seed {
            let ttl = config.auth.session_ttl().num_seconds();
            demo::seed(&directory, &facilities, &sessions, carrier.decoder(), ttl)
                .context("Failed to seed demo data")?;
        }

        let state = AppState::new(
            Arc::new(catalog),
            directory.clone(),
            sessions.clone(),
            carrier,
            facilities,
            recorder,
            query,
        )
        .with_trusted_forwarded_for(config.server.trust_forwarded_for);

        Ok(Self {
            config,
            state,
            directory,
            sessions,
            writer,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Principal records. The demo binary keeps them in memory.
    pub fn directory(&self) -> &Arc<InMemoryDirectory> {
        &self.directory
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> anyhow::Result<Router> {
        Ok(routes::create_router(self.state.clone())?
            .layer(TimeoutLayer::new(self.config.server.request_timeout())))
    }

    pub fn addr(&self) -> Option<SocketAddr> {
        self.config.server.socket_addr()
    }

    /// Serve until a shutdown signal, then drain the audit queue.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.addr().ok_or_else(|| anyhow!("Invalid bind address"))?;
        let router = self.router()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        info!("Server listening on {}", addr);

        let sessions = self.sessions.clone();
        let purge = tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
            loop {
                interval.tick().await;
                let purged = sessions.purge_expired();
                if purged > 0 {
                    info!(purged, "expired sessions removed");
                }
            }
        });

        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        purge.abort();

        info!("Server stopped, flushing audit queue");
        if let Err(e) = self.state.recorder.flush().await {
            error!(error = %e, "audit queue could not be flushed");
        }
        let health = self.state.recorder.health();
        info!(
            stored = health.stored,
            failed = health.failed,
            duplicates = health.duplicates,
            "audit writer drained"
        );

        drop(self.state);
        if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, self.writer).await.is_err() {
            warn!("audit writer did not stop in time");
        }

        Ok(())
    }
}

fn audit_backend<T>(store: T) -> (Arc<dyn AuditSink>, Arc<dyn AuditQuery>)
where
    T: AuditSink + AuditQuery + 'static,
{
    let store = Arc::new(store);
    (store.clone() as Arc<dyn AuditSink>, store as Arc<dyn AuditQuery>)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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

    info!("Shutdown signal received, starting graceful shutdown");
}
