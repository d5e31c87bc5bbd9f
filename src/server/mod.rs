//! HTTP wiring: the staleness gate in front of a static-file delegate.
//!
//! The delegate is `tower_http`'s [`ServeDir`]: path-to-file resolution,
//! content types, not-found handling, and traversal protection all live
//! there. This module only decides when to regenerate, then hands the
//! request over unconditionally.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::Response;
use tower_http::services::ServeDir;

use crate::freshness::FreshnessTracker;
use crate::regen::CommandRegenerator;

mod error;

pub use error::ServerError;

/// Resolved serving parameters, after CLI/config precedence is applied.
pub struct ServeOptions {
    pub port: u16,
    /// Address to bind; the port is appended
    pub bind: String,
    pub dashboard_dir: PathBuf,
    pub regenerator: PathBuf,
    pub ttl: Duration,
    pub regen_timeout: Duration,
}

/// Run the server until interrupted.
///
/// Fatal errors are confined to startup: an unusable dashboard directory
/// or a failed bind. Once serving, regenerator malfunctions degrade to
/// serving the last generated files.
pub async fn run(opts: ServeOptions) -> Result<(), ServerError> {
    let root = opts
        .dashboard_dir
        .canonicalize()
        .map_err(|source| ServerError::RootNotFound {
            path: opts.dashboard_dir.clone(),
            source,
        })?;
    if !root.is_dir() {
        return Err(ServerError::RootNotADirectory { path: root });
    }

    // The dashboard directory is both the web root and the working
    // directory, for the server process and the regenerator alike
    std::env::set_current_dir(&root).map_err(|source| ServerError::Chdir {
        path: root.clone(),
        source,
    })?;

    let runner = CommandRegenerator::new(&opts.regenerator, &root, opts.regen_timeout);
    let tracker = Arc::new(FreshnessTracker::new(opts.ttl, Box::new(runner)));

    let app = router(tracker, &root);

    let addr = format!("{}:{}", opts.bind, opts.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    eprintln!(
        "dashd serving {} on http://{addr} (TTL {}s)",
        root.display(),
        opts.ttl.as_secs()
    );
    eprintln!("Press Ctrl+C to stop");
    crate::log_event!("server", "listening", "http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| ServerError::Serve { source })?;

    eprintln!("dashd shut down");
    Ok(())
}

/// Build the request pipeline: gate middleware wrapped around the static
/// delegate. Split out so tests can drive it without a socket.
pub fn router(tracker: Arc<FreshnessTracker>, root: &Path) -> Router {
    let delegate = ServeDir::new(root).append_index_html_on_directories(true);

    Router::new()
        .fallback_service(delegate)
        .layer(middleware::from_fn_with_state(tracker, refresh_watched))
}

/// Gate middleware: runs the staleness check for watched GET paths, then
/// always forwards to the delegate, whatever the regeneration outcome.
async fn refresh_watched(
    State(tracker): State<Arc<FreshnessTracker>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::GET {
        // `path()` excludes the query string, so `?v=2` never affects
        // watched-file matching
        tracker.maybe_regenerate(request.uri().path()).await;
    }
    next.run(request).await
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");
    eprintln!("Received shutdown signal");
}
