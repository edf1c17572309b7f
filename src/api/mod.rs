//! HTTP surface: `POST /api/parse-pdf` and `GET /health`.
//!
//! [`router()`] returns a composable axum `Router`; [`serve`] runs it on a
//! bound listener until the shutdown future resolves.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod types;

pub use error::ApiError;
pub use router::router;
pub use types::AppState;

use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;

/// Serve `app` on `listener` until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Server running");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
