//! HTTP server helper with graceful shutdown.

use crate::domain::config::ServerConfig;
use crate::domain::error::ServerError;
use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// A running server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_timeout: Duration,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

/// Bind `config.listen_addr` and serve `router` in a background task.
///
/// The listener is bound before returning, so an address in use is reported
/// here rather than from inside the task. Requests that take longer than
/// `config.request_timeout` are answered with 408.
pub async fn serve(router: Router, config: &ServerConfig) -> Result<ServerHandle, ServerError> {
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.listen_addr,
            source,
        })?;
    let local_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let app = router
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http());

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = &result {
            error!(error = %e, "Server stopped with error");
        }
        result
    });

    info!(
        addr = %local_addr,
        request_timeout = ?config.request_timeout,
        "Settlement RPC server listening"
    );

    Ok(ServerHandle {
        local_addr,
        shutdown_timeout: config.shutdown_timeout,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

impl ServerHandle {
    /// Actual bound address; differs from the configured one for port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests, up to
    /// the configured shutdown timeout. The task is aborted past that.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        info!(addr = %self.local_addr, "Shutting down server");
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        match tokio::time::timeout(self.shutdown_timeout, &mut self.task).await {
            Ok(Ok(result)) => result.map_err(ServerError::from),
            Ok(Err(e)) => Err(ServerError::Join(e.to_string())),
            Err(_) => {
                self.task.abort();
                Err(ServerError::ShutdownTimeout(self.shutdown_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::net::Ipv4Addr;

    fn local_config() -> ServerConfig {
        ServerConfig {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            shutdown_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_serve_and_shutdown() {
        let router = Router::new().route("/health", get(|| async { "ok" }));
        let handle = serve(router, &local_config()).await.unwrap();
        assert_ne!(handle.local_addr().port(), 0);

        let body = reqwest::get(format!("http://{}/health", handle.local_addr()))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let config = ServerConfig {
            request_timeout: Duration::from_millis(100),
            ..local_config()
        };
        let handle = serve(router, &config).await.unwrap();

        let response = reqwest::get(format!("http://{}/slow", handle.local_addr()))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::REQUEST_TIMEOUT);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_error_is_returned() {
        let first = serve(Router::new(), &local_config()).await.unwrap();
        let taken = ServerConfig {
            listen_addr: first.local_addr(),
            ..local_config()
        };

        let err = serve(Router::new(), &taken).await.err().unwrap();
        assert!(matches!(err, ServerError::Bind { addr, .. } if addr == first.local_addr()));

        first.shutdown().await.unwrap();
    }
}
