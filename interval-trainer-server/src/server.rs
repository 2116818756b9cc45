use crate::error::ServerError;
use crate::routes::{build_router, AppState};
use crate::static_files::StaticFiles;
use axum::Router;
use interval_trainer_core::ServerConfig;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const LOG_TARGET: &str = "interval_trainer::server";

/// Bind the listener for `host:port`
///
/// # Errors
///
/// Returns an error if the address is invalid or cannot be bound.
pub async fn bind(host: &str, port: u16) -> Result<(TcpListener, SocketAddr), ServerError> {
    let host = if host == "localhost" { "127.0.0.1" } else { host };
    let addr_text = format!("{host}:{port}");
    let addr: SocketAddr = addr_text
        .parse()
        .map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress {
            addr: addr_text.clone(),
            reason: e.to_string(),
        })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr_text,
            source,
        })?;
    let local_addr = listener.local_addr()?;
    Ok((listener, local_addr))
}

/// Serve `app` until `cancel_token` is cancelled
///
/// # Errors
///
/// Returns an error if the server fails while running.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    cancel_token: CancellationToken,
) -> Result<(), ServerError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!(target: LOG_TARGET, "Server shutting down gracefully");
        })
        .await?;
    Ok(())
}

/// Bind and run the server described by `config`
///
/// # Errors
///
/// Returns an error if binding or serving fails.
pub async fn run(config: &ServerConfig, cancel_token: CancellationToken) -> Result<(), ServerError> {
    let static_files = StaticFiles::new(&config.static_dir);
    if !static_files.root().join(crate::static_files::INDEX_FILE).is_file() {
        warn!(
            target: LOG_TARGET,
            "No client build found in {}; only /api will respond",
            static_files.root().display()
        );
    }

    let (listener, addr) = bind(&config.host, config.port).await?;
    info!(target: LOG_TARGET, "Server is running on http://{}", addr);

    serve(listener, build_router(AppState::new(static_files)), cancel_token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::API_WELCOME;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_host() {
        let result = bind("not an address", 0).await;
        assert!(matches!(result, Err(ServerError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn test_serves_api_until_cancelled() {
        let (listener, addr) = bind("localhost", 0).await.unwrap();
        let app = build_router(AppState::new(StaticFiles::new("/nonexistent-client")));
        let cancel_token = CancellationToken::new();
        let server = tokio::spawn(serve(listener, app, cancel_token.clone()));

        let response = get(addr, "/api").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(API_WELCOME));

        let missing = get(addr, "/anything").await;
        assert!(missing.starts_with("HTTP/1.1 404"));

        cancel_token.cancel();
        server.await.unwrap().unwrap();
    }
}
