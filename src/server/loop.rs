// Server loop module
// Accepts connections until shutdown is requested, then drains

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config::AppState;

/// How often the drain phase re-checks the connection count
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept connections until `shutdown` fires.
///
/// After shutdown the listener is closed and in-flight connections get
/// up to the connection timeout to finish.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => tracing::error!("failed to accept connection: {e}"),
                }
            }

            () = shutdown.notified() => {
                tracing::info!("shutdown requested, no longer accepting connections");
                break;
            }
        }
    }

    drop(listener);
    drain_connections(&state).await;
    Ok(())
}

async fn drain_connections(state: &AppState) {
    let perf = &state.config.performance;
    let deadline = tokio::time::Instant::now()
        + Duration::from_secs(std::cmp::max(perf.read_timeout, perf.write_timeout));

    loop {
        let active = state.active_connections.load(Ordering::SeqCst);
        if active == 0 {
            tracing::info!("all connections closed");
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!("{active} connection(s) still open at drain deadline");
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_serves_product_route_and_stops_on_shutdown() {
        let mut config = Config::load_from("does-not-exist/product-store").unwrap();
        config.logging.access_log = false;
        config.performance.read_timeout = 2;
        config.performance.write_timeout = 2;
        let state = Arc::new(AppState::new(&config));

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(
            listener,
            Arc::clone(&state),
            Arc::clone(&shutdown),
        ));

        let body = r#"{"id":"p1","name":"Widget","price":9.99}"#;
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "POST /api/product HTTP/1.1\r\n\
             Host: localhost\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 201"), "got: {response}");
        assert!(response.contains(r#""success":true"#));
        assert_eq!(state.store.get("p1").unwrap().name, "Widget");

        shutdown.notify_one();
        server.await.unwrap().unwrap();
    }
}
