//! Scrape server exposing `/metrics` and `/healthz`.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::ExporterError;
use crate::sink::PrometheusSink;

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Binds `addr` and serves until `shutdown` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    sink: Arc<PrometheusSink>,
    shutdown: CancellationToken,
) -> Result<(), ExporterError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ExporterError::Bind { addr, source })?;
    serve_listener(listener, sink, shutdown).await
}

/// Serves on an already bound listener until `shutdown` is cancelled.
///
/// Accept failures (descriptor exhaustion, aborted handshakes) are logged and
/// retried after a short pause; they never stop the server.
pub async fn serve_listener(
    listener: TcpListener,
    sink: Arc<PrometheusSink>,
    shutdown: CancellationToken,
) -> Result<(), ExporterError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "metrics server listening");
    }

    let listener = &listener;
    while let Some((stream, peer)) = next_connection(move || listener.accept(), &shutdown).await {
        let io = TokioIo::new(stream);
        let sink = Arc::clone(&sink);
        tokio::task::spawn(async move {
            let service = service_fn(move |req| handle_request(req, Arc::clone(&sink)));
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                debug!(%peer, error = %err, "error serving metrics connection");
            }
        });
    }

    info!("metrics server stopped");
    Ok(())
}

/// Waits for the next accepted connection, backing off on errors.
///
/// Returns `None` once `shutdown` is cancelled.
async fn next_connection<F, Fut, T>(mut accept: F, shutdown: &CancellationToken) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => return None,
            accepted = accept() => accepted,
        };

        match accepted {
            Ok(conn) => return Some(conn),
            Err(err) => {
                warn!(error = %err, "accepting metrics connection failed, retrying");
                tokio::select! {
                    _ = shutdown.cancelled() => return None,
                    _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                }
            }
        }
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    sink: Arc<PrometheusSink>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => match sink.render() {
            Ok(body) => text(StatusCode::OK, prometheus::TEXT_FORMAT, body),
            Err(err) => {
                error!(error = %err, "encoding metrics");
                text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain; charset=utf-8",
                    "failed to encode metrics".to_string(),
                )
            }
        },
        (&Method::GET, "/healthz") => text(StatusCode::OK, "text/plain; charset=utf-8", "ok".to_string()),
        _ => text(StatusCode::NOT_FOUND, "text/plain; charset=utf-8", "not found".to_string()),
    };

    Ok(response)
}

fn text(status: StatusCode, content_type: &'static str, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::metrics::names::{LABEL_HOST, TLS_REDIRECT};
    use sentinel_core::MetricSink;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn start() -> (SocketAddr, Arc<PrometheusSink>, CancellationToken, tokio::task::JoinHandle<Result<(), ExporterError>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let sink = Arc::new(PrometheusSink::new().unwrap());
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(serve_listener(listener, Arc::clone(&sink), shutdown.clone()));
        (addr, sink, shutdown, handle)
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let (addr, _sink, shutdown, handle) = start().await;

        let resp = reqwest::get(format!("http://{addr}/healthz")).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "ok");

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn metrics_exposes_recorded_series() {
        let (addr, sink, shutdown, handle) = start().await;
        sink.set_gauge(TLS_REDIRECT, &[(LABEL_HOST, "good.example")], 1.0);

        let resp = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body = resp.text().await.unwrap();
        assert!(body.contains("sentinel_tls_redirect{host=\"good.example\"} 1"));

        let missing = reqwest::get(format!("http://{addr}/nope")).await.unwrap();
        assert_eq!(missing.status(), 404);

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn accept_errors_are_retried() {
        let attempts = AtomicUsize::new(0);
        let shutdown = CancellationToken::new();

        let conn = next_connection(
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(io::Error::from_raw_os_error(24))
                    } else {
                        Ok(n)
                    }
                }
            },
            &shutdown,
        )
        .await;

        assert_eq!(conn, Some(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_backoff() {
        let shutdown = CancellationToken::new();
        let canceller = shutdown.clone();

        let conn = next_connection(
            || {
                canceller.cancel();
                async { Err::<(), _>(io::Error::from(io::ErrorKind::ConnectionAborted)) }
            },
            &shutdown,
        )
        .await;

        assert_eq!(conn, None);
    }
}
