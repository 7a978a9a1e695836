//! HTTP server and graceful shutdown.
//!
//! The serving glue: accept connections, turn each request into a
//! [`Context`], run the pipeline, and convert the sink's buffer into the
//! wire response. An unrecovered fatal error from the pipeline becomes a
//! `500` for that request and ends that request's task cleanly — it never
//! takes the process down.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** (what Kubernetes and `kill` send) or **Ctrl-C** the
//! server stops accepting immediately, lets every in-flight connection
//! task run to completion, then returns from [`Server::serve`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::app::Pipeline;
use crate::error::Error;
use crate::request::Request;
use crate::sink::{ResponseBuffer, ResponseSink};

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and running each request through
    /// `pipeline`. Returns only after a full graceful shutdown.
    pub async fn serve(self, pipeline: Pipeline) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        info!(addr = %self.addr, "selene listening");

        // JoinSet tracks every spawned connection task so shutdown can
        // wait for all of them.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a shutdown signal
                // must win over queued connections.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let pipeline = pipeline.clone();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection, not
                        // once per connection.
                        let svc = service_fn(move |req| {
                            let pipeline = pipeline.clone();
                            async move { handle(pipeline, req).await }
                        });

                        // Serves whichever of HTTP/1.1 and HTTP/2 the
                        // client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not
                // grow without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("selene stopped");
        Ok(())
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// Hot path: one request through the pipeline, one response out.
///
/// The error type is [`Infallible`] — every failure is mapped to an HTTP
/// response here, so hyper never sees an error.
async fn handle(
    pipeline: Pipeline,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let request = match Request::read(req).await {
        Ok(r) => r,
        Err(e) => {
            error!("failed to read request: {e}");
            return Ok(plain_status(StatusCode::BAD_REQUEST));
        }
    };

    let sink = Arc::new(ResponseBuffer::new());
    let ctx = pipeline.context(Arc::clone(&sink) as Arc<dyn ResponseSink>);
    ctx.register(request);

    match ctx.run().await {
        Ok(()) => Ok(sink.take_response()),
        Err(e) => {
            error!("pipeline error: {e}");
            Ok(plain_status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn plain_status(status: StatusCode) -> http::Response<Full<Bytes>> {
    let mut response = http::Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C, for
/// local dev). On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` never resolves — on non-Unix platforms the SIGTERM arm
    // is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
