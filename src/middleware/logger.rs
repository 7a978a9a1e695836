//! Request logging middleware.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::context::Context;
use crate::error::Error;
use crate::request::Request;
use crate::sink::ResponseSink;

/// Logs one line per request: method, path, status, and latency, measured
/// around everything downstream via [`Context::next`].
pub async fn logger(
    ctx: Context,
    req: Arc<Request>,
    sink: Arc<dyn ResponseSink>,
) -> Result<(), Error> {
    let start = Instant::now();
    info!(method = %req.method(), path = req.path(), "request started");

    ctx.next().await?;

    info!(
        method = %req.method(),
        path = req.path(),
        status = sink.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use crate::sink::ResponseBuffer;
    use bytes::Bytes;
    use http::{HeaderMap, Method, StatusCode};

    #[tokio::test]
    async fn logger_passes_the_request_through() {
        async fn respond(sink: Arc<dyn ResponseSink>) {
            sink.set_status(StatusCode::CREATED);
        }

        let pipeline = App::new().wrap(logger).action(respond).build();
        let sink = Arc::new(ResponseBuffer::new());
        let ctx = pipeline.context(Arc::clone(&sink) as Arc<dyn ResponseSink>);
        ctx.register(Request::new(
            Method::GET,
            "/".parse().unwrap(),
            HeaderMap::new(),
            Bytes::new(),
        ));

        ctx.run().await.unwrap();
        assert_eq!(sink.status(), StatusCode::CREATED);
    }
}
