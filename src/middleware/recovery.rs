//! Panic recovery middleware.

use std::sync::Arc;

use futures_util::FutureExt;
use http::StatusCode;
use tracing::error;

use crate::context::Context;
use crate::error::Error;
use crate::sink::ResponseSink;

/// Protective boundary around everything downstream: a panicking handler
/// becomes a `500` for this request instead of a dead connection.
///
/// The pipeline itself escalates failures and recovers nothing; install
/// this as the outermost (first) middleware to contain panics from the
/// whole chain.
pub async fn recovery(ctx: Context, sink: Arc<dyn ResponseSink>) -> Result<(), Error> {
    match std::panic::AssertUnwindSafe(ctx.next()).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(&panic);
            error!(panic = message, "handler panicked");
            if !sink.written() {
                sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                sink.write(b"Internal Server Error");
            }
            Ok(())
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use crate::sink::ResponseBuffer;

    #[tokio::test]
    async fn panics_downstream_become_a_500() {
        async fn explodes() {
            panic!("boom");
        }

        let pipeline = App::new().wrap(recovery).action(explodes).build();
        let sink = Arc::new(ResponseBuffer::new());
        let ctx = pipeline.context(Arc::clone(&sink) as Arc<dyn ResponseSink>);

        ctx.run().await.unwrap();
        assert_eq!(sink.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(sink.written());
    }

    #[tokio::test]
    async fn an_already_written_response_is_left_alone() {
        async fn writes_then_panics(sink: Arc<dyn ResponseSink>) {
            sink.set_status(StatusCode::ACCEPTED);
            panic!("late panic");
        }

        let pipeline = App::new().wrap(recovery).action(writes_then_panics).build();
        let sink = Arc::new(ResponseBuffer::new());
        let ctx = pipeline.context(Arc::clone(&sink) as Arc<dyn ResponseSink>);

        ctx.run().await.unwrap();
        assert_eq!(sink.status(), StatusCode::ACCEPTED);
    }
}
