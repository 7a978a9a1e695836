//! Built-in Kubernetes health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Register them on your router:
//!
//! ```rust,no_run
//! use selene::{Router, health};
//!
//! let routes = Router::new()
//!     .get("/healthz", health::liveness)
//!     .get("/readyz", health::readiness);
//! ```
//!
//! Override `readiness` with your own handler if traffic should be gated
//! on dependency availability — it can inject whatever it needs to check.

use std::sync::Arc;

use crate::sink::ResponseSink;

/// Liveness probe handler. Always answers `200 OK` with body `"ok"` — if
/// the process can respond to HTTP at all, it is alive, so this handler
/// deliberately injects nothing.
pub async fn liveness(sink: Arc<dyn ResponseSink>) {
    sink.write(b"ok");
}

/// Readiness probe handler (default implementation). Answers `200 OK`
/// with body `"ready"`.
pub async fn readiness(sink: Arc<dyn ResponseSink>) {
    sink.write(b"ready");
}
