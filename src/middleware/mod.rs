//! Built-in middleware.
//!
//! Middleware are ordinary injectable handlers that call
//! [`Context::next`](crate::Context::next) to yield to the rest of the
//! chain, which makes them the right place for anything that must happen
//! *around* downstream execution: request logging, panic recovery,
//! authentication, timing.
//!
//! ```rust,no_run
//! use selene::{App, middleware};
//!
//! let app = App::new()
//!     .wrap(middleware::logger)
//!     .wrap(middleware::recovery);
//! ```

mod logger;
mod recovery;

pub use logger::logger;
pub use recovery::recovery;
