//! Fetch pipeline built from named stages.
//!
//! Every fetch runs through a [`MiddlewareChain`] before and after the
//! primary query. The relation stages installed by
//! [`Connection`](crate::connection::Connection) live here alongside any
//! stage the host registers:
//!
//! - `relations.translate` splits requested relations into native and alternate
//! - `relations.resolve` batch-loads alternate relations after the fetch
//!
//! # Example
//!
//! ```rust,ignore
//! use tether_query::middleware::MiddlewareChain;
//!
//! let mut chain = MiddlewareChain::new();
//! chain.register("audit", AuditMiddleware::new());
//! // Registering the same name again replaces the stage.
//! chain.register("audit", AuditMiddleware::verbose());
//! ```

mod chain;
mod context;
mod types;

pub use chain::MiddlewareChain;
pub use context::FetchContext;
pub use types::{Middleware, MiddlewareResult, Next, SharedMiddleware};
