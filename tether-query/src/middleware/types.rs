//! Core middleware types and traits.

use std::sync::Arc;

use crate::error::QueryError;
use crate::record::FetchResult;
use crate::traits::BoxFuture;

use super::context::FetchContext;

/// Result type for middleware operations.
pub type MiddlewareResult<T> = Result<T, QueryError>;

pub(crate) type Handler<'a> =
    Box<dyn FnOnce(FetchContext) -> BoxFuture<'a, MiddlewareResult<FetchResult>> + Send + 'a>;

/// The next handler in the middleware chain.
///
/// Call this to continue processing to the next stage or the primary fetch.
pub struct Next<'a> {
    pub(crate) inner: Handler<'a>,
}

impl<'a> Next<'a> {
    /// Wrap a handler.
    pub fn new<F>(handler: F) -> Self
    where
        F: FnOnce(FetchContext) -> BoxFuture<'a, MiddlewareResult<FetchResult>> + Send + 'a,
    {
        Self {
            inner: Box::new(handler),
        }
    }

    /// Execute the next handler in the chain.
    pub fn run(self, ctx: FetchContext) -> BoxFuture<'a, MiddlewareResult<FetchResult>> {
        (self.inner)(ctx)
    }
}

/// A stage of the fetch pipeline.
///
/// A stage may rewrite the query before calling `next` (pre-fetch), decorate
/// the result after it (post-fetch), or both.
///
/// # Example
///
/// ```rust,ignore
/// use tether_query::middleware::{FetchContext, Middleware, MiddlewareResult, Next};
/// use tether_query::{BoxFuture, FetchResult};
///
/// struct OnlyPublished;
///
/// impl Middleware for OnlyPublished {
///     fn handle<'a>(
///         &'a self,
///         mut ctx: FetchContext,
///         next: Next<'a>,
///     ) -> BoxFuture<'a, MiddlewareResult<FetchResult>> {
///         Box::pin(async move {
///             ctx.query.conditions = std::mem::take(&mut ctx.query.conditions)
///                 .and_then(Filter::Equals("published".into(), true.into()));
///             next.run(ctx).await
///         })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync {
    /// Handle a fetch, optionally calling the next handler.
    fn handle<'a>(
        &'a self,
        ctx: FetchContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult<FetchResult>>;

    /// Name of this middleware (for debugging/logging).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Whether this middleware is enabled.
    fn enabled(&self) -> bool {
        true
    }
}

/// A middleware that can be shared across threads.
pub type SharedMiddleware = Arc<dyn Middleware>;
