//! Named middleware chain.

use std::sync::Arc;

use crate::record::FetchResult;
use crate::traits::BoxFuture;

use super::context::FetchContext;
use super::types::{Handler, Middleware, MiddlewareResult, Next, SharedMiddleware};

/// An ordered list of named stages that processes fetches.
///
/// The chain executes stages in order, with each stage able to:
/// - Modify the fetch context before passing it on
/// - Modify the result after receiving it from the next stage
/// - Short-circuit by not calling next
///
/// Registering a name that is already present replaces that stage in place,
/// so repeated initialization never attaches a stage twice.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<(String, SharedMiddleware)>,
}

impl MiddlewareChain {
    /// Create an empty middleware chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stage under `name`, appending it or replacing a stage of
    /// the same name. Returns `true` when a stage was replaced.
    pub fn register<M: Middleware + 'static>(
        &mut self,
        name: impl Into<String>,
        middleware: M,
    ) -> bool {
        self.register_shared(name, Arc::new(middleware))
    }

    /// Register an already shared stage.
    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        middleware: SharedMiddleware,
    ) -> bool {
        let name = name.into();
        match self.stages.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => {
                slot.1 = middleware;
                true
            }
            None => {
                self.stages.push((name, middleware));
                false
            }
        }
    }

    /// Register a stage in front of every other stage, replacing any stage
    /// of the same name.
    pub fn prepend<M: Middleware + 'static>(&mut self, name: impl Into<String>, middleware: M) {
        let name = name.into();
        self.stages.retain(|(n, _)| *n != name);
        self.stages.insert(0, (name, Arc::new(middleware)));
    }

    /// Remove the stage registered under `name`.
    pub fn remove(&mut self, name: &str) -> Option<SharedMiddleware> {
        let idx = self.stages.iter().position(|(n, _)| n == name)?;
        Some(self.stages.remove(idx).1)
    }

    /// Whether a stage is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.stages.iter().any(|(n, _)| n == name)
    }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Get the number of stages in the chain.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Execute the chain, ending in `final_handler`.
    pub fn execute<'a, F>(
        &'a self,
        ctx: FetchContext,
        final_handler: F,
    ) -> BoxFuture<'a, MiddlewareResult<FetchResult>>
    where
        F: FnOnce(FetchContext) -> BoxFuture<'a, MiddlewareResult<FetchResult>> + Send + 'a,
    {
        self.execute_at(0, ctx, Box::new(final_handler))
    }

    fn execute_at<'a>(
        &'a self,
        index: usize,
        ctx: FetchContext,
        final_handler: Handler<'a>,
    ) -> BoxFuture<'a, MiddlewareResult<FetchResult>> {
        let Some((_, middleware)) = self.stages.get(index) else {
            return final_handler(ctx);
        };

        if !middleware.enabled() {
            return self.execute_at(index + 1, ctx, final_handler);
        }

        let next = Next::new(move |ctx| self.execute_at(index + 1, ctx, final_handler));
        middleware.handle(ctx, next)
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("stages", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelRef;
    use crate::query::FindQuery;
    use crate::record::Record;
    use crate::relations::RelationRegistry;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    struct Trace {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        enabled: bool,
    }

    impl Middleware for Trace {
        fn handle<'a>(
            &'a self,
            ctx: FetchContext,
            next: Next<'a>,
        ) -> BoxFuture<'a, MiddlewareResult<FetchResult>> {
            Box::pin(async move {
                self.log.lock().push(format!("{}:before", self.label));
                let result = next.run(ctx).await;
                self.log.lock().push(format!("{}:after", self.label));
                result
            })
        }

        fn enabled(&self) -> bool {
            self.enabled
        }
    }

    fn trace(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Trace {
        Trace {
            label,
            log: log.clone(),
            enabled: true,
        }
    }

    fn context() -> FetchContext {
        FetchContext::new(ModelRef::new("Post"), RelationRegistry::shared(), FindQuery::all())
    }

    #[test]
    fn test_middleware_chain_empty() {
        let chain = MiddlewareChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
    }

    #[test]
    fn test_register_replaces_by_name() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();

        assert!(!chain.register("a", trace("a", &log)));
        assert!(!chain.register("b", trace("b", &log)));
        assert!(chain.register("a", trace("a2", &log)));

        assert_eq!(chain.names(), vec!["a", "b"]);
        assert!(chain.remove("a").is_some());
        assert!(!chain.contains("a"));
        assert!(chain.remove("a").is_none());
    }

    #[test]
    fn test_prepend_moves_existing_stage() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.register("a", trace("a", &log));
        chain.register("b", trace("b", &log));
        chain.prepend("b", trace("b", &log));

        assert_eq!(chain.names(), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_execute_runs_stages_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.register("outer", trace("outer", &log));
        chain.register(
            "skipped",
            Trace {
                label: "skipped",
                log: log.clone(),
                enabled: false,
            },
        );
        chain.register("inner", trace("inner", &log));

        let final_log = log.clone();
        let result = chain
            .execute(context(), move |ctx| {
                Box::pin(async move {
                    final_log.lock().push(format!("fetch:{}", ctx.model.name));
                    Ok(FetchResult::Collection(vec![Record::new()]))
                })
            })
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(
            *log.lock(),
            vec![
                "outer:before",
                "inner:before",
                "fetch:Post",
                "inner:after",
                "outer:after"
            ]
        );
    }
}
