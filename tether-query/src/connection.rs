//! Connections: engines, collaborators, and the fetch pipeline.
//!
//! A [`Connection`] owns everything a repository needs besides its own
//! model identity and registry: the query engines, the model locator, the
//! relation binder, the loaded configuration, and the named fetch pipeline.
//!
//! ```rust,ignore
//! use tether_query::connection::Connection;
//! use tether_query::memory::MemoryEngine;
//!
//! let connection = Connection::builder(MemoryEngine::new())
//!     .route("archive", archive_engine)
//!     .model(ModelRef::new("Post"))
//!     .model(ModelRef::new("Comment").on_connection("archive"))
//!     .build();
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::TetherConfig;
use crate::eager::{BatchResolver, WithTranslator};
use crate::error::{QueryError, QueryResult};
use crate::inflector::EnglishInflector;
use crate::middleware::{FetchContext, Middleware, MiddlewareChain};
use crate::model::{ModelCatalog, ModelRef};
use crate::record::FetchResult;
use crate::relations::{ConventionBinder, RelationBinder};
use crate::traits::{Inflector, ModelLocator, NativeBinder, QueryEngine};

/// Routes models to the engine holding their records.
///
/// Models without a connection name use the default engine.
pub struct EngineRouter {
    default: Arc<dyn QueryEngine>,
    routes: IndexMap<String, Arc<dyn QueryEngine>>,
}

impl EngineRouter {
    /// Create a router with only a default engine.
    pub fn new(default: Arc<dyn QueryEngine>) -> Self {
        Self {
            default,
            routes: IndexMap::new(),
        }
    }

    /// Add a named engine.
    pub fn with_route(mut self, name: impl Into<String>, engine: Arc<dyn QueryEngine>) -> Self {
        self.routes.insert(name.into(), engine);
        self
    }

    /// The default engine.
    pub fn default_engine(&self) -> &Arc<dyn QueryEngine> {
        &self.default
    }

    /// Names of the routed engines.
    pub fn route_names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Engine for `model`.
    pub fn route(&self, model: &ModelRef) -> QueryResult<&Arc<dyn QueryEngine>> {
        match &model.connection {
            None => Ok(&self.default),
            Some(name) => self.routes.get(name).ok_or_else(|| {
                QueryError::connection(format!("no engine registered for connection '{}'", name))
                    .with_model(&model.name)
            }),
        }
    }
}

impl std::fmt::Debug for EngineRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRouter")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A configured connection with its fetch pipeline.
pub struct Connection {
    engines: Arc<EngineRouter>,
    locator: Arc<dyn ModelLocator>,
    binder: RelationBinder,
    config: TetherConfig,
    pipeline: RwLock<MiddlewareChain>,
}

impl Connection {
    /// Start building a connection around a default engine.
    pub fn builder(engine: impl QueryEngine + 'static) -> ConnectionBuilder {
        ConnectionBuilder::new(Arc::new(engine))
    }

    /// Start building a connection around a shared default engine.
    pub fn builder_shared(engine: Arc<dyn QueryEngine>) -> ConnectionBuilder {
        ConnectionBuilder::new(engine)
    }

    /// Loaded configuration.
    pub fn config(&self) -> &TetherConfig {
        &self.config
    }

    /// Relation binder.
    pub fn binder(&self) -> &RelationBinder {
        &self.binder
    }

    /// Model locator.
    pub fn locator(&self) -> &Arc<dyn ModelLocator> {
        &self.locator
    }

    /// Engine router.
    pub fn engines(&self) -> &Arc<EngineRouter> {
        &self.engines
    }

    /// Install the relation translation and resolution stages.
    ///
    /// Safe to call repeatedly: stages are registered by name and replace
    /// themselves. Returns `true` the first time.
    pub fn install_relation_stages(&self) -> bool {
        let mut pipeline = self.pipeline.write();
        let fresh = !pipeline.contains(WithTranslator::STAGE);

        pipeline.register(WithTranslator::STAGE, WithTranslator::new());
        pipeline.register(
            BatchResolver::STAGE,
            BatchResolver::new(
                self.engines.clone(),
                self.locator.clone(),
                self.config.debug.clone(),
            ),
        );

        if fresh {
            debug!(stages = ?pipeline.names(), "Installed relation stages");
        }
        fresh
    }

    /// Register a stage; a stage with the same name is replaced.
    pub fn register_middleware<M: Middleware + 'static>(
        &self,
        name: impl Into<String>,
        middleware: M,
    ) -> bool {
        self.pipeline.write().register(name, middleware)
    }

    /// Remove a stage by name.
    pub fn remove_middleware(&self, name: &str) -> bool {
        self.pipeline.write().remove(name).is_some()
    }

    /// Snapshot of the pipeline.
    pub fn pipeline(&self) -> MiddlewareChain {
        self.pipeline.read().clone()
    }

    /// Run a fetch through the pipeline and the model's engine.
    pub async fn execute(&self, ctx: FetchContext) -> QueryResult<FetchResult> {
        let chain = self.pipeline();
        let engines = self.engines.clone();
        let model = ctx.model.name.clone();

        let result = chain
            .execute(ctx, move |ctx| {
                Box::pin(async move {
                    let FetchContext { model, query, .. } = ctx;
                    let engine = engines.route(&model)?;
                    engine.find(&model, query).await
                })
            })
            .await?;

        debug!(model = %model, records = result.len(), "Fetch complete");
        Ok(result)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("engines", &self.engines)
            .field("config", &self.config)
            .field("pipeline", &*self.pipeline.read())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Connection`].
pub struct ConnectionBuilder {
    default: Arc<dyn QueryEngine>,
    routes: IndexMap<String, Arc<dyn QueryEngine>>,
    catalog: ModelCatalog,
    locator: Option<Arc<dyn ModelLocator>>,
    native: Option<Arc<dyn NativeBinder>>,
    inflector: Option<Arc<dyn Inflector>>,
    config: TetherConfig,
}

impl ConnectionBuilder {
    fn new(default: Arc<dyn QueryEngine>) -> Self {
        Self {
            default,
            routes: IndexMap::new(),
            catalog: ModelCatalog::new(),
            locator: None,
            native: None,
            inflector: None,
            config: TetherConfig::default(),
        }
    }

    /// Add a named engine for models placed on `name`.
    pub fn route(mut self, name: impl Into<String>, engine: impl QueryEngine + 'static) -> Self {
        self.routes.insert(name.into(), Arc::new(engine));
        self
    }

    /// Add a shared named engine.
    pub fn route_shared(mut self, name: impl Into<String>, engine: Arc<dyn QueryEngine>) -> Self {
        self.routes.insert(name.into(), engine);
        self
    }

    /// Register a model with the built-in catalog.
    ///
    /// Ignored when a custom locator is set.
    pub fn model(self, model: ModelRef) -> Self {
        self.catalog.register(model);
        self
    }

    /// Use a custom model locator.
    pub fn locator(mut self, locator: Arc<dyn ModelLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Use the host's native binder.
    pub fn native_binder(mut self, binder: Arc<dyn NativeBinder>) -> Self {
        self.native = Some(binder);
        self
    }

    /// Use a custom inflector.
    pub fn inflector(mut self, inflector: Arc<dyn Inflector>) -> Self {
        self.inflector = Some(inflector);
        self
    }

    /// Use a loaded configuration.
    pub fn config(mut self, config: TetherConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the connection with the relation stages installed.
    pub fn build(self) -> Connection {
        let locator = self
            .locator
            .unwrap_or_else(|| Arc::new(self.catalog) as Arc<dyn ModelLocator>);
        let inflector = self
            .inflector
            .unwrap_or_else(|| Arc::new(EnglishInflector::new()));
        let relations = self.config.relations.clone();
        let native = self.native.unwrap_or_else(|| {
            Arc::new(ConventionBinder::new(
                locator.clone(),
                inflector.clone(),
                relations.clone(),
            ))
        });

        let engines = self
            .routes
            .into_iter()
            .fold(EngineRouter::new(self.default), |router, (name, engine)| {
                router.with_route(name, engine)
            });

        let connection = Connection {
            engines: Arc::new(engines),
            binder: RelationBinder::new(locator.clone(), native, inflector, relations),
            locator,
            config: self.config,
            pipeline: RwLock::new(MiddlewareChain::new()),
        };
        connection.install_relation_stages();

        info!(
            routes = connection.engines.routes.len(),
            alternate_by_default = connection.config.relations.alternate_by_default,
            "Connection ready"
        );
        connection
    }
}
