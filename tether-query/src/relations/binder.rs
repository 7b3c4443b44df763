//! Bind-time decision between native and alternate relations.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::config::RelationsConfig;
use crate::error::QueryResult;
use crate::model::ModelRef;
use crate::traits::{Inflector, ModelLocator, NativeBinder};

use super::config::{KeySpec, RelationConfig};
use super::descriptor::RelationDescriptor;
use super::kind::{Cardinality, RelationKind};
use super::registry::RelationRegistry;

/// Outcome of binding a relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// The host bound the relation; this is its description.
    Native(RelationDescriptor),
    /// The relation was registered as alternate. There is no native binding.
    Alternate,
}

impl Binding {
    /// Whether the host bound the relation.
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }

    /// Whether the relation was registered as alternate.
    pub fn is_alternate(&self) -> bool {
        matches!(self, Self::Alternate)
    }

    /// The native binding, if any.
    pub fn descriptor(&self) -> Option<&RelationDescriptor> {
        match self {
            Self::Native(descriptor) => Some(descriptor),
            Self::Alternate => None,
        }
    }
}

/// Decides, per relation, whether the host or the batch resolver owns it.
///
/// A relation becomes alternate only when its target model can be located
/// and the declaration asks for it (`default: false`, or no flag while
/// `alternate_by_default` is set). Everything else goes to the
/// [`NativeBinder`], whose errors propagate.
#[derive(Clone)]
pub struct RelationBinder {
    locator: Arc<dyn ModelLocator>,
    native: Arc<dyn NativeBinder>,
    inflector: Arc<dyn Inflector>,
    config: RelationsConfig,
}

impl RelationBinder {
    /// Create a binder from its collaborators.
    pub fn new(
        locator: Arc<dyn ModelLocator>,
        native: Arc<dyn NativeBinder>,
        inflector: Arc<dyn Inflector>,
        config: RelationsConfig,
    ) -> Self {
        Self {
            locator,
            native,
            inflector,
            config,
        }
    }

    /// Relation defaults in effect.
    pub fn config(&self) -> &RelationsConfig {
        &self.config
    }

    /// Bind `name` on `from` and register the result in `registry`.
    ///
    /// Exactly one descriptor is registered under `name` on success; the
    /// declaration is recorded alongside it.
    pub fn bind(
        &self,
        registry: &mut RelationRegistry,
        from: &ModelRef,
        kind: RelationKind,
        name: &str,
        config: &RelationConfig,
    ) -> QueryResult<Binding> {
        let target_name = config.target_name(name);
        let wants_alternate = match config.default {
            Some(native) => !native,
            None => self.config.alternate_by_default,
        };

        let target = if wants_alternate {
            self.locator.locate(target_name)
        } else {
            None
        };

        let binding = match target {
            Some(target) => {
                let descriptor = describe(
                    self.inflector.as_ref(),
                    &self.config,
                    from,
                    target,
                    kind,
                    name,
                    config,
                );
                debug!(
                    model = %from.name,
                    relation = %name,
                    kind = %kind,
                    field = %descriptor.field_name,
                    "Registered alternate relation"
                );
                registry.insert(descriptor);
                Binding::Alternate
            }
            None => {
                if wants_alternate {
                    debug!(
                        model = %from.name,
                        relation = %name,
                        target = %target_name,
                        "Alternate target not found, binding natively"
                    );
                }
                let descriptor = self.native.bind(from, kind, name, config)?.native();
                trace!(model = %from.name, relation = %name, "Registered native relation");
                registry.insert(descriptor.clone());
                Binding::Native(descriptor)
            }
        };

        registry.declare(kind, name, config.clone());
        Ok(binding)
    }

    /// Attachment field for a relation without an explicit `fieldName`.
    pub fn field_name(&self, kind: RelationKind, name: &str) -> String {
        derive_field_name(self.inflector.as_ref(), kind, name)
    }
}

impl std::fmt::Debug for RelationBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationBinder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn derive_field_name(inflector: &dyn Inflector, kind: RelationKind, name: &str) -> String {
    let word = match kind.cardinality() {
        Cardinality::ToMany => inflector.pluralize(name),
        Cardinality::ToOne => inflector.singularize(name),
    };
    inflector.underscore(&word)
}

/// Build the descriptor for a relation from its declaration.
///
/// `fieldName` defaults to the inflected relation name; the key defaults to
/// `fieldName` plus the configured suffix. For `hasOne`/`hasMany` the key
/// lives on the target and pairs with the owner's primary key; for
/// `belongsTo` it lives on the owner and pairs with the target's primary key.
fn describe(
    inflector: &dyn Inflector,
    defaults: &RelationsConfig,
    from: &ModelRef,
    target: ModelRef,
    kind: RelationKind,
    name: &str,
    config: &RelationConfig,
) -> RelationDescriptor {
    let field_name = config
        .field_name
        .clone()
        .unwrap_or_else(|| derive_field_name(inflector, kind, name));

    let key: IndexMap<String, String> = match &config.key {
        Some(KeySpec::Map(map)) if !map.is_empty() => map.clone(),
        other => {
            let key = match other {
                Some(KeySpec::Field(field)) => field.clone(),
                _ => format!("{}{}", field_name, defaults.key_suffix),
            };
            let pair = if kind.key_on_target() {
                (from.primary_key.clone(), key)
            } else {
                (key, target.primary_key.clone())
            };
            IndexMap::from([pair])
        }
    };

    RelationDescriptor {
        kind,
        name: name.to_string(),
        from: from.clone(),
        to: target,
        key,
        field_name,
        options: config.options.clone(),
        is_native: false,
    }
}

/// Native binder applying the same naming conventions as alternate binding.
///
/// Used when the host supplies no binder of its own. Targets that cannot be
/// located are described by name with the configured primary key.
#[derive(Clone)]
pub struct ConventionBinder {
    locator: Arc<dyn ModelLocator>,
    inflector: Arc<dyn Inflector>,
    config: RelationsConfig,
}

impl ConventionBinder {
    /// Create a convention binder.
    pub fn new(
        locator: Arc<dyn ModelLocator>,
        inflector: Arc<dyn Inflector>,
        config: RelationsConfig,
    ) -> Self {
        Self {
            locator,
            inflector,
            config,
        }
    }
}

impl NativeBinder for ConventionBinder {
    fn bind(
        &self,
        from: &ModelRef,
        kind: RelationKind,
        name: &str,
        config: &RelationConfig,
    ) -> QueryResult<RelationDescriptor> {
        let target_name = config.target_name(name);
        let target = self.locator.locate(target_name).unwrap_or_else(|| {
            ModelRef::new(target_name).with_primary_key(self.config.primary_key.clone())
        });

        Ok(describe(
            self.inflector.as_ref(),
            &self.config,
            from,
            target,
            kind,
            name,
            config,
        )
        .native())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::inflector::EnglishInflector;
    use crate::model::ModelCatalog;
    use crate::relations::registry::Scope;
    use pretty_assertions::assert_eq;

    struct FailingBinder;

    impl NativeBinder for FailingBinder {
        fn bind(
            &self,
            from: &ModelRef,
            _kind: RelationKind,
            name: &str,
            _config: &RelationConfig,
        ) -> QueryResult<RelationDescriptor> {
            Err(QueryError::relation_not_found(&from.name, name))
        }
    }

    fn catalog() -> Arc<ModelCatalog> {
        Arc::new(
            ModelCatalog::new()
                .with(ModelRef::new("Post"))
                .with(ModelRef::new("Comment"))
                .with(ModelRef::new("User").with_primary_key("_id")),
        )
    }

    fn binder() -> RelationBinder {
        let locator = catalog();
        let inflector: Arc<dyn Inflector> = Arc::new(EnglishInflector::new());
        let config = RelationsConfig::default();
        let native = Arc::new(ConventionBinder::new(
            locator.clone(),
            inflector.clone(),
            config.clone(),
        ));
        RelationBinder::new(locator, native, inflector, config)
    }

    #[test]
    fn test_alternate_when_requested_and_located() {
        let mut registry = RelationRegistry::new();
        let post = ModelRef::new("Post");
        let config = RelationConfig::new().to("Comment").alternate().key("post_id");

        let binding = binder()
            .bind(&mut registry, &post, RelationKind::HasMany, "Comments", &config)
            .unwrap();

        assert!(binding.is_alternate());
        let descriptor = registry.alternate("Comments").unwrap();
        assert_eq!(descriptor.field_name, "comments");
        assert_eq!(descriptor.local_key(), Some("id"));
        assert_eq!(descriptor.foreign_key(), Some("post_id"));
        assert!(registry.native("Comments").is_none());
        assert!(registry.declaration(RelationKind::HasMany, "Comments").is_some());
    }

    #[test]
    fn test_native_without_flag() {
        let mut registry = RelationRegistry::new();
        let post = ModelRef::new("Post");

        let binding = binder()
            .bind(
                &mut registry,
                &post,
                RelationKind::HasMany,
                "Comments",
                &RelationConfig::new().to("Comment"),
            )
            .unwrap();

        assert!(binding.is_native());
        assert!(registry.alternate("Comments").is_none());
        assert_eq!(registry.relations(Scope::Native).len(), 1);
    }

    #[test]
    fn test_unlocated_target_falls_back_to_native() {
        let mut registry = RelationRegistry::new();
        let post = ModelRef::new("Post");
        let config = RelationConfig::new().to("Missing").alternate();

        let binding = binder()
            .bind(&mut registry, &post, RelationKind::HasOne, "Missing", &config)
            .unwrap();

        assert!(binding.is_native());
        assert!(registry.alternate("Missing").is_none());
        assert!(registry.native("Missing").is_some());
    }

    #[test]
    fn test_native_failure_propagates() {
        let locator = catalog();
        let binder = RelationBinder::new(
            locator,
            Arc::new(FailingBinder),
            Arc::new(EnglishInflector::new()),
            RelationsConfig::default(),
        );
        let mut registry = RelationRegistry::new();
        let post = ModelRef::new("Post");

        let err = binder
            .bind(
                &mut registry,
                &post,
                RelationKind::HasMany,
                "Ghosts",
                &RelationConfig::new().alternate(),
            )
            .unwrap_err();

        assert!(err.to_string().contains("Ghosts"));
        assert!(registry.relations(Scope::All).is_empty());
        assert!(registry.declaration(RelationKind::HasMany, "Ghosts").is_none());
    }

    #[test]
    fn test_belongs_to_key_mapping() {
        let mut registry = RelationRegistry::new();
        let post = ModelRef::new("Post");
        let config = RelationConfig::new().to("User").alternate();

        binder()
            .bind(&mut registry, &post, RelationKind::BelongsTo, "Author", &config)
            .unwrap();

        let descriptor = registry.alternate("Author").unwrap();
        assert_eq!(descriptor.field_name, "author");
        assert_eq!(descriptor.local_key(), Some("author_id"));
        assert_eq!(descriptor.foreign_key(), Some("_id"));
    }

    #[test]
    fn test_explicit_key_map_used_verbatim() {
        let mut registry = RelationRegistry::new();
        let post = ModelRef::new("Post");
        let config = RelationConfig::new()
            .to("Comment")
            .alternate()
            .field_name("notes")
            .key_map("note_ids", "id");

        binder()
            .bind(&mut registry, &post, RelationKind::HasMany, "Comments", &config)
            .unwrap();

        let descriptor = registry.alternate("Comments").unwrap();
        assert_eq!(descriptor.field_name, "notes");
        assert_eq!(descriptor.local_key(), Some("note_ids"));
        assert_eq!(descriptor.foreign_key(), Some("id"));
    }

    #[test]
    fn test_alternate_by_default_config() {
        let locator = catalog();
        let inflector: Arc<dyn Inflector> = Arc::new(EnglishInflector::new());
        let config = RelationsConfig {
            alternate_by_default: true,
            ..RelationsConfig::default()
        };
        let binder = RelationBinder::new(
            locator.clone(),
            Arc::new(ConventionBinder::new(locator, inflector.clone(), config.clone())),
            inflector,
            config,
        );
        let mut registry = RelationRegistry::new();
        let post = ModelRef::new("Post");

        let implicit = binder
            .bind(
                &mut registry,
                &post,
                RelationKind::HasOne,
                "Comment",
                &RelationConfig::new(),
            )
            .unwrap();
        let forced = binder
            .bind(
                &mut registry,
                &post,
                RelationKind::HasMany,
                "Comments",
                &RelationConfig::new().to("Comment").native(),
            )
            .unwrap();

        assert!(implicit.is_alternate());
        assert!(forced.is_native());
        assert_eq!(registry.alternate("Comment").unwrap().field_name, "comment");
    }

    #[test]
    fn test_field_name_inflection() {
        let binder = binder();
        assert_eq!(binder.field_name(RelationKind::HasMany, "BlogPost"), "blog_posts");
        assert_eq!(binder.field_name(RelationKind::BelongsTo, "Categories"), "category");
    }
}
