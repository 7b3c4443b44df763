//! Integration tests for binding, overriding and resetting relations.

use std::sync::Arc;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tether::middleware::{FetchContext, Middleware, MiddlewareResult, Next};
use tether::prelude::*;
use tether::{BoxFuture, ErrorCode, RelationsConfig};

fn setup() -> (Arc<MemoryEngine>, Repository) {
    let comments: Vec<Value> = (1..=8)
        .map(|id| json!({"id": id, "post_id": 1 + id % 2}))
        .collect();
    let engine = Arc::new(
        MemoryEngine::new()
            .with_json("Post", json!([{"id": 1}, {"id": 2}]))
            .with_json("Comment", Value::Array(comments)),
    );
    let connection = Arc::new(
        Connection::builder_shared(engine.clone())
            .model(ModelRef::new("Post"))
            .model(ModelRef::new("Comment"))
            .model(ModelRef::new("User"))
            .build(),
    );
    let repo = Repository::new(ModelRef::new("Post"), connection);
    repo.bind(
        RelationKind::HasMany,
        "Comments",
        RelationConfig::new().to("Comment").alternate().key("post_id"),
    )
    .unwrap();
    repo.bind(RelationKind::BelongsTo, "User", RelationConfig::new())
        .unwrap();
    (engine, repo)
}

fn patch(value: Value) -> IndexMap<String, Value> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_relation_lives_in_exactly_one_subset() {
    let (_, repo) = setup();

    assert!(repo.registry().read().alternate("Comments").is_some());
    assert!(repo.registry().read().native("Comments").is_none());
    assert!(repo.registry().read().native("User").is_some());
    assert!(repo.registry().read().alternate("User").is_none());

    repo.bind(
        RelationKind::HasMany,
        "Comments",
        RelationConfig::new().to("Comment").native(),
    )
    .unwrap();

    assert!(repo.registry().read().alternate("Comments").is_none());
    assert!(repo.registry().read().native("Comments").is_some());
}

#[test]
fn test_get_by_scope() {
    let (_, repo) = setup();

    let Some(RelationLookup::Relation(comments)) = repo.relation("Comments", Scope::All) else {
        panic!("Comments should resolve in the combined scope");
    };
    assert_eq!(comments.field_name, "comments");
    assert_eq!(comments.local_key(), Some("id"));
    assert_eq!(comments.foreign_key(), Some("post_id"));

    assert_eq!(repo.relation("Comments", Scope::Native), None);
    assert_eq!(
        repo.relation("belongsTo", Scope::Native),
        Some(RelationLookup::Names(vec!["User".to_string()]))
    );

    let names: Vec<String> = repo
        .relations(Scope::All)
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["User".to_string(), "Comments".to_string()]);
}

#[tokio::test]
async fn test_override_then_reset_restores_relations() {
    let (engine, repo) = setup();
    let before = repo.relations(Scope::All);

    repo.override_kind(RelationKind::HasMany, &patch(json!({"Comments": {"limit": 5}})))
        .unwrap();

    let overridden = repo.registry().read().alternate("Comments").cloned().unwrap();
    assert_eq!(overridden.options.limit, Some(5));

    repo.find_all(FindQuery::all().with("Comments")).await.unwrap();
    assert_eq!(engine.queries_for("Comment")[0].limit, Some(5));

    assert!(repo.reset_relations());
    assert_eq!(repo.relations(Scope::All), before);

    engine.clear_log();
    repo.find_all(FindQuery::all().with("Comments")).await.unwrap();
    assert_eq!(engine.queries_for("Comment")[0].limit, None);
}

#[test]
fn test_reset_returns_to_state_before_first_override() {
    let (_, repo) = setup();
    let before = repo.relations(Scope::All);

    repo.override_relation("hasMany", &patch(json!({"Comments": {"limit": 5}})))
        .unwrap();
    repo.override_relation("hasMany", &patch(json!({"Comments": {"limit": 2}})))
        .unwrap();
    assert_eq!(
        repo.registry().read().alternate("Comments").unwrap().options.limit,
        Some(2)
    );

    assert!(repo.reset_relations());
    assert_eq!(repo.relations(Scope::All), before);
}

#[test]
fn test_override_can_switch_binding() {
    let (_, repo) = setup();

    repo.override_kind(RelationKind::HasMany, &patch(json!({"Comments": {"default": true}})))
        .unwrap();
    assert!(repo.registry().read().native("Comments").is_some());
    assert!(repo.registry().read().alternate("Comments").is_none());

    assert!(repo.reset_relations());
    assert!(repo.registry().read().alternate("Comments").is_some());
}

#[test]
fn test_override_merges_conditions() {
    let (_, repo) = setup();
    repo.override_kind(
        RelationKind::HasMany,
        &patch(json!({"Comments": {"conditions": {"published": true}, "fields": ["id"]}})),
    )
    .unwrap();
    repo.override_kind(
        RelationKind::HasMany,
        &patch(json!({"Comments": {"conditions": {"spam": false}, "fields": ["body"]}})),
    )
    .unwrap();

    let comments = repo.registry().read().alternate("Comments").cloned().unwrap();
    let conditions: Vec<&str> = comments.options.conditions.keys().map(String::as_str).collect();
    assert_eq!(conditions, vec!["published", "spam"]);
    assert_eq!(
        comments.options.fields,
        Some(vec!["id".to_string(), "body".to_string()])
    );
}

#[test]
fn test_empty_or_unknown_overrides_change_nothing() {
    let (_, repo) = setup();
    let before = repo.relations(Scope::All);

    repo.override_kind(RelationKind::HasMany, &IndexMap::new()).unwrap();
    assert!(!repo.override_relation("manyToMany", &patch(json!({"Comments": {}}))).unwrap());

    assert_eq!(repo.relations(Scope::All), before);
    assert!(!repo.reset_relations());
}

#[test]
fn test_invalid_override_is_rejected_without_changes() {
    let (_, repo) = setup();
    let before = repo.relations(Scope::All);

    let err = repo
        .override_kind(RelationKind::HasMany, &patch(json!({"Comments": {"limit": "five"}})))
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidRelationOptions);
    assert_eq!(repo.relations(Scope::All), before);
    assert!(!repo.registry().read().has_snapshot());
}

#[tokio::test]
async fn test_repeated_stage_installation_keeps_one_batch_query() {
    let (engine, repo) = setup();
    assert!(!repo.connection().install_relation_stages());
    assert!(!repo.connection().install_relation_stages());
    assert_eq!(repo.connection().pipeline().len(), 2);

    repo.find_all(FindQuery::all().with("Comments")).await.unwrap();

    assert_eq!(engine.queries_for("Comment").len(), 1);
}

struct OnlyEven;

impl Middleware for OnlyEven {
    fn handle<'a>(
        &'a self,
        mut ctx: FetchContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult<FetchResult>> {
        Box::pin(async move {
            ctx.query.conditions = std::mem::take(&mut ctx.query.conditions)
                .and_then(Filter::Equals("id".into(), 2.into()));
            next.run(ctx).await
        })
    }
}

#[tokio::test]
async fn test_custom_stage_runs_with_relation_stages() {
    let (engine, repo) = setup();
    assert!(!repo.connection().register_middleware("only-even", OnlyEven));

    let rows = repo.find_all(FindQuery::all().with("Comments")).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!(2));
    assert_eq!(rows[0]["comments"].as_array().map(Vec::len), Some(4));
    assert_eq!(engine.queries_for("Comment").len(), 1);

    assert!(repo.connection().remove_middleware("only-even"));
    let rows = repo.find_all(FindQuery::all()).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_alternate_by_default_binds_undeclared_relations_as_alternate() {
    let engine = MemoryEngine::new();
    let config = TetherConfig {
        relations: RelationsConfig {
            alternate_by_default: true,
            ..RelationsConfig::default()
        },
        ..TetherConfig::default()
    };
    let connection = Arc::new(
        Connection::builder(engine)
            .config(config)
            .model(ModelRef::new("Comment"))
            .build(),
    );
    let repo = Repository::new(ModelRef::new("Post"), connection);

    let located = repo
        .bind(RelationKind::HasMany, "Comments", RelationConfig::new().to("Comment"))
        .unwrap();
    let forced = repo
        .bind(
            RelationKind::HasOne,
            "Pin",
            RelationConfig::new().to("Comment").native(),
        )
        .unwrap();
    let missing = repo
        .bind(RelationKind::HasMany, "Likes", RelationConfig::new().alternate())
        .unwrap();

    assert!(located.is_alternate());
    assert!(forced.is_native());
    assert!(missing.is_native());
}
