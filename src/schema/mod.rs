//! In-memory schema model and its parsers.
//!
//! The schema is built once per run from the input JSON and read by every
//! other component. Declaration order of entities and fields is preserved
//! because it drives generated column order and seeding tie-breaks.
use crate::error::DslError;
use crate::naming;
use indexmap::IndexMap;
use serde::Serialize;

mod field;
mod hook;
mod load;
mod policy;
mod relation;

pub use field::{parse_field, FieldSpec, FieldType, SIMPLE_TYPES};
pub use hook::{resolve_hook, HookAction, HookSpec};
pub use load::{load_schema, schema_from_value};
pub use policy::{parse_rule, Condition, PolicyRule, RuleExpr};
pub use relation::{parse_relation, RelationKind, RelationSpec};

/// Canonical route verbs. `index`/`store`/`destroy` are accepted as
/// synonyms and normalized here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteVerb {
    List,
    Show,
    Create,
    Update,
    Delete,
}

impl RouteVerb {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "list" | "index" => Some(RouteVerb::List),
            "show" => Some(RouteVerb::Show),
            "create" | "store" => Some(RouteVerb::Create),
            "update" => Some(RouteVerb::Update),
            "delete" | "destroy" => Some(RouteVerb::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteVerb::List => "list",
            RouteVerb::Show => "show",
            RouteVerb::Create => "create",
            RouteVerb::Update => "update",
            RouteVerb::Delete => "delete",
        }
    }
}

/// One declared field: the raw definition plus its parse result. Parse
/// failures are kept so the validator can report them all at once.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub name: String,
    pub raw: String,
    pub spec: Result<FieldSpec, DslError>,
}

impl FieldEntry {
    pub fn spec(&self) -> Option<&FieldSpec> {
        self.spec.as_ref().ok()
    }
}

/// One declared relation: raw definition plus its parse result.
#[derive(Debug, Clone)]
pub struct RelationEntry {
    pub name: String,
    pub raw: String,
    pub spec: Result<RelationSpec, DslError>,
}

impl RelationEntry {
    pub fn spec(&self) -> Option<&RelationSpec> {
        self.spec.as_ref().ok()
    }
}

/// Factory configuration; presence of the key alone enables the factory.
#[derive(Debug, Clone, Default)]
pub struct FactoryConfig {
    pub count: Option<u64>,
}

impl FactoryConfig {
    pub fn count_or_default(&self) -> u64 {
        self.count.unwrap_or(10)
    }
}

/// A schema-declared data type that becomes a model/table/controller set.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub table: String,
    pub fields: IndexMap<String, FieldEntry>,
    pub relations: IndexMap<String, RelationEntry>,
    pub routes: Vec<RouteVerb>,
    pub scopes: IndexMap<String, String>,
    pub policies: IndexMap<String, PolicyRule>,
    pub hooks: IndexMap<String, HookSpec>,
    pub observers: IndexMap<String, HookSpec>,
    /// Raw per-route filters block consumed by the controller driver.
    pub filters: Option<serde_json::Value>,
    pub factory: Option<FactoryConfig>,
    pub seeder: bool,
    pub has_cache: bool,
}

impl Entity {
    pub fn has_routes(&self) -> bool {
        !self.routes.is_empty()
    }

    pub fn has_route(&self, verb: RouteVerb) -> bool {
        self.routes.contains(&verb)
    }

    pub fn has_policies(&self) -> bool {
        !self.policies.is_empty()
    }

    pub fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    /// Names of file/files fields, in declaration order.
    pub fn file_fields(&self) -> Vec<&str> {
        self.fields
            .values()
            .filter(|f| f.spec().is_some_and(FieldSpec::is_file))
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn has_soft_deletes(&self) -> bool {
        self.fields.contains_key("deleted_at")
    }

    /// belongsTo target entity names, in declaration order.
    pub fn belongs_to_targets(&self) -> Vec<&str> {
        self.relations
            .values()
            .filter_map(|r| r.spec())
            .filter(|s| s.kind == RelationKind::BelongsTo)
            .filter_map(|s| s.target.as_deref())
            .collect()
    }
}

/// Many-to-many join table description; generates only a migration.
#[derive(Debug, Clone)]
pub struct PivotSpec {
    pub name: String,
    pub fields: IndexMap<String, FieldEntry>,
    pub unique: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub provider: String,
    pub guards: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CustomRoute {
    pub method: String,
    pub uri: String,
    pub controller: String,
}

/// The whole parsed schema. Immutable once built for a given run.
#[derive(Debug, Clone)]
pub struct Schema {
    pub project: String,
    pub version: String,
    pub auth: AuthConfig,
    pub global_middlewares: Vec<String>,
    pub entities: IndexMap<String, Entity>,
    pub pivots: IndexMap<String, PivotSpec>,
    pub custom_routes: Vec<CustomRoute>,
    /// Whether the input carried a `meta` block at all (validator check).
    pub has_meta: bool,
    /// The raw input document, used for hashing and the manifest snapshot.
    pub raw: serde_json::Value,
}

impl Schema {
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Find the entity whose table matches `table` exactly, accounting
    /// for the snake-plural default.
    pub fn entity_by_table(&self, table: &str) -> Option<&Entity> {
        self.entities.values().find(|e| e.table == table)
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth.enabled
    }

    pub fn any_seeder(&self) -> bool {
        self.entities.values().any(|e| e.seeder)
    }

    pub fn any_policies(&self) -> bool {
        self.entities.values().any(Entity::has_policies)
    }

    pub fn any_observers(&self) -> bool {
        self.entities.values().any(Entity::has_observers)
    }
}

/// Default table name for an entity declaration.
pub fn default_table(entity_name: &str) -> String {
    naming::snake_plural(entity_name)
}
