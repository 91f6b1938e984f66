//! Raw JSON to schema model.
//!
//! This is the only place raw definition strings are interpreted; the
//! rest of the crate works on the parsed structures. Malformed field and
//! relation strings are preserved as errors on their entries so the
//! validator can report every problem in one pass.
use super::{
    default_table, parse_field, parse_relation, resolve_hook, AuthConfig, CustomRoute, Entity,
    FactoryConfig, FieldEntry, PivotSpec, PolicyRule, RelationEntry, RouteVerb, Schema,
};
use crate::error::{DslError, SchemaError};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;

/// Load and parse a schema file.
pub fn load_schema(path: &Path) -> Result<Schema, SchemaError> {
    if !path.exists() {
        return Err(SchemaError::SchemaNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|_| SchemaError::SchemaNotFound(path.to_path_buf()))?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|source| SchemaError::InvalidSchemaJson {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(schema_from_value(value))
}

/// Build the schema model from an already-parsed JSON document.
pub fn schema_from_value(raw: Value) -> Schema {
    let meta = raw.get("meta");
    let auth = meta
        .and_then(|m| m.get("auth"))
        .map(parse_auth)
        .unwrap_or_default();

    let mut entities = IndexMap::new();
    if let Some(models) = raw.get("models").and_then(Value::as_object) {
        for (name, config) in models {
            entities.insert(name.clone(), parse_entity(name, config));
        }
    }

    let mut pivots = IndexMap::new();
    if let Some(raw_pivots) = raw.get("pivots").and_then(Value::as_object) {
        for (name, config) in raw_pivots {
            pivots.insert(name.clone(), parse_pivot(name, config));
        }
    }

    Schema {
        project: string_at(meta, "project").unwrap_or_else(|| "GeneratedAPI".to_string()),
        version: string_at(meta, "version").unwrap_or_else(|| "1.0.0".to_string()),
        auth,
        global_middlewares: string_list(meta.and_then(|m| m.get("middlewares"))),
        entities,
        pivots,
        custom_routes: parse_custom_routes(&raw),
        has_meta: meta.is_some(),
        raw,
    }
}

fn parse_auth(value: &Value) -> AuthConfig {
    AuthConfig {
        enabled: value
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        provider: value
            .get("provider")
            .and_then(Value::as_str)
            .unwrap_or("sanctum")
            .to_string(),
        guards: string_list(value.get("guards")),
    }
}

fn parse_entity(name: &str, config: &Value) -> Entity {
    let table = config
        .get("table")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| default_table(name));

    let mut routes = Vec::new();
    for token in string_list(config.get("routes")) {
        if let Some(verb) = RouteVerb::parse(&token) {
            if !routes.contains(&verb) {
                routes.push(verb);
            }
        }
    }

    Entity {
        name: name.to_string(),
        table,
        fields: parse_fields(config.get("fields")),
        relations: parse_relations(config.get("relations")),
        routes,
        scopes: string_map(config.get("scopes")),
        policies: parse_policies(config.get("policies")),
        hooks: parse_hooks(config.get("hooks")),
        observers: parse_hooks(config.get("observers")),
        filters: config.get("filters").cloned(),
        factory: parse_factory(config.get("factory")),
        seeder: config
            .get("seeder")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        has_cache: config.get("cache").is_some_and(|c| !c.is_null()),
    }
}

fn parse_pivot(name: &str, config: &Value) -> PivotSpec {
    PivotSpec {
        name: name.to_string(),
        fields: parse_fields(config.get("fields")),
        unique: string_list(config.get("unique")),
    }
}

fn parse_fields(value: Option<&Value>) -> IndexMap<String, FieldEntry> {
    let mut fields = IndexMap::new();
    let Some(map) = value.and_then(Value::as_object) else {
        return fields;
    };
    for (field_name, definition) in map {
        let entry = match definition.as_str() {
            Some(raw) => FieldEntry {
                name: field_name.clone(),
                raw: raw.to_string(),
                spec: parse_field(raw),
            },
            None => FieldEntry {
                name: field_name.clone(),
                raw: definition.to_string(),
                spec: Err(DslError::MalformedFieldSpec {
                    definition: definition.to_string(),
                    reason: "field definition must be a string".to_string(),
                }),
            },
        };
        fields.insert(field_name.clone(), entry);
    }
    fields
}

fn parse_relations(value: Option<&Value>) -> IndexMap<String, RelationEntry> {
    let mut relations = IndexMap::new();
    let Some(map) = value.and_then(Value::as_object) else {
        return relations;
    };
    for (relation_name, definition) in map {
        let raw = definition.as_str().unwrap_or_default().to_string();
        let spec = parse_relation(&raw).map_err(|reason| DslError::MalformedRelationSpec {
            definition: raw.clone(),
            reason,
        });
        relations.insert(
            relation_name.clone(),
            RelationEntry {
                name: relation_name.clone(),
                raw,
                spec,
            },
        );
    }
    relations
}

fn parse_policies(value: Option<&Value>) -> IndexMap<String, PolicyRule> {
    let mut policies = IndexMap::new();
    let Some(map) = value.and_then(Value::as_object) else {
        return policies;
    };
    for (action, rule) in map {
        if let Some(raw) = rule.as_str() {
            policies.insert(action.clone(), super::parse_rule(raw));
        }
    }
    policies
}

fn parse_hooks(value: Option<&Value>) -> IndexMap<String, super::HookSpec> {
    let mut hooks = IndexMap::new();
    let Some(map) = value.and_then(Value::as_object) else {
        return hooks;
    };
    for (stage, definition) in map {
        if let Some(spec) = resolve_hook(definition) {
            hooks.insert(stage.clone(), spec);
        }
    }
    hooks
}

fn parse_factory(value: Option<&Value>) -> Option<FactoryConfig> {
    match value? {
        // An explicit `false` disables the factory; any other presence
        // enables it.
        Value::Bool(false) | Value::Null => None,
        Value::Bool(true) => Some(FactoryConfig::default()),
        Value::Object(map) => Some(FactoryConfig {
            count: map.get("count").and_then(Value::as_u64),
        }),
        _ => Some(FactoryConfig::default()),
    }
}

fn parse_custom_routes(raw: &Value) -> Vec<CustomRoute> {
    let Some(routes) = raw
        .get("custom")
        .and_then(|c| c.get("routes"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    routes
        .iter()
        .filter_map(|route| {
            Some(CustomRoute {
                method: route.get("method")?.as_str()?.to_string(),
                uri: route.get("uri")?.as_str()?.to_string(),
                controller: route.get("controller")?.as_str()?.to_string(),
            })
        })
        .collect()
}

fn string_at(value: Option<&Value>, key: &str) -> Option<String> {
    value?.get(key)?.as_str().map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn string_map(value: Option<&Value>) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    if let Some(object) = value.and_then(Value::as_object) {
        for (key, entry) in object {
            if let Some(text) = entry.as_str() {
                map.insert(key.clone(), text.to_string());
            }
        }
    }
    map
}
