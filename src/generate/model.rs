//! Eloquent model rendering.
use super::{join_lines, php_string_list};
use crate::naming;
use crate::schema::{Entity, FieldType, RelationKind, RelationSpec};

const AUTO_FIELDS: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

/// Render `app/Models/<Studly>.php` for an entity.
pub fn render(entity: &Entity) -> String {
    let class_name = naming::studly(&entity.name);
    let mut lines: Vec<String> = Vec::new();

    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("namespace App\\Models;".to_string());
    lines.push(String::new());
    lines.extend(imports(entity));
    lines.push(String::new());
    lines.push(format!("class {class_name} extends Model"));
    lines.push("{".to_string());
    lines.push(format!("    use {};", traits(entity).join(", ")));
    lines.push(String::new());
    lines.push(format!("    protected $table = '{}';", entity.table));

    let fillable = fillable_fields(entity);
    if !fillable.is_empty() {
        lines.push(String::new());
        lines.push("    protected $fillable = [".to_string());
        for field in &fillable {
            lines.push(format!("        '{field}',"));
        }
        lines.push("    ];".to_string());
    }

    let casts = casts(entity);
    if !casts.is_empty() {
        lines.push(String::new());
        lines.push("    protected $casts = [".to_string());
        for (field, cast) in &casts {
            lines.push(format!("        '{field}' => '{cast}',"));
        }
        lines.push("    ];".to_string());
    }

    for relation in entity.relations.values() {
        if let Some(spec) = relation.spec() {
            if let Some(method) = relation_method(&relation.name, spec) {
                lines.push(String::new());
                lines.extend(method);
            }
        }
    }

    for (scope_name, definition) in &entity.scopes {
        if let Some(method) = scope_method(scope_name, definition) {
            lines.push(String::new());
            lines.extend(method);
        }
    }

    lines.push("}".to_string());
    join_lines(&lines)
}

fn traits(entity: &Entity) -> Vec<&'static str> {
    let mut traits = vec!["HasFactory"];
    if entity.has_soft_deletes() {
        traits.push("SoftDeletes");
    }
    traits
}

fn imports(entity: &Entity) -> Vec<String> {
    let mut imports = vec![
        "use Illuminate\\Database\\Eloquent\\Factories\\HasFactory;".to_string(),
        "use Illuminate\\Database\\Eloquent\\Model;".to_string(),
    ];

    let mut kinds: Vec<RelationKind> = Vec::new();
    for relation in entity.relations.values() {
        if let Some(spec) = relation.spec() {
            if !kinds.contains(&spec.kind) {
                kinds.push(spec.kind);
            }
        }
    }
    for kind in kinds {
        let class = match kind {
            RelationKind::BelongsTo => "BelongsTo",
            RelationKind::HasOne => "HasOne",
            RelationKind::HasMany => "HasMany",
            RelationKind::BelongsToMany => "BelongsToMany",
            RelationKind::MorphTo => "MorphTo",
            RelationKind::MorphMany => "MorphMany",
            RelationKind::MorphedByMany => "MorphToMany",
        };
        imports.push(format!(
            "use Illuminate\\Database\\Eloquent\\Relations\\{class};"
        ));
    }

    if entity.has_soft_deletes() {
        imports.push("use Illuminate\\Database\\Eloquent\\SoftDeletes;".to_string());
    }
    imports.sort();
    imports.dedup();
    imports
}

fn fillable_fields(entity: &Entity) -> Vec<&str> {
    entity
        .fields
        .keys()
        .map(String::as_str)
        .filter(|name| !AUTO_FIELDS.contains(name))
        .collect()
}

fn casts(entity: &Entity) -> Vec<(String, &'static str)> {
    let mut casts = Vec::new();
    for field in entity.fields.values() {
        let Some(spec) = field.spec() else { continue };
        let cast = match &spec.field_type {
            FieldType::Simple { name } => match name.as_str() {
                "boolean" => Some("boolean"),
                "json" => Some("array"),
                "date" => Some("date"),
                "datetime" | "timestamp" => Some("datetime"),
                "float" => Some("float"),
                "integer" => Some("integer"),
                _ => None,
            },
            FieldType::Decimal { .. } => Some("float"),
            FieldType::File { multiple: true, .. } => Some("array"),
            _ => None,
        };
        if let Some(cast) = cast {
            casts.push((field.name.clone(), cast));
        } else if field.name.contains("password") {
            casts.push((field.name.clone(), "hashed"));
        }
    }
    casts
}

fn relation_method(name: &str, spec: &RelationSpec) -> Option<Vec<String>> {
    let method_name = naming::camel(name);
    let target_class = spec.target.as_deref().map(naming::studly);

    let (return_type, body) = match spec.kind {
        RelationKind::BelongsTo | RelationKind::HasOne | RelationKind::HasMany => {
            let target = target_class?;
            let builder = match spec.kind {
                RelationKind::BelongsTo => "belongsTo",
                RelationKind::HasOne => "hasOne",
                _ => "hasMany",
            };
            let return_type = match spec.kind {
                RelationKind::BelongsTo => "BelongsTo",
                RelationKind::HasOne => "HasOne",
                _ => "HasMany",
            };
            let key = spec
                .foreign_key
                .as_deref()
                .map(|k| format!(", '{k}'"))
                .unwrap_or_default();
            (
                return_type,
                format!("return $this->{builder}({target}::class{key});"),
            )
        }
        RelationKind::BelongsToMany => {
            let target = target_class?;
            let mut params = String::new();
            if let Some(pivot) = &spec.pivot_table {
                params.push_str(&format!(", '{pivot}'"));
                if let Some(fk) = &spec.foreign_pivot_key {
                    params.push_str(&format!(", '{fk}'"));
                    if let Some(rk) = &spec.related_pivot_key {
                        params.push_str(&format!(", '{rk}'"));
                    }
                }
            }
            (
                "BelongsToMany",
                format!("return $this->belongsToMany({target}::class{params});"),
            )
        }
        RelationKind::MorphTo => ("MorphTo", "return $this->morphTo();".to_string()),
        RelationKind::MorphMany => {
            let target = target_class?;
            let morph = spec
                .morph_name
                .clone()
                .unwrap_or_else(|| naming::snake(name));
            (
                "MorphMany",
                format!("return $this->morphMany({target}::class, '{morph}');"),
            )
        }
        RelationKind::MorphedByMany => {
            let target = target_class?;
            let morph = spec
                .morph_name
                .clone()
                .unwrap_or_else(|| "taggable".to_string());
            (
                "MorphToMany",
                format!("return $this->morphedByMany({target}::class, '{morph}');"),
            )
        }
    };

    Some(vec![
        format!("    public function {method_name}(): {return_type}"),
        "    {".to_string(),
        format!("        {body}"),
        "    }".to_string(),
    ])
}

fn scope_method(name: &str, definition: &str) -> Option<Vec<String>> {
    let method_name = format!("scope{}", naming::studly(name));
    let body = if let Some(rest) = definition.strip_prefix("where:") {
        let mut parts = rest.splitn(2, ',');
        let field = parts.next()?;
        let value = parts.next().unwrap_or("true");
        format!("return $query->where('{field}', '{value}');")
    } else if let Some(rest) = definition.strip_prefix("orderBy:") {
        let mut parts = rest.splitn(2, ',');
        let field = parts.next()?;
        let direction = parts.next().unwrap_or("asc");
        format!("return $query->orderBy('{field}', '{direction}');")
    } else if let Some(field) = definition.strip_prefix("whereNull:") {
        format!("return $query->whereNull('{field}');")
    } else {
        return None;
    };

    Some(vec![
        format!("    public function {method_name}($query)"),
        "    {".to_string(),
        format!("        {body}"),
        "    }".to_string(),
    ])
}
