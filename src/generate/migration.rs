//! Migration rendering: create-table, modify-users, and pivot tables.
use super::{join_lines, php_string_list};
use crate::schema::{Entity, FieldEntry, FieldSpec, FieldType, PivotSpec};

const AUTO_FIELDS: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

/// Laravel's default users-table columns, skipped by the modify migration.
const DEFAULT_USERS_FIELDS: [&str; 8] = [
    "id",
    "name",
    "email",
    "email_verified_at",
    "password",
    "remember_token",
    "created_at",
    "updated_at",
];

/// Render a create-table migration for an entity.
pub fn render_create(entity: &Entity) -> String {
    let mut body: Vec<String> = Vec::new();
    body.push("$table->id();".to_string());

    for field in entity.fields.values() {
        if AUTO_FIELDS.contains(&field.name.as_str()) {
            continue;
        }
        if let Some(line) = field_line(field) {
            body.push(line);
        }
    }

    body.push("$table->timestamps();".to_string());
    if entity.has_soft_deletes() {
        body.push("$table->softDeletes();".to_string());
    }

    for field in entity.fields.values() {
        if let Some(spec) = field.spec() {
            if spec.has_index() {
                body.push(format!("$table->index('{}');", field.name));
            }
        }
    }

    migration_stub(&entity.table, &body)
}

/// Render an alter migration adding non-default columns to `users`.
pub fn render_modify_users(entity: &Entity) -> String {
    let added: Vec<&FieldEntry> = entity
        .fields
        .values()
        .filter(|f| !DEFAULT_USERS_FIELDS.contains(&f.name.as_str()))
        .collect();

    let mut lines: Vec<String> = Vec::new();
    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("use Illuminate\\Database\\Migrations\\Migration;".to_string());
    lines.push("use Illuminate\\Database\\Schema\\Blueprint;".to_string());
    lines.push("use Illuminate\\Support\\Facades\\Schema;".to_string());
    lines.push(String::new());
    lines.push("return new class extends Migration".to_string());
    lines.push("{".to_string());
    lines.push("    public function up(): void".to_string());
    lines.push("    {".to_string());
    lines.push("        Schema::table('users', function (Blueprint $table) {".to_string());
    for field in &added {
        if let Some(line) = field_line(field) {
            lines.push(format!("            {line}"));
        }
    }
    lines.push("        });".to_string());
    lines.push("    }".to_string());
    lines.push(String::new());
    lines.push("    public function down(): void".to_string());
    lines.push("    {".to_string());
    lines.push("        Schema::table('users', function (Blueprint $table) {".to_string());
    for field in &added {
        lines.push(format!("            $table->dropColumn('{}');", field.name));
    }
    lines.push("        });".to_string());
    lines.push("    }".to_string());
    lines.push("};".to_string());
    join_lines(&lines)
}

/// Render a pivot-table migration, including its composite unique key.
pub fn render_pivot(pivot: &PivotSpec) -> String {
    let mut body: Vec<String> = Vec::new();
    body.push("$table->id();".to_string());
    for field in pivot.fields.values() {
        if let Some(line) = field_line(field) {
            body.push(line);
        }
    }
    body.push("$table->timestamps();".to_string());
    if !pivot.unique.is_empty() {
        body.push(format!("$table->unique([{}]);", php_string_list(&pivot.unique)));
    }
    migration_stub(&pivot.name, &body)
}

fn migration_stub(table: &str, body: &[String]) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("use Illuminate\\Database\\Migrations\\Migration;".to_string());
    lines.push("use Illuminate\\Database\\Schema\\Blueprint;".to_string());
    lines.push("use Illuminate\\Support\\Facades\\Schema;".to_string());
    lines.push(String::new());
    lines.push("return new class extends Migration".to_string());
    lines.push("{".to_string());
    lines.push("    public function up(): void".to_string());
    lines.push("    {".to_string());
    lines.push(format!(
        "        Schema::create('{table}', function (Blueprint $table) {{"
    ));
    for line in body {
        lines.push(format!("            {line}"));
    }
    lines.push("        });".to_string());
    lines.push("    }".to_string());
    lines.push(String::new());
    lines.push("    public function down(): void".to_string());
    lines.push("    {".to_string());
    lines.push(format!("        Schema::dropIfExists('{table}');"));
    lines.push("    }".to_string());
    lines.push("};".to_string());
    join_lines(&lines)
}

/// Render one Blueprint column line for a parsed field.
fn field_line(field: &FieldEntry) -> Option<String> {
    let spec = field.spec()?;
    let name = &field.name;

    let mut line = match &spec.field_type {
        FieldType::Foreign { table } => {
            if name.ends_with("_id") {
                format!("$table->foreignId('{name}')->constrained('{table}')")
            } else {
                format!("$table->unsignedBigInteger('{name}')")
            }
        }
        FieldType::Enum { values } => {
            format!("$table->enum('{name}', [{}])", php_string_list(values))
        }
        FieldType::Decimal { precision, scale } => {
            format!("$table->decimal('{name}', {precision}, {scale})")
        }
        FieldType::Simple { name: type_name } if type_name == "string" => match spec.max_len() {
            Some(max) => format!("$table->string('{name}', {max})"),
            None => format!("$table->string('{name}')"),
        },
        _ => format!("$table->{}('{name}')", spec.migration_method()),
    };

    line.push_str(&modifiers(spec));
    line.push(';');
    Some(line)
}

fn modifiers(spec: &FieldSpec) -> String {
    let mut out = String::new();
    if spec.is_nullable() {
        out.push_str("->nullable()");
    }
    if let Some(default) = spec.default_value() {
        if default == "now" {
            out.push_str("->useCurrent()");
        } else if default == "true" || default == "false" || default.parse::<f64>().is_ok() {
            out.push_str(&format!("->default({default})"));
        } else {
            out.push_str(&format!("->default('{default}')"));
        }
    }
    if spec.is_unique() {
        out.push_str("->unique()");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_from_value;
    use serde_json::json;

    #[test]
    fn create_migration_covers_field_kinds() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {
                "Product": {
                    "fields": {
                        "name": "string|required|max:120",
                        "price": "decimal:8,2|default:0.00",
                        "status": "enum:draft,live|default:draft",
                        "category_id": "foreign:categories|nullable",
                        "tags": "json|nullable",
                        "deleted_at": "timestamp|nullable"
                    }
                },
                "Category": {"fields": {"name": "string"}}
            }
        }));
        let text = render_create(schema.entity("Product").expect("product"));
        assert!(text.contains("Schema::create('products'"));
        assert!(text.contains("$table->string('name', 120);"));
        assert!(text.contains("$table->decimal('price', 8, 2)->default(0.00);"));
        assert!(text.contains("$table->enum('status', ['draft', 'live'])->default('draft');"));
        assert!(text.contains(
            "$table->foreignId('category_id')->constrained('categories')->nullable();"
        ));
        assert!(text.contains("$table->softDeletes();"));
        assert!(text.contains("Schema::dropIfExists('products');"));
    }

    #[test]
    fn modify_users_skips_default_columns() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {
                "User": {
                    "fields": {
                        "name": "string|required",
                        "email": "string|email|unique|required",
                        "avatar": "file:avatars|nullable",
                        "role": "enum:admin,member|default:member"
                    }
                }
            }
        }));
        let text = render_modify_users(schema.entity("User").expect("user"));
        assert!(text.contains("Schema::table('users'"));
        assert!(!text.contains("$table->string('name'"));
        assert!(!text.contains("$table->string('email'"));
        assert!(text.contains("$table->string('avatar')->nullable();"));
        assert!(text.contains("$table->enum('role', ['admin', 'member'])->default('member');"));
        assert!(text.contains("$table->dropColumn('avatar');"));
        assert!(!text.contains("$table->dropColumn('name');"));
    }

    #[test]
    fn pivot_migration_has_composite_unique() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {},
            "pivots": {
                "post_tag": {
                    "fields": {
                        "post_id": "foreign:posts",
                        "tag_id": "foreign:tags",
                        "order": "integer|default:0"
                    },
                    "unique": ["post_id", "tag_id"]
                }
            }
        }));
        let text = render_pivot(&schema.pivots["post_tag"]);
        assert!(text.contains("Schema::create('post_tag'"));
        assert!(text.contains("$table->foreignId('post_id')->constrained('posts');"));
        assert!(text.contains("$table->unique(['post_id', 'tag_id']);"));
        assert!(text.contains("$table->integer('order')->default(0);"));
    }
}
