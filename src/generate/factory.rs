//! Model factory rendering.
//!
//! Fake-value expressions are chosen by field name first, then by type;
//! enum and boolean flag fields also get convenience states.
use super::{join_lines, php_string_list};
use crate::naming;
use crate::schema::{Entity, FieldEntry, FieldType};

const AUTO_FIELDS: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

/// Render `database/factories/<Studly>Factory.php`.
pub fn render(entity: &Entity) -> String {
    let model_class = naming::studly(&entity.name);

    let mut lines: Vec<String> = Vec::new();
    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("namespace Database\\Factories;".to_string());
    lines.push(String::new());
    lines.push(format!("use App\\Models\\{model_class};"));
    lines.push("use Illuminate\\Database\\Eloquent\\Factories\\Factory;".to_string());
    lines.push(String::new());
    lines.push("/**".to_string());
    lines.push(format!(
        " * @extends \\Illuminate\\Database\\Eloquent\\Factories\\Factory<\\App\\Models\\{model_class}>"
    ));
    lines.push(" */".to_string());
    lines.push(format!("class {model_class}Factory extends Factory"));
    lines.push("{".to_string());
    lines.push(format!("    protected $model = {model_class}::class;"));
    lines.push(String::new());
    lines.push("    /**".to_string());
    lines.push("     * @return array<string, mixed>".to_string());
    lines.push("     */".to_string());
    lines.push("    public function definition(): array".to_string());
    lines.push("    {".to_string());
    lines.push("        return [".to_string());
    for field in entity.fields.values() {
        if AUTO_FIELDS.contains(&field.name.as_str()) {
            continue;
        }
        lines.push(format!(
            "            '{}' => {},",
            field.name,
            fake_value(field)
        ));
    }
    lines.push("        ];".to_string());
    lines.push("    }".to_string());

    for state in states(entity) {
        lines.push(String::new());
        lines.extend(state);
    }

    lines.push("}".to_string());
    join_lines(&lines)
}

fn fake_value(field: &FieldEntry) -> String {
    let Some(spec) = field.spec() else {
        return "fake()->word()".to_string();
    };

    if let FieldType::Foreign { table } = &spec.field_type {
        let related = naming::studly(&naming::singular(table));
        if spec.is_nullable() {
            return format!(
                "fake()->optional()->randomElement([null, \\App\\Models\\{related}::factory()])"
            );
        }
        return format!("\\App\\Models\\{related}::factory()");
    }

    match field.name.to_lowercase().as_str() {
        "email" => return "fake()->unique()->safeEmail()".to_string(),
        "name" => return "fake()->name()".to_string(),
        "title" => return "fake()->sentence(3)".to_string(),
        "description" | "bio" => return "fake()->paragraph()".to_string(),
        "content" => return "fake()->paragraphs(3, true)".to_string(),
        "slug" => return "fake()->slug()".to_string(),
        "password" => return "bcrypt('password')".to_string(),
        "phone" => return "fake()->phoneNumber()".to_string(),
        "address" => return "fake()->address()".to_string(),
        "url" | "website" => return "fake()->url()".to_string(),
        _ => {}
    }

    match &spec.field_type {
        FieldType::Simple { name } => match name.as_str() {
            "string" => {
                if spec.validations.iter().any(|v| v == "email") {
                    "fake()->unique()->safeEmail()".to_string()
                } else {
                    match spec.max_len() {
                        Some(max) if max <= 50 => "fake()->word()".to_string(),
                        _ => "fake()->sentence()".to_string(),
                    }
                }
            }
            "text" | "longText" => "fake()->paragraph()".to_string(),
            "integer" => "fake()->numberBetween(1, 1000)".to_string(),
            "float" => "fake()->randomFloat(2, 0, 999.99)".to_string(),
            "boolean" => "fake()->boolean()".to_string(),
            "date" => "fake()->date()".to_string(),
            "datetime" | "timestamp" => "fake()->dateTime()".to_string(),
            "json" => "['key' => fake()->word()]".to_string(),
            "uuid" => "fake()->uuid()".to_string(),
            _ => "fake()->word()".to_string(),
        },
        FieldType::Decimal { scale, .. } => {
            format!("fake()->randomFloat({scale}, 0, 999.99)")
        }
        FieldType::Enum { values } => {
            format!("fake()->randomElement([{}])", php_string_list(values))
        }
        // Uploads need real files; tests attach them explicitly.
        FieldType::File { .. } => "null".to_string(),
        _ => "fake()->word()".to_string(),
    }
}

fn states(entity: &Entity) -> Vec<Vec<String>> {
    let mut sections = Vec::new();

    for flag in ["is_active", "active"] {
        if entity.fields.contains_key(flag) {
            sections.push(state_section("inactive", flag, "false"));
            break;
        }
    }
    for flag in ["published", "is_published"] {
        if entity.fields.contains_key(flag) {
            sections.push(state_section("unpublished", flag, "false"));
            break;
        }
    }

    for field in entity.fields.values() {
        if let Some(FieldType::Enum { values }) = field.spec().map(|s| &s.field_type) {
            for value in values {
                sections.push(state_section(
                    &naming::camel(value),
                    &field.name,
                    &format!("'{value}'"),
                ));
            }
        }
    }

    sections
}

fn state_section(method: &str, field: &str, value: &str) -> Vec<String> {
    vec![
        format!("    public function {method}(): static"),
        "    {".to_string(),
        format!("        return $this->state(['{field}' => {value}]);"),
        "    }".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_from_value;
    use serde_json::json;

    #[test]
    fn picks_fakes_by_name_then_type() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {
                "User": {
                    "fields": {
                        "name": "string|required",
                        "email": "string|email|unique|required",
                        "age": "integer|nullable",
                        "balance": "decimal:10,2|default:0",
                        "password": "string|required|min:8"
                    },
                    "factory": {"count": 5}
                }
            }
        }));
        let text = render(schema.entity("User").expect("user"));
        assert!(text.contains("'name' => fake()->name(),"));
        assert!(text.contains("'email' => fake()->unique()->safeEmail(),"));
        assert!(text.contains("'age' => fake()->numberBetween(1, 1000),"));
        assert!(text.contains("'balance' => fake()->randomFloat(2, 0, 999.99),"));
        assert!(text.contains("'password' => bcrypt('password'),"));
    }

    #[test]
    fn foreign_keys_use_related_factories() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {
                "Comment": {
                    "fields": {
                        "body": "text|required",
                        "post_id": "foreign:posts|required",
                        "parent_id": "foreign:comments|nullable"
                    },
                    "factory": true
                }
            }
        }));
        let text = render(schema.entity("Comment").expect("comment"));
        assert!(text.contains("'post_id' => \\App\\Models\\Post::factory(),"));
        assert!(text.contains(
            "'parent_id' => fake()->optional()->randomElement([null, \\App\\Models\\Comment::factory()]),"
        ));
    }

    #[test]
    fn enum_fields_generate_states() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {
                "Ticket": {
                    "fields": {
                        "status": "enum:open,closed|default:open",
                        "is_active": "boolean|default:true"
                    },
                    "factory": true
                }
            }
        }));
        let text = render(schema.entity("Ticket").expect("ticket"));
        assert!(text.contains("'status' => fake()->randomElement(['open', 'closed']),"));
        assert!(text.contains("public function open(): static"));
        assert!(text.contains("public function closed(): static"));
        assert!(text.contains("public function inactive(): static"));
        assert!(text.contains("return $this->state(['is_active' => false]);"));
    }
}
