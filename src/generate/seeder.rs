//! Seeder rendering: per-entity seeders plus the DatabaseSeeder, whose
//! call list follows the belongsTo dependency order.
use super::join_lines;
use crate::naming;
use crate::order;
use crate::schema::{Entity, RelationKind, Schema};

/// Render `database/seeders/<Studly>Seeder.php`.
pub fn render(entity: &Entity, schema: &Schema) -> String {
    let model_class = naming::studly(&entity.name);
    let count = entity
        .factory
        .as_ref()
        .map(|f| f.count_or_default())
        .unwrap_or(10);

    let parents = belongs_to_parents(entity, schema);
    let attachments = many_to_many_targets(entity, schema);

    let mut lines: Vec<String> = Vec::new();
    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("namespace Database\\Seeders;".to_string());
    lines.push(String::new());
    lines.push(format!("use App\\Models\\{model_class};"));
    for related in related_imports(&parents, &attachments) {
        lines.push(format!("use App\\Models\\{related};"));
    }
    lines.push("use Illuminate\\Database\\Seeder;".to_string());
    lines.push(String::new());
    lines.push(format!("class {model_class}Seeder extends Seeder"));
    lines.push("{".to_string());
    lines.push("    public function run(): void".to_string());
    lines.push("    {".to_string());

    if parents.is_empty() && attachments.is_empty() {
        lines.push(format!("        {model_class}::factory({count})->create();"));
    } else {
        for (relation, target, _) in &parents {
            lines.push(format!(
                "        ${relation}s = {target}::factory(5)->create();"
            ));
        }
        if !parents.is_empty() {
            lines.push(String::new());
        }

        if parents.is_empty() {
            lines.push(format!("        {model_class}::factory({count})->create();"));
        } else {
            lines.push(format!("        {model_class}::factory({count})->create(["));
            for (relation, _, foreign_key) in &parents {
                let key = foreign_key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", naming::snake(relation)));
                lines.push(format!(
                    "            '{key}' => fn () => ${relation}s->random()->id,"
                ));
            }
            lines.push("        ]);".to_string());
        }

        for (relation, target) in &attachments {
            lines.push(String::new());
            lines.push(format!(
                "        ${relation}s = {target}::factory(10)->create();"
            ));
            lines.push(format!(
                "        {model_class}::all()->each(function ({model_class} $record) use (${relation}s) {{"
            ));
            lines.push(format!(
                "            $record->{relation}()->attach(${relation}s->random(3)->pluck('id'));"
            ));
            lines.push("        });".to_string());
        }
    }

    lines.push("    }".to_string());
    lines.push("}".to_string());
    join_lines(&lines)
}

/// Render `database/seeders/DatabaseSeeder.php` calling every entity
/// seeder in dependency order.
pub fn render_database_seeder(schema: &Schema) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("namespace Database\\Seeders;".to_string());
    lines.push(String::new());
    lines.push("use Illuminate\\Database\\Seeder;".to_string());
    lines.push(String::new());
    lines.push("class DatabaseSeeder extends Seeder".to_string());
    lines.push("{".to_string());
    lines.push("    public function run(): void".to_string());
    lines.push("    {".to_string());
    lines.push("        $this->call([".to_string());
    for name in order::seeding_order(schema) {
        if schema.entity(&name).is_some_and(|e| e.seeder) {
            lines.push(format!("            {}Seeder::class,", naming::studly(&name)));
        }
    }
    lines.push("        ]);".to_string());
    lines.push("    }".to_string());
    lines.push("}".to_string());
    join_lines(&lines)
}

type Parent = (String, String, Option<String>);

fn belongs_to_parents(entity: &Entity, schema: &Schema) -> Vec<Parent> {
    entity
        .relations
        .values()
        .filter_map(|relation| {
            let spec = relation.spec()?;
            if spec.kind != RelationKind::BelongsTo {
                return None;
            }
            let target = spec.target.as_deref()?;
            schema.entity(target)?;
            Some((
                relation.name.clone(),
                naming::studly(target),
                spec.foreign_key.clone(),
            ))
        })
        .collect()
}

fn many_to_many_targets(entity: &Entity, schema: &Schema) -> Vec<(String, String)> {
    entity
        .relations
        .values()
        .filter_map(|relation| {
            let spec = relation.spec()?;
            if spec.kind != RelationKind::BelongsToMany {
                return None;
            }
            let target = spec.target.as_deref()?;
            schema.entity(target)?;
            Some((relation.name.clone(), naming::studly(target)))
        })
        .collect()
}

fn related_imports(parents: &[Parent], attachments: &[(String, String)]) -> Vec<String> {
    let mut imports: Vec<String> = Vec::new();
    for (_, target, _) in parents {
        if !imports.contains(target) {
            imports.push(target.clone());
        }
    }
    for (_, target) in attachments {
        if !imports.contains(target) {
            imports.push(target.clone());
        }
    }
    imports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_from_value;
    use serde_json::json;

    fn blog_schema() -> Schema {
        schema_from_value(json!({
            "meta": {},
            "models": {
                "Comment": {
                    "fields": {"body": "text|required"},
                    "relations": {"post": "belongsTo:Post"},
                    "seeder": true,
                    "factory": {"count": 30}
                },
                "Post": {
                    "fields": {"title": "string|required"},
                    "relations": {
                        "author": "belongsTo:User,user_id",
                        "tags": "belongsToMany:Tag"
                    },
                    "seeder": true,
                    "factory": {"count": 12}
                },
                "User": {
                    "fields": {"name": "string|required"},
                    "seeder": true
                },
                "Tag": {
                    "fields": {"name": "string|required"},
                    "seeder": true
                }
            }
        }))
    }

    #[test]
    fn simple_seeder_is_one_factory_call() {
        let schema = blog_schema();
        let text = render(schema.entity("User").expect("user"), &schema);
        assert!(text.contains("User::factory(10)->create();"));
    }

    #[test]
    fn belongs_to_parents_are_seeded_first() {
        let schema = blog_schema();
        let text = render(schema.entity("Post").expect("post"), &schema);
        assert!(text.contains("$authors = User::factory(5)->create();"));
        assert!(text.contains("Post::factory(12)->create(["));
        assert!(text.contains("'user_id' => fn () => $authors->random()->id,"));
        assert!(text.contains("$record->tags()->attach($tagss->random(3)->pluck('id'));"));
    }

    #[test]
    fn database_seeder_follows_dependency_order() {
        let schema = blog_schema();
        let text = render_database_seeder(&schema);
        let user = text.find("UserSeeder::class").expect("user seeder");
        let post = text.find("PostSeeder::class").expect("post seeder");
        let comment = text.find("CommentSeeder::class").expect("comment seeder");
        assert!(user < post);
        assert!(post < comment);
    }
}
