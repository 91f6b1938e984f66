//! Model observer rendering: built-in action bodies, stubs for custom
//! actions, and the ObserverServiceProvider wiring.
use super::join_lines;
use crate::naming;
use crate::schema::{Entity, HookAction, Schema};

/// Lifecycle events rendered in Laravel's conventional order; anything
/// else the schema declares follows after.
const STANDARD_EVENTS: [&str; 11] = [
    "retrieved",
    "creating",
    "created",
    "updating",
    "updated",
    "saving",
    "saved",
    "deleting",
    "deleted",
    "restoring",
    "restored",
];

/// Render `app/Observers/<Studly>Observer.php`.
pub fn render(entity: &Entity) -> String {
    let model_class = naming::studly(&entity.name);
    let variable = naming::camel(&entity.name);

    let mut lines: Vec<String> = Vec::new();
    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("namespace App\\Observers;".to_string());
    lines.push(String::new());
    lines.push(format!("use App\\Models\\{model_class};"));
    lines.push("use Illuminate\\Support\\Facades\\Cache;".to_string());
    lines.push("use Illuminate\\Support\\Facades\\Log;".to_string());
    lines.push("use Illuminate\\Support\\Facades\\Storage;".to_string());
    lines.push("use Illuminate\\Support\\Str;".to_string());
    lines.push(String::new());
    lines.push(format!("class {model_class}Observer"));
    lines.push("{".to_string());

    let mut first = true;
    for event in STANDARD_EVENTS {
        if let Some(spec) = entity.observers.get(event) {
            if !first {
                lines.push(String::new());
            }
            first = false;
            lines.extend(event_method(event, spec, &model_class, &variable));
        }
    }
    for (event, spec) in &entity.observers {
        if !STANDARD_EVENTS.contains(&event.as_str()) {
            if !first {
                lines.push(String::new());
            }
            first = false;
            lines.extend(event_method(event, spec, &model_class, &variable));
        }
    }

    for name in custom_actions(entity) {
        lines.push(String::new());
        lines.push(format!(
            "    protected function {}({model_class} ${variable}): void",
            naming::camel(&name)
        ));
        lines.push("    {".to_string());
        lines.push(format!("        // TODO: implement the {name} action."));
        lines.push("    }".to_string());
    }

    lines.push("}".to_string());
    join_lines(&lines)
}

/// Render `app/Providers/ObserverServiceProvider.php`.
pub fn render_service_provider(schema: &Schema) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("namespace App\\Providers;".to_string());
    lines.push(String::new());
    for entity in schema.entities.values() {
        if entity.has_observers() {
            let class = naming::studly(&entity.name);
            lines.push(format!("use App\\Models\\{class};"));
            lines.push(format!("use App\\Observers\\{class}Observer;"));
        }
    }
    lines.push("use Illuminate\\Support\\ServiceProvider;".to_string());
    lines.push(String::new());
    lines.push("class ObserverServiceProvider extends ServiceProvider".to_string());
    lines.push("{".to_string());
    lines.push("    public function register(): void".to_string());
    lines.push("    {".to_string());
    lines.push("        //".to_string());
    lines.push("    }".to_string());
    lines.push(String::new());
    lines.push("    public function boot(): void".to_string());
    lines.push("    {".to_string());
    for entity in schema.entities.values() {
        if entity.has_observers() {
            let class = naming::studly(&entity.name);
            lines.push(format!("        {class}::observe({class}Observer::class);"));
        }
    }
    lines.push("    }".to_string());
    lines.push("}".to_string());
    join_lines(&lines)
}

fn event_method(
    event: &str,
    spec: &crate::schema::HookSpec,
    model_class: &str,
    variable: &str,
) -> Vec<String> {
    let mut lines = vec![
        "    /**".to_string(),
        format!("     * Handle the {model_class} \"{event}\" event."),
        "     */".to_string(),
        format!("    public function {event}({model_class} ${variable}): void"),
        "    {".to_string(),
    ];
    for action in &spec.actions {
        lines.extend(action_body(action, spec.message.as_deref(), variable));
    }
    lines.push("    }".to_string());
    lines
}

fn action_body(action: &HookAction, message: Option<&str>, variable: &str) -> Vec<String> {
    match action {
        HookAction::GenerateUuid => vec![
            format!("        if (empty(${variable}->id)) {{"),
            format!("            ${variable}->id = Str::uuid();"),
            "        }".to_string(),
        ],
        HookAction::ClearCache => vec![format!("        Cache::tags(['{variable}s'])->flush();")],
        HookAction::UpdateSearchIndex => {
            vec![format!("        ${variable}->searchable();")]
        }
        HookAction::CleanupFiles => vec![
            format!(
                "        if (${variable}->isDirty('avatar') && ${variable}->getOriginal('avatar')) {{"
            ),
            format!("            Storage::delete(${variable}->getOriginal('avatar'));"),
            "        }".to_string(),
        ],
        HookAction::Log | HookAction::LogActivity => {
            let text = message.unwrap_or("activity");
            vec![
                format!("        Log::info('{text}', ["),
                format!("            'model_id' => ${variable}->id,"),
                format!("            'model_type' => get_class(${variable}),"),
                "        ]);".to_string(),
            ]
        }
        HookAction::MoveChildrenToParent => vec![
            format!("        if (${variable}->children()->count() > 0) {{"),
            format!("            ${variable}->children()->update(["),
            format!("                'parent_id' => ${variable}->parent_id,"),
            "            ]);".to_string(),
            "        }".to_string(),
        ],
        HookAction::ClearProjectCache => vec![
            format!("        if (${variable}->project) {{"),
            format!("            Cache::tags(['project_' . ${variable}->project->id])->flush();"),
            "        }".to_string(),
        ],
        HookAction::UpdateProjectProgress => vec![
            format!("        if (${variable}->project) {{"),
            format!("            ${variable}->project->updateProgress();"),
            "        }".to_string(),
        ],
        HookAction::ClearProjectsCache => {
            vec!["        Cache::tags(['projects'])->flush();".to_string()]
        }
        HookAction::SanitizeInput => vec![
            // Attribute-level sanitation belongs to the request cycle;
            // observers only get the persisted model.
            format!("        // sanitizeInput is applied in the controller for ${variable}."),
        ],
        HookAction::Custom { name } => {
            vec![format!("        $this->{}(${variable});", naming::camel(name))]
        }
    }
}

fn custom_actions(entity: &Entity) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for spec in entity.observers.values() {
        for action in &spec.actions {
            if let Some(name) = action.custom_name() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
    }
    names
}
