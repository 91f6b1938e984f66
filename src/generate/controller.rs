//! API controller rendering: CRUD methods from route verbs, validation
//! from field specs, hook call sites, and file upload/download endpoints.
use super::join_lines;
use crate::naming;
use crate::schema::{Condition, Entity, HookAction, RouteVerb, RuleExpr};

/// Render `app/Http/Controllers/<Studly>Controller.php`.
pub fn render(entity: &Entity) -> String {
    let model_class = naming::studly(&entity.name);
    let variable = naming::camel(&entity.name);

    let mut lines: Vec<String> = Vec::new();
    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("namespace App\\Http\\Controllers;".to_string());
    lines.push(String::new());
    lines.push(format!("use App\\Models\\{model_class};"));
    lines.push("use Illuminate\\Http\\JsonResponse;".to_string());
    lines.push("use Illuminate\\Http\\Request;".to_string());
    if uses_log(entity) {
        lines.push("use Illuminate\\Support\\Facades\\Log;".to_string());
    }
    if !entity.file_fields().is_empty() {
        lines.push("use Illuminate\\Support\\Facades\\Storage;".to_string());
    }
    lines.push(String::new());
    lines.push(format!("class {model_class}Controller extends Controller"));
    lines.push("{".to_string());

    let mut sections: Vec<Vec<String>> = Vec::new();

    if let Some(constructor) = middleware_constructor(entity) {
        sections.push(constructor);
    }

    for verb in &entity.routes {
        sections.push(match verb {
            RouteVerb::List => index_method(entity, &model_class),
            RouteVerb::Show => show_method(&model_class, &variable),
            RouteVerb::Create => store_method(entity, &model_class, &variable),
            RouteVerb::Update => update_method(entity, &model_class, &variable),
            RouteVerb::Delete => destroy_method(entity, &model_class, &variable),
        });
    }

    for field in entity.file_fields() {
        sections.push(upload_method(field, &model_class, &variable));
        sections.push(download_method(field, &model_class, &variable));
    }

    sections.extend(hook_handlers(entity, &variable));

    for (i, section) in sections.into_iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(section);
    }

    lines.push("}".to_string());
    join_lines(&lines)
}

fn uses_log(entity: &Entity) -> bool {
    entity
        .hooks
        .values()
        .flat_map(|spec| spec.actions.iter())
        .any(|action| matches!(action, HookAction::Log | HookAction::LogActivity))
}

/// Per-field Laravel validation strings, declaration order.
fn validation_rules(entity: &Entity) -> Vec<(String, String)> {
    entity
        .fields
        .values()
        .filter_map(|field| {
            let spec = field.spec()?;
            if spec.validations.is_empty() {
                return None;
            }
            Some((field.name.clone(), spec.validations.join("|")))
        })
        .collect()
}

fn validation_block(entity: &Entity, for_update: bool) -> Vec<String> {
    let rules = validation_rules(entity);
    if rules.is_empty() {
        return vec!["        $validated = $request->all();".to_string()];
    }
    let mut lines = vec!["        $validated = $request->validate([".to_string()];
    for (field, rule) in rules {
        let rule = if for_update {
            rule.replace("required", "sometimes")
        } else {
            rule
        };
        lines.push(format!("            '{field}' => '{rule}',"));
    }
    lines.push("        ]);".to_string());
    lines
}

fn index_method(entity: &Entity, model_class: &str) -> Vec<String> {
    let mut lines = vec![
        "    public function index(Request $request): JsonResponse".to_string(),
        "    {".to_string(),
        format!("        $query = {model_class}::query();"),
    ];

    // Default filters from the schema's index block.
    if let Some(filters) = entity
        .filters
        .as_ref()
        .and_then(|f| f.get("index"))
    {
        if let Some(wheres) = filters.get("where").and_then(|w| w.as_object()) {
            for (field, value) in wheres {
                if value.as_str() == Some("$auth.id") {
                    lines.push(format!("        $query->where('{field}', auth()->id());"));
                } else if let Some(text) = value.as_str() {
                    lines.push(format!("        $query->where('{field}', '{text}');"));
                }
            }
        }
        if let Some(order) = filters.get("orderBy").and_then(|o| o.as_array()) {
            let field = order.first().and_then(|f| f.as_str()).unwrap_or("id");
            let direction = order.get(1).and_then(|d| d.as_str()).unwrap_or("asc");
            lines.push(format!("        $query->orderBy('{field}', '{direction}');"));
        }
        if let Some(with) = filters.get("with").and_then(|w| w.as_array()) {
            let relations: Vec<&str> = with.iter().filter_map(|r| r.as_str()).collect();
            if !relations.is_empty() {
                lines.push(format!(
                    "        $query->with(['{}']);",
                    relations.join("', '")
                ));
            }
        }
    }

    lines.push(String::new());
    lines.push("        return response()->json($query->paginate($request->get('per_page', 15)));".to_string());
    lines.push("    }".to_string());
    lines
}

fn show_method(model_class: &str, variable: &str) -> Vec<String> {
    vec![
        format!("    public function show({model_class} ${variable}): JsonResponse"),
        "    {".to_string(),
        format!("        return response()->json(${variable});"),
        "    }".to_string(),
    ]
}

fn store_method(entity: &Entity, model_class: &str, variable: &str) -> Vec<String> {
    let mut lines = vec![
        "    public function store(Request $request): JsonResponse".to_string(),
        "    {".to_string(),
    ];
    lines.extend(validation_block(entity, false));
    if entity.hooks.contains_key("beforeCreate") {
        lines.push("        $validated = $this->handleBeforeCreate($validated);".to_string());
    }
    lines.push(String::new());
    lines.push(format!("        ${variable} = {model_class}::create($validated);"));
    if entity.hooks.contains_key("afterCreate") {
        lines.push(format!("        $this->handleAfterCreate(${variable});"));
    }
    lines.push(String::new());
    lines.push(format!("        return response()->json(${variable}, 201);"));
    lines.push("    }".to_string());
    lines
}

fn update_method(entity: &Entity, model_class: &str, variable: &str) -> Vec<String> {
    let mut lines = vec![
        format!("    public function update(Request $request, {model_class} ${variable}): JsonResponse"),
        "    {".to_string(),
    ];
    lines.extend(validation_block(entity, true));
    if entity.hooks.contains_key("beforeUpdate") {
        lines.push(format!(
            "        $validated = $this->handleBeforeUpdate(${variable}, $validated);"
        ));
    }
    lines.push(String::new());
    lines.push(format!("        ${variable}->update($validated);"));
    if entity.hooks.contains_key("afterUpdate") {
        lines.push(format!("        $this->handleAfterUpdate(${variable});"));
    }
    lines.push(String::new());
    lines.push(format!("        return response()->json(${variable});"));
    lines.push("    }".to_string());
    lines
}

fn destroy_method(entity: &Entity, model_class: &str, variable: &str) -> Vec<String> {
    let mut lines = vec![
        format!("    public function destroy({model_class} ${variable}): JsonResponse"),
        "    {".to_string(),
    ];
    if entity.hooks.contains_key("beforeDelete") {
        lines.push(format!("        $this->handleBeforeDelete(${variable});"));
    }
    lines.push(format!("        ${variable}->delete();"));
    if entity.hooks.contains_key("afterDelete") {
        lines.push(format!("        $this->handleAfterDelete(${variable});"));
    }
    lines.push(String::new());
    lines.push("        return response()->json(null, 204);".to_string());
    lines.push("    }".to_string());
    lines
}

fn upload_method(field: &str, model_class: &str, variable: &str) -> Vec<String> {
    let method = naming::studly(field);
    vec![
        format!("    public function upload{method}(Request $request, {model_class} ${variable}): JsonResponse"),
        "    {".to_string(),
        format!("        $request->validate(['{field}' => 'required|file']);"),
        format!("        $path = $request->file('{field}')->store('{field}');"),
        format!("        ${variable}->update(['{field}' => $path]);"),
        String::new(),
        format!("        return response()->json(['{field}' => $path]);"),
        "    }".to_string(),
    ]
}

fn download_method(field: &str, model_class: &str, variable: &str) -> Vec<String> {
    let method = naming::studly(field);
    vec![
        format!("    public function download{method}({model_class} ${variable})"),
        "    {".to_string(),
        format!("        abort_unless(${variable}->{field}, 404);"),
        String::new(),
        format!("        return Storage::download(${variable}->{field});"),
        "    }".to_string(),
    ]
}

/// Policies that translate directly to route middleware get a
/// constructor; everything else is enforced by the policy class.
fn middleware_constructor(entity: &Entity) -> Option<Vec<String>> {
    let mut middlewares = Vec::new();
    for (action, rule) in &entity.policies {
        if let RuleExpr::Atom { condition } = &rule.expr {
            match condition {
                Condition::Role { roles } => middlewares.push(format!(
                    "        $this->middleware('role:{}')->only(['{action}']);",
                    roles.join(",")
                )),
                Condition::Authenticated => middlewares.push(format!(
                    "        $this->middleware('auth:sanctum')->only(['{action}']);"
                )),
                _ => {}
            }
        }
    }
    if middlewares.is_empty() {
        return None;
    }
    let mut lines = vec![
        "    public function __construct()".to_string(),
        "    {".to_string(),
    ];
    lines.extend(middlewares);
    lines.push("    }".to_string());
    Some(lines)
}

/// Private handler methods for each hook stage, plus stubs for custom
/// actions the schema names but does not define.
fn hook_handlers(entity: &Entity, variable: &str) -> Vec<Vec<String>> {
    let mut sections = Vec::new();

    for (stage, spec) in &entity.hooks {
        let handler = format!("handle{}", naming::studly(stage));
        // beforeCreate/beforeUpdate transform the validated data; every
        // other stage only sees the model.
        let returns_data = matches!(stage.as_str(), "beforeCreate" | "beforeUpdate");
        let signature = match stage.as_str() {
            "beforeCreate" => format!("    private function {handler}(array $data): array"),
            "beforeUpdate" => {
                format!("    private function {handler}(${variable}, array $data): array")
            }
            _ => format!("    private function {handler}(${variable}): void"),
        };

        let mut lines = vec![signature, "    {".to_string()];
        for action in &spec.actions {
            match action {
                HookAction::SanitizeInput if returns_data => {
                    lines.push("        foreach ($data as $key => $value) {".to_string());
                    lines.push("            if (is_string($value)) {".to_string());
                    lines.push("                $data[$key] = trim(strip_tags($value));".to_string());
                    lines.push("            }".to_string());
                    lines.push("        }".to_string());
                }
                HookAction::Log => {
                    let message = spec
                        .message
                        .clone()
                        .unwrap_or_else(|| format!("{stage} event"));
                    lines.push(format!("        Log::info('{message}');"));
                }
                HookAction::Custom { name } => {
                    let argument = if returns_data {
                        "$data".to_string()
                    } else {
                        format!("${variable}")
                    };
                    lines.push(format!("        $this->{}({argument});", naming::camel(name)));
                }
                _ => {}
            }
        }
        if returns_data {
            lines.push("        return $data;".to_string());
        }
        lines.push("    }".to_string());
        sections.push(lines);
    }

    // One stub per distinct custom action.
    let mut custom_names: Vec<&str> = Vec::new();
    for spec in entity.hooks.values() {
        for action in &spec.actions {
            if let Some(name) = action.custom_name() {
                if !custom_names.contains(&name) {
                    custom_names.push(name);
                }
            }
        }
    }
    for name in custom_names {
        sections.push(vec![
            format!("    private function {}($payload)", naming::camel(name)),
            "    {".to_string(),
            format!("        // TODO: implement the {name} hook action."),
            "        return $payload;".to_string(),
            "    }".to_string(),
        ]);
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_from_value;
    use serde_json::json;

    #[test]
    fn renders_crud_methods_for_declared_verbs() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {
                "Post": {
                    "fields": {
                        "title": "string|required|max:255",
                        "body": "text|required"
                    },
                    "routes": ["list", "show", "create", "update", "delete"]
                }
            }
        }));
        let text = render(schema.entity("Post").expect("post"));
        assert!(text.contains("public function index(Request $request)"));
        assert!(text.contains("public function show(Post $post)"));
        assert!(text.contains("public function store(Request $request)"));
        assert!(text.contains("public function update(Request $request, Post $post)"));
        assert!(text.contains("public function destroy(Post $post)"));
        assert!(text.contains("'title' => 'required|max:255',"));
        // Update validation relaxes required.
        assert!(text.contains("'title' => 'sometimes|max:255',"));
        assert!(text.contains("return response()->json($post, 201);"));
    }

    #[test]
    fn partial_route_sets_render_partial_controllers() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {
                "Stat": {
                    "fields": {"value": "integer"},
                    "routes": ["list"]
                }
            }
        }));
        let text = render(schema.entity("Stat").expect("stat"));
        assert!(text.contains("public function index"));
        assert!(!text.contains("public function store"));
        assert!(!text.contains("public function destroy"));
    }

    #[test]
    fn file_fields_get_upload_and_download_endpoints() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {
                "Report": {
                    "fields": {
                        "title": "string|required",
                        "attachment": "file:reports|nullable"
                    },
                    "routes": ["show"]
                }
            }
        }));
        let text = render(schema.entity("Report").expect("report"));
        assert!(text.contains("public function uploadAttachment"));
        assert!(text.contains("public function downloadAttachment"));
        assert!(text.contains("Storage::download($report->attachment);"));
    }

    #[test]
    fn hooks_become_call_sites_and_stubs() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {
                "Task": {
                    "fields": {"name": "string|required"},
                    "routes": ["create"],
                    "hooks": {
                        "beforeCreate": ["sanitizeInput", "notifySlack"]
                    }
                }
            }
        }));
        let text = render(schema.entity("Task").expect("task"));
        assert!(text.contains("$validated = $this->handleBeforeCreate($validated);"));
        assert!(text.contains("private function handleBeforeCreate(array $data): array"));
        assert!(text.contains("trim(strip_tags($value))"));
        assert!(text.contains("$this->notifySlack($data);"));
        assert!(text.contains("private function notifySlack($payload)"));
    }

    #[test]
    fn simple_policies_become_middleware() {
        let schema = schema_from_value(json!({
            "meta": {},
            "models": {
                "Page": {
                    "fields": {"title": "string"},
                    "routes": ["update"],
                    "policies": {
                        "update": "role:admin",
                        "delete": "authenticated"
                    }
                }
            }
        }));
        let text = render(schema.entity("Page").expect("page"));
        assert!(text.contains("$this->middleware('role:admin')->only(['update']);"));
        assert!(text.contains("$this->middleware('auth:sanctum')->only(['delete']);"));
    }
}
