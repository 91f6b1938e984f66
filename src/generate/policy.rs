//! Authorization policy rendering from parsed rule expressions, plus the
//! AuthServiceProvider registering every policy class.
use super::join_lines;
use crate::naming;
use crate::schema::{Condition, Entity, RuleExpr, Schema};

const STANDARD_ACTIONS: [&str; 7] = [
    "viewAny",
    "view",
    "create",
    "update",
    "delete",
    "restore",
    "forceDelete",
];

/// Actions whose signature takes no model instance.
const CLASS_LEVEL_ACTIONS: [&str; 2] = ["viewAny", "create"];

/// Render `app/Policies/<Studly>Policy.php`.
pub fn render(entity: &Entity) -> String {
    let model_class = naming::studly(&entity.name);
    let variable = naming::camel(&entity.name);

    let mut lines: Vec<String> = Vec::new();
    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("namespace App\\Policies;".to_string());
    lines.push(String::new());
    lines.push(format!("use App\\Models\\{model_class};"));
    lines.push("use App\\Models\\User;".to_string());
    lines.push("use Illuminate\\Auth\\Access\\HandlesAuthorization;".to_string());
    lines.push("use Illuminate\\Auth\\Access\\Response;".to_string());
    lines.push(String::new());
    lines.push(format!("class {model_class}Policy"));
    lines.push("{".to_string());
    lines.push("    use HandlesAuthorization;".to_string());

    for action in STANDARD_ACTIONS {
        lines.push(String::new());
        match entity.policies.get(action) {
            Some(rule) => lines.extend(rule_method(action, &rule.expr, &model_class, &variable)),
            None => lines.extend(default_method(action, &model_class, &variable)),
        }
    }

    for (action, rule) in &entity.policies {
        if !STANDARD_ACTIONS.contains(&action.as_str()) {
            lines.push(String::new());
            lines.extend(rule_method(action, &rule.expr, &model_class, &variable));
        }
    }

    lines.push("}".to_string());
    join_lines(&lines)
}

/// Render `app/Providers/AuthServiceProvider.php` mapping models to
/// their policy classes.
pub fn render_service_provider(schema: &Schema) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("namespace App\\Providers;".to_string());
    lines.push(String::new());
    for entity in schema.entities.values() {
        if entity.has_policies() {
            let class = naming::studly(&entity.name);
            lines.push(format!("use App\\Models\\{class};"));
            lines.push(format!("use App\\Policies\\{class}Policy;"));
        }
    }
    lines.push(
        "use Illuminate\\Foundation\\Support\\Providers\\AuthServiceProvider as ServiceProvider;"
            .to_string(),
    );
    lines.push(String::new());
    lines.push("class AuthServiceProvider extends ServiceProvider".to_string());
    lines.push("{".to_string());
    lines.push("    /**".to_string());
    lines.push("     * @var array<class-string, class-string>".to_string());
    lines.push("     */".to_string());
    lines.push("    protected $policies = [".to_string());
    for entity in schema.entities.values() {
        if entity.has_policies() {
            let class = naming::studly(&entity.name);
            lines.push(format!("        {class}::class => {class}Policy::class,"));
        }
    }
    lines.push("    ];".to_string());
    lines.push(String::new());
    lines.push("    public function boot(): void".to_string());
    lines.push("    {".to_string());
    lines.push("        $this->registerPolicies();".to_string());
    lines.push("    }".to_string());
    lines.push("}".to_string());
    join_lines(&lines)
}

fn signature(action: &str, model_class: &str, variable: &str) -> String {
    if CLASS_LEVEL_ACTIONS.contains(&action) {
        format!("    public function {action}(User $user): Response")
    } else {
        format!("    public function {action}(User $user, {model_class} ${variable}): Response")
    }
}

fn rule_method(action: &str, expr: &RuleExpr, model_class: &str, variable: &str) -> Vec<String> {
    vec![
        "    /**".to_string(),
        format!("     * Determine whether the user can {action} the model."),
        "     */".to_string(),
        signature(action, model_class, variable),
        "    {".to_string(),
        format!(
            "        return {} ? Response::allow() : Response::deny();",
            render_expr(expr, variable)
        ),
        "    }".to_string(),
    ]
}

fn default_method(action: &str, model_class: &str, variable: &str) -> Vec<String> {
    let body = match action {
        "viewAny" | "view" => "return Response::allow();".to_string(),
        "create" => "return $user ? Response::allow() : Response::deny();".to_string(),
        "update" | "delete" => format!(
            "return $user->id === ${variable}->user_id ? Response::allow() : Response::deny();"
        ),
        _ => "return $user->isAdmin() ? Response::allow() : Response::deny();".to_string(),
    };
    vec![
        "    /**".to_string(),
        format!("     * Determine whether the user can {action} the model."),
        "     */".to_string(),
        signature(action, model_class, variable),
        "    {".to_string(),
        format!("        {body}"),
        "    }".to_string(),
    ]
}

fn render_expr(expr: &RuleExpr, variable: &str) -> String {
    match expr {
        RuleExpr::Atom { condition } => render_condition(condition, variable),
        RuleExpr::All { conditions } => {
            let parts: Vec<String> = conditions
                .iter()
                .map(|c| render_condition(c, variable))
                .collect();
            format!("({})", parts.join(" && "))
        }
        RuleExpr::Any { clauses } => {
            let parts: Vec<String> = clauses.iter().map(|c| render_expr(c, variable)).collect();
            format!("({})", parts.join(" || "))
        }
    }
}

fn render_condition(condition: &Condition, variable: &str) -> String {
    match condition {
        Condition::Role { roles } => {
            let checks: Vec<String> = roles
                .iter()
                .map(|role| format!("$user->hasRole('{role}')"))
                .collect();
            format!("({})", checks.join(" || "))
        }
        Condition::Owner => format!("$user->id === ${variable}->user_id"),
        Condition::Authenticated => "$user !== null".to_string(),
        Condition::Public => format!("${variable}->is_public === true"),
        Condition::Collaborator => {
            format!("${variable}->collaborators->contains($user->id)")
        }
        Condition::ProjectMember => format!(
            "(${variable}->project->collaborators->contains($user->id) || \
             ${variable}->project->user_id === $user->id)"
        ),
        Condition::ProjectOwner => format!("${variable}->project->user_id === $user->id"),
        Condition::Assignee => format!("${variable}->user_id === $user->id"),
        Condition::FieldEquals { field, value } => {
            if field == "user_id" || field == "owner_id" {
                format!("$user->id === ${variable}->{field}")
            } else {
                format!("${variable}->{field} === '{value}'")
            }
        }
        Condition::Predicate { method } => format!("$user->{method}()"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_from_value;
    use serde_json::json;

    fn doc_schema() -> Schema {
        schema_from_value(json!({
            "meta": {},
            "models": {
                "Doc": {
                    "fields": {"title": "string|required"},
                    "policies": {
                        "view": "public|owner",
                        "update": "role:admin,owner",
                        "delete": "role:admin|owner",
                        "publish": "status:draft"
                    }
                }
            }
        }))
    }

    #[test]
    fn or_and_and_rules_render_expected_logic() {
        let schema = doc_schema();
        let text = render(schema.entity("Doc").expect("doc"));
        // OR rule.
        assert!(text.contains(
            "return ($doc->is_public === true || $user->id === $doc->user_id) \
             ? Response::allow() : Response::deny();"
        ));
        // AND rule: role list split by the AND separator.
        assert!(text.contains(
            "return (($user->hasRole('admin')) && $user->id === $doc->user_id) \
             ? Response::allow() : Response::deny();"
        ));
        // OR of role and owner.
        assert!(text.contains(
            "return (($user->hasRole('admin')) || $user->id === $doc->user_id) \
             ? Response::allow() : Response::deny();"
        ));
    }

    #[test]
    fn unlisted_standard_actions_get_defaults() {
        let schema = doc_schema();
        let text = render(schema.entity("Doc").expect("doc"));
        assert!(text.contains("public function viewAny(User $user): Response"));
        assert!(text.contains("public function restore(User $user, Doc $doc): Response"));
        assert!(text.contains("$user->isAdmin()"));
    }

    #[test]
    fn custom_actions_are_rendered_after_standard_ones() {
        let schema = doc_schema();
        let text = render(schema.entity("Doc").expect("doc"));
        assert!(text.contains("public function publish(User $user, Doc $doc): Response"));
        assert!(text.contains("$doc->status === 'draft'"));
    }

    #[test]
    fn service_provider_registers_each_policy() {
        let schema = doc_schema();
        let text = render_service_provider(&schema);
        assert!(text.contains("Doc::class => DocPolicy::class,"));
        assert!(text.contains("$this->registerPolicies();"));
    }
}
