//! Hook and observer action resolution.
//!
//! Each lifecycle stage maps to one action token or an ordered list.
//! Tokens are classified against a fixed built-in table; anything else is
//! a named custom action the observer driver turns into a stub method.
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HookAction {
    Log,
    SanitizeInput,
    GenerateUuid,
    ClearCache,
    CleanupFiles,
    LogActivity,
    MoveChildrenToParent,
    ClearProjectCache,
    UpdateProjectProgress,
    ClearProjectsCache,
    UpdateSearchIndex,
    /// Unrecognized token: a user-supplied action the generated code
    /// calls through a stub method.
    Custom { name: String },
}

impl HookAction {
    pub fn classify(token: &str) -> Self {
        match token {
            "log" => HookAction::Log,
            "sanitizeInput" => HookAction::SanitizeInput,
            "generateUuid" => HookAction::GenerateUuid,
            "clearCache" => HookAction::ClearCache,
            "cleanupFiles" => HookAction::CleanupFiles,
            "logActivity" => HookAction::LogActivity,
            "moveChildrenToParent" => HookAction::MoveChildrenToParent,
            "clearProjectCache" => HookAction::ClearProjectCache,
            "updateProjectProgress" => HookAction::UpdateProjectProgress,
            "clearProjectsCache" => HookAction::ClearProjectsCache,
            "updateSearchIndex" => HookAction::UpdateSearchIndex,
            other => HookAction::Custom {
                name: other.to_string(),
            },
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, HookAction::Custom { .. })
    }

    pub fn custom_name(&self) -> Option<&str> {
        match self {
            HookAction::Custom { name } => Some(name),
            _ => None,
        }
    }
}

/// Actions attached to one lifecycle stage, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookSpec {
    pub actions: Vec<HookAction>,
    /// Optional log message from the object form `{action, message}`.
    pub message: Option<String>,
}

/// Resolve a stage's JSON value: a single token, an ordered token list,
/// or an object with an `action` key (and optional `message`).
pub fn resolve_hook(value: &serde_json::Value) -> Option<HookSpec> {
    match value {
        serde_json::Value::String(token) => Some(HookSpec {
            actions: vec![HookAction::classify(token)],
            message: None,
        }),
        serde_json::Value::Array(tokens) => {
            let actions: Vec<HookAction> = tokens
                .iter()
                .filter_map(|t| t.as_str())
                .map(HookAction::classify)
                .collect();
            if actions.is_empty() {
                None
            } else {
                Some(HookSpec {
                    actions,
                    message: None,
                })
            }
        }
        serde_json::Value::Object(map) => {
            let token = map.get("action")?.as_str()?;
            Some(HookSpec {
                actions: vec![HookAction::classify(token)],
                message: map
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_builtins_and_customs() {
        assert_eq!(HookAction::classify("clearCache"), HookAction::ClearCache);
        assert_eq!(
            HookAction::classify("notifySlack"),
            HookAction::Custom {
                name: "notifySlack".to_string()
            }
        );
    }

    #[test]
    fn resolves_string_list_and_object_forms() {
        let single = resolve_hook(&json!("generateUuid")).expect("hook");
        assert_eq!(single.actions, vec![HookAction::GenerateUuid]);

        let list = resolve_hook(&json!(["logActivity", "clearCache"])).expect("hook");
        assert_eq!(
            list.actions,
            vec![HookAction::LogActivity, HookAction::ClearCache]
        );

        let object = resolve_hook(&json!({"action": "log", "message": "created $name"}))
            .expect("hook");
        assert_eq!(object.actions, vec![HookAction::Log]);
        assert_eq!(object.message.as_deref(), Some("created $name"));
    }
}
