//! Environment configuration derived from schema meta blocks.
//!
//! `meta.{app,database,mail,cache,queues,auth}` flatten into `.env` keys
//! through a fixed mapping table. The file is edited line-wise: existing
//! keys are updated in place, new keys appended, unrelated lines kept.
use regex::Regex;
use serde_json::Value;

/// Fixed mapping from a meta block and field to an env key.
const ENV_KEY_TABLE: [(&str, &str, &str); 27] = [
    ("app", "name", "APP_NAME"),
    ("app", "url", "APP_URL"),
    ("app", "env", "APP_ENV"),
    ("app", "debug", "APP_DEBUG"),
    ("app", "timezone", "APP_TIMEZONE"),
    ("database", "connection", "DB_CONNECTION"),
    ("database", "host", "DB_HOST"),
    ("database", "port", "DB_PORT"),
    ("database", "database", "DB_DATABASE"),
    ("database", "username", "DB_USERNAME"),
    ("database", "password", "DB_PASSWORD"),
    ("database", "charset", "DB_CHARSET"),
    ("database", "collation", "DB_COLLATION"),
    ("mail", "mailer", "MAIL_MAILER"),
    ("mail", "host", "MAIL_HOST"),
    ("mail", "port", "MAIL_PORT"),
    ("mail", "username", "MAIL_USERNAME"),
    ("mail", "password", "MAIL_PASSWORD"),
    ("mail", "encryption", "MAIL_ENCRYPTION"),
    ("mail", "from_address", "MAIL_FROM_ADDRESS"),
    ("mail", "from_name", "MAIL_FROM_NAME"),
    ("cache", "driver", "CACHE_DRIVER"),
    ("cache", "default_ttl", "CACHE_DEFAULT_TTL"),
    ("queues", "default", "QUEUE_CONNECTION"),
    ("cors", "allowed_origins", "CORS_ALLOWED_ORIGINS"),
    ("cors", "allowed_methods", "CORS_ALLOWED_METHODS"),
    ("cors", "allowed_headers", "CORS_ALLOWED_HEADERS"),
];

/// Flatten schema meta config into ordered env key/value pairs.
pub fn flatten_meta(raw_schema: &Value) -> Vec<(String, String)> {
    let Some(meta) = raw_schema.get("meta") else {
        return Vec::new();
    };

    let mut pairs = Vec::new();

    // APP_NAME falls back to the project name when app.name is absent.
    let app_name_set = meta
        .get("app")
        .and_then(|a| a.get("name"))
        .is_some_and(|v| !v.is_null());
    if !app_name_set {
        if let Some(project) = meta.get("project").and_then(Value::as_str) {
            pairs.push(("APP_NAME".to_string(), format_value(&Value::String(project.to_string()))));
        }
    }

    for (block, field, key) in ENV_KEY_TABLE {
        if let Some(value) = meta.get(block).and_then(|b| b.get(field)) {
            if !value.is_null() {
                pairs.push((key.to_string(), format_value(value)));
            }
        }
    }

    if let Some(retry) = meta
        .get("queues")
        .and_then(|q| q.get("retry_after"))
        .filter(|v| !v.is_null())
    {
        pairs.push(("QUEUE_RETRY_AFTER".to_string(), format_value(retry)));
    }

    let sanctum = meta
        .get("auth")
        .and_then(|a| a.get("provider"))
        .and_then(Value::as_str)
        == Some("sanctum");
    if sanctum {
        pairs.push((
            "SANCTUM_STATEFUL_DOMAINS".to_string(),
            "localhost,localhost:3000,127.0.0.1,127.0.0.1:8000,::1".to_string(),
        ));
    }

    pairs
}

/// Apply key/value pairs to env file content: update matching `KEY=` lines
/// in place, append the rest.
pub fn apply_pairs(content: &str, pairs: &[(String, String)]) -> String {
    let mut updated = content.to_string();
    for (key, value) in pairs {
        let pattern = format!(r"(?m)^{}=.*$", regex::escape(key));
        let replacement = format!("{key}={value}");
        let re = Regex::new(&pattern).expect("escaped key is a valid pattern");
        if re.is_match(&updated) {
            // NoExpand: values may contain `$`, which must stay literal.
            updated = re
                .replace(&updated, regex::NoExpand(replacement.as_str()))
                .into_owned();
        } else {
            if !updated.is_empty() && !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str(&replacement);
            updated.push('\n');
        }
    }
    updated
}

/// Format a JSON value for an env line; quote strings carrying whitespace
/// or shell-significant characters.
fn format_value(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().any(|c| c.is_whitespace() || "\"'#=".contains(c)) {
                format!("\"{}\"", s.replace('"', "\\\""))
            } else {
                s.clone()
            }
        }
        // List values (CORS origins and friends) join into one entry.
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
