//! Schema validation report.
//!
//! Walks the schema model and reports every referential and structural
//! problem in one pass. Never fails: the caller decides whether errors
//! halt the run. Output order is deterministic (entity declaration order,
//! fields before relations) so reports diff cleanly across runs.
use crate::order;
use crate::schema::Schema;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.message),
            Severity::Warning => write!(f, "warning: {}", self.message),
        }
    }
}

/// Validate the schema. Returns every issue found; an empty error subset
/// means generation may proceed.
pub fn validate(schema: &Schema) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if !schema.has_meta {
        issues.push(ValidationIssue::error(
            "missing 'meta' section in schema".to_string(),
        ));
    }

    if schema.entities.is_empty() {
        issues.push(ValidationIssue::error(
            "no models defined in schema".to_string(),
        ));
    }

    for entity in schema.entities.values() {
        if entity.fields.is_empty() {
            issues.push(ValidationIssue::error(format!(
                "model '{}' has no fields defined",
                entity.name
            )));
        }

        for field in entity.fields.values() {
            match &field.spec {
                Err(err) => {
                    issues.push(ValidationIssue::error(format!(
                        "model '{}' field '{}': {err}",
                        entity.name, field.name
                    )));
                }
                Ok(spec) => {
                    if let Some(table) = spec.foreign_table() {
                        if schema.entity_by_table(table).is_none() {
                            issues.push(ValidationIssue::error(format!(
                                "model '{}' field '{}' references unknown table '{table}'",
                                entity.name, field.name
                            )));
                        }
                    }
                }
            }
        }

        for relation in entity.relations.values() {
            match &relation.spec {
                Err(err) => {
                    issues.push(ValidationIssue::error(format!(
                        "model '{}' relation '{}': {err}",
                        entity.name, relation.name
                    )));
                }
                Ok(spec) => {
                    if spec.unresolved_target {
                        issues.push(ValidationIssue::error(format!(
                            "model '{}' relation '{}' is missing a target model",
                            entity.name, relation.name
                        )));
                    } else if let Some(target) = spec.target.as_deref() {
                        if !schema.entities.contains_key(target) {
                            issues.push(ValidationIssue::error(format!(
                                "model '{}' relation '{}' references unknown model '{target}'",
                                entity.name, relation.name
                            )));
                        }
                    }
                }
            }
        }

        for (action, rule) in &entity.policies {
            if rule.mixed_precedence {
                issues.push(ValidationIssue::warning(format!(
                    "model '{}' policy '{action}' mixes AND and OR in one rule \
                     (`{}`); OR-first precedence applied",
                    entity.name, rule.raw
                )));
            }
        }
    }

    let cycle = order::cycle_members(schema);
    if !cycle.is_empty() {
        issues.push(ValidationIssue::warning(format!(
            "belongsTo dependency cycle involving: {}; the cyclic edge is \
             dropped when computing seeding order",
            cycle.join(", ")
        )));
    }

    issues
}
