//! Policy rule expression parser.
//!
//! A rule string attached to a policy action is either an OR of clauses
//! (`|`-separated), an AND of conditions (`,`-separated), or one atomic
//! condition. AND and OR cannot be mixed in one rule string — there is no
//! parenthesization. When both separators appear at clause level the
//! parser applies OR-first precedence and flags the rule so the validator
//! can warn instead of guessing intended grouping.
use serde::Serialize;

/// One atomic authorization condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// True if the user has any of the listed roles.
    Role { roles: Vec<String> },
    /// The authenticated user owns the record (`user_id` column).
    Owner,
    Authenticated,
    /// The record is publicly visible (`is_public` column).
    Public,
    Collaborator,
    ProjectMember,
    ProjectOwner,
    Assignee,
    /// Field equality; `user_id`/`owner_id` compare against the
    /// authenticated user's id instead of a literal.
    FieldEquals { field: String, value: String },
    /// Fallback: zero-arg predicate method on the user.
    Predicate { method: String },
}

/// Parsed boolean expression over conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RuleExpr {
    Atom { condition: Condition },
    All { conditions: Vec<Condition> },
    Any { clauses: Vec<RuleExpr> },
}

/// Parse result carrying the mixed-precedence flag for the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRule {
    pub raw: String,
    pub expr: RuleExpr,
    /// Both `|` and `,` appeared at clause level in one rule string.
    pub mixed_precedence: bool,
}

/// Parse one policy rule string. Total over all input: unrecognized
/// tokens become predicate conditions rather than errors.
pub fn parse_rule(raw: &str) -> PolicyRule {
    let mut mixed = false;

    let expr = if raw.contains('|') {
        let clauses: Vec<RuleExpr> = raw
            .split('|')
            .map(|clause| {
                let clause = clause.trim();
                // Commas inside a role list belong to the atom; commas
                // anywhere else mean an AND nested under the OR, which the
                // grammar does not support.
                if clause.contains(',') && !clause.starts_with("role:") {
                    mixed = true;
                    RuleExpr::All {
                        conditions: split_and(clause),
                    }
                } else {
                    RuleExpr::Atom {
                        condition: parse_condition(clause),
                    }
                }
            })
            .collect();
        RuleExpr::Any { clauses }
    } else if raw.contains(',') {
        RuleExpr::All {
            conditions: split_and(raw),
        }
    } else {
        RuleExpr::Atom {
            condition: parse_condition(raw.trim()),
        }
    };

    PolicyRule {
        raw: raw.to_string(),
        expr,
        mixed_precedence: mixed,
    }
}

fn split_and(clause: &str) -> Vec<Condition> {
    clause
        .split(',')
        .map(|token| parse_condition(token.trim()))
        .collect()
}

fn parse_condition(token: &str) -> Condition {
    if let Some(list) = token.strip_prefix("role:") {
        return Condition::Role {
            roles: list
                .split(',')
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect(),
        };
    }
    match token {
        "owner" => return Condition::Owner,
        "authenticated" => return Condition::Authenticated,
        "public" => return Condition::Public,
        "collaborator" => return Condition::Collaborator,
        "projectMember" => return Condition::ProjectMember,
        "projectOwner" => return Condition::ProjectOwner,
        "assignee" => return Condition::Assignee,
        _ => {}
    }
    if let Some((field, value)) = token.split_once(':') {
        return Condition::FieldEquals {
            field: field.to_string(),
            value: value.to_string(),
        };
    }
    Condition::Predicate {
        method: token.to_string(),
    }
}
