//! Relation-definition parser.
//!
//! Relations are declared as `kind[:Target[,param...]]`; positional param
//! meaning depends on the kind. A missing required target never fails the
//! parse — it yields a best-effort spec flagged `unresolved_target` so the
//! validator can report a precise message.
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
    MorphTo,
    MorphMany,
    MorphedByMany,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::BelongsTo => "belongsTo",
            RelationKind::HasOne => "hasOne",
            RelationKind::HasMany => "hasMany",
            RelationKind::BelongsToMany => "belongsToMany",
            RelationKind::MorphTo => "morphTo",
            RelationKind::MorphMany => "morphMany",
            RelationKind::MorphedByMany => "morphedByMany",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "belongsTo" => Some(RelationKind::BelongsTo),
            "hasOne" => Some(RelationKind::HasOne),
            "hasMany" => Some(RelationKind::HasMany),
            "belongsToMany" => Some(RelationKind::BelongsToMany),
            "morphTo" => Some(RelationKind::MorphTo),
            "morphMany" => Some(RelationKind::MorphMany),
            "morphedByMany" => Some(RelationKind::MorphedByMany),
            _ => None,
        }
    }

    /// Every kind except `morphTo` names a target entity.
    pub fn requires_target(&self) -> bool {
        !matches!(self, RelationKind::MorphTo)
    }
}

/// Parsed relation definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationSpec {
    pub kind: RelationKind,
    /// Target entity name, where the kind takes one.
    pub target: Option<String>,
    /// belongsTo/hasOne/hasMany foreign-key override.
    pub foreign_key: Option<String>,
    /// belongsToMany pivot overrides.
    pub pivot_table: Option<String>,
    pub foreign_pivot_key: Option<String>,
    pub related_pivot_key: Option<String>,
    /// morphMany/morphedByMany morph name.
    pub morph_name: Option<String>,
    /// Set when a required target entity is missing from the definition;
    /// reported by the validator, not here.
    pub unresolved_target: bool,
}

/// Parse error for a definition whose kind token is unrecognized.
///
/// Unlike a missing target this cannot produce a best-effort spec, so it
/// is surfaced for the validator to collect.
pub fn parse_relation(definition: &str) -> Result<RelationSpec, String> {
    let (kind_token, rest) = match definition.split_once(':') {
        Some((kind, rest)) => (kind, Some(rest)),
        None => (definition, None),
    };

    let Some(kind) = RelationKind::parse(kind_token) else {
        return Err(format!("unknown relation kind `{kind_token}`"));
    };

    let params: Vec<&str> = rest
        .map(|r| r.split(',').map(str::trim).collect())
        .unwrap_or_default();
    let param = |i: usize| -> Option<String> {
        params
            .get(i)
            .filter(|p| !p.is_empty())
            .map(|p| p.to_string())
    };

    let mut spec = RelationSpec {
        kind,
        target: None,
        foreign_key: None,
        pivot_table: None,
        foreign_pivot_key: None,
        related_pivot_key: None,
        morph_name: None,
        unresolved_target: false,
    };

    match kind {
        RelationKind::BelongsTo | RelationKind::HasOne | RelationKind::HasMany => {
            spec.target = param(0);
            spec.foreign_key = param(1);
        }
        RelationKind::BelongsToMany => {
            spec.target = param(0);
            spec.pivot_table = param(1);
            spec.foreign_pivot_key = param(2);
            spec.related_pivot_key = param(3);
        }
        RelationKind::MorphMany | RelationKind::MorphedByMany => {
            spec.target = param(0);
            spec.morph_name = param(1);
        }
        RelationKind::MorphTo => {}
    }

    spec.unresolved_target = kind.requires_target() && spec.target.is_none();
    Ok(spec)
}
