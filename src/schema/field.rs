//! Compact field-definition parser.
//!
//! A field is declared as `type[:params][|validation...]`, e.g.
//! `"foreign:users|required"` or `"decimal:8,2|default:0.00"`. The parser
//! produces a tagged [`FieldSpec`]; raw strings never flow past this
//! boundary into generation logic.
use crate::error::DslError;
use serde::Serialize;

/// Simple column types with no parameters.
pub const SIMPLE_TYPES: [&str; 11] = [
    "string",
    "text",
    "longText",
    "integer",
    "boolean",
    "date",
    "datetime",
    "timestamp",
    "json",
    "float",
    "uuid",
];

/// Parsed form of one field's type segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    /// One of [`SIMPLE_TYPES`].
    Simple { name: String },
    /// Foreign key column pointing at another entity's table.
    Foreign { table: String },
    /// Enumerated column with at least one value.
    Enum { values: Vec<String> },
    /// Fixed-point column with explicit precision and scale.
    Decimal { precision: u32, scale: u32 },
    /// Stored upload; `multiple` distinguishes `files:` from `file:`.
    File { disk: String, multiple: bool },
    /// Unrecognized type name, preserved verbatim for forward
    /// compatibility. Not an error.
    Unknown { name: String },
}

/// Parsed field definition: type plus the verbatim validation tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Validation tokens in declaration order, uninterpreted.
    pub validations: Vec<String>,
}

/// Parse one compact field definition.
///
/// Unknown simple types pass through as [`FieldType::Unknown`]; only
/// grammar violations (empty enum list, bad decimal params) are errors.
pub fn parse_field(definition: &str) -> Result<FieldSpec, DslError> {
    let mut segments = definition.split('|');
    let type_segment = segments.next().unwrap_or_default();
    let validations: Vec<String> = segments.map(str::to_string).collect();

    let field_type = parse_type_segment(definition, type_segment)?;
    Ok(FieldSpec {
        field_type,
        validations,
    })
}

fn parse_type_segment(definition: &str, segment: &str) -> Result<FieldType, DslError> {
    let Some((base, params)) = segment.split_once(':') else {
        return Ok(simple_or_unknown(segment));
    };

    match base {
        "foreign" => {
            if params.is_empty() {
                return Err(malformed(definition, "foreign requires a target table"));
            }
            Ok(FieldType::Foreign {
                table: params.to_string(),
            })
        }
        "enum" => {
            let values: Vec<String> = params
                .split(',')
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if values.is_empty() {
                return Err(malformed(definition, "enum requires at least one value"));
            }
            Ok(FieldType::Enum { values })
        }
        "decimal" => {
            let parts: Vec<&str> = params.split(',').collect();
            if parts.len() != 2 {
                return Err(malformed(
                    definition,
                    "decimal requires exactly precision,scale",
                ));
            }
            let precision = parse_decimal_part(definition, parts[0], "precision")?;
            let scale = parse_decimal_part(definition, parts[1], "scale")?;
            Ok(FieldType::Decimal { precision, scale })
        }
        "file" | "files" => Ok(FieldType::File {
            disk: params.to_string(),
            multiple: base == "files",
        }),
        // Unknown base:params combination: keep the base, drop the params.
        _ => Ok(simple_or_unknown(base)),
    }
}

fn parse_decimal_part(definition: &str, raw: &str, what: &str) -> Result<u32, DslError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| malformed(definition, &format!("decimal {what} `{raw}` is not an integer")))
}

fn simple_or_unknown(name: &str) -> FieldType {
    if SIMPLE_TYPES.contains(&name) {
        FieldType::Simple {
            name: name.to_string(),
        }
    } else {
        FieldType::Unknown {
            name: name.to_string(),
        }
    }
}

fn malformed(definition: &str, reason: &str) -> DslError {
    DslError::MalformedFieldSpec {
        definition: definition.to_string(),
        reason: reason.to_string(),
    }
}

impl FieldSpec {
    /// Re-serialize to the compact definition string. Round-trips the
    /// base type, its params, and the validation token sequence.
    pub fn to_definition(&self) -> String {
        let type_segment = match &self.field_type {
            FieldType::Simple { name } | FieldType::Unknown { name } => name.clone(),
            FieldType::Foreign { table } => format!("foreign:{table}"),
            FieldType::Enum { values } => format!("enum:{}", values.join(",")),
            FieldType::Decimal { precision, scale } => format!("decimal:{precision},{scale}"),
            FieldType::File { disk, multiple } => {
                format!("{}:{disk}", if *multiple { "files" } else { "file" })
            }
        };
        if self.validations.is_empty() {
            type_segment
        } else {
            format!("{type_segment}|{}", self.validations.join("|"))
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.field_type, FieldType::File { .. })
    }

    pub fn is_multiple_file(&self) -> bool {
        matches!(self.field_type, FieldType::File { multiple: true, .. })
    }

    pub fn foreign_table(&self) -> Option<&str> {
        match &self.field_type {
            FieldType::Foreign { table } => Some(table),
            _ => None,
        }
    }

    pub fn is_unique(&self) -> bool {
        self.validations.iter().any(|v| v == "unique")
    }

    pub fn is_nullable(&self) -> bool {
        self.validations.iter().any(|v| v == "nullable")
    }

    pub fn is_required(&self) -> bool {
        self.validations.iter().any(|v| v == "required")
    }

    pub fn has_index(&self) -> bool {
        self.validations.iter().any(|v| v == "index")
    }

    /// Value of the first `default:<v>` token, if any.
    pub fn default_value(&self) -> Option<&str> {
        self.validations
            .iter()
            .find_map(|v| v.strip_prefix("default:"))
    }

    /// Value of the first `max:<n>` token, if any.
    pub fn max_len(&self) -> Option<u64> {
        self.validations
            .iter()
            .find_map(|v| v.strip_prefix("max:"))
            .and_then(|v| v.parse().ok())
    }

    /// Blueprint column method used by the migration driver.
    pub fn migration_method(&self) -> &'static str {
        match &self.field_type {
            FieldType::Simple { name } => match name.as_str() {
                "text" => "text",
                "longText" => "longText",
                "integer" => "integer",
                "boolean" => "boolean",
                "date" => "date",
                "datetime" => "dateTime",
                "timestamp" => "timestamp",
                "json" => "json",
                "float" => "float",
                "uuid" => "uuid",
                _ => "string",
            },
            FieldType::Foreign { .. } => "foreignId",
            FieldType::Enum { .. } => "enum",
            FieldType::Decimal { .. } => "decimal",
            FieldType::File { .. } => "string",
            FieldType::Unknown { .. } => "string",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_foreign_with_validations() {
        let spec = parse_field("foreign:posts|nullable").expect("parse");
        assert_eq!(spec.foreign_table(), Some("posts"));
        assert_eq!(spec.validations, vec!["nullable"]);
        assert!(spec.is_nullable());
        assert!(!spec.is_unique());
    }

    #[test]
    fn parses_decimal_with_default() {
        let spec = parse_field("decimal:8,2|default:0.00").expect("parse");
        assert_eq!(
            spec.field_type,
            FieldType::Decimal {
                precision: 8,
                scale: 2
            }
        );
        assert_eq!(spec.validations, vec!["default:0.00"]);
        assert_eq!(spec.default_value(), Some("0.00"));
    }

    #[test]
    fn decimal_missing_scale_is_malformed() {
        let err = parse_field("decimal:8").expect_err("must fail");
        assert!(matches!(err, DslError::MalformedFieldSpec { .. }));
        assert!(err.to_string().contains("decimal:8"));
    }

    #[test]
    fn enum_requires_values() {
        let spec = parse_field("enum:draft,published|default:draft").expect("parse");
        assert_eq!(
            spec.field_type,
            FieldType::Enum {
                values: vec!["draft".to_string(), "published".to_string()]
            }
        );
        assert!(parse_field("enum:").is_err());
    }

    #[test]
    fn files_sets_multiple() {
        let spec = parse_field("files:uploads|nullable").expect("parse");
        assert!(spec.is_file());
        assert!(spec.is_multiple_file());
        let single = parse_field("file:avatars").expect("parse");
        assert!(single.is_file());
        assert!(!single.is_multiple_file());
    }

    #[test]
    fn unknown_simple_type_passes_through() {
        let spec = parse_field("geometry|nullable").expect("parse");
        assert_eq!(
            spec.field_type,
            FieldType::Unknown {
                name: "geometry".to_string()
            }
        );
        assert_eq!(spec.migration_method(), "string");
    }

    #[test]
    fn unknown_base_with_params_keeps_base_drops_params() {
        let spec = parse_field("vector:1536|nullable").expect("parse");
        assert_eq!(
            spec.field_type,
            FieldType::Unknown {
                name: "vector".to_string()
            }
        );
    }

    #[test]
    fn validation_tokens_are_not_resplit() {
        let spec = parse_field("string|email|unique|required|max:255").expect("parse");
        assert_eq!(spec.validations, vec!["email", "unique", "required", "max:255"]);
        assert!(spec.is_unique());
        assert!(spec.is_required());
        assert_eq!(spec.max_len(), Some(255));
    }

    #[test]
    fn round_trips_back_to_the_definition() {
        for def in [
            "string|required|max:255",
            "foreign:users|nullable",
            "decimal:10,4",
            "enum:a,b,c|default:a",
            "files:docs|nullable",
            "geometry",
        ] {
            let spec = parse_field(def).expect("parse");
            let again = parse_field(&spec.to_definition()).expect("reparse");
            assert_eq!(spec, again, "round-trip failed for {def}");
        }
    }
}
