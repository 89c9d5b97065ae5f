//! Schema-driven settings validation.

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use meshboard_core::error::FieldError;

use crate::schema::{FieldType, Schema};

/// Validates a candidate settings object against a schema.
///
/// Returns one field-scoped error per violation; an empty vector means
/// the candidate is acceptable. The candidate is never mutated.
pub fn validate(schema: &Schema, candidate: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for field in &schema.fields {
        if field.field_type.is_layout() || field.field_type == FieldType::Readonly {
            continue;
        }

        let value = candidate.get(&field.key);

        if is_empty(value) {
            if field.required {
                errors.push(FieldError::new(
                    &field.key,
                    format!("{} is required", field.label),
                ));
            }
            continue;
        }
        let value = value.unwrap();

        if let Some(s) = value.as_str() {
            if let Some(min) = field.min_length
                && s.chars().count() < min
            {
                errors.push(FieldError::new(
                    &field.key,
                    format!("{} must be at least {min} characters", field.label),
                ));
            }
            if let Some(max) = field.max_length
                && s.chars().count() > max
            {
                errors.push(FieldError::new(
                    &field.key,
                    format!("{} must be at most {max} characters", field.label),
                ));
            }
            if let Some(pattern) = &field.pattern {
                match Regex::new(pattern) {
                    Ok(re) => {
                        if !re.is_match(s) {
                            errors.push(FieldError::new(
                                &field.key,
                                format!("{} has an invalid format", field.label),
                            ));
                        }
                    }
                    Err(e) => {
                        // A broken pattern in a module schema must not
                        // block every save of that module.
                        warn!(field = %field.key, error = %e, "Skipping unparsable validation pattern");
                    }
                }
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = field.min
                && n < min
            {
                errors.push(FieldError::new(
                    &field.key,
                    format!("{} must be at least {min}", field.label),
                ));
            }
            if let Some(max) = field.max
                && n > max
            {
                errors.push(FieldError::new(
                    &field.key,
                    format!("{} must be at most {max}", field.label),
                ));
            }
        }
    }

    errors
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::section("Bot"),
            Field::password("botToken", "Bot Token").required(),
            Field::text("prefix", "Message Prefix").length(2, 8),
            Field::number("maxLogEntries", "Max Log Entries").range(1.0, 1000.0),
            Field::time("quietStart", "Quiet Hours Start").pattern(r"^\d{2}:\d{2}$"),
        ])
    }

    #[test]
    fn required_empty_string_yields_exactly_one_error() {
        let errors = validate(&schema(), &json!({"botToken": ""}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "botToken");
        assert!(errors[0].message.contains("Bot Token"));
    }

    #[test]
    fn missing_and_null_count_as_empty() {
        assert_eq!(validate(&schema(), &json!({})).len(), 1);
        assert_eq!(validate(&schema(), &json!({"botToken": null})).len(), 1);
    }

    #[test]
    fn length_pattern_and_range_rules() {
        let candidate = json!({
            "botToken": "123:abc",
            "prefix": "x",
            "maxLogEntries": 0,
            "quietStart": "22h00"
        });
        let errors = validate(&schema(), &candidate);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["prefix", "maxLogEntries", "quietStart"]);
    }

    #[test]
    fn valid_candidate_passes_and_is_not_mutated() {
        let candidate = json!({
            "botToken": "123:abc",
            "prefix": "mesh",
            "maxLogEntries": 100,
            "quietStart": "22:00"
        });
        let before = candidate.clone();
        assert!(validate(&schema(), &candidate).is_empty());
        assert_eq!(candidate, before);
    }

    #[test]
    fn optional_fields_may_be_absent() {
        assert!(validate(&schema(), &json!({"botToken": "123:abc"})).is_empty());
    }
}
