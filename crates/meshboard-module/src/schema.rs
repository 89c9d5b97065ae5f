//! Configuration UI schema: an ordered list of field descriptors.
//!
//! This is the single canonical schema representation. The legacy
//! object-with-properties form still found in exported documents from
//! older deployments is accepted only through
//! [`Schema::from_object_schema`], a one-time converter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use meshboard_core::error::AppError;
use meshboard_core::result::AppResult;

/// Renderable field types supported by the settings UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Textarea,
    Password,
    Number,
    Boolean,
    Select,
    Color,
    Time,
    /// Section heading; purely visual, carries no value.
    Section,
    /// Horizontal rule; purely visual.
    Divider,
    /// Displayed but not editable (e.g. a generated secret).
    Readonly,
    /// Read-only listing of hosted files.
    FileList,
}

impl FieldType {
    /// Layout-only fields carry no value and are never validated.
    pub fn is_layout(self) -> bool {
        matches!(self, Self::Section | Self::Divider)
    }
}

/// One choice of a select field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    /// Stored value.
    pub value: String,
    /// Displayed label.
    pub label: String,
}

/// A single ordered field descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Settings key inside the module namespace.
    pub key: String,
    /// Human-readable label, referenced by validation messages.
    pub label: String,
    /// Rendered input type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Empty/missing values are rejected on save.
    #[serde(default)]
    pub required: bool,
    /// The value is a secret; list views must never include it.
    #[serde(default)]
    pub secret: bool,
    /// Help text shown under the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Placeholder text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Choices for select fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Numeric lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Numeric upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Minimum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regular expression the string value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Field {
    fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            required: false,
            secret: false,
            description: None,
            placeholder: None,
            options: Vec::new(),
            min: None,
            max: None,
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }

    /// Single-line text input.
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::Text)
    }

    /// Multi-line text input.
    pub fn textarea(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::Textarea)
    }

    /// Masked input; implies `secret`.
    pub fn password(key: impl Into<String>, label: impl Into<String>) -> Self {
        let mut field = Self::new(key, label, FieldType::Password);
        field.secret = true;
        field
    }

    /// Numeric input.
    pub fn number(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::Number)
    }

    /// Checkbox.
    pub fn boolean(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::Boolean)
    }

    /// Dropdown.
    pub fn select(
        key: impl Into<String>,
        label: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        let mut field = Self::new(key, label, FieldType::Select);
        field.options = options;
        field
    }

    /// Color picker.
    pub fn color(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::Color)
    }

    /// Time-of-day input (`HH:MM`).
    pub fn time(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::Time)
    }

    /// Section heading.
    pub fn section(label: impl Into<String>) -> Self {
        let label = label.into();
        Self::new(format!("_section_{label}"), label, FieldType::Section)
    }

    /// Horizontal rule.
    pub fn divider() -> Self {
        Self::new("_divider", "", FieldType::Divider)
    }

    /// Read-only display field.
    pub fn readonly(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::Readonly)
    }

    /// Hosted-file listing.
    pub fn file_list(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::FileList)
    }

    /// Marks the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the value as a secret.
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Sets help text.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Sets placeholder text.
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    /// Sets the numeric range.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Sets the string length bounds.
    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    /// Sets the validation pattern.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

/// An ordered field-descriptor schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Fields in render order.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Builds a schema from ordered fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Looks up a field descriptor by key.
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Keys of fields flagged as secrets.
    pub fn secret_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.secret)
            .map(|f| f.key.as_str())
            .collect()
    }

    /// One-time converter from the legacy object-with-properties form:
    ///
    /// ```json
    /// {"properties": {"botToken": {"type": "password", "title": "Bot Token",
    ///                              "required": true, "order": 1}}}
    /// ```
    ///
    /// Fields are ordered by their numeric `order` (then key, for
    /// stability). Unknown property types map to plain text.
    pub fn from_object_schema(value: &Value) -> AppResult<Self> {
        let properties = value
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                AppError::validation("Legacy schema must contain a 'properties' object")
            })?;

        let mut ordered: Vec<(i64, &String, &Value)> = properties
            .iter()
            .map(|(key, prop)| {
                let order = prop.get("order").and_then(Value::as_i64).unwrap_or(i64::MAX);
                (order, key, prop)
            })
            .collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        let mut fields = Vec::with_capacity(ordered.len());
        for (_, key, prop) in ordered {
            let label = prop
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(key)
                .to_string();
            let type_name = prop.get("type").and_then(Value::as_str).unwrap_or("string");

            let mut field = match type_name {
                "textarea" => Field::textarea(key, label),
                "password" => Field::password(key, label),
                "number" | "integer" => Field::number(key, label),
                "boolean" => Field::boolean(key, label),
                "color" => Field::color(key, label),
                "time" => Field::time(key, label),
                "select" => {
                    let options = prop
                        .get("enum")
                        .and_then(Value::as_array)
                        .map(|values| {
                            values
                                .iter()
                                .filter_map(Value::as_str)
                                .map(|v| SelectOption {
                                    value: v.to_string(),
                                    label: v.to_string(),
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    Field::select(key, label, options)
                }
                _ => Field::text(key, label),
            };

            field.required = prop.get("required").and_then(Value::as_bool).unwrap_or(false);
            field.min = prop.get("min").and_then(Value::as_f64);
            field.max = prop.get("max").and_then(Value::as_f64);
            field.min_length = prop
                .get("minLength")
                .and_then(Value::as_u64)
                .map(|v| v as usize);
            field.max_length = prop
                .get("maxLength")
                .and_then(Value::as_u64)
                .map(|v| v as usize);
            field.pattern = prop
                .get("pattern")
                .and_then(Value::as_str)
                .map(str::to_string);
            field.description = prop
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string);

            fields.push(field);
        }

        Ok(Self { fields })
    }
}
