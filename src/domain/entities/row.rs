use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::{Map, Value};

pub const ID_FIELD: &str = "id";
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Canonical columns every row carries, in display order.
pub const CANONICAL_FIELDS: [&str; 7] = [
    "id",
    "bio",
    "name",
    "language",
    "version",
    "state",
    "createdDate",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub String);

impl RowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        RowId(value.to_string())
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        RowId(value)
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One record of the table.
///
/// `fields` always holds the `id` entry as a string equal to `id`, followed by
/// the remaining canonical fields and any passthrough fields from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: RowId,
    fields: Map<String, Value>,
}

impl Row {
    pub fn new(id: RowId, mut fields: Map<String, Value>) -> Self {
        fields.insert(ID_FIELD.to_string(), Value::String(id.0.clone()));
        Self { id, fields }
    }

    pub fn id(&self) -> &RowId {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Writes a field. The `id` field is fixed at construction and ignored here.
    pub fn set(&mut self, field: &str, value: Value) {
        if field == ID_FIELD {
            return;
        }
        self.fields.insert(field.to_string(), value);
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// String form of a field, empty when the field is absent.
    pub fn display(&self, field: &str) -> Cow<'_, str> {
        self.fields
            .get(field)
            .map(display_value)
            .unwrap_or(Cow::Borrowed(""))
    }
}

/// Loose string coercion used for search, filters, display and export.
pub fn display_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed("null"),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::Number(number) => Cow::Owned(number.to_string()),
        Value::String(text) => Cow::Borrowed(text.as_str()),
        Value::Array(items) => Cow::Owned(
            items
                .iter()
                .map(|item| match item {
                    Value::Null => Cow::Borrowed(""),
                    other => display_value(other),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Cow::Borrowed("[object Object]"),
    }
}

/// A value counts as present unless it is missing, null, false, zero or empty.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 4,
    }
}

/// Total order over optional JSON values used by the sort step.
///
/// Missing and null sort first, then booleans, numbers, strings and finally
/// arrays/objects (by their string form).
pub fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.total_cmp(&b)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(a), Some(b)) if type_rank(left) == 4 && type_rank(right) == 4 => {
            display_value(a).cmp(&display_value(b))
        }
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}
