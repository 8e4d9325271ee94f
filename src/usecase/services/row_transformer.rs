use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::entities::row::{display_value, is_truthy, Row, RowId, TEMP_ID_PREFIX};

pub const DEFAULT_BIO: &str = "";
pub const DEFAULT_NAME: &str = "Unknown";
pub const DEFAULT_LANGUAGE: &str = "English";
pub const DEFAULT_VERSION: &str = "v1.0";
pub const DEFAULT_STATE: &str = "active";
pub const DEFAULT_CREATED_DATE: &str = "2020-05-04 09:18:16";
pub const NEW_ROW_STATE: &str = "new customer";

fn first_present<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .map(|key| record.get(*key))
        .find(|value| is_truthy(*value))
        .flatten()
}

fn text_or_empty(record: &Map<String, Value>, key: &str) -> String {
    record
        .get(key)
        .filter(|value| is_truthy(Some(*value)))
        .map(|value| display_value(value).into_owned())
        .unwrap_or_default()
}

fn or_default(record: &Map<String, Value>, keys: &[&str], default: &str) -> Value {
    first_present(record, keys)
        .cloned()
        .unwrap_or_else(|| Value::String(default.to_string()))
}

fn derive_name(record: &Map<String, Value>) -> Value {
    if let Some(name) = first_present(record, &["name"]) {
        return name.clone();
    }
    let full_name = format!(
        "{} {}",
        text_or_empty(record, "first_name"),
        text_or_empty(record, "last_name")
    );
    let full_name = full_name.trim();
    if full_name.is_empty() {
        Value::String(DEFAULT_NAME.to_string())
    } else {
        Value::String(full_name.to_string())
    }
}

/// Normalizes one source record into a [`Row`].
///
/// Canonical fields are filled through their fallback chains and take
/// precedence; every other source field is passed through in source order.
/// Records that are not JSON objects become rows of defaults.
pub fn transform_record(index: usize, record: &Value) -> Row {
    let empty = Map::new();
    let record = record.as_object().unwrap_or(&empty);

    let id = first_present(record, &["id"])
        .map(|value| display_value(value).into_owned())
        .unwrap_or_else(|| format!("row-{index}"));

    let mut fields = Map::new();
    fields.insert("id".to_string(), Value::String(id.clone()));
    fields.insert("bio".to_string(), or_default(record, &["bio", "address"], DEFAULT_BIO));
    fields.insert("name".to_string(), derive_name(record));
    fields.insert(
        "language".to_string(),
        or_default(record, &["language", "city"], DEFAULT_LANGUAGE),
    );
    fields.insert("version".to_string(), or_default(record, &["version"], DEFAULT_VERSION));
    fields.insert("state".to_string(), or_default(record, &["state"], DEFAULT_STATE));
    fields.insert(
        "createdDate".to_string(),
        or_default(record, &["createdDate"], DEFAULT_CREATED_DATE),
    );

    for (key, value) in record {
        if !fields.contains_key(key) {
            fields.insert(key.clone(), value.clone());
        }
    }

    Row::new(RowId(id), fields)
}

pub fn transform_records(records: &[Value]) -> Vec<Row> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| transform_record(index, record))
        .collect()
}

/// Builds a locally created row whose id cannot collide with source ids.
pub fn new_local_row(now: DateTime<Utc>, sequence: u64) -> Row {
    let id = format!("{TEMP_ID_PREFIX}{}-{sequence}", now.timestamp_millis());
    let mut fields = Map::new();
    fields.insert("id".to_string(), Value::String(id.clone()));
    fields.insert("bio".to_string(), Value::String(String::new()));
    fields.insert("name".to_string(), Value::String(String::new()));
    fields.insert("language".to_string(), Value::String(DEFAULT_LANGUAGE.to_string()));
    fields.insert("version".to_string(), Value::String(DEFAULT_VERSION.to_string()));
    fields.insert("state".to_string(), Value::String(NEW_ROW_STATE.to_string()));
    fields.insert(
        "createdDate".to_string(),
        Value::String(now.format("%Y-%m-%d %H:%M:%S").to_string()),
    );
    Row::new(RowId(id), fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn empty_record_gets_every_default() {
        let row = transform_record(3, &json!({}));

        assert_eq!(row.id().as_str(), "row-3");
        assert_eq!(row.get("bio"), Some(&json!("")));
        assert_eq!(row.get("name"), Some(&json!("Unknown")));
        assert_eq!(row.get("language"), Some(&json!("English")));
        assert_eq!(row.get("version"), Some(&json!("v1.0")));
        assert_eq!(row.get("state"), Some(&json!("active")));
        assert_eq!(row.get("createdDate"), Some(&json!("2020-05-04 09:18:16")));
    }

    #[test]
    fn fallback_fields_fill_canonical_ones() {
        let row = transform_record(
            0,
            &json!({
                "id": 17,
                "first_name": "Ada",
                "last_name": "Lovelace",
                "address": "12 Analytical St",
                "city": "Toledo",
            }),
        );

        assert_eq!(row.id().as_str(), "17");
        assert_eq!(row.get("name"), Some(&json!("Ada Lovelace")));
        assert_eq!(row.get("bio"), Some(&json!("12 Analytical St")));
        assert_eq!(row.get("language"), Some(&json!("Toledo")));
        assert_eq!(row.get("city"), Some(&json!("Toledo")));
    }

    #[test]
    fn partial_name_is_trimmed_and_empty_values_fall_back() {
        let row = transform_record(
            1,
            &json!({"id": "", "name": "", "last_name": "Hopper", "state": null}),
        );

        assert_eq!(row.id().as_str(), "row-1");
        assert_eq!(row.get("name"), Some(&json!("Hopper")));
        assert_eq!(row.get("state"), Some(&json!("active")));
    }

    #[test]
    fn canonical_fields_come_first_then_passthrough() {
        let row = transform_record(0, &json!({"zeta": 1, "name": "Zed", "alpha": 2}));
        let keys: Vec<&str> = row.keys().collect();

        assert_eq!(
            keys,
            vec![
                "id",
                "bio",
                "name",
                "language",
                "version",
                "state",
                "createdDate",
                "zeta",
                "alpha"
            ]
        );
    }

    #[test]
    fn non_object_record_becomes_default_row() {
        let rows = transform_records(&[json!(5), json!(null), json!("text")]);
        let ids: Vec<&str> = rows.iter().map(|row| row.id().as_str()).collect();
        assert_eq!(ids, vec!["row-0", "row-1", "row-2"]);
    }

    #[test]
    fn local_rows_use_temporary_namespace() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        let first = new_local_row(now, 1);
        let second = new_local_row(now, 2);

        assert_eq!(first.id().as_str(), "temp-1700000000000-1");
        assert!(first.id().is_temporary());
        assert_ne!(first.id(), second.id());
        assert_eq!(first.get("state"), Some(&json!("new customer")));
        assert_eq!(first.get("createdDate"), Some(&json!("2023-11-14 22:13:20")));
    }

    fn loose_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            ".{0,12}".prop_map(Value::String),
        ]
    }

    proptest! {
        #[test]
        fn any_record_shape_yields_complete_row(
            entries in proptest::collection::vec(
                (
                    prop_oneof![
                        Just("id".to_string()),
                        Just("name".to_string()),
                        Just("first_name".to_string()),
                        Just("city".to_string()),
                        Just("state".to_string()),
                        "[a-z]{1,6}",
                    ],
                    loose_value(),
                ),
                0..8,
            ),
            index in 0usize..1000,
        ) {
            let record: Map<String, Value> = entries.into_iter().collect();
            let row = transform_record(index, &Value::Object(record));

            for field in crate::domain::entities::row::CANONICAL_FIELDS {
                prop_assert!(row.get(field).is_some(), "missing {}", field);
            }
            prop_assert!(!row.id().as_str().is_empty());
            prop_assert_eq!(row.get("id"), Some(&Value::String(row.id().as_str().to_string())));
        }
    }
}
