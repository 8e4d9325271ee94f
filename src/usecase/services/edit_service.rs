use serde_json::Value;

use crate::domain::entities::column::{default_columns, find_column, ColumnDef};
use crate::domain::entities::edit::{CellKey, EditLedger};
use crate::domain::entities::row::{Row, RowId};
use crate::domain::rules::validation::{validate_cell, ValidationError};

/// Validates cell edits and applies accepted ones to the rows and the ledger.
pub struct EditService {
    columns: Vec<ColumnDef>,
}

impl Default for EditService {
    fn default() -> Self {
        Self::new(default_columns())
    }
}

impl EditService {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn validate(&self, field: &str, value: &str) -> Result<(), ValidationError> {
        let column = find_column(&self.columns, field).ok_or_else(|| ValidationError::ReadOnly {
            field: field.to_string(),
        })?;
        validate_cell(column, value)
    }

    /// Applies one edit. A rejected edit leaves both rows and ledger untouched.
    ///
    /// The ledger keeps the value the cell had before its first pending edit,
    /// so writing that value back clears the entry.
    pub fn apply_edit(
        &self,
        ledger: &mut EditLedger,
        rows: &mut [Row],
        row_id: &RowId,
        field: &str,
        value: &str,
    ) -> Result<(), ValidationError> {
        if let Err(err) = self.validate(field, value) {
            tracing::debug!(row = %row_id, field, error = %err, "edit rejected");
            return Err(err);
        }

        let row = rows
            .iter_mut()
            .find(|row| row.id() == row_id)
            .ok_or_else(|| ValidationError::UnknownRow {
                row_id: row_id.to_string(),
            })?;

        let key = CellKey::new(row_id.clone(), field);
        let new_value = Value::String(value.to_string());
        let original_value = ledger
            .original_value(&key)
            .cloned()
            .or_else(|| row.get(field).cloned())
            .unwrap_or(Value::Null);

        ledger.set_edit(key, new_value.clone(), original_value);
        row.set(field, new_value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::column::FieldType;
    use crate::usecase::services::row_transformer::transform_records;
    use serde_json::json;

    fn rows() -> Vec<Row> {
        transform_records(&[
            json!({"id": "r1", "name": "Alice", "email": "alice@example.com"}),
            json!({"id": "r2", "name": "Carol"}),
        ])
    }

    #[test]
    fn accepted_edit_updates_row_and_ledger() {
        let service = EditService::default();
        let mut ledger = EditLedger::new();
        let mut rows = rows();

        service
            .apply_edit(&mut ledger, &mut rows, &RowId::from("r1"), "name", "Bob")
            .expect("edit should be accepted");

        assert_eq!(rows[0].get("name"), Some(&json!("Bob")));
        let cell = ledger
            .get(&CellKey::new("r1", "name"))
            .expect("edit should be tracked");
        assert_eq!(cell.original_value, json!("Alice"));
    }

    #[test]
    fn editing_back_to_baseline_clears_the_ledger() {
        let service = EditService::default();
        let mut ledger = EditLedger::new();
        let mut rows = rows();
        let r1 = RowId::from("r1");

        service
            .apply_edit(&mut ledger, &mut rows, &r1, "name", "Bob")
            .expect("edit should be accepted");
        service
            .apply_edit(&mut ledger, &mut rows, &r1, "name", "Bobby")
            .expect("edit should be accepted");
        service
            .apply_edit(&mut ledger, &mut rows, &r1, "name", "Alice")
            .expect("edit should be accepted");

        assert!(ledger.is_empty());
        assert_eq!(rows[0].get("name"), Some(&json!("Alice")));
    }

    #[test]
    fn rejected_edit_keeps_the_stored_value() {
        let mut columns = default_columns();
        columns.push(ColumnDef::editable("email", "Email", FieldType::Email));
        let service = EditService::new(columns);
        let mut ledger = EditLedger::new();
        let mut rows = rows();

        let result = service.apply_edit(
            &mut ledger,
            &mut rows,
            &RowId::from("r1"),
            "email",
            "not-an-email",
        );

        assert_eq!(result, Err(ValidationError::InvalidEmail));
        assert_eq!(rows[0].get("email"), Some(&json!("alice@example.com")));
        assert!(ledger.is_empty());
    }

    #[test]
    fn unknown_rows_and_columns_are_rejected() {
        let service = EditService::default();
        let mut ledger = EditLedger::new();
        let mut rows = rows();

        assert_eq!(
            service.apply_edit(&mut ledger, &mut rows, &RowId::from("zz"), "name", "Bob"),
            Err(ValidationError::UnknownRow {
                row_id: "zz".to_string()
            })
        );
        assert_eq!(
            service.apply_edit(&mut ledger, &mut rows, &RowId::from("r1"), "nope", "x"),
            Err(ValidationError::ReadOnly {
                field: "nope".to_string()
            })
        );
        assert!(ledger.is_empty());
    }
}
