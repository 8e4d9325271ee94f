use std::collections::HashMap;

use serde_json::Value;

use crate::domain::entities::row::{Row, RowId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub row_id: RowId,
    pub field: String,
}

impl CellKey {
    pub fn new(row_id: impl Into<RowId>, field: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            field: field.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditedCell {
    pub value: Value,
    pub original_value: Value,
}

/// Pending cell edits, keyed by row id and field.
///
/// An entry only exists while its value differs from the original it was
/// recorded against.
#[derive(Debug, Clone, Default)]
pub struct EditLedger {
    cells: HashMap<CellKey, EditedCell>,
}

impl EditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_edit(&mut self, key: CellKey, value: Value, original_value: Value) {
        if value == original_value {
            self.cells.remove(&key);
        } else {
            self.cells.insert(
                key,
                EditedCell {
                    value,
                    original_value,
                },
            );
        }
    }

    pub fn get(&self, key: &CellKey) -> Option<&EditedCell> {
        self.cells.get(key)
    }

    /// Baseline value recorded by the first edit of a cell, if it is still pending.
    pub fn original_value(&self, key: &CellKey) -> Option<&Value> {
        self.cells.get(key).map(|cell| &cell.original_value)
    }

    /// Pending value if present, otherwise the baseline row's field value.
    pub fn effective_value(&self, row_id: &RowId, field: &str, rows: &[Row]) -> Option<Value> {
        let key = CellKey::new(row_id.clone(), field);
        if let Some(cell) = self.cells.get(&key) {
            return Some(cell.value.clone());
        }
        rows.iter()
            .find(|row| row.id() == row_id)
            .and_then(|row| row.get(field))
            .cloned()
    }

    /// Writes every pending value that belongs to `row` into it.
    pub fn apply_to(&self, row: &mut Row) {
        if self.cells.is_empty() {
            return;
        }
        let row_id = row.id().clone();
        for (key, cell) in &self.cells {
            if key.row_id == row_id {
                row.set(&key.field, cell.value.clone());
            }
        }
    }

    pub fn contains(&self, key: &CellKey) -> bool {
        self.cells.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
