use std::sync::OnceLock;

use regex::Regex;

use crate::domain::entities::column::{ColumnDef, FieldType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("This field is required")]
    Required,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please select a valid option")]
    InvalidOption,
    #[error("{0}")]
    Rule(String),
    #[error("column `{field}` is read-only")]
    ReadOnly { field: String },
    #[error("row `{row_id}` is not loaded")]
    UnknownRow { row_id: String },
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern should compile")
    })
}

/// Checks a candidate cell value against a column's rules.
///
/// The custom rule runs first; an empty value is accepted by the email and
/// select checks.
pub fn validate_cell(column: &ColumnDef, value: &str) -> Result<(), ValidationError> {
    if !column.editable {
        return Err(ValidationError::ReadOnly {
            field: column.key.to_string(),
        });
    }

    if let Some(rule) = column.rule {
        if let Some(message) = rule(value) {
            return Err(ValidationError::Rule(message));
        }
    }

    match column.field_type {
        FieldType::Required if value.trim().is_empty() => Err(ValidationError::Required),
        FieldType::Email if !value.is_empty() && !email_pattern().is_match(value) => {
            Err(ValidationError::InvalidEmail)
        }
        FieldType::Select
            if !value.is_empty() && !column.options.iter().any(|option| *option == value) =>
        {
            Err(ValidationError::InvalidOption)
        }
        _ => Ok(()),
    }
}
