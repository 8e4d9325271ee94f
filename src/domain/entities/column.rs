/// Validation flavour of an editable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    Text,
    Required,
    Email,
    Select,
}

/// Extra per-column rule; returns a message when the value is rejected.
pub type CustomRule = fn(&str) -> Option<String>;

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub label: &'static str,
    pub editable: bool,
    pub field_type: FieldType,
    pub options: Vec<&'static str>,
    pub multiline: bool,
    pub rule: Option<CustomRule>,
}

impl ColumnDef {
    pub fn read_only(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            editable: false,
            field_type: FieldType::Text,
            options: Vec::new(),
            multiline: false,
            rule: None,
        }
    }

    pub fn editable(key: &'static str, label: &'static str, field_type: FieldType) -> Self {
        Self {
            editable: true,
            field_type,
            ..Self::read_only(key, label)
        }
    }

    pub fn with_options(mut self, options: &[&'static str]) -> Self {
        self.options = options.to_vec();
        self
    }

    pub fn with_rule(mut self, rule: CustomRule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }
}

pub const LANGUAGE_OPTIONS: [&str; 12] = [
    "English",
    "Spanish",
    "French",
    "German",
    "Chinese",
    "Japanese",
    "Fairfield",
    "Orange",
    "Naperville",
    "Pembroke Pines",
    "Austin",
    "Toledo",
];

pub const VERSION_OPTIONS: [&str; 8] = [
    "v1.0",
    "v1.1",
    "v2.0",
    "v2.1",
    "new customer",
    "served",
    "to contact",
    "pause",
];

pub const STATE_OPTIONS: [&str; 6] = [
    "new customer",
    "served",
    "to contact",
    "pause",
    "active",
    "inactive",
];

fn name_min_length(value: &str) -> Option<String> {
    if value.chars().count() < 2 {
        Some("Name must be at least 2 characters".to_string())
    } else {
        None
    }
}

pub fn default_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::read_only("id", "Id"),
        ColumnDef::editable("bio", "Bio", FieldType::Text).multiline(),
        ColumnDef::editable("name", "Name", FieldType::Required).with_rule(name_min_length),
        ColumnDef::editable("language", "Language", FieldType::Select)
            .with_options(&LANGUAGE_OPTIONS),
        ColumnDef::editable("version", "Version", FieldType::Select).with_options(&VERSION_OPTIONS),
        ColumnDef::editable("state", "State", FieldType::Select).with_options(&STATE_OPTIONS),
        ColumnDef::read_only("createdDate", "Created Date"),
    ]
}

pub fn find_column<'a>(columns: &'a [ColumnDef], key: &str) -> Option<&'a ColumnDef> {
    columns.iter().find(|column| column.key == key)
}
