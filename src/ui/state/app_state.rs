use std::collections::BTreeMap;

use dioxus::prelude::{use_signal, Signal};

use crate::domain::entities::edit::CellKey;

/// Presentation-only state; table data lives in the controller.
pub struct AppState {
    /// Bumped whenever the controller changes so the table re-renders.
    pub revision: Signal<u64>,
    pub status: Signal<String>,
    pub search_input: Signal<String>,
    pub filter_inputs: Signal<BTreeMap<String, String>>,
    pub editing_cell: Signal<Option<CellKey>>,
    pub editing_value: Signal<String>,
    pub edit_error: Signal<Option<String>>,
    pub show_column_menu: Signal<bool>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            revision: use_signal(|| 0_u64),
            status: use_signal(|| "就緒".to_string()),
            search_input: use_signal(String::new),
            filter_inputs: use_signal(BTreeMap::<String, String>::new),
            editing_cell: use_signal(|| None::<CellKey>),
            editing_value: use_signal(String::new),
            edit_error: use_signal(|| None::<String>),
            show_column_menu: use_signal(|| false),
        }
    }
}
