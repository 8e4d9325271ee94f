use std::collections::BTreeMap;
use std::rc::Rc;

use crate::domain::entities::row::Row;

/// The cached, transformed dataset. Replaced wholesale, never patched.
pub type Snapshot = Rc<[Row]>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: usize,
    pub search_term: String,
    pub sort: Option<SortSpec>,
    /// Exact-match column filters, ANDed with the search term.
    pub filters: BTreeMap<String, String>,
}

impl PageQuery {
    pub fn first_page() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub rows: Vec<Row>,
    pub has_more: bool,
    pub total: usize,
}
