use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use serde_json::Value;

use crate::config::TableConfig;
use crate::domain::entities::column::ColumnDef;
use crate::domain::entities::dataset::{PageQuery, SortDirection, SortSpec};
use crate::domain::entities::edit::{CellKey, EditLedger};
use crate::domain::entities::row::{Row, RowId, CANONICAL_FIELDS};
use crate::domain::rules::validation::ValidationError;
use crate::usecase::ports::source::DataSource;
use crate::usecase::services::dataset_cache::DatasetCache;
use crate::usecase::services::edit_service::EditService;
use crate::usecase::services::export_service::rows_to_csv;
use crate::usecase::services::query_service::QueryService;
use crate::usecase::services::row_transformer::new_local_row;

/// A pending page load. Dropping it abandons the load; awaiting it commits the
/// page unless a newer load has started in the meantime.
pub type LoadTask = LocalBoxFuture<'static, ()>;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub rows: Vec<Row>,
    /// Next page to request.
    pub page: usize,
    pub search_term: String,
    pub sort: Option<SortSpec>,
    pub filters: BTreeMap<String, String>,
    pub loading: bool,
    pub error: Option<String>,
    pub has_more: bool,
    pub total: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            page: 0,
            search_term: String::new(),
            sort: None,
            filters: BTreeMap::new(),
            loading: false,
            error: None,
            has_more: true,
            total: 0,
        }
    }
}

impl ViewState {
    fn clear_rows(&mut self) {
        self.rows.clear();
        self.page = 0;
    }

    fn query_for(&self, reset: bool) -> PageQuery {
        PageQuery {
            page: if reset { 0 } else { self.page },
            search_term: self.search_term.clone(),
            sort: self.sort.clone(),
            filters: self.filters.clone(),
        }
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort
            .as_ref()
            .map(|sort| sort.direction)
            .unwrap_or_default()
    }
}

struct ControllerState {
    view: ViewState,
    edits: EditLedger,
    selected: BTreeSet<RowId>,
    visible_columns: Vec<String>,
    generation: u64,
    local_rows: u64,
}

/// Owns the fetch lifecycle, the accumulated rows and the edit ledger of one
/// table.
///
/// Every load takes a new generation number; a load only commits if its
/// generation is still current when its query resolves.
pub struct TableController {
    query: Rc<QueryService>,
    edit_service: EditService,
    state: Rc<RefCell<ControllerState>>,
}

impl TableController {
    pub fn new(query: QueryService, edit_service: EditService) -> Self {
        Self {
            query: Rc::new(query),
            edit_service,
            state: Rc::new(RefCell::new(ControllerState {
                view: ViewState::default(),
                edits: EditLedger::new(),
                selected: BTreeSet::new(),
                visible_columns: CANONICAL_FIELDS.iter().map(|key| key.to_string()).collect(),
                generation: 0,
                local_rows: 0,
            })),
        }
    }

    pub fn from_source(source: Rc<dyn DataSource>, config: &TableConfig) -> Self {
        let cache = Rc::new(DatasetCache::new(source));
        Self::new(
            QueryService::new(cache, config.page_size),
            EditService::default(),
        )
    }

    pub fn view(&self) -> Ref<'_, ViewState> {
        Ref::map(self.state.borrow(), |state| &state.view)
    }

    pub fn columns(&self) -> &[ColumnDef] {
        self.edit_service.columns()
    }

    /// Starts a load. A non-reset load is skipped while another load is in
    /// flight; any started load supersedes the previous one.
    pub fn load(&self, reset: bool) -> LoadTask {
        let (generation, query) = {
            let mut state = self.state.borrow_mut();
            if state.view.loading && !reset {
                return future::ready(()).boxed_local();
            }
            state.generation += 1;
            state.view.loading = true;
            state.view.error = None;
            (state.generation, state.view.query_for(reset))
        };

        let service = self.query.clone();
        let shared_state = self.state.clone();
        async move {
            let outcome = service.query_page(&query).await;

            let mut guard = shared_state.borrow_mut();
            if guard.generation != generation {
                tracing::debug!(generation, current = guard.generation, "discarding superseded load");
                return;
            }

            let ControllerState { view, edits, .. } = &mut *guard;
            view.loading = false;
            match outcome {
                Ok(page) => {
                    let mut rows = page.rows;
                    for row in &mut rows {
                        edits.apply_to(row);
                    }
                    if reset {
                        view.rows = rows;
                        view.page = 1;
                    } else {
                        view.rows.extend(rows);
                        view.page += 1;
                    }
                    view.has_more = page.has_more;
                    view.total = page.total;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to load table page");
                    view.error = Some(err.to_string());
                }
            }
        }
        .boxed_local()
    }

    pub fn load_more(&self) -> LoadTask {
        {
            let state = self.state.borrow();
            if !state.view.has_more || state.view.loading {
                return future::ready(()).boxed_local();
            }
        }
        self.load(false)
    }

    fn reset_with(&self, update: impl FnOnce(&mut ViewState)) -> LoadTask {
        {
            let mut state = self.state.borrow_mut();
            update(&mut state.view);
            state.view.clear_rows();
        }
        self.load(true)
    }

    pub fn search(&self, term: impl Into<String>) -> LoadTask {
        let term = term.into();
        self.reset_with(move |view| view.search_term = term)
    }

    /// Sorts by `field`, flipping to descending when it is already the
    /// ascending sort field.
    pub fn sort(&self, field: &str) -> LoadTask {
        let field = field.to_string();
        self.reset_with(move |view| {
            let direction = match &view.sort {
                Some(sort) if sort.field == field && sort.direction == SortDirection::Asc => {
                    SortDirection::Desc
                }
                _ => SortDirection::Asc,
            };
            view.sort = Some(SortSpec { field, direction });
        })
    }

    pub fn set_filters(&self, filters: BTreeMap<String, String>) -> LoadTask {
        self.reset_with(move |view| {
            view.filters = filters
                .into_iter()
                .filter(|(_, value)| !value.is_empty())
                .collect();
        })
    }

    pub fn refresh(&self) -> LoadTask {
        self.reset_with(|_| {})
    }

    /// Invalidates the in-flight load without touching the rows.
    pub fn cancel(&self) {
        let mut state = self.state.borrow_mut();
        state.generation += 1;
        state.view.loading = false;
    }

    pub fn edit_cell(&self, row_id: &RowId, field: &str, value: &str) -> Result<(), ValidationError> {
        let mut guard = self.state.borrow_mut();
        let ControllerState { view, edits, .. } = &mut *guard;
        self.edit_service
            .apply_edit(edits, &mut view.rows, row_id, field, value)
    }

    pub fn cell_value(&self, row_id: &RowId, field: &str) -> Option<Value> {
        let state = self.state.borrow();
        state.edits.effective_value(row_id, field, &state.view.rows)
    }

    pub fn is_cell_edited(&self, row_id: &RowId, field: &str) -> bool {
        self.state
            .borrow()
            .edits
            .contains(&CellKey::new(row_id.clone(), field))
    }

    pub fn edited_cell_count(&self) -> usize {
        self.state.borrow().edits.len()
    }

    pub fn add_new_row(&self) -> RowId {
        let mut state = self.state.borrow_mut();
        state.local_rows += 1;
        let row = new_local_row(chrono::Utc::now(), state.local_rows);
        let id = row.id().clone();
        state.view.rows.insert(0, row);
        id
    }

    pub fn select_row(&self, row_id: &RowId, selected: bool) {
        let mut state = self.state.borrow_mut();
        if selected {
            state.selected.insert(row_id.clone());
        } else {
            state.selected.remove(row_id);
        }
    }

    pub fn select_all(&self, selected: bool) {
        let mut state = self.state.borrow_mut();
        state.selected = if selected {
            state.view.rows.iter().map(|row| row.id().clone()).collect()
        } else {
            BTreeSet::new()
        };
    }

    pub fn selected_rows(&self) -> BTreeSet<RowId> {
        self.state.borrow().selected.clone()
    }

    pub fn is_selected(&self, row_id: &RowId) -> bool {
        self.state.borrow().selected.contains(row_id)
    }

    pub fn toggle_column(&self, key: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(pos) = state.visible_columns.iter().position(|column| column == key) {
            state.visible_columns.remove(pos);
        } else {
            state.visible_columns.push(key.to_string());
        }
    }

    pub fn visible_columns(&self) -> Vec<String> {
        self.state.borrow().visible_columns.clone()
    }

    /// Drops the given rows from the accumulated view and clears the selection.
    pub fn bulk_delete(&self, ids: &BTreeSet<RowId>) {
        let mut state = self.state.borrow_mut();
        state.view.rows.retain(|row| !ids.contains(row.id()));
        state.selected.clear();
    }

    /// CSV for the given rows in view order, `None` when none of them is loaded.
    pub fn bulk_export(&self, ids: &BTreeSet<RowId>) -> anyhow::Result<Option<String>> {
        let state = self.state.borrow();
        let rows: Vec<&Row> = state
            .view
            .rows
            .iter()
            .filter(|row| ids.contains(row.id()))
            .collect();
        rows_to_csv(&rows)
    }
}
