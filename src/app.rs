use std::collections::BTreeMap;
use std::rc::Rc;

use dioxus::prelude::*;

use crate::config::TableConfig;
use crate::domain::entities::column::{find_column, ColumnDef, FieldType, LANGUAGE_OPTIONS, STATE_OPTIONS};
use crate::domain::entities::dataset::SortDirection;
use crate::domain::entities::edit::CellKey;
use crate::domain::entities::row::{display_value, RowId};
use crate::infra::export::csv::save_csv_export_with_dialog;
use crate::infra::http::source::HttpSource;
use crate::ui::state::app_state::AppState;
use crate::usecase::services::view_controller::{LoadTask, TableController};

const CELL_STYLE: &str = "border: 1px solid #bbb; padding: 4px; vertical-align: top;";
const BUTTON_STYLE: &str =
    "border: 1px solid #bbb; background: #fff; padding: 4px 10px; border-radius: 6px; cursor: pointer;";

fn build_table() -> Result<Rc<TableController>, String> {
    let config = TableConfig::default();
    let source = HttpSource::new(&config).map_err(|err| err.to_string())?;
    Ok(Rc::new(TableController::from_source(Rc::new(source), &config)))
}

fn run_load(task: LoadTask, mut revision: Signal<u64>) {
    *revision.write() += 1;
    spawn(async move {
        task.await;
        *revision.write() += 1;
    });
}

#[derive(Clone, Copy)]
struct EditSignals {
    revision: Signal<u64>,
    editing_cell: Signal<Option<CellKey>>,
    editing_value: Signal<String>,
    edit_error: Signal<Option<String>>,
}

impl EditSignals {
    fn begin(mut self, key: CellKey, value: String) {
        self.editing_cell.set(Some(key));
        self.editing_value.set(value);
        self.edit_error.set(None);
    }

    fn cancel(mut self) {
        self.editing_cell.set(None);
        self.editing_value.set(String::new());
        self.edit_error.set(None);
    }

    fn commit(mut self, table: &TableController, key: &CellKey, value: &str) {
        // blur fires again after Enter or Escape has already closed the editor
        if self.editing_cell.read().as_ref() != Some(key) {
            return;
        }
        match table.edit_cell(&key.row_id, &key.field, value) {
            Ok(()) => {
                self.cancel();
                *self.revision.write() += 1;
            }
            Err(err) => self.edit_error.set(Some(err.to_string())),
        }
    }
}

#[component]
fn ColumnMenu(
    columns: Vec<(String, String, bool)>,
    mut open: Signal<bool>,
    on_toggle: EventHandler<String>,
) -> Element {
    rsx! {
        div {
            style: "position: relative; display: inline-flex; align-items: center;",
            button {
                style: BUTTON_STYLE,
                onclick: move |event| {
                    event.stop_propagation();
                    let next = !open();
                    open.set(next);
                },
                "顯示欄位"
            }
            if open() {
                div {
                    style: "position: absolute; top: 32px; left: 0; min-width: 200px; background: #fff; border: 1px solid #bbb; border-radius: 8px; box-shadow: 0 10px 24px rgba(0,0,0,0.15); z-index: 1200; padding: 6px;",
                    onclick: move |event| event.stop_propagation(),
                    {columns.iter().map(|(key, label, checked)| {
                        let key = key.clone();
                        let checked = *checked;
                        rsx!(
                            label {
                                key: "{key}",
                                style: "display: flex; align-items: center; gap: 8px; padding: 6px 4px; cursor: pointer;",
                                input {
                                    r#type: "checkbox",
                                    checked: checked,
                                    onclick: move |_| on_toggle.call(key.clone()),
                                }
                                span { "{label}" }
                            }
                        )
                    })}
                }
            }
        }
    }
}

fn cell_view(
    table: Rc<TableController>,
    column: ColumnDef,
    row_id: RowId,
    signals: EditSignals,
) -> Element {
    let key = CellKey::new(row_id.clone(), column.key);
    let value = table
        .cell_value(&row_id, column.key)
        .map(|value| display_value(&value).into_owned())
        .unwrap_or_default();
    let edited = table.is_cell_edited(&row_id, column.key);
    let background = if edited { "#fff7d6" } else { "transparent" };
    let is_editing = signals.editing_cell.read().as_ref() == Some(&key);

    if !is_editing {
        let shown = if value.is_empty() && column.editable {
            "（點擊編輯）".to_string()
        } else {
            value.clone()
        };
        return rsx! {
            td {
                style: "{CELL_STYLE} background: {background};",
                onclick: move |_| {
                    if column.editable {
                        signals.begin(key.clone(), value.clone());
                    }
                },
                "{shown}"
            }
        };
    }

    let error = signals.edit_error.cloned();
    let current = signals.editing_value.cloned();
    let mut editing_value = signals.editing_value;

    let editor = match column.field_type {
        FieldType::Select => {
            let table = table.clone();
            let key = key.clone();
            rsx! {
                select {
                    value: "{current}",
                    onchange: move |event| signals.commit(&table, &key, &event.value()),
                    onkeydown: move |event| {
                        if event.key() == Key::Escape {
                            signals.cancel();
                        }
                    },
                    option { value: "", "Select..." }
                    {column.options.iter().map(|option| rsx!(
                        option { key: "{option}", value: "{option}", "{option}" }
                    ))}
                }
            }
        }
        _ => {
            let table_for_key = table.clone();
            let key_for_key = key.clone();
            let table_for_blur = table.clone();
            let key_for_blur = key.clone();
            let multiline = column.multiline;
            let input_type = if column.field_type == FieldType::Email {
                "email"
            } else {
                "text"
            };
            rsx! {
                if multiline {
                    textarea {
                        rows: "2",
                        value: "{current}",
                        oninput: move |event| editing_value.set(event.value()),
                        onkeydown: move |event| {
                            if event.key() == Key::Enter && event.modifiers().ctrl() {
                                signals.commit(&table_for_key, &key_for_key, &editing_value());
                            } else if event.key() == Key::Escape {
                                signals.cancel();
                            }
                        },
                        onblur: move |_| {
                            signals.commit(&table_for_blur, &key_for_blur, &editing_value());
                        },
                    }
                } else {
                    input {
                        r#type: input_type,
                        value: "{current}",
                        oninput: move |event| editing_value.set(event.value()),
                        onkeydown: move |event| {
                            if event.key() == Key::Enter {
                                signals.commit(&table_for_key, &key_for_key, &editing_value());
                            } else if event.key() == Key::Escape {
                                signals.cancel();
                            }
                        },
                        onblur: move |_| {
                            signals.commit(&table_for_blur, &key_for_blur, &editing_value());
                        },
                    }
                }
            }
        }
    };

    rsx! {
        td {
            style: "{CELL_STYLE} background: {background};",
            {editor}
            if let Some(message) = error {
                div {
                    style: "color: #b00020; font-size: 12px; margin-top: 2px;",
                    "{message}"
                }
            }
        }
    }
}

#[component]
pub fn App() -> Element {
    let AppState {
        mut revision,
        mut status,
        mut search_input,
        mut filter_inputs,
        editing_cell,
        editing_value,
        edit_error,
        show_column_menu,
    } = AppState::new();

    let table = use_hook(build_table);

    let table_for_init = table.clone();
    use_effect(move || {
        if let Ok(table) = &table_for_init {
            run_load(table.load(true), revision);
        }
    });

    let table_for_drop = table.clone();
    use_drop(move || {
        if let Ok(table) = &table_for_drop {
            table.cancel();
        }
    });

    let table = match table {
        Ok(table) => table,
        Err(err) => {
            return rsx! {
                div {
                    p { "無法建立資料來源：{err}" }
                }
            };
        }
    };

    let _ = revision();
    let signals = EditSignals {
        revision,
        editing_cell,
        editing_value,
        edit_error,
    };

    let view = table.view().clone();
    let columns = table.columns().to_vec();
    let visible_keys = table.visible_columns();
    let visible_columns: Vec<ColumnDef> = visible_keys
        .iter()
        .filter_map(|key| find_column(&columns, key).cloned())
        .collect();
    let column_menu_items: Vec<(String, String, bool)> = columns
        .iter()
        .map(|column| {
            (
                column.key.to_string(),
                column.label.to_string(),
                visible_keys.iter().any(|key| key == column.key),
            )
        })
        .collect();
    let selected = table.selected_rows();
    let selected_count = selected.len();
    let all_selected =
        !view.rows.is_empty() && view.rows.iter().all(|row| selected.contains(row.id()));
    let edited_count = table.edited_cell_count();
    let state_filter = filter_inputs().get("state").cloned().unwrap_or_default();
    let language_filter = filter_inputs().get("language").cloned().unwrap_or_default();

    let table_for_search_key = table.clone();
    let table_for_search_button = table.clone();
    let table_for_refresh = table.clone();
    let table_for_add = table.clone();
    let table_for_delete = table.clone();
    let table_for_export = table.clone();
    let table_for_columns = table.clone();
    let table_for_state_filter = table.clone();
    let table_for_language_filter = table.clone();
    let table_for_select_all = table.clone();
    let table_for_retry = table.clone();
    let table_for_more = table.clone();

    rsx! {
        div {
            style: "font-family: sans-serif; padding: 12px; display: flex; flex-direction: column; gap: 12px;",
            onclick: move |_| {
                let mut open = show_column_menu;
                open.set(false);
            },
            nav {
                style: "display: flex; gap: 12px; align-items: center; flex-wrap: wrap;",
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| {
                        let row_id = table_for_add.add_new_row();
                        *status.write() = format!("已新增列 {row_id}");
                        *revision.write() += 1;
                    },
                    "新增列"
                }
                input {
                    placeholder: "搜尋…",
                    value: search_input(),
                    oninput: move |event| search_input.set(event.value()),
                    onkeydown: move |event| {
                        if event.key() == Key::Enter {
                            run_load(table_for_search_key.search(search_input()), revision);
                        }
                    },
                }
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| run_load(table_for_search_button.search(search_input()), revision),
                    "搜尋"
                }
                label {
                    "狀態 "
                    select {
                        value: "{state_filter}",
                        onchange: move |event| {
                            filter_inputs.write().insert("state".to_string(), event.value());
                            run_load(table_for_state_filter.set_filters(filter_inputs()), revision);
                        },
                        option { value: "", "全部" }
                        {STATE_OPTIONS.iter().map(|option| rsx!(
                            option { key: "{option}", value: "{option}", "{option}" }
                        ))}
                    }
                }
                label {
                    "語言 "
                    select {
                        value: "{language_filter}",
                        onchange: move |event| {
                            filter_inputs.write().insert("language".to_string(), event.value());
                            run_load(table_for_language_filter.set_filters(filter_inputs()), revision);
                        },
                        option { value: "", "全部" }
                        {LANGUAGE_OPTIONS.iter().map(|option| rsx!(
                            option { key: "{option}", value: "{option}", "{option}" }
                        ))}
                    }
                }
                if !filter_inputs().is_empty() {
                    button {
                        style: BUTTON_STYLE,
                        onclick: {
                            let table = table.clone();
                            move |_| {
                                filter_inputs.set(BTreeMap::new());
                                run_load(table.set_filters(BTreeMap::new()), revision);
                            }
                        },
                        "清除篩選"
                    }
                }
                button {
                    style: BUTTON_STYLE,
                    disabled: view.loading,
                    onclick: move |_| run_load(table_for_refresh.refresh(), revision),
                    "重新整理"
                }
                ColumnMenu {
                    columns: column_menu_items,
                    open: show_column_menu,
                    on_toggle: move |key: String| {
                        table_for_columns.toggle_column(&key);
                        *revision.write() += 1;
                    },
                }
                if selected_count > 0 {
                    span { "已選取 {selected_count} 筆" }
                }
                button {
                    style: BUTTON_STYLE,
                    disabled: selected_count == 0,
                    onclick: move |_| {
                        let ids = table_for_delete.selected_rows();
                        table_for_delete.bulk_delete(&ids);
                        *status.write() = format!("已刪除 {} 筆", ids.len());
                        *revision.write() += 1;
                    },
                    "刪除選取"
                }
                button {
                    style: BUTTON_STYLE,
                    disabled: selected_count == 0,
                    onclick: move |_| {
                        let ids = table_for_export.selected_rows();
                        match table_for_export.bulk_export(&ids) {
                            Ok(Some(csv_text)) => match save_csv_export_with_dialog(&csv_text) {
                                Ok(Some(path)) => {
                                    *status.write() = format!("已匯出 {}", path.display());
                                }
                                Ok(None) => *status.write() = "已取消匯出".to_string(),
                                Err(err) => *status.write() = format!("匯出失敗：{err}"),
                            },
                            Ok(None) => {}
                            Err(err) => *status.write() = format!("匯出失敗：{err}"),
                        }
                    },
                    "匯出 CSV"
                }
            }

            div {
                style: "display: flex; gap: 16px; color: #555;",
                span { "{status}" }
                span { "共 {view.total} 筆，已載入 {view.rows.len()} 筆" }
                if edited_count > 0 {
                    span { style: "color: #9a6700;", "未儲存變更：{edited_count}" }
                }
            }

            if let Some(error) = view.error.clone() {
                div {
                    style: "padding: 24px; text-align: center; border: 1px solid #e0b4b4; border-radius: 8px;",
                    p { style: "color: #b00020; font-weight: bold;", "載入資料失敗" }
                    p { "{error}" }
                    button {
                        style: BUTTON_STYLE,
                        onclick: move |_| run_load(table_for_retry.refresh(), revision),
                        "重試"
                    }
                }
            } else {
                div {
                    style: "overflow: auto; max-height: 75vh; border: 1px solid #bbb; border-radius: 8px;",
                    table {
                        style: "border-collapse: collapse; width: max-content; min-width: 100%;",
                        thead {
                            tr {
                                th {
                                    style: "{CELL_STYLE} position: sticky; top: 0; background: #f4f4f4;",
                                    input {
                                        r#type: "checkbox",
                                        checked: all_selected,
                                        onclick: move |_| {
                                            table_for_select_all.select_all(!all_selected);
                                            *revision.write() += 1;
                                        },
                                    }
                                }
                                {visible_columns.iter().map(|column| {
                                    let key = column.key;
                                    let label = column.label;
                                    let indicator = match &view.sort {
                                        Some(sort) if sort.field == key => match sort.direction {
                                            SortDirection::Asc => " ▲",
                                            SortDirection::Desc => " ▼",
                                        },
                                        _ => "",
                                    };
                                    let table = table.clone();
                                    rsx!(
                                        th {
                                            key: "{key}",
                                            style: "{CELL_STYLE} position: sticky; top: 0; background: #f4f4f4; cursor: pointer; text-align: left;",
                                            onclick: move |_| run_load(table.sort(key), revision),
                                            "{label}{indicator}"
                                        }
                                    )
                                })}
                            }
                        }
                        tbody {
                            {view.rows.iter().map(|row| {
                                let row_id = row.id().clone();
                                let is_selected = selected.contains(&row_id);
                                let row_style = if is_selected { "background: #eef5ff;" } else { "" };
                                let table_for_select = table.clone();
                                let id_for_select = row_id.clone();
                                rsx!(
                                    tr {
                                        key: "{row_id}",
                                        style: "{row_style}",
                                        td {
                                            style: "{CELL_STYLE} text-align: center;",
                                            input {
                                                r#type: "checkbox",
                                                checked: is_selected,
                                                onclick: move |_| {
                                                    table_for_select.select_row(&id_for_select, !is_selected);
                                                    *revision.write() += 1;
                                                },
                                            }
                                        }
                                        {visible_columns.iter().map(|column| {
                                            cell_view(table.clone(), column.clone(), row_id.clone(), signals)
                                        })}
                                    }
                                )
                            })}
                        }
                    }
                    div {
                        style: "padding: 12px; text-align: center; color: #555;",
                        if view.loading {
                            "載入中…"
                        } else if view.has_more {
                            button {
                                style: BUTTON_STYLE,
                                onclick: move |_| run_load(table_for_more.load_more(), revision),
                                "載入更多"
                            }
                        } else {
                            "已載入全部資料"
                        }
                    }
                }
            }
        }
    }
}
