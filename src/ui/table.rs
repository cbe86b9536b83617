use dioxus::prelude::{Key, *};

use crate::state::data_model::{self, ValueKind};
use crate::state::edit_session::{ActiveSession, ColumnLayout, EditorKind};
use crate::state::grid::ROW_NUMBER_HEADER;
use crate::state::i18n::{self, Language};
use crate::ui::actions::DialogPrompt;
use crate::ui::EditorState;

pub const ROW_NUMBER_WIDTH: f32 = 48.0;
pub const COLUMN_WIDTH: f32 = 160.0;

#[component]
pub fn Table(
    editor: Signal<EditorState>,
    language: Signal<Language>,
    error_message: Signal<Option<String>>,
    selected_row: Signal<Option<usize>>,
    selected_column: Signal<Option<usize>>,
) -> Element {
    let current_language = *language.read();
    let state = editor.read();
    let column_count = state.grid.column_count();

    if column_count == 0 {
        let empty_label = i18n::tr(current_language, "table.empty");
        return rsx! {
            p { class: "empty-message", id: "empty-message", "{empty_label}" }
        };
    }

    let columns: Vec<(usize, String, ValueKind)> = state
        .grid
        .column_defs()
        .iter()
        .enumerate()
        .map(|(index, def)| (index + 1, def.name.clone(), def.kind))
        .collect();
    let row_count = state.grid.row_count();
    let active = state.coordinator.active();
    drop(state);

    rsx! {
        div { class: "table-container", id: "table-container",
            table {
                thead {
                    tr {
                        th {
                            class: "row-number",
                            style: "width: {ROW_NUMBER_WIDTH}px",
                            "{ROW_NUMBER_HEADER}"
                        }
                        for (column, name, kind) in columns.iter().cloned() {
                            if active == ActiveSession::Header(column) {
                                HeaderEditor { editor, language, error_message, column }
                            } else {
                                th {
                                    class: header_class(column, &selected_column),
                                    id: format!("col-{column}-{}", sanitize_id(&name)),
                                    style: "width: {COLUMN_WIDTH}px",
                                    onclick: move |evt: MouseEvent| {
                                        let x = column_left(column) + evt.element_coordinates().x as f32;
                                        header_clicked(editor, language, error_message, x);
                                        let mut selected_column = selected_column;
                                        selected_column.set(Some(column));
                                    },
                                    span { class: "header-name", "{name}" }
                                    span { class: "header-kind", "{i18n::tr(current_language, kind.label_key())}" }
                                }
                            }
                        }
                    }
                }
                tbody {
                    for row in 0..row_count {
                        TableRow {
                            row,
                            editor,
                            language,
                            error_message,
                            selected_row,
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn HeaderEditor(
    editor: Signal<EditorState>,
    language: Signal<Language>,
    error_message: Signal<Option<String>>,
    column: usize,
) -> Element {
    let current_language = *language.read();
    let Some((name, kind, popup_open)) = editor
        .read()
        .coordinator
        .header_session()
        .map(|session| (session.name().to_string(), session.kind(), session.is_type_popup_open()))
    else {
        return rsx! {};
    };

    rsx! {
        th { class: "editing-header", style: "width: {COLUMN_WIDTH}px",
            div { class: "header-editor",
                input {
                    class: "header-input",
                    id: format!("header-input-{column}"),
                    value: "{name}",
                    autofocus: true,
                    oninput: move |evt| {
                        let value = evt.value();
                        let mut editor = editor;
                        editor.with_mut(|state| {
                            if let Some(session) = state.coordinator.header_session_mut() {
                                session.set_name(value);
                            }
                        });
                    },
                    onkeydown: move |evt| {
                        match evt.key() {
                            Key::Enter => commit_header(editor, language, error_message),
                            Key::Escape => {
                                let mut editor = editor;
                                editor.with_mut(|state| {
                                    state.coordinator.cancel_header_edit();
                                });
                            }
                            _ => {}
                        }
                    }
                }
                button {
                    class: "type-chooser",
                    id: format!("type-chooser-{column}"),
                    title: "{i18n::tr(current_language, kind.label_key())}",
                    onclick: move |_| {
                        let mut editor = editor;
                        editor.with_mut(|state| state.coordinator.open_type_popup());
                    },
                    "\u{25BE}"
                }
            }
            if popup_open {
                ul { class: "type-popup", id: format!("type-popup-{column}"),
                    for option in ValueKind::all().iter().copied() {
                        li {
                            class: if option == kind { "type-option selected" } else { "type-option" },
                            onclick: move |_| choose_type(editor, language, error_message, option),
                            "{i18n::tr(current_language, option.label_key())}"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn TableRow(
    row: usize,
    editor: Signal<EditorState>,
    language: Signal<Language>,
    error_message: Signal<Option<String>>,
    selected_row: Signal<Option<usize>>,
) -> Element {
    let state = editor.read();
    let values: Vec<String> = (1..state.grid.column_count())
        .map(|column| {
            state
                .grid
                .value_at(row, column)
                .map(|value| data_model::display_value(&value))
                .unwrap_or_default()
        })
        .collect();
    let editing = state
        .coordinator
        .cell_session()
        .filter(|cell| cell.row() == row)
        .map(|cell| (cell.column(), cell.editor(), cell.draft().to_string()));
    drop(state);

    let is_selected = *selected_row.read() == Some(row);
    let mut row_class = if row % 2 == 0 { "even" } else { "odd" }.to_string();
    if is_selected {
        row_class.push_str(" selected-row");
    }

    rsx! {
        tr { class: "{row_class}", id: format!("row-{row}"),
            td {
                class: "row-number",
                onclick: move |_| {
                    let mut selected_row = selected_row;
                    selected_row.set(Some(row));
                },
                "{row + 1}"
            }
            for (index, text) in values.into_iter().enumerate() {
                {
                    let column = index + 1;
                    match editing.as_ref().filter(|(edit_column, _, _)| *edit_column == column) {
                        Some((_, kind, draft)) => rsx! {
                            CellEditor {
                                row,
                                column,
                                kind: *kind,
                                draft: draft.clone(),
                                editor,
                                error_message,
                            }
                        },
                        None => rsx! {
                            td {
                                class: "cell",
                                id: format!("cell-{row}-{column}"),
                                onclick: move |_| {
                                    let mut selected_row = selected_row;
                                    selected_row.set(Some(row));
                                    cell_clicked(editor, language, error_message, row, column);
                                },
                                "{text}"
                            }
                        },
                    }
                }
            }
        }
    }
}

#[component]
fn CellEditor(
    row: usize,
    column: usize,
    kind: EditorKind,
    draft: String,
    editor: Signal<EditorState>,
    error_message: Signal<Option<String>>,
) -> Element {
    if kind == EditorKind::Checkbox {
        let checked = draft.eq_ignore_ascii_case("true");
        return rsx! {
            td { class: "editing-cell",
                input {
                    class: "cell-checkbox",
                    id: format!("cell-input-{row}-{column}"),
                    r#type: "checkbox",
                    checked,
                    onchange: move |evt| {
                        let value = evt.checked().to_string();
                        let mut editor = editor;
                        editor.with_mut(|state| {
                            if let Some(cell) = state.coordinator.cell_session_mut() {
                                cell.set_draft(value);
                            }
                        });
                        commit_cell(editor, error_message);
                    }
                }
            }
        };
    }

    rsx! {
        td { class: "editing-cell",
            input {
                class: "cell-input",
                id: format!("cell-input-{row}-{column}"),
                r#type: input_type(kind),
                step: if matches!(kind, EditorKind::Decimal | EditorKind::Time) { "any" } else { "1" },
                value: "{draft}",
                autofocus: true,
                oninput: move |evt| {
                    let value = evt.value();
                    let mut editor = editor;
                    editor.with_mut(|state| {
                        if let Some(cell) = state.coordinator.cell_session_mut() {
                            cell.set_draft(value);
                        }
                    });
                },
                onblur: move |_| {
                    commit_cell(editor, error_message);
                },
                onkeydown: move |evt| {
                    match evt.key() {
                        Key::Enter => commit_cell(editor, error_message),
                        Key::Escape => {
                            let mut editor = editor;
                            editor.with_mut(|state| {
                                state.coordinator.cancel_cell_edit();
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

fn input_type(kind: EditorKind) -> &'static str {
    match kind {
        EditorKind::Integral | EditorKind::Decimal => "number",
        EditorKind::Date => "date",
        EditorKind::Time => "time",
        EditorKind::Text | EditorKind::DateTime | EditorKind::Checkbox => "text",
    }
}

/// Left edge of `column` in the header row, in pixels.
fn column_left(column: usize) -> f32 {
    if column == 0 {
        0.0
    } else {
        ROW_NUMBER_WIDTH + (column - 1) as f32 * COLUMN_WIDTH
    }
}

fn layout_for(user_columns: usize) -> ColumnLayout {
    let mut widths = vec![ROW_NUMBER_WIDTH];
    widths.extend(std::iter::repeat(COLUMN_WIDTH).take(user_columns));
    ColumnLayout::new(widths)
}

fn header_clicked(
    mut editor: Signal<EditorState>,
    language: Signal<Language>,
    mut error_message: Signal<Option<String>>,
    x: f32,
) {
    let mut prompt = DialogPrompt::new(*language.read());
    let result = editor.with_mut(|state| {
        let layout = layout_for(state.grid.user_column_count());
        let activation = state
            .coordinator
            .header_click(&mut state.grid, &layout, x, false, &mut prompt)?;
        if let Some(activation) = activation {
            state.coordinator.forward_click(&activation);
        }
        Ok::<_, crate::state::grid::GridError>(())
    });
    if let Err(err) = result {
        error_message.set(Some(err.to_string()));
    }
}

fn commit_header(
    mut editor: Signal<EditorState>,
    language: Signal<Language>,
    mut error_message: Signal<Option<String>>,
) {
    let mut prompt = DialogPrompt::new(*language.read());
    let result = editor.with_mut(|state| {
        state
            .coordinator
            .stop_header_edit(&mut state.grid, &mut prompt)
    });
    if let Err(err) = result {
        error_message.set(Some(err.to_string()));
    }
}

fn choose_type(
    mut editor: Signal<EditorState>,
    language: Signal<Language>,
    mut error_message: Signal<Option<String>>,
    kind: ValueKind,
) {
    let mut prompt = DialogPrompt::new(*language.read());
    let result = editor.with_mut(|state| {
        state
            .coordinator
            .choose_header_type(&mut state.grid, kind, &mut prompt)
    });
    if let Err(err) = result {
        error_message.set(Some(err.to_string()));
    }
}

fn cell_clicked(
    mut editor: Signal<EditorState>,
    language: Signal<Language>,
    mut error_message: Signal<Option<String>>,
    row: usize,
    column: usize,
) {
    let mut prompt = DialogPrompt::new(*language.read());
    let result = editor.with_mut(|state| {
        state
            .coordinator
            .begin_cell_edit(&mut state.grid, row, column, &mut prompt)
    });
    if let Err(err) = result {
        error_message.set(Some(err.to_string()));
    }
}

fn commit_cell(mut editor: Signal<EditorState>, mut error_message: Signal<Option<String>>) {
    let result = editor.with_mut(|state| state.coordinator.stop_cell_edit(&mut state.grid));
    match result {
        Ok(_) => error_message.set(None),
        Err(err) => error_message.set(Some(err.to_string())),
    }
}

fn header_class(column: usize, selected_column: &Signal<Option<usize>>) -> String {
    let selected_class = if *selected_column.read() == Some(column) {
        "selected-col"
    } else {
        ""
    };
    join_classes("editable-header", selected_class)
}

fn join_classes(a: &str, b: &str) -> String {
    if a.is_empty() {
        return b.to_string();
    }
    if b.is_empty() {
        return a.to_string();
    }
    format!("{a} {b}")
}

fn sanitize_id(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
