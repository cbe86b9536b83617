use dioxus::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

use crate::io::import::CancelToken;
use crate::state::data_model::ValueKind;
use crate::state::i18n::{self, Language};
use crate::ui::actions;
use crate::ui::EditorState;

#[component]
pub fn Toolbar(
    editor: Signal<EditorState>,
    language: Signal<Language>,
    file_path: Signal<Option<PathBuf>>,
    error_message: Signal<Option<String>>,
    selected_row: Signal<Option<usize>>,
    selected_column: Signal<Option<usize>>,
    import_cancel: Signal<Option<CancelToken>>,
    save_success: Signal<bool>,
) -> Element {
    let mut new_column = use_signal(String::new);
    let mut new_column_kind = use_signal(|| ValueKind::Text);
    let mut first_row_is_header = use_signal(|| true);

    let current_language = *language.read();
    let importing = import_cancel.read().is_some();
    let header_checked = *first_row_is_header.read();
    let kind_value = new_column_kind.read().code();
    let selected_column_name = selected_column.read().and_then(|column| {
        editor
            .read()
            .grid
            .column_name(column)
            .map(str::to_string)
    });

    let import_label = i18n::tr(current_language, "toolbar.import");
    let cancel_import_label = i18n::tr(current_language, "toolbar.cancel_import");
    let first_row_header_label = i18n::tr(current_language, "toolbar.first_row_header");
    let open_label = i18n::tr(current_language, "toolbar.open");
    let save_label = i18n::tr(current_language, "toolbar.save");
    let add_row_label = i18n::tr(current_language, "toolbar.add_row");
    let insert_row_label = i18n::tr(current_language, "toolbar.insert_row");
    let delete_row_label = i18n::tr(current_language, "toolbar.delete_row");
    let new_column_placeholder = i18n::tr(current_language, "toolbar.new_column_placeholder");
    let add_column_label = i18n::tr(current_language, "toolbar.add_column");
    let delete_column_label = i18n::tr(current_language, "toolbar.delete_column");
    let clear_label = i18n::tr(current_language, "toolbar.clear");
    let selected_column_label = i18n::tr(current_language, "toolbar.selected_column");
    let save_success_label = i18n::tr(current_language, "toolbar.save_success");
    let importing_label = i18n::tr(current_language, "toolbar.importing");

    rsx! {
        div { class: "toolbar",
            // File group
            div { class: "toolbar-group",
                select {
                    class: "toolbar-select toolbar-select-sm",
                    id: "select-language",
                    value: "{current_language.code()}",
                    onchange: move |evt| {
                        if let Some(next_language) = Language::from_code(&evt.value()) {
                            language.set(next_language);
                        }
                    },
                    for lang in Language::all().iter().copied() {
                        option { value: "{lang.code()}", "{i18n::tr(current_language, lang.label_key())}" }
                    }
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-import",
                    disabled: importing,
                    onclick: move |_| {
                        spawn(async move {
                            actions::import_spreadsheet(
                                    editor,
                                    language,
                                    first_row_is_header,
                                    error_message,
                                    import_cancel,
                                )
                                .await;
                        });
                    },
                    "\u{1F4E5} {import_label}"
                }
                label { class: "toolbar-label",
                    input {
                        id: "check-first-row-header",
                        r#type: "checkbox",
                        checked: header_checked,
                        onchange: move |evt| first_row_is_header.set(evt.checked()),
                    }
                    "{first_row_header_label}"
                }
                if importing {
                    button {
                        class: "toolbar-btn",
                        id: "btn-cancel-import",
                        onclick: move |_| actions::cancel_import(import_cancel),
                        "\u{2715} {cancel_import_label}"
                    }
                    span { class: "toolbar-label", "{importing_label}" }
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-open",
                    onclick: move |_| {
                        spawn(async move {
                            actions::open_snapshot(editor, language, file_path, error_message).await;
                        });
                    },
                    "\u{1F4C2} {open_label}"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-save",
                    onclick: move |_| {
                        spawn(async move {
                            if actions::save_snapshot(editor, language, file_path, error_message).await {
                                save_success.set(true);
                                tokio::time::sleep(Duration::from_secs(2)).await;
                                save_success.set(false);
                            }
                        });
                    },
                    "\u{1F4BE} {save_label}"
                }
                if *save_success.read() {
                    span { class: "save-success", id: "save-success", "{save_success_label}" }
                }
            }
            div { class: "toolbar-separator" }

            // Row group
            div { class: "toolbar-group",
                button {
                    class: "toolbar-btn",
                    id: "btn-add-row",
                    onclick: move |_| {
                        let row = editor.with_mut(|state| state.grid.add_row());
                        selected_row.set(Some(row));
                    },
                    "+ {add_row_label}"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-insert-row",
                    onclick: move |_| {
                        let at = selected_row.read().unwrap_or(0);
                        let row = editor.with_mut(|state| {
                            state.coordinator.insert_row(&mut state.grid, at)
                        });
                        selected_row.set(Some(row));
                    },
                    "\u{2193} {insert_row_label}"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-delete-row",
                    onclick: move |_| {
                        let selected = *selected_row.read();
                        if let Some(row) = selected {
                            let result = editor.with_mut(|state| {
                                state.coordinator.remove_row(&mut state.grid, row)
                            });
                            match result {
                                Ok(()) => selected_row.set(None),
                                Err(err) => error_message.set(Some(err.to_string())),
                            }
                        }
                    },
                    "\u{2212} {delete_row_label}"
                }
            }
            div { class: "toolbar-separator" }

            // Column group
            div { class: "toolbar-group",
                input {
                    class: "toolbar-input",
                    id: "input-new-column",
                    placeholder: "{new_column_placeholder}",
                    value: "{new_column}",
                    oninput: move |evt| new_column.set(evt.value()),
                }
                select {
                    class: "toolbar-select toolbar-select-sm",
                    id: "select-new-column-kind",
                    value: "{kind_value}",
                    onchange: move |evt| {
                        if let Some(kind) = ValueKind::from_code(&evt.value()) {
                            new_column_kind.set(kind);
                        }
                    },
                    for kind in ValueKind::all().iter().copied() {
                        option { value: "{kind.code()}", "{i18n::tr(current_language, kind.label_key())}" }
                    }
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-add-column",
                    onclick: move |_| {
                        let name = new_column.read().trim().to_string();
                        if name.is_empty() {
                            return;
                        }
                        let kind = *new_column_kind.read();
                        editor.with_mut(|state| state.grid.add_column(name, kind));
                        new_column.set(String::new());
                    },
                    "+ {add_column_label}"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-delete-column",
                    onclick: move |_| {
                        let selected = *selected_column.read();
                        if let Some(column) = selected {
                            let result = editor.with_mut(|state| {
                                state.coordinator.remove_column(&mut state.grid, column)
                            });
                            match result {
                                Ok(_) => selected_column.set(None),
                                Err(err) => error_message.set(Some(err.to_string())),
                            }
                        }
                    },
                    "\u{2212} {delete_column_label}"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-clear",
                    onclick: move |_| {
                        editor.with_mut(|state| {
                            state.coordinator.reset();
                            state.grid.clear();
                        });
                        selected_row.set(None);
                        selected_column.set(None);
                        file_path.set(None);
                    },
                    "{clear_label}"
                }
            }

            // Info area (right-aligned)
            div { class: "toolbar-info",
                if let Some(name) = selected_column_name {
                    span {
                        class: "toolbar-label",
                        id: "label-selected-column",
                        "{selected_column_label}: {name}"
                    }
                }
                if let Some(path) = file_path.read().as_ref() {
                    span { class: "file-path", "{path.display()}" }
                }
                if let Some(err) = error_message.read().as_ref() {
                    span { class: "error-message", "{err}" }
                }
            }
        }
    }
}
