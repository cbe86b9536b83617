use dioxus::prelude::*;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::io::import::CancelToken;
use crate::io::table_io;
use crate::state::grid::GridChange;
use crate::state::i18n::Language;
use crate::ui::table::Table;
use crate::ui::toolbar::Toolbar;
use crate::ui::EditorState;

const STYLES: Asset = asset!("/assets/styles.css");

/// Environment variable naming a table snapshot to open at launch.
pub const OPEN_ENV: &str = "TABLEGRID_OPEN";

#[component]
pub fn App() -> Element {
    let mut editor = use_signal(EditorState::default);
    let language = use_signal(Language::from_env);
    let file_path = use_signal::<Option<PathBuf>>(|| None);
    let error_message = use_signal::<Option<String>>(|| None);
    let selected_row = use_signal::<Option<usize>>(|| None);
    let selected_column = use_signal::<Option<usize>>(|| None);
    let import_cancel = use_signal::<Option<CancelToken>>(|| None);
    let save_success = use_signal(|| false);

    // Column indices shift on structure changes, so drop the selection.
    use_hook(move || {
        let mut selected_column = selected_column;
        editor.with_mut(|state| {
            state.grid.subscribe(move |change| {
                debug!(?change, "grid changed");
                if change == GridChange::Structure {
                    selected_column.set(None);
                }
            })
        })
    });

    use_effect({
        let mut file_path = file_path;
        let mut error_message = error_message;
        move || {
            if let Ok(path) = std::env::var(OPEN_ENV) {
                let path = PathBuf::from(path);
                match table_io::load_table(&path) {
                    Ok(table) => {
                        editor.with_mut(|state| {
                            state.coordinator.reset();
                            state.grid.copy_into(Some(&table));
                        });
                        info!(path = %path.display(), "opened table snapshot");
                        file_path.set(Some(path));
                        error_message.set(None);
                    }
                    Err(e) => {
                        error_message.set(Some(e.to_string()));
                    }
                }
            }
        }
    });

    rsx! {
        document::Stylesheet { href: STYLES }
        div { class: "app",
            Toolbar {
                editor,
                language,
                file_path,
                error_message,
                selected_row,
                selected_column,
                import_cancel,
                save_success,
            }
            Table { editor, language, error_message, selected_row, selected_column }
        }
    }
}
