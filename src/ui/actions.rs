use dioxus::prelude::*;
use rfd::{AsyncMessageDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::fs::File;
use std::path::PathBuf;
use tracing::warn;

use crate::io::import::{
    CancelToken, ChannelSheetChooser, ImportError, ImportOptions, ImportTask,
};
use crate::io::table_io;
use crate::state::edit_session::{DataLossPrompt, DataLossWarning};
use crate::state::i18n::{self, Language};
use crate::ui::EditorState;

/// Confirms lossy retypes with a native yes/no dialog.
pub struct DialogPrompt {
    language: Language,
}

impl DialogPrompt {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl DataLossPrompt for DialogPrompt {
    fn confirm_data_loss(&mut self, warning: &DataLossWarning) -> bool {
        let rows = warning.failed_rows.len().to_string();
        let description = i18n::tr_with(
            self.language,
            "dialog.data_loss_body",
            &[
                ("column", &warning.column_name),
                ("kind", i18n::tr(self.language, warning.to.label_key())),
                ("rows", &rows),
            ],
        );
        MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title(i18n::tr(self.language, "dialog.data_loss_title"))
            .set_description(description)
            .set_buttons(MessageButtons::YesNo)
            .show()
            == MessageDialogResult::Yes
    }
}

/// Offers the sheets one by one; cancelling declines the import.
async fn choose_sheet(language: Language, names: &[String]) -> Option<usize> {
    for (index, name) in names.iter().enumerate() {
        let description = i18n::tr_with(language, "dialog.choose_sheet_body", &[("sheet", name)]);
        let answer = AsyncMessageDialog::new()
            .set_title(i18n::tr(language, "dialog.choose_sheet_title"))
            .set_description(description)
            .set_buttons(MessageButtons::YesNoCancel)
            .show()
            .await;
        match answer {
            MessageDialogResult::Yes => return Some(index),
            MessageDialogResult::No => continue,
            _ => return None,
        }
    }
    None
}

pub async fn import_spreadsheet(
    mut editor: Signal<EditorState>,
    language: Signal<Language>,
    first_row_is_header: Signal<bool>,
    mut error_message: Signal<Option<String>>,
    mut import_cancel: Signal<Option<CancelToken>>,
) {
    let current_language = *language.read();
    let Some(handle) = rfd::AsyncFileDialog::new()
        .add_filter(
            i18n::tr(current_language, "dialog.spreadsheet_filter"),
            &["xlsx", "xlsm", "xlsb", "xls", "ods"],
        )
        .pick_file()
        .await
    else {
        return;
    };

    let file = match File::open(handle.path()) {
        Ok(file) => file,
        Err(err) => {
            error_message.set(Some(err.to_string()));
            return;
        }
    };
    let options = ImportOptions {
        first_row_is_header: *first_row_is_header.read(),
    };
    let task = ImportTask::new(file, options);
    import_cancel.set(Some(task.cancel_token()));

    let (chooser, mut requests) = ChannelSheetChooser::new();
    let handle = match task.spawn(chooser) {
        Ok(handle) => handle,
        Err(err) => {
            import_cancel.set(None);
            error_message.set(Some(err.to_string()));
            return;
        }
    };
    // The worker drops its chooser when it finishes, which ends this loop.
    while let Some(request) = requests.recv().await {
        let choice = choose_sheet(current_language, &request.names).await;
        if request.reply.send(choice).is_err() {
            warn!("import worker stopped before the sheet choice arrived");
        }
    }
    let joined = tokio::task::spawn_blocking(move || handle.join()).await;
    import_cancel.set(None);

    let outcome = match joined {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_)) => {
            error_message.set(Some(i18n::tr(current_language, "error.import_crashed").to_string()));
            return;
        }
        Err(err) => {
            error_message.set(Some(err.to_string()));
            return;
        }
    };
    let completed = outcome.is_completed();
    let mut sink = |message: &str, cause: &ImportError| {
        error_message.set(Some(format!("{message}: {cause}")));
    };
    editor.with_mut(|state| {
        if completed {
            state.coordinator.reset();
        }
        outcome.deliver(&mut state.grid, &mut sink);
    });
    if completed {
        error_message.set(None);
    }
}

pub fn cancel_import(mut import_cancel: Signal<Option<CancelToken>>) {
    if let Some(token) = import_cancel.write().take() {
        token.store(true, std::sync::atomic::Ordering::Relaxed);
    }
}

pub async fn open_snapshot(
    mut editor: Signal<EditorState>,
    language: Signal<Language>,
    mut file_path: Signal<Option<PathBuf>>,
    mut error_message: Signal<Option<String>>,
) {
    let task = rfd::AsyncFileDialog::new()
        .add_filter(i18n::tr(*language.read(), "dialog.table_filter"), &["json"])
        .pick_file()
        .await;

    if let Some(handle) = task {
        let path = handle.path().to_path_buf();
        match table_io::load_table(&path) {
            Ok(table) => {
                editor.with_mut(|state| {
                    state.coordinator.reset();
                    state.grid.copy_into(Some(&table));
                });
                file_path.set(Some(path));
                error_message.set(None);
            }
            Err(e) => {
                error_message.set(Some(e.to_string()));
            }
        }
    }
}

pub async fn save_snapshot(
    editor: Signal<EditorState>,
    language: Signal<Language>,
    mut file_path: Signal<Option<PathBuf>>,
    mut error_message: Signal<Option<String>>,
) -> bool {
    let existing = file_path.read().clone();
    let path = match existing {
        Some(path) => path,
        None => {
            let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter(i18n::tr(*language.read(), "dialog.table_filter"), &["json"])
                .save_file()
                .await
            else {
                return false;
            };
            handle.path().to_path_buf()
        }
    };

    let table = editor.read().grid.create_model();
    if let Err(err) = table_io::save_table(&path, &table) {
        error_message.set(Some(err.to_string()));
        return false;
    }

    file_path.set(Some(path));
    error_message.set(None);
    true
}
