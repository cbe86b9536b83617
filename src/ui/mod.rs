pub mod actions;
pub mod app;
pub mod table;
pub mod toolbar;

use crate::state::edit_session::EditCoordinator;
use crate::state::grid::Grid;

/// Grid plus its edit coordinator, owned by the app root.
#[derive(Debug, Default)]
pub struct EditorState {
    pub grid: Grid,
    pub coordinator: EditCoordinator,
}
