use tablegrid::state::data_model::{CellValue, ImportedTable, ValueKind};
use tablegrid::state::edit_session::{
    ActiveSession, ColumnLayout, DataLossWarning, EditCoordinator, EditError, EditorKind,
    HeaderCommit, HeaderControl,
};
use tablegrid::state::grid::{Grid, GridError, GridOperation};

fn never_asked(_: &DataLossWarning) -> bool {
    panic!("data-loss prompt should not be shown");
}

fn codes_grid() -> Grid {
    let table = ImportedTable::new(
        vec!["code".to_string(), "label".to_string()],
        vec![ValueKind::Text, ValueKind::Text],
        vec![
            vec![CellValue::Text("1".to_string()), CellValue::Text("one".to_string())],
            vec![CellValue::Text("2".to_string()), CellValue::Text("two".to_string())],
            vec![CellValue::Text("abc".to_string()), CellValue::Null],
        ],
    )
    .unwrap();
    Grid::from_table(&table)
}

#[test]
fn test_lossy_retype_asks_and_decline_keeps_column() {
    let mut grid = codes_grid();
    let before = grid.create_model();
    let mut coordinator = EditCoordinator::new();
    let mut warnings = Vec::new();
    let mut decline = |warning: &DataLossWarning| {
        warnings.push(warning.clone());
        false
    };

    assert!(coordinator.begin_header_edit(&mut grid, 1, &mut decline).unwrap());
    let commit = coordinator
        .choose_header_type(&mut grid, ValueKind::Integer, &mut decline)
        .unwrap();

    assert_eq!(commit, HeaderCommit::Declined);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].column, 1);
    assert_eq!(warnings[0].column_name, "code");
    assert_eq!(warnings[0].from, ValueKind::Text);
    assert_eq!(warnings[0].to, ValueKind::Integer);
    assert_eq!(warnings[0].failed_rows, vec![2]);
    assert_eq!(grid.create_model(), before);
    assert_eq!(coordinator.active(), ActiveSession::Idle);
}

#[test]
fn test_lossy_retype_confirmed_converts_what_it_can() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut confirm = |_: &DataLossWarning| true;

    coordinator.begin_header_edit(&mut grid, 1, &mut confirm).unwrap();
    let commit = coordinator
        .choose_header_type(&mut grid, ValueKind::Integer, &mut confirm)
        .unwrap();

    let HeaderCommit::Committed(Some(report)) = commit else {
        panic!("expected a committed retype, got {commit:?}");
    };
    assert_eq!(report.failed_rows(), vec![2]);
    assert_eq!(grid.column_kind(1), Some(ValueKind::Integer));
    assert_eq!(grid.value_at(0, 1), Some(CellValue::Integer(1)));
    assert_eq!(grid.value_at(2, 1), Some(CellValue::Text("abc".to_string())));
}

#[test]
fn test_lossless_retype_and_rename_skip_prompt() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    coordinator.begin_header_edit(&mut grid, 2, &mut prompt).unwrap();
    coordinator
        .header_session_mut()
        .unwrap()
        .set_name("caption");
    let commit = coordinator
        .choose_header_type(&mut grid, ValueKind::Object, &mut prompt)
        .unwrap();

    assert!(matches!(commit, HeaderCommit::Committed(Some(report)) if report.is_lossless()));
    assert_eq!(grid.column_name(2), Some("caption"));
    assert_eq!(grid.column_kind(2), Some(ValueKind::Object));
}

#[test]
fn test_rename_only_commit_has_no_report() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    coordinator.begin_header_edit(&mut grid, 1, &mut prompt).unwrap();
    coordinator.header_session_mut().unwrap().set_name("id");
    let commit = coordinator.stop_header_edit(&mut grid, &mut prompt).unwrap();

    assert_eq!(commit, HeaderCommit::Committed(None));
    assert_eq!(grid.column_name(1), Some("id"));
    assert_eq!(grid.column_kind(1), Some(ValueKind::Text));
}

#[test]
fn test_cancel_header_edit_leaves_grid_untouched() {
    let mut grid = codes_grid();
    let before = grid.create_model();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    coordinator.begin_header_edit(&mut grid, 1, &mut prompt).unwrap();
    coordinator.header_session_mut().unwrap().set_name("zzz");
    assert!(coordinator.cancel_header_edit());
    assert!(!coordinator.cancel_header_edit());

    assert_eq!(grid.create_model(), before);
    assert_eq!(
        coordinator.stop_header_edit(&mut grid, &mut prompt).unwrap(),
        HeaderCommit::NotEditing
    );
}

#[test]
fn test_header_edit_refused_on_row_number_and_locked_columns() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    assert!(!coordinator.reordering_allowed());
    assert!(!coordinator.begin_header_edit(&mut grid, 0, &mut prompt).unwrap());
    assert!(!coordinator.begin_header_edit(&mut grid, 9, &mut prompt).unwrap());

    coordinator.set_header_editable(2, false);
    assert!(!coordinator.is_header_editable(2));
    assert!(!coordinator.begin_header_edit(&mut grid, 2, &mut prompt).unwrap());
    coordinator.set_header_editable(2, true);
    assert!(coordinator.begin_header_edit(&mut grid, 2, &mut prompt).unwrap());
}

#[test]
fn test_switching_header_commits_previous() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    coordinator.begin_header_edit(&mut grid, 1, &mut prompt).unwrap();
    coordinator.header_session_mut().unwrap().set_name("first");
    assert!(coordinator.begin_header_edit(&mut grid, 2, &mut prompt).unwrap());

    assert_eq!(grid.column_name(1), Some("first"));
    assert_eq!(coordinator.active(), ActiveSession::Header(2));
}

#[test]
fn test_declined_commit_blocks_new_header_session() {
    let mut grid = codes_grid();
    let before = grid.create_model();
    let mut coordinator = EditCoordinator::new();
    let mut decline = |_: &DataLossWarning| false;

    coordinator.begin_header_edit(&mut grid, 1, &mut decline).unwrap();
    coordinator.open_type_popup();
    assert!(coordinator.header_session().unwrap().is_type_popup_open());
    coordinator
        .header_session_mut()
        .unwrap()
        .set_kind(ValueKind::Integer);

    let activation = coordinator
        .header_click(&mut grid, &ColumnLayout::uniform(3, 50.0), 110.0, false, &mut decline)
        .unwrap();

    assert!(activation.is_none());
    assert_eq!(coordinator.active(), ActiveSession::Idle);
    assert_eq!(grid.create_model(), before);
}

#[test]
fn test_header_click_opens_editor_and_routes_click() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;
    let layout = ColumnLayout::new(vec![40.0, 100.0, 100.0]);

    let activation = coordinator
        .header_click(&mut grid, &layout, 45.0, false, &mut prompt)
        .unwrap()
        .unwrap();
    assert_eq!(activation.column, 1);
    assert_eq!(activation.control, HeaderControl::Name);
    assert_eq!(activation.local_x, 5.0);
    coordinator.forward_click(&activation);
    assert!(!coordinator.header_session().unwrap().is_type_popup_open());

    let activation = coordinator
        .header_click(&mut grid, &layout, 235.0, false, &mut prompt)
        .unwrap()
        .unwrap();
    assert_eq!(activation.column, 2);
    assert_eq!(activation.control, HeaderControl::TypeChooser);
    coordinator.forward_click(&activation);
    assert!(coordinator.header_session().unwrap().is_type_popup_open());
}

#[test]
fn test_header_click_ignored_while_resizing_or_on_row_numbers() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;
    let layout = ColumnLayout::new(vec![40.0, 100.0, 100.0]);

    assert_eq!(
        coordinator
            .header_click(&mut grid, &layout, 60.0, true, &mut prompt)
            .unwrap(),
        None
    );
    assert_eq!(
        coordinator
            .header_click(&mut grid, &layout, 10.0, false, &mut prompt)
            .unwrap(),
        None
    );
    assert_eq!(
        coordinator
            .header_click(&mut grid, &layout, 500.0, false, &mut prompt)
            .unwrap(),
        None
    );
    assert_eq!(coordinator.active(), ActiveSession::Idle);
}

#[test]
fn test_cell_edit_parses_draft_with_column_kind() {
    let mut grid = Grid::new();
    grid.add_column("amount", ValueKind::Decimal);
    grid.add_column("when", ValueKind::SqlDate);
    grid.add_row();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    assert!(coordinator.begin_cell_edit(&mut grid, 0, 1, &mut prompt).unwrap());
    let cell = coordinator.cell_session_mut().unwrap();
    assert_eq!(cell.editor(), EditorKind::Decimal);
    assert_eq!(cell.draft(), "");
    cell.set_draft("12.50");
    assert!(coordinator.stop_cell_edit(&mut grid).unwrap());
    assert_eq!(
        grid.value_at(0, 1),
        Some(CellValue::Decimal("12.50".parse().unwrap()))
    );

    coordinator.begin_cell_edit(&mut grid, 0, 2, &mut prompt).unwrap();
    assert_eq!(coordinator.cell_session().unwrap().editor(), EditorKind::Date);
    coordinator.cell_session_mut().unwrap().set_draft("2024-03-01");
    coordinator.stop_cell_edit(&mut grid).unwrap();
    assert_eq!(
        grid.value_at(0, 2),
        Some(CellValue::SqlDate(
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        ))
    );
}

#[test]
fn test_unparseable_cell_draft_keeps_session_open() {
    let mut grid = Grid::new();
    grid.add_column("n", ValueKind::Integer);
    grid.add_row();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    coordinator.begin_cell_edit(&mut grid, 0, 1, &mut prompt).unwrap();
    coordinator.cell_session_mut().unwrap().set_draft("many");
    let err = coordinator.stop_cell_edit(&mut grid).unwrap_err();

    assert!(matches!(err, EditError::Conversion(_)));
    assert_eq!(coordinator.active(), ActiveSession::Cell { row: 0, column: 1 });
    assert_eq!(grid.value_at(0, 1), Some(CellValue::Null));
    assert!(coordinator.cancel_cell_edit());
    assert_eq!(coordinator.active(), ActiveSession::Idle);
}

#[test]
fn test_cell_edit_rejected_on_row_number_column() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    assert!(!coordinator.begin_cell_edit(&mut grid, 0, 0, &mut prompt).unwrap());
    assert!(!coordinator.begin_cell_edit(&mut grid, 7, 1, &mut prompt).unwrap());
    assert_eq!(coordinator.active(), ActiveSession::Idle);
}

#[test]
fn test_cell_navigation_commits_header_edit() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    coordinator.begin_header_edit(&mut grid, 2, &mut prompt).unwrap();
    coordinator.header_session_mut().unwrap().set_name("caption");
    assert!(coordinator.begin_cell_edit(&mut grid, 1, 1, &mut prompt).unwrap());

    assert_eq!(grid.column_name(2), Some("caption"));
    assert!(coordinator.header_session().is_none());
    assert_eq!(coordinator.active(), ActiveSession::Cell { row: 1, column: 1 });
}

#[test]
fn test_header_edit_commits_open_cell_edit() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    coordinator.begin_cell_edit(&mut grid, 0, 2, &mut prompt).unwrap();
    coordinator.cell_session_mut().unwrap().set_draft("uno");
    coordinator.begin_header_edit(&mut grid, 1, &mut prompt).unwrap();

    assert_eq!(grid.value_at(0, 2), Some(CellValue::Text("uno".to_string())));
    assert!(coordinator.cell_session().is_none());
    assert_eq!(coordinator.active(), ActiveSession::Header(1));
}

#[test]
fn test_remove_column_guards_row_numbers_and_closes_sessions() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    assert_eq!(
        coordinator.remove_column(&mut grid, 0),
        Err(GridError::RowNumberColumn(GridOperation::Remove))
    );
    assert_eq!(grid.user_column_count(), 2);

    coordinator.set_header_editable(2, false);
    coordinator.begin_cell_edit(&mut grid, 0, 1, &mut prompt).unwrap();
    let removed = coordinator.remove_column(&mut grid, 1).unwrap();

    assert_eq!(removed.name, "code");
    assert_eq!(coordinator.active(), ActiveSession::Idle);
    // The locked "label" column shifted into position 1.
    assert!(!coordinator.is_header_editable(1));
}

#[test]
fn test_remove_row_closes_cell_session_below() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    coordinator.begin_cell_edit(&mut grid, 2, 1, &mut prompt).unwrap();
    coordinator.remove_row(&mut grid, 0).unwrap();

    assert_eq!(grid.row_count(), 2);
    assert!(coordinator.cell_session().is_none());
}

#[test]
fn test_insert_row_above_moves_open_cell_session() {
    let table = ImportedTable::new(
        vec!["count".to_string()],
        vec![ValueKind::Integer],
        vec![vec![CellValue::Integer(10)], vec![CellValue::Integer(20)]],
    )
    .unwrap();
    let mut grid = Grid::from_table(&table);
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    coordinator.begin_cell_edit(&mut grid, 1, 1, &mut prompt).unwrap();
    coordinator.cell_session_mut().unwrap().set_draft("x");
    assert!(coordinator.stop_cell_edit(&mut grid).is_err());

    assert_eq!(coordinator.insert_row(&mut grid, 0), 0);
    assert_eq!(coordinator.active(), ActiveSession::Cell { row: 2, column: 1 });

    coordinator.cell_session_mut().unwrap().set_draft("99");
    assert!(coordinator.stop_cell_edit(&mut grid).unwrap());
    assert_eq!(grid.value_at(0, 1), Some(CellValue::Null));
    assert_eq!(grid.value_at(1, 1), Some(CellValue::Integer(10)));
    assert_eq!(grid.value_at(2, 1), Some(CellValue::Integer(99)));
}

#[test]
fn test_insert_row_below_leaves_cell_session() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    coordinator.begin_cell_edit(&mut grid, 0, 2, &mut prompt).unwrap();
    coordinator.insert_row(&mut grid, 1);

    assert_eq!(grid.row_count(), 4);
    assert_eq!(coordinator.active(), ActiveSession::Cell { row: 0, column: 2 });
}

#[test]
fn test_reset_drops_sessions_and_header_locks() {
    let mut grid = codes_grid();
    let mut coordinator = EditCoordinator::new();
    let mut prompt = never_asked;

    coordinator.set_header_editable(2, false);
    coordinator.begin_cell_edit(&mut grid, 0, 1, &mut prompt).unwrap();
    coordinator.reset();
    grid.copy_into(None);

    assert_eq!(coordinator.active(), ActiveSession::Idle);
    assert!(coordinator.is_header_editable(2));
}
