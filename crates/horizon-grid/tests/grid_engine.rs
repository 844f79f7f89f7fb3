//! End-to-end behaviour of the grid engine against persistence adapters.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use horizon_grid::adapter::{AdapterResult, FetchRequest, GridData, PersistenceAdapter};
use horizon_grid::hooks::HookPair;
use horizon_grid::prelude::*;
use horizon_grid::registry::{CellType, CellTypeRegistry};
use horizon_grid::selection::CellPosition;
use horizon_grid::{ErrorEvent, ErrorKind, Operation};
use parking_lot::Mutex;
use tokio::sync::Notify;

fn columns() -> Vec<Column> {
    vec![
        Column::new("name", "Name").with_width(100.0),
        Column::new("amount", "Amount").with_type("number").with_width(100.0),
        Column::new("region", "Region").with_width(100.0),
    ]
}

fn rows() -> Vec<Row> {
    vec![
        Row::new("1").with_value("name", "Ada").with_value("amount", 5).with_value("region", "EU"),
        Row::new("2").with_value("name", "Grace").with_value("amount", 7).with_value("region", "US"),
        Row::new("3").with_value("name", "Linus").with_value("region", "EU"),
        Row::new("4").with_value("name", "Ken"),
    ]
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn loaded(adapter: Arc<MemoryAdapter>) -> GridEngine {
    init_tracing();
    let engine = GridEngine::builder()
        .shared_adapter(adapter)
        .build()
        .unwrap();
    engine.load().await.unwrap();
    engine
}

fn memory() -> Arc<MemoryAdapter> {
    Arc::new(MemoryAdapter::new(columns(), rows()))
}

fn collect_errors(engine: &GridEngine) -> Arc<Mutex<Vec<ErrorEvent>>> {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    engine
        .events()
        .error
        .connect(move |event| sink.lock().push(event.clone()));
    errors
}

fn amount(engine: &GridEngine, row: &str) -> Option<CellValue> {
    engine.cell_value(&RowId::new(row), &ColumnId::new("amount"))
}

#[tokio::test]
async fn test_failed_write_rolls_back_and_reports_once() {
    let adapter = memory();
    let engine = loaded(adapter.clone()).await;
    let errors = collect_errors(&engine);
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    engine
        .events()
        .cell_changed
        .connect(move |change| sink.lock().push((change.old.clone(), change.new.clone())));

    adapter.fail_on(Operation::UpdateCell);
    let err = engine.update_cell("2", "amount", 200).await.unwrap_err();

    assert!(matches!(err, GridError::Persistence { operation: Operation::UpdateCell, .. }));
    assert_eq!(amount(&engine, "2"), Some(CellValue::from(7)));
    assert_eq!(
        *changes.lock(),
        vec![
            (CellValue::from(7), CellValue::from(200)),
            (CellValue::from(200), CellValue::from(7)),
        ]
    );
    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Persistence);
    assert_eq!(errors[0].operation, Some(Operation::UpdateCell));
    assert!(!engine.can_undo());
}

#[tokio::test]
async fn test_fill_tiles_source_and_undoes_as_one_step() {
    let adapter = memory();
    let engine = loaded(adapter.clone()).await;

    let source = SelectionRange::cells(CellPosition::new(0, 1), CellPosition::new(1, 1));
    let target = SelectionRange::cells(CellPosition::new(0, 1), CellPosition::new(3, 1));
    engine.fill(source, target).await.unwrap();

    let values: Vec<_> = ["1", "2", "3", "4"].iter().map(|r| amount(&engine, r)).collect();
    assert_eq!(
        values,
        [5, 7, 5, 7].map(|n| Some(CellValue::from(n))).to_vec()
    );
    assert_eq!(adapter.call_count(Operation::UpdateCells), 1);
    assert_eq!(engine.selection(), vec![target]);

    engine.undo().await.unwrap();
    assert_eq!(amount(&engine, "3"), Some(CellValue::Null));
    assert_eq!(amount(&engine, "4"), Some(CellValue::Null));
    assert_eq!(adapter.stored_value(&RowId::new("3"), &ColumnId::new("amount")), Some(CellValue::Null));
}

#[tokio::test]
async fn test_column_reorder_stays_in_band() {
    let columns = vec![
        Column::new("a", "A").pinned(),
        Column::new("b", "B").pinned(),
        Column::new("c", "C"),
        Column::new("d", "D"),
        Column::new("e", "E"),
    ];
    let adapter = Arc::new(MemoryAdapter::new(columns, Vec::new()));
    let engine = loaded(adapter.clone()).await;

    assert_eq!(engine.reorder_column(4, 0).await.unwrap(), 2);
    let order: Vec<String> = engine
        .visible_columns()
        .iter()
        .map(|c| c.id.to_string())
        .collect();
    assert_eq!(order, ["a", "b", "e", "c", "d"]);

    assert_eq!(engine.reorder_column(0, 4).await.unwrap(), 1);
    let order: Vec<String> = engine
        .visible_columns()
        .iter()
        .map(|c| c.id.to_string())
        .collect();
    assert_eq!(order, ["b", "a", "e", "c", "d"]);
    assert_eq!(adapter.call_count(Operation::ReorderColumn), 2);

    assert!(matches!(
        engine.reorder_column(9, 0).await,
        Err(GridError::IndexOutOfBounds { index: 9, len: 5 })
    ));
}

#[tokio::test]
async fn test_resize_is_clamped() {
    let engine = loaded(memory()).await;
    assert_eq!(engine.resize_column(ColumnId::new("name"), 10.0).await.unwrap(), 50.0);
    assert_eq!(engine.resize_column(ColumnId::new("name"), 5000.0).await.unwrap(), 2000.0);
    assert_eq!(engine.column(&ColumnId::new("name")).unwrap().width, 2000.0);
}

#[tokio::test]
async fn test_resize_drag_persists_on_release() {
    let adapter = memory();
    let engine = loaded(adapter.clone()).await;
    let resized = Arc::new(Mutex::new(Vec::new()));
    let sink = resized.clone();
    engine
        .events()
        .column_resized
        .connect(move |(column, width)| sink.lock().push((column.to_string(), *width)));

    // The right edge of the first column sits at 60 + 100 in screen space.
    let cursor = engine
        .handle_pointer(PointerEvent::press(158.0, 18.0, 0.0))
        .await
        .unwrap();
    assert_eq!(cursor, Some(horizon_grid::input::CursorHint::ColumnResize));
    engine
        .handle_pointer(PointerEvent::moved(208.0, 18.0, 16.0))
        .await
        .unwrap();
    assert_eq!(adapter.call_count(Operation::ResizeColumn), 0);
    engine
        .handle_pointer(PointerEvent::release(208.0, 18.0, 32.0))
        .await
        .unwrap();

    assert_eq!(engine.column(&ColumnId::new("name")).unwrap().width, 150.0);
    assert_eq!(adapter.call_count(Operation::ResizeColumn), 1);
    assert_eq!(*resized.lock(), vec![("name".to_string(), 150.0)]);
}

#[tokio::test]
async fn test_group_then_ungroup_restores_order() {
    let engine = loaded(memory()).await;
    engine.select_cell(CellPosition::new(0, 0));
    engine.group_by(Some(ColumnId::new("region"))).unwrap();

    assert!(engine.selection().is_empty());
    let headers: Vec<(String, usize)> = engine
        .view_rows()
        .iter()
        .filter_map(|row| row.group().map(|g| (g.key.clone(), g.child_count)))
        .collect();
    assert_eq!(
        headers,
        vec![("(Empty)".to_string(), 1), ("EU".to_string(), 2), ("US".to_string(), 1)]
    );

    engine.group_by(None).unwrap();
    assert_eq!(engine.view_row_ids(), ["1", "2", "3", "4"].map(RowId::new));
}

#[tokio::test]
async fn test_undo_redo_persist_through_adapter() {
    let adapter = memory();
    let engine = loaded(adapter.clone()).await;
    let stored = || adapter.stored_value(&RowId::new("1"), &ColumnId::new("name"));

    engine.update_cell("1", "name", "Ada L.").await.unwrap();
    assert_eq!(stored(), Some(CellValue::from("Ada L.")));
    assert_eq!(engine.history_state().undo_label.as_deref(), Some("Edit cell"));

    assert!(engine.undo().await.unwrap());
    assert_eq!(stored(), Some(CellValue::from("Ada")));
    assert!(engine.can_redo());

    assert!(engine.redo().await.unwrap());
    assert_eq!(stored(), Some(CellValue::from("Ada L.")));
}

#[tokio::test]
async fn test_failed_undo_keeps_command() {
    let adapter = memory();
    let engine = loaded(adapter.clone()).await;
    engine.update_cell("1", "amount", 9).await.unwrap();

    adapter.fail_once(Operation::UpdateCell);
    assert!(engine.undo().await.is_err());
    assert_eq!(amount(&engine, "1"), Some(CellValue::from(9)));
    assert!(engine.can_undo());

    assert!(engine.undo().await.unwrap());
    assert_eq!(amount(&engine, "1"), Some(CellValue::from(5)));
}

#[tokio::test]
async fn test_veto_cancels_without_error_event() {
    let adapter = memory();
    let mut hooks = LifecycleHooks::default();
    hooks.cell = HookPair::new().before(|write: horizon_grid::hooks::CellWrite| {
        (write.value != CellValue::from("forbidden")).then_some(write)
    });
    let engine = GridEngine::builder()
        .shared_adapter(adapter.clone())
        .hooks(hooks)
        .build()
        .unwrap();
    engine.load().await.unwrap();
    let errors = collect_errors(&engine);

    let err = engine.update_cell("1", "name", "forbidden").await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.to_string(), "update_cell was cancelled by a before hook");
    assert!(errors.lock().is_empty());
    assert_eq!(adapter.call_count(Operation::UpdateCell), 0);
    assert_eq!(
        engine.cell_value(&RowId::new("1"), &ColumnId::new("name")),
        Some(CellValue::from("Ada"))
    );
}

#[tokio::test]
async fn test_hook_can_transform_value() {
    let mut hooks = LifecycleHooks::default();
    hooks.cell = HookPair::new().before(|mut write: horizon_grid::hooks::CellWrite| {
        if let CellValue::Text(text) = &write.value {
            write.value = CellValue::Text(text.trim().to_string());
        }
        Some(write)
    });
    let engine = GridEngine::builder()
        .data(columns(), rows())
        .hooks(hooks)
        .build()
        .unwrap();

    engine.update_cell("1", "name", "  Ada  ").await.unwrap();
    assert_eq!(
        engine.cell_value(&RowId::new("1"), &ColumnId::new("name")),
        Some(CellValue::from("Ada"))
    );
}

#[tokio::test]
async fn test_delete_column_refetches_columns() {
    let adapter = memory();
    let engine = loaded(adapter.clone()).await;

    engine.delete_column(ColumnId::new("region")).await.unwrap();
    let ids = |columns: Vec<Column>| columns.into_iter().map(|c| c.id).collect::<Vec<_>>();
    assert_eq!(ids(engine.columns()), ids(adapter.stored_columns()));
    assert_eq!(ids(engine.columns()), [ColumnId::new("name"), ColumnId::new("amount")]);
    assert_eq!(adapter.call_count(Operation::Load), 2);
}

#[tokio::test]
async fn test_failed_column_refetch_is_reported_not_returned() {
    let adapter = memory();
    let engine = loaded(adapter.clone()).await;
    let errors = collect_errors(&engine);

    adapter.fail_on(Operation::Load);
    engine.delete_column(ColumnId::new("region")).await.unwrap();

    assert!(engine.column(&ColumnId::new("region")).is_none());
    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].operation, Some(Operation::Load));
}

#[tokio::test]
async fn test_server_sort_refetches_and_keeps_history() {
    let adapter = Arc::new(MemoryAdapter::new(columns(), rows()).with_server_sort());
    let engine = loaded(adapter.clone()).await;
    engine.update_cell("4", "amount", 1).await.unwrap();

    engine.sort(Some(SortSpec::ascending("amount"))).await.unwrap();
    assert_eq!(engine.row_ids(), adapter.stored_row_ids());
    assert_eq!(engine.view_row_ids(), ["4", "1", "2", "3"].map(RowId::new));
    assert!(engine.can_undo());
    assert_eq!(adapter.call_count(Operation::Load), 2);
}

#[tokio::test]
async fn test_without_adapter_changes_stay_local() {
    let engine = GridEngine::builder()
        .data(columns(), rows())
        .build()
        .unwrap();

    assert!(matches!(engine.load().await, Err(GridError::NoAdapter(Operation::Load))));
    engine.update_cell("1", "amount", 42).await.unwrap();
    assert_eq!(amount(&engine, "1"), Some(CellValue::from(42)));

    let id = engine.add_row(NewRow::new().with_value("name", "Barbara")).await.unwrap();
    assert!(id.is_temporary());
    assert_eq!(engine.row_count(), 5);
}

/// Adapter whose `add_row` waits for the test to release it.
struct GatedAdapter {
    gate: Arc<Notify>,
}

impl PersistenceAdapter for GatedAdapter {
    fn fetch(&self, _request: FetchRequest) -> BoxFuture<'_, AdapterResult<GridData>> {
        futures_util::future::ok(GridData {
            columns: columns(),
            rows: rows(),
        })
        .boxed()
    }

    fn add_row(&self, new_row: NewRow) -> BoxFuture<'_, AdapterResult<Row>> {
        let gate = self.gate.clone();
        async move {
            gate.notified().await;
            let mut row = Row::new("100");
            for (column, value) in new_row.values {
                row.set_value(column, value);
            }
            row.set_value(ColumnId::new("region"), CellValue::from("EU"));
            Ok(row)
        }
        .boxed()
    }
}

#[tokio::test]
async fn test_add_row_swaps_temporary_id_and_rejects_concurrent_add() {
    let gate = Arc::new(Notify::new());
    let engine = GridEngine::builder()
        .adapter(GatedAdapter { gate: gate.clone() })
        .build()
        .unwrap();
    engine.load().await.unwrap();
    let renamed = Arc::new(Mutex::new(Vec::new()));
    let sink = renamed.clone();
    engine
        .events()
        .row_id_changed
        .connect(move |(old, new)| sink.lock().push((old.clone(), new.clone())));

    let first = engine.add_row(NewRow::new().with_value("name", "Barbara"));
    tokio::pin!(first);
    assert!(futures_util::poll!(&mut first).is_pending());

    let temp = engine.row_ids()[4].clone();
    assert!(temp.is_temporary());
    assert!(matches!(
        engine.add_row(NewRow::new()).await,
        Err(GridError::Busy(Operation::AddRow))
    ));

    gate.notify_one();
    let id = first.await.unwrap();
    assert_eq!(id, RowId::new("100"));
    assert_eq!(engine.row_ids()[4], id);
    assert_eq!(
        engine.cell_value(&id, &ColumnId::new("region")),
        Some(CellValue::from("EU"))
    );
    assert_eq!(*renamed.lock(), vec![(temp, id)]);
}

#[tokio::test]
async fn test_failed_add_row_removes_temporary_row() {
    let adapter = memory();
    let engine = loaded(adapter.clone()).await;
    adapter.fail_on(Operation::AddRow);

    assert!(engine.add_row(NewRow::new().with_value("name", "x")).await.is_err());
    assert_eq!(engine.row_count(), 4);
    adapter.recover(Operation::AddRow);
    let id = engine.add_row(NewRow::new()).await.unwrap();
    assert!(!id.is_temporary());
}

#[tokio::test]
async fn test_keyboard_navigation_scrolls_into_view() {
    let rows: Vec<Row> = (0..100).map(|i| Row::new(i.to_string()).with_value("name", i)).collect();
    let engine = GridEngine::builder()
        .data(columns(), rows)
        .build()
        .unwrap();
    engine.set_viewport_size(400.0, 36.0 + 32.0 * 5.0);
    engine.select_cell(CellPosition::new(0, 0));

    for _ in 0..6 {
        engine.handle_key(KeyEvent::new(Key::ArrowDown)).await.unwrap();
    }
    assert_eq!(engine.primary_cell(), Some(CellPosition::new(6, 0)));
    assert_eq!(engine.scroll_position().1, 32.0 * 2.0);
}

struct Currency;

impl CellType for Currency {
    fn format(&self, value: &CellValue) -> String {
        format!("${value}")
    }
}

fn with_currency() -> CellTypeRegistry {
    let mut registry = CellTypeRegistry::with_defaults();
    registry.register("currency", Currency);
    registry
}

fn to_currency() -> ColumnUpdate {
    ColumnUpdate {
        column_type: Some("currency".into()),
        ..ColumnUpdate::default()
    }
}

#[tokio::test]
async fn test_type_change_reformats_cached_cells() {
    init_tracing();
    let engine = GridEngine::builder()
        .registry(with_currency())
        .data(columns(), rows())
        .build()
        .unwrap();
    let (row, column) = (RowId::new("1"), ColumnId::new("amount"));
    assert_eq!(engine.formatted_cell(&row, &column).as_deref(), Some("5"));

    engine.update_column(column.clone(), to_currency()).await.unwrap();
    assert_eq!(engine.formatted_cell(&row, &column).as_deref(), Some("$5"));
}

#[tokio::test]
async fn test_reverted_type_change_restores_formatting() {
    init_tracing();
    let adapter = memory();
    let engine = GridEngine::builder()
        .registry(with_currency())
        .shared_adapter(adapter.clone())
        .build()
        .unwrap();
    engine.load().await.unwrap();
    let (row, column) = (RowId::new("2"), ColumnId::new("amount"));
    assert_eq!(engine.formatted_cell(&row, &column).as_deref(), Some("7"));

    adapter.fail_on(Operation::UpdateColumn);
    assert!(engine.update_column(column.clone(), to_currency()).await.is_err());
    assert_eq!(engine.formatted_cell(&row, &column).as_deref(), Some("7"));
}
