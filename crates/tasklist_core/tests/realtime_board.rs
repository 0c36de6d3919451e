use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tasklist_core::db::migrations::latest_version;
use tasklist_core::db::open_db;
use tasklist_core::{
    AppConfig, DetailView, PushSource, RealtimeTaskStore, SyncError, SyncMode, Task, TaskBoard,
    TaskDraft, TaskId, TaskState, TaskStore, ValidationError,
};

fn push_board() -> (Arc<RealtimeTaskStore>, TaskBoard) {
    let store = Arc::new(RealtimeTaskStore::open_in_memory("toDos").unwrap());
    let board = TaskBoard::with_push(Arc::clone(&store), Duration::from_millis(10)).unwrap();
    (store, board)
}

#[test]
fn subscribe_delivers_current_snapshot_immediately() {
    let store = RealtimeTaskStore::open_in_memory("toDos").unwrap();
    store.insert(&TaskDraft::new("Ann", "first task")).unwrap();

    let seen = Arc::new(Mutex::new(Vec::<usize>::new()));
    let sink = Arc::clone(&seen);
    let subscription = store
        .subscribe(Arc::new(move |snapshot: &[Task]| {
            sink.lock().unwrap().push(snapshot.len());
        }))
        .unwrap();

    store.insert(&TaskDraft::new("Bob", "second task")).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);

    drop(subscription);
    store.insert(&TaskDraft::new("Eve", "third task")).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn create_streams_into_cache_without_reload() {
    let (_store, board) = push_board();
    assert_eq!(board.mode(), SyncMode::Push);

    let id = board.create("Ann", "buy milk").unwrap();

    let task = board.cache().get(&id).expect("snapshot should carry new task");
    assert_eq!(task.user_name, "Ann");
    assert_eq!(task.state(), TaskState::Active);
}

#[test]
fn create_rejects_invalid_owner_before_text() {
    let (store, board) = push_board();

    let err = board.create("", "x").unwrap_err();
    assert!(matches!(err, SyncError::Validation(ValidationError::Required(_))));
    assert!(store.snapshot().unwrap().is_empty());
}

#[test]
fn mutations_overwrite_whole_child_from_cache() {
    let (store, board) = push_board();
    let id = board.create("Ann", "buy milk").unwrap();

    board.rename_owner(&id, "Анна").unwrap();
    board.edit_text(&id, "buy oat milk").unwrap();
    board.toggle_completed(&id).unwrap();

    let stored = store.fetch(&id).unwrap().unwrap();
    assert_eq!(stored.user_name, "Анна");
    assert_eq!(stored.text, "buy oat milk");
    assert!(stored.completed);
    assert_eq!(board.cache().get(&id), Some(stored));
}

#[test]
fn toggle_twice_is_identity() {
    let (_store, board) = push_board();
    let id = board.create("Ann", "water plants").unwrap();

    board.toggle_completed(&id).unwrap();
    board.toggle_completed(&id).unwrap();

    assert_eq!(board.cache().get(&id).unwrap().state(), TaskState::Active);
}

#[test]
fn delete_resolves_detail_to_not_found() {
    let (store, board) = push_board();
    let id = board.create("Ann", "buy milk").unwrap();

    board.delete(&id).unwrap();

    assert_eq!(board.detail(&id), DetailView::NotFound);
    assert!(store.fetch(&id).unwrap().is_none());
    assert!(matches!(board.delete(&id), Err(SyncError::NotFound(_))));
}

#[test]
fn missing_id_is_not_found_and_writes_nothing() {
    let (store, board) = push_board();
    let writes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&writes);
    let _watch = store
        .subscribe(Arc::new(move |_: &[Task]| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

    let err = board.toggle_completed(&TaskId::new("ghost")).unwrap_err();

    assert!(matches!(err, SyncError::NotFound(_)));
    assert_eq!(writes.load(Ordering::SeqCst), 1, "only the initial snapshot");
    assert!(store.snapshot().unwrap().is_empty());
}

#[test]
fn external_writes_reach_the_board() {
    let (store, board) = push_board();

    store
        .set_raw("legacy", &json!({"userName": "Ann", "toDo": "imported task"}))
        .unwrap();
    store.set_raw("broken", &json!(["not", "a", "task"])).unwrap();

    let rows = board.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id.as_str(), "legacy");
    assert_eq!(rows[0].text, "imported task");
}

#[test]
fn search_filters_locally_after_short_window() {
    let (_store, mut board) = push_board();
    board.create("Ann", "buy milk").unwrap();
    board.create("Bob", "walk the dog").unwrap();
    let start = Instant::now();

    board.search_input("milk", start);
    assert_eq!(board.pending_query(), Some("milk"));
    assert!(board.tick(start + Duration::from_millis(10)).unwrap());

    let rows = board.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text, "buy milk");

    board.set_query("").unwrap();
    assert_eq!(board.rows().len(), 2);
}

#[test]
fn file_backed_tree_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");

    let id = {
        let store = RealtimeTaskStore::open(&path, "toDos").unwrap();
        store.insert(&TaskDraft::new("Ann", "persist me")).unwrap()
    };

    let conn = open_db(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
    drop(conn);

    let config = AppConfig::from_json_str(&format!(
        r#"{{"backend": {{"kind": "realtime", "db_path": {}}}}}"#,
        serde_json::to_string(&path).unwrap()
    ))
    .unwrap();
    let board = TaskBoard::open(&config).unwrap();
    assert_eq!(board.backend_id(), "realtime");
    assert!(board.detail(&id).is_found());
}

#[test]
fn slow_listener_cannot_reorder_snapshots() {
    let store = Arc::new(RealtimeTaskStore::open_in_memory("toDos").unwrap());
    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let entered_tx = Mutex::new(entered_tx);
    let _slow = store
        .subscribe(Arc::new(move |snapshot: &[Task]| {
            if snapshot.len() == 1 {
                let _ = entered_tx.lock().unwrap().send(());
                thread::sleep(Duration::from_millis(200));
            }
        }))
        .unwrap();
    let board = TaskBoard::with_push(Arc::clone(&store), Duration::from_millis(10)).unwrap();

    let first_store = Arc::clone(&store);
    let first = thread::spawn(move || {
        first_store.insert(&TaskDraft::new("Ann", "first task")).unwrap();
    });
    entered_rx.recv().unwrap();
    let second_store = Arc::clone(&store);
    let second = thread::spawn(move || {
        second_store.insert(&TaskDraft::new("Bob", "second task")).unwrap();
    });
    first.join().unwrap();
    second.join().unwrap();

    assert_eq!(store.snapshot().unwrap().len(), 2);
    assert_eq!(board.cache().len(), 2);
}
