use habits_core::db::open_db_in_memory;
use habits_core::{
    DocumentStore, FieldValue, MemoryDocumentStore, Record, SqliteDocumentStore, StoreError,
};

fn record(name: &str) -> Record {
    let mut record = Record::new();
    record.insert("name".to_string(), FieldValue::String(name.to_string()));
    record
}

fn insert_get_and_list_in_insertion_order(store: &dyn DocumentStore) {
    let first = store.insert("habits", &record("a")).unwrap();
    let second = store.insert("habits", &record("b")).unwrap();
    store.insert("other", &record("c")).unwrap();
    assert_ne!(first, second);

    let loaded = store.get_by_id("habits", &first).unwrap().unwrap();
    assert_eq!(loaded.revision, 1);
    assert_eq!(loaded.record, record("a"));

    let ids: Vec<_> = store
        .list_all("habits")
        .unwrap()
        .into_iter()
        .map(|doc| doc.id)
        .collect();
    assert_eq!(ids, vec![first, second]);
    assert!(store.list_all("missing").unwrap().is_empty());
}

fn replace_bumps_revision_and_detects_conflicts(store: &dyn DocumentStore) {
    let id = store.insert("habits", &record("a")).unwrap();

    assert_eq!(store.replace("habits", &id, &record("b"), Some(1)).unwrap(), 2);
    assert_eq!(store.replace("habits", &id, &record("c"), None).unwrap(), 3);

    let err = store.replace("habits", &id, &record("stale"), Some(2)).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Conflict { expected: 2, actual: 3, .. }
    ));
    let loaded = store.get_by_id("habits", &id).unwrap().unwrap();
    assert_eq!(loaded.record, record("c"));
    assert_eq!(loaded.revision, 3);
}

fn missing_documents_are_not_found(store: &dyn DocumentStore) {
    assert!(store.get_by_id("habits", "nope").unwrap().is_none());
    assert!(store
        .replace("habits", "nope", &record("x"), Some(1))
        .unwrap_err()
        .is_not_found());
    assert!(store.delete("habits", "nope").unwrap_err().is_not_found());
}

fn delete_removes_document(store: &dyn DocumentStore) {
    let id = store.insert("habits", &record("a")).unwrap();
    store.delete("habits", &id).unwrap();

    assert!(store.get_by_id("habits", &id).unwrap().is_none());
    assert!(store.delete("habits", &id).unwrap_err().is_not_found());
}

#[test]
fn memory_store_contract() {
    insert_get_and_list_in_insertion_order(&MemoryDocumentStore::new());
    replace_bumps_revision_and_detects_conflicts(&MemoryDocumentStore::new());
    missing_documents_are_not_found(&MemoryDocumentStore::new());
    delete_removes_document(&MemoryDocumentStore::new());
}

#[test]
fn sqlite_store_contract() {
    let conn = open_db_in_memory().unwrap();
    insert_get_and_list_in_insertion_order(&SqliteDocumentStore::new(&conn));

    let conn = open_db_in_memory().unwrap();
    replace_bumps_revision_and_detects_conflicts(&SqliteDocumentStore::new(&conn));

    let conn = open_db_in_memory().unwrap();
    missing_documents_are_not_found(&SqliteDocumentStore::new(&conn));

    let conn = open_db_in_memory().unwrap();
    delete_removes_document(&SqliteDocumentStore::new(&conn));
}

#[test]
fn sqlite_store_persists_timestamps_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habits.db");
    let mut value = record("Stretch");
    value.insert(
        "dateHabitCompleted".to_string(),
        FieldValue::Array(vec![FieldValue::Timestamp(1_700_000_000_000)]),
    );

    let id = {
        let conn = habits_core::db::open_db(&path).unwrap();
        SqliteDocumentStore::new(&conn).insert("habits", &value).unwrap()
    };

    let conn = habits_core::db::open_db(&path).unwrap();
    let loaded = SqliteDocumentStore::new(&conn)
        .get_by_id("habits", &id)
        .unwrap()
        .unwrap();
    assert_eq!(loaded.record, value);
}

#[test]
fn sqlite_store_rejects_corrupt_body() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO documents (collection, id, revision, body) VALUES ('habits', 'bad', 1, 'not json');",
        [],
    )
    .unwrap();

    let err = SqliteDocumentStore::new(&conn).list_all("habits").unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}
