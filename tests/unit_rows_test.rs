use almacen_relay::client::RowCache;
use serde_json::json;

#[test]
fn test_load_replaces_contents_and_keeps_order() {
    let mut cache = RowCache::new();
    cache.load(vec![
        json!({"id": "u1", "name": "Ana"}),
        json!({"id": "u2", "name": "Blas"}),
    ]);

    assert_eq!(cache.len(), 2);
    let ids: Vec<_> = cache
        .rows()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["u1", "u2"]);

    cache.load(vec![json!({"id": "u3"})]);
    assert_eq!(cache.len(), 1);
    assert!(cache.get("u1").is_none());
}

#[test]
fn test_merge_replaces_the_matching_row() {
    let mut cache = RowCache::new();
    cache.load(vec![
        json!({"id": "u1", "estado": true}),
        json!({"id": "u2", "estado": true}),
    ]);

    assert!(cache.merge(&json!({"id": "u2", "estado": false})));
    assert_eq!(cache.get("u2").unwrap()["estado"], json!(false));
    // The other row is untouched.
    assert_eq!(cache.get("u1").unwrap()["estado"], json!(true));
}

#[test]
fn test_merge_is_idempotent() {
    let mut cache = RowCache::new();
    let record = json!({"id": "u1", "estado": false});

    assert!(cache.merge(&record));
    assert!(cache.merge(&record));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("u1").unwrap(), &record);
}

#[test]
fn test_merge_appends_unknown_ids_and_accepts_numeric_ids() {
    let mut cache = RowCache::new();
    assert!(cache.merge(&json!({"id": 7, "nombre": "tornillos"})));
    assert_eq!(cache.get("7").unwrap()["nombre"], json!("tornillos"));
}

#[test]
fn test_merge_without_id_is_rejected() {
    let mut cache = RowCache::new();
    assert!(!cache.merge(&json!({"nombre": "sin id"})));
    assert!(cache.is_empty());
}

#[test]
fn test_rows_without_id_are_skipped_on_load() {
    let mut cache = RowCache::new();
    cache.load(vec![json!({"id": "u1"}), json!({"nombre": "anon"})]);
    assert_eq!(cache.len(), 1);
}
