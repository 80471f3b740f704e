//! Integration Tests for Cache Backends
//!
//! Exercises the full cache contract across backends, including concurrent
//! access to a shared cache directory.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::thread::sleep;
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::TempDir;

use apicache::{Cache, FileCache, MemoryCache};

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apicache=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

fn data_file_count(dir: &std::path::Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_file() && !p.extension().is_some_and(|ext| ext == "lock"))
        .count()
}

/// Runs the backend-independent contract checks against any cache.
fn assert_contract(cache: &dyn Cache) {
    // Round-trip
    let payload = json!({"user": {"id": 1}, "items": ["a", "b"]});
    cache.store("contract", payload.clone()).unwrap();
    assert_eq!(cache.get("contract", None).unwrap(), Some(payload));

    // Miss is Ok(None)
    assert_eq!(cache.get("never_stored", None).unwrap(), None);

    // Overwrite
    cache.store("contract", json!("second")).unwrap();
    assert_eq!(cache.get("contract", None).unwrap(), Some(json!("second")));

    // Flush drops fresh entries too
    cache.flush().unwrap();
    assert_eq!(cache.get("contract", None).unwrap(), None);
}

// == Contract Tests ==

#[test]
fn test_contract_memory_backend() {
    init_tracing();
    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new(300));
    assert_contract(cache.as_ref());
}

#[test]
fn test_contract_file_backend() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let cache: Arc<dyn Cache> = Arc::new(FileCache::new(dir.path(), 300).unwrap());
    assert_contract(cache.as_ref());
}

// == Expiry Scenarios ==

// store("a", "v1") with a 1-second timeout; a read after expiry misses and
// physically removes the entry's files.
#[test]
fn test_expired_entry_read_removes_files() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path(), 1).unwrap();

    cache.store("a", json!("v1")).unwrap();
    assert_eq!(cache.get("a", None).unwrap(), Some(json!("v1")));

    sleep(Duration::from_secs(2));

    assert_eq!(cache.get("a", None).unwrap(), None);
    assert_eq!(
        fs::read_dir(dir.path()).unwrap().count(),
        0,
        "No files should remain for the expired key"
    );

    // A later sweep has nothing left to discover.
    cache.cleanup().unwrap();
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_flush_beats_unexpired_ttl() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path(), 3600).unwrap();

    cache.store("p", json!({"body": "fresh"})).unwrap();
    cache.flush().unwrap();

    assert_eq!(cache.get("p", None).unwrap(), None);
}

#[test]
fn test_selective_cleanup_keeps_fresh_entries() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path(), 1).unwrap();

    cache.store("stale1", json!(1)).unwrap();
    cache.store("stale2", json!(2)).unwrap();
    sleep(Duration::from_millis(1100));
    cache.store("fresh", json!(3)).unwrap();

    cache.cleanup().unwrap();

    assert_eq!(data_file_count(dir.path()), 1);
    assert_eq!(cache.get("fresh", Some(0)).unwrap(), Some(json!(3)));
}

// == Shared-Directory Scenarios ==

// Two instances sharing one directory, concurrently storing different
// values under one key: a subsequent read returns one of the written
// values, never a mixture.
#[test]
fn test_concurrent_writers_never_corrupt_a_value() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    // Each write is self-describing: `check` must equal writer * 1000 + seq
    // for the payload to be one of the values actually written.
    fn payload(writer: usize, seq: usize) -> Value {
        json!({
            "writer": writer,
            "seq": seq,
            "blob": format!("data-{writer}-{seq}").repeat(64),
            "check": writer * 1000 + seq,
        })
    }

    let seed = FileCache::new(dir.path(), 300).unwrap();
    seed.store("x", payload(0, 0)).unwrap();

    let mut handles = Vec::new();
    for writer in 0..4 {
        let dir_path = dir.path().to_path_buf();
        handles.push(thread::spawn(move || {
            let cache = FileCache::new(&dir_path, 300).unwrap();
            for seq in 0..25 {
                cache.store("x", payload(writer, seq)).unwrap();
                if let Some(value) = cache.get("x", None).unwrap() {
                    let w = value["writer"].as_u64().unwrap() as usize;
                    let s = value["seq"].as_u64().unwrap() as usize;
                    assert_eq!(value, payload(w, s), "Read observed a torn value");
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let value = seed.get("x", None).unwrap().expect("key must survive");
    let w = value["writer"].as_u64().unwrap() as usize;
    let s = value["seq"].as_u64().unwrap() as usize;
    assert_eq!(value, payload(w, s));
    assert_eq!(data_file_count(dir.path()), 1, "Exactly one entry for the key");
}

#[test]
fn test_entries_visible_across_instances() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let writer = FileCache::new(dir.path(), 300).unwrap();
    let reader = FileCache::new(dir.path(), 300).unwrap();

    writer.store("shared", json!({"from": "writer"})).unwrap();
    assert_eq!(
        reader.get("shared", None).unwrap(),
        Some(json!({"from": "writer"}))
    );

    reader.flush().unwrap();
    assert_eq!(writer.get("shared", None).unwrap(), None);
}

// == Error Surface ==

#[test]
fn test_unreadable_entry_is_an_error_not_a_miss() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path(), 300).unwrap();

    cache.store("key1", json!("good")).unwrap();

    // Corrupt the data file behind the cache's back.
    let data_file: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| !p.extension().is_some_and(|ext| ext == "lock"))
        .collect();
    fs::write(&data_file[0], b"not json at all").unwrap();

    assert!(cache.get("key1", None).is_err());
}

// == Restore Semantics ==

#[test]
fn test_memory_cache_restored_from_snapshot_is_usable() {
    init_tracing();
    let cache = MemoryCache::new(300);
    cache.store("k", json!({"deep": {"nested": [true, null]}})).unwrap();

    let snapshot = serde_json::to_string(&cache).unwrap();
    let restored: MemoryCache = serde_json::from_str(&snapshot).unwrap();

    // The restored cache works as a full backend, including new writes
    // that go through its freshly reconstructed lock.
    assert_eq!(
        restored.get("k", None).unwrap(),
        Some(json!({"deep": {"nested": [true, null]}}))
    );
    restored.store("k2", json!(2)).unwrap();
    assert_eq!(restored.get("k2", None).unwrap(), Some(json!(2)));
}

// == Opaque Payload Fidelity ==

#[test]
fn test_nested_payload_roundtrips_with_full_fidelity() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path(), 300).unwrap();

    let payload: Value = json!({
        "statuses": [
            {"id": 123456789012345_i64, "text": "hello", "user": {"name": "a", "verified": false}},
            {"id": 123456789012346_i64, "text": "world", "user": {"name": "b", "verified": true}},
        ],
        "meta": {"next": null, "count": 2},
    });

    cache.store("GET /statuses?count=2", payload.clone()).unwrap();
    assert_eq!(
        cache.get("GET /statuses?count=2", None).unwrap(),
        Some(payload)
    );
}
