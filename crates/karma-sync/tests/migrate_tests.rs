use std::sync::Arc;

use parking_lot::Mutex;

use karma_store::{KarmaLedger, MemoryStore, PropertyStore, Scope};
use karma_sync::{Migration, MigrationEvent};

fn seed_legacy(store: &MemoryStore, raw: &str, total: i64, up: i64, down: i64) {
    store.seed(
        "net",
        &format!("perl.DazKarma.karma_{raw}"),
        &total.to_string(),
    );
    store.seed(
        "net",
        &format!("perl.DazKarma.upkarma_{raw}"),
        &up.to_string(),
    );
    store.seed(
        "net",
        &format!("perl.DazKarma.downkarma_{raw}"),
        &down.to_string(),
    );
}

#[tokio::test]
async fn repairs_drifted_counters_and_writes_the_canonical_record() {
    let store = Arc::new(MemoryStore::new());
    // total=5, up=3, down=1 (stored positive): sum is 2, three votes lost.
    seed_legacy(&store, "Foo", 5, 3, 1);

    let report = Migration::new(Arc::clone(&store), "net").run().await.unwrap();
    assert_eq!(report.keys, 1);
    assert_eq!(report.terms, 1);
    assert_eq!(report.stored, 1);
    assert_eq!(report.write_failures, 0);

    let ledger = KarmaLedger::new(Arc::clone(&store));
    let record = ledger.get_karma("net", "foo").await.unwrap().unwrap();
    assert_eq!((record.up, record.down), (7, 1));
    assert_eq!(record.score(), 6);
}

#[tokio::test]
async fn canonical_record_has_the_wire_shape() {
    let store = Arc::new(MemoryStore::new());
    seed_legacy(&store, "foo", 2, 3, 1);

    Migration::new(Arc::clone(&store), "net").run().await.unwrap();

    let value = store
        .get_property("karma.terms.foo", &Scope::network("net"))
        .await
        .unwrap()
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&value).unwrap();
    assert_eq!(json["term"], "foo");
    assert_eq!(json["up"], 3);
    assert_eq!(json["down"], 1);
}

#[tokio::test]
async fn raw_keys_differing_in_case_merge_into_one_term() {
    let store = Arc::new(MemoryStore::new());
    seed_legacy(&store, "Foo", 2, 2, 0);
    seed_legacy(&store, "FOO", 2, 2, 0);

    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&events);
    let report = Migration::new(Arc::clone(&store), "net")
        .on_event(Box::new(move |event| {
            if let MigrationEvent::Deduplicated { term } = event {
                seen.lock().push(term.clone());
            }
        }))
        .run()
        .await
        .unwrap();

    assert_eq!(report.keys, 2);
    assert_eq!(report.terms, 1);
    assert_eq!(events.lock().as_slice(), ["foo"]);

    let ledger = KarmaLedger::new(Arc::clone(&store));
    let record = ledger.get_karma("net", "foo").await.unwrap().unwrap();
    // 2+2 up-votes, no repair needed: totals already match.
    assert_eq!((record.up, record.down), (4, 0));
}

#[tokio::test]
async fn missing_counters_count_as_zero() {
    let store = Arc::new(MemoryStore::new());
    // Only the running total survived; up/down were never written.
    store.seed("net", "perl.DazKarma.karma_ghost", "3");

    Migration::new(Arc::clone(&store), "net").run().await.unwrap();

    let ledger = KarmaLedger::new(Arc::clone(&store));
    let record = ledger.get_karma("net", "ghost").await.unwrap().unwrap();
    assert_eq!((record.up, record.down), (3, 0));
}

#[tokio::test]
async fn whitespace_only_terms_are_discarded() {
    let store = Arc::new(MemoryStore::new());
    seed_legacy(&store, "   ", 4, 4, 0);
    seed_legacy(&store, "keeper", 1, 1, 0);

    let report = Migration::new(Arc::clone(&store), "net").run().await.unwrap();
    assert_eq!(report.keys, 2);
    assert_eq!(report.terms, 1);

    let scope = Scope::network("net");
    let keys = store.property_keys("karma.terms", &scope).await.unwrap();
    assert_eq!(keys, vec!["keeper"]);
}

#[tokio::test]
async fn write_failures_are_counted_but_do_not_abort() {
    let store = Arc::new(MemoryStore::new());
    seed_legacy(&store, "one", 1, 1, 0);
    seed_legacy(&store, "two", 1, 1, 0);

    let failures: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&failures);
    let migration = Migration::new(Arc::clone(&store), "net").on_event(Box::new(move |event| {
        if let MigrationEvent::WriteFailed { term, .. } = event {
            seen.lock().push(term.clone());
        }
    }));

    store.fail_writes(true);
    let report = migration.run().await.unwrap();

    assert_eq!(report.keys, 2);
    assert_eq!(report.terms, 2);
    assert_eq!(report.stored, 0);
    assert_eq!(report.write_failures, 2);
    assert_eq!(failures.lock().len(), 2);
}

#[tokio::test]
async fn key_listing_failure_is_fatal() {
    let store = Arc::new(MemoryStore::new());
    seed_legacy(&store, "foo", 1, 1, 0);

    store.fail_reads(true);
    let result = Migration::new(Arc::clone(&store), "net").run().await;
    assert!(result.is_err());
}

#[tokio::test]
async fn progress_events_cover_every_key_and_term() {
    let store = Arc::new(MemoryStore::new());
    seed_legacy(&store, "a", 1, 1, 0);
    seed_legacy(&store, "b", 1, 1, 0);

    let progress: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&progress);
    Migration::new(Arc::clone(&store), "net")
        .on_event(Box::new(move |event| {
            if let MigrationEvent::KeyProcessed { done, total } = event {
                seen.lock().push((*done, *total));
            }
        }))
        .run()
        .await
        .unwrap();

    assert_eq!(progress.lock().as_slice(), [(1, 2), (2, 2)]);
}
