use std::sync::Arc;

use tkvs::{Session, StorageApi, Transaction};

mod common;

use common::{seeded_store, setup_tkvs, BACKENDS};

#[test]
fn test_inner_rollback_outer_commit() {
    for backend in BACKENDS {
        let tkvs = setup_tkvs(backend);
        let mut session = tkvs.session();

        session.begin();
        session.set("k", "a");
        session.begin();
        session.set("k", "b");
        assert_eq!(session.get("k").as_deref(), Some("b"));
        assert!(session.rollback());
        assert_eq!(session.get("k").as_deref(), Some("a"));
        assert!(session.commit());

        assert_eq!(tkvs.store().get("k").as_deref(), Some("a"));
    }
}

#[test]
fn test_inner_commit_outer_rollback() {
    for backend in BACKENDS {
        let store = seeded_store(backend, &[("k", "base")]);
        let mut session = Session::new(Arc::clone(&store));

        session.begin();
        session.begin();
        session.set("k", "inner");
        session.set("n", "new");
        assert!(session.commit());

        // Merged into the outer transaction only
        assert_eq!(session.get("k").as_deref(), Some("inner"));
        assert_eq!(store.get("k").as_deref(), Some("base"));

        assert!(session.rollback());
        assert_eq!(session.get("k").as_deref(), Some("base"));
        assert_eq!(store.get("n"), None);
        assert_eq!(store.len(), 1);
    }
}

#[test]
fn test_inner_level_sees_outer_writes() {
    let store = seeded_store(tkvs::Backend::Concurrent, &[("a", "1")]);
    let mut session = Session::new(Arc::clone(&store));

    session.begin();
    session.set("b", "2");
    session.begin();
    assert_eq!(session.get("a").as_deref(), Some("1"));
    assert_eq!(session.get("b").as_deref(), Some("2"));
    assert_eq!(session.count(None), 2);

    session.delete("b");
    assert_eq!(session.get("b"), None);
    assert_eq!(session.count(None), 1);

    assert!(session.commit());
    assert_eq!(session.get("b"), None);
    assert!(session.commit());
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("b"), None);
}

#[test]
fn test_reinsert_over_outer_delete() {
    for backend in BACKENDS {
        let store = seeded_store(backend, &[("a", "1")]);
        let mut session = Session::new(Arc::clone(&store));

        session.begin();
        session.delete("a");
        session.begin();
        assert_eq!(session.get("a"), None);
        session.set("a", "2");
        assert_eq!(session.count(None), 1);
        assert!(session.commit());

        assert_eq!(session.get("a").as_deref(), Some("2"));
        assert_eq!(session.count(None), 1);
        assert!(session.commit());

        assert_eq!(store.get("a").as_deref(), Some("2"));
        assert_eq!(store.len(), 1);
    }
}

#[test]
fn test_inner_clear_merges_into_outer() {
    for backend in BACKENDS {
        let store = seeded_store(backend, &[("a", "1"), ("b", "2")]);
        let mut session = Session::new(Arc::clone(&store));

        session.begin();
        session.set("c", "3");
        session.begin();
        session.clear();
        session.set("d", "4");
        assert!(session.commit());

        // The outer level now sees only what the inner level left
        assert_eq!(session.count(None), 1);
        assert_eq!(session.get("c"), None);
        assert_eq!(store.len(), 2);

        assert!(session.commit());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("d").as_deref(), Some("4"));
    }
}

#[test]
fn test_count_across_levels() {
    for backend in BACKENDS {
        let store = seeded_store(backend, &[("a", "1"), ("b", "1"), ("c", "2")]);
        let mut session = Session::new(Arc::clone(&store));

        session.begin();
        session.set("d", "1");
        session.delete("a");
        session.begin();
        session.set("c", "1");

        assert_eq!(session.count(None), 3);
        assert_eq!(session.count(Some("1")), 3);
        assert_eq!(session.count(Some("2")), 0);

        assert!(session.rollback());
        assert_eq!(session.count(Some("1")), 2);
        assert_eq!(session.count(Some("2")), 1);
    }
}

#[test]
fn test_close_pops_one_level_at_a_time() {
    let tkvs = setup_tkvs(tkvs::Backend::Synchronized);
    let mut session = tkvs.session();

    session.begin();
    session.begin();
    assert_eq!(session.depth(), 2);
    assert!(session.rollback());
    assert!(session.commit());
    assert!(!session.rollback());
    assert!(!session.commit());
    assert_eq!(session.depth(), 0);
}

#[test]
fn test_deep_nesting_commits_every_level() {
    for backend in BACKENDS {
        let tkvs = setup_tkvs(backend);
        let mut session = tkvs.session();

        for i in 0..100 {
            session.begin();
            session.set(&format!("key{i}"), &(i % 2).to_string());
        }
        assert_eq!(session.depth(), 100);
        assert_eq!(session.count(None), 100);
        assert_eq!(session.count(Some("0")), 50);
        assert!(tkvs.store().is_empty());

        while session.commit() {}

        assert_eq!(tkvs.store().len(), 100);
        assert_eq!(tkvs.store().get("key99").as_deref(), Some("1"));
    }
}

#[test]
fn test_deep_nesting_rollback_leaves_store_untouched() {
    let store = seeded_store(tkvs::Backend::Concurrent, &[("k", "v")]);
    let mut session = Session::new(Arc::clone(&store));

    for _ in 0..1_000 {
        session.begin();
    }
    session.set("k", "deep");
    assert_eq!(session.get("k").as_deref(), Some("deep"));

    let mut closed = 0;
    while session.rollback() {
        closed += 1;
    }
    assert_eq!(closed, 1_000);
    assert_eq!(store.get("k").as_deref(), Some("v"));
}

#[test]
fn test_dropping_a_very_deep_chain() {
    const DEPTH: usize = 500_000;

    let store = seeded_store(tkvs::Backend::Synchronized, &[("k", "v")]);
    let mut txn = Transaction::root(Arc::clone(&store));
    for _ in 0..DEPTH {
        txn = txn.begin();
    }
    assert_eq!(txn.depth(), DEPTH);
    assert_eq!(txn.get("k").as_deref(), Some("v"));

    drop(txn);
    assert_eq!(store.get("k").as_deref(), Some("v"));
}

#[test]
fn test_dropping_a_session_with_open_transactions() {
    const DEPTH: usize = 500_000;

    let store = seeded_store(tkvs::Backend::Concurrent, &[("k", "v")]);
    let mut session = Session::new(Arc::clone(&store));
    for _ in 0..DEPTH {
        session.begin();
    }
    session.set("k", "deep");
    assert_eq!(session.depth(), DEPTH);

    drop(session);
    assert_eq!(store.get("k").as_deref(), Some("v"));
}

#[test]
fn test_closing_levels_of_a_deep_stack() {
    const DEPTH: usize = 200_000;

    let store = seeded_store(tkvs::Backend::Synchronized, &[]);
    let mut session = Session::new(Arc::clone(&store));
    session.begin();
    session.set("k", "v");
    for _ in 1..DEPTH {
        session.begin();
    }
    assert_eq!(session.depth(), DEPTH);

    for _ in 0..DEPTH / 2 {
        assert!(session.rollback());
    }
    assert_eq!(session.depth(), DEPTH / 2);
    assert_eq!(session.get("k").as_deref(), Some("v"));
    assert!(store.is_empty());

    while session.commit() {}
    assert_eq!(session.depth(), 0);
    assert_eq!(store.get("k").as_deref(), Some("v"));
}

#[test]
fn test_transaction_frames_directly() {
    let store = seeded_store(tkvs::Backend::Synchronized, &[("a", "1")]);

    let txn = Transaction::root(Arc::clone(&store)).begin();
    let mut txn = txn.begin();
    assert_eq!(txn.put("a".to_string(), "2".to_string()).as_deref(), Some("1"));
    assert_eq!(txn.remove("a").as_deref(), Some("2"));
    assert!(!txn.contains_key("a"));
    assert!(txn.is_empty());

    let txn = txn.close(true);
    assert_eq!(txn.depth(), 1);
    assert!(!txn.contains_key("a"));
    assert!(txn.keys().is_empty());

    let txn = txn.close(true);
    assert!(txn.is_root());
    assert!(store.is_empty());

    // Closing a root frame is a no-op
    let txn = txn.close(true);
    assert!(txn.is_root());
}
