//! Mutual exclusion, crash reclaim and bounded waiting

use crate::prelude::*;
use jl_core::LockOwner;
use jl_storage::{ExclusiveOpen, MarkerKind, Symlink};
use std::thread;
use std::time::Duration;

fn leave_marker(store: &Store, strategy: LockStrategy) {
    let marker = store.path().with_file_name("journal.log.lock");
    let payload = LockOwner::current().to_marker().unwrap();
    let created = match strategy {
        LockStrategy::Symlink => Symlink::create(&marker, &payload).unwrap(),
        LockStrategy::Open => ExclusiveOpen::create(&marker, &payload).unwrap(),
    };
    assert!(created);
}

#[test]
fn concurrent_appenders_lose_nothing() {
    for strategy in STRATEGIES {
        let store = Store::new();
        store.handle(strategy);

        let sizes = [1u64, 2, 3, 4, 5, 6];
        thread::scope(|scope| {
            for (writer, size) in sizes.iter().enumerate() {
                let journal = store.handle(strategy);
                scope.spawn(move || {
                    for batch in 0..5u64 {
                        let logs: Vec<_> = (0..*size)
                            .map(|i| {
                                LogRecord::new()
                                    .with("writer", writer as u64)
                                    .with("batch", batch)
                                    .with("i", i)
                            })
                            .collect();
                        journal.append_logs(&logs).unwrap();
                    }
                });
            }
        });

        let journal = store.handle(strategy);
        let logs = journal.read_logs(0).unwrap();
        assert_eq!(logs.len() as u64, sizes.iter().sum::<u64>() * 5);
        assert_eq!(journal.committed().unwrap().records, logs.len() as u64);

        let mut keys: Vec<_> = logs
            .iter()
            .map(|r| (field(r, "writer"), field(r, "batch"), field(r, "i")))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), logs.len(), "duplicated records");
    }
}

#[test]
fn crashed_holder_is_reclaimed_after_threshold() {
    for strategy in STRATEGIES {
        let store = Store::new();
        store.handle(strategy);
        leave_marker(&store, strategy);

        let config = Store::lock_config(strategy)
            .with_stale_threshold(Some(Duration::from_millis(100)))
            .with_acquire_timeout(Duration::from_secs(10));
        let journal = JournalFile::with_lock_config(store.path(), &config).unwrap();

        journal.append_logs(&[create(1)]).unwrap();
        assert_eq!(journal.read_logs(0).unwrap().len(), 1);
    }
}

#[test]
fn held_lock_reports_retryable_timeout() {
    for strategy in STRATEGIES {
        let store = Store::new();
        store.handle(strategy);
        leave_marker(&store, strategy);

        let config = Store::lock_config(strategy)
            .with_stale_threshold(None)
            .with_acquire_timeout(Duration::from_millis(150));
        let journal = JournalFile::with_lock_config(store.path(), &config).unwrap();

        let err = journal.append_logs(&[create(1)]).unwrap_err();
        assert!(matches!(err, JournalError::LockTimeout { .. }), "{err}");
        assert!(err.is_retryable());

        // Nothing was written while waiting
        assert!(journal.read_logs(0).unwrap().is_empty());
    }
}

#[test]
fn readers_do_not_need_the_lock() {
    let store = Store::new();
    let journal = store.handle(LockStrategy::Symlink);
    journal.append_logs(&[create(1), create(2)]).unwrap();
    leave_marker(&store, LockStrategy::Symlink);

    assert_eq!(store.handle(LockStrategy::Symlink).read_logs(0).unwrap().len(), 2);
}
