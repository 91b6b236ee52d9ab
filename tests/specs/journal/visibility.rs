//! All-or-nothing batch visibility for lock-free readers

use crate::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const BATCH: u64 = 5;

#[test]
fn readers_never_observe_partial_batches() {
    for strategy in STRATEGIES {
        let store = Store::new();
        store.handle(strategy);
        let done = AtomicBool::new(false);

        thread::scope(|scope| {
            let writer = store.handle(strategy);
            let done = &done;
            scope.spawn(move || {
                for batch in 0..40u64 {
                    let logs: Vec<_> = (0..BATCH)
                        .map(|i| LogRecord::new().with("batch", batch).with("i", i))
                        .collect();
                    writer.append_logs(&logs).unwrap();
                }
                done.store(true, Ordering::SeqCst);
            });

            for _ in 0..2 {
                let reader = store.handle(strategy);
                scope.spawn(move || {
                    let mut seen = 0;
                    loop {
                        let finished = done.load(Ordering::SeqCst);
                        let logs = reader.read_logs(0).unwrap();
                        assert_eq!(logs.len() as u64 % BATCH, 0, "saw a partial batch");
                        assert!(logs.len() >= seen, "history shrank");
                        seen = logs.len();
                        if finished {
                            break;
                        }
                    }
                    assert_eq!(seen as u64, 40 * BATCH);
                });
            }
        });
    }
}

#[test]
fn crashed_batch_never_becomes_visible() {
    let store = Store::new();
    let journal = store.handle(LockStrategy::Symlink);
    journal.append_logs(&[create(1)]).unwrap();

    // Bytes written by a process that died before committing
    let mut torn = create(2).to_line().unwrap();
    torn.push('\n');
    torn.push_str(&create(3).to_line().unwrap()[..6]);
    let mut data = std::fs::read(store.path()).unwrap();
    data.extend_from_slice(torn.as_bytes());
    std::fs::write(store.path(), data).unwrap();

    let fresh = store.handle(LockStrategy::Symlink);
    assert_eq!(fresh.read_logs(0).unwrap().len(), 1);

    fresh.append_logs(&[create(4)]).unwrap();
    let ids: Vec<_> = journal
        .read_logs(0)
        .unwrap()
        .iter()
        .map(|r| field(r, "id"))
        .collect();
    assert_eq!(ids, vec![1, 4]);
}
