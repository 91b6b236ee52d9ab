//! Two processes, one record each, then a snapshot and a fresh reader

use crate::prelude::*;
use std::thread;

#[test]
fn two_processes_then_snapshot_then_fresh_reader() {
    for strategy in STRATEGIES {
        let store = Store::new();
        store.handle(strategy);

        thread::scope(|scope| {
            for id in [1u64, 2] {
                let process = store.handle(strategy);
                scope.spawn(move || {
                    process
                        .append_logs(&[LogRecord::try_from(json!({"op": "create", "id": id})).unwrap()])
                        .unwrap();
                });
            }
        });

        let journal = store.handle(strategy);
        let all = journal.read_logs(0).unwrap();
        let order: Vec<_> = all.iter().map(|r| field(r, "id")).collect();
        assert!(order == [1, 2] || order == [2, 1], "{order:?}");

        let tail = journal.read_logs(1).unwrap();
        assert_eq!(tail, all[1..].to_vec());

        // Snapshot as of both records
        let snapshots = store.snapshots(1);
        let mut writer = Reconstructor::<Registry>::cold_start(&journal, None).unwrap();
        assert_eq!(writer.log_number_read(), 2);
        assert!(writer.maybe_snapshot(&snapshots));

        let reader = store.handle(strategy);
        let mut fresh = Reconstructor::<Registry>::new();
        assert!(fresh.restore(&snapshots));
        assert_eq!(fresh.log_number_read(), 2);
        assert!(reader.read_logs(2).unwrap().is_empty());
        assert_eq!(fresh.sync(&reader).unwrap(), 0);
        assert_eq!(fresh.state(), writer.state());
        assert_eq!(fresh.state().items.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    }
}
