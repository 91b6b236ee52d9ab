//! Total order and no gaps

use crate::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::thread;

#[test]
fn interleaved_processes_commit_every_batch_exactly_once() {
    for strategy in STRATEGIES {
        let store = Store::new();
        store.handle(strategy);

        thread::scope(|scope| {
            for writer in 0..4u64 {
                let journal = store.handle(strategy);
                scope.spawn(move || {
                    for batch in 0..8u64 {
                        let size = 1 + (writer + batch) % 3;
                        let logs: Vec<_> = (0..size)
                            .map(|i| {
                                LogRecord::new()
                                    .with("writer", writer)
                                    .with("batch", batch)
                                    .with("i", i)
                                    .with("size", size)
                            })
                            .collect();
                        journal.append_logs(&logs).unwrap();
                    }
                });
            }
        });

        let logs = store.handle(strategy).read_logs(0).unwrap();
        let expected: u64 = (0..4u64)
            .flat_map(|w| (0..8u64).map(move |b| 1 + (w + b) % 3))
            .sum();
        assert_eq!(logs.len() as u64, expected);

        // Batches are contiguous and each writer's batches keep their order
        let mut next_batch: BTreeMap<u64, u64> = BTreeMap::new();
        let mut at = 0;
        while at < logs.len() {
            let head = &logs[at];
            let (writer, batch, size) = (field(head, "writer"), field(head, "batch"), field(head, "size"));
            for i in 0..size {
                let record = &logs[at + i as usize];
                assert_eq!(field(record, "writer"), writer);
                assert_eq!(field(record, "batch"), batch);
                assert_eq!(field(record, "i"), i);
            }
            let expected_batch = next_batch.entry(writer).or_insert(0);
            assert_eq!(batch, *expected_batch, "writer {writer} out of order");
            *expected_batch += 1;
            at += size as usize;
        }
        assert!(next_batch.values().all(|n| *n == 8));
    }
}

#[test]
fn log_numbers_are_positions_in_commit_order() {
    let store = Store::new();
    let journal = store.handle(LockStrategy::Symlink);

    journal.append_logs(&[create(10), create(11)]).unwrap();
    journal.append_logs(&[create(12)]).unwrap();

    for from in 0..3u64 {
        let ids: Vec<_> = journal
            .read_logs(from)
            .unwrap()
            .iter()
            .map(|r| field(r, "id"))
            .collect();
        let expected: Vec<_> = (10 + from..13).collect();
        assert_eq!(ids, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_batching_reads_back_as_one_sequence(sizes in prop::collection::vec(0usize..5, 0..8)) {
        let store = Store::new();
        let file = store.handle(LockStrategy::Open);
        let memory = MemoryJournal::new();

        let mut next = 0u64;
        for size in &sizes {
            let batch: Vec<_> = (next..next + *size as u64).map(create).collect();
            next += *size as u64;
            file.append_logs(&batch).unwrap();
            memory.append_logs(&batch).unwrap();
        }

        for backend in [&file as &dyn JournalBackend, &memory] {
            for from in 0..=next {
                let ids: Vec<_> = backend.read_logs(from).unwrap().iter().map(|r| field(r, "id")).collect();
                prop_assert_eq!(ids, (from..next).collect::<Vec<_>>());
            }
        }
    }
}
