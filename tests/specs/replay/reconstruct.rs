//! Deterministic replay and snapshot fallback

use crate::prelude::*;
use proptest::prelude::*;

fn record_strategy() -> impl Strategy<Value = LogRecord> {
    prop_oneof![
        (0u64..6).prop_map(create),
        (0u64..6, "[a-z]{0,4}").prop_map(|(id, value)| set(id, &value)),
        Just(LogRecord::new().with("op", "noise")),
    ]
}

fn replayed(journal: &dyn JournalBackend) -> Registry {
    Reconstructor::<Registry>::cold_start(journal, None)
        .unwrap()
        .into_state()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn replaying_twice_gives_identical_state(records in prop::collection::vec(record_strategy(), 0..40)) {
        let journal = MemoryJournal::new();
        journal.append_logs(&records).unwrap();

        let first = serde_json::to_vec(&replayed(&journal)).unwrap();
        let second = serde_json::to_vec(&replayed(&journal)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn snapshot_plus_tail_equals_full_replay(
        head in prop::collection::vec(record_strategy(), 0..20),
        tail in prop::collection::vec(record_strategy(), 0..20),
    ) {
        let journal = MemoryJournal::new();
        let snapshots = MemorySnapshot::new(std::num::NonZeroU64::MIN);
        journal.append_logs(&head).unwrap();

        let mut writer = Reconstructor::<Registry>::cold_start(&journal, None).unwrap();
        writer.save_snapshot(&snapshots).unwrap();
        journal.append_logs(&tail).unwrap();

        let resumed = Reconstructor::<Registry>::cold_start(&journal, Some(&snapshots)).unwrap();
        prop_assert_eq!(resumed.log_number_read(), (head.len() + tail.len()) as u64);
        prop_assert_eq!(resumed.into_state(), replayed(&journal));
    }
}

#[test]
fn corrupted_snapshot_matches_no_snapshot() {
    let store = Store::new();
    let journal = store.handle(LockStrategy::Symlink);
    journal
        .append_logs(&[create(1), set(1, "a"), create(2), set(2, "b")])
        .unwrap();

    let snapshots = store.snapshots(1);
    let mut writer = Reconstructor::<Registry>::cold_start(&journal, None).unwrap();
    writer.save_snapshot(&snapshots).unwrap();

    // Flip a byte inside the blob
    let mut data = std::fs::read(snapshots.path()).unwrap();
    let last = data.len() - 2;
    data[last] ^= 0x20;
    std::fs::write(snapshots.path(), data).unwrap();

    let from_damaged = Reconstructor::<Registry>::cold_start(&journal, Some(&snapshots)).unwrap();
    let from_nothing = Reconstructor::<Registry>::cold_start(&journal, None).unwrap();

    assert_eq!(from_damaged.state(), from_nothing.state());
    assert_eq!(from_damaged.log_number_read(), 4);
}

#[test]
fn incompatible_snapshot_is_ignored() {
    let store = Store::new();
    let journal = store.handle(LockStrategy::Open);
    journal.append_logs(&[create(7)]).unwrap();

    // Framed correctly but not an envelope this state understands
    let snapshots = store.snapshots(1);
    snapshots
        .save_snapshot(br#"{"version":99,"log_number_read":1,"state":{}}"#)
        .unwrap();

    let rebuilt = Reconstructor::<Registry>::cold_start(&journal, Some(&snapshots)).unwrap();
    assert_eq!(rebuilt.state(), &replayed(&journal));
    assert!(rebuilt.state().items.contains_key(&7));
}

#[test]
fn periodic_snapshots_follow_the_interval() {
    let store = Store::new();
    let journal = store.handle(LockStrategy::Symlink);
    let snapshots = store.snapshots(3);
    let mut rebuilt = Reconstructor::<Registry>::new();

    journal.append_logs(&[create(1), create(2)]).unwrap();
    rebuilt.sync(&journal).unwrap();
    assert!(!rebuilt.maybe_snapshot(&snapshots));

    // Skipped records do not count toward the interval
    journal
        .append_logs(&[LogRecord::new().with("op", "noise"), create(3)])
        .unwrap();
    rebuilt.sync(&journal).unwrap();
    assert!(rebuilt.maybe_snapshot(&snapshots));
    assert!(snapshots.path().exists());
    assert_eq!(rebuilt.mutations_since_snapshot(), 0);
}
