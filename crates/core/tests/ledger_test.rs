mod common;

use std::sync::Arc;

use giveaways_core::errors::EntryError;
use giveaways_core::ledger::EntryLedger;
use giveaways_core::models::{GiveawayId, GiveawayStatus, ParticipantId, ParticipantSet};
use giveaways_core::store::{GiveawayStore, MemoryStore};
use pretty_assertions::assert_eq;

use common::{EPOCH, HOUR, stored_record};

async fn ledger_with(
    status: GiveawayStatus,
    participants: &[&str],
) -> (Arc<MemoryStore>, EntryLedger, GiveawayId) {
    let store = Arc::new(MemoryStore::new());
    let record = stored_record(status, participants, 1, EPOCH.saturating_add(HOUR));
    let id = record.id;
    store.insert(record).await;
    let ledger = EntryLedger::new(store.clone());
    (store, ledger, id)
}

async fn participants_of(store: &MemoryStore, id: GiveawayId) -> Vec<String> {
    store
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap()
        .participants
        .into_iter()
        .map(|p| p.0)
        .collect()
}

#[tokio::test]
async fn test_join_returns_new_count() {
    let (store, ledger, id) = ledger_with(GiveawayStatus::Open, &["a"]).await;

    let count = ledger.join(id, &ParticipantId::from("b"), true).await.unwrap();

    assert_eq!(count, 2);
    assert_eq!(participants_of(&store, id).await, vec!["a", "b"]);
}

#[tokio::test]
async fn test_double_join_is_rejected_and_set_unchanged() {
    let (store, ledger, id) = ledger_with(GiveawayStatus::Open, &[]).await;
    let alice = ParticipantId::from("alice");

    assert_eq!(ledger.join(id, &alice, true).await.unwrap(), 1);
    let second = ledger.join(id, &alice, true).await;

    assert!(matches!(second, Err(EntryError::AlreadyParticipant)));
    assert_eq!(participants_of(&store, id).await, vec!["alice"]);
}

#[tokio::test]
async fn test_ineligible_participant_is_rejected() {
    let (store, ledger, id) = ledger_with(GiveawayStatus::Open, &[]).await;

    let result = ledger.join(id, &ParticipantId::from("bob"), false).await;

    assert!(matches!(result, Err(EntryError::NotEligible)));
    assert!(participants_of(&store, id).await.is_empty());
}

#[tokio::test]
async fn test_join_after_closure_is_rejected_without_mutation() {
    let (store, ledger, id) = ledger_with(GiveawayStatus::Closed, &["a"]).await;

    let eligible = ledger.join(id, &ParticipantId::from("b"), true).await;
    let ineligible = ledger.join(id, &ParticipantId::from("c"), false).await;

    assert!(matches!(eligible, Err(EntryError::AlreadyEnded)));
    assert!(matches!(ineligible, Err(EntryError::AlreadyEnded)));
    assert_eq!(participants_of(&store, id).await, vec!["a"]);
}

#[tokio::test]
async fn test_leave() {
    let (store, ledger, id) = ledger_with(GiveawayStatus::Open, &["a", "b"]).await;

    assert_eq!(ledger.leave(id, &ParticipantId::from("a")).await.unwrap(), 1);
    assert!(matches!(
        ledger.leave(id, &ParticipantId::from("a")).await,
        Err(EntryError::NotAParticipant)
    ));
    assert_eq!(participants_of(&store, id).await, vec!["b"]);
}

#[tokio::test]
async fn test_leave_after_closure_is_rejected() {
    let (store, ledger, id) = ledger_with(GiveawayStatus::Closed, &["a"]).await;

    let result = ledger.leave(id, &ParticipantId::from("a")).await;

    assert!(matches!(result, Err(EntryError::AlreadyEnded)));
    assert_eq!(participants_of(&store, id).await, vec!["a"]);
}

#[tokio::test]
async fn test_unknown_giveaway() {
    let store = Arc::new(MemoryStore::new());
    let ledger = EntryLedger::new(store);
    let id = GiveawayId::new();

    let result = ledger.join(id, &ParticipantId::from("a"), true).await;

    assert!(matches!(result, Err(EntryError::NotFound(missing)) if missing == id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_are_all_kept() {
    let (store, ledger, id) = ledger_with(GiveawayStatus::Open, &[]).await;

    let joins: Vec<_> = (0..64)
        .map(|n| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .join(id, &ParticipantId::from(format!("user-{n}")), true)
                    .await
            })
        })
        .collect();
    for join in joins {
        join.await.unwrap().unwrap();
    }

    let record = store.get_by_id(id).await.unwrap().unwrap();
    let expected: ParticipantSet = (0..64)
        .map(|n| ParticipantId::from(format!("user-{n}")))
        .collect();
    assert_eq!(record.participants, expected);
}
