//! Property tests: id assignment and terminal transitions.

use lostfound_registry::{
    MemoryJournalStorage, RegistryFacade, ReportFoundItemRequest, ReportLostItemRequest, SyncMode,
};
use lostfound_types::{Amount, ItemQuery, Identity, LostItemId, RegistryError};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum Op {
    ReportLost { reporter: u8, reward_milli: u32 },
    ReportFound { finder: u8 },
    Resolve { caller: u8, id: u64 },
    Claim { caller: u8, id: u64 },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4, 0u32..5_000).prop_map(|(reporter, reward_milli)| Op::ReportLost {
            reporter,
            reward_milli
        }),
        (0u8..4).prop_map(|finder| Op::ReportFound { finder }),
        (0u8..4, 0u64..8).prop_map(|(caller, id)| Op::Resolve { caller, id }),
        (0u8..4, 0u64..8).prop_map(|(caller, id)| Op::Claim { caller, id }),
    ]
}

fn who(n: u8) -> Identity {
    Identity::new(format!("user-{}", n))
}

fn reward(milli: u32) -> Option<String> {
    if milli == 0 {
        None
    } else {
        Some(format!("{}.{:03}", milli / 1000, milli % 1000))
    }
}

fn apply(registry: &RegistryFacade, op: &Op) -> Result<Option<u64>, RegistryError> {
    match op {
        Op::ReportLost {
            reporter,
            reward_milli,
        } => registry
            .report_lost_item(
                &who(*reporter),
                ReportLostItemRequest {
                    name: "Item".into(),
                    description: "something".into(),
                    location: "somewhere".into(),
                    reward: reward(*reward_milli),
                },
            )
            .map(|id| Some(id.get())),
        Op::ReportFound { finder } => registry
            .report_found_item(
                &who(*finder),
                ReportFoundItemRequest {
                    name: "Item".into(),
                    description: "something".into(),
                    location: "somewhere".into(),
                },
            )
            .map(|id| Some(id.get())),
        Op::Resolve { caller, id } => registry
            .resolve_lost_item(&who(*caller), LostItemId::new(*id))
            .map(|_| None),
        Op::Claim { caller, id } => registry
            .claim_item(&who(*caller), (*id).into())
            .map(|_| None),
    }
}

proptest! {
    #[test]
    fn report_ids_are_sequential_per_ledger(ops in prop::collection::vec(arb_op(), 1..60)) {
        let registry = RegistryFacade::new();
        let mut next_lost = 1u64;
        let mut next_found = 1u64;

        for op in &ops {
            let outcome = apply(&registry, op);
            match op {
                Op::ReportLost { .. } => {
                    prop_assert_eq!(outcome.unwrap(), Some(next_lost));
                    next_lost += 1;
                }
                Op::ReportFound { .. } => {
                    prop_assert_eq!(outcome.unwrap(), Some(next_found));
                    next_found += 1;
                }
                _ => {}
            }
        }

        prop_assert_eq!(registry.lost_item_count(), next_lost - 1);
        prop_assert_eq!(registry.found_item_count(), next_found - 1);
    }

    #[test]
    fn escrow_never_pays_more_than_pledged(ops in prop::collection::vec(arb_op(), 1..60)) {
        let registry = RegistryFacade::new();
        for op in &ops {
            let _ = apply(&registry, op);
        }

        let pledged: u128 = (1..=registry.lost_item_count())
            .map(|id| registry.get_lost_item(LostItemId::new(id)).unwrap().reward.wei())
            .sum();
        let paid: u128 = registry
            .receipts()
            .iter()
            .filter_map(|r| r.payout)
            .map(Amount::wei)
            .sum();
        prop_assert_eq!(paid + registry.total_escrowed().wei(), pledged);

        // One receipt per settled item.
        let settled = registry
            .list_items(&ItemQuery::new())
            .iter()
            .filter(|l| l.is_settled())
            .count();
        prop_assert_eq!(registry.receipts().len(), settled);
    }

    #[test]
    fn replay_reproduces_state(ops in prop::collection::vec(arb_op(), 1..40)) {
        let storage = MemoryJournalStorage::new();
        let registry =
            RegistryFacade::with_journal_storage(Box::new(storage.clone()), SyncMode::OsManaged)
                .unwrap();
        for op in &ops {
            let _ = apply(&registry, op);
        }

        let reopened =
            RegistryFacade::with_journal_storage(Box::new(storage), SyncMode::OsManaged).unwrap();
        prop_assert_eq!(reopened.list_items(&ItemQuery::new()), registry.list_items(&ItemQuery::new()));
        prop_assert_eq!(reopened.receipts(), registry.receipts());
        prop_assert_eq!(reopened.total_escrowed(), registry.total_escrowed());
    }
}
