//! Property-based tests for the bill settlement engine

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use rust_decimal::Decimal;

use justjio::backend::bills::{consolidate, BillSplit, Debt};

const USERS: i64 = 6;

fn bill_strategy() -> impl Strategy<Value = BillSplit> {
    (
        1..=USERS,
        1i64..=1_000_000,
        prop::collection::btree_set(1..=USERS, 1..=USERS as usize),
        any::<bool>(),
    )
        .prop_filter_map("a bill needs a payer besides its owner", |(owner, cents, payers, include_owner)| {
            let payers: Vec<i64> = payers.into_iter().filter(|&p| p != owner).collect();
            if payers.is_empty() {
                return None;
            }
            let bill = BillSplit::new(owner, Decimal::new(cents, 2), payers, include_owner);
            // Sub-cent splits are rejected up front
            bill.share().ok().map(|_| bill)
        })
}

/// Money received minus money owed, per user
fn positions<'a>(debts: impl IntoIterator<Item = &'a Debt>) -> BTreeMap<i64, Decimal> {
    let mut positions: BTreeMap<i64, Decimal> = BTreeMap::new();
    for debt in debts {
        *positions.entry(debt.payee_id).or_default() += debt.amount;
        *positions.entry(debt.payer_id).or_default() -= debt.amount;
    }
    positions.retain(|_, amount| !amount.is_zero());
    positions
}

proptest! {
    #[test]
    fn test_bill_is_fully_divided(bill in bill_strategy()) {
        let (share, residual) = bill.share().unwrap();
        let owed: Decimal = bill.obligations().unwrap().iter().map(|d| d.amount).sum();
        let owner_part = if bill.include_owner { share + residual } else { Decimal::ZERO };

        prop_assert_eq!(owed + owner_part, bill.amount);
        prop_assert!(share.scale() <= 2);
    }

    #[test]
    fn test_nobody_owes_a_negative_amount(bill in bill_strategy()) {
        for debt in bill.obligations().unwrap() {
            prop_assert!(debt.amount > Decimal::ZERO);
            prop_assert_eq!(debt.payee_id, bill.owner_id);
        }
    }

    #[test]
    fn test_residual_is_below_one_cent_per_head(bill in bill_strategy()) {
        let (_, residual) = bill.share().unwrap();
        let heads = Decimal::from(bill.payers.len() + usize::from(bill.include_owner));
        prop_assert!(residual.abs() * Decimal::from(2) <= heads * Decimal::new(1, 2));
    }

    #[test]
    fn test_consolidation_preserves_positions(bills in prop::collection::vec(bill_strategy(), 1..8)) {
        let raw: Vec<Debt> = bills
            .iter()
            .flat_map(|bill| bill.obligations().unwrap())
            .collect();
        let consolidated = consolidate(&bills).unwrap();

        prop_assert_eq!(positions(&raw), positions(&consolidated));
    }

    #[test]
    fn test_consolidated_debts_are_minimal_and_sorted(bills in prop::collection::vec(bill_strategy(), 1..8)) {
        let debts = consolidate(&bills).unwrap();

        let mut pairs = BTreeSet::new();
        for debt in &debts {
            prop_assert!(debt.amount > Decimal::ZERO);
            prop_assert_ne!(debt.payer_id, debt.payee_id);
            let pair = (debt.payer_id.min(debt.payee_id), debt.payer_id.max(debt.payee_id));
            prop_assert!(pairs.insert(pair), "pair {:?} appears twice", pair);
        }

        let keys: Vec<(i64, i64)> = debts.iter().map(|d| (d.payer_id, d.payee_id)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }

    #[test]
    fn test_consolidation_ignores_bill_order(bills in prop::collection::vec(bill_strategy(), 1..8)) {
        let mut reversed = bills.clone();
        reversed.reverse();

        prop_assert_eq!(consolidate(&bills).unwrap(), consolidate(&reversed).unwrap());
    }
}
