//! Bill settlement engine
//!
//! Pure functions, no I/O: the database layer feeds in the bills of a room
//! and writes back the returned debts.
//!
//! # Per-bill split
//!
//! With `n = |payers| + include_owner`, every participant's share is
//! `s = amount / n` rounded half away from zero to cents. The residual
//! `r = amount - n * s` goes to the owner's own (absorbed) share when the
//! owner takes part, otherwise to the payer with the lowest user id. Each
//! payer then owes their share to the owner. A bill so small that the
//! absorbed portion would turn negative is rejected.
//!
//! # Consolidation
//!
//! Obligations of all bills are summed per ordered `(payer, payee)` pair and
//! opposite directions are netted, so each pair of users ends up with at most
//! one debt. The output is sorted by `(payer, payee)`.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

/// Money has cent precision
pub const MONEY_SCALE: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("amount must have at most two decimal places")]
    TooPrecise,
    #[error("a bill needs at least one payer")]
    NoPayers,
    #[error("amount is too small to split between {0} people")]
    TooSmallToSplit(usize),
}

/// The inputs of one bill
#[derive(Debug, Clone, PartialEq)]
pub struct BillSplit {
    pub owner_id: i64,
    pub amount: Decimal,
    pub payers: Vec<i64>,
    pub include_owner: bool,
}

/// One directed obligation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub payer_id: i64,
    pub payee_id: i64,
    pub amount: Decimal,
}

/// Check that `amount` is a positive cent amount
pub fn validate_amount(amount: Decimal) -> Result<(), SettlementError> {
    if amount <= Decimal::ZERO {
        return Err(SettlementError::NonPositiveAmount);
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(SettlementError::TooPrecise);
    }
    Ok(())
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

impl BillSplit {
    pub fn new(owner_id: i64, amount: Decimal, payers: Vec<i64>, include_owner: bool) -> Self {
        Self {
            owner_id,
            amount,
            payers,
            include_owner,
        }
    }

    /// Distinct payers in ascending id order
    fn distinct_payers(&self) -> Vec<i64> {
        self.payers.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// Rounded share and residual
    pub fn share(&self) -> Result<(Decimal, Decimal), SettlementError> {
        validate_amount(self.amount)?;
        let payers = self.distinct_payers();
        if payers.is_empty() {
            return Err(SettlementError::NoPayers);
        }
        let heads = payers.len() + usize::from(self.include_owner);
        let n = Decimal::from(heads);
        let share = round_cents(self.amount / n);
        let residual = self.amount - n * share;
        // Rounding every share up can leave the absorbing participant below zero.
        if share + residual < Decimal::ZERO {
            return Err(SettlementError::TooSmallToSplit(heads));
        }
        Ok((share, residual))
    }

    /// What each payer owes the owner for this bill alone
    ///
    /// An owner listed among the payers owes nothing to themselves, and
    /// zero shares are omitted.
    pub fn obligations(&self) -> Result<Vec<Debt>, SettlementError> {
        let (share, residual) = self.share()?;
        let payers = self.distinct_payers();

        let mut debts = Vec::with_capacity(payers.len());
        for (index, payer_id) in payers.into_iter().enumerate() {
            let amount = if !self.include_owner && index == 0 {
                share + residual
            } else {
                share
            };
            if payer_id == self.owner_id || amount.is_zero() {
                continue;
            }
            debts.push(Debt {
                payer_id,
                payee_id: self.owner_id,
                amount,
            });
        }
        Ok(debts)
    }
}

/// Consolidate several bills into the minimal set of pairwise debts
pub fn consolidate(bills: &[BillSplit]) -> Result<Vec<Debt>, SettlementError> {
    let mut owed: BTreeMap<(i64, i64), Decimal> = BTreeMap::new();
    for bill in bills {
        for debt in bill.obligations()? {
            *owed.entry((debt.payer_id, debt.payee_id)).or_default() += debt.amount;
        }
    }
    Ok(net(&owed))
}

/// Net opposite directions of every pair
fn net(owed: &BTreeMap<(i64, i64), Decimal>) -> Vec<Debt> {
    let pairs: BTreeSet<(i64, i64)> = owed
        .keys()
        .map(|&(a, b)| if a < b { (a, b) } else { (b, a) })
        .collect();

    let mut debts: Vec<Debt> = pairs
        .into_iter()
        .filter_map(|(low, high)| {
            let forward = owed.get(&(low, high)).copied().unwrap_or_default();
            let backward = owed.get(&(high, low)).copied().unwrap_or_default();
            let balance = forward - backward;
            if balance > Decimal::ZERO {
                Some(Debt { payer_id: low, payee_id: high, amount: balance })
            } else if balance < Decimal::ZERO {
                Some(Debt { payer_id: high, payee_id: low, amount: -balance })
            } else {
                None
            }
        })
        .collect();

    debts.sort_by_key(|debt| (debt.payer_id, debt.payee_id));
    debts
}

/// Sum of each payer's outgoing obligations over `bills`, before netting
pub fn payer_totals(bills: &[BillSplit]) -> Result<BTreeMap<i64, Decimal>, SettlementError> {
    let mut totals: BTreeMap<i64, Decimal> = BTreeMap::new();
    for bill in bills {
        for debt in bill.obligations()? {
            *totals.entry(debt.payer_id).or_default() += debt.amount;
        }
    }
    Ok(totals)
}
