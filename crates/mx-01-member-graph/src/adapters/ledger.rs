//! In-memory investment ledger
//!
//! Stands in for the external ledger's read path. Only active investments
//! contribute to a member's total.

use crate::domain::errors::LedgerError;
use crate::ports::outbound::InvestmentLedger;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Amount, MemberId};
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct Investment {
    amount: Amount,
    active: bool,
}

/// Ledger keeping every investment per member.
#[derive(Default)]
pub struct InMemoryInvestmentLedger {
    entries: RwLock<HashMap<MemberId, Vec<Investment>>>,
}

impl InMemoryInvestmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an active investment. Returns its index for later closing.
    pub fn record_investment(&self, member_id: MemberId, amount: Amount) -> usize {
        let mut entries = self.entries.write();
        let list = entries.entry(member_id).or_default();
        list.push(Investment {
            amount,
            active: true,
        });
        list.len() - 1
    }

    /// Mark an investment as no longer active.
    pub fn close_investment(&self, member_id: MemberId, index: usize) -> Result<(), LedgerError> {
        let mut entries = self.entries.write();
        let investment = entries
            .get_mut(&member_id)
            .and_then(|list| list.get_mut(index))
            .ok_or_else(|| {
                LedgerError::Unavailable(format!("no investment {index} for {member_id}"))
            })?;
        investment.active = false;
        Ok(())
    }
}

#[async_trait]
impl InvestmentLedger for InMemoryInvestmentLedger {
    async fn active_investment_total(&self, member_id: MemberId) -> Result<Amount, LedgerError> {
        Ok(self
            .entries
            .read()
            .get(&member_id)
            .map(|list| {
                list.iter()
                    .filter(|inv| inv.active)
                    .map(|inv| inv.amount)
                    .sum()
            })
            .unwrap_or(Amount::ZERO))
    }
}
