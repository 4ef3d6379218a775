//! Payout log: the daemon's funds transfer rail.
//!
//! There is no external payment system behind the daemon, so withdrawals are
//! settled by appending to this log, which the API exposes read-only.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::RwLock;
use surety_ledger::{Address, Amount, FundsTransfer};
use uuid::Uuid;

/// One settled withdrawal
#[derive(Debug, Clone, Serialize)]
pub struct PayoutRecord {
    pub id: Uuid,
    pub to: Address,
    pub amount: Amount,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct PayoutLog {
    records: RwLock<Vec<PayoutRecord>>,
}

impl PayoutLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent first
    pub fn recent(&self, limit: usize) -> Vec<PayoutRecord> {
        self.records
            .read()
            .map(|records| records.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn for_passenger(&self, passenger: &Address) -> Vec<PayoutRecord> {
        self.records
            .read()
            .map(|records| {
                records
                    .iter()
                    .filter(|r| &r.to == passenger)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl FundsTransfer for PayoutLog {
    fn transfer(&self, to: &Address, amount: Amount) -> Result<(), String> {
        let record = PayoutRecord {
            id: Uuid::new_v4(),
            to: to.clone(),
            amount,
            at: Utc::now(),
        };
        tracing::info!(payout = %record.id, to = %to, amount = %amount, "Payout settled");
        self.records
            .write()
            .map_err(|_| "payout log poisoned".to_string())?
            .push(record);
        Ok(())
    }
}
