//! Pull-payment credit ledger.
//!
//! Balances grow only through oracle payouts and shrink only through
//! withdrawal. A withdrawal zeroes the account and commits before any funds
//! leave the ledger, so a reentrant withdrawal observes a zero balance.

use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::gate::StoreSession;
use crate::storage::{CreditStorage, EscrowStorage, Storage};
use crate::types::{Address, Amount};

/// Outbound funds transfer to a passenger.
///
/// Called after the withdrawal has been committed and outside the ledger lock.
/// Implementations may call back into the ledger.
pub trait FundsTransfer: Send + Sync {
    fn transfer(&self, to: &Address, amount: Amount) -> Result<(), String>;
}

/// Transfer sink that records every payout in memory.
#[derive(Debug, Default)]
pub struct RecordingTransfer {
    payouts: Mutex<Vec<(Address, Amount)>>,
}

impl RecordingTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payouts(&self) -> Vec<(Address, Amount)> {
        self.payouts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn total_to(&self, to: &Address) -> Amount {
        self.payouts()
            .iter()
            .filter(|(addr, _)| addr == to)
            .fold(Amount::ZERO, |acc, (_, amount)| {
                acc.checked_add(*amount).unwrap_or(acc)
            })
    }
}

impl FundsTransfer for RecordingTransfer {
    fn transfer(&self, to: &Address, amount: Amount) -> Result<(), String> {
        self.payouts
            .lock()
            .map_err(|_| "payout log poisoned".to_string())?
            .push((to.clone(), amount));
        Ok(())
    }
}

/// Escrow balance after depositing `amount`.
pub(crate) fn escrow_plus(storage: &dyn Storage, amount: Amount) -> LedgerResult<Amount> {
    storage
        .escrow_balance()?
        .checked_add(amount)
        .ok_or_else(|| LedgerError::Overflow("escrow balance".into()))
}

/// Credit balance bookkeeping.
pub struct CreditLedger;

impl CreditLedger {
    pub fn balance_of(storage: &dyn Storage, passenger: &Address) -> LedgerResult<Amount> {
        Ok(storage.credit_balance(passenger)?)
    }

    /// Balance after crediting; validated before any write.
    pub(crate) fn balance_after_credit(
        storage: &dyn Storage,
        passenger: &Address,
        amount: Amount,
    ) -> LedgerResult<Amount> {
        storage
            .credit_balance(passenger)?
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("credit balance of {}", passenger)))
    }

    /// Credit a passenger. Only the oracle payout path calls this.
    pub(crate) fn credit(
        session: &mut StoreSession<'_>,
        passenger: &Address,
        amount: Amount,
    ) -> LedgerResult<Amount> {
        let balance = Self::balance_after_credit(&**session, passenger, amount)?;
        session.set_credit_balance(passenger, balance)?;
        debug!(passenger = %passenger, amount = %amount, balance = %balance, "Passenger credited");
        Ok(balance)
    }

    /// First half of a withdrawal: zero the account and release the amount
    /// from escrow. The caller performs the transfer after committing.
    pub(crate) fn debit_all(
        session: &mut StoreSession<'_>,
        passenger: &Address,
        events: &mut Vec<LedgerEvent>,
    ) -> LedgerResult<Amount> {
        let amount = session.credit_balance(passenger)?;
        if amount.is_zero() {
            return Err(LedgerError::NoCreditBalance(passenger.clone()));
        }

        let available = session.escrow_balance()?;
        let escrow = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientEscrow {
                needed: amount,
                available,
            })?;

        session.set_credit_balance(passenger, Amount::ZERO)?;
        session.set_escrow_balance(escrow)?;

        info!(passenger = %passenger, amount = %amount, "Credit withdrawn");
        events.push(LedgerEvent::CreditWithdrawn {
            passenger: passenger.clone(),
            amount,
        });
        Ok(amount)
    }

    /// Compensate a withdrawal whose transfer failed.
    pub(crate) fn restore(
        storage: &mut dyn Storage,
        passenger: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        let balance = Self::balance_after_credit(storage, passenger, amount)?;
        let escrow = escrow_plus(storage, amount)?;
        storage.set_credit_balance(passenger, balance)?;
        storage.set_escrow_balance(escrow)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::DataLayer;
    use crate::storage::InMemoryStorage;

    fn data() -> DataLayer {
        let owner = Address::new("0xowner");
        let mut data = DataLayer::new(owner.clone(), Box::new(InMemoryStorage::new()));
        data.gate_mut().authorize(&owner, Address::new("0xapp")).unwrap();
        data
    }

    #[test]
    fn withdraw_zero_balance_fails() {
        let mut data = data();
        let mut session = data.session(&Address::new("0xapp")).unwrap();
        let err = CreditLedger::debit_all(&mut session, &Address::new("0xp"), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, LedgerError::NoCreditBalance(_)));
    }

    #[test]
    fn debit_zeroes_balance_and_releases_escrow() {
        let mut data = data();
        let passenger = Address::new("0xp");
        let mut session = data.session(&Address::new("0xapp")).unwrap();
        session.set_escrow_balance(Amount::new(10)).unwrap();
        CreditLedger::credit(&mut session, &passenger, Amount::new(4)).unwrap();

        let mut events = Vec::new();
        let amount = CreditLedger::debit_all(&mut session, &passenger, &mut events).unwrap();

        assert_eq!(amount, Amount::new(4));
        assert_eq!(session.credit_balance(&passenger).unwrap(), Amount::ZERO);
        assert_eq!(session.escrow_balance().unwrap(), Amount::new(6));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn restore_undoes_debit() {
        let mut data = data();
        let passenger = Address::new("0xp");
        {
            let mut session = data.session(&Address::new("0xapp")).unwrap();
            session.set_escrow_balance(Amount::new(10)).unwrap();
            CreditLedger::credit(&mut session, &passenger, Amount::new(4)).unwrap();
            CreditLedger::debit_all(&mut session, &passenger, &mut Vec::new()).unwrap();
        }

        CreditLedger::restore(data.storage_mut(), &passenger, Amount::new(4)).unwrap();
        assert_eq!(
            CreditLedger::balance_of(data.storage(), &passenger).unwrap(),
            Amount::new(4)
        );
        assert_eq!(data.storage().escrow_balance().unwrap(), Amount::new(10));
    }

    #[test]
    fn recording_transfer_sums_payouts() {
        let sink = RecordingTransfer::new();
        let p = Address::new("0xp");
        sink.transfer(&p, Amount::new(2)).unwrap();
        sink.transfer(&Address::new("0xq"), Amount::new(5)).unwrap();
        sink.transfer(&p, Amount::new(3)).unwrap();
        assert_eq!(sink.total_to(&p), Amount::new(5));
        assert_eq!(sink.payouts().len(), 3);
    }
}
