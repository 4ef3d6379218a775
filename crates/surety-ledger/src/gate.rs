//! Access gate and the gated data layer.
//!
//! The data layer owns the storage backend. Reads are served directly; mutable
//! access is only available through a [`StoreSession`], which the gate hands out
//! to allow-listed callers while the ledger is operational.

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::storage::Storage;
use crate::types::Address;

/// Operational switch plus the allow-list of callers permitted to mutate storage.
#[derive(Clone, Debug)]
pub struct AccessGate {
    owner: Address,
    operational: bool,
    authorized: BTreeSet<Address>,
}

impl AccessGate {
    /// A new gate starts operational with an empty allow-list.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            operational: true,
            authorized: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn is_authorized(&self, identity: &Address) -> bool {
        self.authorized.contains(identity)
    }

    /// Switch the operational flag. Owner only; returns the resulting value.
    pub fn set_operational(&mut self, caller: &Address, mode: bool) -> LedgerResult<bool> {
        self.require_owner(caller)?;

        if self.operational == mode {
            debug!(operational = mode, "Operational flag unchanged");
            return Ok(mode);
        }

        self.operational = mode;
        info!(operational = mode, caller = %caller, "Operational flag changed");
        Ok(mode)
    }

    /// Add an identity to the allow-list. Returns false if it was already present.
    pub fn authorize(&mut self, caller: &Address, identity: Address) -> LedgerResult<bool> {
        self.require_owner(caller)?;
        let added = self.authorized.insert(identity.clone());
        if added {
            info!(identity = %identity, "Caller authorized");
        }
        Ok(added)
    }

    /// Remove an identity from the allow-list. Returns false if it was absent.
    pub fn revoke(&mut self, caller: &Address, identity: &Address) -> LedgerResult<bool> {
        self.require_owner(caller)?;
        let removed = self.authorized.remove(identity);
        if removed {
            info!(identity = %identity, "Caller revoked");
        }
        Ok(removed)
    }

    pub fn require_operational(&self) -> LedgerResult<()> {
        if self.operational {
            Ok(())
        } else {
            Err(LedgerError::NotOperational)
        }
    }

    pub fn require_authorized(&self, caller: &Address) -> LedgerResult<()> {
        if self.authorized.contains(caller) {
            Ok(())
        } else {
            warn!(caller = %caller, "Caller not on allow-list");
            Err(LedgerError::unauthorized(format!(
                "{} is not an authorized caller",
                caller
            )))
        }
    }

    fn require_owner(&self, caller: &Address) -> LedgerResult<()> {
        if *caller == self.owner {
            Ok(())
        } else {
            warn!(caller = %caller, "Owner-only operation rejected");
            Err(LedgerError::unauthorized(format!(
                "{} is not the ledger owner",
                caller
            )))
        }
    }
}

/// Storage guarded by an [`AccessGate`].
pub struct DataLayer {
    gate: AccessGate,
    storage: Box<dyn Storage>,
}

impl DataLayer {
    pub fn new(owner: Address, storage: Box<dyn Storage>) -> Self {
        Self {
            gate: AccessGate::new(owner),
            storage,
        }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut AccessGate {
        &mut self.gate
    }

    /// Read-only view of committed state.
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Open a mutable session for `caller`.
    ///
    /// Fails with `NotOperational` while the gate is closed and with
    /// `Unauthorized` if the caller is not allow-listed, in that order.
    pub fn session(&mut self, caller: &Address) -> LedgerResult<StoreSession<'_>> {
        self.gate.require_operational()?;
        self.gate.require_authorized(caller)?;
        Ok(StoreSession {
            storage: self.storage.as_mut(),
        })
    }

    /// Ungated mutable access for genesis seeding and compensating writes.
    pub(crate) fn storage_mut(&mut self) -> &mut dyn Storage {
        self.storage.as_mut()
    }
}

/// Mutable storage handle issued to an authorized caller.
pub struct StoreSession<'a> {
    storage: &'a mut (dyn Storage + 'static),
}

impl Deref for StoreSession<'_> {
    type Target = dyn Storage;

    fn deref(&self) -> &Self::Target {
        &*self.storage
    }
}

impl DerefMut for StoreSession<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.storage
    }
}
