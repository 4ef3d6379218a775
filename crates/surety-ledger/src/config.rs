//! Ledger economics and consensus parameters.

use serde::{Deserialize, Serialize};

use crate::types::Amount;

/// One ether expressed in ledger minor units (gwei).
pub const ETHER: u64 = 1_000_000_000;

/// Configuration for the ledger rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Minimum funding before an airline may sponsor or register flights (default: 10 ether)
    #[serde(default = "default_minimum_funds")]
    pub minimum_funds: Amount,

    /// Insurance premium ceiling (default: 1 ether)
    #[serde(default = "default_price_limit")]
    pub price_limit: Amount,

    /// Oracle registration fee (default: 1 ether)
    #[serde(default = "default_registration_fee")]
    pub registration_fee: Amount,

    /// Matching oracle responses needed to finalize a request (default: 3)
    #[serde(default = "default_quorum")]
    pub quorum: usize,

    /// Registered airlines below which one sponsor suffices (default: 4)
    #[serde(default = "default_consensus_threshold")]
    pub consensus_threshold: usize,

    /// Payout as a percentage of the premium (default: 200, i.e. 2x)
    #[serde(default = "default_payout_percent")]
    pub payout_percent: u64,

    /// Size of the oracle index space; indexes are drawn from `0..index_space` (default: 10)
    #[serde(default = "default_index_space")]
    pub index_space: u8,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            minimum_funds: default_minimum_funds(),
            price_limit: default_price_limit(),
            registration_fee: default_registration_fee(),
            quorum: default_quorum(),
            consensus_threshold: default_consensus_threshold(),
            payout_percent: default_payout_percent(),
            index_space: default_index_space(),
        }
    }
}

impl LedgerConfig {
    /// Votes required to admit a candidate once the registry has reached the
    /// consensus threshold: half the registered airlines, rounded up.
    pub fn votes_required(&self, registered: usize) -> usize {
        registered.div_ceil(2)
    }

    pub fn requires_consensus(&self, registered: usize) -> bool {
        registered >= self.consensus_threshold
    }
}

fn default_minimum_funds() -> Amount {
    Amount::new(10 * ETHER)
}

fn default_price_limit() -> Amount {
    Amount::new(ETHER)
}

fn default_registration_fee() -> Amount {
    Amount::new(ETHER)
}

fn default_quorum() -> usize {
    3
}

fn default_consensus_threshold() -> usize {
    4
}

fn default_payout_percent() -> u64 {
    200
}

fn default_index_space() -> u8 {
    10
}
