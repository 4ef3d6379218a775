use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account identifier for airlines, passengers, oracles and ledger identities.
///
/// Addresses are opaque strings (hex account ids in the reference deployment);
/// the ledger only compares them for equality.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monetary amount in minor units (gwei).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn new(minor: u64) -> Self {
        Self(minor)
    }

    pub fn minor(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Scale by a whole percentage (200 = 2x).
    pub fn checked_percent(self, percent: u64) -> Option<Amount> {
        self.0.checked_mul(percent).map(|v| Amount(v / 100))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique key of a flight: operating airline, flight code and departure time
/// (unix seconds).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline: Address,
    pub code: String,
    pub departure: u64,
}

impl FlightKey {
    pub fn new(airline: Address, code: impl Into<String>, departure: u64) -> Self {
        Self {
            airline,
            code: code.into(),
            departure,
        }
    }
}

impl std::fmt::Display for FlightKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.airline, self.code, self.departure)
    }
}

/// Flight status as reported by oracles.
///
/// Serialized as the numeric wire code (0, 10, ..., 50).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StatusCode {
    Unknown,
    OnTime,
    LateAirline,
    LateWeather,
    LateTechnical,
    LateOther,
}

impl StatusCode {
    pub const ALL: [StatusCode; 6] = [
        StatusCode::Unknown,
        StatusCode::OnTime,
        StatusCode::LateAirline,
        StatusCode::LateWeather,
        StatusCode::LateTechnical,
        StatusCode::LateOther,
    ];

    pub fn code(&self) -> u8 {
        match self {
            StatusCode::Unknown => 0,
            StatusCode::OnTime => 10,
            StatusCode::LateAirline => 20,
            StatusCode::LateWeather => 30,
            StatusCode::LateTechnical => 40,
            StatusCode::LateOther => 50,
        }
    }

    /// Only a delay attributed to the airline pays out.
    pub fn triggers_payout(&self) -> bool {
        matches!(self, StatusCode::LateAirline)
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        StatusCode::ALL
            .into_iter()
            .find(|s| s.code() == code)
            .ok_or_else(|| format!("unknown status code {}", code))
    }
}

impl From<StatusCode> for u8 {
    fn from(status: StatusCode) -> u8 {
        status.code()
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StatusCode::Unknown => "UNKNOWN",
            StatusCode::OnTime => "ON TIME",
            StatusCode::LateAirline => "LATE AIRLINE",
            StatusCode::LateWeather => "LATE WEATHER",
            StatusCode::LateTechnical => "LATE TECHNICAL",
            StatusCode::LateOther => "LATE OTHER",
        };
        f.write_str(label)
    }
}

/// An airline known to the registry, either admitted or awaiting votes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Airline {
    pub address: Address,
    pub name: String,
    pub funded: bool,
    pub registered: bool,
    /// Distinct funded sponsors endorsing this candidate. Cleared on admission.
    pub votes: BTreeSet<Address>,
    /// Total funding held in escrow for this airline.
    pub funds: Amount,
    pub registered_at: Option<DateTime<Utc>>,
}

impl Airline {
    pub fn candidate(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            funded: false,
            registered: false,
            votes: BTreeSet::new(),
            funds: Amount::ZERO,
            registered_at: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub key: FlightKey,
    pub registered: bool,
    /// Last finalized status; `Unknown` until an oracle request resolves.
    pub status: StatusCode,
    pub registered_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub passenger: Address,
    pub flight: FlightKey,
    pub premium: Amount,
    /// False once the policy has been credited.
    pub active: bool,
    pub purchased_at: DateTime<Utc>,
}

/// The three status indexes an oracle may answer for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OracleIndexes(pub [u8; 3]);

impl OracleIndexes {
    pub fn contains(&self, index: u8) -> bool {
        self.0.contains(&index)
    }

    pub fn as_array(&self) -> [u8; 3] {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Oracle {
    pub address: Address,
    pub indexes: OracleIndexes,
    pub fee: Amount,
    pub registered_at: DateTime<Utc>,
}

/// Key of a status request: the selected index plus the flight key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatusRequestKey {
    pub index: u8,
    pub flight: FlightKey,
}

impl std::fmt::Display for StatusRequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}:{}", self.index, self.flight)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RequestState {
    Open,
    Finalized { status: StatusCode },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub key: StatusRequestKey,
    pub responses: BTreeMap<StatusCode, BTreeSet<Address>>,
    pub state: RequestState,
    pub opened_at: DateTime<Utc>,
}

impl StatusRequest {
    pub fn open(key: StatusRequestKey) -> Self {
        Self {
            key,
            responses: BTreeMap::new(),
            state: RequestState::Open,
            opened_at: Utc::now(),
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, RequestState::Finalized { .. })
    }

    /// Whether the oracle already answered this request under any status.
    pub fn has_responded(&self, oracle: &Address) -> bool {
        self.responses.values().any(|voters| voters.contains(oracle))
    }

    pub fn tally(&self, status: StatusCode) -> usize {
        self.responses.get(&status).map(BTreeSet::len).unwrap_or(0)
    }
}
