//! Scenario tests driving the ledger facade the way the service does.

use std::collections::VecDeque;
use std::sync::{Arc, Barrier, Mutex, OnceLock, Weak};
use std::thread;

use surety_ledger::{
    Address, Admission, Amount, FixedIndexSelector, FlightKey, FlightSuretyLedger, FundsTransfer,
    IgnoreReason, IndexSelector, LedgerError, LedgerEvent, LedgerResult, OracleIndexes,
    RecordingTransfer, StatusCode, StatusRequestKey, SubmissionOutcome, ETHER,
};

const REQUEST_INDEX: u8 = 5;

fn addr(s: &str) -> Address {
    Address::new(s)
}

fn owner() -> Address {
    addr("0xowner")
}

fn genesis() -> Address {
    addr("0xa1")
}

fn build(transfer: Arc<dyn FundsTransfer>) -> FlightSuretyLedger {
    FlightSuretyLedger::builder(owner(), genesis())
        .genesis_name("Genesis Air")
        .index_selector(FixedIndexSelector::new([2, REQUEST_INDEX, 8], REQUEST_INDEX))
        .funds_transfer(transfer)
        .build()
        .unwrap()
}

fn register_oracles(ledger: &FlightSuretyLedger, n: usize) -> Vec<Address> {
    (0..n)
        .map(|i| {
            let oracle = addr(&format!("0xoracle{}", i));
            ledger
                .register_oracle(&oracle, ledger.config().registration_fee)
                .unwrap();
            oracle
        })
        .collect()
}

/// Insure `passenger` on a fresh flight and settle it as late-airline.
fn insure_and_settle(ledger: &FlightSuretyLedger, passenger: &Address, premium: Amount) -> FlightKey {
    let flight = ledger
        .register_flight(&genesis(), "ND1309", 1_700_000_000)
        .unwrap()
        .key;
    ledger.purchase_insurance(passenger, &flight, premium).unwrap();

    let oracles = register_oracles(ledger, 3);
    ledger.request_flight_status(&flight).unwrap();
    for oracle in &oracles {
        ledger
            .submit_oracle_response(oracle, REQUEST_INDEX, &flight, StatusCode::LateAirline)
            .unwrap();
    }
    flight
}

#[test]
fn only_owner_changes_operational_state() {
    let ledger = build(Arc::new(RecordingTransfer::new()));
    assert!(ledger.is_operational().unwrap());

    let err = ledger.set_operational(&addr("0xstranger"), false).unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));
    assert!(ledger.is_operational().unwrap());

    assert!(!ledger.set_operational(&owner(), false).unwrap());
    let err = ledger
        .register_airline(&genesis(), &addr("0xb"), "B")
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotOperational));
    assert!(matches!(
        ledger.is_airline_registered(&addr("0xb")),
        Err(LedgerError::NotOperational)
    ));

    assert!(ledger.set_operational(&owner(), true).unwrap());
    assert!(!ledger.is_airline_registered(&addr("0xb")).unwrap());
}

#[test]
fn multiparty_admission_scenario() {
    let ledger = FlightSuretyLedger::builder(owner(), genesis())
        .genesis_unfunded()
        .build()
        .unwrap();
    let a = genesis();
    let minimum = ledger.config().minimum_funds;

    // Unfunded genesis cannot sponsor.
    let err = ledger.register_airline(&a, &addr("0xb"), "B").unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));

    ledger.fund_airline(&a, minimum).unwrap();
    for c in ["0xb", "0xc", "0xd"] {
        let outcome = ledger.register_airline(&a, &addr(c), c).unwrap();
        assert!(outcome.is_registered());
    }
    assert_eq!(ledger.registered_airline_count().unwrap(), 4);

    let e = addr("0xe");
    assert_eq!(
        ledger.register_airline(&a, &e, "E").unwrap(),
        Admission::Pending { votes: 1, required: 2 }
    );
    assert!(!ledger.is_airline_registered(&e).unwrap());
    assert_eq!(ledger.registered_airline_count().unwrap(), 4);

    ledger.fund_airline(&addr("0xb"), minimum).unwrap();
    assert_eq!(
        ledger.register_airline(&addr("0xb"), &e, "E").unwrap(),
        Admission::Registered { registered_count: 5 }
    );
    assert!(ledger.is_airline_registered(&e).unwrap());
    assert_eq!(ledger.registered_airline_count().unwrap(), 5);

    let summary = ledger.summary().unwrap();
    assert_eq!(summary.registered_airlines, 5);
    assert_eq!(summary.funded_airlines, 2);
    assert_eq!(summary.pending_airlines, 0);
    assert_eq!(summary.escrow, Amount::new(20 * ETHER));
}

#[test]
fn duplicate_flight_keeps_original() {
    let ledger = build(Arc::new(RecordingTransfer::new()));
    let flight = ledger.register_flight(&genesis(), "ND1309", 100).unwrap();
    let err = ledger.register_flight(&genesis(), "ND1309", 100).unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyRegistered(_)));
    assert!(ledger.is_flight_registered(&flight.key).unwrap());
    assert_eq!(ledger.flights().unwrap().len(), 1);
}

#[test]
fn premium_rules() {
    let ledger = build(Arc::new(RecordingTransfer::new()));
    let flight = ledger.register_flight(&genesis(), "ND1309", 100).unwrap().key;
    let passenger = addr("0xp");

    assert!(matches!(
        ledger.purchase_insurance(&passenger, &flight, Amount::ZERO),
        Err(LedgerError::InvalidAmount { .. })
    ));
    ledger
        .purchase_insurance(&passenger, &flight, ledger.config().price_limit)
        .unwrap();
    assert!(matches!(
        ledger.purchase_insurance(&passenger, &flight, Amount::new(1)),
        Err(LedgerError::AlreadyInsured { .. })
    ));
    assert!(ledger.is_passenger_insured(&passenger, &flight).unwrap());
}

#[test]
fn late_airline_payout_and_withdrawal() {
    let transfer = Arc::new(RecordingTransfer::new());
    let ledger = build(transfer.clone());
    let passenger = addr("0xp");
    let premium = Amount::new(ETHER);
    let mut events = ledger.subscribe();

    let flight = insure_and_settle(&ledger, &passenger, premium);

    assert_eq!(
        ledger.credit_balance_of(&passenger).unwrap(),
        Amount::new(2 * ETHER)
    );
    assert_eq!(
        ledger.flight(&flight).unwrap().unwrap().status,
        StatusCode::LateAirline
    );

    assert_eq!(ledger.withdraw(&passenger).unwrap(), Amount::new(2 * ETHER));
    assert_eq!(ledger.credit_balance_of(&passenger).unwrap(), Amount::ZERO);
    assert_eq!(transfer.total_to(&passenger), Amount::new(2 * ETHER));

    assert!(matches!(
        ledger.withdraw(&passenger),
        Err(LedgerError::NoCreditBalance(_))
    ));

    let mut kinds = Vec::new();
    while let Ok(envelope) = events.try_recv() {
        kinds.push(envelope.event.kind());
    }
    assert!(kinds.contains(&"oracle_request"));
    assert!(kinds.contains(&"flight_status_info"));
    assert!(kinds.contains(&"passenger_credited"));
    assert_eq!(kinds.last(), Some(&"credit_withdrawn"));
}

#[test]
fn late_and_repeated_submissions_change_nothing() {
    let ledger = build(Arc::new(RecordingTransfer::new()));
    let passenger = addr("0xp");
    let flight = insure_and_settle(&ledger, &passenger, Amount::new(ETHER));

    let straggler = register_oracles_from(&ledger, "0xlate", 1).remove(0);
    let outcome = ledger
        .submit_oracle_response(&straggler, REQUEST_INDEX, &flight, StatusCode::LateAirline)
        .unwrap();
    assert_eq!(
        outcome,
        SubmissionOutcome::Ignored { reason: IgnoreReason::AlreadyFinalized }
    );

    let outcome = ledger
        .submit_oracle_response(&addr("0xoracle0"), REQUEST_INDEX, &flight, StatusCode::OnTime)
        .unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Ignored { .. }));

    assert_eq!(
        ledger.credit_balance_of(&passenger).unwrap(),
        Amount::new(2 * ETHER)
    );
    assert_eq!(
        ledger.flight(&flight).unwrap().unwrap().status,
        StatusCode::LateAirline
    );
}

fn register_oracles_from(ledger: &FlightSuretyLedger, prefix: &str, n: usize) -> Vec<Address> {
    (0..n)
        .map(|i| {
            let oracle = addr(&format!("{}{}", prefix, i));
            ledger
                .register_oracle(&oracle, ledger.config().registration_fee)
                .unwrap();
            oracle
        })
        .collect()
}

/// Transfer that tries to withdraw again while the first payout is in flight.
#[derive(Default)]
struct ReentrantTransfer {
    ledger: OnceLock<Weak<FlightSuretyLedger>>,
    nested: Mutex<Option<LedgerResult<Amount>>>,
    paid: Mutex<Vec<Amount>>,
}

impl FundsTransfer for ReentrantTransfer {
    fn transfer(&self, to: &Address, amount: Amount) -> Result<(), String> {
        self.paid.lock().unwrap().push(amount);
        let mut nested = self.nested.lock().unwrap();
        if nested.is_none() {
            if let Some(ledger) = self.ledger.get().and_then(Weak::upgrade) {
                *nested = Some(ledger.withdraw(to));
            }
        }
        Ok(())
    }
}

#[test]
fn reentrant_withdrawal_observes_zero_balance() {
    let transfer = Arc::new(ReentrantTransfer::default());
    let ledger = Arc::new(build(transfer.clone()));
    transfer.ledger.set(Arc::downgrade(&ledger)).ok();

    let passenger = addr("0xp");
    insure_and_settle(&ledger, &passenger, Amount::new(ETHER));

    assert_eq!(ledger.withdraw(&passenger).unwrap(), Amount::new(2 * ETHER));

    let nested = transfer.nested.lock().unwrap().take().unwrap();
    assert!(matches!(nested, Err(LedgerError::NoCreditBalance(_))));
    assert_eq!(*transfer.paid.lock().unwrap(), vec![Amount::new(2 * ETHER)]);
    assert_eq!(ledger.credit_balance_of(&passenger).unwrap(), Amount::ZERO);
}

struct FailingTransfer;

impl FundsTransfer for FailingTransfer {
    fn transfer(&self, _to: &Address, _amount: Amount) -> Result<(), String> {
        Err("payment rail offline".into())
    }
}

#[test]
fn failed_transfer_restores_credit() {
    let ledger = build(Arc::new(FailingTransfer));
    let passenger = addr("0xp");
    insure_and_settle(&ledger, &passenger, Amount::new(ETHER));
    let escrow_before = ledger.summary().unwrap().escrow;
    let mut events = ledger.subscribe();

    let err = ledger.withdraw(&passenger).unwrap_err();
    assert!(matches!(err, LedgerError::TransferFailed { .. }));
    assert_eq!(
        ledger.credit_balance_of(&passenger).unwrap(),
        Amount::new(2 * ETHER)
    );
    assert_eq!(ledger.summary().unwrap().escrow, escrow_before);
    assert!(events.try_recv().is_err());
}

/// Hands out request indexes from a script, then falls back to the default.
struct ScriptedSelector {
    requests: VecDeque<u8>,
}

impl IndexSelector for ScriptedSelector {
    fn select_indexes(&mut self, _space: u8) -> OracleIndexes {
        OracleIndexes([2, REQUEST_INDEX, 8])
    }

    fn select_index(&mut self, _space: u8) -> u8 {
        self.requests.pop_front().unwrap_or(REQUEST_INDEX)
    }
}

#[test]
fn second_request_on_same_flight_never_pays_twice() {
    let ledger = FlightSuretyLedger::builder(owner(), genesis())
        .index_selector(ScriptedSelector {
            requests: VecDeque::from([REQUEST_INDEX, 8]),
        })
        .build()
        .unwrap();
    let passenger = addr("0xp");
    let flight = insure_and_settle(&ledger, &passenger, Amount::new(ETHER));

    let first = ledger
        .status_request(&StatusRequestKey {
            index: REQUEST_INDEX,
            flight: flight.clone(),
        })
        .unwrap()
        .unwrap();
    assert!(first.is_finalized());

    let mut rx = ledger.subscribe();
    let second = ledger.request_flight_status(&flight).unwrap();
    assert_eq!(second.key.index, 8);
    assert!(!second.is_finalized());

    let mut last = None;
    for oracle in ["0xoracle0", "0xoracle1", "0xoracle2"] {
        last = Some(
            ledger
                .submit_oracle_response(&addr(oracle), 8, &flight, StatusCode::LateAirline)
                .unwrap(),
        );
    }
    assert_eq!(
        last.unwrap(),
        SubmissionOutcome::Finalized {
            status: StatusCode::LateAirline,
            credited: vec![],
        }
    );

    let mut credited_events = 0;
    while let Ok(envelope) = rx.try_recv() {
        if matches!(envelope.event, LedgerEvent::PassengerCredited { .. }) {
            credited_events += 1;
        }
    }
    assert_eq!(credited_events, 0);
    assert_eq!(
        ledger.credit_balance_of(&passenger).unwrap(),
        Amount::new(2 * ETHER)
    );
}

// ============================================================================
// Concurrent callers
// ============================================================================

/// Genesis plus three funded airlines: the registry sits at the consensus threshold.
fn four_funded_airlines() -> Arc<FlightSuretyLedger> {
    let ledger = build(Arc::new(RecordingTransfer::new()));
    let minimum = ledger.config().minimum_funds;
    for c in ["0xb", "0xc", "0xd"] {
        ledger.register_airline(&genesis(), &addr(c), c).unwrap();
        ledger.fund_airline(&addr(c), minimum).unwrap();
    }
    assert_eq!(ledger.registered_airline_count().unwrap(), 4);
    Arc::new(ledger)
}

fn race<T, F>(threads: usize, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(usize) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(threads));
    let f = Arc::new(f);
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let barrier = barrier.clone();
            let f = f.clone();
            thread::spawn(move || {
                barrier.wait();
                f(i)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn racing_sponsors_see_a_serialized_count() {
    let ledger = four_funded_airlines();
    let sponsors = [genesis(), addr("0xb"), addr("0xc"), addr("0xd")];
    let candidates = ["0xe", "0xf", "0xg", "0xh"];

    let shared = ledger.clone();
    let outcomes = race(4, move |i| {
        shared
            .register_airline(&sponsors[i], &addr(candidates[i]), candidates[i])
            .unwrap()
    });

    for outcome in outcomes {
        assert_eq!(outcome, Admission::Pending { votes: 1, required: 2 });
    }
    assert_eq!(ledger.registered_airline_count().unwrap(), 4);
    assert_eq!(ledger.summary().unwrap().pending_airlines, 4);
}

#[test]
fn racing_votes_admit_a_candidate_once() {
    let ledger = four_funded_airlines();
    let sponsors = [genesis(), addr("0xb"), addr("0xc"), addr("0xd")];

    let shared = ledger.clone();
    let outcomes = race(4, move |i| {
        shared.register_airline(&sponsors[i], &addr("0xe"), "E")
    });

    let admitted = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(Admission::Registered { registered_count: 5 })))
        .count();
    let pending = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(Admission::Pending { votes: 1, required: 2 })))
        .count();
    let late = outcomes
        .iter()
        .filter(|o| matches!(o, Err(LedgerError::AlreadyRegistered(_))))
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(pending, 1);
    assert_eq!(late, 2);
    assert_eq!(ledger.registered_airline_count().unwrap(), 5);
}

#[test]
fn racing_purchases_insure_once() {
    let ledger = Arc::new(build(Arc::new(RecordingTransfer::new())));
    let flight = ledger
        .register_flight(&genesis(), "ND1309", 1_700_000_000)
        .unwrap()
        .key;
    let escrow_before = ledger.summary().unwrap().escrow;
    let passenger = addr("0xpassenger");
    let premium = Amount::new(ETHER / 2);

    let (shared, key, who) = (ledger.clone(), flight.clone(), passenger.clone());
    let outcomes = race(8, move |_| shared.purchase_insurance(&who, &key, premium));

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|o| o.as_ref().err())
        .all(|e| matches!(e, LedgerError::AlreadyInsured { .. })));
    assert!(ledger.is_passenger_insured(&passenger, &flight).unwrap());
    assert_eq!(
        ledger.summary().unwrap().escrow,
        Amount::new(escrow_before.minor() + ETHER / 2)
    );
}

#[test]
fn concurrent_commits_publish_in_commit_order() {
    let ledger = Arc::new(build(Arc::new(RecordingTransfer::new())));
    let mut rx = ledger.subscribe();
    let minimum = ledger.config().minimum_funds;

    let shared = ledger.clone();
    let results = race(8, move |_| shared.fund_airline(&genesis(), minimum));
    assert!(results.iter().all(|r| r.is_ok()));

    let mut totals = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        if let LedgerEvent::AirlineFunded { total_funds, .. } = envelope.event {
            totals.push(total_funds.minor());
        }
    }

    let expected: Vec<u64> = (2..=9).map(|n| n * minimum.minor()).collect();
    assert_eq!(totals, expected);
}
