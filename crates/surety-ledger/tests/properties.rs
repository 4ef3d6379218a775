//! Property tests: admission consensus and payout idempotence.

use proptest::prelude::*;
use surety_ledger::{
    Address, Admission, Amount, FixedIndexSelector, FlightSuretyLedger, LedgerError, StatusCode,
    SubmissionOutcome, ETHER,
};

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn addr(s: String) -> Address {
    Address::new(s)
}

fn ledger() -> FlightSuretyLedger {
    FlightSuretyLedger::builder(Address::new("0xowner"), Address::new("0xgenesis"))
        .index_selector(FixedIndexSelector::new([0, 1, 2], 1))
        .build()
        .unwrap()
}

/// Oracle answers: (oracle number, status).
fn arb_responses() -> impl Strategy<Value = Vec<(usize, StatusCode)>> {
    prop::collection::vec(
        (
            0usize..6,
            prop_oneof![
                Just(StatusCode::OnTime),
                Just(StatusCode::LateAirline),
                Just(StatusCode::LateWeather),
            ],
        ),
        1..30,
    )
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Airlines are admitted immediately below the threshold and need
    /// ceil(count / 2) distinct funded votes from it on.
    #[test]
    fn admission_follows_vote_threshold(extra in 0usize..6, voters in 1usize..6) {
        let ledger = ledger();
        let genesis = Address::new("0xgenesis");
        let minimum = ledger.config().minimum_funds;

        let mut members = vec![genesis.clone()];
        for i in 0..3 + extra {
            let candidate = addr(format!("0xm{}", i));
            let count = ledger.registered_airline_count().unwrap();
            let required = ledger.config().votes_required(count);
            let needs_votes = ledger.config().requires_consensus(count);

            let mut admitted = false;
            for (n, sponsor) in members.iter().enumerate() {
                if !ledger.is_airline_funded(sponsor).unwrap() {
                    ledger.fund_airline(sponsor, minimum).unwrap();
                }
                match ledger.register_airline(sponsor, &candidate, "member").unwrap() {
                    Admission::Registered { registered_count } => {
                        prop_assert_eq!(registered_count, count + 1);
                        if needs_votes {
                            prop_assert_eq!(n + 1, required);
                        } else {
                            prop_assert_eq!(n, 0);
                        }
                        admitted = true;
                        break;
                    }
                    Admission::Pending { votes, required: r } => {
                        prop_assert!(needs_votes);
                        prop_assert_eq!(votes, n + 1);
                        prop_assert_eq!(r, required);
                    }
                }
            }
            prop_assert!(admitted);
            members.push(candidate);
        }

        // Repeated votes from one sponsor never admit a candidate on their own.
        let count = ledger.registered_airline_count().unwrap();
        let outsider = Address::new("0xoutsider");
        for _ in 0..voters {
            let outcome = ledger.register_airline(&genesis, &outsider, "outsider").unwrap();
            prop_assert_eq!(
                outcome,
                Admission::Pending { votes: 1, required: ledger.config().votes_required(count) }
            );
        }
        prop_assert!(!ledger.is_airline_registered(&outsider).unwrap());
    }

    /// However oracles answer, a policy is credited at most once, and only
    /// with twice its premium.
    #[test]
    fn payouts_are_idempotent(responses in arb_responses(), premium in 1u64..=ETHER) {
        let ledger = ledger();
        let genesis = Address::new("0xgenesis");
        let passenger = Address::new("0xpassenger");
        let flight = ledger.register_flight(&genesis, "ND1309", 1).unwrap().key;
        ledger.purchase_insurance(&passenger, &flight, Amount::new(premium)).unwrap();

        let oracles: Vec<Address> = (0..6).map(|i| addr(format!("0xo{}", i))).collect();
        for oracle in &oracles {
            ledger.register_oracle(oracle, ledger.config().registration_fee).unwrap();
        }
        ledger.request_flight_status(&flight).unwrap();

        let mut finalized = None;
        for (i, status) in responses {
            let outcome = ledger.submit_oracle_response(&oracles[i], 1, &flight, status).unwrap();
            if let SubmissionOutcome::Finalized { status, .. } = outcome {
                prop_assert!(finalized.is_none());
                finalized = Some(status);
            }
        }

        let balance = ledger.credit_balance_of(&passenger).unwrap();
        match finalized {
            Some(StatusCode::LateAirline) => prop_assert_eq!(balance, Amount::new(premium * 2)),
            _ => prop_assert_eq!(balance, Amount::ZERO),
        }

        if balance.is_zero() {
            prop_assert!(matches!(ledger.withdraw(&passenger), Err(LedgerError::NoCreditBalance(_))));
        } else {
            prop_assert_eq!(ledger.withdraw(&passenger).unwrap(), balance);
            prop_assert_eq!(ledger.credit_balance_of(&passenger).unwrap(), Amount::ZERO);
        }
    }
}
