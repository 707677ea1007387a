use std::sync::Barrier;
use std::thread;

use crate::{ContractLedger, ContractStatus, Error, NewContract, Transition};

fn race(ledger: &ContractLedger, id: u64, transitions: &[Transition]) -> Vec<crate::Result<()>> {
    let barrier = Barrier::new(transitions.len());
    thread::scope(|s| {
        let handles: Vec<_> = transitions
            .iter()
            .map(|&t| {
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    ledger.apply(id, t).map(|_| ())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect()
    })
}

#[test]
fn test_concurrent_accepts_exactly_one_wins() {
    for _ in 0..50 {
        let ledger = ContractLedger::new();
        let id = ledger.create(NewContract::new(1, 2)).unwrap().id;

        let results = race(&ledger, id, &[Transition::Accept, Transition::Accept]);

        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        for err in results.into_iter().filter_map(|r| r.err()) {
            assert!(matches!(
                err,
                Error::InvalidTransition {
                    from: ContractStatus::Accepted,
                    ..
                }
            ));
        }
        assert_eq!(ledger.get(id).unwrap().status, ContractStatus::Accepted);
    }
}

#[test]
fn test_accept_reject_race_settles_on_one_outcome() {
    for _ in 0..50 {
        let ledger = ContractLedger::new();
        let id = ledger.create(NewContract::new(1, 2)).unwrap().id;

        let results = race(
            &ledger,
            id,
            &[Transition::Accept, Transition::Reject, Transition::Accept],
        );

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let status = ledger.get(id).unwrap().status;
        assert!(matches!(
            status,
            ContractStatus::Accepted | ContractStatus::Rejected
        ));
    }
}

#[test]
fn test_distinct_contracts_transition_independently() {
    let ledger = ContractLedger::new();
    let ids: Vec<u64> = (0..16)
        .map(|i| ledger.create(NewContract::new(i, i + 100)).unwrap().id)
        .collect();

    thread::scope(|s| {
        for &id in &ids {
            let ledger = &ledger;
            s.spawn(move || {
                if id % 2 == 0 {
                    ledger.accept(id).unwrap();
                } else {
                    ledger.reject(id).unwrap();
                }
            });
        }
    });

    for id in ids {
        let expected = if id % 2 == 0 {
            ContractStatus::Accepted
        } else {
            ContractStatus::Rejected
        };
        assert_eq!(ledger.get(id).unwrap().status, expected);
    }
}

#[test]
fn test_concurrent_creates_get_unique_ids() {
    let ledger = ContractLedger::new();
    thread::scope(|s| {
        for t in 0..8 {
            let ledger = &ledger;
            s.spawn(move || {
                for _ in 0..25 {
                    ledger.create(NewContract::new(t, t)).unwrap();
                }
            });
        }
    });

    let all = ledger.list();
    assert_eq!(all.len(), 200);
    crate::invariants::assert_sequential_ids(&all);
}
