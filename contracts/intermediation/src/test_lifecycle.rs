use crate::invariants::{
    assert_all_contract_invariants, assert_contract_immutable_fields, assert_sequential_ids,
    assert_transition_table_closed, assert_valid_status_transition,
};
use crate::{
    ContractLedger, ContractStatus, Error, NewContract, Transition, DEFAULT_COMMISSION_RATE,
    DEFAULT_DURATION_HOURS,
};

fn setup_with_contract() -> (ContractLedger, u64) {
    let ledger = ContractLedger::new();
    let contract = ledger
        .create(NewContract::new(1, 2))
        .expect("create should succeed");
    (ledger, contract.id)
}

#[test]
fn test_create_starts_pending_with_defaults() {
    let ledger = ContractLedger::new();
    let contract = ledger.create(NewContract::new(1, 2)).unwrap();

    assert_eq!(contract.id, 1);
    assert_eq!(contract.investor_ref, 1);
    assert_eq!(contract.broker_ref, 2);
    assert_eq!(contract.commission_rate, DEFAULT_COMMISSION_RATE);
    assert_eq!(contract.duration_hours as i64, DEFAULT_DURATION_HOURS);
    assert_eq!(contract.status, ContractStatus::Pending);
    assert_eq!(contract.notes, None);
    assert_all_contract_invariants(&contract);
}

#[test]
fn test_create_assigns_sequential_ids() {
    let ledger = ContractLedger::new();
    for investor in 0..5 {
        ledger.create(NewContract::new(investor, 9)).unwrap();
    }
    let all = ledger.list();
    assert_eq!(all.len(), 5);
    assert_sequential_ids(&all);
}

#[test]
fn test_create_keeps_custom_terms() {
    let ledger = ContractLedger::new();
    let contract = ledger
        .create(
            NewContract::new(7, 8)
                .with_commission_rate(0.0)
                .with_duration_hours(72)
                .with_notes("cliente preferencial"),
        )
        .unwrap();

    assert_eq!(contract.commission_rate, 0.0);
    assert_eq!(contract.duration_hours, 72);
    assert_eq!(contract.notes.as_deref(), Some("cliente preferencial"));
}

#[test]
fn test_create_rejects_non_positive_duration() {
    let ledger = ContractLedger::new();
    for hours in [0, -1, -24] {
        let err = ledger
            .create(NewContract::new(1, 2).with_duration_hours(hours))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "hours={hours}: {err:?}");
    }
    assert!(ledger.is_empty());
}

#[test]
fn test_create_rejects_negative_commission() {
    let ledger = ContractLedger::new();
    for rate in [-0.01, -1.5, f64::NAN, f64::NEG_INFINITY] {
        let err = ledger
            .create(NewContract::new(1, 2).with_commission_rate(rate))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "rate={rate}: {err:?}");
    }
    assert_eq!(ledger.len(), 0);
}

#[test]
fn test_failed_create_does_not_consume_an_id() {
    let ledger = ContractLedger::new();
    ledger
        .create(NewContract::new(1, 2).with_duration_hours(0))
        .unwrap_err();
    let contract = ledger.create(NewContract::new(1, 2)).unwrap();
    assert_eq!(contract.id, 1);
}

#[test]
fn test_accept_pending_contract() {
    let (ledger, id) = setup_with_contract();
    let before = ledger.get(id).unwrap();

    let after = ledger.accept(id).unwrap();

    assert_eq!(after.status, ContractStatus::Accepted);
    assert_valid_status_transition(&before.status, &after.status);
    assert_contract_immutable_fields(&before, &after);
    assert_eq!(ledger.get(id).unwrap(), after);
}

#[test]
fn test_reject_pending_contract() {
    let (ledger, id) = setup_with_contract();
    let before = ledger.get(id).unwrap();

    let after = ledger.reject(id).unwrap();

    assert_eq!(after.status, ContractStatus::Rejected);
    assert_contract_immutable_fields(&before, &after);
}

#[test]
fn test_accept_twice_fails_second_time() {
    let (ledger, id) = setup_with_contract();
    ledger.accept(id).unwrap();

    let err = ledger.accept(id).unwrap_err();
    assert_eq!(
        err,
        Error::InvalidTransition {
            id,
            from: ContractStatus::Accepted,
            transition: Transition::Accept,
        }
    );
}

#[test]
fn test_reject_twice_fails_second_time() {
    let (ledger, id) = setup_with_contract();
    ledger.reject(id).unwrap();

    let err = ledger.reject(id).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            from: ContractStatus::Rejected,
            ..
        }
    ));
}

#[test]
fn test_terminal_states_reject_every_transition() {
    let (ledger, accepted) = setup_with_contract();
    ledger.accept(accepted).unwrap();
    assert!(ledger.reject(accepted).is_err());

    let rejected = ledger.create(NewContract::new(3, 4)).unwrap().id;
    ledger.reject(rejected).unwrap();
    assert!(ledger.accept(rejected).is_err());

    assert_eq!(ledger.get(accepted).unwrap().status, ContractStatus::Accepted);
    assert_eq!(ledger.get(rejected).unwrap().status, ContractStatus::Rejected);
}

#[test]
fn test_unknown_contract_is_not_found() {
    let (ledger, _) = setup_with_contract();
    assert_eq!(ledger.reject(999).unwrap_err(), Error::NotFound(999));
    assert_eq!(ledger.accept(999).unwrap_err(), Error::NotFound(999));
    assert_eq!(ledger.get(999).unwrap_err(), Error::NotFound(999));
}

#[test]
fn test_transition_table() {
    assert_transition_table_closed();
    assert_eq!(
        ContractStatus::Expired.apply(Transition::Accept),
        None,
        "Expired is terminal"
    );
}

#[test]
fn test_status_wire_names_round_trip() {
    for status in ContractStatus::ALL {
        assert_eq!(ContractStatus::from_str_opt(status.as_str()), Some(status));
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, format!("\"{}\"", status.as_str()));
    }
    assert_eq!(ContractStatus::from_str_opt("pending"), None);
}

#[test]
fn test_new_contract_defaults_from_json() {
    let request: NewContract =
        serde_json::from_str(r#"{"investor_ref": 1, "broker_ref": 2}"#).unwrap();
    assert_eq!(request, NewContract::new(1, 2));
}
