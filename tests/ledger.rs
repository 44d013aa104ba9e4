use std::collections::BTreeSet;

use mock_executor::{MockExecutor, Transfer};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use sn_multisig::{
    Committee, CommitteeConfig, ConfigError, Error, Event, LedgerConfig, ProposalLedger, Result,
    Status,
};


static INIT: std::sync::Once = std::sync::Once::new();

fn init() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

const A: u8 = 1;
const B: u8 = 2;
const C: u8 = 3;
const D: u8 = 4;
const OUTSIDER: u8 = 99;

fn ledger(parties: &[u8], threshold: usize) -> ProposalLedger<u8, MockExecutor> {
    let committee = Committee::new(parties.iter().copied(), threshold).unwrap();
    ProposalLedger::new(committee, MockExecutor::default())
}

#[test]
fn test_multisig_three_parties_two_required() -> Result<()> {
    init();
    let ledger = ledger(&[A, B, C], 2);

    let id = ledger.propose(&A, D, 100, vec![])?;
    assert_eq!(id, 1);
    assert_eq!(ledger.confirmations(id)?, BTreeSet::from_iter([A]));

    assert_eq!(ledger.confirm(&B, id)?, 2);
    assert_eq!(ledger.confirmations(id)?, BTreeSet::from_iter([A, B]));

    let receipt = ledger.execute(&A, id)?;
    assert_eq!(receipt.id, id);
    assert_eq!(receipt.outcome, "0x0000000000000001");
    assert!(ledger.proposal(id)?.executed);

    // late confirmation is recorded but changes nothing
    assert_eq!(ledger.confirm(&C, id)?, 3);
    assert!(matches!(ledger.execute(&C, id), Err(Error::AlreadyExecuted(1))));

    assert_eq!(
        ledger.executor().performed(),
        vec![Transfer {
            destination: D,
            amount: 100,
            payload: vec![]
        }]
    );
    Ok(())
}

#[test]
fn test_multisig_quorum_not_met_until_third_confirmation() -> Result<()> {
    init();
    let ledger = ledger(&[A, B, C], 3);

    let id = ledger.propose(&B, D, 5, b"memo".to_vec())?;
    ledger.confirm(&C, id)?;
    assert!(matches!(
        ledger.execute(&A, id),
        Err(Error::QuorumNotMet {
            id: 1,
            confirmations: 2,
            threshold: 3
        })
    ));
    assert_eq!(ledger.status(id)?, Status::Pending);

    ledger.confirm(&A, id)?;
    assert_eq!(ledger.status(id)?, Status::Confirmable);
    ledger.execute(&A, id)?;
    assert_eq!(ledger.executor().performed()[0].payload, b"memo".to_vec());
    Ok(())
}

#[test]
fn test_multisig_retry_after_executor_failure() -> Result<()> {
    init();
    let ledger = ledger(&[A, B, C], 2);
    let id = ledger.propose(&A, D, 100, vec![])?;
    ledger.confirm(&B, id)?;

    ledger.executor().set_failing(true);
    match ledger.execute(&B, id) {
        Err(Error::ExecutionFailed { id: failed, source }) => {
            assert_eq!(failed, id);
            assert_eq!(source.to_string(), "ledger node unreachable");
        }
        other => panic!("Expected ExecutionFailed, got {:?}", other),
    }
    assert!(!ledger.proposal(id)?.executed);
    assert_eq!(ledger.status(id)?, Status::Confirmable);
    assert!(ledger.executor().performed().is_empty());

    // no new confirmations needed
    ledger.executor().set_failing(false);
    ledger.execute(&C, id)?;
    assert!(ledger.proposal(id)?.executed);
    assert_eq!(ledger.executor().performed().len(), 1);
    Ok(())
}

#[test]
fn test_multisig_single_party_committee() -> Result<()> {
    init();
    let ledger = ledger(&[A], 1);
    let id = ledger.propose(&A, D, 1, vec![])?;

    // proposing never executes on its own
    assert_eq!(ledger.status(id)?, Status::Confirmable);
    assert!(ledger.executor().performed().is_empty());

    ledger.execute(&A, id)?;
    assert_eq!(ledger.status(id)?, Status::Executed);
    Ok(())
}

#[test]
fn test_multisig_reject_non_member() {
    init();
    let ledger = ledger(&[A, B, C], 2);

    assert!(matches!(
        ledger.propose(&OUTSIDER, D, 100, vec![]),
        Err(Error::Unauthorized { .. })
    ));
    assert_eq!(ledger.proposal_count(), 0);

    let id = ledger.propose(&A, D, 100, vec![]).unwrap();
    assert!(matches!(
        ledger.confirm(&OUTSIDER, id),
        Err(Error::Unauthorized { .. })
    ));
    ledger.confirm(&B, id).unwrap();
    assert!(matches!(
        ledger.execute(&OUTSIDER, id),
        Err(Error::Unauthorized { .. })
    ));
    assert!(!ledger.proposal(id).unwrap().executed);
    assert_eq!(ledger.confirmations(id).unwrap(), BTreeSet::from_iter([A, B]));
}

#[test]
fn test_multisig_reject_negative_amount() {
    init();
    let ledger = ledger(&[A, B], 1);
    assert!(matches!(
        ledger.propose(&A, D, -1, vec![]),
        Err(Error::InvalidAmount(_))
    ));
    assert_eq!(ledger.proposal_count(), 0);
    assert!(ledger.propose(&A, D, 0, vec![]).is_ok());
}

#[test]
fn test_multisig_proposer_can_not_confirm_twice() {
    init();
    let ledger = ledger(&[A, B, C], 3);
    let id = ledger.propose(&A, D, 100, vec![]).unwrap();
    assert!(matches!(
        ledger.confirm(&A, id),
        Err(Error::AlreadyConfirmed { id: 1, .. })
    ));
    assert_eq!(ledger.proposal(id).unwrap().confirmation_count(), 1);
}

#[test]
fn test_multisig_proposals_are_independent() -> Result<()> {
    init();
    let ledger = ledger(&[A, B, C], 2);
    let first = ledger.propose(&A, D, 10, vec![])?;
    let second = ledger.propose(&B, D, 20, vec![])?;

    ledger.confirm(&C, second)?;
    ledger.execute(&C, second)?;

    assert_eq!(ledger.status(first)?, Status::Pending);
    assert_eq!(ledger.pending_ids(), vec![first]);
    assert!(ledger.is_confirmed(second)?);
    assert!(!ledger.is_confirmed(first)?);
    assert_eq!(ledger.executor().performed()[0].amount, 20);
    Ok(())
}

#[test]
fn test_multisig_emits_each_event_once() -> Result<()> {
    init();
    let ledger = ledger(&[A, B, C], 2);
    let id = ledger.propose(&A, D, 100, vec![])?;
    ledger.confirm(&B, id)?;
    ledger.executor().set_failing(true);
    assert!(ledger.execute(&A, id).is_err());
    ledger.executor().set_failing(false);
    ledger.execute(&A, id)?;
    assert!(ledger.execute(&B, id).is_err());

    let events = ledger.take_events();
    assert_eq!(events.len(), 3);
    assert!(matches!(
        events[0],
        Event::ProposalCreated {
            id: 1,
            proposer: A,
            destination: D,
            amount: 100
        }
    ));
    assert!(matches!(
        events[1],
        Event::Confirmed {
            id: 1,
            party: B,
            count: 2
        }
    ));
    assert!(matches!(&events[2], Event::Executed { id: 1, outcome } if outcome == "0x0000000000000001"));
    Ok(())
}

#[test]
fn test_multisig_from_config() {
    init();
    let config = CommitteeConfig {
        parties: vec![A, B, C],
        threshold: 4,
    };
    assert!(matches!(
        ProposalLedger::from_config(config, MockExecutor::default(), LedgerConfig::default()),
        Err(Error::Configuration(ConfigError::InvalidThreshold {
            threshold: 4,
            parties: 3
        }))
    ));
}

#[quickcheck]
fn prop_threshold_must_be_within_committee_size(parties: BTreeSet<u8>, threshold: usize) -> bool {
    let n = parties.len();
    match Committee::new(parties, threshold) {
        Ok(committee) => (1..=n).contains(&committee.threshold()),
        Err(Error::Configuration(_)) => n == 0 || threshold == 0 || threshold > n,
        Err(_) => false,
    }
}

#[quickcheck]
fn prop_confirmations_count_distinct_parties(
    members: BTreeSet<u8>,
    threshold: usize,
    confirmers: Vec<u8>,
) -> TestResult {
    let proposer = match members.iter().next() {
        Some(p) => *p,
        None => return TestResult::discard(),
    };
    let threshold = threshold % members.len() + 1;
    let committee = Committee::new(members.clone(), threshold).unwrap();
    let ledger = ProposalLedger::new(committee, MockExecutor::default());
    let id = ledger.propose(&proposer, 0, 1, vec![]).unwrap();

    let mut expected = BTreeSet::from_iter([proposer]);
    for party in confirmers {
        let res = ledger.confirm(&party, id);
        match res {
            Ok(count) => {
                if !members.contains(&party) || !expected.insert(party) {
                    return TestResult::failed();
                }
                if count != expected.len() {
                    return TestResult::failed();
                }
            }
            Err(Error::Unauthorized { .. }) if !members.contains(&party) => (),
            Err(Error::AlreadyConfirmed { .. }) if expected.contains(&party) => (),
            Err(_) => return TestResult::failed(),
        }
    }

    let quorum = expected.len() >= threshold;
    match ledger.execute(&proposer, id) {
        Ok(_) => TestResult::from_bool(quorum),
        Err(Error::QuorumNotMet { confirmations, .. }) => {
            TestResult::from_bool(!quorum && confirmations == expected.len())
        }
        Err(_) => TestResult::failed(),
    }
}
