use core::fmt::Debug;
use serde::{Deserialize, Serialize};

use crate::{Amount, Party, ProposalId};

/// Audit trail entries, one per committed state transition.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event<P: Party, D, O> {
    ProposalCreated {
        id: ProposalId,
        proposer: P,
        destination: D,
        amount: Amount,
    },
    Confirmed {
        id: ProposalId,
        party: P,
        count: usize,
    },
    Executed {
        id: ProposalId,
        outcome: O,
    },
}

impl<P: Party, D, O> Event<P, D, O> {
    pub fn proposal_id(&self) -> ProposalId {
        match self {
            Event::ProposalCreated { id, .. }
            | Event::Confirmed { id, .. }
            | Event::Executed { id, .. } => *id,
        }
    }
}

impl<P: Party, D: Debug, O: Debug> Debug for Event<P, D, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::ProposalCreated {
                id,
                proposer,
                destination,
                amount,
            } => write!(f, "P#{}({:?}->{:?}:{})", id, proposer, destination, amount),
            Event::Confirmed { id, party, count } => write!(f, "C#{}({:?}, {})", id, party, count),
            Event::Executed { id, outcome } => write!(f, "X#{}({:?})", id, outcome),
        }
    }
}
