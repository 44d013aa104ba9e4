use std::collections::BTreeSet;

use core::fmt::Debug;
use serde::{Deserialize, Serialize};

use crate::{Error, Party, Result};

pub type ProposalId = u64;
pub type Amount = i128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Fewer confirmations than the threshold
    Pending,
    /// Quorum reached, not yet executed
    Confirmable,
    /// Terminal
    Executed,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal<P: Party, D> {
    pub id: ProposalId,
    pub proposer: P,
    pub destination: D,
    pub amount: Amount,
    pub payload: Vec<u8>,
    pub confirmations: BTreeSet<P>,
    pub executed: bool,
}

impl<P: Party, D: Debug> Debug for Proposal<P, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{}({:?}->{:?}:{}",
            self.id, self.proposer, self.destination, self.amount
        )?;
        if !self.payload.is_empty() {
            write!(f, ":0x{}", hex::encode(&self.payload))?;
        }
        write!(f, ")-C{:?}", self.confirmations)?;
        if self.executed {
            write!(f, "-X")?;
        }
        Ok(())
    }
}

impl<P: Party, D> Proposal<P, D> {
    /// A fresh proposal counts the proposer as its first confirmation.
    pub(crate) fn new(
        id: ProposalId,
        proposer: P,
        destination: D,
        amount: Amount,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id,
            confirmations: BTreeSet::from_iter([proposer.clone()]),
            proposer,
            destination,
            amount,
            payload,
            executed: false,
        }
    }

    pub fn confirmation_count(&self) -> usize {
        self.confirmations.len()
    }

    pub fn has_quorum(&self, threshold: usize) -> bool {
        self.confirmation_count() >= threshold
    }

    pub fn status(&self, threshold: usize) -> Status {
        if self.executed {
            Status::Executed
        } else if self.has_quorum(threshold) {
            Status::Confirmable
        } else {
            Status::Pending
        }
    }
}

pub fn validate_amount(amount: Amount) -> Result<Amount> {
    if amount < 0 {
        Err(Error::InvalidAmount(format!("{} is negative", amount)))
    } else {
        Ok(amount)
    }
}

/// Parses a base-10 integer amount, e.g. a wei denominated value.
pub fn parse_amount(input: &str) -> Result<Amount> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAmount(format!(
            "{:?} is not a decimal integer",
            input
        )));
    }
    let amount = trimmed
        .parse::<Amount>()
        .map_err(|e| Error::InvalidAmount(format!("{:?}: {}", input, e)))?;
    validate_amount(amount)
}
