use thiserror::Error;

use crate::ProposalId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("A committee must have at least one party")]
    NoParties,
    #[error("Party {party} appears more than once in the committee")]
    DuplicateParty { party: String },
    #[error("Threshold {threshold} is outside of [1, {parties}]")]
    InvalidThreshold { threshold: usize, parties: usize },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid committee configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error("{party} is not a member of the committee")]
    Unauthorized { party: String },
    #[error("No proposal with id {0}")]
    NotFound(ProposalId),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("{party} has already confirmed proposal {id}")]
    AlreadyConfirmed { id: ProposalId, party: String },
    #[error("Proposal {0} has already been executed")]
    AlreadyExecuted(ProposalId),
    #[error("Proposal {id} has {confirmations} confirmations, {threshold} are required")]
    QuorumNotMet {
        id: ProposalId,
        confirmations: usize,
        threshold: usize,
    },
    #[error("Executing proposal {id} failed: {source}")]
    ExecutionFailed {
        id: ProposalId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Call signature is not valid")]
    InvalidSignature,
    #[error("Call nonce {nonce} is stale, expected {expected}")]
    StaleNonce { nonce: u64, expected: u64 },
    #[error("Failed to encode with bincode")]
    Encoding(#[from] bincode::Error),
}

impl Error {
    /// Failures that leave the proposal untouched and may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ExecutionFailed { .. } | Error::QuorumNotMet { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
