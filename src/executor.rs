use core::fmt::Debug;
use serde::{Deserialize, Serialize};

use crate::{Amount, ProposalId};

/// Performs the transfer once a proposal has gathered a quorum.
///
/// The ledger guarantees it never calls `perform` again for a proposal that
/// has already been executed successfully, the executor itself need not be
/// idempotent. Timeouts and retries are the executor's business.
pub trait TransferExecutor {
    type Destination: Clone + Debug;
    type Outcome: Clone + Debug;
    type Error: std::error::Error + Send + Sync + 'static;

    fn perform(
        &self,
        destination: &Self::Destination,
        amount: Amount,
        payload: &[u8],
    ) -> std::result::Result<Self::Outcome, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt<O> {
    pub id: ProposalId,
    pub outcome: O,
}
