//! Quorum-approved transfers.
//!
//! A fixed [`Committee`] of parties must jointly authorize every transfer. A
//! party proposes a transfer, which counts as its own confirmation. Other
//! parties confirm it, and once the committee threshold is met any party may
//! execute it through the [`TransferExecutor`]. A proposal executes at most
//! once, and a failed execution can be retried without re-collecting
//! confirmations.

pub mod committee;
pub mod error;
pub mod event;
pub mod executor;
pub mod ledger;
pub mod proposal;
pub mod signed_call;

use core::fmt::Debug;
use serde::Serialize;

pub use crate::committee::{Committee, CommitteeConfig};
pub use crate::error::{ConfigError, Error, Result};
pub use crate::event::Event;
pub use crate::executor::{Receipt, TransferExecutor};
pub use crate::ledger::{LedgerConfig, ProposalLedger};
pub use crate::proposal::{parse_amount, validate_amount, Amount, Proposal, ProposalId, Status};
pub use crate::signed_call::{Call, CallResponse, SignedCall, SignedLedger};

pub trait Party: Ord + Clone + Debug + Serialize {}
impl<T: Ord + Clone + Debug + Serialize> Party for T {}
