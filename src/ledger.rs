use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::{
    validate_amount, Amount, Committee, CommitteeConfig, Error, Event, Party, Proposal,
    ProposalId, Receipt, Result, Status, TransferExecutor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Accept confirmations on proposals that were already executed. They are
    /// recorded for the audit trail but have no further effect.
    pub late_confirmations: bool,
    /// Queue audit events for [`ProposalLedger::take_events`]. The queue is
    /// unbounded, a ledger that records events must be drained by its owner.
    /// When off, transitions are only logged.
    pub record_events: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            late_confirmations: true,
            record_events: true,
        }
    }
}

type Entry<P, D> = Arc<Mutex<Proposal<P, D>>>;
type LedgerEvent<P, X> =
    Event<P, <X as TransferExecutor>::Destination, <X as TransferExecutor>::Outcome>;

// State transition (per proposal)
//
// +------------+  confirm   +-------------+  execute   +------------+
// |  Pending   | ---------> | Confirmable | ---------> |  Executed  |
// +------------+            +-------------+            +------------+
//
// Proposals are never removed. Index `i` of the arena holds proposal `i + 1`.
pub struct ProposalLedger<P: Party, X: TransferExecutor> {
    committee: Committee<P>,
    config: LedgerConfig,
    executor: X,
    proposals: RwLock<Vec<Entry<P, X::Destination>>>,
    events: Mutex<Vec<LedgerEvent<P, X>>>,
}

impl<P: Party, X: TransferExecutor> ProposalLedger<P, X> {
    pub fn new(committee: Committee<P>, executor: X) -> Self {
        Self::with_config(committee, executor, LedgerConfig::default())
    }

    pub fn with_config(committee: Committee<P>, executor: X, config: LedgerConfig) -> Self {
        info!(
            "[MSIG] ledger up with {} parties, threshold {}",
            committee.len(),
            committee.threshold()
        );
        Self {
            committee,
            config,
            executor,
            proposals: Default::default(),
            events: Default::default(),
        }
    }

    pub fn from_config(
        committee: CommitteeConfig<P>,
        executor: X,
        config: LedgerConfig,
    ) -> Result<Self> {
        Ok(Self::with_config(
            Committee::try_from(committee)?,
            executor,
            config,
        ))
    }

    pub fn committee(&self) -> &Committee<P> {
        &self.committee
    }

    pub fn config(&self) -> LedgerConfig {
        self.config
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn is_authorized(&self, party: &P) -> bool {
        self.committee.is_authorized(party)
    }

    /// Creates a new proposal, the proposer's confirmation is recorded implicitly.
    pub fn propose(
        &self,
        caller: &P,
        destination: X::Destination,
        amount: Amount,
        payload: Vec<u8>,
    ) -> Result<ProposalId> {
        if let Err(err) = self.committee.authorize(caller) {
            debug!("[MSIG] rejecting proposal: {}", err);
            return Err(err);
        }
        let amount = validate_amount(amount)?;

        let mut proposals = self.proposals.write();
        let id = proposals.len() as ProposalId + 1;
        let proposal = Proposal::new(id, caller.clone(), destination, amount, payload);
        info!("[MSIG] created {:?}", proposal);

        self.emit(Event::ProposalCreated {
            id,
            proposer: proposal.proposer.clone(),
            destination: proposal.destination.clone(),
            amount,
        });
        proposals.push(Arc::new(Mutex::new(proposal)));

        Ok(id)
    }

    /// Records `caller`'s confirmation and returns the new confirmation count.
    ///
    /// Confirming never executes, that is always a separate call.
    pub fn confirm(&self, caller: &P, id: ProposalId) -> Result<usize> {
        let entry = self.entry(id)?;
        self.committee.authorize(caller)?;

        let mut proposal = entry.lock();
        if proposal.executed && !self.config.late_confirmations {
            debug!("[MSIG] {:?} confirming executed #{}", caller, id);
            return Err(Error::AlreadyExecuted(id));
        }
        if proposal.confirmations.contains(caller) {
            debug!("[MSIG] {:?} already confirmed #{}", caller, id);
            return Err(Error::AlreadyConfirmed {
                id,
                party: format!("{:?}", caller),
            });
        }

        proposal.confirmations.insert(caller.clone());
        let count = proposal.confirmation_count();
        info!(
            "[MSIG] {:?} confirmed #{} ({}/{})",
            caller,
            id,
            count,
            self.committee.threshold()
        );

        self.emit(Event::Confirmed {
            id,
            party: caller.clone(),
            count,
        });

        Ok(count)
    }

    /// Hands a quorum-approved proposal to the executor.
    ///
    /// The proposal stays locked for the duration of the executor call, at most
    /// one execute per proposal can ever succeed. If the executor fails the
    /// proposal is left as it was and execution may be retried.
    pub fn execute(&self, caller: &P, id: ProposalId) -> Result<Receipt<X::Outcome>> {
        let entry = self.entry(id)?;
        self.committee.authorize(caller)?;

        let mut proposal = entry.lock();
        if proposal.executed {
            return Err(Error::AlreadyExecuted(id));
        }

        let threshold = self.committee.threshold();
        if !proposal.has_quorum(threshold) {
            return Err(Error::QuorumNotMet {
                id,
                confirmations: proposal.confirmation_count(),
                threshold,
            });
        }

        let outcome = match self.executor.perform(
            &proposal.destination,
            proposal.amount,
            &proposal.payload,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("[MSIG] executor failed on #{}: {}", id, err);
                return Err(Error::ExecutionFailed {
                    id,
                    source: Box::new(err),
                });
            }
        };

        proposal.executed = true;
        info!("[MSIG] {:?} executed #{}: {:?}", caller, id, outcome);

        self.emit(Event::Executed {
            id,
            outcome: outcome.clone(),
        });

        Ok(Receipt { id, outcome })
    }

    pub fn proposal(&self, id: ProposalId) -> Result<Proposal<P, X::Destination>> {
        let entry = self.entry(id)?;
        let proposal = entry.lock().clone();
        Ok(proposal)
    }

    pub fn status(&self, id: ProposalId) -> Result<Status> {
        let entry = self.entry(id)?;
        let status = entry.lock().status(self.committee.threshold());
        Ok(status)
    }

    pub fn confirmations(&self, id: ProposalId) -> Result<BTreeSet<P>> {
        let entry = self.entry(id)?;
        let confirmations = entry.lock().confirmations.clone();
        Ok(confirmations)
    }

    /// True once the proposal has gathered a quorum, executed or not.
    pub fn is_confirmed(&self, id: ProposalId) -> Result<bool> {
        let entry = self.entry(id)?;
        let quorum = entry.lock().has_quorum(self.committee.threshold());
        Ok(quorum)
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.read().len()
    }

    /// Ids of proposals not yet executed, ascending.
    pub fn pending_ids(&self) -> Vec<ProposalId> {
        let entries = self.proposals.read().clone();
        entries
            .iter()
            .map(|entry| entry.lock())
            .filter(|proposal| !proposal.executed)
            .map(|proposal| proposal.id)
            .collect()
    }

    /// Drains the audit events emitted so far, oldest first.
    pub fn take_events(&self) -> Vec<LedgerEvent<P, X>> {
        std::mem::take(&mut *self.events.lock())
    }

    fn emit(&self, event: LedgerEvent<P, X>) {
        if self.config.record_events {
            self.events.lock().push(event);
        }
    }

    fn entry(&self, id: ProposalId) -> Result<Entry<P, X::Destination>> {
        let proposals = self.proposals.read();
        id.checked_sub(1)
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| proposals.get(idx))
            .cloned()
            .ok_or(Error::NotFound(id))
    }
}
