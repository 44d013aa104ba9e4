use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Error, Party, Result};

/// Deployment-time description of a committee: the operator identities in the
/// order they were supplied and the number of confirmations required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeConfig<P: Party> {
    pub parties: Vec<P>,
    pub threshold: usize,
}

/// The fixed set of parties allowed to drive proposals, and the quorum size.
///
/// There is no way to change membership once constructed, rotating the
/// committee means standing up a new ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committee<P: Party> {
    parties: BTreeSet<P>,
    threshold: usize,
}

impl<P: Party> Committee<P> {
    pub fn new(parties: impl IntoIterator<Item = P>, threshold: usize) -> Result<Self> {
        let mut members = BTreeSet::new();
        for party in parties {
            if members.contains(&party) {
                return Err(ConfigError::DuplicateParty {
                    party: format!("{:?}", party),
                }
                .into());
            }
            members.insert(party);
        }

        if members.is_empty() {
            return Err(ConfigError::NoParties.into());
        }

        if threshold == 0 || threshold > members.len() {
            return Err(ConfigError::InvalidThreshold {
                threshold,
                parties: members.len(),
            }
            .into());
        }

        Ok(Self {
            parties: members,
            threshold,
        })
    }

    pub fn is_authorized(&self, party: &P) -> bool {
        self.parties.contains(party)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn parties(&self) -> &BTreeSet<P> {
        &self.parties
    }

    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }

    pub(crate) fn authorize(&self, party: &P) -> Result<()> {
        if self.is_authorized(party) {
            Ok(())
        } else {
            Err(Error::Unauthorized {
                party: format!("{:?}", party),
            })
        }
    }
}

impl<P: Party> TryFrom<CommitteeConfig<P>> for Committee<P> {
    type Error = Error;

    fn try_from(config: CommitteeConfig<P>) -> Result<Self> {
        Self::new(config.parties, config.threshold)
    }
}
