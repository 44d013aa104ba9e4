use std::collections::BTreeMap;

use blsttc::{PublicKeyShare, SecretKeyShare, SignatureShare};
use core::fmt::Debug;
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    Amount, Error, ProposalId, ProposalLedger, Receipt, Result, TransferExecutor,
};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call<D> {
    Propose {
        destination: D,
        amount: Amount,
        payload: Vec<u8>,
    },
    Confirm(ProposalId),
    Execute(ProposalId),
}

impl<D: Debug> Debug for Call<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Call::Propose {
                destination,
                amount,
                payload,
            } => write!(
                f,
                "Propose({:?}:{}:0x{})",
                destination,
                amount,
                hex::encode(payload)
            ),
            Call::Confirm(id) => write!(f, "Confirm(#{})", id),
            Call::Execute(id) => write!(f, "Execute(#{})", id),
        }
    }
}

/// A call authenticated by the caller's key share. The signature covers the
/// ledger's domain, the call and the caller's nonce, so a captured call can't
/// be replayed on this ledger or on any other.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCall<D> {
    pub call: Call<D>,
    pub nonce: u64,
    pub caller: PublicKeyShare,
    pub sig: SignatureShare,
}

impl<D: Debug> Debug for SignedCall<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}-N{}@{:?}", self.call, self.nonce, self.caller)
    }
}

fn call_bytes_to_sign<D: Serialize>(
    domain: &[u8],
    call: &Call<D>,
    nonce: u64,
) -> Result<Vec<u8>> {
    Ok(bincode::serialize(&(domain, call, nonce))?)
}

impl<D: Serialize> SignedCall<D> {
    /// Signs `call` for the ledger identified by `domain`, see [`SignedLedger::domain`].
    pub fn sign(
        secret_key: &SecretKeyShare,
        domain: &[u8],
        call: Call<D>,
        nonce: u64,
    ) -> Result<Self> {
        let sig = secret_key.sign(call_bytes_to_sign(domain, &call, nonce)?);
        Ok(Self {
            call,
            nonce,
            caller: secret_key.public_key_share(),
            sig,
        })
    }

    pub fn validate_signature(&self, domain: &[u8]) -> Result<()> {
        if self
            .caller
            .verify(&self.sig, call_bytes_to_sign(domain, &self.call, self.nonce)?)
        {
            Ok(())
        } else {
            Err(Error::InvalidSignature)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResponse<O> {
    Proposed(ProposalId),
    Confirmed(usize),
    Executed(Receipt<O>),
}

/// Front door for a ledger whose parties are identified by their key shares.
pub struct SignedLedger<X: TransferExecutor> {
    ledger: ProposalLedger<PublicKeyShare, X>,
    domain: Vec<u8>,
    nonces: Mutex<BTreeMap<PublicKeyShare, u64>>,
}

impl<X: TransferExecutor> SignedLedger<X>
where
    X::Destination: Serialize,
{
    /// `id` names this ledger instance, like a chain id plus contract address.
    /// It is bound together with the committee into every call signature.
    pub fn new(
        id: impl Into<String>,
        ledger: ProposalLedger<PublicKeyShare, X>,
    ) -> Result<Self> {
        let committee = ledger.committee();
        let domain = bincode::serialize(&(
            id.into(),
            committee.parties(),
            committee.threshold(),
        ))?;
        info!("[MSIG] signed ledger domain 0x{}", hex::encode(&domain));
        Ok(Self {
            ledger,
            domain,
            nonces: Default::default(),
        })
    }

    pub fn ledger(&self) -> &ProposalLedger<PublicKeyShare, X> {
        &self.ledger
    }

    pub fn domain(&self) -> &[u8] {
        &self.domain
    }

    pub fn next_nonce(&self, party: &PublicKeyShare) -> u64 {
        self.nonces
            .lock()
            .get(party)
            .copied()
            .unwrap_or_default()
    }

    pub fn handle_signed_call(
        &self,
        signed_call: SignedCall<X::Destination>,
    ) -> Result<CallResponse<X::Outcome>> {
        debug!("[MSIG] handling {:?}", signed_call);
        signed_call.validate_signature(&self.domain)?;

        // non-members never get a nonce slot, the ledger rejects them anyway
        if self.ledger.is_authorized(&signed_call.caller) {
            self.consume_nonce(signed_call.caller, signed_call.nonce)?;
        }

        let caller = signed_call.caller;
        match signed_call.call {
            Call::Propose {
                destination,
                amount,
                payload,
            } => self
                .ledger
                .propose(&caller, destination, amount, payload)
                .map(CallResponse::Proposed),
            Call::Confirm(id) => self.ledger.confirm(&caller, id).map(CallResponse::Confirmed),
            Call::Execute(id) => self.ledger.execute(&caller, id).map(CallResponse::Executed),
        }
    }

    fn consume_nonce(&self, caller: PublicKeyShare, nonce: u64) -> Result<()> {
        let mut nonces = self.nonces.lock();
        let expected = nonces.entry(caller).or_default();
        if nonce != *expected {
            info!(
                "[MSIG] dropping call from {:?} with nonce {}, expected {}",
                caller, nonce, expected
            );
            return Err(Error::StaleNonce {
                nonce,
                expected: *expected,
            });
        }
        *expected += 1;
        Ok(())
    }
}
