use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{State, TransactionKind};
use crate::{
    core::{
        crypto::EphemeralKeyPair,
        message::{vc::AuthType, TxResponse},
        profile::{IssueProfile, ProofRequestProfile, VerifyProfile},
    },
    error::{Error, Result},
};

/// Session state of one transaction, owned by the caller and threaded through
/// [pre_process](super::TransactionClient::pre_process) and
/// [process](super::TransactionClient::process).
///
/// Populated step by step during `pre_process`, consumed by `process`, and cleared by
/// [reset](Self::reset) before the context is used for another transaction.
#[derive(Debug, Default)]
pub struct TransactionContext {
    pub(crate) state: State,
    pub(crate) kind: Option<TransactionKind>,
    pub(crate) tx_id: String,
    pub(crate) ref_id: Option<String>,
    pub(crate) client_nonce: Option<Vec<u8>>,
    pub(crate) server_nonce: Option<Vec<u8>>,
    pub(crate) key_pair: Option<EphemeralKeyPair>,
    pub(crate) auth_nonce: Option<String>,
    pub(crate) issuer_nonce: Option<String>,
    pub(crate) auth_type: Option<AuthType>,
    pub(crate) vc_id: Option<String>,
    pub(crate) wallet_token: Option<String>,
    pub(crate) server_token: Option<String>,
    pub(crate) issue_profile: Option<IssueProfile>,
    pub(crate) verify_profile: Option<VerifyProfile>,
    pub(crate) proof_request_profile: Option<ProofRequestProfile>,
    cancel: CancellationToken,
}

impl TransactionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn kind(&self) -> Option<TransactionKind> {
        self.kind
    }

    /// The transaction id assigned by the service, empty until proposed.
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    pub fn ref_id(&self) -> Option<&str> {
        self.ref_id.as_deref()
    }

    pub fn wallet_token(&self) -> Option<&str> {
        self.wallet_token.as_deref()
    }

    pub fn auth_type(&self) -> Option<AuthType> {
        self.auth_type
    }

    pub fn vc_id(&self) -> Option<&str> {
        self.vc_id.as_deref()
    }

    pub fn issue_profile(&self) -> Option<&IssueProfile> {
        self.issue_profile.as_ref()
    }

    pub fn verify_profile(&self) -> Option<&VerifyProfile> {
        self.verify_profile.as_ref()
    }

    pub fn proof_request_profile(&self) -> Option<&ProofRequestProfile> {
        self.proof_request_profile.as_ref()
    }

    /// Token aborting every in-flight network call of this transaction when cancelled.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel in-flight calls and clear every field, returning the context to [State::Idle].
    pub fn reset(&mut self) {
        debug!(tx_id = %self.tx_id, "resetting transaction context");
        self.cancel.cancel();
        *self = Self::default();
    }

    pub(crate) fn transition(&mut self, state: State) {
        debug!(tx_id = %self.tx_id, from = ?self.state, to = ?state, "transaction state");
        self.state = state;
    }

    /// Fail unless `response` echoes this transaction's id.
    pub(crate) fn check_tx_id(&self, response: &impl TxResponse) -> Result<()> {
        if response.tx_id() != self.tx_id {
            return Err(Error::TxIdMismatch {
                expected: self.tx_id.clone(),
                received: response.tx_id().to_owned(),
            });
        }
        Ok(())
    }

    pub(crate) fn require_wallet_token(&self) -> Result<&str> {
        self.wallet_token
            .as_deref()
            .ok_or(Error::InvalidState {
                operation: "use the wallet token",
                state: self.state,
            })
    }

    pub(crate) fn require_server_token(&self) -> Result<&str> {
        self.server_token
            .as_deref()
            .ok_or(Error::InvalidState {
                operation: "use the server token",
                state: self.state,
            })
    }
}
