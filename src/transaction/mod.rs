//! The transaction state machine shared by every DID and credential operation.
//!
//! A transaction runs in two phases against a caller-owned [TransactionContext]:
//!
//! 1. [pre_process](TransactionClient::pre_process) proposes the transaction, agrees a key with
//!    the trust-anchor service, fetches the app attestation and negotiates the server token
//!    (`Idle` to `Tokenized`). Verification kinds only fetch the verifier's profile and a
//!    wallet token.
//! 2. [process](TransactionClient::process) builds and submits the kind-specific action with
//!    the user's passcode, then confirms it (`Tokenized` to `Confirmed`).
//!
//! A failure during `pre_process` leaves the context `Failed`; it must be
//! [reset](TransactionContext::reset) before starting over. A failure while building or
//! submitting the action keeps the context `Tokenized` so the user can be asked for their
//! passcode again ([process_with_auth](TransactionClient::process_with_auth)).

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    config::Config,
    core::{
        credential::{ClaimInfo, StatusMap, UserReferent, VcStatus, ZkProofParam},
        message::token::TokenPurpose,
        transport::ServiceClient,
        util::{AsyncHttpClient, ReqwestClient},
    },
    error::{Error, Result},
    selection::{self, EligibleReferents},
    status,
    wallet::{DidDocumentKind, WalletCore},
};

pub use context::TransactionContext;
pub use store::{ContextStore, MemoryStore};

mod context;
mod steps;
pub mod store;

/// Passcode attempts allowed by [TransactionClient::process_with_auth].
pub const MAX_PASSCODE_ATTEMPTS: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum State {
    #[default]
    Idle,
    Proposed,
    KeyAgreed,
    Attested,
    Tokenized,
    ActionSubmitted,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    RegisterUser,
    RestoreUser,
    UpdateUser,
    RevokeVc,
    IssueVc,
    VerifyVc,
    VerifyZkProof,
}

impl TransactionKind {
    /// Purpose of the wallet and server tokens negotiated during `pre_process`.
    pub fn purpose(self) -> TokenPurpose {
        match self {
            Self::RegisterUser => TokenPurpose::CreateDid,
            Self::RestoreUser => TokenPurpose::RestoreDid,
            Self::UpdateUser => TokenPurpose::UpdateDid,
            Self::RevokeVc => TokenPurpose::RemoveVc,
            Self::IssueVc => TokenPurpose::IssueVc,
            Self::VerifyVc | Self::VerifyZkProof => TokenPurpose::ListVcAndPresentVp,
        }
    }

    /// Document used for key agreement, or `None` for kinds that never negotiate a server
    /// token.
    pub fn did_document_kind(self) -> Option<DidDocumentKind> {
        match self {
            Self::RegisterUser | Self::RestoreUser | Self::UpdateUser => {
                Some(DidDocumentKind::Device)
            }
            Self::RevokeVc | Self::IssueVc => Some(DidDocumentKind::Holder),
            Self::VerifyVc | Self::VerifyZkProof => None,
        }
    }
}

/// A transaction to start, with the inputs its proposal needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    RegisterUser,
    RestoreUser {
        offer_id: String,
        did: String,
    },
    UpdateUser {
        did: String,
    },
    RevokeVc {
        vc_id: String,
    },
    IssueVc {
        vc_plan_id: String,
        issuer: String,
        offer_id: Option<String>,
    },
    VerifyVc {
        offer_id: String,
    },
    VerifyZkProof {
        offer_id: String,
    },
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::RegisterUser => TransactionKind::RegisterUser,
            Self::RestoreUser { .. } => TransactionKind::RestoreUser,
            Self::UpdateUser { .. } => TransactionKind::UpdateUser,
            Self::RevokeVc { .. } => TransactionKind::RevokeVc,
            Self::IssueVc { .. } => TransactionKind::IssueVc,
            Self::VerifyVc { .. } => TransactionKind::VerifyVc,
            Self::VerifyZkProof { .. } => TransactionKind::VerifyZkProof,
        }
    }
}

/// The action submitted by [TransactionClient::process]. Verification actions carry the user's
/// selection.
#[derive(Debug, Clone)]
pub enum Action {
    RegisterUser,
    RestoreUser,
    UpdateUser,
    RevokeVc,
    IssueVc,
    VerifyVc {
        claim_infos: Vec<ClaimInfo>,
    },
    VerifyZkProof {
        referents: Vec<UserReferent>,
        param: ZkProofParam,
    },
}

impl Action {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::RegisterUser => TransactionKind::RegisterUser,
            Self::RestoreUser => TransactionKind::RestoreUser,
            Self::UpdateUser => TransactionKind::UpdateUser,
            Self::RevokeVc => TransactionKind::RevokeVc,
            Self::IssueVc => TransactionKind::IssueVc,
            Self::VerifyVc { .. } => TransactionKind::VerifyVc,
            Self::VerifyZkProof { .. } => TransactionKind::VerifyZkProof,
        }
    }
}

/// Result of a completed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_id: String,
    pub kind: TransactionKind,
    /// Credential issued or revoked by the transaction.
    pub vc_id: Option<String>,
}

/// Supplies passcodes for [TransactionClient::process_with_auth].
#[async_trait]
pub trait AuthPrompt: Send + Sync {
    /// Ask for a passcode. `attempt` starts at 1. `None` means the user cancelled.
    async fn passcode(&self, attempt: usize) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Completed(Confirmation),
    Cancelled,
}

/// Drives transactions against the remote services on behalf of a [WalletCore].
#[derive(Clone)]
pub struct TransactionClient {
    config: Config,
    service: ServiceClient,
    wallet: Arc<dyn WalletCore>,
}

impl std::fmt::Debug for TransactionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionClient")
            .field("config", &self.config)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl TransactionClient {
    pub fn builder() -> TransactionClientBuilder {
        TransactionClientBuilder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the first phase of `transaction`, from `Idle` to `Tokenized`.
    pub async fn pre_process(
        &self,
        ctx: &mut TransactionContext,
        transaction: Transaction,
    ) -> Result<()> {
        if ctx.state != State::Idle {
            return Err(Error::InvalidState {
                operation: "pre-process",
                state: ctx.state,
            });
        }

        let kind = transaction.kind();
        ctx.kind = Some(kind);
        info!(?kind, "pre-processing transaction");

        match self.run_pre_process(ctx, &transaction).await {
            Ok(()) => {
                ctx.transition(State::Tokenized);
                Ok(())
            }
            Err(e) => {
                warn!(?kind, tx_id = %ctx.tx_id, code = e.code(), "pre-process failed: {e}");
                ctx.transition(State::Failed);
                Err(e)
            }
        }
    }

    /// Run the second phase: submit `action` and confirm it.
    ///
    /// Errors raised while building or submitting the action leave the context `Tokenized`,
    /// except an action response echoing another transaction id, which fails the transaction
    /// as errors raised by the confirmation do.
    pub async fn process(
        &self,
        ctx: &mut TransactionContext,
        action: Action,
        passcode: Option<&str>,
    ) -> Result<Confirmation> {
        if ctx.state != State::Tokenized {
            return Err(Error::InvalidState {
                operation: "process",
                state: ctx.state,
            });
        }
        if ctx.kind != Some(action.kind()) {
            return Err(Error::KindMismatch {
                expected: ctx.kind,
                found: action.kind(),
            });
        }

        let submitted = match self.submit_action(ctx, &action, passcode).await {
            Ok(submitted) => submitted,
            Err(e) => {
                warn!(tx_id = %ctx.tx_id, code = e.code(), "action failed: {e}");
                if matches!(e, Error::TxIdMismatch { .. }) {
                    ctx.transition(State::Failed);
                }
                return Err(e);
            }
        };
        ctx.transition(State::ActionSubmitted);

        match self.confirm(ctx, submitted).await {
            Ok(confirmation) => {
                ctx.transition(State::Confirmed);
                info!(tx_id = %confirmation.tx_id, kind = ?confirmation.kind, "transaction confirmed");
                Ok(confirmation)
            }
            Err(e) => {
                warn!(tx_id = %ctx.tx_id, code = e.code(), "confirmation failed: {e}");
                ctx.transition(State::Failed);
                Err(e)
            }
        }
    }

    /// [process](Self::process), asking `prompt` for a passcode up to [MAX_PASSCODE_ATTEMPTS]
    /// times.
    ///
    /// A rejected passcode prompts again without repeating `pre_process`. The flow ends with
    /// [AuthOutcome::Cancelled] when the user cancels or every attempt is rejected; in the
    /// latter case the context is reset.
    pub async fn process_with_auth(
        &self,
        ctx: &mut TransactionContext,
        action: Action,
        prompt: &dyn AuthPrompt,
    ) -> Result<AuthOutcome> {
        for attempt in 1..=MAX_PASSCODE_ATTEMPTS {
            let Some(passcode) = prompt.passcode(attempt).await else {
                info!(tx_id = %ctx.tx_id, "authentication cancelled by user");
                return Ok(AuthOutcome::Cancelled);
            };

            match self.process(ctx, action.clone(), Some(&passcode)).await {
                Ok(confirmation) => return Ok(AuthOutcome::Completed(confirmation)),
                Err(e) if e.is_authentication_failure() => {
                    warn!(tx_id = %ctx.tx_id, attempt, "passcode rejected");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(tx_id = %ctx.tx_id, "too many passcode attempts");
        ctx.reset();
        Ok(AuthOutcome::Cancelled)
    }

    /// Status of one credential.
    pub async fn status(&self, ctx: &TransactionContext, vc_id: &str) -> Result<VcStatus> {
        status::status(
            &self.service,
            &self.config.api_gateway,
            vc_id,
            ctx.cancellation_token(),
        )
        .await
    }

    /// Status of each distinct credential id.
    pub async fn statuses(&self, ctx: &TransactionContext, vc_ids: &[String]) -> Result<StatusMap> {
        status::statuses(
            &self.service,
            &self.config.api_gateway,
            vc_ids.iter().map(String::as_str),
            ctx.cancellation_token(),
        )
        .await
    }

    /// Select the claims answering the verify profile held by `ctx`.
    pub async fn select_claims(&self, ctx: &TransactionContext) -> Result<Vec<ClaimInfo>> {
        let (Some(profile), Some(wallet_token)) = (ctx.verify_profile(), ctx.wallet_token()) else {
            return Err(Error::InvalidState {
                operation: "select claims",
                state: ctx.state,
            });
        };

        let credentials = self.wallet.credentials(wallet_token).await?;
        let statuses = status::statuses(
            &self.service,
            &self.config.api_gateway,
            credentials.iter().map(|vc| vc.id.as_str()),
            ctx.cancellation_token(),
        )
        .await?;

        selection::select_claims(profile.schema_filters(), &credentials, &statuses)
    }

    /// Find the eligible referents for the proof request held by `ctx`.
    pub async fn select_referents(&self, ctx: &TransactionContext) -> Result<EligibleReferents> {
        let (Some(profile), Some(wallet_token)) =
            (ctx.proof_request_profile(), ctx.wallet_token())
        else {
            return Err(Error::InvalidState {
                operation: "select referents",
                state: ctx.state,
            });
        };

        selection::select_referents(
            &self.service,
            &self.config.api_gateway,
            self.wallet.as_ref(),
            wallet_token,
            profile.proof_request(),
            ctx.cancellation_token(),
        )
        .await
    }
}

/// Builder struct for [TransactionClient].
#[derive(Default)]
pub struct TransactionClientBuilder {
    config: Option<Config>,
    http_client: Option<Arc<dyn AsyncHttpClient + Send + Sync>>,
    wallet: Option<Arc<dyn WalletCore>>,
    request_timeout: Option<Duration>,
}

impl TransactionClientBuilder {
    /// Build the client.
    ///
    /// Uses a [ReqwestClient] when no HTTP client is set, and the configured request timeout
    /// unless [with_request_timeout](Self::with_request_timeout) overrides it.
    pub fn build(self) -> Result<TransactionClient> {
        let Self {
            config,
            http_client,
            wallet,
            request_timeout,
        } = self;

        let Some(config) = config else {
            return Err(Error::Config("config is required, see `with_config`".into()));
        };

        let Some(wallet) = wallet else {
            return Err(Error::Config("wallet is required, see `with_wallet`".into()));
        };

        let timeout = request_timeout.unwrap_or_else(|| config.request_timeout());

        let http_client = match http_client {
            Some(http_client) => http_client,
            None => Arc::new(ReqwestClient::with_timeout(timeout).map_err(Error::Transport)?),
        };

        Ok(TransactionClient {
            service: ServiceClient::new(http_client, timeout),
            config,
            wallet,
        })
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the [AsyncHttpClient] used for every service call.
    pub fn with_http_client(mut self, http_client: Arc<dyn AsyncHttpClient + Send + Sync>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletCore>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Bound every network call, overriding [Config::request_timeout].
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}
