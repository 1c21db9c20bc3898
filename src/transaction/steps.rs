//! Kind-specific propose, action and confirm steps around the shared key-agreement and token
//! skeleton.

use tracing::{debug, info};

use super::{Action, Confirmation, State, Transaction, TransactionClient, TransactionContext, TransactionKind};
use crate::{
    core::{
        endpoint, key_agreement,
        message::{
            did::{
                ProposeDidDocResponse, ProposeRegisterUser, ProposeRegisterUserResponse,
                ProposeRestoreDidDoc, ProposeUpdateDidDoc, RequestRegisterUser,
                RequestRestoreDidDoc, RequestUpdateDidDoc, RetrieveKyc,
            },
            message_id,
            token::TokenPurpose,
            vc::{
                ProposeIssueVc, ProposeIssueVcResponse, ProposeRevokeVc, ProposeRevokeVcResponse,
                RequestIssueProfile, RequestIssueProfileResponse, RequestIssueVc,
                RequestIssueVcResponse, RequestRevokeVc,
            },
            verify::{RequestProfile, RequestVerify, RequestZkpVerify},
            Confirm, TxIdResponse,
        },
        profile::{RequestProfileResponse, RequestProofRequestProfileResponse},
        token,
    },
    error::{Error, Result},
    presentation::{assemble_presentation, PresentationProfile, Selection},
    wallet::DidDocumentKind,
};

fn missing(operation: &'static str, ctx: &TransactionContext) -> Error {
    Error::InvalidState {
        operation,
        state: ctx.state,
    }
}

fn assigned_tx_id(tx_id: String) -> Result<String> {
    if tx_id.is_empty() {
        return Err(Error::decode("txId", "service assigned an empty transaction id"));
    }
    Ok(tx_id)
}

impl TransactionClient {
    pub(super) async fn run_pre_process(
        &self,
        ctx: &mut TransactionContext,
        transaction: &Transaction,
    ) -> Result<()> {
        self.propose(ctx, transaction).await?;
        ctx.transition(State::Proposed);

        let kind = transaction.kind();
        let Some(document_kind) = kind.did_document_kind() else {
            ctx.wallet_token = Some(
                self.wallet
                    .create_wallet_token(kind.purpose(), &self.config.user_id)
                    .await?,
            );
            return Ok(());
        };

        let ecdh = key_agreement::perform_key_agreement(
            &self.service,
            &self.config.tas,
            self.wallet.as_ref(),
            ctx,
            document_kind,
        )
        .await?;
        ctx.transition(State::KeyAgreed);

        let attested_app_info = token::request_attested_app_info(
            &self.service,
            &self.config.cas,
            &self.config.app_id,
            ctx,
        )
        .await?;
        ctx.transition(State::Attested);

        ctx.wallet_token = Some(
            self.wallet
                .create_wallet_token(kind.purpose(), &self.config.user_id)
                .await?,
        );

        token::negotiate_server_token(
            &self.service,
            &self.config.tas,
            self.wallet.as_ref(),
            ctx,
            kind.purpose(),
            attested_app_info,
            &ecdh,
        )
        .await?;

        self.after_token(ctx, transaction).await
    }

    async fn propose(&self, ctx: &mut TransactionContext, transaction: &Transaction) -> Result<()> {
        let tas = &self.config.tas;
        let cancel = ctx.cancellation_token().clone();

        match transaction {
            Transaction::RegisterUser => {
                let response: ProposeRegisterUserResponse = self
                    .service
                    .post(
                        tas.endpoint(endpoint::PROPOSE_REGISTER_USER)?,
                        &ProposeRegisterUser { id: message_id() },
                        &cancel,
                    )
                    .await?;
                ctx.tx_id = assigned_tx_id(response.tx_id)?;
            }
            Transaction::RestoreUser { offer_id, did } => {
                let response: ProposeDidDocResponse = self
                    .service
                    .post(
                        tas.endpoint(endpoint::PROPOSE_RESTORE_DID_DOC)?,
                        &ProposeRestoreDidDoc {
                            id: message_id(),
                            offer_id: offer_id.clone(),
                            did: did.clone(),
                        },
                        &cancel,
                    )
                    .await?;
                ctx.tx_id = assigned_tx_id(response.tx_id)?;
                ctx.auth_nonce = Some(response.auth_nonce);
            }
            Transaction::UpdateUser { did } => {
                let response: ProposeDidDocResponse = self
                    .service
                    .post(
                        tas.endpoint(endpoint::PROPOSE_UPDATE_DID_DOC)?,
                        &ProposeUpdateDidDoc {
                            id: message_id(),
                            did: did.clone(),
                        },
                        &cancel,
                    )
                    .await?;
                ctx.tx_id = assigned_tx_id(response.tx_id)?;
                ctx.auth_nonce = Some(response.auth_nonce);
            }
            Transaction::RevokeVc { vc_id } => {
                let response: ProposeRevokeVcResponse = self
                    .service
                    .post(
                        tas.endpoint(endpoint::PROPOSE_REVOKE_VC)?,
                        &ProposeRevokeVc {
                            id: message_id(),
                            vc_id: vc_id.clone(),
                        },
                        &cancel,
                    )
                    .await?;
                ctx.tx_id = assigned_tx_id(response.tx_id)?;
                ctx.issuer_nonce = Some(response.issuer_nonce);
                ctx.auth_type = Some(response.auth_type);
                ctx.vc_id = Some(vc_id.clone());
            }
            Transaction::IssueVc {
                vc_plan_id,
                issuer,
                offer_id,
            } => {
                let response: ProposeIssueVcResponse = self
                    .service
                    .post(
                        tas.endpoint(endpoint::PROPOSE_ISSUE_VC)?,
                        &ProposeIssueVc {
                            id: message_id(),
                            vc_plan_id: vc_plan_id.clone(),
                            issuer: issuer.clone(),
                            offer_id: offer_id.clone(),
                        },
                        &cancel,
                    )
                    .await?;
                ctx.tx_id = assigned_tx_id(response.tx_id)?;
                ctx.ref_id = Some(response.ref_id);
            }
            Transaction::VerifyVc { offer_id } => {
                let response: RequestProfileResponse = self
                    .service
                    .post(
                        self.config.verifier.endpoint(endpoint::REQUEST_PROFILE)?,
                        &RequestProfile {
                            id: message_id(),
                            offer_id: offer_id.clone(),
                        },
                        &cancel,
                    )
                    .await?;
                ctx.tx_id = assigned_tx_id(response.tx_id)?;
                ctx.verify_profile = Some(response.profile);
            }
            Transaction::VerifyZkProof { offer_id } => {
                let response: RequestProofRequestProfileResponse = self
                    .service
                    .post(
                        self.config
                            .verifier
                            .endpoint(endpoint::REQUEST_PROOF_REQUEST_PROFILE)?,
                        &RequestProfile {
                            id: message_id(),
                            offer_id: offer_id.clone(),
                        },
                        &cancel,
                    )
                    .await?;
                ctx.tx_id = assigned_tx_id(response.tx_id)?;
                ctx.proof_request_profile = Some(response.proof_request_profile);
            }
        }

        info!(tx_id = %ctx.tx_id, kind = ?transaction.kind(), "proposed");
        Ok(())
    }

    /// Steps some kinds run once the server token is available.
    async fn after_token(&self, ctx: &mut TransactionContext, transaction: &Transaction) -> Result<()> {
        match transaction {
            Transaction::RegisterUser => {
                debug!(tx_id = %ctx.tx_id, "retrieving kyc");
                let response: TxIdResponse = self
                    .service
                    .post(
                        self.config.tas.endpoint(endpoint::RETRIEVE_KYC)?,
                        &RetrieveKyc {
                            id: message_id(),
                            tx_id: ctx.tx_id.clone(),
                            server_token: ctx.require_server_token()?.to_owned(),
                            kyc_tx_id: self.config.user_id.clone(),
                        },
                        ctx.cancellation_token(),
                    )
                    .await?;
                ctx.check_tx_id(&response)
            }
            Transaction::IssueVc { offer_id, .. } => {
                let holder = self.wallet.did_document(DidDocumentKind::Holder).await?;
                debug!(tx_id = %ctx.tx_id, "requesting issue profile");
                let response: RequestIssueProfileResponse = self
                    .service
                    .post(
                        self.config.tas.endpoint(endpoint::REQUEST_ISSUE_PROFILE)?,
                        &RequestIssueProfile {
                            id: message_id(),
                            tx_id: ctx.tx_id.clone(),
                            server_token: ctx.require_server_token()?.to_owned(),
                            did: holder.id,
                            offer_id: offer_id.clone(),
                        },
                        ctx.cancellation_token(),
                    )
                    .await?;
                ctx.check_tx_id(&response)?;
                ctx.auth_nonce = Some(response.auth_nonce);
                ctx.issue_profile = Some(response.profile);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Build and submit the action. Returns the id of a credential issued by the action.
    pub(super) async fn submit_action(
        &self,
        ctx: &mut TransactionContext,
        action: &Action,
        passcode: Option<&str>,
    ) -> Result<Option<String>> {
        let tas = &self.config.tas;
        let wallet_token = ctx.require_wallet_token()?.to_owned();
        let tx_id = ctx.tx_id.clone();

        debug!(%tx_id, kind = ?action.kind(), "submitting action");
        let response: TxIdResponse = match action {
            Action::RegisterUser => {
                let signed_did_doc = self
                    .wallet
                    .signed_did_document(&wallet_token, passcode)
                    .await?;
                self.service
                    .post(
                        tas.endpoint(endpoint::REQUEST_REGISTER_USER)?,
                        &RequestRegisterUser {
                            id: message_id(),
                            tx_id,
                            server_token: ctx.require_server_token()?.to_owned(),
                            signed_did_doc,
                        },
                        ctx.cancellation_token(),
                    )
                    .await?
            }
            Action::RestoreUser => {
                let auth_nonce = ctx
                    .auth_nonce
                    .as_deref()
                    .ok_or_else(|| missing("restore without an auth nonce", ctx))?;
                let did_auth = self
                    .wallet
                    .did_auth(&wallet_token, auth_nonce, passcode)
                    .await?;
                self.service
                    .post(
                        tas.endpoint(endpoint::REQUEST_RESTORE_DID_DOC)?,
                        &RequestRestoreDidDoc {
                            id: message_id(),
                            tx_id,
                            server_token: ctx.require_server_token()?.to_owned(),
                            did_auth,
                        },
                        ctx.cancellation_token(),
                    )
                    .await?
            }
            Action::UpdateUser => {
                let auth_nonce = ctx
                    .auth_nonce
                    .as_deref()
                    .ok_or_else(|| missing("update without an auth nonce", ctx))?;
                let did_auth = self
                    .wallet
                    .did_auth(&wallet_token, auth_nonce, passcode)
                    .await?;
                let signed_did_doc = self
                    .wallet
                    .signed_did_document(&wallet_token, passcode)
                    .await?;
                self.service
                    .post(
                        tas.endpoint(endpoint::REQUEST_UPDATE_DID_DOC)?,
                        &RequestUpdateDidDoc {
                            id: message_id(),
                            tx_id,
                            server_token: ctx.require_server_token()?.to_owned(),
                            did_auth,
                            signed_did_doc,
                        },
                        ctx.cancellation_token(),
                    )
                    .await?
            }
            Action::RevokeVc => {
                let (Some(vc_id), Some(issuer_nonce)) =
                    (ctx.vc_id.as_deref(), ctx.issuer_nonce.as_deref())
                else {
                    return Err(missing("revoke without a proposal", ctx));
                };
                let request = self
                    .wallet
                    .revoke_request(
                        &wallet_token,
                        vc_id,
                        issuer_nonce,
                        ctx.auth_type.unwrap_or_default(),
                        passcode,
                    )
                    .await?;
                self.service
                    .post(
                        tas.endpoint(endpoint::REQUEST_REVOKE_VC)?,
                        &RequestRevokeVc {
                            id: message_id(),
                            tx_id,
                            server_token: ctx.require_server_token()?.to_owned(),
                            request,
                        },
                        ctx.cancellation_token(),
                    )
                    .await?
            }
            Action::IssueVc => return self.issue(ctx, &wallet_token, passcode).await.map(Some),
            Action::VerifyVc { claim_infos } => {
                let profile = ctx
                    .verify_profile
                    .as_ref()
                    .ok_or_else(|| missing("verify without a profile", ctx))?;
                let present_token = self
                    .wallet
                    .create_wallet_token(TokenPurpose::PresentVp, &self.config.user_id)
                    .await?;
                let payload = assemble_presentation(
                    self.wallet.as_ref(),
                    &present_token,
                    &Selection::Claims(claim_infos.clone()),
                    PresentationProfile::Verify(profile),
                    passcode,
                )
                .await?;
                self.service
                    .post(
                        self.config.verifier.endpoint(endpoint::REQUEST_VERIFY)?,
                        &RequestVerify {
                            id: message_id(),
                            tx_id,
                            acc_e2e: payload.acc_e2e,
                            enc_vp: payload.payload,
                        },
                        ctx.cancellation_token(),
                    )
                    .await?
            }
            Action::VerifyZkProof { referents, param } => {
                let profile = ctx
                    .proof_request_profile
                    .as_ref()
                    .ok_or_else(|| missing("verify without a proof request", ctx))?;
                let present_token = self
                    .wallet
                    .create_wallet_token(TokenPurpose::PresentVp, &self.config.user_id)
                    .await?;
                let payload = assemble_presentation(
                    self.wallet.as_ref(),
                    &present_token,
                    &Selection::Referents {
                        referents: referents.clone(),
                        param: param.clone(),
                    },
                    PresentationProfile::ProofRequest(profile),
                    passcode,
                )
                .await?;
                self.service
                    .post(
                        self.config.verifier.endpoint(endpoint::REQUEST_VERIFY_PROOF)?,
                        &RequestZkpVerify {
                            id: message_id(),
                            tx_id,
                            acc_e2e: payload.acc_e2e,
                            enc_proof: payload.payload,
                            nonce: profile.proof_request().nonce.clone(),
                        },
                        ctx.cancellation_token(),
                    )
                    .await?
            }
        };

        ctx.check_tx_id(&response)?;
        Ok(None)
    }

    async fn issue(
        &self,
        ctx: &mut TransactionContext,
        wallet_token: &str,
        passcode: Option<&str>,
    ) -> Result<String> {
        let (Some(ref_id), Some(auth_nonce), Some(profile)) = (
            ctx.ref_id.as_deref(),
            ctx.auth_nonce.as_deref(),
            ctx.issue_profile.as_ref(),
        ) else {
            return Err(missing("issue without an issue profile", ctx));
        };

        let body = self
            .wallet
            .issue_request(wallet_token, ref_id, auth_nonce, profile, passcode)
            .await?;
        let response: RequestIssueVcResponse = self
            .service
            .post(
                self.config.tas.endpoint(endpoint::REQUEST_ISSUE_VC)?,
                &RequestIssueVc {
                    id: message_id(),
                    tx_id: ctx.tx_id.clone(),
                    server_token: ctx.require_server_token()?.to_owned(),
                    body,
                },
                ctx.cancellation_token(),
            )
            .await?;
        ctx.check_tx_id(&response)?;

        let vc_id = self
            .wallet
            .store_issued_credential(wallet_token, ref_id, &response.e2e)
            .await?;
        info!(tx_id = %ctx.tx_id, %vc_id, "credential stored");
        ctx.vc_id = Some(vc_id.clone());
        Ok(vc_id)
    }

    /// Confirm the submitted action and apply its local side effect.
    pub(super) async fn confirm(
        &self,
        ctx: &mut TransactionContext,
        issued_vc_id: Option<String>,
    ) -> Result<Confirmation> {
        let kind = ctx.kind.ok_or_else(|| missing("confirm", ctx))?;
        let confirm_endpoint = match kind {
            TransactionKind::RegisterUser => endpoint::CONFIRM_REGISTER_USER,
            TransactionKind::RestoreUser => endpoint::CONFIRM_RESTORE_DID_DOC,
            TransactionKind::UpdateUser => endpoint::CONFIRM_UPDATE_DID_DOC,
            TransactionKind::RevokeVc => endpoint::CONFIRM_REVOKE_VC,
            TransactionKind::IssueVc => endpoint::CONFIRM_ISSUE_VC,
            TransactionKind::VerifyVc | TransactionKind::VerifyZkProof => {
                // The verifier's answer to the presentation concludes the transaction.
                return Ok(Confirmation {
                    tx_id: ctx.tx_id.clone(),
                    kind,
                    vc_id: None,
                });
            }
        };

        let vc_id = issued_vc_id.or_else(|| ctx.vc_id.clone());
        let response: TxIdResponse = self
            .service
            .post(
                self.config.tas.endpoint(confirm_endpoint)?,
                &Confirm {
                    id: message_id(),
                    tx_id: ctx.tx_id.clone(),
                    server_token: ctx.require_server_token()?.to_owned(),
                    vc_id: vc_id.clone(),
                },
                ctx.cancellation_token(),
            )
            .await?;
        ctx.check_tx_id(&response)?;

        let wallet_token = ctx.require_wallet_token()?;
        match kind {
            TransactionKind::RegisterUser | TransactionKind::UpdateUser => {
                self.wallet.save_holder_did_document(wallet_token).await?;
            }
            TransactionKind::RevokeVc => {
                if let Some(vc_id) = &vc_id {
                    self.wallet
                        .delete_credentials(wallet_token, std::slice::from_ref(vc_id))
                        .await?;
                }
            }
            _ => {}
        }

        Ok(Confirmation {
            tx_id: response.tx_id,
            kind,
            vc_id,
        })
    }
}
