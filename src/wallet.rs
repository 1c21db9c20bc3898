use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::{
    core::{
        credential::{AvailableReferent, ClaimInfo, UserReferent, VerifiableCredential, ZkProofParam},
        message::{
            did::{DidAuth, SignedDidDoc},
            token::TokenPurpose,
            vc::AuthType,
            verify::AccE2e,
        },
        profile::{IssueProfile, ProofRequest, ProofRequestProfile, VerifyProfile},
    },
    error::Result,
};

/// Which of the wallet's DID documents a step operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DidDocumentKind {
    /// The device document, used while the holder document is being registered or restored.
    Device,
    /// The holder's registered document.
    Holder,
}

/// The subset of a DID document the protocols read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    pub id: String,
    pub version_id: String,
    #[serde(flatten)]
    pub rest: Map<String, Json>,
}

impl DidDocument {
    /// `<did>?versionId=<version>#<key_id>`
    pub fn verification_method(&self, key_id: &str) -> String {
        format!("{}?versionId={}#{}", self.id, self.version_id, key_id)
    }
}

/// An end-to-end encrypted presentation or proof, ready to be multibase encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPresentation {
    pub acc_e2e: AccE2e,
    pub ciphertext: Vec<u8>,
}

/// The wallet SDK the protocols orchestrate.
///
/// Implementations own key storage, signing, PIN and biometric checks and the local credential
/// store. A rejected passcode must be reported as
/// [Error::WalletCore](crate::error::Error::WalletCore) with code
/// [AUTHENTICATION_FAILED](crate::error::AUTHENTICATION_FAILED) so that the caller can prompt
/// again. Passcode arguments are `None` when the user authenticates with biometrics.
#[async_trait]
pub trait WalletCore: Send + Sync {
    async fn did_document(&self, kind: DidDocumentKind) -> Result<DidDocument>;

    /// Sign a SHA-256 `digest` with the key `key_id` of the `kind` document. Returns the raw
    /// signature.
    async fn sign(&self, kind: DidDocumentKind, key_id: &str, digest: &[u8]) -> Result<Vec<u8>>;

    /// The wallet's signed identity assertion (`SignedWalletInfo`).
    async fn signed_wallet_info(&self) -> Result<Json>;

    async fn create_wallet_token(&self, purpose: TokenPurpose, user_id: &str) -> Result<String>;

    /// Mint the server token from the decrypted server-token data.
    async fn create_server_token(&self, wallet_token: &str, server_token_data: &[u8])
        -> Result<String>;

    async fn signed_did_document(
        &self,
        wallet_token: &str,
        passcode: Option<&str>,
    ) -> Result<SignedDidDoc>;

    async fn did_auth(
        &self,
        wallet_token: &str,
        auth_nonce: &str,
        passcode: Option<&str>,
    ) -> Result<DidAuth>;

    /// Persist the holder DID document after the service accepted it.
    async fn save_holder_did_document(&self, wallet_token: &str) -> Result<()>;

    /// Signed `ReqRevokeVc` for `vc_id`.
    async fn revoke_request(
        &self,
        wallet_token: &str,
        vc_id: &str,
        issuer_nonce: &str,
        auth_type: AuthType,
        passcode: Option<&str>,
    ) -> Result<Json>;

    async fn delete_credentials(&self, wallet_token: &str, ids: &[String]) -> Result<()>;

    /// Body fields of `request-issue-vc`: DID auth, E2E accessor and encrypted request.
    async fn issue_request(
        &self,
        wallet_token: &str,
        ref_id: &str,
        auth_nonce: &str,
        profile: &IssueProfile,
        passcode: Option<&str>,
    ) -> Result<Map<String, Json>>;

    /// Decrypt and store an issued credential. Returns its id.
    async fn store_issued_credential(
        &self,
        wallet_token: &str,
        ref_id: &str,
        e2e: &Json,
    ) -> Result<String>;

    async fn credentials(&self, wallet_token: &str) -> Result<Vec<VerifiableCredential>>;

    /// Cryptographic matching of held ZKP credentials against a proof request.
    async fn search_zkp_credentials(
        &self,
        wallet_token: &str,
        proof_request: &ProofRequest,
    ) -> Result<AvailableReferent>;

    async fn create_enc_vp(
        &self,
        wallet_token: &str,
        claim_infos: &[ClaimInfo],
        profile: &VerifyProfile,
        passcode: Option<&str>,
    ) -> Result<EncryptedPresentation>;

    async fn create_enc_zk_proof(
        &self,
        wallet_token: &str,
        referents: &[UserReferent],
        param: &ZkProofParam,
        profile: &ProofRequestProfile,
    ) -> Result<EncryptedPresentation>;
}
