//! Key agreement, app attestation and server-token creation.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::TxResponse;
use crate::core::crypto::{Curve, Padding, SymmetricCipher};

/// Purposes a wallet token or server token can be issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenPurpose {
    CreateDid,
    RestoreDid,
    UpdateDid,
    RemoveVc,
    IssueVc,
    PresentVp,
    ListVcAndPresentVp,
}

/// Proof attached to a signed request. `proofValue` is filled after signing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: String,
    pub verification_method: String,
    pub proof_purpose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,
}

/// Cipher suites the client offers to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EcdhCandidate {
    pub ciphers: Vec<SymmetricCipher>,
}

/// The key-agreement proposal signed with the wallet's `keyagree` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReqEcdh {
    pub client: String,
    pub client_nonce: String,
    pub curve: Curve,
    pub public_key: String,
    pub candidate: EcdhCandidate,
    pub proof: Proof,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEcdh {
    pub id: String,
    pub tx_id: String,
    pub req_ecdh: ReqEcdh,
}

/// The server's half of the key agreement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccEcdh {
    pub server: String,
    pub server_nonce: String,
    pub public_key: String,
    #[serde(default = "default_cipher")]
    pub cipher: SymmetricCipher,
    #[serde(default = "default_padding")]
    pub padding: Padding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Json>,
}

fn default_cipher() -> SymmetricCipher {
    SymmetricCipher::Aes256Cbc
}

fn default_padding() -> Padding {
    Padding::Pkcs5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEcdhResponse {
    pub tx_id: String,
    pub acc_ecdh: AccEcdh,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAttestedAppInfo {
    pub app_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppProvider {
    pub did: String,
    pub cert_vc_ref: String,
}

/// App attestation issued by the certificate-app service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttestedAppInfo {
    pub app_id: String,
    pub provider: AppProvider,
    pub nonce: String,
    pub proof: Json,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTokenSeed {
    pub purpose: TokenPurpose,
    pub wallet_info: Json,
    pub ca_app_info: AttestedAppInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCreateToken {
    pub id: String,
    pub tx_id: String,
    pub seed: ServerTokenSeed,
}

/// Encrypted server-token data (`encStd`) with its IV, both multibase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCreateTokenResponse {
    pub tx_id: String,
    pub iv: String,
    pub enc_std: String,
}

impl TxResponse for RequestEcdhResponse {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}

impl TxResponse for RequestCreateTokenResponse {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}
