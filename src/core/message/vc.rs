//! Credential lifecycle: issuance and revocation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use super::TxResponse;
use crate::core::profile::IssueProfile;

/// Authentication methods accepted by an issuer, as a bit set
/// (`1` free, `2` PIN, `4` biometric; `6` is PIN or biometric).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthType(pub u32);

impl AuthType {
    pub const FREE: u32 = 0x1;
    pub const PIN: u32 = 0x2;
    pub const BIO: u32 = 0x4;

    pub fn allows(self, method: u32) -> bool {
        self.0 & method != 0
    }
}

impl Default for AuthType {
    fn default() -> Self {
        Self(Self::PIN | Self::BIO)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeRevokeVc {
    pub id: String,
    pub vc_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeRevokeVcResponse {
    pub tx_id: String,
    pub issuer_nonce: String,
    #[serde(default)]
    pub auth_type: AuthType,
}

/// Revocation request; `request` is the wallet-signed `ReqRevokeVc`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRevokeVc {
    pub id: String,
    pub tx_id: String,
    pub server_token: String,
    pub request: Json,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeIssueVc {
    pub id: String,
    pub vc_plan_id: String,
    pub issuer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeIssueVcResponse {
    pub tx_id: String,
    pub ref_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIssueProfile {
    pub id: String,
    pub tx_id: String,
    pub server_token: String,
    pub did: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIssueProfileResponse {
    pub tx_id: String,
    pub auth_nonce: String,
    pub profile: IssueProfile,
}

/// Issuance request. The wallet supplies the encrypted, DID-auth signed body fields
/// (`didAuth`, `accE2e`, `encReqVc`, ...), which are flattened next to the envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIssueVc {
    pub id: String,
    pub tx_id: String,
    pub server_token: String,
    #[serde(flatten)]
    pub body: Map<String, Json>,
}

/// Issued credential, end-to-end encrypted for the wallet.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIssueVcResponse {
    pub tx_id: String,
    pub e2e: Json,
}

impl TxResponse for ProposeRevokeVcResponse {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}

impl TxResponse for ProposeIssueVcResponse {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}

impl TxResponse for RequestIssueProfileResponse {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}

impl TxResponse for RequestIssueVcResponse {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}
