//! DID document lifecycle: register, restore, update.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::TxResponse;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeRegisterUser {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeRegisterUserResponse {
    pub tx_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeRestoreDidDoc {
    pub id: String,
    pub offer_id: String,
    pub did: String,
}

/// Response to both restore and update proposals.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeDidDocResponse {
    pub tx_id: String,
    pub auth_nonce: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeUpdateDidDoc {
    pub id: String,
    pub did: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveKyc {
    pub id: String,
    pub tx_id: String,
    pub server_token: String,
    pub kyc_tx_id: String,
}

/// Signed DID document produced by the wallet (opaque to the protocol layer).
pub type SignedDidDoc = Json;

/// DID-auth proof signed over an `authNonce` (opaque to the protocol layer).
pub type DidAuth = Json;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRegisterUser {
    pub id: String,
    pub tx_id: String,
    pub server_token: String,
    pub signed_did_doc: SignedDidDoc,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRestoreDidDoc {
    pub id: String,
    pub tx_id: String,
    pub server_token: String,
    pub did_auth: DidAuth,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUpdateDidDoc {
    pub id: String,
    pub tx_id: String,
    pub server_token: String,
    pub did_auth: DidAuth,
    pub signed_did_doc: SignedDidDoc,
}

impl TxResponse for ProposeRegisterUserResponse {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}

impl TxResponse for ProposeDidDocResponse {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}
