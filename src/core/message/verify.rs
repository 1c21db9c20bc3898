//! Presentation of credentials and zero-knowledge proofs to a verifier.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestProfile {
    pub id: String,
    pub offer_id: String,
}

/// End-to-end encryption accessor: the wallet's ephemeral public key and the IV used for the
/// payload, proven by the wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccE2e {
    pub public_key: String,
    pub iv: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Json>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestVerify {
    pub id: String,
    pub tx_id: String,
    pub acc_e2e: AccE2e,
    pub enc_vp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestZkpVerify {
    pub id: String,
    pub tx_id: String,
    pub acc_e2e: AccE2e,
    pub enc_proof: String,
    pub nonce: String,
}
