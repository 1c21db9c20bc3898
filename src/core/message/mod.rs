//! Request and response records exchanged with the remote services.
//!
//! Field names follow the services' camelCase JSON. Response records only declare what the
//! protocols read; unknown fields are ignored.

use chrono::Utc;
use rand::random;
use serde::{Deserialize, Serialize};

pub mod did;
pub mod token;
pub mod vc;
pub mod verify;

/// A new message id: UTC timestamp with microseconds followed by 8 random hex digits.
pub fn message_id() -> String {
    format!(
        "{}{:08x}",
        Utc::now().format("%Y%m%d%H%M%S%6f"),
        random::<u32>()
    )
}

/// Responses carrying the transaction id echoed by the service.
pub trait TxResponse {
    fn tx_id(&self) -> &str;
}

/// Minimal response shape shared by action and confirmation steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TxIdResponse {
    pub tx_id: String,
}

impl TxResponse for TxIdResponse {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}

/// Confirmation request: every kind confirms with the transaction id and the server token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirm {
    pub id: String,
    pub tx_id: String,
    pub server_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vc_id: Option<String>,
}

/// Error body returned by the services on failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceErrorBody {
    pub code: String,
    #[serde(alias = "message")]
    pub description: String,
}
