//! Profiles fetched from the issuer or verifier describing what is issued or requested.
//!
//! Profiles are read-only once fetched. Sections the protocol layer does not interpret
//! (`process`, `reqE2e`, proofs) are kept as raw JSON so they can be handed to the wallet
//! unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::message::TxResponse;
use crate::utils::NonEmptyVec;

/// Identity of an issuer or verifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDetail {
    pub did: String,
    pub cert_vc_ref: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
}

/// Fields every profile document carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileHeader {
    pub id: String,
    #[serde(rename = "type")]
    pub profile_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Profile proof; only the creation time is interpreted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileProof {
    #[serde(default)]
    pub created: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Json>,
}

// ---- issuance ----

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRef {
    pub id: String,
    #[serde(rename = "type")]
    pub schema_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueProfileBody {
    pub issuer: ProviderDetail,
    pub credential_schema: SchemaRef,
    pub process: Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueProfile {
    #[serde(flatten)]
    pub header: ProfileHeader,
    pub profile: IssueProfileBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProfileProof>,
}

// ---- verifiable presentation ----

/// One entry of a verifier's filter: which credential schema is wanted, from which issuers,
/// and which claims to disclose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFilter {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_all: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_claims: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_claims: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_issuers: Option<Vec<String>>,
}

impl SchemaFilter {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            schema_type: None,
            present_all: None,
            display_claims: None,
            required_claims: None,
            allowed_issuers: None,
        }
    }

    pub fn with_required_claims(mut self, claims: &[&str]) -> Self {
        self.required_claims = Some(claims.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_allowed_issuers(mut self, issuers: &[&str]) -> Self {
        self.allowed_issuers = Some(issuers.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_present_all(mut self) -> Self {
        self.present_all = Some(true);
        self
    }

    /// An absent allow-list admits every issuer.
    pub fn allows_issuer(&self, issuer: &str) -> bool {
        self.allowed_issuers
            .as_ref()
            .map_or(true, |allowed| allowed.iter().any(|a| a == issuer))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFilter {
    pub credential_schemas: NonEmptyVec<SchemaFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyProfileBody {
    pub verifier: ProviderDetail,
    pub filter: ProfileFilter,
    pub process: Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyProfile {
    #[serde(flatten)]
    pub header: ProfileHeader,
    pub profile: VerifyProfileBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProfileProof>,
}

impl VerifyProfile {
    pub fn schema_filters(&self) -> &[SchemaFilter] {
        &self.profile.filter.credential_schemas
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestProfileResponse {
    pub tx_id: String,
    pub profile: VerifyProfile,
}

// ---- zero-knowledge proof request ----

/// Restriction on the credentials that may back a referent (e.g. `schemaId`, `credDefId`).
pub type Restriction = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeInfo {
    pub name: String,
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PredicateInfo {
    pub name: String,
    pub p_type: String,
    pub p_value: i64,
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    pub name: String,
    pub version: String,
    pub nonce: String,
    #[serde(default)]
    pub requested_attributes: BTreeMap<String, AttributeInfo>,
    #[serde(default)]
    pub requested_predicates: BTreeMap<String, PredicateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequestProfileBody {
    pub verifier: ProviderDetail,
    pub proof_request: ProofRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub req_e2e: Option<Json>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequestProfile {
    #[serde(flatten)]
    pub header: ProfileHeader,
    pub profile: ProofRequestProfileBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProfileProof>,
}

impl ProofRequestProfile {
    pub fn proof_request(&self) -> &ProofRequest {
        &self.profile.proof_request
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestProofRequestProfileResponse {
    pub tx_id: String,
    pub proof_request_profile: ProofRequestProfile,
}

impl TxResponse for RequestProfileResponse {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}

impl TxResponse for RequestProofRequestProfileResponse {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}
