//! Credentials held by the wallet and the selection units built from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Live status of a credential, as published by the issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VcStatus {
    Active,
    Inactive,
    Revoked,
    #[serde(other)]
    Unknown,
}

impl VcStatus {
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// Credential status keyed by credential id.
pub type StatusMap = BTreeMap<String, VcStatus>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    Text,
    Image,
    Document,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub code: String,
    pub caption: String,
    pub value: String,
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    pub id: String,
    pub claims: Vec<Claim>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSchemaRef {
    pub id: String,
    #[serde(rename = "type")]
    pub schema_type: String,
}

/// A verifiable credential held by the wallet. Only the fields selection needs are typed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    pub id: String,
    pub issuer: Issuer,
    pub credential_schema: CredentialSchemaRef,
    pub credential_subject: CredentialSubject,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Json>,
}

impl VerifiableCredential {
    pub fn claim_codes(&self) -> impl Iterator<Item = &str> {
        self.credential_subject.claims.iter().map(|c| c.code.as_str())
    }
}

/// A plain-claim selection: which claims of one credential are disclosed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimInfo {
    pub credential_id: String,
    pub claim_codes: Vec<String>,
}

/// Credential metadata document published through the API gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcMeta {
    #[serde(default)]
    pub id: Option<String>,
    pub status: VcStatus,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Json>,
}

// ---- zero-knowledge credentials ----

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDef {
    pub label: String,
    pub caption: String,
    #[serde(rename = "type")]
    pub attr_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeType {
    pub namespace: Namespace,
    pub items: Vec<AttributeDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ZkpCredentialSchema {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub attr_names: Vec<String>,
    #[serde(default)]
    pub attr_types: Vec<AttributeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl ZkpCredentialSchema {
    /// Attribute captions keyed by `<namespace>.<label>`.
    pub fn captions(&self) -> impl Iterator<Item = (String, &str)> {
        self.attr_types.iter().flat_map(|t| {
            t.items
                .iter()
                .map(move |item| (format!("{}.{}", t.namespace.id, item.label), item.caption.as_str()))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZkpCredentialDefinition {
    pub id: String,
    pub schema_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub value: Json,
}

/// One credential-backed candidate value for a referent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubReferent {
    pub raw: String,
    pub cred_id: String,
    pub schema_id: String,
    pub cred_def_id: String,
}

/// A named proof requirement and the candidates that can satisfy it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttrReferent {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub referent: Vec<SubReferent>,
}

/// Candidates found by the wallet for a proof request, in request order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailableReferent {
    #[serde(default)]
    pub attr_referent: Vec<AttrReferent>,
    #[serde(default)]
    pub predicate_referent: Vec<AttrReferent>,
    #[serde(default)]
    pub self_attr_referent: Vec<AttrReferent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferentKind {
    Attribute,
    Predicate,
    SelfAttested,
}

/// A referent bound to the user's choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserReferent {
    pub kind: ReferentKind,
    pub referent_key: String,
    pub referent_name: String,
    pub raw: String,
    /// Chosen candidate; absent for self-attested values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<SubReferent>,
    /// Position of `credential` among the referent's active candidates, not the wallet's
    /// unfiltered search result. `credential` identifies the choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_index: Option<usize>,
    /// Whether the raw value is disclosed. Always false for predicates.
    pub is_revealed: bool,
}

/// Schemas and credential definitions required to build a proof.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZkProofParam {
    pub schemas: BTreeMap<String, ZkpCredentialSchema>,
    pub cre_defs: BTreeMap<String, ZkpCredentialDefinition>,
}
