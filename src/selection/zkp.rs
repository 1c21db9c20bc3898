use std::collections::{BTreeMap, BTreeSet};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::BaseUrl,
    core::{
        credential::{
            AttrReferent, AvailableReferent, ReferentKind, StatusMap, SubReferent, UserReferent,
            ZkProofParam, ZkpCredentialDefinition, ZkpCredentialSchema,
        },
        endpoint, multibase,
        profile::ProofRequest,
        transport::ServiceClient,
    },
    error::{Error, ReferentSection, Result},
    status,
    utils::to_display_label,
    wallet::WalletCore,
};

/// Candidates for a proof request, narrowed to active credentials, together with every schema
/// and credential definition they reference.
#[derive(Debug, Clone, Default)]
pub struct EligibleReferents {
    pub available: AvailableReferent,
    pub schemas: BTreeMap<String, ZkpCredentialSchema>,
    pub definitions: BTreeMap<String, ZkpCredentialDefinition>,
    captions: BTreeMap<String, String>,
}

impl EligibleReferents {
    pub fn new(
        available: AvailableReferent,
        schemas: BTreeMap<String, ZkpCredentialSchema>,
        definitions: BTreeMap<String, ZkpCredentialDefinition>,
    ) -> Self {
        let captions = schemas
            .values()
            .flat_map(|schema| schema.captions())
            .map(|(key, caption)| (key, caption.to_owned()))
            .collect();

        Self {
            available,
            schemas,
            definitions,
            captions,
        }
    }

    /// Display name of a referent: the schema caption when known, otherwise a label derived
    /// from the name itself.
    pub fn caption(&self, referent_name: &str) -> String {
        self.captions
            .get(referent_name)
            .cloned()
            .unwrap_or_else(|| to_display_label(referent_name))
    }
}

/// The user's choices for each referent, keyed by referent key. Indices refer to the
/// candidates of [EligibleReferents], after inactive credentials were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferentSelection {
    pub attributes: BTreeMap<String, AttributeChoice>,
    /// Chosen candidate index per predicate.
    pub predicates: BTreeMap<String, usize>,
    pub self_attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeChoice {
    pub index: usize,
    pub revealed: bool,
}

impl ReferentSelection {
    pub fn attribute(mut self, key: impl Into<String>, index: usize, revealed: bool) -> Self {
        self.attributes
            .insert(key.into(), AttributeChoice { index, revealed });
        self
    }

    pub fn predicate(mut self, key: impl Into<String>, index: usize) -> Self {
        self.predicates.insert(key.into(), index);
        self
    }

    pub fn self_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.self_attributes.insert(key.into(), value.into());
        self
    }
}

/// Drop every candidate whose credential is not active. A referent left without candidates
/// fails with [Error::NoEligibleAttribute].
pub fn retain_active(mut available: AvailableReferent, statuses: &StatusMap) -> Result<AvailableReferent> {
    let sections = [
        &mut available.attr_referent,
        &mut available.predicate_referent,
    ];

    for referents in sections {
        for referent in referents.iter_mut() {
            referent
                .referent
                .retain(|candidate| statuses.get(&candidate.cred_id).is_some_and(|s| s.is_active()));

            if referent.referent.is_empty() {
                warn!(referent = %referent.name, "no active credential for referent");
                return Err(Error::NoEligibleAttribute(referent.name.clone()));
            }
        }
    }

    Ok(available)
}

fn candidates(available: &AvailableReferent) -> impl Iterator<Item = &SubReferent> {
    available
        .attr_referent
        .iter()
        .chain(&available.predicate_referent)
        .flat_map(|referent| &referent.referent)
}

#[derive(Debug, Serialize)]
struct IdQuery<'a> {
    id: &'a str,
}

/// Gateway envelopes; the documents are multibase-encoded JSON.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaResponse {
    cred_schema: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionResponse {
    cred_def: String,
}

fn decode_document<T: DeserializeOwned>(what: &'static str, encoded: &str) -> Result<T> {
    let bytes = multibase::decode(encoded)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::decode(what, e))
}

pub async fn zkp_credential_schema(
    service: &ServiceClient,
    api_gateway: &BaseUrl,
    id: &str,
    cancel: &CancellationToken,
) -> Result<ZkpCredentialSchema> {
    let response: SchemaResponse = service
        .get(
            api_gateway.endpoint(endpoint::ZKP_CREDENTIAL_SCHEMA)?,
            &IdQuery { id },
            cancel,
        )
        .await?;
    decode_document("zkp credential schema", &response.cred_schema)
}

pub async fn zkp_credential_definition(
    service: &ServiceClient,
    api_gateway: &BaseUrl,
    id: &str,
    cancel: &CancellationToken,
) -> Result<ZkpCredentialDefinition> {
    let response: DefinitionResponse = service
        .get(
            api_gateway.endpoint(endpoint::ZKP_CREDENTIAL_DEFINITION)?,
            &IdQuery { id },
            cancel,
        )
        .await?;
    decode_document("zkp credential definition", &response.cred_def)
}

/// Find the candidates for `proof_request`, keep those backed by active credentials and
/// resolve every referenced schema and credential definition once.
pub async fn select_referents(
    service: &ServiceClient,
    api_gateway: &BaseUrl,
    wallet: &dyn WalletCore,
    wallet_token: &str,
    proof_request: &ProofRequest,
    cancel: &CancellationToken,
) -> Result<EligibleReferents> {
    let available = wallet
        .search_zkp_credentials(wallet_token, proof_request)
        .await?;

    let statuses = status::statuses(
        service,
        api_gateway,
        candidates(&available).map(|c| c.cred_id.as_str()),
        cancel,
    )
    .await?;
    let available = retain_active(available, &statuses)?;

    let schema_ids: BTreeSet<&str> = candidates(&available).map(|c| c.schema_id.as_str()).collect();
    let definition_ids: BTreeSet<&str> =
        candidates(&available).map(|c| c.cred_def_id.as_str()).collect();

    let mut schemas = BTreeMap::new();
    for id in schema_ids {
        let schema = zkp_credential_schema(service, api_gateway, id, cancel).await?;
        schemas.insert(id.to_owned(), schema);
    }

    let mut definitions = BTreeMap::new();
    for id in definition_ids {
        let definition = zkp_credential_definition(service, api_gateway, id, cancel).await?;
        definitions.insert(id.to_owned(), definition);
    }

    debug!(
        schemas = schemas.len(),
        definitions = definitions.len(),
        "resolved zkp metadata"
    );
    Ok(EligibleReferents::new(available, schemas, definitions))
}

fn bind_candidate(
    eligible: &EligibleReferents,
    param: &mut ZkProofParam,
    section: ReferentSection,
    referent: &AttrReferent,
    index: Option<usize>,
    revealed: bool,
) -> Result<UserReferent> {
    let Some((index, candidate)) = index.and_then(|i| referent.referent.get(i).map(|c| (i, c)))
    else {
        return Err(Error::MissingSelection {
            section,
            name: referent.name.clone(),
        });
    };

    if let Some(schema) = eligible.schemas.get(&candidate.schema_id) {
        param
            .schemas
            .insert(candidate.schema_id.clone(), schema.clone());
    }
    if let Some(definition) = eligible.definitions.get(&candidate.cred_def_id) {
        param
            .cre_defs
            .insert(candidate.cred_def_id.clone(), definition.clone());
    }

    Ok(UserReferent {
        kind: match section {
            ReferentSection::Predicates => ReferentKind::Predicate,
            _ => ReferentKind::Attribute,
        },
        referent_key: referent.key.clone(),
        referent_name: referent.name.clone(),
        raw: candidate.raw.clone(),
        credential: Some(candidate.clone()),
        selected_index: Some(index),
        is_revealed: revealed,
    })
}

/// Bind every referent to the user's choice.
///
/// Referents are bound in request order: attributes, then predicates, then self-attested
/// attributes. The first attribute or predicate without a valid choice fails with
/// [Error::MissingSelection]. Self-attested attributes left empty are omitted. Predicates are
/// never revealed.
pub fn bind_referents(
    eligible: &EligibleReferents,
    selection: &ReferentSelection,
) -> Result<(Vec<UserReferent>, ZkProofParam)> {
    let mut param = ZkProofParam::default();
    let mut bound = Vec::new();

    for referent in &eligible.available.attr_referent {
        let choice = selection.attributes.get(&referent.key);
        bound.push(bind_candidate(
            eligible,
            &mut param,
            ReferentSection::Attributes,
            referent,
            choice.map(|c| c.index),
            choice.is_some_and(|c| c.revealed),
        )?);
    }

    for referent in &eligible.available.predicate_referent {
        bound.push(bind_candidate(
            eligible,
            &mut param,
            ReferentSection::Predicates,
            referent,
            selection.predicates.get(&referent.key).copied(),
            false,
        )?);
    }

    for referent in &eligible.available.self_attr_referent {
        let Some(raw) = selection
            .self_attributes
            .get(&referent.key)
            .filter(|raw| !raw.is_empty())
        else {
            continue;
        };

        bound.push(UserReferent {
            kind: ReferentKind::SelfAttested,
            referent_key: referent.key.clone(),
            referent_name: referent.name.clone(),
            raw: raw.clone(),
            credential: None,
            selected_index: None,
            is_revealed: true,
        });
    }

    Ok((bound, param))
}
