//! Credential selection against a verifier's request.
//!
//! Plain presentations select whole claims from held credentials ([select_claims]).
//! Zero-knowledge presentations select candidate values per referent ([zkp]).

use tracing::{debug, warn};

use crate::{
    core::{
        credential::{ClaimInfo, StatusMap, VerifiableCredential},
        profile::SchemaFilter,
    },
    error::{Error, Result},
};

pub mod zkp;

pub use zkp::{bind_referents, retain_active, select_referents, AttributeChoice, EligibleReferents, ReferentSelection};

/// Select the claims to disclose.
///
/// Filters are tried in profile order. A credential qualifies for a filter when its schema
/// matches, its issuer is allowed and its status in `statuses` is active. The first qualifying
/// credential of the first filter that has one is selected, and the remaining filters are not
/// consulted. Fails with [Error::InsufficientClaim] when no filter has a qualifying credential.
pub fn select_claims(
    filters: &[SchemaFilter],
    credentials: &[VerifiableCredential],
    statuses: &StatusMap,
) -> Result<Vec<ClaimInfo>> {
    for filter in filters {
        let claim_info = credentials
            .iter()
            .filter(|vc| vc.credential_schema.id == filter.id)
            .filter(|vc| filter.allows_issuer(&vc.issuer.id))
            .filter(|vc| statuses.get(&vc.id).is_some_and(|s| s.is_active()))
            .find_map(|vc| disclosed_claims(filter, vc));

        match claim_info {
            Some(claim_info) => {
                debug!(schema = %filter.id, credential_id = %claim_info.credential_id, "credential selected");
                return Ok(vec![claim_info]);
            }
            None => debug!(schema = %filter.id, "no credential satisfies filter"),
        }
    }

    warn!(filters = filters.len(), "no credential satisfies any filter");
    Err(Error::InsufficientClaim)
}

fn disclosed_claims(filter: &SchemaFilter, vc: &VerifiableCredential) -> Option<ClaimInfo> {
    let claim_codes = if filter.present_all == Some(true) {
        vc.claim_codes().map(str::to_owned).collect()
    } else if let Some(required) = filter.required_claims.as_ref().filter(|r| !r.is_empty()) {
        let satisfied = required
            .iter()
            .all(|code| vc.claim_codes().any(|held| held == code));
        if !satisfied {
            return None;
        }
        required.clone()
    } else {
        vec![vc.claim_codes().next()?.to_owned()]
    };

    Some(ClaimInfo {
        credential_id: vc.id.clone(),
        claim_codes,
    })
}
