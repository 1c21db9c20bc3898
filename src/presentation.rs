//! Packaging of selected claims or bound referents into the encrypted payload submitted to the
//! verifier.

use tracing::debug;

use crate::{
    core::{
        credential::{ClaimInfo, ReferentKind, UserReferent, ZkProofParam},
        message::verify::AccE2e,
        multibase::{self, Base},
        profile::{ProofRequest, ProofRequestProfile, VerifyProfile},
    },
    error::{Error, ReferentSection, Result},
    wallet::WalletCore,
};

/// What the user agreed to disclose.
#[derive(Debug, Clone)]
pub enum Selection {
    Claims(Vec<ClaimInfo>),
    Referents {
        referents: Vec<UserReferent>,
        param: ZkProofParam,
    },
}

/// The profile the selection answers.
#[derive(Debug, Clone, Copy)]
pub enum PresentationProfile<'a> {
    Verify(&'a VerifyProfile),
    ProofRequest(&'a ProofRequestProfile),
}

/// Encrypted presentation (`encVp`) or proof (`encProof`), multibase encoded, with its E2E
/// accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub acc_e2e: AccE2e,
    pub payload: String,
}

/// Build and encrypt the presentation for `selection`.
///
/// Claims are presented as a verifiable presentation, base58 encoded. Referents are presented
/// as a zero-knowledge proof, base64 encoded; every restricted attribute and every predicate
/// of the proof request must be bound.
pub async fn assemble_presentation(
    wallet: &dyn WalletCore,
    wallet_token: &str,
    selection: &Selection,
    profile: PresentationProfile<'_>,
    passcode: Option<&str>,
) -> Result<EncryptedPayload> {
    match (selection, profile) {
        (Selection::Claims(claim_infos), PresentationProfile::Verify(profile)) => {
            if claim_infos.is_empty() {
                return Err(Error::InsufficientClaim);
            }
            let encrypted = wallet
                .create_enc_vp(wallet_token, claim_infos, profile, passcode)
                .await?;
            debug!(credentials = claim_infos.len(), "verifiable presentation assembled");
            Ok(EncryptedPayload {
                acc_e2e: encrypted.acc_e2e,
                payload: multibase::encode(Base::Base58Btc, encrypted.ciphertext),
            })
        }
        (Selection::Referents { referents, param }, PresentationProfile::ProofRequest(profile)) => {
            let referents = checked_referents(referents, profile.proof_request())?;
            let encrypted = wallet
                .create_enc_zk_proof(wallet_token, &referents, param, profile)
                .await?;
            debug!(referents = referents.len(), "zero-knowledge proof assembled");
            Ok(EncryptedPayload {
                acc_e2e: encrypted.acc_e2e,
                payload: multibase::encode(Base::Base64, encrypted.ciphertext),
            })
        }
        _ => Err(Error::encoding(
            "presentation",
            "selection does not answer the profile type",
        )),
    }
}

/// Ensure every restricted attribute and every predicate is bound, and that predicates stay
/// hidden. Unrestricted attributes may be self-attested and left out.
///
/// This is a backstop for referents bound outside [bind_referents], which already reports the
/// first missing referent in candidate order. Here the request is walked in referent key order.
///
/// [bind_referents]: crate::selection::bind_referents
fn checked_referents(
    referents: &[UserReferent],
    proof_request: &ProofRequest,
) -> Result<Vec<UserReferent>> {
    let bound = |key: &str, kinds: &[ReferentKind]| {
        referents
            .iter()
            .any(|r| r.referent_key == key && kinds.contains(&r.kind))
    };

    for (key, attribute) in &proof_request.requested_attributes {
        if attribute.restrictions.is_empty() {
            continue;
        }
        if !bound(key, &[ReferentKind::Attribute, ReferentKind::SelfAttested]) {
            return Err(Error::MissingSelection {
                section: ReferentSection::Attributes,
                name: attribute.name.clone(),
            });
        }
    }

    for (key, predicate) in &proof_request.requested_predicates {
        if !bound(key, &[ReferentKind::Predicate]) {
            return Err(Error::MissingSelection {
                section: ReferentSection::Predicates,
                name: predicate.name.clone(),
            });
        }
    }

    Ok(referents
        .iter()
        .cloned()
        .map(|mut r| {
            if r.kind == ReferentKind::Predicate {
                r.is_revealed = false;
            }
            r
        })
        .collect())
}
