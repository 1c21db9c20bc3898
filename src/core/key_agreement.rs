//! ECDH key agreement with the trust-anchor service.
//!
//! The wallet proposes an ephemeral secp256r1 public key and a random client nonce, signed with
//! its long-term `keyagree` key. The service answers with its own ephemeral key and nonce, from
//! which [token](super::token) later derives the session key.

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info};

use super::{
    crypto::{random_bytes, sha256, Curve, EphemeralKeyPair, SymmetricCipher, CLIENT_NONCE_SIZE},
    endpoint,
    message::{
        message_id,
        token::{EcdhCandidate, Proof, ReqEcdh, RequestEcdh, RequestEcdhResponse},
    },
    multibase,
    transport::ServiceClient,
};
use crate::{
    config::BaseUrl,
    error::{Error, Result},
    transaction::TransactionContext,
    wallet::{DidDocument, DidDocumentKind, WalletCore},
};

pub const KEY_AGREEMENT_KEY_ID: &str = "keyagree";
pub const PROOF_TYPE: &str = "Secp256r1Signature2018";
pub const PROOF_PURPOSE: &str = "keyAgreement";

/// The service's half of the exchange.
#[derive(Debug, Clone)]
pub struct EcdhResult {
    pub server_public_key: Vec<u8>,
    pub server_nonce: Vec<u8>,
    pub cipher: SymmetricCipher,
}

/// Unsigned ECDH proposal for `did_document`. The proof carries no `proofValue` yet.
pub fn unsigned_request(
    did_document: &DidDocument,
    key_pair: &EphemeralKeyPair,
    client_nonce: &[u8],
) -> ReqEcdh {
    ReqEcdh {
        client: did_document.id.clone(),
        client_nonce: multibase::encode_base58(client_nonce),
        curve: Curve::Secp256r1,
        public_key: multibase::encode_base58(key_pair.public_key_bytes()),
        candidate: EcdhCandidate {
            ciphers: vec![SymmetricCipher::Aes256Cbc],
        },
        proof: Proof {
            proof_type: PROOF_TYPE.into(),
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            verification_method: did_document.verification_method(KEY_AGREEMENT_KEY_ID),
            proof_purpose: PROOF_PURPOSE.into(),
            proof_value: None,
        },
    }
}

/// SHA-256 over the JSON serialization of the unsigned proposal.
pub fn signing_digest(request: &ReqEcdh) -> Result<[u8; 32]> {
    serde_json::to_vec(request)
        .map(sha256)
        .map_err(|e| Error::encoding("ecdh request", e))
}

/// Run the key agreement for the transaction held in `ctx`.
///
/// Stores the client nonce, the ephemeral key pair and the server nonce in `ctx`.
pub async fn perform_key_agreement(
    service: &ServiceClient,
    tas: &BaseUrl,
    wallet: &dyn WalletCore,
    ctx: &mut TransactionContext,
    document_kind: DidDocumentKind,
) -> Result<EcdhResult> {
    let did_document = wallet.did_document(document_kind).await?;

    let (key_pair, client_nonce) = tokio::task::spawn_blocking(|| {
        (EphemeralKeyPair::generate(), random_bytes(CLIENT_NONCE_SIZE))
    })
    .await
    .map_err(|e| Error::Crypto(format!("key generation task failed: {e}")))?;

    let mut req_ecdh = unsigned_request(&did_document, &key_pair, &client_nonce);
    let digest = signing_digest(&req_ecdh)?;
    let signature = wallet
        .sign(document_kind, KEY_AGREEMENT_KEY_ID, &digest)
        .await?;
    req_ecdh.proof.proof_value = Some(multibase::encode_base58(signature));

    debug!(tx_id = %ctx.tx_id, client = %req_ecdh.client, "requesting ecdh");
    let response: RequestEcdhResponse = service
        .post(
            tas.endpoint(endpoint::REQUEST_ECDH)?,
            &RequestEcdh {
                id: message_id(),
                tx_id: ctx.tx_id.clone(),
                req_ecdh,
            },
            ctx.cancellation_token(),
        )
        .await?;
    ctx.check_tx_id(&response)?;

    let acc = response.acc_ecdh;
    let server_nonce = multibase::decode(&acc.server_nonce)?;
    if server_nonce == client_nonce {
        return Err(Error::NonceReuse);
    }
    let server_public_key = multibase::decode(&acc.public_key)?;

    info!(tx_id = %ctx.tx_id, server = %acc.server, cipher = ?acc.cipher, "key agreed");
    ctx.client_nonce = Some(client_nonce);
    ctx.key_pair = Some(key_pair);
    ctx.server_nonce = Some(server_nonce.clone());

    Ok(EcdhResult {
        server_public_key,
        server_nonce,
        cipher: acc.cipher,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::{json, Map};

    fn document() -> DidDocument {
        DidDocument {
            id: "did:omn:device".into(),
            version_id: "1".into(),
            rest: Map::new(),
        }
    }

    #[test]
    fn proposal_shape() {
        let key_pair = EphemeralKeyPair::generate();
        let nonce = [7u8; CLIENT_NONCE_SIZE];
        let request = unsigned_request(&document(), &key_pair, &nonce);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["client"], "did:omn:device");
        assert_eq!(json["curve"], "Secp256r1");
        assert_eq!(json["candidate"], json!({ "ciphers": ["AES-256-CBC"] }));
        assert_eq!(json["proof"]["verificationMethod"], "did:omn:device?versionId=1#keyagree");
        assert_eq!(json["proof"]["proofPurpose"], "keyAgreement");
        assert!(json["proof"].get("proofValue").is_none());
        assert!(request.proof.created.ends_with('Z'));

        assert_eq!(multibase::decode(&request.client_nonce).unwrap(), nonce);
        assert_eq!(
            multibase::decode(&request.public_key).unwrap(),
            key_pair.public_key_bytes()
        );
    }

    #[test]
    fn digest_covers_request_fields() {
        let key_pair = EphemeralKeyPair::generate();
        let mut request = unsigned_request(&document(), &key_pair, &[1u8; 16]);
        let before = signing_digest(&request).unwrap();
        assert_eq!(before, signing_digest(&request.clone()).unwrap());

        request.client_nonce = multibase::encode_base58([2u8; 16]);
        assert_ne!(before, signing_digest(&request).unwrap());
    }
}
