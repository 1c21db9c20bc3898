#![allow(dead_code)]

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{bail, Context};
use async_trait::async_trait;
use did_wallet_protocol::{
    config::Config,
    core::{
        credential::{
            AvailableReferent, ClaimInfo, UserReferent, VerifiableCredential, ZkProofParam,
        },
        crypto::{
            encrypt, merge_nonce, merge_shared_secret_and_nonce, random_bytes, EphemeralKeyPair,
            SymmetricCipher, IV_SIZE,
        },
        message::{
            did::{DidAuth, SignedDidDoc},
            token::TokenPurpose,
            vc::AuthType,
            verify::AccE2e,
        },
        multibase::{self, Base},
        profile::{IssueProfile, ProofRequest, ProofRequestProfile, VerifyProfile},
        util::AsyncHttpClient,
    },
    error::{Error, Result, AUTHENTICATION_FAILED},
    transaction::{AuthPrompt, TransactionClient},
    wallet::{DidDocument, DidDocumentKind, EncryptedPresentation, WalletCore},
};
use http::{Request, Response};
use serde_json::{json, Map, Value as Json};

pub const PASSCODE: &str = "123456";
pub const USER_ID: &str = "user-1";
pub const TX_ID: &str = "tx-0001";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config() -> Config {
    Config::new(
        "http://tas.test",
        "http://verifier.test",
        "http://cas.test",
        "http://gateway.test",
        "app-1",
        USER_ID,
    )
    .unwrap()
}

pub fn client(services: &Arc<MockServices>, wallet: &Arc<MockWallet>) -> TransactionClient {
    init_tracing();
    TransactionClient::builder()
        .with_config(config())
        .with_http_client(services.clone())
        .with_wallet(wallet.clone())
        .with_request_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

// ---- remote services ----

#[derive(Default)]
struct ServiceState {
    session_key: Option<Vec<u8>>,
    confirm_tx_id: Option<String>,
    statuses: BTreeMap<String, &'static str>,
    failures: BTreeMap<&'static str, (u16, Json)>,
    hanging: BTreeSet<&'static str>,
    echo_client_nonce: bool,
    requests: Vec<(String, Json)>,
}

/// Trust-anchor, certificate-app, verifier and gateway services, routed by the last path
/// segment. Key agreement and token encryption are performed for real.
pub struct MockServices {
    pub tx_id: String,
    pub server_token_data: Vec<u8>,
    server_key: EphemeralKeyPair,
    server_nonce: Vec<u8>,
    state: Mutex<ServiceState>,
}

impl Default for MockServices {
    fn default() -> Self {
        Self {
            tx_id: TX_ID.into(),
            server_token_data: b"{\"sti\":\"server-token-info\"}".to_vec(),
            server_key: EphemeralKeyPair::generate(),
            server_nonce: random_bytes(16),
            state: Mutex::default(),
        }
    }
}

impl MockServices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_status(&self, vc_id: &str, status: &'static str) {
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert(vc_id.into(), status);
    }

    /// Answer confirmations with another transaction id.
    pub fn set_confirm_tx_id(&self, tx_id: &str) {
        self.state.lock().unwrap().confirm_tx_id = Some(tx_id.into());
    }

    pub fn fail(&self, route: &'static str, status: u16, body: Json) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(route, (status, body));
    }

    /// Answer key agreement with the client's own nonce.
    pub fn echo_client_nonce(&self) {
        self.state.lock().unwrap().echo_client_nonce = true;
    }

    /// Never answer `route`.
    pub fn hang(&self, route: &'static str) {
        self.state.lock().unwrap().hanging.insert(route);
    }

    pub fn requests(&self, route: &str) -> Vec<Json> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(r, _)| r == route)
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub fn routes(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|(r, _)| r.clone())
            .collect()
    }

    fn respond(&self, route: &str, query: &BTreeMap<String, String>, body: &Json) -> anyhow::Result<Json> {
        let tx_id = self.tx_id.as_str();
        Ok(match route {
            "propose-register-user" => json!({ "txId": tx_id }),
            "propose-restore-diddoc" | "propose-update-diddoc" => {
                json!({ "txId": tx_id, "authNonce": "mAuthNonce" })
            }
            "propose-revoke-vc" => json!({
                "txId": tx_id,
                "issuerNonce": "zIssuerNonce",
                "authType": AuthType::PIN | AuthType::BIO,
            }),
            "propose-issue-vc" => json!({ "txId": tx_id, "refId": "ref-1" }),
            "request-ecdh" => self.accept_ecdh(body)?,
            "request-attested-appinfo" => json!({
                "appId": body["appId"],
                "provider": { "did": "did:omn:cas", "certVcRef": "http://cas.test/cert" },
                "nonce": "zAppNonce",
                "proof": { "type": "Secp256r1Signature2018" },
            }),
            "request-create-token" => self.create_token()?,
            "request-issue-profile" => json!({
                "txId": tx_id,
                "authNonce": "mIssueNonce",
                "profile": issue_profile(),
            }),
            "request-issue-vc" => json!({
                "txId": tx_id,
                "e2e": { "iv": "z1", "encVc": "zEncryptedVc" },
            }),
            "confirm-register-user" | "confirm-restore-diddoc" | "confirm-update-diddoc"
            | "confirm-revoke-vc" | "confirm-issue-vc" => {
                let confirm = self.state.lock().unwrap().confirm_tx_id.clone();
                json!({ "txId": confirm.as_deref().unwrap_or(tx_id) })
            }
            "request-profile" => json!({ "txId": tx_id, "profile": verify_profile() }),
            "request-proof-request-profile" => json!({
                "txId": tx_id,
                "proofRequestProfile": proof_request_profile(),
            }),
            "vc-meta" => {
                let vc_id = query.get("vcId").context("missing vcId")?;
                let status = self
                    .state
                    .lock()
                    .unwrap()
                    .statuses
                    .get(vc_id)
                    .copied()
                    .unwrap_or("ACTIVE");
                let meta = json!({ "id": vc_id, "status": status });
                json!({ "vcMeta": multibase::encode(Base::Base58Btc, serde_json::to_vec(&meta)?) })
            }
            "zkp-cred-schema" => {
                let id = query.get("id").context("missing id")?;
                json!({ "credSchema": multibase::encode(Base::Base64, serde_json::to_vec(&zkp_schema(id))?) })
            }
            "zkp-cred-def" => {
                let id = query.get("id").context("missing id")?;
                let definition = json!({ "id": id, "schemaId": "schema-zkp", "value": {} });
                json!({ "credDef": multibase::encode(Base::Base64, serde_json::to_vec(&definition)?) })
            }
            "retrieve-kyc" | "request-register-user" | "request-restore-diddoc"
            | "request-update-diddoc" | "request-revoke-vc" | "request-verify"
            | "request-verify-proof" => json!({ "txId": tx_id }),
            other => bail!("unexpected route {other}"),
        })
    }

    fn accept_ecdh(&self, body: &Json) -> anyhow::Result<Json> {
        let req_ecdh = &body["reqEcdh"];
        let client_public_key =
            multibase::decode(req_ecdh["publicKey"].as_str().context("missing publicKey")?)?;
        let client_nonce =
            multibase::decode(req_ecdh["clientNonce"].as_str().context("missing clientNonce")?)?;

        let server_nonce = if self.state.lock().unwrap().echo_client_nonce {
            client_nonce.clone()
        } else {
            self.server_nonce.clone()
        };

        let shared_secret = self.server_key.shared_secret(&client_public_key)?;
        let merged = merge_nonce(&client_nonce, &server_nonce);
        self.state.lock().unwrap().session_key = Some(merge_shared_secret_and_nonce(
            &shared_secret,
            &merged,
            SymmetricCipher::Aes256Cbc,
        ));

        Ok(json!({
            "txId": self.tx_id,
            "accEcdh": {
                "server": "did:omn:tas",
                "serverNonce": multibase::encode(Base::Base58Btc, &server_nonce),
                "publicKey": multibase::encode(Base::Base58Btc, self.server_key.public_key_bytes()),
                "cipher": "AES-256-CBC",
                "padding": "PKCS5",
            },
        }))
    }

    fn create_token(&self) -> anyhow::Result<Json> {
        let key = self
            .state
            .lock()
            .unwrap()
            .session_key
            .clone()
            .context("no key agreed")?;
        let iv = random_bytes(IV_SIZE);
        let enc_std = encrypt(SymmetricCipher::Aes256Cbc, &key, &iv, &self.server_token_data)?;

        Ok(json!({
            "txId": self.tx_id,
            "iv": multibase::encode(Base::Base58Btc, iv),
            "encStd": multibase::encode(Base::Base58Btc, enc_std),
        }))
    }
}

#[async_trait]
impl AsyncHttpClient for MockServices {
    async fn execute(&self, request: Request<Vec<u8>>) -> anyhow::Result<Response<Vec<u8>>> {
        let route = request
            .uri()
            .path()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_owned();
        let query: BTreeMap<String, String> =
            serde_urlencoded::from_str(request.uri().query().unwrap_or_default())?;
        let body: Json = if request.body().is_empty() {
            Json::Null
        } else {
            serde_json::from_slice(request.body())?
        };

        let (failure, hanging) = {
            let mut state = self.state.lock().unwrap();
            state.requests.push((route.clone(), body.clone()));
            (
                state.failures.get(route.as_str()).cloned(),
                state.hanging.contains(route.as_str()),
            )
        };

        if hanging {
            std::future::pending::<()>().await;
        }

        let (status, response) = match failure {
            Some(failure) => failure,
            None => (200, self.respond(&route, &query, &body)?),
        };

        Ok(Response::builder()
            .status(status)
            .body(serde_json::to_vec(&response)?)?)
    }
}

pub fn verify_profile() -> Json {
    json!({
        "id": "profile-vp",
        "type": "VerifyProfile",
        "title": "Present your licence",
        "profile": {
            "verifier": { "did": "did:omn:verifier", "certVcRef": "http://verifier.test/cert", "name": "Verifier" },
            "filter": {
                "credentialSchemas": [
                    { "id": "schema-mdl", "type": "OsdSchemaCredential", "requiredClaims": ["name"] }
                ]
            },
            "process": { "endpoints": ["http://verifier.test"] }
        }
    })
}

pub fn proof_request_profile() -> Json {
    json!({
        "id": "profile-zkp",
        "type": "ProofRequestProfile",
        "title": "Prove your age",
        "profile": {
            "verifier": { "did": "did:omn:verifier", "certVcRef": "http://verifier.test/cert", "name": "Verifier" },
            "proofRequest": {
                "name": "age",
                "version": "1.0",
                "nonce": "1234567890",
                "requestedAttributes": {
                    "attr_1": { "name": "zkp.name", "restrictions": [{ "credDefId": "def-zkp" }] }
                },
                "requestedPredicates": {
                    "pred_1": { "name": "zkp.birth_date", "pType": "LE", "pValue": 20050101 }
                }
            }
        }
    })
}

pub fn issue_profile() -> Json {
    json!({
        "id": "profile-issue",
        "type": "IssueProfile",
        "title": "Mobile licence",
        "profile": {
            "issuer": { "did": "did:omn:issuer", "certVcRef": "http://issuer.test/cert", "name": "Issuer" },
            "credentialSchema": { "id": "schema-mdl", "type": "OsdSchemaCredential" },
            "process": { "endpoints": ["http://issuer.test"] }
        }
    })
}

fn zkp_schema(id: &str) -> Json {
    json!({
        "id": id,
        "name": "age",
        "version": "1.0",
        "attrNames": ["zkp.name", "zkp.birth_date"],
        "attrTypes": [{
            "namespace": { "id": "zkp", "name": "ZKP" },
            "items": [
                { "label": "name", "caption": "Full name", "type": "String" },
                { "label": "birth_date", "caption": "Date of birth", "type": "Number" }
            ]
        }]
    })
}

pub fn credential(id: &str, schema: &str, claims: &[&str]) -> VerifiableCredential {
    let claims: Vec<_> = claims
        .iter()
        .map(|code| json!({ "code": code, "caption": code, "value": "v", "type": "text" }))
        .collect();
    serde_json::from_value(json!({
        "id": id,
        "issuer": { "id": "did:omn:issuer" },
        "credentialSchema": { "id": schema, "type": "OsdSchemaCredential" },
        "credentialSubject": { "id": "did:omn:holder", "claims": claims }
    }))
    .unwrap()
}

/// `attr_1` backed by `cred-a` and `cred-b`, `pred_1` backed by `cred-a`, and one
/// self-attested attribute.
pub fn available_referents() -> AvailableReferent {
    let candidate = |cred_id: &str| {
        json!({
            "raw": format!("raw-{cred_id}"),
            "credId": cred_id,
            "schemaId": "schema-zkp",
            "credDefId": "def-zkp"
        })
    };
    serde_json::from_value(json!({
        "attrReferent": [
            { "key": "attr_1", "name": "zkp.name", "referent": [candidate("cred-a"), candidate("cred-b")] }
        ],
        "predicateReferent": [
            { "key": "pred_1", "name": "zkp.birth_date", "referent": [candidate("cred-a")] }
        ],
        "selfAttrReferent": [
            { "key": "self_1", "name": "nickname" }
        ]
    }))
    .unwrap()
}

// ---- wallet ----

#[derive(Default)]
struct WalletState {
    credentials: Vec<VerifiableCredential>,
    available: AvailableReferent,
    wallet_tokens: Vec<TokenPurpose>,
    server_token_data: Option<Vec<u8>>,
    holder_saved: usize,
    deleted: Vec<String>,
    passcode_attempts: usize,
    presented: Option<Json>,
}

/// Wallet core accepting [PASSCODE] and biometrics.
#[derive(Default)]
pub struct MockWallet {
    state: Mutex<WalletState>,
}

impl MockWallet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_credentials(credentials: Vec<VerifiableCredential>) -> Arc<Self> {
        let wallet = Self::default();
        wallet.state.lock().unwrap().credentials = credentials;
        Arc::new(wallet)
    }

    pub fn with_referents(available: AvailableReferent) -> Arc<Self> {
        let wallet = Self::default();
        wallet.state.lock().unwrap().available = available;
        Arc::new(wallet)
    }

    pub fn server_token_data(&self) -> Option<Vec<u8>> {
        self.state.lock().unwrap().server_token_data.clone()
    }

    pub fn wallet_tokens(&self) -> Vec<TokenPurpose> {
        self.state.lock().unwrap().wallet_tokens.clone()
    }

    pub fn holder_saved(&self) -> usize {
        self.state.lock().unwrap().holder_saved
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn credential_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .credentials
            .iter()
            .map(|vc| vc.id.clone())
            .collect()
    }

    pub fn passcode_attempts(&self) -> usize {
        self.state.lock().unwrap().passcode_attempts
    }

    /// Plaintext of the last presentation or proof.
    pub fn presented(&self) -> Option<Json> {
        self.state.lock().unwrap().presented.clone()
    }

    fn authenticate(&self, passcode: Option<&str>) -> Result<()> {
        let Some(passcode) = passcode else {
            return Ok(());
        };
        self.state.lock().unwrap().passcode_attempts += 1;
        if passcode != PASSCODE {
            return Err(Error::wallet_core(AUTHENTICATION_FAILED, "passcode mismatch"));
        }
        Ok(())
    }

    fn acc_e2e() -> AccE2e {
        AccE2e {
            public_key: "zE2ePublicKey".into(),
            iv: "zE2eIv".into(),
            proof: None,
        }
    }
}

#[async_trait]
impl WalletCore for MockWallet {
    async fn did_document(&self, kind: DidDocumentKind) -> Result<DidDocument> {
        let id = match kind {
            DidDocumentKind::Device => "did:omn:device",
            DidDocumentKind::Holder => "did:omn:holder",
        };
        Ok(DidDocument {
            id: id.into(),
            version_id: "1".into(),
            rest: Map::new(),
        })
    }

    async fn sign(&self, _kind: DidDocumentKind, _key_id: &str, digest: &[u8]) -> Result<Vec<u8>> {
        Ok(digest.to_vec())
    }

    async fn signed_wallet_info(&self) -> Result<Json> {
        Ok(json!({ "wallet": { "id": "WID0001", "did": "did:omn:wallet" } }))
    }

    async fn create_wallet_token(&self, purpose: TokenPurpose, user_id: &str) -> Result<String> {
        self.state.lock().unwrap().wallet_tokens.push(purpose);
        Ok(format!("wallet-token:{user_id}:{purpose:?}"))
    }

    async fn create_server_token(
        &self,
        _wallet_token: &str,
        server_token_data: &[u8],
    ) -> Result<String> {
        self.state.lock().unwrap().server_token_data = Some(server_token_data.to_vec());
        Ok("server-token".into())
    }

    async fn signed_did_document(
        &self,
        _wallet_token: &str,
        passcode: Option<&str>,
    ) -> Result<SignedDidDoc> {
        self.authenticate(passcode)?;
        Ok(json!({ "ownerDidDoc": "zHolderDoc", "wallet": { "id": "WID0001" } }))
    }

    async fn did_auth(
        &self,
        _wallet_token: &str,
        auth_nonce: &str,
        passcode: Option<&str>,
    ) -> Result<DidAuth> {
        self.authenticate(passcode)?;
        Ok(json!({ "did": "did:omn:holder", "authNonce": auth_nonce }))
    }

    async fn save_holder_did_document(&self, _wallet_token: &str) -> Result<()> {
        self.state.lock().unwrap().holder_saved += 1;
        Ok(())
    }

    async fn revoke_request(
        &self,
        _wallet_token: &str,
        vc_id: &str,
        issuer_nonce: &str,
        auth_type: AuthType,
        passcode: Option<&str>,
    ) -> Result<Json> {
        self.authenticate(passcode)?;
        Ok(json!({ "vcId": vc_id, "issuerNonce": issuer_nonce, "authType": auth_type }))
    }

    async fn delete_credentials(&self, _wallet_token: &str, ids: &[String]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.credentials.retain(|vc| !ids.contains(&vc.id));
        state.deleted.extend(ids.iter().cloned());
        Ok(())
    }

    async fn issue_request(
        &self,
        _wallet_token: &str,
        ref_id: &str,
        auth_nonce: &str,
        profile: &IssueProfile,
        passcode: Option<&str>,
    ) -> Result<Map<String, Json>> {
        self.authenticate(passcode)?;
        let body = json!({
            "didAuth": { "did": "did:omn:holder", "authNonce": auth_nonce },
            "accE2e": Self::acc_e2e(),
            "encReqVc": format!("z{ref_id}:{}", profile.header.id),
        });
        match body {
            Json::Object(map) => Ok(map),
            _ => unreachable!(),
        }
    }

    async fn store_issued_credential(
        &self,
        _wallet_token: &str,
        _ref_id: &str,
        _e2e: &Json,
    ) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .credentials
            .push(credential("vc-issued", "schema-mdl", &["name"]));
        Ok("vc-issued".into())
    }

    async fn credentials(&self, _wallet_token: &str) -> Result<Vec<VerifiableCredential>> {
        Ok(self.state.lock().unwrap().credentials.clone())
    }

    async fn search_zkp_credentials(
        &self,
        _wallet_token: &str,
        _proof_request: &ProofRequest,
    ) -> Result<AvailableReferent> {
        Ok(self.state.lock().unwrap().available.clone())
    }

    async fn create_enc_vp(
        &self,
        _wallet_token: &str,
        claim_infos: &[ClaimInfo],
        _profile: &VerifyProfile,
        passcode: Option<&str>,
    ) -> Result<EncryptedPresentation> {
        self.authenticate(passcode)?;
        let plaintext = serde_json::to_value(claim_infos).unwrap();
        let ciphertext = serde_json::to_vec(&plaintext).unwrap();
        self.state.lock().unwrap().presented = Some(plaintext);
        Ok(EncryptedPresentation {
            acc_e2e: Self::acc_e2e(),
            ciphertext,
        })
    }

    async fn create_enc_zk_proof(
        &self,
        _wallet_token: &str,
        referents: &[UserReferent],
        param: &ZkProofParam,
        _profile: &ProofRequestProfile,
    ) -> Result<EncryptedPresentation> {
        let plaintext = json!({ "referents": referents, "param": param });
        let ciphertext = serde_json::to_vec(&plaintext).unwrap();
        self.state.lock().unwrap().presented = Some(plaintext);
        Ok(EncryptedPresentation {
            acc_e2e: Self::acc_e2e(),
            ciphertext,
        })
    }
}

// ---- passcode prompt ----

/// Answers prompts from a script; `None` cancels.
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Option<String>>>,
    asked: Mutex<Vec<usize>>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[Option<&str>]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.map(str::to_owned)).collect()),
            asked: Mutex::default(),
        }
    }

    pub fn asked(&self) -> Vec<usize> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthPrompt for ScriptedPrompt {
    async fn passcode(&self, attempt: usize) -> Option<String> {
        self.asked.lock().unwrap().push(attempt);
        self.answers.lock().unwrap().pop_front().flatten()
    }
}
