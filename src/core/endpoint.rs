//! Fixed endpoint paths of the trust-anchor service (TAS), certificate-app service (CAS),
//! verifier and API gateway. Paths are relative to the service base URL.

pub const PROPOSE_REGISTER_USER: &str = "tas/api/v1/propose-register-user";
pub const PROPOSE_RESTORE_DID_DOC: &str = "tas/api/v1/propose-restore-diddoc";
pub const PROPOSE_UPDATE_DID_DOC: &str = "tas/api/v1/propose-update-diddoc";
pub const PROPOSE_REVOKE_VC: &str = "tas/api/v1/propose-revoke-vc";
pub const PROPOSE_ISSUE_VC: &str = "tas/api/v1/propose-issue-vc";

pub const REQUEST_ECDH: &str = "tas/api/v1/request-ecdh";
pub const REQUEST_CREATE_TOKEN: &str = "tas/api/v1/request-create-token";
pub const REQUEST_ATTESTED_APP_INFO: &str = "cas/api/v1/request-attested-appinfo";
pub const RETRIEVE_KYC: &str = "tas/api/v1/retrieve-kyc";
pub const REQUEST_ISSUE_PROFILE: &str = "tas/api/v1/request-issue-profile";

pub const REQUEST_REGISTER_USER: &str = "tas/api/v1/request-register-user";
pub const REQUEST_RESTORE_DID_DOC: &str = "tas/api/v1/request-restore-diddoc";
pub const REQUEST_UPDATE_DID_DOC: &str = "tas/api/v1/request-update-diddoc";
pub const REQUEST_REVOKE_VC: &str = "tas/api/v1/request-revoke-vc";
pub const REQUEST_ISSUE_VC: &str = "tas/api/v1/request-issue-vc";

pub const CONFIRM_REGISTER_USER: &str = "tas/api/v1/confirm-register-user";
pub const CONFIRM_RESTORE_DID_DOC: &str = "tas/api/v1/confirm-restore-diddoc";
pub const CONFIRM_UPDATE_DID_DOC: &str = "tas/api/v1/confirm-update-diddoc";
pub const CONFIRM_REVOKE_VC: &str = "tas/api/v1/confirm-revoke-vc";
pub const CONFIRM_ISSUE_VC: &str = "tas/api/v1/confirm-issue-vc";

pub const REQUEST_PROFILE: &str = "verifier/api/v1/request-profile";
pub const REQUEST_PROOF_REQUEST_PROFILE: &str = "verifier/api/v1/request-proof-request-profile";
pub const REQUEST_VERIFY: &str = "verifier/api/v1/request-verify";
pub const REQUEST_VERIFY_PROOF: &str = "verifier/api/v1/request-verify-proof";

pub const VC_META: &str = "api-gateway/api/v1/vc-meta";
pub const ZKP_CREDENTIAL_SCHEMA: &str = "api-gateway/api/v1/zkp-cred-schema";
pub const ZKP_CREDENTIAL_DEFINITION: &str = "api-gateway/api/v1/zkp-cred-def";
