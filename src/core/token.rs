//! App attestation and server-token negotiation.

use tracing::{debug, info};

use super::{
    crypto::{derive_session_key, decrypt},
    endpoint,
    key_agreement::EcdhResult,
    message::{
        message_id,
        token::{
            AttestedAppInfo, RequestAttestedAppInfo, RequestCreateToken,
            RequestCreateTokenResponse, ServerTokenSeed, TokenPurpose,
        },
    },
    multibase,
    transport::ServiceClient,
};
use crate::{
    config::BaseUrl,
    error::{Error, Result},
    transaction::TransactionContext,
    wallet::WalletCore,
};

/// Fetch the app attestation from the certificate-app service.
pub async fn request_attested_app_info(
    service: &ServiceClient,
    cas: &BaseUrl,
    app_id: &str,
    ctx: &TransactionContext,
) -> Result<AttestedAppInfo> {
    debug!(tx_id = %ctx.tx_id, app_id, "requesting attested app info");
    service
        .post(
            cas.endpoint(endpoint::REQUEST_ATTESTED_APP_INFO)?,
            &RequestAttestedAppInfo {
                app_id: app_id.to_owned(),
            },
            ctx.cancellation_token(),
        )
        .await
}

/// Negotiate the server token for `purpose` and store it in `ctx`.
///
/// Requires the wallet token and the key-agreement material already held by `ctx`. Any failure
/// leaves no reusable state: negotiation restarts from key agreement.
pub async fn negotiate_server_token(
    service: &ServiceClient,
    tas: &BaseUrl,
    wallet: &dyn WalletCore,
    ctx: &mut TransactionContext,
    purpose: TokenPurpose,
    attested_app_info: AttestedAppInfo,
    ecdh: &EcdhResult,
) -> Result<String> {
    let wallet_token = ctx.require_wallet_token()?.to_owned();
    let (Some(key_pair), Some(client_nonce)) = (ctx.key_pair.clone(), ctx.client_nonce.clone())
    else {
        return Err(Error::InvalidState {
            operation: "negotiate a server token",
            state: ctx.state,
        });
    };

    let wallet_info = wallet.signed_wallet_info().await?;

    debug!(tx_id = %ctx.tx_id, ?purpose, "requesting server token");
    let response: RequestCreateTokenResponse = service
        .post(
            tas.endpoint(endpoint::REQUEST_CREATE_TOKEN)?,
            &RequestCreateToken {
                id: message_id(),
                tx_id: ctx.tx_id.clone(),
                seed: ServerTokenSeed {
                    purpose,
                    wallet_info,
                    ca_app_info: attested_app_info,
                },
            },
            ctx.cancellation_token(),
        )
        .await?;
    ctx.check_tx_id(&response)?;

    let iv = multibase::decode(&response.iv)?;
    let enc_std = multibase::decode(&response.enc_std)?;
    let server_public_key = ecdh.server_public_key.clone();
    let server_nonce = ecdh.server_nonce.clone();
    let cipher = ecdh.cipher;

    let server_token_data = tokio::task::spawn_blocking(move || {
        let key = derive_session_key(
            &key_pair,
            &server_public_key,
            &client_nonce,
            &server_nonce,
            cipher,
        )?;
        decrypt(cipher, &key, &iv, &enc_std)
    })
    .await
    .map_err(|e| Error::Crypto(format!("token decryption task failed: {e}")))??;

    let server_token = wallet
        .create_server_token(&wallet_token, &server_token_data)
        .await?;

    info!(tx_id = %ctx.tx_id, ?purpose, "server token negotiated");
    ctx.server_token = Some(server_token.clone());
    Ok(server_token)
}
