//! This library implements the DID transaction protocols of a mobile identity wallet: user
//! registration, DID document restore and update, credential issuance and revocation, and
//! presentation of credentials or zero-knowledge proofs to a verifier.
//!
//! # Usage
//!
//! A [`TransactionClient`] drives transactions against the remote services on behalf of a
//! [`WalletCore`], the local key store and credential store:
//!
//! ```ignore
//! use did_wallet_protocol::config::Config;
//! use did_wallet_protocol::transaction::{Action, Transaction, TransactionClient, TransactionContext};
//!
//! let config = Config::new(
//!     "https://tas.example.com",
//!     "https://verifier.example.com",
//!     "https://cas.example.com",
//!     "https://gateway.example.com",
//!     "app-id",
//!     "user-id",
//! )?;
//!
//! let client = TransactionClient::builder()
//!     .with_config(config)
//!     .with_wallet(wallet)
//!     .build()?;
//!
//! // Propose, agree a key and negotiate the server token.
//! let mut ctx = TransactionContext::new();
//! client.pre_process(&mut ctx, Transaction::RegisterUser).await?;
//!
//! // Submit the signed DID document and confirm it.
//! let confirmation = client
//!     .process(&mut ctx, Action::RegisterUser, Some(&passcode))
//!     .await?;
//! ```
//!
//! Passcode entry can be delegated to an [`AuthPrompt`] through
//! [`TransactionClient::process_with_auth`], which asks again when the wallet rejects a
//! passcode.
//!
//! [`TransactionClient`]: crate::transaction::TransactionClient
//! [`TransactionClient::process_with_auth`]: crate::transaction::TransactionClient::process_with_auth
//! [`AuthPrompt`]: crate::transaction::AuthPrompt
//! [`WalletCore`]: crate::wallet::WalletCore
//!
//! # Presenting Credentials
//!
//! ```ignore
//! let mut ctx = TransactionContext::new();
//! client
//!     .pre_process(&mut ctx, Transaction::VerifyVc { offer_id })
//!     .await?;
//!
//! // Claims of active credentials answering the verifier's profile.
//! let claim_infos = client.select_claims(&ctx).await?;
//!
//! client
//!     .process(&mut ctx, Action::VerifyVc { claim_infos }, Some(&passcode))
//!     .await?;
//! ```
//!
//! Zero-knowledge presentations go through [`TransactionClient::select_referents`], the user's
//! [`ReferentSelection`], and [`bind_referents`].
//!
//! [`TransactionClient::select_referents`]: crate::transaction::TransactionClient::select_referents
//! [`ReferentSelection`]: crate::selection::ReferentSelection
//! [`bind_referents`]: crate::selection::bind_referents
//!
//! # Protocol Overview
//!
//! Every trust-anchor transaction follows the same skeleton:
//!
//! 1. *Propose*: the service assigns a transaction id, and nonces where the kind needs them.
//! 2. *Key agreement*: an ephemeral secp256r1 key is exchanged in a signed ECDH request and a
//!    session key is derived from both nonces ([`core::key_agreement`]).
//! 3. *Attestation*: the certificate-app service attests this app.
//! 4. *Server token*: the service returns the encrypted server-token data, which the wallet
//!    turns into the server token ([`core::token`]).
//! 5. *Action*: the kind-specific signed request, authenticated by the user's passcode.
//! 6. *Confirm*: the service confirms the transaction and the wallet applies it locally.
//!
//! Each response must echo the transaction id assigned in the first step.
//!
//! [`core::key_agreement`]: crate::core::key_agreement
//! [`core::token`]: crate::core::token

pub mod config;
pub mod core;
pub mod error;
pub mod presentation;
pub mod selection;
pub mod status;
pub mod transaction;
pub mod utils;
pub mod wallet;

pub use error::{Error, Result};
