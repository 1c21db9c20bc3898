use std::time::Duration;

use crate::transaction::{State, TransactionKind};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Code used by [WalletCore](crate::wallet::WalletCore) implementations to report a rejected
/// passcode or biometric check.
pub const AUTHENTICATION_FAILED: &str = "AUTHENTICATION_FAILED";

/// Section of a zero-knowledge proof request a referent belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentSection {
    Attributes,
    Predicates,
    SelfAttributes,
}

impl std::fmt::Display for ReferentSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attributes => write!(f, "Attributes"),
            Self::Predicates => write!(f, "Predicates"),
            Self::SelfAttributes => write!(f, "Self-Attributes"),
        }
    }
}

/// Errors surfaced by the transaction protocols.
///
/// Every error carries a machine-readable [code](Error::code) and a human
/// [message](Error::message).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key or signature operation failed in the wallet SDK.
    #[error("[{code}] {message}")]
    Sdk { code: String, message: String },

    /// Local credential store, key store, PIN or biometric failure.
    #[error("[{code}] {message}")]
    WalletCore { code: String, message: String },

    /// A remote service answered with an error body.
    #[error("[{code}] {message}")]
    Service { code: String, message: String },

    #[error("request was unsuccessful (status: {status}): {body}")]
    Http { status: u16, body: String },

    #[error("transport failure: {0:#}")]
    Transport(anyhow::Error),

    #[error("unable to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    #[error("unable to encode {what}: {reason}")]
    Encoding { what: &'static str, reason: String },

    #[error("cryptographic operation failed: {0}")]
    Crypto(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("canceled by user")]
    Cancelled,

    #[error("not found any claim")]
    InsufficientClaim,

    #[error("{section}-{name} is missing selection")]
    MissingSelection {
        section: ReferentSection,
        name: String,
    },

    #[error("no eligible credential for attribute '{0}'")]
    NoEligibleAttribute(String),

    #[error("transaction id mismatch (expected '{expected}', received '{received}')")]
    TxIdMismatch { expected: String, received: String },

    #[error("cannot {operation} while transaction is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: State,
    },

    #[error("transaction is {expected:?} but action is for {found:?}")]
    KindMismatch {
        expected: Option<TransactionKind>,
        found: TransactionKind,
    },

    #[error("server nonce repeats the client nonce")]
    NonceReuse,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn sdk(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sdk {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn wallet_core(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WalletCore {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn decode(what: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            what,
            reason: reason.to_string(),
        }
    }

    pub fn encoding(what: &'static str, reason: impl ToString) -> Self {
        Self::Encoding {
            what,
            reason: reason.to_string(),
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &str {
        match self {
            Self::Sdk { code, .. } | Self::WalletCore { code, .. } | Self::Service { code, .. } => {
                code
            }
            Self::Http { .. } => "HTTP_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Decode { .. } => "DECODE_ERROR",
            Self::Encoding { .. } => "ENCODING_ERROR",
            Self::Crypto(_) => "CRYPTO_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::InsufficientClaim => "INSUFFICIENT_CLAIM",
            Self::MissingSelection { .. } => "MISSING_SELECTION",
            Self::NoEligibleAttribute(_) => "NO_ELIGIBLE_ATTRIBUTE",
            Self::TxIdMismatch { .. } => "TX_ID_MISMATCH",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::KindMismatch { .. } => "KIND_MISMATCH",
            Self::NonceReuse => "NONCE_REUSE",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Human-readable message, without the code prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Sdk { message, .. }
            | Self::WalletCore { message, .. }
            | Self::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the wallet rejected the supplied passcode or biometric.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::WalletCore { code, .. } if code == AUTHENTICATION_FAILED)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn code_and_message() {
        let err = Error::wallet_core("SSDKWLT00301", "credential not found");
        assert_eq!(err.code(), "SSDKWLT00301");
        assert_eq!(err.message(), "credential not found");
        assert_eq!(err.to_string(), "[SSDKWLT00301] credential not found");

        let err = Error::MissingSelection {
            section: ReferentSection::Predicates,
            name: "birth_date".into(),
        };
        assert_eq!(err.code(), "MISSING_SELECTION");
        assert_eq!(err.message(), "Predicates-birth_date is missing selection");
    }

    #[test]
    fn authentication_failure() {
        assert!(Error::wallet_core(AUTHENTICATION_FAILED, "wrong pin").is_authentication_failure());
        assert!(!Error::sdk(AUTHENTICATION_FAILED, "sdk").is_authentication_failure());
        assert!(Error::Cancelled.is_cancelled());
    }
}
