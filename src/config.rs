use std::time::Duration;

use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::{Error, Result};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Locations of the remote services and the identity of this wallet app.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Trust-anchor service.
    pub tas: BaseUrl,
    pub verifier: BaseUrl,
    /// Certificate-app service issuing attested app info.
    pub cas: BaseUrl,
    pub api_gateway: BaseUrl,
    pub app_id: String,
    pub user_id: String,
    /// Read from `requestTimeoutSecs`.
    #[serde(
        default,
        rename = "requestTimeoutSecs",
        deserialize_with = "deserialize_secs"
    )]
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn new(
        tas: &str,
        verifier: &str,
        cas: &str,
        api_gateway: &str,
        app_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            tas: BaseUrl::parse(tas)?,
            verifier: BaseUrl::parse(verifier)?,
            cas: BaseUrl::parse(cas)?,
            api_gateway: BaseUrl::parse(api_gateway)?,
            app_id: app_id.into(),
            user_id: user_id.into(),
            request_timeout: None,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}

fn deserialize_secs<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
}

/// A url that is always a base (can be safely join()'ed with further path elements without
/// mangling).
#[derive(Deserialize, Debug, Clone, Hash, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct BaseUrl(Url);

impl BaseUrl {
    pub fn parse(url: &str) -> Result<Self> {
        Self::try_from(url.to_owned()).map_err(|e| Error::Config(format!("{url}: {e}")))
    }

    /// Resolve an endpoint path (without a leading `/`) against this base.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.0
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("invalid endpoint '{path}': {e}")))
    }
}

impl std::ops::Deref for BaseUrl {
    type Target = Url;

    fn deref(&self) -> &Url {
        &self.0
    }
}

impl TryFrom<String> for BaseUrl {
    type Error = url::ParseError;

    fn try_from(mut url: String) -> Result<Self, Self::Error> {
        // Make URL a base.
        if !url.ends_with('/') {
            url += "/"
        }
        url.parse().map(Self)
    }
}
