//! JSON-over-HTTP client for the trust-anchor service, the verifier and the API gateway.
//!
//! Every call is bounded by the configured timeout and aborts as soon as the transaction's
//! [CancellationToken] fires.

use std::{fmt::Debug, sync::Arc, time::Duration};

use http::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::{
    message::ServiceErrorBody,
    util::{base_request, AsyncHttpClient},
};
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct ServiceClient {
    http: Arc<dyn AsyncHttpClient + Send + Sync>,
    timeout: Duration,
}

impl Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    pub fn new(http: Arc<dyn AsyncHttpClient + Send + Sync>, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    pub async fn post<B, T>(&self, url: Url, body: &B, cancel: &CancellationToken) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(body).map_err(|e| Error::encoding("request body", e))?;

        debug!(%url, "POST");
        let request = base_request()
            .method("POST")
            .uri(url.as_str())
            .body(body)
            .map_err(|e| Error::encoding("http request", e))?;

        let bytes = self.send(request, cancel).await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::decode("response body", e))
    }

    /// GET `url` with `query` serialized as its query string.
    pub async fn get<Q, T>(&self, mut url: Url, query: &Q, cancel: &CancellationToken) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let query =
            serde_urlencoded::to_string(query).map_err(|e| Error::encoding("query string", e))?;
        url.set_query(Some(&query));

        debug!(%url, "GET");
        let request = base_request()
            .method("GET")
            .uri(url.as_str())
            .body(Vec::new())
            .map_err(|e| Error::encoding("http request", e))?;

        let bytes = self.send(request, cancel).await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::decode("response body", e))
    }

    async fn send(
        &self,
        request: http::Request<Vec<u8>>,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let execute = tokio::time::timeout(self.timeout, self.http.execute(request));

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            result = execute => result
                .map_err(|_| Error::Timeout(self.timeout))?
                .map_err(Error::Transport)?,
        };

        let status = response.status();
        let body = response.into_body();
        if status.is_success() {
            return Ok(body);
        }

        Err(service_error(status, body))
    }
}

fn service_error(status: StatusCode, body: Vec<u8>) -> Error {
    if let Ok(ServiceErrorBody { code, description }) = serde_json::from_slice(&body) {
        warn!(%status, code = %code, "service returned an error");
        return Error::Service {
            code,
            message: description,
        };
    }

    let body = String::from_utf8_lossy(&body).into_owned();
    warn!(%status, "request was unsuccessful");
    Error::Http {
        status: status.as_u16(),
        body,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use http::{Request, Response};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug)]
    struct Fixed(u16, serde_json::Value);

    #[async_trait]
    impl AsyncHttpClient for Fixed {
        async fn execute(&self, request: Request<Vec<u8>>) -> anyhow::Result<Response<Vec<u8>>> {
            assert_eq!(request.uri().query(), Some("vcId=vc-1"));
            Ok(Response::builder()
                .status(self.0)
                .body(serde_json::to_vec(&self.1)?)?)
        }
    }

    #[derive(Debug)]
    struct Hang;

    #[async_trait]
    impl AsyncHttpClient for Hang {
        async fn execute(&self, _: Request<Vec<u8>>) -> anyhow::Result<Response<Vec<u8>>> {
            std::future::pending().await
        }
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Query {
        vc_id: &'static str,
    }

    #[derive(Debug, Deserialize)]
    struct Ack {
        ok: bool,
    }

    fn url() -> Url {
        "http://localhost/api-gateway/api/v1/vc-meta".parse().unwrap()
    }

    #[tokio::test]
    async fn decodes_success() {
        let client = ServiceClient::new(Arc::new(Fixed(200, json!({"ok": true}))), Duration::from_secs(1));
        let body: Ack = client
            .get(url(), &Query { vc_id: "vc-1" }, &CancellationToken::new())
            .await
            .unwrap();
        assert!(body.ok);
    }

    #[tokio::test]
    async fn maps_service_error_body() {
        let client = ServiceClient::new(
            Arc::new(Fixed(400, json!({"code": "SAPI00001", "description": "vc not found"}))),
            Duration::from_secs(1),
        );
        let err = client
            .get::<_, Ack>(url(), &Query { vc_id: "vc-1" }, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SAPI00001");
        assert_eq!(err.message(), "vc not found");
    }

    #[tokio::test]
    async fn maps_other_failures_to_http() {
        let client = ServiceClient::new(Arc::new(Fixed(502, json!("bad gateway"))), Duration::from_secs(1));
        let err = client
            .get::<_, Ack>(url(), &Query { vc_id: "vc-1" }, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http { status: 502, .. }));
    }

    #[tokio::test]
    async fn times_out() {
        let client = ServiceClient::new(Arc::new(Hang), Duration::from_millis(20));
        let err = client
            .post::<_, Ack>(url(), &json!({}), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn cancellation_wins() {
        let client = ServiceClient::new(Arc::new(Hang), Duration::from_secs(30));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client
            .post::<_, Ack>(url(), &json!({}), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
