//! Credential status lookup through the API gateway's `vc-meta` endpoint.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    config::BaseUrl,
    core::{
        credential::{StatusMap, VcMeta, VcStatus},
        endpoint, multibase,
        transport::ServiceClient,
    },
    error::{Error, Result},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VcMetaQuery<'a> {
    vc_id: &'a str,
}

/// `vcMeta` is a multibase-encoded JSON document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VcMetaResponse {
    vc_meta: String,
}

pub async fn vc_meta(
    service: &ServiceClient,
    api_gateway: &BaseUrl,
    vc_id: &str,
    cancel: &CancellationToken,
) -> Result<VcMeta> {
    let response: VcMetaResponse = service
        .get(
            api_gateway.endpoint(endpoint::VC_META)?,
            &VcMetaQuery { vc_id },
            cancel,
        )
        .await?;

    let document = multibase::decode(&response.vc_meta)?;
    serde_json::from_slice(&document).map_err(|e| Error::decode("vcMeta", e))
}

pub async fn status(
    service: &ServiceClient,
    api_gateway: &BaseUrl,
    vc_id: &str,
    cancel: &CancellationToken,
) -> Result<VcStatus> {
    let status = vc_meta(service, api_gateway, vc_id, cancel).await?.status;
    debug!(vc_id, ?status, "credential status");
    Ok(status)
}

/// Status of every distinct id in `vc_ids`, each looked up once.
pub async fn statuses<'a>(
    service: &ServiceClient,
    api_gateway: &BaseUrl,
    vc_ids: impl IntoIterator<Item = &'a str>,
    cancel: &CancellationToken,
) -> Result<StatusMap> {
    let distinct: BTreeSet<&str> = vc_ids.into_iter().collect();

    let mut map = StatusMap::new();
    for vc_id in distinct {
        map.insert(
            vc_id.to_owned(),
            status(service, api_gateway, vc_id, cancel).await?,
        );
    }
    Ok(map)
}
