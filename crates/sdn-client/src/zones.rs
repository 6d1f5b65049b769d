//! SDN zones API client
//!
//! Typed access to `cluster/sdn/zones`.

use std::sync::Arc;

use pve_shared_types::{
    ZoneGetResponseBody, ZoneListResponseBody, ZoneRecord, ZoneType, ZoneUpdateRequest,
};
use thiserror::Error;

use crate::api_client::{ApiClient, ApiError, ApiRequest};

/// Marker Proxmox puts into the error text of requests on a missing zone.
const NOT_FOUND_MARKER: &str = "does not exist";

#[derive(Debug, Error)]
pub enum ZoneClientError {
    #[error("error {action}: {source}")]
    Transport {
        action: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("the server did not include a data object in the response")]
    NoData,

    #[error("SDN zone {zone} does not exist: {message}")]
    NotFound { zone: String, message: String },

    #[error("error {action}: invalid response body: {source}")]
    Decode {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode SDN zone request: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ZoneClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ZoneClientError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ZoneClientError>;

/// Whether a failed call means the addressed zone is missing.
///
/// The API answers with a generic server error whose text contains
/// "does not exist"; a 404 is treated the same way.
fn is_missing_zone(err: &ApiError) -> bool {
    match err {
        ApiError::Status { status, message } => {
            *status == 404 || message.contains(NOT_FOUND_MARKER)
        }
        _ => false,
    }
}

/// Client for the cluster SDN API
#[derive(Clone)]
pub struct SdnClient {
    api: Arc<dyn ApiClient>,
}

impl SdnClient {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self { api }
    }

    /// Expand a relative path to a full cluster SDN API path.
    pub fn expand_path(&self, path: &str) -> String {
        expand(SDN_ROOT, path)
    }

    /// Client for managing the cluster's SDN zones.
    pub fn zones(&self) -> ZonesClient {
        ZonesClient {
            api: self.api.clone(),
        }
    }
}

const SDN_ROOT: &str = "cluster/sdn";
const ZONES_ROOT: &str = "cluster/sdn/zones";

fn expand(root: &str, path: &str) -> String {
    if path.is_empty() {
        root.to_string()
    } else {
        format!("{}/{}", root, path)
    }
}

/// Client for the SDN zones management API
#[derive(Clone)]
pub struct ZonesClient {
    api: Arc<dyn ApiClient>,
}

impl ZonesClient {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self { api }
    }

    /// Expand a relative path to a full SDN zones API path.
    pub fn expand_path(&self, path: &str) -> String {
        expand(ZONES_ROOT, path)
    }

    fn zone_path(&self, zone: &str) -> String {
        self.expand_path(&urlencoding::encode(zone))
    }

    /// List the SDN zones of the cluster, sorted by name.
    pub async fn list(&self, zone_type: Option<ZoneType>) -> Result<Vec<ZoneRecord>> {
        const ACTION: &str = "listing SDN zones";

        let mut request = ApiRequest::get(self.expand_path(""));
        if let Some(zone_type) = zone_type {
            request = request.with_query("type", zone_type.as_str());
        }

        let response = self
            .api
            .call(&request)
            .await
            .map_err(|source| ZoneClientError::Transport {
                action: ACTION,
                source,
            })?;

        let body: ZoneListResponseBody = serde_json::from_value(response.body)
            .map_err(|source| ZoneClientError::Decode {
                action: ACTION,
                source,
            })?;

        let mut zones = body.data.ok_or(ZoneClientError::NoData)?;
        zones.sort_by(|a, b| a.name.cmp(&b.name));

        log::debug!("Listed {} SDN zones", zones.len());
        Ok(zones)
    }

    /// Retrieve a single SDN zone.
    pub async fn get(&self, zone: &str) -> Result<ZoneRecord> {
        const ACTION: &str = "reading SDN zone";

        let response = self
            .api
            .call(&ApiRequest::get(self.zone_path(zone)))
            .await
            .map_err(|source| classify(ACTION, zone, source))?;

        let body: ZoneGetResponseBody = serde_json::from_value(response.body)
            .map_err(|source| ZoneClientError::Decode {
                action: ACTION,
                source,
            })?;

        body.data.ok_or(ZoneClientError::NoData)
    }

    /// Create a new SDN zone.
    pub async fn create(&self, record: &ZoneRecord) -> Result<()> {
        let body = serde_json::to_value(record).map_err(ZoneClientError::Encode)?;

        self.api
            .call(&ApiRequest::post(self.expand_path(""), body))
            .await
            .map_err(|source| ZoneClientError::Transport {
                action: "creating SDN zone",
                source,
            })?;

        log::info!("Created SDN zone {}", record.name);
        Ok(())
    }

    /// Update an existing SDN zone.
    pub async fn update(&self, zone: &str, request: &ZoneUpdateRequest) -> Result<()> {
        let body = serde_json::to_value(request).map_err(ZoneClientError::Encode)?;

        self.api
            .call(&ApiRequest::put(self.zone_path(zone), body))
            .await
            .map_err(|source| ZoneClientError::Transport {
                action: "updating SDN zone",
                source,
            })?;

        log::info!("Updated SDN zone {}", zone);
        Ok(())
    }

    /// Remove an SDN zone.
    pub async fn delete(&self, zone: &str) -> Result<()> {
        self.api
            .call(&ApiRequest::delete(self.zone_path(zone)))
            .await
            .map_err(|source| classify("deleting SDN zone", zone, source))?;

        log::info!("Deleted SDN zone {}", zone);
        Ok(())
    }
}

fn classify(action: &'static str, zone: &str, source: ApiError) -> ZoneClientError {
    if is_missing_zone(&source) {
        let message = match source {
            ApiError::Status { message, .. } => message,
            other => other.to_string(),
        };

        return ZoneClientError::NotFound {
            zone: zone.to_string(),
            message,
        };
    }

    ZoneClientError::Transport { action, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::{ApiResponse, MockApiClient};
    use async_trait::async_trait;
    use reqwest::Method;
    use serde_json::json;

    mockall::mock! {
        pub Transport {}

        #[async_trait]
        impl ApiClient for Transport {
            async fn call(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, ApiError>;
            async fn health_check(&self) -> std::result::Result<bool, ApiError>;
        }
    }

    fn zones_with(mock: MockApiClient) -> (Arc<MockApiClient>, ZonesClient) {
        let mock = Arc::new(mock);
        let client = SdnClient::new(mock.clone()).zones();
        (mock, client)
    }

    #[test]
    fn test_path_expansion() {
        let sdn = SdnClient::new(Arc::new(MockApiClient::new()));
        assert_eq!(sdn.expand_path("zones"), "cluster/sdn/zones");

        let zones = sdn.zones();
        assert_eq!(zones.expand_path(""), "cluster/sdn/zones");
        assert_eq!(zones.zone_path("a b/c"), "cluster/sdn/zones/a%20b%2Fc");
    }

    #[tokio::test]
    async fn test_list_sorts_by_name() {
        let mut mock = MockApiClient::new();
        mock.add_response(
            "GET cluster/sdn/zones",
            ApiResponse::ok(json!({"data": [
                {"zone": "zeta", "type": "simple"},
                {"zone": "alpha", "type": "vlan", "bridge": "vmbr0"},
                {"zone": "mid", "type": "faucet"},
            ]})),
        );
        let (_, zones) = zones_with(mock);

        let names: Vec<String> = zones
            .list(None)
            .await
            .unwrap()
            .into_iter()
            .map(|zone| zone.name)
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_list_type_filter() {
        let mut mock = MockApiClient::new();
        mock.add_response("GET cluster/sdn/zones", ApiResponse::ok(json!({"data": []})));
        let (mock, zones) = zones_with(mock);

        assert!(zones.list(Some(ZoneType::Evpn)).await.unwrap().is_empty());

        let requests = mock.requests();
        assert_eq!(requests[0].query_params.get("type").unwrap(), "evpn");
    }

    #[tokio::test]
    async fn test_list_without_data() {
        let mut mock = MockApiClient::new();
        mock.add_response("GET cluster/sdn/zones", ApiResponse::ok(json!({})));
        let (_, zones) = zones_with(mock);

        assert!(matches!(
            zones.list(None).await,
            Err(ZoneClientError::NoData)
        ));
    }

    #[tokio::test]
    async fn test_get_zone() {
        let mut mock = MockApiClient::new();
        mock.add_response(
            "GET cluster/sdn/zones/z1",
            ApiResponse::ok(json!({"data": {"zone": "z1", "type": "vlan", "bridge": "vmbr0", "mtu": 1500}})),
        );
        let (_, zones) = zones_with(mock);

        let zone = zones.get("z1").await.unwrap();
        assert_eq!(zone.parse_type().unwrap(), ZoneType::Vlan);
        assert_eq!(zone.bridge.as_deref(), Some("vmbr0"));
        assert_eq!(zone.mtu, Some(1500));
    }

    #[tokio::test]
    async fn test_get_missing_zone() {
        let mut mock = MockApiClient::new();
        mock.add_error("GET cluster/sdn/zones/gone", 500, "sdn 'gone' does not exist");
        mock.add_response("GET cluster/sdn/zones/empty", ApiResponse::ok(json!({"data": null})));
        let (_, zones) = zones_with(mock);

        let err = zones.get("gone").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("does not exist"));

        assert!(matches!(
            zones.get("empty").await,
            Err(ZoneClientError::NoData)
        ));
    }

    #[tokio::test]
    async fn test_get_other_failure_is_transport() {
        let mut mock = MockApiClient::new();
        mock.add_error("GET cluster/sdn/zones/z1", 403, "Permission check failed");
        let (_, zones) = zones_with(mock);

        let err = zones.get("z1").await.unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "error reading SDN zone: API returned error: 403 - Permission check failed"
        );
    }

    #[tokio::test]
    async fn test_create_posts_form_body() {
        let mut mock = MockApiClient::new();
        mock.add_response("POST cluster/sdn/zones", ApiResponse::ok(json!({"data": null})));
        let (mock, zones) = zones_with(mock);

        let mut record = ZoneRecord::new("z1", ZoneType::Vlan);
        record.bridge = Some("vmbr0".to_string());
        zones.create(&record).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(
            requests[0].body,
            Some(json!({"zone": "z1", "type": "vlan", "bridge": "vmbr0"}))
        );
    }

    #[tokio::test]
    async fn test_update_sends_delete_list() {
        let mut mock = MockApiClient::new();
        mock.add_response("PUT cluster/sdn/zones/z1", ApiResponse::ok(json!({"data": null})));
        let (mock, zones) = zones_with(mock);

        let mut record = ZoneRecord::new("z1", ZoneType::Vlan);
        record.bridge = Some("vmbr1".to_string());
        let request = ZoneUpdateRequest::new(record, &["mtu"]);
        zones.update("z1", &request).await.unwrap();

        let body = mock.requests()[0].body.clone().unwrap();
        assert_eq!(body, json!({"zone": "z1", "bridge": "vmbr1", "delete": "mtu"}));
        assert!(body.get("type").is_none());
    }

    #[tokio::test]
    async fn test_update_failure_is_transport() {
        let mut mock = MockApiClient::new();
        mock.add_error(
            "PUT cluster/sdn/zones/z1",
            500,
            "update sdn object failed: controller 'ctl9' does not exist",
        );
        let (_, zones) = zones_with(mock);

        let mut record = ZoneRecord::new("z1", ZoneType::Evpn);
        record.controller = Some("ctl9".to_string());
        let err = zones
            .update("z1", &ZoneUpdateRequest::new(record, &[]))
            .await
            .unwrap_err();

        assert!(!err.is_not_found());
        match err {
            ZoneClientError::Transport { action, .. } => assert_eq!(action, "updating SDN zone"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_delete_missing_zone() {
        let mut mock = MockApiClient::new();
        mock.add_error("DELETE cluster/sdn/zones/z1", 500, "sdn 'z1' does not exist");
        let (_, zones) = zones_with(mock);

        assert!(zones.delete("z1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_transport_failure_is_wrapped() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .withf(|request| request.method == Method::DELETE && request.path == "cluster/sdn/zones/z1")
            .times(1)
            .returning(|_| {
                Err(ApiError::Status {
                    status: 500,
                    message: "zone is in use by vnet 'v1'".to_string(),
                })
            });

        let zones = ZonesClient::new(Arc::new(transport));
        let err = zones.delete("z1").await.unwrap_err();

        match err {
            ZoneClientError::Transport { action, source } => {
                assert_eq!(action, "deleting SDN zone");
                assert_eq!(source.status(), Some(500));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_failure_is_transport() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .times(1)
            .returning(|_| Err(ApiError::Authentication("invalid token".to_string())));

        let zones = ZonesClient::new(Arc::new(transport));
        let err = zones
            .create(&ZoneRecord::new("z1", ZoneType::Simple))
            .await
            .unwrap_err();
        assert!(matches!(err, ZoneClientError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_invalid_response_body() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .returning(|_| Ok(ApiResponse::ok(json!({"data": {"zone": "z1", "mtu": "big"}}))));

        let zones = ZonesClient::new(Arc::new(transport));
        assert!(matches!(
            zones.get("z1").await,
            Err(ZoneClientError::Decode { .. })
        ));
    }
}
