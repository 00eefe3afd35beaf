//! Metrics gateway: the four read-only diagnostic queries.
//!
//! One blocking HTTP client is built at startup with a bounded timeout
//! and a static credential; every conversation reuses it. There are no
//! retries: a failed call ends the turn, because the cluster may have
//! changed by the time a retry would land.

use std::time::Duration;

use tracing::{debug, error};

use crate::config::{Credential, DiagConfig, EndpointRef};
use crate::error::DiagError;
use crate::metrics::{HealthSnapshot, IndexReplicaInfo, NodeDiskInfo, NodeResourceInfo};
use crate::wire::{CatIndexWire, FsStatsWire, HealthWire, ResourceStatsWire};

/// Source of live diagnostic data. The dialog machine depends on this
/// trait, not on HTTP, so tests drive it with a fake.
pub trait MetricsSource {
    fn fetch_health(&self, endpoint: &EndpointRef) -> Result<HealthSnapshot, DiagError>;

    fn fetch_node_disk_stats(&self, endpoint: &EndpointRef)
        -> Result<Vec<NodeDiskInfo>, DiagError>;

    fn fetch_node_resource_stats(
        &self,
        endpoint: &EndpointRef,
    ) -> Result<Vec<NodeResourceInfo>, DiagError>;

    fn fetch_index_catalog(
        &self,
        endpoint: &EndpointRef,
    ) -> Result<Vec<IndexReplicaInfo>, DiagError>;
}

/// Real implementation over HTTP.
pub struct MetricsGateway {
    client: reqwest::blocking::Client,
    credential: Credential,
}

impl MetricsGateway {
    pub fn new(config: &DiagConfig) -> Result<Self, DiagError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DiagError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            credential: config.auth.clone(),
        })
    }

    /// GET a JSON payload. Auth failures and timeouts surface as
    /// transport errors; a 2xx body that does not decode is logged
    /// separately as a malformed response.
    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &EndpointRef,
        path: &str,
    ) -> Result<T, DiagError> {
        let url = endpoint.join(path);
        debug!("GET {}", url);

        let response = self
            .credential
            .apply(self.client.get(&url))
            .send()
            .map_err(|e| DiagError::Transport(format!("GET {url}: {e}")))?;

        let response = response
            .error_for_status()
            .map_err(|e| DiagError::Transport(format!("GET {url}: {e}")))?;

        response.json::<T>().map_err(|e| {
            error!("Malformed payload from {}: {}", url, e);
            DiagError::MalformedResponse(format!("GET {url}: {e}"))
        })
    }
}

impl MetricsSource for MetricsGateway {
    fn fetch_health(&self, endpoint: &EndpointRef) -> Result<HealthSnapshot, DiagError> {
        let wire: HealthWire = self.get_json(endpoint, "/_cluster/health")?;
        wire.into_snapshot()
    }

    fn fetch_node_disk_stats(
        &self,
        endpoint: &EndpointRef,
    ) -> Result<Vec<NodeDiskInfo>, DiagError> {
        let wire: FsStatsWire = self.get_json(endpoint, "/_nodes/stats/fs")?;
        Ok(wire.into_disk_infos())
    }

    fn fetch_node_resource_stats(
        &self,
        endpoint: &EndpointRef,
    ) -> Result<Vec<NodeResourceInfo>, DiagError> {
        let wire: ResourceStatsWire = self.get_json(endpoint, "/_nodes/stats/jvm,os")?;
        Ok(wire.into_resource_infos())
    }

    fn fetch_index_catalog(
        &self,
        endpoint: &EndpointRef,
    ) -> Result<Vec<IndexReplicaInfo>, DiagError> {
        let rows: Vec<CatIndexWire> = self.get_json(endpoint, "/_cat/indices?format=json")?;
        Ok(rows.into_iter().map(CatIndexWire::into_replica_info).collect())
    }
}
