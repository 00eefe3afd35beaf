//! Configuration for clusterdiag.
//!
//! Loads settings from /etc/clusterdiag/config.toml or uses defaults.
//! Holds the cluster registry (name -> base URL), the transport
//! credential and the request timeout. Everything here is read-only
//! after startup; conversations share it freely.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::DiagError;

/// Config file path
pub const CONFIG_PATH: &str = "/etc/clusterdiag/config.toml";

/// Base URL of a registered cluster, resolved once per conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRef(String);

impl EndpointRef {
    pub fn new(base_url: impl Into<String>) -> Self {
        // Trailing slashes would double up when paths are appended.
        let mut url: String = base_url.into();
        while url.ends_with('/') {
            url.pop();
        }
        EndpointRef(url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

impl std::fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport credential, supplied once at startup and reused for every
/// call. There is no per-call re-authentication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credential {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
}

impl Credential {
    pub fn apply(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match self {
            Credential::None => request,
            Credential::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            Credential::Bearer { token } => request.bearer_auth(token),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagConfig {
    /// Cluster registry: name -> base URL. Fixed at process start.
    #[serde(default)]
    pub clusters: BTreeMap<String, String>,

    /// Credential applied to every metrics request.
    #[serde(default)]
    pub auth: Credential,

    /// Bound on each metrics request; expiry surfaces as a transport error.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    5
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            clusters: BTreeMap::new(),
            auth: Credential::None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl DiagConfig {
    /// Load from the default path, falling back to defaults if the file
    /// is missing or unreadable.
    pub fn load_or_default() -> Self {
        Self::load_from(Path::new(CONFIG_PATH)).unwrap_or_else(|e| {
            warn!("Could not load {}: {}. Using defaults.", CONFIG_PATH, e);
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        info!(
            "Loaded config from {} ({} registered clusters)",
            path.display(),
            config.clusters.len()
        );
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Registered cluster names, in stable order.
    pub fn known_clusters(&self) -> Vec<&str> {
        self.clusters.keys().map(String::as_str).collect()
    }

    /// Resolve a cluster name to its endpoint. Unknown names fail with
    /// the list of registered alternatives so the operator can correct
    /// themselves in one round trip.
    pub fn resolve(&self, name: &str) -> Result<EndpointRef, DiagError> {
        match self.clusters.get(name) {
            Some(url) => Ok(EndpointRef::new(url.clone())),
            None => Err(DiagError::UnknownCluster {
                name: name.to_string(),
                known: self.known_clusters().join(", "),
            }),
        }
    }
}
