//! Domain records produced by the metrics gateway.
//!
//! These are the shapes the analyzers and the dialog machine work with;
//! the raw cluster JSON never leaves the gateway layer.

use serde::{Deserialize, Serialize};

/// Cluster health traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClusterStatus {
    Green,
    Yellow,
    Red,
}

impl ClusterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStatus::Green => "GREEN",
            ClusterStatus::Yellow => "YELLOW",
            ClusterStatus::Red => "RED",
        }
    }

    /// Parse the wire value, case-insensitively. Anything else is an
    /// unexpected payload, not a fourth state.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GREEN" => Some(ClusterStatus::Green),
            "YELLOW" => Some(ClusterStatus::Yellow),
            "RED" => Some(ClusterStatus::Red),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time cluster health. Fetched fresh at every step that needs
/// it; never cached across turns, since the cluster can change between
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub status: ClusterStatus,
    pub node_count: u32,
    pub unassigned_shards: u32,
}

/// Per-node filesystem usage, one entry per live node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDiskInfo {
    pub node_name: String,
    pub percent_free: f64,
    pub free_gb: f64,
    pub total_gb: f64,
}

/// Per-node JVM heap, CPU and GC counters. CPU is absent on nodes that
/// do not report it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResourceInfo {
    pub node_name: String,
    pub heap_used_percent: f64,
    pub cpu_percent: Option<f64>,
    pub gc_old_count: u64,
    pub gc_young_count: u64,
    pub gc_old_time_ms: u64,
    pub gc_young_time_ms: u64,
}

/// One catalog entry per index. `replica_count` is `None` when the wire
/// value was absent or did not parse as an integer; invalid entries are
/// excluded from aggregates, never coerced to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexReplicaInfo {
    pub index_name: String,
    pub replica_count: Option<u32>,
}
