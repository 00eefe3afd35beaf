//! Wire formats for the four cluster endpoints.
//!
//! Each payload is deserialized into a typed struct and immediately
//! converted to the domain records in [`crate::metrics`]. Field defaults
//! mirror what the endpoints actually omit in the wild: GC sections on
//! fresh nodes, `os.cpu` on some platforms, `rep` on odd catalog rows.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::DiagError;
use crate::metrics::{
    ClusterStatus, HealthSnapshot, IndexReplicaInfo, NodeDiskInfo, NodeResourceInfo,
};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// `GET /_cluster/health`
#[derive(Debug, Deserialize)]
pub struct HealthWire {
    pub status: String,
    #[serde(default)]
    pub number_of_nodes: u32,
    #[serde(default)]
    pub unassigned_shards: u32,
}

impl HealthWire {
    pub fn into_snapshot(self) -> Result<HealthSnapshot, DiagError> {
        let status = ClusterStatus::parse(&self.status).ok_or_else(|| {
            DiagError::MalformedResponse(format!("unexpected cluster status '{}'", self.status))
        })?;
        Ok(HealthSnapshot {
            status,
            node_count: self.number_of_nodes,
            unassigned_shards: self.unassigned_shards,
        })
    }
}

/// `GET /_nodes/stats/fs`
#[derive(Debug, Deserialize)]
pub struct FsStatsWire {
    pub nodes: HashMap<String, FsNodeWire>,
}

#[derive(Debug, Deserialize)]
pub struct FsNodeWire {
    pub name: String,
    pub fs: FsWire,
}

#[derive(Debug, Deserialize)]
pub struct FsWire {
    pub total: FsTotalWire,
}

#[derive(Debug, Deserialize)]
pub struct FsTotalWire {
    #[serde(default)]
    pub total_in_bytes: u64,
    #[serde(default)]
    pub available_in_bytes: u64,
}

impl FsStatsWire {
    pub fn into_disk_infos(self) -> Vec<NodeDiskInfo> {
        self.nodes
            .into_values()
            .map(|node| {
                let total = node.fs.total.total_in_bytes as f64;
                let free = node.fs.total.available_in_bytes as f64;
                // A node reporting zero total bytes has no usable space.
                let percent_free = if total > 0.0 { free / total * 100.0 } else { 0.0 };
                NodeDiskInfo {
                    node_name: node.name,
                    percent_free,
                    free_gb: free / BYTES_PER_GB,
                    total_gb: total / BYTES_PER_GB,
                }
            })
            .collect()
    }
}

/// `GET /_nodes/stats/jvm,os`
#[derive(Debug, Deserialize)]
pub struct ResourceStatsWire {
    pub nodes: HashMap<String, ResourceNodeWire>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceNodeWire {
    #[serde(default = "unknown_node_name")]
    pub name: String,
    #[serde(default)]
    pub jvm: JvmWire,
    #[serde(default)]
    pub os: OsWire,
}

fn unknown_node_name() -> String {
    "unknown".to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct JvmWire {
    #[serde(default)]
    pub mem: JvmMemWire,
    #[serde(default)]
    pub gc: GcWire,
}

#[derive(Debug, Default, Deserialize)]
pub struct JvmMemWire {
    #[serde(default)]
    pub heap_used_percent: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct GcWire {
    #[serde(default)]
    pub collectors: GcCollectorsWire,
}

#[derive(Debug, Default, Deserialize)]
pub struct GcCollectorsWire {
    #[serde(default)]
    pub old: GcCollectorWire,
    #[serde(default)]
    pub young: GcCollectorWire,
}

#[derive(Debug, Default, Deserialize)]
pub struct GcCollectorWire {
    #[serde(default)]
    pub collection_count: u64,
    #[serde(default)]
    pub collection_time_in_millis: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct OsWire {
    #[serde(default)]
    pub cpu: Option<OsCpuWire>,
}

#[derive(Debug, Deserialize)]
pub struct OsCpuWire {
    #[serde(default)]
    pub percent: Option<f64>,
}

impl ResourceStatsWire {
    pub fn into_resource_infos(self) -> Vec<NodeResourceInfo> {
        self.nodes
            .into_values()
            .map(|node| NodeResourceInfo {
                node_name: node.name,
                heap_used_percent: node.jvm.mem.heap_used_percent,
                cpu_percent: node.os.cpu.and_then(|c| c.percent),
                gc_old_count: node.jvm.gc.collectors.old.collection_count,
                gc_young_count: node.jvm.gc.collectors.young.collection_count,
                gc_old_time_ms: node.jvm.gc.collectors.old.collection_time_in_millis,
                gc_young_time_ms: node.jvm.gc.collectors.young.collection_time_in_millis,
            })
            .collect()
    }
}

/// One row of `GET /_cat/indices?format=json`. The `rep` field is a
/// string on the wire and occasionally garbage.
#[derive(Debug, Deserialize)]
pub struct CatIndexWire {
    #[serde(default)]
    pub index: String,
    #[serde(default)]
    pub rep: Option<String>,
}

impl CatIndexWire {
    pub fn into_replica_info(self) -> IndexReplicaInfo {
        let replica_count = self
            .rep
            .as_deref()
            .and_then(|rep| rep.trim().parse::<u32>().ok());
        IndexReplicaInfo {
            index_name: self.index,
            replica_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_payload_parses() {
        let raw = r#"{
            "cluster_name": "demo",
            "status": "yellow",
            "number_of_nodes": 3,
            "unassigned_shards": 5,
            "active_primary_shards": 12
        }"#;
        let wire: HealthWire = serde_json::from_str(raw).unwrap();
        let snap = wire.into_snapshot().unwrap();
        assert_eq!(snap.status, ClusterStatus::Yellow);
        assert_eq!(snap.node_count, 3);
        assert_eq!(snap.unassigned_shards, 5);
    }

    #[test]
    fn health_with_unknown_status_is_malformed() {
        let wire: HealthWire =
            serde_json::from_str(r#"{"status": "sideways", "number_of_nodes": 1}"#).unwrap();
        assert!(matches!(
            wire.into_snapshot(),
            Err(DiagError::MalformedResponse(_))
        ));
    }

    #[test]
    fn fs_stats_compute_percent_free() {
        let raw = r#"{
            "nodes": {
                "abc123": {
                    "name": "data-node-1",
                    "fs": {
                        "total": {
                            "total_in_bytes": 107374182400,
                            "available_in_bytes": 10737418240
                        }
                    }
                }
            }
        }"#;
        let wire: FsStatsWire = serde_json::from_str(raw).unwrap();
        let infos = wire.into_disk_infos();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].node_name, "data-node-1");
        assert!((infos[0].percent_free - 10.0).abs() < 1e-9);
        assert!((infos[0].total_gb - 100.0).abs() < 1e-9);
        assert!((infos[0].free_gb - 10.0).abs() < 1e-9);
    }

    #[test]
    fn fs_stats_zero_total_does_not_divide() {
        let raw = r#"{
            "nodes": {
                "n": {
                    "name": "empty",
                    "fs": {"total": {"total_in_bytes": 0, "available_in_bytes": 0}}
                }
            }
        }"#;
        let wire: FsStatsWire = serde_json::from_str(raw).unwrap();
        let infos = wire.into_disk_infos();
        assert_eq!(infos[0].percent_free, 0.0);
    }

    #[test]
    fn resource_stats_tolerate_missing_sections() {
        let raw = r#"{
            "nodes": {
                "a": {
                    "name": "full-node",
                    "jvm": {
                        "mem": {"heap_used_percent": 62.5},
                        "gc": {
                            "collectors": {
                                "old": {"collection_count": 4, "collection_time_in_millis": 900},
                                "young": {"collection_count": 210, "collection_time_in_millis": 3100}
                            }
                        }
                    },
                    "os": {"cpu": {"percent": 41.0}}
                },
                "b": {
                    "name": "bare-node",
                    "jvm": {"mem": {"heap_used_percent": 30.0}}
                }
            }
        }"#;
        let wire: ResourceStatsWire = serde_json::from_str(raw).unwrap();
        let mut infos = wire.into_resource_infos();
        infos.sort_by(|a, b| a.node_name.cmp(&b.node_name));

        assert_eq!(infos[0].node_name, "bare-node");
        assert_eq!(infos[0].cpu_percent, None);
        assert_eq!(infos[0].gc_old_count, 0);

        assert_eq!(infos[1].node_name, "full-node");
        assert_eq!(infos[1].cpu_percent, Some(41.0));
        assert_eq!(infos[1].gc_young_count, 210);
        assert_eq!(infos[1].gc_old_time_ms, 900);
    }

    #[test]
    fn cat_index_rep_parsing() {
        let rows: Vec<CatIndexWire> = serde_json::from_str(
            r#"[
                {"index": "logs-1", "rep": "2"},
                {"index": "logs-2", "rep": "abc"},
                {"index": "logs-3", "rep": ""},
                {"index": "logs-4"},
                {"index": "logs-5", "rep": "1"}
            ]"#,
        )
        .unwrap();
        let infos: Vec<_> = rows.into_iter().map(CatIndexWire::into_replica_info).collect();
        assert_eq!(infos[0].replica_count, Some(2));
        assert_eq!(infos[1].replica_count, None);
        assert_eq!(infos[2].replica_count, None);
        assert_eq!(infos[3].replica_count, None);
        assert_eq!(infos[4].replica_count, Some(1));
    }
}
