//! Pure analyses over metric records.
//!
//! Each function applies one fixed policy threshold. The thresholds are
//! operational policy, not user configuration; the exact boundary
//! semantics (strict comparisons) are load-bearing and pinned by tests.

use crate::metrics::{IndexReplicaInfo, NodeDiskInfo, NodeResourceInfo};

/// A node is low on disk strictly below this free percentage.
pub const LOW_DISK_PERCENT_FREE: f64 = 15.0;

/// A node's heap is saturated strictly above this usage percentage.
pub const HIGH_HEAP_PERCENT: f64 = 85.0;

/// A node's CPU is saturated strictly above this usage percentage.
pub const HIGH_CPU_PERCENT: f64 = 90.0;

/// Nodes with less than [`LOW_DISK_PERCENT_FREE`] percent free. A node
/// at exactly 15.0% is not low.
pub fn find_low_disk_nodes(all: &[NodeDiskInfo]) -> Vec<&NodeDiskInfo> {
    all.iter()
        .filter(|node| node.percent_free < LOW_DISK_PERCENT_FREE)
        .collect()
}

/// Nodes over the heap threshold, or over the CPU threshold where CPU
/// is reported at all. A node with heap 86% and no CPU reading still
/// counts.
pub fn find_saturated_nodes(all: &[NodeResourceInfo]) -> Vec<&NodeResourceInfo> {
    all.iter()
        .filter(|node| {
            node.heap_used_percent > HIGH_HEAP_PERCENT
                || node
                    .cpu_percent
                    .map(|cpu| cpu > HIGH_CPU_PERCENT)
                    .unwrap_or(false)
        })
        .collect()
}

/// Highest valid replica count across the catalog, 0 when nothing
/// parses. Invalid entries are skipped, never read as zero.
pub fn max_replica_count(indices: &[IndexReplicaInfo]) -> u32 {
    indices
        .iter()
        .filter_map(|idx| idx.replica_count)
        .max()
        .unwrap_or(0)
}

/// A replica setting that cannot be satisfied by the current topology.
pub fn replica_mismatch(max_replicas: u32, node_count: u32) -> bool {
    max_replicas >= node_count
}

/// True when nodes have dropped out since the dialog began.
pub fn node_count_drop(expected: u32, current: u32) -> bool {
    current < expected
}

/// Mean free-space percentage, `None` for an empty node list.
pub fn mean_percent_free(all: &[NodeDiskInfo]) -> Option<f64> {
    if all.is_empty() {
        return None;
    }
    Some(all.iter().map(|n| n.percent_free).sum::<f64>() / all.len() as f64)
}

/// Mean heap usage over every node, `None` for an empty list.
pub fn mean_heap_percent(all: &[NodeResourceInfo]) -> Option<f64> {
    if all.is_empty() {
        return None;
    }
    Some(all.iter().map(|n| n.heap_used_percent).sum::<f64>() / all.len() as f64)
}

/// Mean CPU usage over the nodes that report CPU; `None` when none do.
/// Non-reporting nodes are excluded here but still count toward the
/// heap mean. That asymmetry is intentional.
pub fn mean_cpu_percent(all: &[NodeResourceInfo]) -> Option<f64> {
    let reporting: Vec<f64> = all.iter().filter_map(|n| n.cpu_percent).collect();
    if reporting.is_empty() {
        return None;
    }
    Some(reporting.iter().sum::<f64>() / reporting.len() as f64)
}
