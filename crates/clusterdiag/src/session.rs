//! Dialog steps and session state.
//!
//! The caller owns persistence: between turns the session travels as a
//! flat string bag, and this module round-trips it to a typed record.
//! Unknown bag keys are retained untouched so callers can piggyback
//! their own attributes.

use std::collections::HashMap;

use crate::metrics::ClusterStatus;

/// Bag keys. These are wire values; changing them breaks in-flight
/// conversations.
const KEY_STEP: &str = "step";
const KEY_CLUSTER_NAME: &str = "cluster_name";
const KEY_STATUS: &str = "status";
const KEY_NODE_COUNT: &str = "node_count";

/// The eleven dialog states plus the terminal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogStep {
    Initial,
    RedTroubleshootingConfirm,
    YellowTroubleshootingConfirm,
    CheckSingleNode,
    CheckDiskSpace,
    CheckJvmCpu,
    CheckReplicaConfig,
    CheckNodeFailures,
    CheckNewlyCreatedIndex,
    ConfirmNewIndexCreation,
    CheckAllocationIssues,
    Complete,
}

impl DialogStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogStep::Initial => "initial",
            DialogStep::RedTroubleshootingConfirm => "red_troubleshooting_confirm",
            DialogStep::YellowTroubleshootingConfirm => "yellow_troubleshooting_confirm",
            DialogStep::CheckSingleNode => "check_single_node",
            DialogStep::CheckDiskSpace => "check_disk_space",
            DialogStep::CheckJvmCpu => "check_jvm_cpu",
            DialogStep::CheckReplicaConfig => "check_replica_config",
            DialogStep::CheckNodeFailures => "check_node_failures",
            DialogStep::CheckNewlyCreatedIndex => "check_newly_created_index",
            DialogStep::ConfirmNewIndexCreation => "confirm_new_index_creation",
            DialogStep::CheckAllocationIssues => "check_allocation_issues",
            DialogStep::Complete => "complete",
        }
    }

    /// Parse a stored identifier. Anything unrecognized restarts the
    /// dialog rather than wedging it.
    pub fn parse(s: &str) -> DialogStep {
        match s {
            "initial" => DialogStep::Initial,
            "red_troubleshooting_confirm" => DialogStep::RedTroubleshootingConfirm,
            "yellow_troubleshooting_confirm" => DialogStep::YellowTroubleshootingConfirm,
            "check_single_node" => DialogStep::CheckSingleNode,
            "check_disk_space" => DialogStep::CheckDiskSpace,
            "check_jvm_cpu" => DialogStep::CheckJvmCpu,
            "check_replica_config" => DialogStep::CheckReplicaConfig,
            "check_node_failures" => DialogStep::CheckNodeFailures,
            "check_newly_created_index" => DialogStep::CheckNewlyCreatedIndex,
            "confirm_new_index_creation" => DialogStep::ConfirmNewIndexCreation,
            "check_allocation_issues" => DialogStep::CheckAllocationIssues,
            "complete" => DialogStep::Complete,
            _ => DialogStep::Initial,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DialogStep::Complete)
    }

    /// The step recorded in an attribute bag, defaulting to `initial`.
    pub fn from_bag(bag: &HashMap<String, String>) -> DialogStep {
        bag.get(KEY_STEP)
            .map(|s| DialogStep::parse(s))
            .unwrap_or(DialogStep::Initial)
    }
}

impl std::fmt::Display for DialogStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of the conversation state. `cluster_name` is always
/// present once the dialog has started; `status` and `node_count` only
/// after the initial classification that sets them.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub cluster_name: String,
    pub status: Option<ClusterStatus>,
    pub node_count: Option<u32>,
    /// Caller-owned keys we do not interpret, carried through verbatim.
    extra: HashMap<String, String>,
}

impl SessionState {
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            status: None,
            node_count: None,
            extra: HashMap::new(),
        }
    }

    /// Rebuild the typed state from the caller's bag. Returns `None`
    /// when the cluster identity is missing, which mid-dialog means the
    /// conversation context was lost.
    pub fn from_bag(bag: &HashMap<String, String>) -> Option<Self> {
        let cluster_name = bag.get(KEY_CLUSTER_NAME)?.clone();
        if cluster_name.is_empty() {
            return None;
        }

        let status = bag.get(KEY_STATUS).and_then(|s| ClusterStatus::parse(s));
        let node_count = bag.get(KEY_NODE_COUNT).and_then(|s| s.parse().ok());

        let extra = bag
            .iter()
            .filter(|(k, _)| {
                !matches!(k.as_str(), KEY_STEP | KEY_CLUSTER_NAME | KEY_STATUS | KEY_NODE_COUNT)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Some(Self {
            cluster_name,
            status,
            node_count,
            extra,
        })
    }

    /// Flatten back into the bag the caller persists, including the
    /// next step identifier. Keys are only ever added, never dropped.
    pub fn into_bag(self, next_step: DialogStep) -> HashMap<String, String> {
        let mut bag = self.extra;
        bag.insert(KEY_STEP.to_string(), next_step.as_str().to_string());
        bag.insert(KEY_CLUSTER_NAME.to_string(), self.cluster_name);
        if let Some(status) = self.status {
            bag.insert(KEY_STATUS.to_string(), status.as_str().to_string());
        }
        if let Some(node_count) = self.node_count {
            bag.insert(KEY_NODE_COUNT.to_string(), node_count.to_string());
        }
        bag
    }
}

/// Uniform result of one dialog step.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub message: String,
    pub next_step: DialogStep,
    pub session: SessionState,
}
