//! The dialog state machine: an ordered troubleshooting script with
//! data-dependent branching.
//!
//! Every non-initial step applies the same policy: an affirmative
//! answer runs the step's check, a decline ends the dialog politely,
//! and input we cannot read at all re-asks the same question. A step
//! that finds a root cause short-circuits straight to `complete`; a
//! clean check reports an aggregate and moves to the next step. Live
//! metrics are fetched exactly where a step needs them, never cached
//! across steps.

use tracing::{debug, info};

use crate::analyzers;
use crate::config::EndpointRef;
use crate::error::DiagError;
use crate::gateway::MetricsSource;
use crate::metrics::ClusterStatus;
use crate::session::{DialogStep, SessionState, TurnResult};

/// The one vocabulary of agreement, shared by every step.
pub const AFFIRMATIVE_TOKENS: &[&str] = &["y", "yes", "yeah", "yep", "1"];

/// True for any canonical affirmative token, case-insensitive, trimmed.
pub fn is_affirmative(response: &str) -> bool {
    let normalized = response.trim().to_lowercase();
    AFFIRMATIVE_TOKENS.contains(&normalized.as_str())
}

/// How a step reads the operator's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reply {
    Affirmative,
    Decline,
    /// Nothing usable was extracted; re-ask the same question.
    Unintelligible,
}

fn classify(response: &str) -> Reply {
    let normalized = response.trim().to_lowercase();
    if normalized.is_empty() {
        Reply::Unintelligible
    } else if AFFIRMATIVE_TOKENS.contains(&normalized.as_str()) {
        Reply::Affirmative
    } else {
        Reply::Decline
    }
}

/// Step sequencer for one conversation turn. Holds no state of its own;
/// everything that survives the turn lives in [`SessionState`].
pub struct DialogMachine<'a> {
    metrics: &'a dyn MetricsSource,
    endpoint: &'a EndpointRef,
}

impl<'a> DialogMachine<'a> {
    pub fn new(metrics: &'a dyn MetricsSource, endpoint: &'a EndpointRef) -> Self {
        Self { metrics, endpoint }
    }

    /// The `initial` step: classify cluster health and open the dialog.
    /// Does not consult the user response.
    pub fn start(&self, cluster_name: &str) -> Result<TurnResult, DiagError> {
        let health = self.metrics.fetch_health(self.endpoint)?;
        info!(
            "Initial diagnosis for '{}': {} ({} nodes, {} unassigned shards)",
            cluster_name, health.status, health.node_count, health.unassigned_shards
        );

        let mut session = SessionState::new(cluster_name);
        session.status = Some(health.status);

        match health.status {
            ClusterStatus::Green => Ok(TurnResult {
                message: format!(
                    "Fetching status for cluster '{cluster_name}': Diagnosis = GREEN\n\n\
                     Your cluster is healthy! All shards are properly allocated. \
                     No troubleshooting needed."
                ),
                next_step: DialogStep::Complete,
                session,
            }),
            ClusterStatus::Red => Ok(TurnResult {
                message: format!(
                    "Fetching status for cluster '{cluster_name}': Diagnosis = RED\n\n\
                     CRITICAL: Your cluster has missing PRIMARY shards - potential data loss!\n\n\
                     Would you like me to walk you through emergency troubleshooting? (Y/N)"
                ),
                next_step: DialogStep::RedTroubleshootingConfirm,
                session,
            }),
            ClusterStatus::Yellow => {
                session.node_count = Some(health.node_count);
                Ok(TurnResult {
                    message: format!(
                        "Fetching status for cluster '{cluster_name}': Diagnosis = YELLOW\n\n\
                         Your cluster has {} unassigned shards. This means your data is safe, \
                         but some replica shards aren't allocated.\n\n\
                         Would you like me to walk you through troubleshooting? (Y/N)",
                        health.unassigned_shards
                    ),
                    next_step: DialogStep::YellowTroubleshootingConfirm,
                    session,
                })
            }
        }
    }

    /// Advance the dialog by one step given the normalized user response.
    pub fn step(
        &self,
        step: DialogStep,
        response: &str,
        session: SessionState,
    ) -> Result<TurnResult, DiagError> {
        debug!("Dialog step '{}', response '{}'", step, response);

        match step {
            // Re-entry on a stale bag restarts the diagnosis.
            DialogStep::Initial => self.start(&session.cluster_name),

            // Terminal: no metrics calls, no transitions.
            DialogStep::Complete => Ok(TurnResult {
                message: "This diagnosis is finished. Ask me to check your cluster again to \
                          start a new one."
                    .to_string(),
                next_step: DialogStep::Complete,
                session,
            }),

            _ => match classify(response) {
                Reply::Unintelligible => Ok(TurnResult {
                    message: "I didn't understand that response. Please answer with Y (yes) \
                              or N (no)."
                        .to_string(),
                    next_step: step,
                    session,
                }),
                Reply::Decline => Ok(self.decline(step, session)),
                Reply::Affirmative => self.run_step(step, session),
            },
        }
    }

    /// The decline branch, identical in shape for every step: end the
    /// dialog with a come-back-later message. Two deviations survive
    /// from the script: the RED confirmation declines with an urgency
    /// warning, and declining "did you create an index?" is an answer,
    /// not a decline, so it advances.
    fn decline(&self, step: DialogStep, session: SessionState) -> TurnResult {
        let message = match step {
            DialogStep::RedTroubleshootingConfirm => {
                "Understood. Please address the RED cluster status urgently - it indicates \
                 potential data loss. Contact support if needed."
            }
            DialogStep::YellowTroubleshootingConfirm => {
                "No problem! If you need troubleshooting help later, just ask me to check \
                 your cluster again."
            }
            DialogStep::ConfirmNewIndexCreation => {
                return TurnResult {
                    message: "No recent index creation.\n\n\
                              Let's move to the final step: checking for other allocation \
                              issues.\n\n\
                              Would you like me to proceed? (Y/N)"
                        .to_string(),
                    next_step: DialogStep::CheckAllocationIssues,
                    session,
                };
            }
            _ => "No problem! Feel free to ask if you need help later.",
        };
        TurnResult {
            message: message.to_string(),
            next_step: DialogStep::Complete,
            session,
        }
    }

    /// The affirmative branch: run the step's diagnostic action.
    fn run_step(&self, step: DialogStep, session: SessionState) -> Result<TurnResult, DiagError> {
        match step {
            DialogStep::RedTroubleshootingConfirm => Ok(red_emergency_guidance(session)),
            DialogStep::YellowTroubleshootingConfirm => Ok(TurnResult {
                message: "Great! For the first step of troubleshooting, I need to check if \
                          this is a single-node cluster.\n\n\
                          Would you like me to proceed? (Y/N)"
                    .to_string(),
                next_step: DialogStep::CheckSingleNode,
                session,
            }),
            DialogStep::CheckSingleNode => Ok(check_single_node(session)),
            DialogStep::CheckDiskSpace => self.check_disk_space(session),
            DialogStep::CheckJvmCpu => self.check_jvm_cpu(session),
            DialogStep::CheckReplicaConfig => self.check_replica_config(session),
            DialogStep::CheckNodeFailures => self.check_node_failures(session),
            DialogStep::CheckNewlyCreatedIndex => Ok(ask_about_new_indices(session)),
            DialogStep::ConfirmNewIndexCreation => Ok(new_index_confirmed(session)),
            DialogStep::CheckAllocationIssues => self.allocation_summary(session),
            // Handled before dispatch.
            DialogStep::Initial | DialogStep::Complete => self.step(step, "", session),
        }
    }

    fn check_disk_space(&self, session: SessionState) -> Result<TurnResult, DiagError> {
        let all = self.metrics.fetch_node_disk_stats(self.endpoint)?;
        let low = analyzers::find_low_disk_nodes(&all);

        if !low.is_empty() {
            info!("Low disk space on {} of {} nodes", low.len(), all.len());
            let nodes_text = low
                .iter()
                .map(|node| format!("  - {}: {:.2}% free", node.node_name, node.percent_free))
                .collect::<Vec<_>>()
                .join("\n");
            return Ok(TurnResult {
                message: format!(
                    "Low disk space detected!\n\n\
                     Nodes with low disk space (<{:.0}% free):\n{nodes_text}\n\n\
                     Why this causes YELLOW status: the cluster stops allocating shards when \
                     nodes run low on space.\n\n\
                     Try these solutions:\n\
                     1. Delete any unwanted indices\n\
                     2. Scale up the storage volumes\n\
                     3. Add more data nodes\n\n\
                     This is likely the cause of your yellow cluster status.",
                    analyzers::LOW_DISK_PERCENT_FREE
                ),
                next_step: DialogStep::Complete,
                session,
            });
        }

        let summary = match analyzers::mean_percent_free(&all) {
            Some(avg) => format!("average {avg:.1}% free across nodes"),
            None => "no nodes reported filesystem statistics".to_string(),
        };
        Ok(TurnResult {
            message: format!(
                "Disk space looks good ({summary}).\n\n\
                 Let's move to step 3: checking for high JVM/CPU usage.\n\n\
                 Would you like me to proceed? (Y/N)"
            ),
            next_step: DialogStep::CheckJvmCpu,
            session,
        })
    }

    fn check_jvm_cpu(&self, session: SessionState) -> Result<TurnResult, DiagError> {
        let all = self.metrics.fetch_node_resource_stats(self.endpoint)?;
        let high = analyzers::find_saturated_nodes(&all);

        if !high.is_empty() {
            info!("High JVM/CPU usage on {} of {} nodes", high.len(), all.len());
            let nodes_text = high
                .iter()
                .map(|node| {
                    let cpu_text = match node.cpu_percent {
                        Some(cpu) => format!("{cpu:.1}%"),
                        None => "N/A".to_string(),
                    };
                    format!(
                        "  - {}: {:.1}% heap, {} CPU",
                        node.node_name, node.heap_used_percent, cpu_text
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            return Ok(TurnResult {
                message: format!(
                    "High JVM/CPU usage detected!\n\n\
                     Nodes with high resource usage:\n{nodes_text}\n\n\
                     Why this causes YELLOW status: high JVM heap or CPU usage can prevent \
                     proper shard allocation.\n\n\
                     Solutions:\n\
                     - Scale up your instances (more CPU/memory)\n\
                     - Reduce query load temporarily\n\
                     - Check for inefficient queries or indexing\n\
                     - Consider adding more nodes to distribute load\n\n\
                     This high resource usage is likely causing your yellow cluster status."
                ),
                next_step: DialogStep::Complete,
                session,
            });
        }

        // The CPU mean covers only nodes that report CPU; the heap mean
        // covers all of them.
        let heap_summary = match analyzers::mean_heap_percent(&all) {
            Some(avg) => format!("average {avg:.1}% heap"),
            None => "no nodes reported JVM statistics".to_string(),
        };
        let cpu_summary = match analyzers::mean_cpu_percent(&all) {
            Some(avg) => format!(", {avg:.1}% CPU"),
            None => String::new(),
        };
        Ok(TurnResult {
            message: format!(
                "JVM/CPU levels appear normal ({heap_summary}{cpu_summary}).\n\n\
                 Let's move to step 4: checking replica configuration.\n\n\
                 Would you like me to proceed? (Y/N)"
            ),
            next_step: DialogStep::CheckReplicaConfig,
            session,
        })
    }

    fn check_replica_config(&self, session: SessionState) -> Result<TurnResult, DiagError> {
        let indices = self.metrics.fetch_index_catalog(self.endpoint)?;
        let node_count = session.node_count.unwrap_or(0);
        let max_replicas = analyzers::max_replica_count(&indices);

        if analyzers::replica_mismatch(max_replicas, node_count) {
            info!(
                "Replica mismatch: max {} replicas vs {} nodes",
                max_replicas, node_count
            );
            return Ok(TurnResult {
                message: format!(
                    "Replica configuration issue found!\n\n\
                     Problem: you have indices with {max_replicas} replicas, but only \
                     {node_count} nodes.\n\n\
                     Why this causes YELLOW: replicas can't be allocated because there \
                     aren't enough nodes to place them on.\n\n\
                     Solutions:\n\
                     1. Reduce replica count: PUT _all/_settings \
                     {{\"index\":{{\"number_of_replicas\":1}}}}\n\
                     2. Add more nodes to accommodate current replica settings\n\n\
                     This is likely causing your yellow cluster status."
                ),
                next_step: DialogStep::Complete,
                session,
            });
        }

        Ok(TurnResult {
            message: format!(
                "Replica configuration looks reasonable (max {max_replicas} replicas for \
                 {node_count} nodes).\n\n\
                 Let's move to step 5: checking for node failures.\n\n\
                 Would you like me to proceed? (Y/N)"
            ),
            next_step: DialogStep::CheckNodeFailures,
            session,
        })
    }

    fn check_node_failures(&self, session: SessionState) -> Result<TurnResult, DiagError> {
        // Fresh snapshot: node membership may have changed mid-dialog.
        let health = self.metrics.fetch_health(self.endpoint)?;
        let current = health.node_count;
        let expected = session.node_count.unwrap_or(current);

        if analyzers::node_count_drop(expected, current) {
            info!("Node count dropped: expected {}, current {}", expected, current);
            return Ok(TurnResult {
                message: format!(
                    "Node failure detected!\n\n\
                     Expected nodes: {expected}\n\
                     Current nodes: {current}\n\n\
                     Some nodes appear to have failed or disconnected. This is likely \
                     causing your yellow status.\n\n\
                     Solutions:\n\
                     - Check your monitoring for node health metrics\n\
                     - Verify if nodes crashed or were terminated\n\
                     - Restart failed nodes if needed\n\
                     - Check network connectivity between nodes\n\n\
                     This node failure is likely the cause of your yellow cluster status."
                ),
                next_step: DialogStep::Complete,
                session,
            });
        }

        Ok(TurnResult {
            message: format!(
                "All {current} nodes appear healthy and connected.\n\n\
                 Let's move to step 6: checking for newly created indices.\n\n\
                 Would you like me to proceed? (Y/N)"
            ),
            next_step: DialogStep::CheckNewlyCreatedIndex,
            session,
        })
    }

    fn allocation_summary(&self, session: SessionState) -> Result<TurnResult, DiagError> {
        let health = self.metrics.fetch_health(self.endpoint)?;
        Ok(TurnResult {
            message: format!(
                "Final diagnosis for your yellow cluster:\n\n\
                 Status: {} unassigned shards remain after basic checks.\n\n\
                 Likely causes:\n\
                 - Allocation awareness settings (zone/rack awareness)\n\
                 - Custom shard allocation filtering rules\n\
                 - Recent cluster changes still rebalancing\n\n\
                 Advanced diagnostic commands:\n\
                 GET _cluster/allocation/explain\n\
                 GET _cat/shards?v&h=index,shard,prirep,state,unassigned.reason\n\n\
                 Quick fix to try:\n\
                 POST _cluster/reroute?retry_failed=true\n\n\
                 If these steps don't resolve the issue, review your allocation settings \
                 or contact support.",
                health.unassigned_shards
            ),
            next_step: DialogStep::Complete,
            session,
        })
    }
}

/// Single-node topology inherently explains YELLOW; nothing else needs
/// checking.
fn check_single_node(session: SessionState) -> TurnResult {
    let node_count = session.node_count.unwrap_or(0);

    if node_count == 1 {
        return TurnResult {
            message: "Single-node cluster detected!\n\n\
                      Single-node clusters always show YELLOW status because replicas \
                      cannot be assigned (there's nowhere else to put them).\n\n\
                      To achieve GREEN status:\n\
                      - Increase your node count to 2+ nodes, OR\n\
                      - Set replica count to 0 for single-node setups\n\n\
                      This is normal behavior for single-node clusters."
                .to_string(),
            next_step: DialogStep::Complete,
            session,
        };
    }

    TurnResult {
        message: format!(
            "Not a single-node cluster (you have {node_count} nodes).\n\n\
             Let's move to step 2: checking disk space on your nodes.\n\n\
             Would you like me to proceed? (Y/N)"
        ),
        next_step: DialogStep::CheckDiskSpace,
        session,
    }
}

/// This step needs no live data; the operator knows better than the
/// catalog whether an index is new.
fn ask_about_new_indices(session: SessionState) -> TurnResult {
    TurnResult {
        message: "Have you recently created any new indices in the last few hours?\n\n\
                  If YES: multi-node clusters might briefly show YELLOW status after \
                  creating new indices. This is normal behavior while the cluster \
                  replicates data across nodes.\n\n\
                  This status typically self-resolves within minutes as replication \
                  completes.\n\n\
                  Did you create any new indices recently? (Y/N)"
            .to_string(),
        next_step: DialogStep::ConfirmNewIndexCreation,
        session,
    }
}

fn new_index_confirmed(session: SessionState) -> TurnResult {
    TurnResult {
        message: "Recent index creation confirmed!\n\n\
                  This explains your yellow cluster status. When new indices are created:\n\n\
                  1. Primary shards are placed first\n\
                  2. Replica shards are then allocated across other nodes\n\
                  3. During this process the cluster shows YELLOW status\n\
                  4. Once replication completes, status returns to GREEN\n\n\
                  Solution: wait 5-10 minutes for the replication to complete. The status \
                  should self-resolve.\n\n\
                  Monitor with: GET _cat/indices?v to see when all shards are allocated.\n\n\
                  This is normal behavior and not a cause for concern."
            .to_string(),
        next_step: DialogStep::Complete,
        session,
    }
}

fn red_emergency_guidance(session: SessionState) -> TurnResult {
    TurnResult {
        message: "RED cluster emergency troubleshooting:\n\n\
                  IMMEDIATE ACTIONS:\n\
                  1. DO NOT restart nodes without understanding the cause\n\
                  2. Check if any nodes crashed or were terminated\n\
                  3. Verify network connectivity between nodes\n\
                  4. Look for hardware or disk failures\n\n\
                  Critical diagnostic commands:\n\
                  GET _cluster/allocation/explain\n\
                  GET _cat/nodes?v\n\
                  GET _cat/recovery?v\n\n\
                  WARNING: RED status means PRIMARY shards are missing - potential data \
                  loss!\n\n\
                  Contact support immediately if you're unsure about data recovery \
                  procedures."
            .to_string(),
        next_step: DialogStep::Complete,
        session,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{
        HealthSnapshot, IndexReplicaInfo, NodeDiskInfo, NodeResourceInfo,
    };

    /// Canned metrics source, in the spirit of the fake clients we use
    /// for exercising dialog logic without a cluster.
    #[derive(Default)]
    struct FakeMetrics {
        health: Option<HealthSnapshot>,
        disks: Vec<NodeDiskInfo>,
        resources: Vec<NodeResourceInfo>,
        indices: Vec<IndexReplicaInfo>,
    }

    impl MetricsSource for FakeMetrics {
        fn fetch_health(&self, _: &EndpointRef) -> Result<HealthSnapshot, DiagError> {
            self.health
                .clone()
                .ok_or_else(|| DiagError::Transport("no health fixture".to_string()))
        }

        fn fetch_node_disk_stats(&self, _: &EndpointRef) -> Result<Vec<NodeDiskInfo>, DiagError> {
            Ok(self.disks.clone())
        }

        fn fetch_node_resource_stats(
            &self,
            _: &EndpointRef,
        ) -> Result<Vec<NodeResourceInfo>, DiagError> {
            Ok(self.resources.clone())
        }

        fn fetch_index_catalog(
            &self,
            _: &EndpointRef,
        ) -> Result<Vec<IndexReplicaInfo>, DiagError> {
            Ok(self.indices.clone())
        }
    }

    fn endpoint() -> EndpointRef {
        EndpointRef::new("http://localhost:9200")
    }

    fn health(status: ClusterStatus, nodes: u32, unassigned: u32) -> HealthSnapshot {
        HealthSnapshot {
            status,
            node_count: nodes,
            unassigned_shards: unassigned,
        }
    }

    fn disk(name: &str, percent_free: f64) -> NodeDiskInfo {
        NodeDiskInfo {
            node_name: name.to_string(),
            percent_free,
            free_gb: 5.0,
            total_gb: 50.0,
        }
    }

    fn resources(name: &str, heap: f64, cpu: Option<f64>) -> NodeResourceInfo {
        NodeResourceInfo {
            node_name: name.to_string(),
            heap_used_percent: heap,
            cpu_percent: cpu,
            gc_old_count: 1,
            gc_young_count: 10,
            gc_old_time_ms: 100,
            gc_young_time_ms: 500,
        }
    }

    fn yellow_session(nodes: u32) -> SessionState {
        let mut session = SessionState::new("dev");
        session.status = Some(ClusterStatus::Yellow);
        session.node_count = Some(nodes);
        session
    }

    #[test]
    fn affirmative_vocabulary() {
        for token in ["Y", "y", "Yes", "YEAH", "yep", "1", "  yes  "] {
            assert!(is_affirmative(token), "{token:?} should be affirmative");
        }
        for token in ["no", "n", "nope", "maybe", "2", "yess"] {
            assert!(!is_affirmative(token), "{token:?} should not be affirmative");
        }
    }

    #[test]
    fn green_cluster_completes_immediately() {
        let fake = FakeMetrics {
            health: Some(health(ClusterStatus::Green, 3, 0)),
            ..Default::default()
        };
        let ep = endpoint();
        let result = DialogMachine::new(&fake, &ep).start("dev").unwrap();
        assert_eq!(result.next_step, DialogStep::Complete);
        assert!(result.message.contains("healthy"));
        assert_eq!(result.session.status, Some(ClusterStatus::Green));
    }

    #[test]
    fn yellow_cluster_seeds_node_count() {
        let fake = FakeMetrics {
            health: Some(health(ClusterStatus::Yellow, 3, 5)),
            ..Default::default()
        };
        let ep = endpoint();
        let result = DialogMachine::new(&fake, &ep).start("dev").unwrap();
        assert_eq!(result.next_step, DialogStep::YellowTroubleshootingConfirm);
        assert!(result.message.contains("5 unassigned shards"));
        assert_eq!(result.session.node_count, Some(3));
    }

    #[test]
    fn red_cluster_offers_emergency_path() {
        let fake = FakeMetrics {
            health: Some(health(ClusterStatus::Red, 3, 12)),
            ..Default::default()
        };
        let ep = endpoint();
        let result = DialogMachine::new(&fake, &ep).start("dev").unwrap();
        assert_eq!(result.next_step, DialogStep::RedTroubleshootingConfirm);
        assert_eq!(result.session.status, Some(ClusterStatus::Red));
        assert_eq!(result.session.node_count, None);
    }

    #[test]
    fn decline_ends_the_dialog() {
        let fake = FakeMetrics::default();
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::CheckDiskSpace, "no thanks", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::Complete);
        assert!(result.message.contains("No problem"));
    }

    #[test]
    fn unintelligible_input_reprompts_the_same_step() {
        let fake = FakeMetrics::default();
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::CheckJvmCpu, "   ", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::CheckJvmCpu);
        assert!(result.message.contains("Y (yes) or N (no)"));
    }

    #[test]
    fn single_node_cluster_terminates_with_explanation() {
        let fake = FakeMetrics::default();
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::CheckSingleNode, "yes", yellow_session(1))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::Complete);
        assert!(result.message.contains("Single-node cluster detected"));
    }

    #[test]
    fn multi_node_cluster_advances_to_disk_check() {
        let fake = FakeMetrics::default();
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::CheckSingleNode, "y", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::CheckDiskSpace);
        assert!(result.message.contains("3 nodes"));
    }

    #[test]
    fn low_disk_short_circuits_with_node_detail() {
        let fake = FakeMetrics {
            disks: vec![disk("data-1", 10.0), disk("data-2", 40.0)],
            ..Default::default()
        };
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::CheckDiskSpace, "yes", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::Complete);
        assert!(result.message.contains("data-1: 10.00% free"));
        assert!(!result.message.contains("data-2"));
    }

    #[test]
    fn clean_disk_reports_average_and_advances() {
        let fake = FakeMetrics {
            disks: vec![disk("data-1", 30.0), disk("data-2", 50.0)],
            ..Default::default()
        };
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::CheckDiskSpace, "yes", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::CheckJvmCpu);
        assert!(result.message.contains("average 40.0% free"));
    }

    #[test]
    fn saturated_node_short_circuits_with_cpu_na_for_silent_nodes() {
        let fake = FakeMetrics {
            resources: vec![
                resources("hot", 90.0, None),
                resources("cool", 40.0, Some(20.0)),
            ],
            ..Default::default()
        };
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::CheckJvmCpu, "yes", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::Complete);
        assert!(result.message.contains("hot: 90.0% heap, N/A CPU"));
    }

    #[test]
    fn clean_jvm_omits_cpu_average_when_nothing_reports() {
        let fake = FakeMetrics {
            resources: vec![resources("a", 40.0, None), resources("b", 60.0, None)],
            ..Default::default()
        };
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::CheckJvmCpu, "yes", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::CheckReplicaConfig);
        assert!(result.message.contains("average 50.0% heap"));
        assert!(!result.message.contains("CPU"));
    }

    #[test]
    fn replica_count_equal_to_node_count_is_a_mismatch() {
        let fake = FakeMetrics {
            indices: vec![IndexReplicaInfo {
                index_name: "logs".to_string(),
                replica_count: Some(3),
            }],
            ..Default::default()
        };
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::CheckReplicaConfig, "yes", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::Complete);
        assert!(result.message.contains("3 replicas, but only 3 nodes"));
    }

    #[test]
    fn node_drop_is_detected_against_seeded_count() {
        let fake = FakeMetrics {
            health: Some(health(ClusterStatus::Yellow, 2, 4)),
            ..Default::default()
        };
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::CheckNodeFailures, "yes", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::Complete);
        assert!(result.message.contains("Expected nodes: 3"));
        assert!(result.message.contains("Current nodes: 2"));
    }

    #[test]
    fn declining_new_index_question_advances_to_allocation_check() {
        let fake = FakeMetrics::default();
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::ConfirmNewIndexCreation, "n", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::CheckAllocationIssues);
        assert!(result.message.contains("final step"));
    }

    #[test]
    fn allocation_summary_reports_remaining_unassigned_shards() {
        let fake = FakeMetrics {
            health: Some(health(ClusterStatus::Yellow, 3, 7)),
            ..Default::default()
        };
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::CheckAllocationIssues, "yes", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::Complete);
        assert!(result.message.contains("7 unassigned shards"));
        assert!(result.message.contains("_cluster/allocation/explain"));
    }

    #[test]
    fn red_decline_still_urges_action() {
        let fake = FakeMetrics::default();
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let mut session = SessionState::new("dev");
        session.status = Some(ClusterStatus::Red);
        let result = machine
            .step(DialogStep::RedTroubleshootingConfirm, "no", session)
            .unwrap();
        assert_eq!(result.next_step, DialogStep::Complete);
        assert!(result.message.contains("urgently"));
    }

    #[test]
    fn complete_is_terminal_and_fetches_nothing() {
        // FakeMetrics with no health fixture errors on any fetch, so
        // this also proves no metrics call happens.
        let fake = FakeMetrics::default();
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let result = machine
            .step(DialogStep::Complete, "yes", yellow_session(3))
            .unwrap();
        assert_eq!(result.next_step, DialogStep::Complete);
    }

    #[test]
    fn transport_failure_propagates() {
        let fake = FakeMetrics::default();
        let ep = endpoint();
        let machine = DialogMachine::new(&fake, &ep);
        let err = machine
            .step(DialogStep::CheckNodeFailures, "yes", yellow_session(3))
            .unwrap_err();
        assert!(matches!(err, DiagError::Transport(_)));
    }
}
