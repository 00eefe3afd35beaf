//! Guided diagnostics for distributed search clusters.
//!
//! Given a cluster's health traffic light (GREEN/YELLOW/RED), the
//! dialog machine walks an operator through an ordered sequence of
//! root-cause checks - single-node topology, disk pressure, JVM/CPU
//! saturation, replica mismatch, node drop, recent index creation,
//! allocation-explain fallback - branching on each yes/no answer and on
//! metrics fetched live at each step.
//!
//! The library is stateless between turns: the caller persists the
//! session attribute bag and hands it back on the next request. See
//! [`turn::TurnController`] for the entry point.

pub mod analyzers;
pub mod config;
pub mod dialog;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod session;
pub mod turn;
pub mod wire;

pub use config::{Credential, DiagConfig, EndpointRef};
pub use dialog::DialogMachine;
pub use error::DiagError;
pub use gateway::{MetricsGateway, MetricsSource};
pub use metrics::{ClusterStatus, HealthSnapshot, IndexReplicaInfo, NodeDiskInfo, NodeResourceInfo};
pub use session::{DialogStep, SessionState, TurnResult};
pub use turn::{InboundTurn, OutboundTurn, TurnController, TurnOutcome};
