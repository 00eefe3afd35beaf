//! Per-request entry point: inbound/outbound turn envelopes and the
//! controller that wires the dialog machine to the registry and the
//! metrics gateway.
//!
//! The controller is stateless between calls; everything a conversation
//! needs to continue rides in the outbound session attributes, which
//! the caller must hand back verbatim on the next turn.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::DiagConfig;
use crate::dialog::DialogMachine;
use crate::error::DiagError;
use crate::gateway::{MetricsGateway, MetricsSource};
use crate::session::{DialogStep, SessionState};

/// One request from the conversational front-end. The structured
/// `user_response` slot, when present and non-empty, takes precedence
/// over the raw transcript: an explicitly extracted value is more
/// reliable than transcribed speech.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundTurn {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub user_response: Option<String>,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub session_attributes: HashMap<String, String>,
}

impl InboundTurn {
    /// The normalized user response: slot over transcript, lowercased
    /// and trimmed.
    pub fn normalized_response(&self) -> String {
        let raw = match &self.user_response {
            Some(slot) if !slot.trim().is_empty() => slot.as_str(),
            _ => self.transcript.as_str(),
        };
        raw.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Terminal: the diagnosis ran to a conclusion.
    Fulfilled,
    /// Terminal: the turn could not be processed.
    Failed,
    /// The dialog continues; persist the session attributes.
    InProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundTurn {
    pub outcome: TurnOutcome,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_attributes: Option<HashMap<String, String>>,
}

impl OutboundTurn {
    fn failed(message: String) -> Self {
        Self {
            outcome: TurnOutcome::Failed,
            message,
            session_attributes: None,
        }
    }
}

/// Handles one turn end-to-end: extract, resolve, dispatch, shape.
pub struct TurnController {
    config: DiagConfig,
    metrics: Box<dyn MetricsSource>,
}

impl TurnController {
    /// Production wiring: one HTTP gateway built from the config,
    /// shared by every conversation.
    pub fn new(config: DiagConfig) -> Result<Self, DiagError> {
        let gateway = MetricsGateway::new(&config)?;
        Ok(Self {
            config,
            metrics: Box::new(gateway),
        })
    }

    /// Wiring with a caller-supplied metrics source.
    pub fn with_source(config: DiagConfig, metrics: Box<dyn MetricsSource>) -> Self {
        Self { config, metrics }
    }

    /// Process one turn. Errors never escape: they become terminal
    /// `Failed` turns with a plain-text explanation.
    pub fn handle_turn(&self, inbound: &InboundTurn) -> OutboundTurn {
        match self.run(inbound) {
            Ok(outbound) => outbound,
            Err(err) => {
                match &err {
                    // Malformed payloads share the transport user
                    // message but deserve their own log line.
                    DiagError::MalformedResponse(detail) => {
                        error!("Malformed cluster response: {}", detail)
                    }
                    other => warn!("Turn failed: {}", other),
                }
                OutboundTurn::failed(err.user_message())
            }
        }
    }

    fn run(&self, inbound: &InboundTurn) -> Result<OutboundTurn, DiagError> {
        let step = DialogStep::from_bag(&inbound.session_attributes);
        let response = inbound.normalized_response();

        let result = if step == DialogStep::Initial {
            let cluster_name = self.initial_cluster_name(inbound)?;
            let endpoint = self.config.resolve(&cluster_name)?;
            info!("Starting diagnosis for cluster '{}'", cluster_name);
            DialogMachine::new(self.metrics.as_ref(), &endpoint).start(&cluster_name)?
        } else {
            let session = SessionState::from_bag(&inbound.session_attributes)
                .ok_or(DiagError::SessionIntegrity)?;
            let endpoint = self.config.resolve(&session.cluster_name)?;
            DialogMachine::new(self.metrics.as_ref(), &endpoint).step(step, &response, session)?
        };

        if result.next_step.is_terminal() {
            Ok(OutboundTurn {
                outcome: TurnOutcome::Fulfilled,
                message: result.message,
                session_attributes: None,
            })
        } else {
            Ok(OutboundTurn {
                outcome: TurnOutcome::InProgress,
                message: result.message,
                session_attributes: Some(result.session.into_bag(result.next_step)),
            })
        }
    }

    /// Cluster identity at `initial`: slot first, then a prior bag.
    /// A missing identity is a configuration error, not a placeholder.
    fn initial_cluster_name(&self, inbound: &InboundTurn) -> Result<String, DiagError> {
        if let Some(slot) = &inbound.cluster_name {
            let trimmed = slot.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
        if let Some(prior) = inbound.session_attributes.get("cluster_name") {
            if !prior.trim().is_empty() {
                return Ok(prior.trim().to_string());
            }
        }
        Err(DiagError::MissingClusterName)
    }
}
