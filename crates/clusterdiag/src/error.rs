//! Error types for clusterdiag.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagError {
    #[error("Unknown cluster '{name}'. Available clusters: {known}")]
    UnknownCluster { name: String, known: String },

    #[error("No cluster name provided. Tell me which cluster to look at.")]
    MissingClusterName,

    #[error("Lost cluster context in session. Please start the diagnosis again.")]
    SessionIntegrity,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response from cluster: {0}")]
    MalformedResponse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiagError {
    /// Text shown to the operator when a turn fails.
    ///
    /// Transport and malformed-payload failures share one generic message;
    /// the distinction only matters in the logs.
    pub fn user_message(&self) -> String {
        match self {
            DiagError::Transport(_) | DiagError::MalformedResponse(_) => {
                "Error diagnosing cluster: could not reach the metrics endpoint.\n\n\
                 Check cluster connectivity and try again."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for DiagError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DiagError::MalformedResponse(err.to_string())
        } else {
            DiagError::Transport(err.to_string())
        }
    }
}
