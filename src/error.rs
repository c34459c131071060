//! Error types for the claim decision pipeline
//!
//! One thiserror enum per collaborator concern, so the seam a failure
//! crossed is visible in its type.
//!
//! The taxonomy mirrors the failure policy of the pipeline: repair and
//! generative failures are absorbed locally behind deterministic fallbacks,
//! only retrieval failure (or an unclassified fault at the orchestrator
//! boundary) ever surfaces to the caller, and then only as an error-shaped
//! `DecisionResult`, never as a propagated fault.

use thiserror::Error;

/// Unrecoverable repair of malformed generative output.
///
/// Carries the original text so callers can log exactly what the generator
/// produced; the repair engine never substitutes empty or invented JSON.
#[derive(Error, Debug)]
pub enum RepairError {
    #[error("no parseable JSON object in generative output ({} chars)", original.len())]
    Unrecoverable { original: String },
}

impl RepairError {
    /// The raw generator output that could not be repaired.
    pub fn original(&self) -> &str {
        match self {
            RepairError::Unrecoverable { original } => original,
        }
    }
}

/// Failures of the generative text collaborator.
#[derive(Error, Debug)]
pub enum GenerativeError {
    #[error("generative request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generative collaborator returned an empty response")]
    EmptyResponse,

    #[error("no usable generative output after {attempts} attempts")]
    AllAttemptsFailed { attempts: u32 },

    #[error("unusable generative output: {0}")]
    Repair(#[from] RepairError),
}

/// Failures of the clause retrieval collaborator.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("clause index not found; build the index before querying")]
    IndexNotReady,

    #[error("retrieval backend error: {0}")]
    Backend(String),
}
