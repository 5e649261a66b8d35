//! Error types for the fleet provisioning workflow.
//!
//! No `anyhow` leakage. Explicit, typed errors.

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("resolution failed: {0}")]
    Resolution(String),

    #[error("deployment conflict: {0}")]
    Conflict(String),

    #[error("instance name parse failed: {0}")]
    Parse(String),

    #[error("invalid deployment state: {0}")]
    State(String),

    #[error("provisioning call failed: {0}")]
    Provisioning(String),

    #[error("control plane query failed: {0}")]
    Query(String),

    #[error("credential capture failed: {0}")]
    Credential(String),
}

impl ProvisionError {
    /// Whether a re-invocation is safe after this error.
    ///
    /// There are no automatic retries anywhere in the workflow; re-runs
    /// are made safe by re-inspecting provider state instead.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProvisionError::Query(_) | ProvisionError::Provisioning(_)
        )
    }
}
