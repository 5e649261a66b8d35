//! Reconciliation state machine definition.
//!
//! The state is the complete snapshot of a provisioning run. It's
//! serializable, but nothing here persists it — the provider owns all
//! durable state, and re-runs recover by re-inspecting the inventory.

use crate::types::{EndpointProtocol, FailedInstance, LoadBalancedEndpointConfig};
use serde::{Deserialize, Serialize};

/// Instances created per invocation unless the caller says otherwise.
pub const DEFAULT_INSTANCE_COUNT: u32 = 6;

/// Parameters a brand-new deployment must supply. Appending derives all
/// of these from the existing deployment instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServiceParams {
    pub instance_size: String,
    pub location: String,
    pub affinity_group: String,
    pub endpoint_name: String,
    pub protocol: EndpointProtocol,
    pub public_port: u16,
    pub local_port: u16,
    pub image_family: String,
}

/// What the caller asked for — a tagged union instead of two
/// overlapping flag groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestedMode {
    NewService(NewServiceParams),
    ExistingService,
}

/// Workflow steps — the state machine's nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Starting point.
    Init,
    /// Verify the target location matches the current storage account.
    CheckPlacement,
    /// Look for instances already occupying the name base.
    InspectInventory,
    /// Pick the latest OS image for the requested family.
    ResolveImage,
    /// Create the affinity group if it doesn't exist.
    EnsureAffinityGroup,
    /// Create the hosted service if it doesn't exist.
    EnsureService,
    /// Create one instance per advance; `offset` counts created-or-failed.
    ProvisionInstance { offset: u32 },
    /// Done.
    Complete,
    /// Failed, possibly recoverable by re-run.
    Failed { reason: String, recoverable: bool },
}

impl Step {
    /// Human-readable step name for logging/display.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Init => "init",
            Step::CheckPlacement => "check_placement",
            Step::InspectInventory => "inspect_inventory",
            Step::ResolveImage => "resolve_image",
            Step::EnsureAffinityGroup => "ensure_affinity_group",
            Step::EnsureService => "ensure_service",
            Step::ProvisionInstance { .. } => "provision_instance",
            Step::Complete => "complete",
            Step::Failed { .. } => "failed",
        }
    }
}

/// Full reconciliation state — serializable snapshot of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileState {
    /// Target hosted service.
    pub service_name: String,
    /// Instance names are this base plus a sequential index.
    pub computer_name_base: String,
    /// Requested mode with its parameters.
    pub mode: RequestedMode,
    /// How many instances to create this run.
    pub instance_count: u32,
    /// Current step in the workflow.
    pub step: Step,

    // Populated as the workflow progresses — from caller parameters on
    // the new-service path, from the inspected template on append.
    pub instance_size: Option<String>,
    pub image_name: Option<String>,
    pub endpoint: Option<LoadBalancedEndpointConfig>,
    pub availability_set_name: Option<String>,
    /// First index to provision; continues the existing sequence.
    pub start_index: Option<u32>,

    // Batch outcome
    /// Names of instances created and booted this run.
    pub created: Vec<String>,
    /// Per-instance failures — the batch is best-effort.
    pub failed: Vec<FailedInstance>,

    // Audit
    /// Unix timestamp of creation.
    pub created_at: u64,
    /// Unix timestamp of last update.
    pub updated_at: u64,
}

impl ReconcileState {
    /// Start a brand-new deployment.
    pub fn new_service(
        service_name: impl Into<String>,
        computer_name_base: impl Into<String>,
        params: NewServiceParams,
    ) -> Self {
        Self::with_mode(
            service_name,
            computer_name_base,
            RequestedMode::NewService(params),
        )
    }

    /// Append to an existing deployment, trusting its configuration.
    pub fn existing_service(
        service_name: impl Into<String>,
        computer_name_base: impl Into<String>,
    ) -> Self {
        Self::with_mode(
            service_name,
            computer_name_base,
            RequestedMode::ExistingService,
        )
    }

    fn with_mode(
        service_name: impl Into<String>,
        computer_name_base: impl Into<String>,
        mode: RequestedMode,
    ) -> Self {
        let now = current_unix_time();

        Self {
            service_name: service_name.into(),
            computer_name_base: computer_name_base.into(),
            mode,
            instance_count: DEFAULT_INSTANCE_COUNT,
            step: Step::Init,
            instance_size: None,
            image_name: None,
            endpoint: None,
            availability_set_name: None,
            start_index: None,
            created: Vec::new(),
            failed: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the number of instances to create.
    pub fn with_instance_count(mut self, count: u32) -> Self {
        self.instance_count = count;
        self
    }

    /// Is this workflow in a terminal state?
    pub fn is_terminal(&self) -> bool {
        matches!(self.step, Step::Complete | Step::Failed { .. })
    }

    /// Is this workflow failed?
    pub fn is_failed(&self) -> bool {
        matches!(self.step, Step::Failed { .. })
    }

    /// Is this workflow complete?
    pub fn is_complete(&self) -> bool {
        matches!(self.step, Step::Complete)
    }

    /// Transition to a new step.
    pub fn transition(&mut self, step: Step) {
        self.step = step;
        self.updated_at = current_unix_time();
    }

    /// Fail the workflow.
    pub fn fail(&mut self, reason: impl Into<String>, recoverable: bool) {
        self.step = Step::Failed {
            reason: reason.into(),
            recoverable,
        };
        self.updated_at = current_unix_time();
    }
}

fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> NewServiceParams {
        NewServiceParams {
            instance_size: "Small".to_string(),
            location: "West US".to_string(),
            affinity_group: "webfarm-ag".to_string(),
            endpoint_name: "http".to_string(),
            protocol: EndpointProtocol::Tcp,
            public_port: 80,
            local_port: 8080,
            image_family: "Windows Server 2012 Datacenter".to_string(),
        }
    }

    #[test]
    fn test_new_state() {
        let state = ReconcileState::new_service("webfarm", "web", params());
        assert_eq!(state.service_name, "webfarm");
        assert_eq!(state.computer_name_base, "web");
        assert_eq!(state.instance_count, DEFAULT_INSTANCE_COUNT);
        assert!(matches!(state.step, Step::Init));
        assert!(!state.is_terminal());
        assert!(matches!(state.mode, RequestedMode::NewService(_)));
    }

    #[test]
    fn test_existing_state() {
        let state = ReconcileState::existing_service("webfarm", "web").with_instance_count(2);
        assert_eq!(state.instance_count, 2);
        assert!(matches!(state.mode, RequestedMode::ExistingService));
        assert!(state.instance_size.is_none());
        assert!(state.endpoint.is_none());
    }

    #[test]
    fn test_terminal_states() {
        let mut state = ReconcileState::existing_service("webfarm", "web");
        assert!(!state.is_terminal());

        state.transition(Step::Complete);
        assert!(state.is_terminal());
        assert!(state.is_complete());

        state.fail("something broke", true);
        assert!(state.is_terminal());
        assert!(state.is_failed());
    }

    #[test]
    fn test_step_names() {
        assert_eq!(Step::Init.name(), "init");
        assert_eq!(Step::ProvisionInstance { offset: 3 }.name(), "provision_instance");
        assert_eq!(
            Step::Failed {
                reason: "x".into(),
                recoverable: false
            }
            .name(),
            "failed"
        );
    }

    #[test]
    fn test_state_roundtrip() {
        let state = ReconcileState::new_service("webfarm", "web", params());
        let json = serde_json::to_string(&state).unwrap();
        let restored: ReconcileState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.service_name, "webfarm");
        assert!(matches!(restored.step, Step::Init));
    }
}
