//! Progress reporting as an explicit capability.
//!
//! The workflow publishes events to an observer handed in at
//! construction — there is no ambient verbosity global. The CLI bridges
//! events to `tracing`; tests record them; headless embedders can drop
//! them.

use std::fmt;

/// Something the workflow wants the operator to know about.
#[derive(Debug, Clone)]
pub enum ReconcileEvent {
    PlacementVerified {
        location: String,
        storage_account: String,
    },
    ExistingDeploymentFound {
        next_index: u32,
        template_image: String,
    },
    FreshDeployment,
    ImageResolved {
        image_name: String,
        family: String,
    },
    AffinityGroupCreated {
        name: String,
        location: String,
    },
    /// The group exists somewhere else. Tolerated, not corrected.
    AffinityGroupLocationMismatch {
        name: String,
        requested: String,
        actual: String,
    },
    ServiceCreated {
        name: String,
    },
    InstanceCreating {
        name: String,
    },
    InstanceCreated {
        name: String,
    },
    /// A best-effort batch keeps going past this.
    InstanceFailed {
        name: String,
        reason: String,
    },
    BatchFinished {
        created: usize,
        failed: usize,
    },
}

impl ReconcileEvent {
    /// Whether this event signals something off-nominal.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ReconcileEvent::AffinityGroupLocationMismatch { .. }
                | ReconcileEvent::InstanceFailed { .. }
        )
    }
}

impl fmt::Display for ReconcileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileEvent::PlacementVerified {
                location,
                storage_account,
            } => write!(
                f,
                "location {:?} matches storage account {:?}",
                location, storage_account
            ),
            ReconcileEvent::ExistingDeploymentFound {
                next_index,
                template_image,
            } => write!(
                f,
                "appending to existing deployment from index {} (template image {})",
                next_index, template_image
            ),
            ReconcileEvent::FreshDeployment => write!(f, "no existing instances, starting fresh"),
            ReconcileEvent::ImageResolved { image_name, family } => {
                write!(f, "resolved image {} for family {:?}", image_name, family)
            }
            ReconcileEvent::AffinityGroupCreated { name, location } => {
                write!(f, "created affinity group {} in {:?}", name, location)
            }
            ReconcileEvent::AffinityGroupLocationMismatch {
                name,
                requested,
                actual,
            } => write!(
                f,
                "affinity group {} is in {:?}, not the requested {:?}; leaving it alone",
                name, actual, requested
            ),
            ReconcileEvent::ServiceCreated { name } => write!(f, "created service {}", name),
            ReconcileEvent::InstanceCreating { name } => write!(f, "creating instance {}", name),
            ReconcileEvent::InstanceCreated { name } => write!(f, "instance {} is running", name),
            ReconcileEvent::InstanceFailed { name, reason } => {
                write!(f, "instance {} failed: {}; continuing batch", name, reason)
            }
            ReconcileEvent::BatchFinished { created, failed } => {
                write!(f, "batch finished: {} created, {} failed", created, failed)
            }
        }
    }
}

/// Sink for workflow progress events.
pub trait ProgressObserver: Send + Sync {
    fn publish(&self, event: &ReconcileEvent);
}

/// Bridges events to `tracing` at info/warn level.
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn publish(&self, event: &ReconcileEvent) {
        if event.is_warning() {
            tracing::warn!(step = "reconcile", "{}", event);
        } else {
            tracing::info!(step = "reconcile", "{}", event);
        }
    }
}

/// Discards everything.
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn publish(&self, _event: &ReconcileEvent) {}
}
