//! Fleet Deploy Library
//!
//! Standalone, trait-based provisioning workflow for VM fleets behind a
//! load-balanced endpoint.
//!
//! # Design
//!
//! This library provides the provisioning workflow logic without
//! coupling to any specific transport, credential capture, or logging
//! implementation. You implement the [`CloudBackend`] trait with your
//! infrastructure, and the workflow engine handles the state machine:
//! inspect what exists, derive what's missing, and issue the minimal
//! set of create calls to reach the desired instance count.
//!
//! # Usage
//!
//! ```ignore
//! use fleet_deploy_rs::{
//!     CloudBackend, NewServiceParams, NullObserver, ReconcileState,
//!     ReconcileWorkflow, ReconcilerConfig, StepResult,
//! };
//!
//! // Implement CloudBackend for your infrastructure
//! struct MyCloud { /* ... */ }
//! impl CloudBackend for MyCloud { /* ... */ }
//!
//! // Create workflow
//! let cloud = MyCloud::new();
//! let credentials = capture_admin_credential()?;
//! let workflow = ReconcileWorkflow::new(
//!     &cloud, &credentials, ReconcilerConfig::default(), &NullObserver,
//! );
//!
//! // Create state — a fresh three-instance deployment
//! let mut state = ReconcileState::new_service("webfarm", "web", params)
//!     .with_instance_count(3);
//!
//! // Run to completion
//! match workflow.run_to_completion(&mut state).await? {
//!     StepResult::Complete => println!("created: {:?}", state.created),
//!     StepResult::Failed(reason) => println!("failed: {}", reason),
//!     _ => {}
//! }
//! ```

pub mod backend;
pub mod credentials;
pub mod error;
pub mod image;
pub mod inspect;
pub mod naming;
pub mod observer;
pub mod provision;
pub mod state;
pub mod types;
pub mod workflow;

#[cfg(feature = "default-client")]
pub mod client;

// Re-export the main types at crate root for convenience
pub use backend::CloudBackend;
pub use credentials::{CredentialProvider, StaticCredentials};
pub use error::ProvisionError;
pub use image::{resolve_latest, wildcard_match};
pub use inspect::{inspect, DeploymentTemplate, ExistingDeployment};
pub use observer::{NullObserver, ProgressObserver, ReconcileEvent, TracingObserver};
pub use provision::build_instance_spec;
pub use state::{
    NewServiceParams, ReconcileState, RequestedMode, Step, DEFAULT_INSTANCE_COUNT,
};
pub use types::*;
pub use workflow::{ReconcileWorkflow, ReconcilerConfig, StepResult};

#[cfg(feature = "default-client")]
pub use client::ControlPlaneClient;
#[cfg(feature = "default-client")]
pub use credentials::PromptCredentials;
