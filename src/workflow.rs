//! Provisioning Workflow Engine
//!
//! The state machine that drives fleet provisioning. It's dumb — it
//! just transitions between steps and calls the backend. No transport,
//! no prompting, no persistence. Just logic.

use crate::backend::CloudBackend;
use crate::error::ProvisionError;
use crate::image;
use crate::inspect;
use crate::naming;
use crate::observer::{ProgressObserver, ReconcileEvent};
use crate::provision;
use crate::state::{NewServiceParams, ReconcileState, RequestedMode, Step};
use crate::types::{FailedInstance, LoadBalancedEndpointConfig};

/// Workflow configuration.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Restrict image resolution to publishers matching this wildcard.
    /// `None` accepts any publisher.
    pub image_publisher_filter: Option<String>,
    /// On append, reuse the template instance's recorded availability
    /// set instead of re-deriving it from the endpoint name. The
    /// re-derivation can diverge from what the original deployment
    /// actually used.
    pub reuse_template_availability_set: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            image_publisher_filter: Some("Microsoft*".to_string()),
            reuse_template_availability_set: true,
        }
    }
}

/// Result of advancing one step.
#[derive(Debug)]
pub enum StepResult {
    /// Keep going, call advance() again.
    Continue,
    /// Done successfully — possibly with per-instance failures recorded
    /// in the state; the batch is best-effort.
    Complete,
    /// Failed.
    Failed(String),
}

/// The provisioning workflow engine.
///
/// Parameterized by the backend — you provide the implementation. The
/// credential is resolved once by the caller and held opaquely here,
/// the observer receives progress events explicitly.
pub struct ReconcileWorkflow<'a, B: CloudBackend> {
    backend: &'a B,
    credentials: &'a B::Credentials,
    config: ReconcilerConfig,
    observer: &'a dyn ProgressObserver,
}

impl<'a, B: CloudBackend> ReconcileWorkflow<'a, B> {
    /// Create a new workflow engine.
    pub fn new(
        backend: &'a B,
        credentials: &'a B::Credentials,
        config: ReconcilerConfig,
        observer: &'a dyn ProgressObserver,
    ) -> Self {
        Self {
            backend,
            credentials,
            config,
            observer,
        }
    }

    /// Advance the workflow by one step.
    ///
    /// Each step does ONE thing — a query or a create — then
    /// transitions. Call this in a loop until you get Complete or
    /// Failed. Backend transport errors propagate as `Err`; domain
    /// failures are recorded in the state and surface as
    /// `StepResult::Failed`.
    pub async fn advance(
        &self,
        state: &mut ReconcileState,
    ) -> Result<StepResult, ProvisionError> {
        match &state.step {
            Step::Init => self.step_init(state),
            Step::CheckPlacement => self.step_check_placement(state).await,
            Step::InspectInventory => self.step_inspect_inventory(state).await,
            Step::ResolveImage => self.step_resolve_image(state).await,
            Step::EnsureAffinityGroup => self.step_ensure_affinity_group(state).await,
            Step::EnsureService => self.step_ensure_service(state).await,
            Step::ProvisionInstance { offset } => {
                let offset = *offset;
                self.step_provision_instance(state, offset).await
            }
            Step::Complete => Ok(StepResult::Complete),
            Step::Failed { reason, .. } => Ok(StepResult::Failed(reason.clone())),
        }
    }

    /// Run until completion or failure.
    pub async fn run_to_completion(
        &self,
        state: &mut ReconcileState,
    ) -> Result<StepResult, ProvisionError> {
        loop {
            match self.advance(state).await? {
                StepResult::Continue => continue,
                other => return Ok(other),
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // STEP IMPLEMENTATIONS
    // ═══════════════════════════════════════════════════════════════

    fn step_init(&self, state: &mut ReconcileState) -> Result<StepResult, ProvisionError> {
        match state.mode {
            RequestedMode::NewService(_) => state.transition(Step::CheckPlacement),
            RequestedMode::ExistingService => state.transition(Step::InspectInventory),
        }
        Ok(StepResult::Continue)
    }

    async fn step_check_placement(
        &self,
        state: &mut ReconcileState,
    ) -> Result<StepResult, ProvisionError> {
        let location = new_params(state)?.location.clone();
        let storage = self.backend.current_storage_account().await?;

        if !storage.location.eq_ignore_ascii_case(&location) {
            let reason = ProvisionError::Configuration(format!(
                "target location {:?} does not match storage account {:?} in {:?}",
                location, storage.name, storage.location
            ))
            .to_string();
            state.fail(reason.clone(), false);
            return Ok(StepResult::Failed(reason));
        }

        self.observer.publish(&ReconcileEvent::PlacementVerified {
            location,
            storage_account: storage.name,
        });
        state.transition(Step::InspectInventory);
        Ok(StepResult::Continue)
    }

    async fn step_inspect_inventory(
        &self,
        state: &mut ReconcileState,
    ) -> Result<StepResult, ProvisionError> {
        let instances = self.backend.list_instances(&state.service_name).await?;

        let existing = match inspect::inspect(&instances, &state.computer_name_base) {
            Ok(existing) => existing,
            Err(err) => {
                let reason = err.to_string();
                state.fail(reason.clone(), false);
                return Ok(StepResult::Failed(reason));
            }
        };

        let mode = state.mode.clone();
        match (existing, &mode) {
            (Some(_), RequestedMode::NewService(_)) => {
                let reason = ProvisionError::Conflict(format!(
                    "instances matching base {:?} already exist in service {:?}; \
                     pass existing-service mode to append",
                    state.computer_name_base, state.service_name
                ))
                .to_string();
                state.fail(reason.clone(), false);
                Ok(StepResult::Failed(reason))
            }
            (Some(existing), RequestedMode::ExistingService) => {
                let template = existing.template;
                let availability_set = if self.config.reuse_template_availability_set {
                    template.availability_set_name.clone().unwrap_or_else(|| {
                        naming::availability_set_name(&template.endpoint.endpoint_name)
                    })
                } else {
                    naming::availability_set_name(&template.endpoint.endpoint_name)
                };

                self.observer
                    .publish(&ReconcileEvent::ExistingDeploymentFound {
                        next_index: existing.next_index,
                        template_image: template.source_image_name.clone(),
                    });

                state.instance_size = Some(template.instance_size);
                state.image_name = Some(template.source_image_name);
                state.endpoint = Some(template.endpoint);
                state.availability_set_name = Some(availability_set);
                state.start_index = Some(existing.next_index);
                state.transition(Step::EnsureService);
                Ok(StepResult::Continue)
            }
            (None, RequestedMode::NewService(params)) => {
                let endpoint = LoadBalancedEndpointConfig::derived(
                    params.endpoint_name.clone(),
                    params.protocol,
                    params.local_port,
                    params.public_port,
                );
                let availability_set = naming::availability_set_name(&params.endpoint_name);

                self.observer.publish(&ReconcileEvent::FreshDeployment);

                state.instance_size = Some(params.instance_size.clone());
                state.endpoint = Some(endpoint);
                state.availability_set_name = Some(availability_set);
                state.start_index = Some(1);
                state.transition(Step::ResolveImage);
                Ok(StepResult::Continue)
            }
            (None, RequestedMode::ExistingService) => {
                let reason = ProvisionError::Resolution(format!(
                    "no instances matching base {:?} in service {:?} to derive \
                     configuration from",
                    state.computer_name_base, state.service_name
                ))
                .to_string();
                state.fail(reason.clone(), false);
                Ok(StepResult::Failed(reason))
            }
        }
    }

    async fn step_resolve_image(
        &self,
        state: &mut ReconcileState,
    ) -> Result<StepResult, ProvisionError> {
        let family = new_params(state)?.image_family.clone();
        let catalog = self.backend.list_os_images().await?;

        let resolved = image::resolve_latest(
            &catalog,
            &family,
            self.config.image_publisher_filter.as_deref(),
        );

        match resolved {
            Some(image) => {
                self.observer.publish(&ReconcileEvent::ImageResolved {
                    image_name: image.name.clone(),
                    family: family.clone(),
                });
                state.image_name = Some(image.name.clone());
                state.transition(Step::EnsureAffinityGroup);
                Ok(StepResult::Continue)
            }
            None => {
                let reason = ProvisionError::Resolution(format!(
                    "no image in the catalog matches family {:?}",
                    family
                ))
                .to_string();
                state.fail(reason.clone(), false);
                Ok(StepResult::Failed(reason))
            }
        }
    }

    async fn step_ensure_affinity_group(
        &self,
        state: &mut ReconcileState,
    ) -> Result<StepResult, ProvisionError> {
        let params = new_params(state)?;
        let name = params.affinity_group.clone();
        let location = params.location.clone();

        match self.backend.get_affinity_group(&name).await? {
            None => {
                self.backend.create_affinity_group(&name, &location).await?;
                self.observer.publish(&ReconcileEvent::AffinityGroupCreated {
                    name,
                    location,
                });
            }
            Some(group) if !group.location.eq_ignore_ascii_case(&location) => {
                self.observer
                    .publish(&ReconcileEvent::AffinityGroupLocationMismatch {
                        name,
                        requested: location,
                        actual: group.location,
                    });
            }
            Some(_) => {}
        }

        state.transition(Step::EnsureService);
        Ok(StepResult::Continue)
    }

    async fn step_ensure_service(
        &self,
        state: &mut ReconcileState,
    ) -> Result<StepResult, ProvisionError> {
        if self
            .backend
            .get_hosted_service(&state.service_name)
            .await?
            .is_none()
        {
            let affinity_group = match &state.mode {
                RequestedMode::NewService(params) => params.affinity_group.clone(),
                RequestedMode::ExistingService => {
                    // Appending found instances, so the service must have
                    // existed moments ago. Treat its absence as fatal.
                    let reason = ProvisionError::State(format!(
                        "service {:?} does not exist",
                        state.service_name
                    ))
                    .to_string();
                    state.fail(reason.clone(), false);
                    return Ok(StepResult::Failed(reason));
                }
            };

            self.backend
                .create_hosted_service(&state.service_name, &affinity_group)
                .await?;
            self.observer.publish(&ReconcileEvent::ServiceCreated {
                name: state.service_name.clone(),
            });
        }

        state.transition(Step::ProvisionInstance { offset: 0 });
        Ok(StepResult::Continue)
    }

    async fn step_provision_instance(
        &self,
        state: &mut ReconcileState,
        offset: u32,
    ) -> Result<StepResult, ProvisionError> {
        if offset >= state.instance_count {
            self.observer.publish(&ReconcileEvent::BatchFinished {
                created: state.created.len(),
                failed: state.failed.len(),
            });
            state.transition(Step::Complete);
            return Ok(StepResult::Complete);
        }

        let start_index = state.start_index.ok_or_else(|| {
            ProvisionError::State("start_index missing at ProvisionInstance".into())
        })?;
        let instance_size = state.instance_size.clone().ok_or_else(|| {
            ProvisionError::State("instance_size missing at ProvisionInstance".into())
        })?;
        let image_name = state.image_name.clone().ok_or_else(|| {
            ProvisionError::State("image_name missing at ProvisionInstance".into())
        })?;
        let endpoint = state.endpoint.clone().ok_or_else(|| {
            ProvisionError::State("endpoint missing at ProvisionInstance".into())
        })?;

        let spec = provision::build_instance_spec(
            &state.computer_name_base,
            start_index + offset,
            &instance_size,
            &image_name,
            state.availability_set_name.as_deref(),
            &endpoint,
        );

        self.observer.publish(&ReconcileEvent::InstanceCreating {
            name: spec.name.clone(),
        });

        // Best-effort batch: a failed create is recorded and the batch
        // moves on to the next index.
        match self
            .backend
            .create_instance(self.credentials, &state.service_name, &spec)
            .await
        {
            Ok(()) => {
                self.observer.publish(&ReconcileEvent::InstanceCreated {
                    name: spec.name.clone(),
                });
                state.created.push(spec.name);
            }
            Err(err) => {
                self.observer.publish(&ReconcileEvent::InstanceFailed {
                    name: spec.name.clone(),
                    reason: err.to_string(),
                });
                state.failed.push(FailedInstance {
                    name: spec.name,
                    reason: err.to_string(),
                });
            }
        }

        state.transition(Step::ProvisionInstance { offset: offset + 1 });
        Ok(StepResult::Continue)
    }
}

fn new_params(state: &ReconcileState) -> Result<&NewServiceParams, ProvisionError> {
    match &state.mode {
        RequestedMode::NewService(params) => Ok(params),
        RequestedMode::ExistingService => Err(ProvisionError::State(format!(
            "new-service parameters required at {}",
            state.step.name()
        ))),
    }
}
