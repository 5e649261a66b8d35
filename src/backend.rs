//! The One Trait: CloudBackend
//!
//! This is the single abstraction point for all external dependencies.
//! The workflow engine is pure logic — it doesn't know about REST,
//! authentication, or how a create call is actually issued. That's
//! YOUR problem when you implement this trait.

use crate::error::ProvisionError;
use crate::types::*;
use std::future::Future;

/// The single trait consumers implement to use the provisioning workflow.
///
/// Abstracts:
/// - Control-plane queries (storage account, image catalog, inventory)
/// - Placement lookups (affinity groups, hosted services)
/// - Resource creation (affinity group, service, instances)
pub trait CloudBackend: Send + Sync {
    /// Administrator credential context applied to created instances.
    /// Captured once per invocation; the workflow doesn't care what
    /// this is.
    type Credentials: Send + Sync;

    // ═══════════════════════════════════════════════════════════════
    // QUERIES (read-only)
    // ═══════════════════════════════════════════════════════════════

    /// The currently selected storage account, for the co-location
    /// precondition.
    fn current_storage_account(
        &self,
    ) -> impl Future<Output = Result<StorageAccountInfo, ProvisionError>> + Send;

    /// The full OS image catalog.
    fn list_os_images(
        &self,
    ) -> impl Future<Output = Result<Vec<OsImage>, ProvisionError>> + Send;

    /// Look up an affinity group. Returns None if it doesn't exist.
    fn get_affinity_group(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<AffinityGroup>, ProvisionError>> + Send;

    /// Look up a hosted service. Returns None if it doesn't exist.
    fn get_hosted_service(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<HostedService>, ProvisionError>> + Send;

    /// List the instances of a service. An absent service lists as
    /// empty, not as an error.
    fn list_instances(
        &self,
        service: &str,
    ) -> impl Future<Output = Result<Vec<InstanceRecord>, ProvisionError>> + Send;

    // ═══════════════════════════════════════════════════════════════
    // MUTATIONS
    // ═══════════════════════════════════════════════════════════════

    /// Create an affinity group at a location.
    fn create_affinity_group(
        &self,
        name: &str,
        location: &str,
    ) -> impl Future<Output = Result<(), ProvisionError>> + Send;

    /// Create a hosted service bound to an affinity group.
    fn create_hosted_service(
        &self,
        name: &str,
        affinity_group: &str,
    ) -> impl Future<Output = Result<(), ProvisionError>> + Send;

    /// Create one instance and wait until the provider reports it
    /// booted (or failed). No timeout beyond what the implementation
    /// enforces.
    fn create_instance(
        &self,
        credentials: &Self::Credentials,
        service: &str,
        spec: &InstanceSpec,
    ) -> impl Future<Output = Result<(), ProvisionError>> + Send;
}
