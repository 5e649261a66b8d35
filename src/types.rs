//! Minimal domain types for the fleet provisioning workflow.
//!
//! These are the types the workflow engine needs. Nothing more.
//! If you're adding types here, ask yourself if the workflow
//! actually needs them or if you're just being clever.

use crate::naming;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transport protocol of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointProtocol {
    Tcp,
    Udp,
}

impl fmt::Display for EndpointProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointProtocol::Tcp => write!(f, "tcp"),
            EndpointProtocol::Udp => write!(f, "udp"),
        }
    }
}

impl FromStr for EndpointProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(EndpointProtocol::Tcp),
            "udp" => Ok(EndpointProtocol::Udp),
            other => Err(format!("unknown protocol {:?}, expected tcp or udp", other)),
        }
    }
}

/// An OS image from the provider catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsImage {
    pub name: String,
    pub family: String,
    pub publisher: String,
    pub published_date: DateTime<Utc>,
}

/// An endpoint attached to an instance, load-balanced or direct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceEndpoint {
    pub name: String,
    pub protocol: EndpointProtocol,
    pub local_port: u16,
    pub public_port: u16,
    /// Membership in a load-balancer set. `None` for direct endpoints.
    pub lb_set_name: Option<String>,
    /// Health probe port; only meaningful for load-balanced endpoints.
    pub probe_port: Option<u16>,
    pub probe_protocol: Option<EndpointProtocol>,
    pub direct_server_return: bool,
}

impl InstanceEndpoint {
    pub fn is_load_balanced(&self) -> bool {
        self.lb_set_name.is_some()
    }
}

/// OS disk attached to an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsDisk {
    pub source_image_name: String,
}

/// An instance as reported by the compute inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub name: String,
    pub availability_set_name: Option<String>,
    pub instance_size: String,
    pub os_disk: OsDisk,
    pub endpoints: Vec<InstanceEndpoint>,
}

/// The load-balanced endpoint shape shared by every instance in a
/// deployment. Either derived from caller parameters (new deployment)
/// or extracted from a template instance (append).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancedEndpointConfig {
    pub endpoint_name: String,
    pub protocol: EndpointProtocol,
    pub local_port: u16,
    pub public_port: u16,
    pub lb_set_name: String,
    pub direct_server_return: bool,
}

impl LoadBalancedEndpointConfig {
    /// Derive the config from caller parameters. The LB set name is a
    /// pure function of the endpoint name.
    pub fn derived(
        endpoint_name: impl Into<String>,
        protocol: EndpointProtocol,
        local_port: u16,
        public_port: u16,
    ) -> Self {
        let endpoint_name = endpoint_name.into();
        let lb_set_name = naming::lb_set_name(&endpoint_name);
        Self {
            endpoint_name,
            protocol,
            local_port,
            public_port,
            lb_set_name,
            direct_server_return: false,
        }
    }
}

/// A placement group tying resources to a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffinityGroup {
    pub name: String,
    pub location: String,
}

/// The currently selected storage account, used for the co-location
/// precondition check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageAccountInfo {
    pub name: String,
    pub location: String,
}

/// A hosted service — the container for a deployment's instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedService {
    pub name: String,
    pub affinity_group: Option<String>,
    pub location: Option<String>,
}

/// Administrator credential applied to every instance in a batch.
///
/// Captured once per invocation through a [`crate::credentials::CredentialProvider`].
/// Not serializable on purpose — it never leaves the process.
#[derive(Clone)]
pub struct AdminCredential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Full creation payload for one instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub name: String,
    pub instance_size: String,
    pub image_name: String,
    pub availability_set_name: Option<String>,
    pub endpoints: Vec<InstanceEndpoint>,
}

/// A per-instance failure recorded during a best-effort batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedInstance {
    pub name: String,
    pub reason: String,
}
