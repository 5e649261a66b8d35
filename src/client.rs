//! Default control-plane client over JSON/REST.
//!
//! This module provides a complete implementation of the
//! [`CloudBackend`] trait against a compute control plane speaking
//! JSON over HTTP. The workflow never sees any of this — it only talks
//! to the trait.
//!
//! # Quick Start
//!
//! ```ignore
//! use fleet_deploy_rs::{ControlPlaneClient, ReconcileWorkflow, ReconcilerConfig, TracingObserver};
//!
//! let cloud = ControlPlaneClient::new("https://compute.example.net/api")?
//!     .with_bearer_token(token);
//!
//! let workflow = ReconcileWorkflow::new(
//!     &cloud, &credentials, ReconcilerConfig::default(), &TracingObserver,
//! );
//! ```

use crate::backend::CloudBackend;
use crate::error::ProvisionError;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Boot polling knobs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Seconds between boot status polls.
    pub poll_interval_secs: u64,
    /// Give up on an instance after this many polls.
    pub max_boot_poll_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15,
            max_boot_poll_attempts: 80, // ~20 minutes
        }
    }
}

/// JSON/REST implementation of [`CloudBackend`].
///
/// One reusable connection pool for all calls. Instance creation
/// blocks until the control plane reports the instance running, polling
/// at a fixed interval — the workflow's strictly sequential batch
/// semantics depend on that.
pub struct ControlPlaneClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
    config: ClientConfig,
}

#[derive(Serialize)]
struct CreateAffinityGroupRequest<'a> {
    name: &'a str,
    location: &'a str,
}

#[derive(Serialize)]
struct CreateServiceRequest<'a> {
    name: &'a str,
    affinity_group: &'a str,
}

#[derive(Serialize)]
struct CreateInstanceRequest<'a> {
    #[serde(flatten)]
    spec: &'a InstanceSpec,
    admin_username: &'a str,
    admin_password: &'a str,
}

#[derive(Debug, Deserialize)]
struct InstanceStatusResponse {
    status: String,
}

impl ControlPlaneClient {
    /// Create a client against a control-plane base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProvisionError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ProvisionError::Query(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: None,
            config: ClientConfig::default(),
        })
    }

    /// Attach a bearer token to every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Override the boot polling knobs.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET a JSON resource. 404 maps to `Ok(None)`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ProvisionError> {
        let response = self
            .authorized(self.http.get(self.url(path)))
            .send()
            .await
            .map_err(|e| ProvisionError::Query(format!("GET {}: {}", path, e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProvisionError::Query(format!(
                "GET {}: status {}",
                path,
                response.status()
            )));
        }

        let value = response
            .json::<T>()
            .await
            .map_err(|e| ProvisionError::Query(format!("GET {}: bad body: {}", path, e)))?;
        Ok(Some(value))
    }

    /// POST a JSON payload to a creation endpoint.
    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<(), ProvisionError> {
        let response = self
            .authorized(self.http.post(self.url(path)))
            .json(payload)
            .send()
            .await
            .map_err(|e| ProvisionError::Provisioning(format!("POST {}: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProvisionError::Provisioning(format!(
                "POST {}: status {}: {}",
                path, status, body
            )));
        }
        Ok(())
    }

    /// Poll until the control plane reports the instance running.
    async fn wait_for_boot(&self, service: &str, name: &str) -> Result<(), ProvisionError> {
        let path = format!("services/{}/instances/{}/status", service, name);

        for _ in 0..self.config.max_boot_poll_attempts {
            let status: Option<InstanceStatusResponse> = self.get_json(&path).await?;
            match status.as_ref().map(|s| s.status.as_str()) {
                Some("running") => return Ok(()),
                Some("failed") => {
                    return Err(ProvisionError::Provisioning(format!(
                        "instance {} entered failed state during boot",
                        name
                    )))
                }
                // still creating/starting, or status not visible yet
                _ => {}
            }
            tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)).await;
        }

        Err(ProvisionError::Provisioning(format!(
            "instance {} did not reach running after {} polls",
            name, self.config.max_boot_poll_attempts
        )))
    }
}

impl CloudBackend for ControlPlaneClient {
    type Credentials = AdminCredential;

    async fn current_storage_account(&self) -> Result<StorageAccountInfo, ProvisionError> {
        self.get_json("storageaccounts/current")
            .await?
            .ok_or_else(|| ProvisionError::Query("no storage account selected".into()))
    }

    async fn list_os_images(&self) -> Result<Vec<OsImage>, ProvisionError> {
        Ok(self.get_json("images").await?.unwrap_or_default())
    }

    async fn get_affinity_group(
        &self,
        name: &str,
    ) -> Result<Option<AffinityGroup>, ProvisionError> {
        self.get_json(&format!("affinitygroups/{}", name)).await
    }

    async fn get_hosted_service(
        &self,
        name: &str,
    ) -> Result<Option<HostedService>, ProvisionError> {
        self.get_json(&format!("services/{}", name)).await
    }

    async fn list_instances(
        &self,
        service: &str,
    ) -> Result<Vec<InstanceRecord>, ProvisionError> {
        // An absent service lists as empty, per the trait contract.
        Ok(self
            .get_json(&format!("services/{}/instances", service))
            .await?
            .unwrap_or_default())
    }

    async fn create_affinity_group(
        &self,
        name: &str,
        location: &str,
    ) -> Result<(), ProvisionError> {
        self.post_json(
            "affinitygroups",
            &CreateAffinityGroupRequest { name, location },
        )
        .await
    }

    async fn create_hosted_service(
        &self,
        name: &str,
        affinity_group: &str,
    ) -> Result<(), ProvisionError> {
        self.post_json(
            "services",
            &CreateServiceRequest {
                name,
                affinity_group,
            },
        )
        .await
    }

    async fn create_instance(
        &self,
        credentials: &AdminCredential,
        service: &str,
        spec: &InstanceSpec,
    ) -> Result<(), ProvisionError> {
        self.post_json(
            &format!("services/{}/instances", service),
            &CreateInstanceRequest {
                spec,
                admin_username: &credentials.username,
                admin_password: &credentials.password,
            },
        )
        .await?;

        self.wait_for_boot(service, &spec.name).await
    }
}
