//! Administrator credential capture as an injected capability.
//!
//! The workflow never does interactive I/O. Whoever constructs it
//! resolves a credential once, up front, through this trait — an
//! interactive prompt in the CLI, a static value in tests and headless
//! runs.

use crate::error::ProvisionError;
use crate::types::AdminCredential;
use async_trait::async_trait;

/// Source of the administrator credential applied to every instance in
/// a batch.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Resolve the credential. Called once per invocation, before any
    /// instance is created.
    async fn admin_credential(&self) -> Result<AdminCredential, ProvisionError>;
}

/// A fixed credential, for headless and test use.
pub struct StaticCredentials {
    credential: AdminCredential,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credential: AdminCredential {
                username: username.into(),
                password: password.into(),
            },
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn admin_credential(&self) -> Result<AdminCredential, ProvisionError> {
        Ok(self.credential.clone())
    }
}

/// Interactive terminal prompt.
#[cfg(feature = "default-client")]
pub struct PromptCredentials;

#[cfg(feature = "default-client")]
#[async_trait]
impl CredentialProvider for PromptCredentials {
    async fn admin_credential(&self) -> Result<AdminCredential, ProvisionError> {
        let username: String = dialoguer::Input::new()
            .with_prompt("Administrator username")
            .interact_text()
            .map_err(|e| ProvisionError::Credential(e.to_string()))?;

        let password = dialoguer::Password::new()
            .with_prompt("Administrator password")
            .with_confirmation("Confirm password", "passwords do not match")
            .interact()
            .map_err(|e| ProvisionError::Credential(e.to_string()))?;

        Ok(AdminCredential { username, password })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credentials() {
        let provider = StaticCredentials::new("fleetadmin", "s3cret");
        let cred = provider.admin_credential().await.unwrap();
        assert_eq!(cred.username, "fleetadmin");
        assert_eq!(cred.password, "s3cret");
    }
}
