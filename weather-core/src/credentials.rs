use std::sync::Arc;

use crate::{
    error::{GatewayError, StorageError, ValidationError},
    storage::{API_KEY_STORAGE_KEY, KeyValueStore},
};

/// Access to the single stored provider API key.
#[derive(Debug, Clone)]
pub struct Credentials {
    store: Arc<dyn KeyValueStore>,
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Credentials {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Trim and persist a new key, replacing any previous one.
    pub fn save_api_key(&self, api_key: &str) -> Result<(), CredentialError> {
        let trimmed = api_key.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyApiKey.into());
        }

        self.store.set(API_KEY_STORAGE_KEY, trimmed)?;
        tracing::info!("API key saved");
        Ok(())
    }

    /// Stored key, if any. An empty stored value counts as absent.
    pub fn api_key(&self) -> Option<String> {
        match self.store.get(API_KEY_STORAGE_KEY) {
            Ok(key) => key.filter(|k| !k.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored API key");
                None
            }
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// Key for a gateway call.
    pub fn require_api_key(&self) -> Result<String, GatewayError> {
        self.store
            .get(API_KEY_STORAGE_KEY)?
            .filter(|k| !k.is_empty())
            .ok_or(GatewayError::MissingCredential)
    }
}
