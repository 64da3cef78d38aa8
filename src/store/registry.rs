use std::collections::BTreeMap;
use thiserror::Error;

use super::{Friend, StoreClient, StoreError, ValidationError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The one component of this program: list/add/remove over the store.
///
/// `list` deliberately never fails: the map view should render (empty) even
/// when the backend is down, with the failure surfaced separately as a
/// status message.
pub struct Registry {
    client: StoreClient,
    last_error: Option<RegistryError>,
}

impl Registry {
    pub fn new(client: StoreClient) -> Self {
        Self {
            client,
            last_error: None,
        }
    }

    /// Fetch all records, keyed by store-assigned id. On failure returns an
    /// empty map and records the error for `take_error`.
    pub async fn list(&mut self) -> BTreeMap<String, Friend> {
        match self.client.fetch_all().await {
            Ok(friends) => friends,
            Err(e) => {
                tracing::warn!("Failed to load friends: {}", e);
                self.last_error = Some(e.into());
                BTreeMap::new()
            }
        }
    }

    /// Validate and persist a new record. Validation happens before any
    /// request, so bad input never touches the store.
    pub async fn add(&mut self, name: &str, x: i64, y: i64) -> Result<String, RegistryError> {
        let friend = Friend::validated(name, x, y)?;
        let id = self.client.push(&friend).await?;
        tracing::info!("Added {} at ({}, {}) as {}", friend.name, x, y, id);
        Ok(id)
    }

    /// Delete by id. Unknown ids are a successful no-op (store semantics).
    pub async fn remove(&mut self, id: &str) -> Result<(), RegistryError> {
        self.client.delete(id).await?;
        tracing::info!("Removed {}", id);
        Ok(())
    }

    /// Retrieve (and clear) the error recorded by the last failed `list`
    pub fn take_error(&mut self) -> Option<RegistryError> {
        self.last_error.take()
    }
}
