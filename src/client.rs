use async_trait::async_trait;
use thiserror::Error;

use crate::character::{Character, CharacterDraft, CharacterId, CharacterPatch};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to fetch characters")]
    Fetch,
    #[error("Failed to save character")]
    Save,
    #[error("Failed to delete character")]
    Delete,
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

/// What the UI needs from the character service.
#[async_trait]
pub trait CharacterApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Character>, ClientError>;
    async fn create(&self, draft: &CharacterDraft) -> Result<Character, ClientError>;
    async fn update(
        &self,
        id: CharacterId,
        patch: &CharacterPatch,
    ) -> Result<Character, ClientError>;
    async fn delete(&self, id: CharacterId) -> Result<(), ClientError>;
}

/// [`CharacterApi`] over HTTP against a fixed base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/characters", self.base_url)
    }

    fn character_url(&self, id: CharacterId) -> String {
        format!("{}/characters/{}", self.base_url, id)
    }
}

#[async_trait]
impl CharacterApi for HttpClient {
    async fn list(&self) -> Result<Vec<Character>, ClientError> {
        let response = self.client.get(self.collection_url()).send().await?;
        if !response.status().is_success() {
            log::warn!("Listing characters failed with {}", response.status());
            return Err(ClientError::Fetch);
        }
        Ok(response.json().await?)
    }

    async fn create(&self, draft: &CharacterDraft) -> Result<Character, ClientError> {
        let response = self
            .client
            .post(self.collection_url())
            .json(draft)
            .send()
            .await?;
        if !response.status().is_success() {
            log::warn!("Creating character failed with {}", response.status());
            return Err(ClientError::Save);
        }
        Ok(response.json().await?)
    }

    async fn update(
        &self,
        id: CharacterId,
        patch: &CharacterPatch,
    ) -> Result<Character, ClientError> {
        let response = self
            .client
            .put(self.character_url(id))
            .json(patch)
            .send()
            .await?;
        if !response.status().is_success() {
            log::warn!("Updating character {} failed with {}", id, response.status());
            return Err(ClientError::Save);
        }
        Ok(response.json().await?)
    }

    async fn delete(&self, id: CharacterId) -> Result<(), ClientError> {
        let response = self.client.delete(self.character_url(id)).send().await?;
        if !response.status().is_success() {
            log::warn!("Deleting character {} failed with {}", id, response.status());
            return Err(ClientError::Delete);
        }
        Ok(())
    }
}
