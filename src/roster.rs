use thiserror::Error;
use tokio::sync::Mutex;

use crate::character::{Character, CharacterDraft, CharacterId, CharacterPatch};
use crate::storage::{JsonStore, StorageError};

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("character {0} not found")]
    NotFound(CharacterId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Id for a character appended to `characters`: one past the id of the last
/// element, or 1 for an empty collection. This is not a max over all ids.
pub fn next_id(characters: &[Character]) -> CharacterId {
    characters.last().map_or(1, |last| last.id + 1)
}

/// Character operations over a [`JsonStore`]. Each operation loads the whole
/// collection and mutating ones write it back. Operations are serialized on
/// the store lock, so two writers in this process never lose each other's
/// update.
#[derive(Debug)]
pub struct Roster {
    store: Mutex<JsonStore>,
}

impl Roster {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    pub async fn list(&self) -> Result<Vec<Character>, RosterError> {
        let store = self.store.lock().await;
        Ok(store.load()?)
    }

    pub async fn get(&self, id: CharacterId) -> Result<Character, RosterError> {
        let store = self.store.lock().await;
        store
            .load()?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(RosterError::NotFound(id))
    }

    pub async fn create(&self, draft: CharacterDraft) -> Result<Character, RosterError> {
        let store = self.store.lock().await;
        let mut characters = store.load()?;
        let character = draft.into_character(next_id(&characters));
        characters.push(character.clone());
        store.save(&characters)?;
        log::info!("Created character {}", character.id);
        Ok(character)
    }

    pub async fn update(
        &self,
        id: CharacterId,
        patch: CharacterPatch,
    ) -> Result<Character, RosterError> {
        let store = self.store.lock().await;
        let mut characters = store.load()?;
        let character = characters
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RosterError::NotFound(id))?;
        character.apply(patch);
        let updated = character.clone();
        store.save(&characters)?;
        log::info!("Updated character {}", id);
        Ok(updated)
    }

    /// Removes every character carrying `id`. Nothing is written when no
    /// character matched.
    pub async fn delete(&self, id: CharacterId) -> Result<(), RosterError> {
        let store = self.store.lock().await;
        let characters = store.load()?;
        let before = characters.len();
        let remaining: Vec<_> = characters.into_iter().filter(|c| c.id != id).collect();
        if remaining.len() == before {
            return Err(RosterError::NotFound(id));
        }
        store.save(&remaining)?;
        log::info!("Deleted character {}", id);
        Ok(())
    }
}
