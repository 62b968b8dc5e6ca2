use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;

use crate::character::{
    form_fields, Character, CharacterDraft, CharacterId, CharacterPatch,
};
use crate::client::CharacterApi;

pub const TITLE: &str = "Marvel Characters Manager";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this character?";

/// Asked before anything destructive happens.
#[async_trait]
pub trait Confirm: Send {
    async fn confirm(&mut self, message: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    RealName,
    Universe,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::RealName, Field::Universe];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Character Name",
            Field::RealName => "Real Name",
            Field::Universe => "Universe",
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "name" => Ok(Field::Name),
            "real-name" | "realname" | "realName" => Ok(Field::RealName),
            "universe" => Ok(Field::Universe),
            other => Err(other.to_string()),
        }
    }
}

/// The three form-bound fields. Ids and extra fields are never editable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterForm {
    pub name: String,
    pub real_name: String,
    pub universe: String,
}

impl CharacterForm {
    pub fn from_character(character: &Character) -> Self {
        Self {
            name: character.name().to_string(),
            real_name: character.real_name().to_string(),
            universe: character.universe().to_string(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::RealName => &self.real_name,
            Field::Universe => &self.universe,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::RealName => self.real_name = value,
            Field::Universe => self.universe = value,
        }
    }

    /// First required field left blank, if any.
    pub fn missing(&self) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|field| self.get(*field).trim().is_empty())
    }

    pub fn to_draft(&self) -> CharacterDraft {
        CharacterDraft::new(&*self.name, &*self.real_name, &*self.universe)
    }

    pub fn to_patch(&self) -> CharacterPatch {
        CharacterPatch {
            fields: form_fields(&*self.name, &*self.real_name, &*self.universe),
        }
    }
}

/// Single page state over the character service. Local state only changes
/// after the service confirmed a change.
#[derive(Debug)]
pub struct App<A> {
    api: A,
    characters: Vec<Character>,
    form: CharacterForm,
    editing_id: Option<CharacterId>,
    error: Option<String>,
    loading: bool,
    scroll_to_top: bool,
}

impl<A> App<A> {
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn form(&self) -> &CharacterForm {
        &self.form
    }

    pub fn editing_id(&self) -> Option<CharacterId> {
        self.editing_id
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }
}

impl<A: CharacterApi> App<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            characters: Vec::new(),
            form: CharacterForm::default(),
            editing_id: None,
            error: None,
            loading: false,
            scroll_to_top: false,
        }
    }

    /// Marks the initial fetch as outstanding, so a front can draw the
    /// loading state before awaiting [`App::mount`].
    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// Initial fetch of the whole collection.
    pub async fn mount(&mut self) {
        self.loading = true;
        match self.api.list().await {
            Ok(characters) => self.characters = characters,
            Err(e) => {
                log::warn!("Fetching characters failed: {}", e);
                self.error = Some(e.to_string());
            }
        }
        self.loading = false;
    }

    pub fn set_field(&mut self, field: Field, value: String) {
        self.form.set(field, value);
    }

    /// Creates or updates depending on the edit mode. On success the form is
    /// cleared and edit mode is left.
    pub async fn submit(&mut self) {
        self.error = None;

        if let Some(field) = self.form.missing() {
            self.error = Some(format!("Please fill out the {} field", field.label()));
            return;
        }

        let result = match self.editing_id {
            Some(id) => self.api.update(id, &self.form.to_patch()).await.map(|updated| {
                for character in self.characters.iter_mut().filter(|c| c.id == id) {
                    *character = updated.clone();
                }
            }),
            None => self
                .api
                .create(&self.form.to_draft())
                .await
                .map(|created| self.characters.push(created)),
        };

        match result {
            Ok(()) => {
                self.form = CharacterForm::default();
                self.editing_id = None;
            }
            Err(e) => {
                log::warn!("Saving character failed: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    /// Loads a listed character into the form. Returns false when no listed
    /// character has `id`.
    pub fn edit(&mut self, id: CharacterId) -> bool {
        let Some(character) = self.characters.iter().find(|c| c.id == id) else {
            return false;
        };
        self.form = CharacterForm::from_character(character);
        self.editing_id = Some(id);
        self.scroll_to_top = true;
        true
    }

    /// Leaves edit mode without touching the service.
    pub fn cancel(&mut self) {
        if self.editing_id.is_some() {
            self.form = CharacterForm::default();
            self.editing_id = None;
        }
    }

    pub async fn delete<C>(&mut self, id: CharacterId, confirm: &mut C)
    where
        C: Confirm + ?Sized,
    {
        if !confirm.confirm(DELETE_PROMPT).await {
            log::debug!("Deletion of character {} cancelled", id);
            return;
        }

        match self.api.delete(id).await {
            Ok(()) => self.characters.retain(|c| c.id != id),
            Err(e) => {
                log::warn!("Deleting character {} failed: {}", id, e);
                self.error = Some(e.to_string());
            }
        }
    }

    /// True once after [`App::edit`] asked for the form to be brought into view.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_top)
    }
}

impl<A> Display for App<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", TITLE)?;
        writeln!(f)?;

        let (heading, action) = match self.editing_id() {
            Some(_) => ("Edit Character", "Update Character"),
            None => ("Add New Character", "Add Character"),
        };
        writeln!(f, "== {} ==", heading)?;
        for field in Field::ALL {
            let label = format!("{}:", field.label());
            writeln!(f, "  {:<15} {}", label, self.form().get(field))?;
        }
        if self.editing_id().is_some() {
            writeln!(f, "  [submit] {}  [cancel] Cancel", action)?;
        } else {
            writeln!(f, "  [submit] {}", action)?;
        }

        if let Some(error) = self.error() {
            writeln!(f)?;
            writeln!(f, "! {}", error)?;
        }
        if self.loading() {
            writeln!(f)?;
            writeln!(f, "Loading...")?;
        }

        for character in self.characters() {
            writeln!(f)?;
            writeln!(f, "#{} {}", character.id, character.name())?;
            writeln!(f, "   Real Name: {}", character.real_name())?;
            writeln!(f, "   Universe: {}", character.universe())?;
        }
        Ok(())
    }
}
