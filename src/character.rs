use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type CharacterId = i64;

/// Every field of a record except its id, in insertion order. Values are kept
/// as the client sent them, whatever their JSON type.
pub type Fields = Map<String, Value>;

pub const NAME: &str = "name";
pub const REAL_NAME: &str = "realName";
pub const UNIVERSE: &str = "universe";

const ID: &str = "id";

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Character {
    pub id: CharacterId,

    #[serde(flatten)]
    pub fields: Fields,
}

/// Payload of a create request. Any `id` it carries is dropped; the server
/// assigns one.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(transparent)]
pub struct CharacterDraft {
    pub fields: Fields,
}

/// Payload of an update request. Only the keys present are applied.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(transparent)]
pub struct CharacterPatch {
    pub fields: Fields,
}

/// The three fields the client form edits, as JSON strings.
pub fn form_fields<N, R, U>(name: N, real_name: R, universe: U) -> Fields
where
    N: Into<String>,
    R: Into<String>,
    U: Into<String>,
{
    let mut fields = Fields::new();
    fields.insert(NAME.to_string(), Value::String(name.into()));
    fields.insert(REAL_NAME.to_string(), Value::String(real_name.into()));
    fields.insert(UNIVERSE.to_string(), Value::String(universe.into()));
    fields
}

impl CharacterDraft {
    pub fn new<N, R, U>(name: N, real_name: R, universe: U) -> Self
    where
        N: Into<String>,
        R: Into<String>,
        U: Into<String>,
    {
        Self {
            fields: form_fields(name, real_name, universe),
        }
    }

    /// Turns the draft into a stored record.
    pub fn into_character(self, id: CharacterId) -> Character {
        let mut fields = self.fields;
        fields.remove(ID);
        Character { id, fields }
    }
}

impl Character {
    /// Shallow merge of `patch` over this record. The id never changes.
    pub fn apply(&mut self, patch: CharacterPatch) {
        for (key, value) in patch.fields {
            if key == ID {
                continue;
            }
            self.fields.insert(key, value);
        }
    }

    /// String value of `key`, empty when absent or not a string.
    pub fn text(&self, key: &str) -> &str {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.text(NAME)
    }

    pub fn real_name(&self) -> &str {
        self.text(REAL_NAME)
    }

    pub fn universe(&self) -> &str {
        self.text(UNIVERSE)
    }
}
