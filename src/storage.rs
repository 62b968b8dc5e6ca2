use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::character::Character;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("error reading document {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error deserializing JSON {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("error writing document {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error serializing characters: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk layout: `{ "characters": [ ... ] }`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct Document {
    pub characters: Vec<Character>,
}

impl Document {
    pub fn from_json_file<P>(path: P) -> Result<Self, StorageError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|source| StorageError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Pretty printed with two space indentation, newline terminated.
    pub fn to_pretty_json(&self) -> Result<String, StorageError> {
        let mut output = serde_json::to_string_pretty(self)?;
        output.push('\n');
        Ok(output)
    }
}

/// The whole collection lives in one JSON document. Every load reads the file
/// from scratch and every save replaces it.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes an empty collection if no document exists yet. Returns whether
    /// a document was created.
    pub fn create_if_missing(&self) -> Result<bool, StorageError> {
        if self.path.exists() {
            return Ok(false);
        }
        log::info!("Creating empty document at {:?}", self.path);
        self.save(&[])?;
        Ok(true)
    }

    pub fn load(&self) -> Result<Vec<Character>, StorageError> {
        log::trace!("Loading characters from {:?}", self.path);
        let document = Document::from_json_file(&self.path)?;
        Ok(document.characters)
    }

    /// Replaces the document. The content goes to a temporary sibling file
    /// first and is renamed over the document, so readers see either the old
    /// or the new collection.
    pub fn save(&self, characters: &[Character]) -> Result<(), StorageError> {
        log::trace!("Saving {} characters to {:?}", characters.len(), self.path);
        let document = Document {
            characters: characters.to_vec(),
        };
        let output = document.to_pretty_json()?;

        let write_error = |source: std::io::Error| StorageError::Write {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
        file.write_all(output.as_bytes()).map_err(write_error)?;
        file.flush().map_err(write_error)?;
        file.persist(&self.path).map_err(|e| write_error(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterDraft;

    fn store_in(dir: &tempfile::TempDir) -> JsonStore {
        JsonStore::open(dir.path().join("characters.json"))
    }

    #[test]
    fn missing_document_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(matches!(store.load(), Err(StorageError::Read { .. })));
    }

    #[test]
    fn corrupt_document_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(StorageError::Parse { .. })));

        std::fs::write(store.path(), r#"{"heroes": []}"#).unwrap();
        assert!(matches!(store.load(), Err(StorageError::Parse { .. })));
    }

    #[test]
    fn saves_pretty_printed_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let characters =
            vec![CharacterDraft::new("Iron Man", "Tony Stark", "Earth-616").into_character(1)];

        store.save(&characters).unwrap();

        let written = std::fs::read_to_string(store.path()).unwrap();
        let expected = r#"{
  "characters": [
    {
      "id": 1,
      "name": "Iron Man",
      "realName": "Tony Stark",
      "universe": "Earth-616"
    }
  ]
}
"#;
        assert_eq!(written, expected);
    }

    #[test]
    fn preserves_order_across_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let characters: Vec<_> = [5, 2, 9]
            .into_iter()
            .map(|id| {
                CharacterDraft::new(format!("Hero {}", id), "Someone", "Earth-616")
                    .into_character(id)
            })
            .collect();

        store.save(&characters).unwrap();
        assert_eq!(store.load().unwrap(), characters);
    }

    #[test]
    fn loads_and_rewrites_any_field_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let document = r#"{
  "characters": [
    {
      "id": 1,
      "name": "Vision",
      "realName": null,
      "universe": 616,
      "tags": [
        "synthezoid"
      ]
    }
  ]
}
"#;
        std::fs::write(store.path(), document).unwrap();

        let characters = store.load().unwrap();
        assert_eq!(characters[0].universe(), "");
        store.save(&characters).unwrap();

        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), document);
    }

    #[test]
    fn create_if_missing_leaves_existing_documents_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.create_if_missing().unwrap());
        assert!(store.load().unwrap().is_empty());

        store
            .save(&[CharacterDraft::new("Hulk", "Bruce Banner", "Earth-616").into_character(1)])
            .unwrap();
        assert!(!store.create_if_missing().unwrap());
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn save_into_missing_directory_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("nope").join("characters.json"));
        assert!(matches!(store.save(&[]), Err(StorageError::Write { .. })));
    }
}
