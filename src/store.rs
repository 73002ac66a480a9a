//! In-memory entity and definition stores with JSON persistence.
//!
//! Both stores keep insertion order, because the retriever's output order is
//! the store order. On disk each store is one JSON object
//! (`runners_data.json`, `definitions.json`) whose key order matches the
//! in-memory order; loading preserves the document order.
//!
//! Persistence is a synchronous full-file overwrite. A crash mid-write can
//! leave a corrupt document, which the next load reports as
//! [`StoreError::Load`].

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::{DerivedField, Entity, Kind};

pub const ENTITIES_FILE: &str = "runners_data.json";
pub const DEFINITIONS_FILE: &str = "definitions.json";

/// Ordered `name → Entity` mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    entries: Vec<(String, Entity)>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entity)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// Entities of one kind, in insertion order.
    pub fn of_kind(&self, kind: Kind) -> impl Iterator<Item = (&str, &Entity)> {
        self.iter().filter(move |(_, e)| e.kind == kind)
    }

    pub fn get(&self, name: &str) -> Result<&Entity, StoreError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Insert a new entity at the end, or replace an existing one in place.
    pub fn upsert(&mut self, name: impl Into<String>, entity: Entity) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = entity,
            None => self.entries.push((name, entity)),
        }
    }

    /// Set a derived metric on an existing entity.
    pub fn set_field(
        &mut self,
        name: &str,
        field: DerivedField,
        value: f64,
    ) -> Result<(), StoreError> {
        let entity = self
            .entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        entity.set_derived(field, value);
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the store contents with the document at `path`.
    pub fn load(&mut self, path: &Path) -> Result<(), StoreError> {
        let entries: Entries<Entity> = read_document(path)?;
        debug!(path = %path.display(), count = entries.0.len(), "loaded entities");
        self.entries = dedup(entries.0);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_document(path, &EntriesRef(&self.entries))
    }
}

/// Ordered `metric identifier → explanation` mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionStore {
    entries: Vec<(String, String)>,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a definition. Existing keys keep their position.
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        let key = key.into();
        let text = text.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = text,
            None => self.entries.push((key, text)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load(&mut self, path: &Path) -> Result<(), StoreError> {
        let entries: Entries<String> = read_document(path)?;
        debug!(path = %path.display(), count = entries.0.len(), "loaded definitions");
        self.entries = dedup(entries.0);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_document(path, &EntriesRef(&self.entries))
    }
}

/// Paths of the two persisted documents inside a data directory.
pub fn document_paths(dir: &Path) -> (PathBuf, PathBuf) {
    (dir.join(ENTITIES_FILE), dir.join(DEFINITIONS_FILE))
}

/// True when both persisted documents exist.
pub fn documents_exist(dir: &Path) -> bool {
    let (entities, definitions) = document_paths(dir);
    entities.exists() && definitions.exists()
}

/// Write both stores to `dir`, creating it if needed.
pub fn save_all(
    dir: &Path,
    entities: &EntityStore,
    definitions: &DefinitionStore,
) -> Result<(), StoreError> {
    let (entities_path, definitions_path) = document_paths(dir);
    entities.save(&entities_path)?;
    definitions.save(&definitions_path)?;
    info!(dir = %dir.display(), entities = entities.len(), "saved data");
    Ok(())
}

/// Load both stores from `dir`.
///
/// Both documents are read before anything is returned, so a failure in
/// either leaves the caller's stores untouched.
pub fn load_all(dir: &Path) -> Result<(EntityStore, DefinitionStore), StoreError> {
    let (entities_path, definitions_path) = document_paths(dir);
    let mut entities = EntityStore::new();
    entities.load(&entities_path)?;
    let mut definitions = DefinitionStore::new();
    definitions.load(&definitions_path)?;
    info!(dir = %dir.display(), entities = entities.len(), "loaded data");
    Ok((entities, definitions))
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| StoreError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let save_err = |reason: String| StoreError::Save {
        path: path.to_path_buf(),
        reason,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| save_err(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| save_err(e.to_string()))
}

/// Later duplicates replace earlier ones, keeping the first position.
fn dedup<V>(entries: Vec<(String, V)>) -> Vec<(String, V)> {
    let mut out: Vec<(String, V)> = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        match out.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => out.push((key, value)),
        }
    }
    out
}

// ============ Ordered JSON object (de)serialization ============

struct EntriesRef<'a, V>(&'a [(String, V)]);

impl<V: Serialize> Serialize for EntriesRef<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct Entries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}
