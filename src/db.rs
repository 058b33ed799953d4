use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, StoreError};
use crate::models::{Tweet, UserRecord};

/// Abstract interface over one backing collection.
/// Agnostic of the underlying storage mechanism (file or memory).
pub trait Store<T>: Send + Sync {
    /// Decode the full collection. An absent backing file is an empty
    /// collection, not an error.
    fn load(&self) -> Result<Vec<T>, StoreError>;

    /// Overwrite the full collection.
    fn save(&self, records: &[T]) -> Result<(), StoreError>;
}

/// One JSON array per file.
pub struct JsonStore<T> {
    path: PathBuf,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _records: PhantomData,
        }
    }
}

impl<T> Store<T> for JsonStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Vec<T>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(StoreError::Unavailable)?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, records: &[T]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(StoreError::Unavailable)?;
            }
        }
        let raw = serde_json::to_string_pretty(records).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        // Readers must never observe a half-written array.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(StoreError::Unavailable)?;
        fs::rename(&tmp, &self.path).map_err(StoreError::Unavailable)?;
        Ok(())
    }
}

/// In-memory storage for tests and ephemeral use. Does NOT persist.
pub struct MemoryStore<T> {
    records: Mutex<Vec<T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Store<T> for MemoryStore<T>
where
    T: Clone + Send,
{
    fn load(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.lock().clone())
    }

    fn save(&self, records: &[T]) -> Result<(), StoreError> {
        *self.lock() = records.to_vec();
        Ok(())
    }
}

/// A collection handle: the store plus its write-serialization point.
pub struct Collection<T> {
    store: Box<dyn Store<T>>,
    write_lock: Mutex<()>,
}

impl<T: Clone> Collection<T> {
    pub fn new(store: Box<dyn Store<T>>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Decoded snapshot of the collection.
    pub fn read(&self) -> Result<Vec<T>, StoreError> {
        self.store.load()
    }

    /// Run `f` over the decoded records and persist the result. Writers to
    /// the same collection are serialized; an error from `f` leaves the
    /// backing collection untouched.
    pub fn write<R>(
        &self,
        f: impl FnOnce(&mut Vec<T>) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.store.load()?;
        let out = f(&mut records)?;
        self.store.save(&records)?;
        Ok(out)
    }
}

/// Process-wide handle to the two collections.
pub struct AppState {
    pub users: Collection<UserRecord>,
    pub tweets: Collection<Tweet>,
}

impl AppState {
    /// File-backed state rooted at `data_dir` (`users.json` / `tweets.json`).
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            users: Collection::new(Box::new(JsonStore::new(dir.join("users.json")))),
            tweets: Collection::new(Box::new(JsonStore::new(dir.join("tweets.json")))),
        }
    }

    /// Ephemeral state backed by memory stores.
    pub fn in_memory() -> Self {
        Self {
            users: Collection::new(Box::new(MemoryStore::new())),
            tweets: Collection::new(Box::new(MemoryStore::new())),
        }
    }
}

/// First record matching `pred`, scanning in stored order.
pub fn find<'a, T>(
    records: &'a [T],
    entity: &'static str,
    pred: impl Fn(&T) -> bool,
) -> Result<&'a T, ApiError> {
    records
        .iter()
        .find(|r| pred(r))
        .ok_or(ApiError::NotFound(entity))
}

/// Position of the first record matching `pred`.
pub fn find_index<T>(
    records: &[T],
    entity: &'static str,
    pred: impl Fn(&T) -> bool,
) -> Result<usize, ApiError> {
    records
        .iter()
        .position(|r| pred(r))
        .ok_or(ApiError::NotFound(entity))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use tempfile::tempdir;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: u32,
        name: String,
    }

    fn entry(id: u32, name: &str) -> Entry {
        Entry {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn json_store_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store: JsonStore<Entry> = JsonStore::new(dir.path().join("entries.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn json_store_round_trip() {
        let dir = tempdir().unwrap();
        let store: JsonStore<Entry> = JsonStore::new(dir.path().join("entries.json"));

        let records = vec![entry(1, "one"), entry(2, "two")];
        store.save(&records).unwrap();

        assert_eq!(store.load().unwrap(), records);
    }

    #[test]
    fn json_store_creates_parent_dir() {
        let dir = tempdir().unwrap();
        let store: JsonStore<Entry> = JsonStore::new(dir.path().join("nested/entries.json"));
        store.save(&[entry(1, "one")]).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn json_store_rejects_non_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entries.json");
        fs::write(&path, r#"{"not": "an array"}"#).unwrap();

        let store: JsonStore<Entry> = JsonStore::new(&path);
        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn json_store_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store: JsonStore<Entry> = JsonStore::new(dir.path().join("entries.json"));
        store.save(&[entry(1, "one")]).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["entries.json"]);
    }

    #[test]
    fn memory_store_round_trip() {
        let store: MemoryStore<Entry> = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());

        store.save(&[entry(1, "one")]).unwrap();
        assert_eq!(store.load().unwrap(), vec![entry(1, "one")]);
    }

    #[test]
    fn collection_write_persists_mutation() {
        let collection: Collection<Entry> = Collection::new(Box::new(MemoryStore::new()));
        let added = collection
            .write(|records| {
                records.push(entry(1, "one"));
                Ok(records.len())
            })
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(collection.read().unwrap(), vec![entry(1, "one")]);
    }

    #[test]
    fn failed_write_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entries.json");
        let collection: Collection<Entry> = Collection::new(Box::new(JsonStore::new(&path)));

        collection
            .write(|records| {
                records.push(entry(1, "one"));
                Ok(())
            })
            .unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let err = collection
            .write(|records| -> Result<(), ApiError> {
                records.clear();
                Err(ApiError::NotFound("entry"))
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("entry")));

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn find_returns_first_match_in_stored_order() {
        let records = vec![entry(1, "dup"), entry(2, "dup"), entry(3, "other")];
        let hit = find(&records, "entry", |e| e.name == "dup").unwrap();
        assert_eq!(hit.id, 1);
    }

    #[test]
    fn find_miss_is_not_found() {
        let records = vec![entry(1, "one")];
        let err = find(&records, "entry", |e| e.id == 9).unwrap_err();
        assert!(matches!(err, ApiError::NotFound("entry")));
    }

    #[test]
    fn find_index_reports_position() {
        let records = vec![entry(1, "one"), entry(2, "two")];
        assert_eq!(find_index(&records, "entry", |e| e.id == 2).unwrap(), 1);
        assert!(find_index(&records, "entry", |e| e.id == 3).is_err());
    }
}
