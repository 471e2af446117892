use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{ApiResult, ClientError};

/// String key/value persistence in the manner of browser local storage.
///
/// Operations never fail from the caller's point of view. Backends that
/// persist somewhere fallible log the failure and keep serving from memory.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    /// Removes every key in one step.
    fn remove_all(&self, keys: &[&str]) {
        for key in keys {
            self.remove(key);
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    fn remove_all(&self, keys: &[&str]) {
        let mut entries = self.entries.lock();
        for key in keys {
            entries.remove(*key);
        }
    }
}

/// A JSON object on disk, rewritten after every mutation.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens `path`, starting empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                ClientError::Storage(format!("{} is not a valid session file: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Session file {} not found, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                return Err(ClientError::Storage(format!(
                    "could not read {}: {e}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Writes a sibling temp file and renames it over the session file, so a
    /// crash leaves either the old or the new contents.
    fn persist(&self, entries: &BTreeMap<String, String>) {
        let temp = self.temp_path();
        let result = serde_json::to_string_pretty(entries)
            .map_err(|e| e.to_string())
            .and_then(|data| {
                let mut file = owner_only(&mut OpenOptions::new())
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&temp)
                    .map_err(|e| e.to_string())?;
                file.write_all(data.as_bytes()).map_err(|e| e.to_string())?;
                file.sync_all().map_err(|e| e.to_string())?;
                fs::rename(&temp, &self.path).map_err(|e| e.to_string())
            });

        if let Err(e) = result {
            warn!("Failed to write session file {}: {e}", self.path.display());
            let _ = fs::remove_file(&temp);
        }
    }
}

// Session files hold bearer tokens.
#[cfg(unix)]
fn owner_only(options: &mut OpenOptions) -> &mut OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600)
}

#[cfg(not(unix))]
fn owner_only(options: &mut OpenOptions) -> &mut OpenOptions {
    options
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }

    fn remove_all(&self, keys: &[&str]) {
        let mut entries = self.entries.lock();
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() != before {
            self.persist(&entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_storage_remove_all_clears_only_named_keys() {
        let storage = MemoryStorage::new();
        storage.set("a", "1");
        storage.set("b", "2");
        storage.set("keep", "3");

        storage.remove_all(&["a", "b", "missing"]);

        assert_eq!(storage.get("a"), None);
        assert_eq!(storage.get("b"), None);
        assert_eq!(storage.get("keep").as_deref(), Some("3"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        {
            let storage = FileStorage::open(&path).unwrap();
            storage.set("salon.access_token", "abc");
            storage.set("salon.refresh_token", "def");
            storage.remove("salon.refresh_token");
        }

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("salon.access_token").as_deref(), Some("abc"));
        assert_eq!(reopened.get("salon.refresh_token"), None);
    }

    #[test]
    fn file_storage_replaces_the_file_without_leaving_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set("salon.access_token", "abc");
        storage.set("salon.access_token", "xyz");

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("session.json")]);

        let raw = fs::read_to_string(&path).unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["salon.access_token"], "xyz");
    }

    #[cfg(unix)]
    #[test]
    fn file_storage_is_readable_by_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileStorage::open(&path).unwrap().set("salon.refresh_token", "secret");

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn file_storage_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let err = FileStorage::open(&path).unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));
    }

    #[test]
    fn file_storage_treats_missing_and_empty_files_as_empty() {
        let dir = tempdir().unwrap();
        let missing = FileStorage::open(dir.path().join("nope.json")).unwrap();
        assert_eq!(missing.get("anything"), None);

        let empty_path = dir.path().join("empty.json");
        fs::write(&empty_path, "").unwrap();
        let empty = FileStorage::open(&empty_path).unwrap();
        assert_eq!(empty.get("anything"), None);
    }
}
