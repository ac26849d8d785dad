use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub const ACCESS_TOKEN: &str = "accessToken";
pub const REFRESH_TOKEN: &str = "refreshToken";

/// Key-value jar holding the session credentials between runs.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// JSON file store: ~/.config/rugen/cookies.json
///
/// Read and write failures are swallowed; a broken jar behaves like an empty
/// one and the user simply has to log in again.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: PathBuf) -> Self {
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default();

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        Some(crate::config::config_dir()?.join("cookies.json"))
    }

    fn flush(&self, entries: &BTreeMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %e, "could not create credentials directory");
            }
        }
        match serde_json::to_string_pretty(entries) {
            Ok(data) => {
                if let Err(e) = std::fs::write(&self.path, data) {
                    tracing::warn!(path = %self.path.display(), error = %e, "could not persist credentials");
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not serialize credentials"),
        }
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        entries.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
            self.flush(&entries);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.remove(key).is_some() {
                self.flush(&entries);
            }
        }
    }
}

/// Process-local store, used when no config directory exists and in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        entries.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rugen-store-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn file_store_persists_across_instances() {
        let path = temp_path("persist");
        let _ = std::fs::remove_file(&path);

        let store = FileStore::open(path.clone());
        store.set(ACCESS_TOKEN, "a");
        store.set(REFRESH_TOKEN, "r");

        let reopened = FileStore::open(path.clone());
        assert_eq!(reopened.get(ACCESS_TOKEN).as_deref(), Some("a"));
        assert_eq!(reopened.get(REFRESH_TOKEN).as_deref(), Some("r"));

        reopened.remove(ACCESS_TOKEN);
        let again = FileStore::open(path.clone());
        assert_eq!(again.get(ACCESS_TOKEN), None);
        assert_eq!(again.get(REFRESH_TOKEN).as_deref(), Some("r"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unwritable_directory_keeps_values_in_memory() {
        let blocker = temp_path("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let store = FileStore::open(blocker.join("cookies.json"));
        store.set(ACCESS_TOKEN, "a");
        assert_eq!(store.get(ACCESS_TOKEN).as_deref(), Some("a"));
        assert!(blocker.is_file());

        let _ = std::fs::remove_file(&blocker);
    }

    #[test]
    fn corrupt_file_behaves_like_empty_jar() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::open(path.clone());
        assert_eq!(store.get(ACCESS_TOKEN), None);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_values_read_as_missing() {
        let store = MemoryStore::default();
        store.set(ACCESS_TOKEN, "");
        assert_eq!(store.get(ACCESS_TOKEN), None);
    }
}
