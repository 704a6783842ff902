use std::io::Write;
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{error, info};

use crate::errors::Error;

use super::{CredentialStore, TokenPair};

#[derive(Serialize, Deserialize)]
struct StoredCredential {
    #[serde(flatten)]
    tokens: TokenPair,
    updated_at: Timestamp,
}

/// Credential store persisted as a JSON file, so a session survives process restarts.
pub struct FileCredentialStore {
    path: PathBuf,
    tokens: RwLock<TokenPair>,
}

impl FileCredentialStore {
    /// Opens the store, loading the pair from `path` if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let tokens = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let stored: StoredCredential = serde_json::from_str(&contents)?;
            info!(
                "credential file loaded: path='{}' updated_at={}",
                path.display(),
                stored.updated_at
            );
            stored.tokens
        } else {
            TokenPair::default()
        };
        Ok(Self {
            path,
            tokens: RwLock::new(tokens),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, tokens: &TokenPair) -> Result<(), Error> {
        let stored = StoredCredential {
            tokens: tokens.clone(),
            updated_at: Timestamp::now(),
        };
        // temp file in the same directory, renamed over the target
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, &stored)?;
        file.flush()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn tokens(&self) -> TokenPair {
        self.tokens.read().clone()
    }

    fn set_tokens(&self, tokens: TokenPair) {
        let mut guard = self.tokens.write();
        if let Err(err) = self.persist(&tokens) {
            error!(
                "credential file write failed: path='{}' error={}",
                self.path.display(),
                err
            );
        }
        *guard = tokens;
    }

    fn clear(&self) {
        let mut guard = self.tokens.write();
        if self.path.exists()
            && let Err(err) = std::fs::remove_file(&self.path)
        {
            error!(
                "credential file removal failed: path='{}' error={}",
                self.path.display(),
                err
            );
        }
        *guard = TokenPair::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileCredentialStore::open(&path).unwrap();
        assert_eq!(store.access_token(), None);
        store.set_tokens(TokenPair::new("t1", Some("r1".into())));

        let reopened = FileCredentialStore::open(&path).unwrap();
        assert_eq!(reopened.access_token().as_deref(), Some("t1"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileCredentialStore::open(&path).unwrap();
        store.set_tokens(TokenPair::new("t1", None));
        assert!(path.exists());

        store.clear();
        assert!(!path.exists());
        assert_eq!(store.tokens(), TokenPair::default());
    }

    #[test]
    fn rewrite_replaces_file_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileCredentialStore::open(&path).unwrap();
        store.set_tokens(TokenPair::new("t1", Some("r1".into())));
        store.set_tokens(TokenPair::new("t2", Some("r2".into())));

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("session.json")]);

        let stored: StoredCredential =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.tokens, TokenPair::new("t2", Some("r2".into())));
    }
}
