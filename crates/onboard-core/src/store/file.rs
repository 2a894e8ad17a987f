//! File-backed credential store.
//!
//! Stores the pair in `<ONBOARD_HOME>/credentials.json` with restricted
//! permissions (0600). Writes go through a temp file in the same directory
//! followed by a rename, so readers in other processes never see a torn file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tokio::sync::watch;

use super::{CredentialPair, CredentialStore};
use crate::config::paths;

pub struct FileCredentialStore {
    path: PathBuf,
    /// Serializes file replacement between handles in this process.
    write_lock: Mutex<()>,
    tx: watch::Sender<CredentialPair>,
}

impl FileCredentialStore {
    /// Opens the store at the default credentials path.
    ///
    /// # Errors
    /// Returns an error if an existing credentials file cannot be parsed.
    pub fn open_default() -> Result<Self> {
        Self::open(paths::credentials_path())
    }

    /// Opens the store at `path`. A missing file means "logged out".
    ///
    /// # Errors
    /// Returns an error if an existing credentials file cannot be parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let initial = read_pair(&path)?;
        let (tx, _rx) = watch::channel(initial);
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
            tx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_pair(&self, pair: &CredentialPair) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if pair.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err)
                    .with_context(|| format!("Failed to remove {}", self.path.display())),
            };
        }

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;

        let contents =
            serde_json::to_string_pretty(pair).context("Failed to serialize credentials")?;

        // NamedTempFile is created with 0600 on unix.
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
        tmp.write_all(contents.as_bytes())
            .context("Failed to write credentials")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<CredentialPair> {
        read_pair(&self.path)
    }

    fn save(&self, pair: &CredentialPair) -> Result<()> {
        self.write_pair(pair)?;
        self.tx.send_replace(pair.clone());
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<CredentialPair> {
        self.tx.subscribe()
    }

    fn reload(&self) -> Result<bool> {
        let on_disk = read_pair(&self.path)?;
        Ok(self.tx.send_if_modified(|current| {
            if *current == on_disk {
                false
            } else {
                *current = on_disk;
                true
            }
        }))
    }
}

fn read_pair(path: &Path) -> Result<CredentialPair> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(CredentialPair::default()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read credentials from {}", path.display()));
        }
    };

    if contents.trim().is_empty() {
        return Ok(CredentialPair::default());
    }

    let pair: CredentialPair = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse credentials from {}", path.display()))?;
    // Re-normalize so hand-edited empty strings count as missing.
    Ok(CredentialPair::new(
        pair.access.unwrap_or_default(),
        pair.refresh.unwrap_or_default(),
    ))
}
