use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::credentials::credential::Credential;
use crate::error::ServiceError;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Durable storage for the single credential record.
///
/// Writes go to a sibling temp file which is fsynced and renamed over the record,
/// so a concurrent `load` sees either the previous or the new record in full.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `CredentialMissing` when the record is absent or cannot be decoded.
    pub async fn load(&self) -> Result<Credential, ServiceError> {
        let raw = fs::read(&self.path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ServiceError::CredentialMissing(format!(
                "no token at '{}', log in first",
                self.path.display()
            )),
            _ => ServiceError::CredentialMissing(format!(
                "unable to read '{}': {}",
                self.path.display(),
                e
            )),
        })?;
        serde_json::from_slice(&raw).map_err(|e| {
            ServiceError::CredentialMissing(format!("malformed token at '{}': {}", self.path.display(), e))
        })
    }

    pub async fn save(&self, credential: &Credential) -> Result<(), ServiceError> {
        if credential.refresh_token.is_empty() {
            return Err(ServiceError::CredentialPersist(
                "refusing to persist a credential without a refresh token".to_owned(),
            ));
        }
        let payload =
            serde_json::to_vec(credential).map_err(|e| ServiceError::CredentialPersist(e.to_string()))?;

        let _guard = self.write_lock.lock().await;
        let tmp = self.tmp_path();
        if let Err(e) = write_synced(&tmp, &payload).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::CredentialPersist(format!(
                "writing '{}' failed: {}",
                tmp.display(),
                e
            )));
        }
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::CredentialPersist(format!(
                "replacing '{}' failed: {}",
                self.path.display(),
                e
            )));
        }
        debug!("credential persisted to {}", self.path.display());
        info!("credential saved, expires at {}", credential.expiry);
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "token".to_owned());
        self.path
            .with_file_name(format!(".{}.{}.{}.tmp", file_name, std::process::id(), n))
    }
}

async fn write_synced(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(payload).await?;
    file.sync_all().await?;
    Ok(())
}
