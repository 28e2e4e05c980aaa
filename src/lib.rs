pub mod config;
pub mod crypto;
pub mod encoding;
mod error;
pub mod format;
pub mod record;
pub mod session;
mod storage;
mod store;

pub use crate::config::{Config, default_store_dir};
pub use crate::crypto::{KdfParams, fingerprint};
pub use crate::error::{Error, Result};
pub use crate::record::{Decrypted, Record, decrypt_from_record, encrypt_to_record};
pub use crate::session::{Session, UnlockCheck};
pub use crate::storage::FileStore;
pub use crate::store::{MemoryStore, RecordStore};

use tracing::info;
use zeroize::Zeroizing;

/// Password-protected file records over any [`RecordStore`].
///
/// Every encrypt/decrypt uses the session password and is rejected with
/// [`Error::SessionLocked`] while the session is locked. An operation holds
/// the session for its whole duration, so `lock` waits for it and no record
/// is written after the session has locked. Key derivation and the cipher
/// run on tokio's blocking pool; dropping a returned future cancels the
/// wait, not the primitive.
pub struct Sealbox<S> {
    store: S,
    session: Session,
    kdf: KdfParams,
    unlock_check: UnlockCheck,
}

impl Sealbox<FileStore> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(FileStore::new(config.store_dir.clone()))
            .with_kdf(config.kdf)
            .with_unlock_check(config.unlock_check)
    }
}

impl<S: RecordStore> Sealbox<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: Session::new(),
            kdf: KdfParams::default(),
            unlock_check: UnlockCheck::default(),
        }
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn with_unlock_check(mut self, check: UnlockCheck) -> Self {
        self.unlock_check = check;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn attempt_unlock(&self, password: Zeroizing<String>) -> Result<()> {
        self.session
            .attempt_unlock(&self.store, password, self.unlock_check)
            .await
    }

    pub async fn lock(&self) {
        self.session.lock().await;
    }

    pub async fn is_unlocked(&self) -> bool {
        self.session.is_unlocked().await
    }

    /// Seal `data` and store it, replacing any record with the same identifier.
    pub async fn save_file(
        &self,
        identifier: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<Record> {
        let session = self.session.hold().await?;
        let password = (*session).clone();
        let identifier_owned = identifier.to_string();
        let plaintext = Zeroizing::new(data.to_vec());
        let kdf = self.kdf;

        let mut record = tokio::task::spawn_blocking(move || {
            encrypt_to_record(&identifier_owned, &plaintext, &password, kdf)
        })
        .await??;
        if let Some(content_type) = content_type {
            record = record.with_content_type(content_type);
        }

        self.store.put(&record).await?;
        drop(session);
        info!(identifier, size = record.size_bytes(), "file sealed");
        Ok(record)
    }

    /// Decrypt a stored record with the session password.
    pub async fn open_file(&self, identifier: &str) -> Result<Decrypted> {
        let session = self.session.hold().await?;
        let password = (*session).clone();
        let record = self.get_record(identifier).await?;

        let decrypted =
            tokio::task::spawn_blocking(move || decrypt_from_record(&record, &password)).await?;
        drop(session);
        decrypted
    }

    /// Store a record sealed elsewhere.
    ///
    /// The record must open under the session password so the store keeps
    /// a single password.
    pub async fn import_record(&self, record: Record) -> Result<()> {
        let session = self.session.hold().await?;
        let password = (*session).clone();

        let record = tokio::task::spawn_blocking(move || {
            decrypt_from_record(&record, &password).map(|_| record)
        })
        .await??;

        self.store.put(&record).await?;
        drop(session);
        info!(identifier = record.identifier(), "record imported");
        Ok(())
    }

    pub async fn get_record(&self, identifier: &str) -> Result<Record> {
        self.store
            .get(identifier)
            .await?
            .ok_or_else(|| Error::RecordNotFound(identifier.to_string()))
    }

    pub async fn delete_file(&self, identifier: &str) -> Result<()> {
        if !self.store.delete(identifier).await? {
            return Err(Error::RecordNotFound(identifier.to_string()));
        }
        info!(identifier, "record deleted");
        Ok(())
    }

    /// All records, oldest first.
    pub async fn list_files(&self) -> Result<Vec<Record>> {
        let mut records = self.store.list_all().await?;
        records.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.identifier().cmp(b.identifier()))
        });
        Ok(records)
    }

    /// Delete every record and lock the session. Returns how many were removed.
    ///
    /// Damaged entries are removed too, so a reset always leaves an empty
    /// store.
    pub async fn reset(&self) -> Result<usize> {
        let removed = self.store.clear().await?;
        self.session.lock().await;
        info!(removed, "store reset");
        Ok(removed)
    }
}
