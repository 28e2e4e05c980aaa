//! Unlock state for one running instance.
//!
//! The session starts `Locked` and never persists anything: the verified
//! password lives only in memory and is zeroized when the session locks.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::record::{Record, decrypt_from_record};
use crate::store::RecordStore;

/// How many stored records a candidate password is checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnlockCheck {
    /// Trial-decrypt the first record the store returns.
    ///
    /// This is a heuristic: it assumes every record was sealed with the same
    /// password and proves nothing about the others.
    #[default]
    FirstRecord,
    /// Trial-decrypt every stored record.
    EveryRecord,
}

struct SessionInner {
    password: RwLock<Option<Zeroizing<String>>>,
    // Serializes unlock/lock transitions.
    transition: Mutex<()>,
}

/// Thread-safe session handle. Clone to share.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                password: RwLock::new(None),
                transition: Mutex::new(()),
            }),
        }
    }

    pub async fn is_unlocked(&self) -> bool {
        self.inner.password.read().await.is_some()
    }

    /// Copy of the session password for a single operation.
    ///
    /// Fails with [`Error::SessionLocked`] before any cryptographic work.
    pub async fn password(&self) -> Result<Zeroizing<String>> {
        self.inner
            .password
            .read()
            .await
            .clone()
            .ok_or(Error::SessionLocked)
    }

    /// Keep the session unlocked while the returned guard lives.
    ///
    /// `lock` and unlock transitions wait for every outstanding guard, so an
    /// operation that started unlocked completes before the session locks
    /// and nothing it writes lands afterwards.
    pub async fn hold(&self) -> Result<RwLockReadGuard<'_, Zeroizing<String>>> {
        RwLockReadGuard::try_map(self.inner.password.read().await, Option::as_ref)
            .map_err(|_| Error::SessionLocked)
    }

    /// Validate `password` against `store` and unlock on success.
    ///
    /// An empty store accepts any non-empty password. Otherwise the records
    /// selected by `check` are trial-decrypted off the async runtime; a
    /// failure leaves the session exactly as it was. Concurrent attempts
    /// are serialized. Dropping the returned future abandons the wait
    /// without touching the session.
    pub async fn attempt_unlock<S: RecordStore>(
        &self,
        store: &S,
        password: Zeroizing<String>,
        check: UnlockCheck,
    ) -> Result<()> {
        if password.is_empty() {
            return Err(Error::InvalidInput("password cannot be empty".to_string()));
        }

        let _transition = self.inner.transition.lock().await;

        let records = store.list_all().await?;
        let samples: Vec<Record> = match check {
            UnlockCheck::FirstRecord => records.into_iter().take(1).collect(),
            UnlockCheck::EveryRecord => records,
        };

        if samples.is_empty() {
            debug!("store is empty, nothing to validate against");
        } else {
            let candidate = password.clone();
            let checked = samples.len();
            let verdict = tokio::task::spawn_blocking(move || {
                samples
                    .iter()
                    .try_for_each(|record| decrypt_from_record(record, &candidate).map(drop))
            })
            .await?;

            if let Err(e) = verdict {
                if matches!(e, Error::WrongPasswordOrCorruptData) {
                    warn!(checked, "unlock rejected");
                }
                return Err(e);
            }
            debug!(checked, "trial decryption succeeded");
        }

        *self.inner.password.write().await = Some(password);
        info!("session unlocked");
        Ok(())
    }

    /// Lock the session and zeroize the password.
    ///
    /// Waits for an in-flight unlock attempt and for every [`Session::hold`]
    /// guard to be released first.
    pub async fn lock(&self) {
        let _transition = self.inner.transition.lock().await;
        if self.inner.password.write().await.take().is_some() {
            info!("session locked");
        }
    }
}
