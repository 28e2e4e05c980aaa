//! Directory-backed record store.
//!
//! Each record lives in its own `<stem>.json` file. The stem is the lowercase
//! hex SHA-256 of the identifier: fixed length, case-insensitive safe, and
//! never escapes the store directory. The identifier itself is read back from
//! the record body.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::crypto::{self, DIGEST_LEN};
use crate::encoding;
use crate::error::{Error, Result};
use crate::format;
use crate::record::Record;
use crate::store::RecordStore;

const RECORD_EXT: &str = "json";

/// A [`RecordStore`] persisting portable records to the filesystem.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a new FileStore rooted at `dir`. The directory is created on
    /// first write.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Returns the store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{}.{RECORD_EXT}", record_stem(identifier)))
    }

    fn put_blocking(&self, record: &Record) -> Result<()> {
        let json = format::to_json(record)?;
        save_atomic(&self.record_path(record.identifier()), json.as_bytes())?;
        debug!(identifier = record.identifier(), "record written");
        Ok(())
    }

    fn get_blocking(&self, identifier: &str) -> Result<Option<Record>> {
        match fs::read_to_string(self.record_path(identifier)) {
            Ok(text) => Ok(Some(parse_checked(&text, &record_stem(identifier))?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_blocking(&self, identifier: &str) -> Result<bool> {
        match fs::remove_file(self.record_path(identifier)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Paths of every file in the store directory named like a record.
    fn record_files(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if stem_of(&path).is_some() {
                paths.push(path);
            } else {
                debug!(path = %path.display(), "skipping foreign file in store directory");
            }
        }
        Ok(paths)
    }

    /// Every record that parses. A damaged file is logged and skipped so
    /// one bad entry cannot hide the rest of the store; `get` on it still
    /// reports the error.
    fn list_blocking(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for path in self.record_files()? {
            let Some(stem) = stem_of(&path) else {
                continue;
            };
            let loaded = fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|text| parse_checked(&text, stem));
            match loaded {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable record");
                }
            }
        }
        Ok(records)
    }

    /// Remove every record file, parseable or not.
    fn clear_blocking(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.record_files()? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!(removed, "store directory cleared");
        Ok(removed)
    }
}

/// File stem for `identifier`.
fn record_stem(identifier: &str) -> String {
    encoding::to_hex(&crypto::fingerprint(identifier.as_bytes()))
}

/// The stem of `path` if it names a record file.
fn stem_of(path: &Path) -> Option<&str> {
    if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let is_digest = stem.len() == 2 * DIGEST_LEN
        && stem.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    is_digest.then_some(stem)
}

/// Parse a stored record and make sure it sits under its own stem.
fn parse_checked(text: &str, stem: &str) -> Result<Record> {
    let record = format::from_json(text)?;
    if record_stem(record.identifier()) != stem {
        return Err(Error::MalformedRecord(format!(
            "record '{}' is stored under a foreign name",
            record.identifier()
        )));
    }
    Ok(record)
}

/// Writes `data` to `path` using atomic write.
///
/// This method ensures crash-safety by:
/// 1. Writing data to a temporary file with random name
/// 2. Syncing the temporary file to disk
/// 3. Atomically replacing the old file with the new one
/// 4. Syncing the parent directory to ensure the rename is persisted
///
/// Creates parent directories if they don't exist.
fn save_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = random_tmp_path(path)?;

    // securely create temp file (fail if exists)
    let mut tmp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)?;

    tmp_file.write_all(data)?;
    tmp_file.sync_all()?; //fsync file
    drop(tmp_file);

    if let Err(e) = atomic_replace(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    // fsync directory
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(parent) = path.parent() {
            fs::File::open(parent)?.sync_all()?;
        }
    }

    Ok(())
}

/// Generates a unique temporary file path in the same directory.
///
/// Format: `filename.tmp.<randomhex>`
fn random_tmp_path(path: &Path) -> Result<PathBuf> {
    let buf: [u8; 8] = encoding::random_array()?; // 64 bit entropy

    let rand_string = encoding::to_hex(&buf);

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("{} has no file name", path.display())))?
        .to_string_lossy();

    Ok(path.with_file_name(format!("{file_name}.tmp.{rand_string}")))
}

/// Atomically replaces the target file with the temporary file.
///
/// Uses Windows `ReplaceFileW` API with `REPLACEFILE_WRITE_THROUGH` flag.
/// `ReplaceFileW` needs an existing target, so first writes fall back to a rename.
#[cfg(target_os = "windows")]
fn atomic_replace(tmp_path: &Path, target: &Path) -> Result<()> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

    if !target.exists() {
        fs::rename(tmp_path, target)?;
        return Ok(());
    }

    fn to_wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }

    let target_w = to_wide(target.as_os_str());
    let tmp_w = to_wide(tmp_path.as_os_str());

    // SAFETY:
    // - Strings are valid UTF-16 and null-terminated
    // - Pointers remain valid during the call
    // - Windows does not retain the pointers after return
    let result = unsafe {
        ReplaceFileW(
            target_w.as_ptr(),
            tmp_w.as_ptr(),
            std::ptr::null(),
            REPLACEFILE_WRITE_THROUGH,
            std::ptr::null(),
            std::ptr::null(),
        )
    };

    if result == 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    Ok(())
}

/// On Unix, `rename()` is atomic when both paths are on the same filesystem.
#[cfg(not(target_os = "windows"))]
fn atomic_replace(tmp_path: &Path, target: &Path) -> Result<()> {
    fs::rename(tmp_path, target)?;
    Ok(())
}

impl RecordStore for FileStore {
    async fn put(&self, record: &Record) -> Result<()> {
        let store = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || store.put_blocking(&record)).await?
    }

    async fn get(&self, identifier: &str) -> Result<Option<Record>> {
        let store = self.clone();
        let identifier = identifier.to_string();
        tokio::task::spawn_blocking(move || store.get_blocking(&identifier)).await?
    }

    async fn delete(&self, identifier: &str) -> Result<bool> {
        let store = self.clone();
        let identifier = identifier.to_string();
        tokio::task::spawn_blocking(move || store.delete_blocking(&identifier)).await?
    }

    async fn list_all(&self) -> Result<Vec<Record>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.list_blocking()).await?
    }

    async fn clear(&self) -> Result<usize> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.clear_blocking()).await?
    }
}
