//! Portable, text-safe form of a [`Record`].
//!
//! This is the only persisted shape. Every binary field is base64, and the
//! salt and iteration count are always embedded so old records stay
//! readable when defaults change:
//!
//! ```json
//! {
//!   "identifier": "report.pdf",
//!   "createdAt": "2026-01-01T00:00:00Z",
//!   "sizeBytes": 13,
//!   "ciphertext": "...",
//!   "nonce": "...",
//!   "salt": "...",
//!   "iterationCount": 600000,
//!   "integrityFingerprint": "...",
//!   "contentType": "application/pdf"
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{KdfParams, TAG_LEN};
use crate::encoding;
use crate::error::{Error, Result};
use crate::record::Record;

/// Structural, unvalidated record as it appears on disk or on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortableRecord {
    pub identifier: String,
    pub created_at: String,
    pub size_bytes: u64,
    pub ciphertext: String,
    pub nonce: String,
    pub salt: String,
    pub iteration_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl From<&Record> for PortableRecord {
    fn from(record: &Record) -> Self {
        Self {
            identifier: record.identifier.clone(),
            created_at: record
                .created_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            size_bytes: record.size_bytes,
            ciphertext: encoding::encode(&record.ciphertext),
            nonce: encoding::encode(&record.nonce),
            salt: encoding::encode(&record.salt),
            iteration_count: record.kdf.iterations(),
            integrity_fingerprint: record
                .integrity_fingerprint
                .as_ref()
                .map(|d| encoding::encode(d)),
            content_type: record.content_type.clone(),
        }
    }
}

impl TryFrom<PortableRecord> for Record {
    type Error = Error;

    /// Validates every field so malformed records never reach the cipher.
    fn try_from(p: PortableRecord) -> Result<Self> {
        if p.identifier.is_empty() {
            return Err(Error::MalformedRecord("identifier is empty".to_string()));
        }

        let created_at = DateTime::parse_from_rfc3339(&p.created_at)
            .map_err(|e| Error::MalformedRecord(format!("createdAt: {e}")))?
            .with_timezone(&Utc);

        let ciphertext = encoding::decode(&p.ciphertext)?;
        if ciphertext.len() < TAG_LEN {
            return Err(Error::MalformedRecord(format!(
                "ciphertext shorter than the {TAG_LEN}-byte tag"
            )));
        }

        let nonce = encoding::decode_array(&p.nonce, "nonce")?;
        let salt = encoding::decode_array(&p.salt, "salt")?;
        let kdf = KdfParams::new(p.iteration_count)
            .map_err(|_| Error::MalformedRecord("iterationCount must be >= 1".to_string()))?;
        let integrity_fingerprint = p
            .integrity_fingerprint
            .as_deref()
            .map(|text| encoding::decode_array(text, "integrityFingerprint"))
            .transpose()?;

        Ok(Record {
            identifier: p.identifier,
            created_at,
            size_bytes: p.size_bytes,
            ciphertext,
            nonce,
            salt,
            kdf,
            integrity_fingerprint,
            content_type: p.content_type,
        })
    }
}

/// Serializes a record to pretty-printed portable JSON.
pub fn to_json(record: &Record) -> Result<String> {
    Ok(serde_json::to_string_pretty(&PortableRecord::from(record))?)
}

/// Parses and validates portable JSON.
///
/// # Errors
///
/// Returns an error if:
/// - The JSON does not have the portable shape
/// - Any base64 field is invalid or has the wrong length
/// - The iteration count is zero or the timestamp is not ISO-8601
pub fn from_json(text: &str) -> Result<Record> {
    let portable: PortableRecord = serde_json::from_str(text)?;
    Record::try_from(portable)
}
