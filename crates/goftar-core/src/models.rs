//! Shared data model for the Goftar Core Bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;
use crate::error::{Error, Result};

/// Subscription tier carried as a token claim and used by the Core service
/// for rate and feature gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl Tier {
    /// The remote tier vocabulary string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Basic => "basic",
            Tier::Premium => "premium",
            Tier::Enterprise => "enterprise",
        }
    }

    /// Parse an internal plan name into the remote tier vocabulary.
    /// Unknown plan names map to `Free` rather than failing, so a token can
    /// always be minted.
    pub fn from_plan_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "basic" => Tier::Basic,
            "premium" => Tier::Premium,
            "enterprise" => Tier::Enterprise,
            _ => Tier::Free,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local account identity, owned by the surrounding account system.
///
/// The bridge only reads it to mint tokens; it is immutable for the
/// duration of one bridge operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Stable local account id. Never a mutable display value.
    pub subject_id: Uuid,
    /// Optional display username.
    pub display_name: Option<String>,
    /// Account email.
    pub email: String,
    /// Resolved subscription tier, if the account has one.
    pub tier: Option<Tier>,
    /// Superuser-like privilege flag.
    pub is_privileged: bool,
}

/// Token kind claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// The full claim set the Core service requires. Always total: no claim is
/// ever left unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Stable local account id.
    pub sub: Uuid,
    /// Display username; synthesized if the identity carries none.
    pub username: String,
    /// Account email.
    pub email: String,
    /// Remote tier vocabulary value.
    pub tier: Tier,
    /// Access or refresh.
    pub kind: TokenKind,
    /// Issued-at, seconds since epoch.
    pub issued_at: i64,
    /// Expiry, seconds since epoch.
    pub expires_at: i64,
}

/// A temporarily retained upload, referenced by key rather than content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedFile {
    /// Opaque object key, namespaced by uploader + timestamp + random id.
    pub key: String,
    /// Filename as supplied by the uploader.
    pub original_filename: String,
    /// Object size in bytes.
    pub size_bytes: i64,
    /// MIME type supplied at upload.
    pub content_type: String,
    /// Upload time.
    pub created_at: DateTime<Utc>,
    /// Always `created_at + retention`; never extended in place.
    pub expires_at: DateTime<Utc>,
}

/// Local record of a conversation, possibly linked to a remote one.
#[derive(Debug, Clone)]
pub struct ConversationRef {
    /// Local conversation id, owned by the surrounding system.
    pub local_id: Uuid,
    /// Remote conversation id, assigned by Core on the first round-trip.
    /// Opaque to the bridge.
    pub remote_id: Option<String>,
    /// The owning account, needed to mint a maintenance token.
    pub owner: Identity,
    /// Last time this ref was confirmed against the remote store.
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// File reference shape the Core service receives. Core fetches the bytes
/// itself from the shared object store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAttachment {
    pub filename: String,
    pub object_key: String,
    pub content_type: String,
    pub size_bytes: i64,
}

impl From<&StagedFile> for FileAttachment {
    fn from(f: &StagedFile) -> Self {
        Self {
            filename: f.original_filename.clone(),
            object_key: f.key.clone(),
            content_type: f.content_type.clone(),
            size_bytes: f.size_bytes,
        }
    }
}

/// A user query bound for the Core service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Query text.
    pub text: String,
    /// ISO language code, e.g. "fa".
    pub language: String,
    /// Remote conversation id to continue, if any.
    pub conversation_id: Option<String>,
    /// Attached staged files, by reference.
    #[serde(default)]
    pub attachments: Vec<FileAttachment>,
    /// Whether the caller wants an incrementally streamed answer.
    #[serde(default)]
    pub stream: bool,
}

impl QueryRequest {
    /// Validate caller input. Runs before any network call; a failure here
    /// has no side effects.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::Validation("query text is empty".to_string()));
        }
        if self.attachments.len() > defaults::MAX_QUERY_FILES {
            return Err(Error::Validation(format!(
                "too many attachments: {} (max {})",
                self.attachments.len(),
                defaults::MAX_QUERY_FILES
            )));
        }
        for att in &self.attachments {
            if att.size_bytes > defaults::MAX_FILE_BYTES {
                return Err(Error::Validation(format!(
                    "attachment '{}' exceeds {} bytes",
                    att.filename,
                    defaults::MAX_FILE_BYTES
                )));
            }
        }
        Ok(())
    }
}

/// Buffered answer from the Core service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
    pub conversation_id: String,
    pub message_id: String,
    #[serde(default)]
    pub tokens_used: i64,
    #[serde(default)]
    pub processing_time_ms: i64,
    #[serde(default)]
    pub cached: bool,
}

/// One element of a streamed answer.
///
/// `Start` precedes the first delta so callers can distinguish "connected"
/// from "no data yet"; `End` marks clean upstream termination. A dropped
/// upstream surfaces as an `Err(StreamInterrupted)` item after the chunks
/// already delivered, never as a silent end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryChunk {
    Start,
    Delta(String),
    End,
}

/// Outcome of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Local refs with a remote id that were examined.
    pub checked: usize,
    /// Refs removed (or, in dry-run, that would be removed).
    pub removed: usize,
    /// Per-record failures; these never abort the sweep.
    pub errors: usize,
}

/// Outcome of one staged-object cleanup sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Objects deleted (or, in dry-run, that would be deleted).
    pub deleted_count: usize,
    /// Total bytes reclaimed.
    pub freed_bytes: i64,
    /// Objects younger than the cutoff that were left in place.
    pub kept_count: usize,
    /// Expired objects whose delete failed; these never abort the sweep.
    pub errors: usize,
}
