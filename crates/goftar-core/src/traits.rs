//! Trait seams for the Core Bridge.
//!
//! These traits decouple the reconciler from the concrete database and
//! HTTP client, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::ConversationRef;

/// Local persistence of conversation references.
///
/// Implemented by the database layer; the rows themselves are owned by the
/// surrounding CRUD system.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// All local refs that carry a remote conversation id.
    async fn list_remote_linked(&self) -> Result<Vec<ConversationRef>>;

    /// Remove a local ref. Returns false if it was already gone.
    async fn remove(&self, local_id: Uuid) -> Result<bool>;

    /// Record the remote id assigned by Core on the first round-trip.
    async fn set_remote_id(&self, local_id: Uuid, remote_id: &str) -> Result<()>;

    /// Record a successful sync check.
    async fn touch_synced(&self, local_id: Uuid, at: DateTime<Utc>) -> Result<()>;
}

/// Remote conversation operations on the Core service.
#[async_trait]
pub trait RemoteConversations: Send + Sync {
    /// Delete a conversation on the remote side, authenticating with the
    /// given bearer token. A conversation that is already gone is success:
    /// the goal state is "gone".
    async fn delete_conversation(&self, remote_id: &str, bearer: &str) -> Result<()>;
}
