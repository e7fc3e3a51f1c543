//! The Core Bridge facade.
//!
//! One struct composing the signer, stager, proxy, and reconciler. Every
//! client is constructed at process start and passed in here; nothing is
//! built as an import-time side effect, so startup failures surface where
//! they happen and tests can inject fakes.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use uuid::Uuid;

use goftar_core::{
    CleanupReport, ConversationStore, Identity, QueryRequest, QueryResult, Result, StagedFile,
    SweepReport, TokenKind,
};

use goftar_auth::TokenSigner;
use goftar_store::ObjectStager;

use crate::proxy::{CoreProxy, QueryStream};
use crate::reconciler::Reconciler;

/// Entry point for the surrounding CRUD layer.
pub struct CoreBridge {
    signer: Arc<TokenSigner>,
    stager: ObjectStager,
    proxy: Arc<CoreProxy>,
    store: Arc<dyn ConversationStore>,
    reconciler: Reconciler,
}

impl CoreBridge {
    /// Wire the bridge from its already-constructed parts.
    pub fn new(
        signer: Arc<TokenSigner>,
        stager: ObjectStager,
        proxy: Arc<CoreProxy>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        let reconciler = Reconciler::new(store.clone(), proxy.clone(), signer.clone());
        Self {
            signer,
            stager,
            proxy,
            store,
            reconciler,
        }
    }

    /// Mint a short-lived access token for the identity.
    pub fn issue_token(&self, identity: &Identity) -> Result<String> {
        self.signer.mint(identity, TokenKind::Access)
    }

    /// Mint a refresh token for the identity.
    pub fn issue_refresh_token(&self, identity: &Identity) -> Result<String> {
        self.signer.mint(identity, TokenKind::Refresh)
    }

    /// Stage an upload for Core to consume.
    pub async fn stage_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        owner: Uuid,
        content_type: &str,
    ) -> Result<StagedFile> {
        self.stager.put(bytes, filename, owner, content_type).await
    }

    /// Presigned read URL for a staged object, using the configured TTL.
    pub async fn staged_url(&self, key: &str) -> Result<String> {
        let ttl = StdDuration::from_secs(self.stager.config().presign_ttl_secs);
        self.stager.url(key, ttl).await
    }

    /// Delete a staged object. Idempotent.
    pub async fn delete_staged(&self, key: &str) -> Result<bool> {
        self.stager.delete(key).await
    }

    /// Send a buffered query as the identity.
    ///
    /// When a local conversation id is supplied, the remote id Core
    /// assigns on the first round-trip is recorded against it, and the
    /// sync timestamp is refreshed.
    pub async fn query(
        &self,
        identity: &Identity,
        local_conversation: Option<Uuid>,
        request: &QueryRequest,
    ) -> Result<QueryResult> {
        let token = self.signer.mint(identity, TokenKind::Access)?;
        let result = self.proxy.send(request, &token).await?;

        if let Some(local_id) = local_conversation {
            if request.conversation_id.is_none() {
                self.store
                    .set_remote_id(local_id, &result.conversation_id)
                    .await?;
            }
            self.store.touch_synced(local_id, Utc::now()).await?;
        }

        Ok(result)
    }

    /// Open a streamed query as the identity.
    pub async fn query_stream(
        &self,
        identity: &Identity,
        request: &QueryRequest,
    ) -> Result<QueryStream> {
        let token = self.signer.mint(identity, TokenKind::Access)?;
        self.proxy.send_stream(request, &token).await
    }

    /// Run one conversation reconciliation sweep.
    pub async fn reconcile(&self, dry_run: bool) -> Result<SweepReport> {
        self.reconciler.sweep(dry_run).await
    }

    /// Run one staged-object cleanup sweep.
    pub async fn cleanup(&self, older_than: Duration, dry_run: bool) -> Result<CleanupReport> {
        self.stager.sweep_expired(older_than, dry_run).await
    }
}
