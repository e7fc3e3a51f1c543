//! Conversation reconciliation against the remote store.
//!
//! Local conversation refs that point at a remote conversation are swept:
//! the reconciler authenticates as each ref's owner, deletes the remote
//! conversation, and on confirmed success removes the local row. A local
//! ref whose remote counterpart survives would be an orphan factory, so
//! the remote delete always comes first.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use goftar_core::{
    ConversationStore, RemoteConversations, Result, SweepReport, TokenKind,
};

use goftar_auth::TokenSigner;

/// Sweeps local conversation references against the Core store.
pub struct Reconciler {
    store: Arc<dyn ConversationStore>,
    remote: Arc<dyn RemoteConversations>,
    signer: Arc<TokenSigner>,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        remote: Arc<dyn RemoteConversations>,
        signer: Arc<TokenSigner>,
    ) -> Self {
        Self {
            store,
            remote,
            signer,
        }
    }

    /// Run one reconciliation sweep.
    ///
    /// Per-record failures are logged and counted but never abort the
    /// sweep. Idempotent: a second run over unchanged data removes nothing,
    /// and dry-run reports candidates without touching either side.
    pub async fn sweep(&self, dry_run: bool) -> Result<SweepReport> {
        let start = Instant::now();
        let refs = self.store.list_remote_linked().await?;

        let mut report = SweepReport::default();

        for conv in refs {
            let Some(remote_id) = conv.remote_id.as_deref() else {
                continue;
            };
            report.checked += 1;

            if dry_run {
                report.removed += 1;
                continue;
            }

            let token = match self.signer.mint(&conv.owner, TokenKind::Access) {
                Ok(token) => token,
                Err(e) => {
                    warn!(
                        subsystem = "bridge",
                        component = "reconciler",
                        conversation_id = %remote_id,
                        owner_id = %conv.owner.subject_id,
                        error = %e,
                        "Could not mint maintenance token; skipping record"
                    );
                    report.errors += 1;
                    continue;
                }
            };

            if let Err(e) = self.remote.delete_conversation(remote_id, &token).await {
                warn!(
                    subsystem = "bridge",
                    component = "reconciler",
                    conversation_id = %remote_id,
                    error = %e,
                    "Remote delete failed; skipping record"
                );
                report.errors += 1;
                continue;
            }

            match self.store.remove(conv.local_id).await {
                Ok(_) => report.removed += 1,
                Err(e) => {
                    warn!(
                        subsystem = "bridge",
                        component = "reconciler",
                        conversation_id = %remote_id,
                        error = %e,
                        "Local removal failed after remote delete"
                    );
                    report.errors += 1;
                }
            }
        }

        info!(
            subsystem = "bridge",
            component = "reconciler",
            op = "sweep",
            dry_run = dry_run,
            checked = report.checked,
            removed = report.removed,
            errors = report.errors,
            duration_ms = start.elapsed().as_millis() as u64,
            "Reconciliation sweep finished"
        );
        Ok(report)
    }
}
