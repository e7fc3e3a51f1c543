//! Expiry sweep over the staging namespace.
//!
//! Ages are computed from the store's last-modified timestamps, not from
//! `StagedFile` records: the record may not have been persisted, but the
//! store always knows when an object was written.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use goftar_core::{CleanupReport, Error, Result};

use crate::stager::ObjectStager;

/// A listed staging object, reduced to what the sweep decision needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size_bytes: i64,
    pub last_modified: DateTime<Utc>,
}

/// Split listed objects into (expired, kept) relative to a cutoff.
///
/// Pure so the sweep decision is testable without a store. Strictly older
/// than the cutoff is expired; an object written exactly at the cutoff is
/// kept.
pub fn partition_expired(
    objects: Vec<ObjectSummary>,
    cutoff: DateTime<Utc>,
) -> (Vec<ObjectSummary>, Vec<ObjectSummary>) {
    objects.into_iter().partition(|o| o.last_modified < cutoff)
}

/// Explicit confirmation for the destructive purge path.
///
/// Exists so `purge_all` cannot be reached by passing a default-valued
/// flag: the caller must spell out the intent at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeConfirmation {
    DeleteEverything,
}

impl ObjectStager {
    /// List every object under the staging prefix, following continuation
    /// tokens.
    pub async fn list_staged(&self) -> Result<Vec<ObjectSummary>> {
        let mut out = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut req = self
                .client()
                .list_objects_v2()
                .bucket(&self.config().bucket)
                .prefix(&self.config().prefix);
            if let Some(token) = continuation.take() {
                req = req.continuation_token(token);
            }

            let page = req
                .send()
                .await
                .map_err(|e| Error::StoreUnavailable(format!("list failed: {}", e)))?;

            for obj in page.contents() {
                let (Some(key), Some(modified)) = (obj.key(), obj.last_modified()) else {
                    continue;
                };
                let last_modified = DateTime::from_timestamp(
                    modified.secs(),
                    modified.subsec_nanos(),
                )
                .unwrap_or_else(Utc::now);
                out.push(ObjectSummary {
                    key: key.to_string(),
                    size_bytes: obj.size().unwrap_or(0),
                    last_modified,
                });
            }

            match page.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(out)
    }

    /// Delete every staged object older than `older_than`.
    ///
    /// Dry-run reports what would be deleted without touching the store.
    /// Per-object delete failures are counted in `errors` and skipped; one
    /// bad object must not block the rest of the sweep.
    pub async fn sweep_expired(
        &self,
        older_than: Duration,
        dry_run: bool,
    ) -> Result<CleanupReport> {
        let cutoff = Utc::now() - older_than;
        let objects = self.list_staged().await?;
        let (expired, kept) = partition_expired(objects, cutoff);

        let mut report = CleanupReport {
            kept_count: kept.len(),
            ..Default::default()
        };

        for obj in expired {
            if !dry_run {
                if let Err(e) = self
                    .client()
                    .delete_object()
                    .bucket(&self.config().bucket)
                    .key(&obj.key)
                    .send()
                    .await
                {
                    warn!(
                        subsystem = "store",
                        component = "cleanup",
                        object_key = %obj.key,
                        error = %e,
                        "Failed to delete expired object; skipping"
                    );
                    report.errors += 1;
                    continue;
                }
            }
            report.deleted_count += 1;
            report.freed_bytes += obj.size_bytes;
        }

        info!(
            subsystem = "store",
            component = "cleanup",
            op = "sweep_expired",
            dry_run = dry_run,
            deleted = report.deleted_count,
            kept = report.kept_count,
            errors = report.errors,
            freed_bytes = report.freed_bytes,
            "Staging cleanup sweep finished"
        );

        Ok(report)
    }

    /// Delete everything under the staging prefix regardless of age.
    ///
    /// Test/staging environments only. The confirmation argument keeps this
    /// distinguishable from the default-safe sweep at every call site.
    pub async fn purge_all(&self, _confirm: PurgeConfirmation) -> Result<CleanupReport> {
        warn!(
            subsystem = "store",
            component = "cleanup",
            op = "purge_all",
            bucket = %self.config().bucket,
            "Purging entire staging namespace"
        );
        // A zero-width cutoff in the future expires every listed object.
        self.sweep_expired(Duration::seconds(-1), false).await
    }
}
