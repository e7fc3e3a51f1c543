//! Conversation reference repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use goftar_core::{ConversationRef, ConversationStore, Identity, Result, Tier};

/// Repository over `conversation` rows joined with their owning accounts.
#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn ref_from_row(row: &PgRow) -> Result<ConversationRef> {
        let plan: Option<String> = row.try_get("plan")?;
        Ok(ConversationRef {
            local_id: row.try_get("id")?,
            remote_id: row.try_get("remote_id")?,
            owner: Identity {
                subject_id: row.try_get("account_id")?,
                display_name: row.try_get("display_name")?,
                email: row.try_get("email")?,
                tier: plan.as_deref().map(Tier::from_plan_name),
                is_privileged: row.try_get("is_privileged")?,
            },
            last_synced_at: row.try_get("last_synced_at")?,
        })
    }
}

#[async_trait]
impl ConversationStore for ConversationRepository {
    async fn list_remote_linked(&self) -> Result<Vec<ConversationRef>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.remote_id, c.last_synced_at,
                   a.id AS account_id, a.display_name, a.email,
                   a.plan, a.is_privileged
            FROM conversation c
            JOIN account a ON a.id = c.account_id
            WHERE c.remote_id IS NOT NULL
            ORDER BY c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let refs = rows
            .iter()
            .map(Self::ref_from_row)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "db",
            component = "conversations",
            op = "list_remote_linked",
            count = refs.len(),
            "Listed remote-linked conversation refs"
        );
        Ok(refs)
    }

    async fn remove(&self, local_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM conversation WHERE id = $1")
            .bind(local_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_remote_id(&self, local_id: Uuid, remote_id: &str) -> Result<()> {
        sqlx::query("UPDATE conversation SET remote_id = $2 WHERE id = $1")
            .bind(local_id)
            .bind(remote_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch_synced(&self, local_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE conversation SET last_synced_at = $2 WHERE id = $1")
            .bind(local_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
