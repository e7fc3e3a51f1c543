//! # goftar-db
//!
//! PostgreSQL layer for the Goftar Core Bridge.
//!
//! The conversation rows themselves are owned by the surrounding CRUD
//! system; this crate only provides the pool plus the repository the
//! reconciler reads and prunes through.

pub mod conversations;
pub mod pool;

pub use conversations::ConversationRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

use goftar_core::Result;
use sqlx::postgres::PgPool;

/// Aggregated database handle.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
    pub conversations: ConversationRepository,
}

impl Database {
    /// Connect with default pool settings.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        let conversations = ConversationRepository::new(pool.clone());
        Self {
            pool,
            conversations,
        }
    }
}
