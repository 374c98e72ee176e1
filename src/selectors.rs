use sqlx::SqlitePool;
use tracing::debug;

use crate::models::SelectorPair;
use crate::{AppError, Result};

/// Read-only lookup of per-site price selectors.
///
/// Sites are keyed by their lowercased identifier; callers normalize case
/// before calling [`SelectorStore::lookup`].
pub struct SelectorStore {
    pool: SqlitePool,
}

impl SelectorStore {
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn lookup(&self, site: &str) -> Result<SelectorPair> {
        let pair = sqlx::query_as::<_, SelectorPair>(
            "SELECT selector, selector_sale FROM selectors WHERE site = ?",
        )
        .bind(site)
        .fetch_optional(&self.pool)
        .await?;

        match pair {
            Some(pair) => {
                debug!(site, "Resolved selector pair");
                Ok(pair)
            }
            None => Err(AppError::SelectorNotFound {
                site: site.to_string(),
            }),
        }
    }
}
