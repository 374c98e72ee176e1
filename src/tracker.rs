use chrono::Local;
use std::sync::Arc;
use tracing::info;

use crate::fetcher::PriceFetcher;
use crate::history::HistoryStore;
use crate::models::{history_timestamp, SelectorPair, TrackedItem};
use crate::notify::Notifier;
use crate::selectors::SelectorStore;
use crate::Result;

/// One tracked item wired to its collaborators: fetcher, notifier, history.
pub struct ItemTracker {
    item: TrackedItem,
    selectors: SelectorPair,
    fetcher: Arc<PriceFetcher>,
    notifier: Arc<dyn Notifier>,
    history: HistoryStore,
}

impl ItemTracker {
    /// Resolves the item's selector pair and makes sure a history record
    /// exists. No network traffic happens here, so a missing selector row
    /// fails the item before any page is requested.
    pub async fn new(
        item: TrackedItem,
        selector_store: &SelectorStore,
        fetcher: Arc<PriceFetcher>,
        notifier: Arc<dyn Notifier>,
        history: HistoryStore,
    ) -> Result<Self> {
        let selectors = selector_store.lookup(&item.site).await?;
        history.ensure_item(&item.name, &item.link).await?;

        Ok(Self {
            item,
            selectors,
            fetcher,
            notifier,
            history,
        })
    }

    pub fn name(&self) -> &str {
        &self.item.name
    }

    /// One tick: fetch the price once, run the threshold check, then append
    /// the observation to history.
    pub async fn run_tick(&self) -> Result<f64> {
        let price = self.fetcher.fetch(&self.item.link, &self.selectors).await?;
        self.check_price(price).await?;
        self.record_history(price, history_timestamp(Local::now()))
            .await?;
        Ok(price)
    }

    /// Pushes a notification when the price has reached the ceiling and the
    /// item is still armed, then disarms it. Disarmed items never notify
    /// again, across runs.
    pub async fn check_price(&self, price: f64) -> Result<()> {
        if price <= self.item.price_limit && self.history.is_armed(&self.item.name).await? {
            let body = format!("Item on sale at £{}", price);
            self.notifier
                .push(&self.item.name, &self.item.link, &body)
                .await?;
            // Disarm only after the push went out, so a failed push can
            // alert again on the next run
            self.history.disarm(&self.item.name).await?;
            info!(item = %self.item.name, price, "Price alert sent");
        }
        Ok(())
    }

    pub async fn record_history(&self, price: f64, timestamp: String) -> Result<()> {
        self.history
            .append_observation(&self.item.name, timestamp, price)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetcherConfig;
    use crate::notify::MemoryNotifier;
    use crate::AppError;
    use tempfile::tempdir;

    async fn seeded_selector_store() -> SelectorStore {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE selectors (
                site TEXT PRIMARY KEY,
                selector TEXT NOT NULL,
                selector_sale TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO selectors VALUES ('shop.example', 'span.price', 'span.sale')")
            .execute(&pool)
            .await
            .unwrap();
        SelectorStore::from_pool(pool)
    }

    fn test_fetcher() -> Arc<PriceFetcher> {
        Arc::new(
            PriceFetcher::new(&FetcherConfig {
                max_attempts: 1,
                retry_delay_ms: 10,
                request_timeout: 5,
                user_agent: "PricewatchTest/0.1".to_string(),
            })
            .unwrap(),
        )
    }

    fn widget(price_limit: f64) -> TrackedItem {
        TrackedItem {
            name: "Widget".to_string(),
            link: "https://shop.example/widget".to_string(),
            site: "shop.example".to_string(),
            price_limit,
        }
    }

    async fn build_tracker(
        item: TrackedItem,
        notifier: Arc<MemoryNotifier>,
        history: HistoryStore,
    ) -> ItemTracker {
        let selector_store = seeded_selector_store().await;
        ItemTracker::new(item, &selector_store, test_fetcher(), notifier, history)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_price_at_or_below_ceiling_notifies_and_disarms() {
        let dir = tempdir().unwrap();
        let history = HistoryStore::open(dir.path().join("data.json")).await.unwrap();
        let notifier = Arc::new(MemoryNotifier::new());
        let tracker = build_tracker(widget(10.00), notifier.clone(), history.clone()).await;

        tracker.check_price(9.99).await.unwrap();

        let pushes = notifier.recorded().await;
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].title, "Widget");
        assert_eq!(pushes[0].link, "https://shop.example/widget");
        assert!(pushes[0].body.contains("9.99"));
        assert!(!history.is_armed("Widget").await.unwrap());
    }

    #[tokio::test]
    async fn test_price_above_ceiling_stays_armed() {
        let dir = tempdir().unwrap();
        let history = HistoryStore::open(dir.path().join("data.json")).await.unwrap();
        let notifier = Arc::new(MemoryNotifier::new());
        let tracker = build_tracker(widget(10.00), notifier.clone(), history.clone()).await;

        tracker.check_price(15.00).await.unwrap();

        assert!(notifier.recorded().await.is_empty());
        assert!(history.is_armed("Widget").await.unwrap());
    }

    #[tokio::test]
    async fn test_notification_fires_once() {
        let dir = tempdir().unwrap();
        let history = HistoryStore::open(dir.path().join("data.json")).await.unwrap();
        let notifier = Arc::new(MemoryNotifier::new());
        let tracker = build_tracker(widget(10.00), notifier.clone(), history.clone()).await;

        tracker.check_price(9.99).await.unwrap();
        tracker.check_price(5.00).await.unwrap();
        tracker.check_price(0.01).await.unwrap();

        assert_eq!(notifier.recorded().await.len(), 1);
    }

    #[tokio::test]
    async fn test_disarmed_state_holds_across_tracker_instances() {
        let dir = tempdir().unwrap();
        let history = HistoryStore::open(dir.path().join("data.json")).await.unwrap();
        let notifier = Arc::new(MemoryNotifier::new());

        let tracker = build_tracker(widget(10.00), notifier.clone(), history.clone()).await;
        tracker.check_price(9.99).await.unwrap();
        drop(tracker);

        // Same item, fresh tracker, as happens on the next run
        let tracker = build_tracker(widget(10.00), notifier.clone(), history.clone()).await;
        tracker.check_price(1.00).await.unwrap();

        assert_eq!(notifier.recorded().await.len(), 1);
    }

    #[tokio::test]
    async fn test_record_history_appends() {
        let dir = tempdir().unwrap();
        let history = HistoryStore::open(dir.path().join("data.json")).await.unwrap();
        let notifier = Arc::new(MemoryNotifier::new());
        let tracker = build_tracker(widget(10.00), notifier, history.clone()).await;

        tracker
            .record_history(12.50, "2024-03-01-09-30".to_string())
            .await
            .unwrap();
        tracker
            .record_history(11.00, "2024-03-01-10-30".to_string())
            .await
            .unwrap();

        let snapshot = history.snapshot().await;
        assert_eq!(
            snapshot["Widget"].price,
            vec![
                ("2024-03-01-09-30".to_string(), 12.50),
                ("2024-03-01-10-30".to_string(), 11.00),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_site_fails_construction() {
        let dir = tempdir().unwrap();
        let history = HistoryStore::open(dir.path().join("data.json")).await.unwrap();
        let notifier = Arc::new(MemoryNotifier::new());
        let selector_store = seeded_selector_store().await;

        let mut item = widget(10.00);
        item.site = "unknownshop.com".to_string();

        let result =
            ItemTracker::new(item, &selector_store, test_fetcher(), notifier, history).await;
        assert!(matches!(
            result,
            Err(AppError::SelectorNotFound { ref site }) if site == "unknownshop.com"
        ));
    }
}
