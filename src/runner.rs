use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::fetcher::PriceFetcher;
use crate::history::HistoryStore;
use crate::items;
use crate::notify::Notifier;
use crate::selectors::SelectorStore;
use crate::tracker::ItemTracker;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub items_total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Drives one full pass over the item sheet: build all trackers, then run
/// every tracker's tick. Per-item failures are logged and never abort
/// sibling items.
pub struct Runner {
    config: AppConfig,
    notifier: Arc<dyn Notifier>,
}

impl Runner {
    pub fn new(config: AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let start = Instant::now();

        let items = items::load_items(Path::new(&self.config.store.items_file))?;
        let items_total = items.len();
        info!(items = items_total, "Loaded item sheet");

        let selector_store = SelectorStore::open(&self.config.store.selector_db).await?;
        let history = HistoryStore::open(&self.config.store.history_file).await?;
        let fetcher = Arc::new(PriceFetcher::new(&self.config.fetcher)?);
        let concurrency = self.config.runner.concurrency;

        // Phase 1: construct every tracker. This completes fully before any
        // tick runs, so all selector lookups and history records are settled
        // up front.
        let selector_store = &selector_store;
        let constructed: Vec<(String, Result<ItemTracker>)> = stream::iter(items)
            .map(|item| {
                let fetcher = Arc::clone(&fetcher);
                let notifier = Arc::clone(&self.notifier);
                let history = history.clone();
                async move {
                    let name = item.name.clone();
                    let tracker =
                        ItemTracker::new(item, selector_store, fetcher, notifier, history).await;
                    (name, tracker)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        info!(
            "Instances created in {:.2}s",
            start.elapsed().as_secs_f64()
        );

        let mut failed = 0;
        let mut trackers = Vec::new();
        for (name, result) in constructed {
            match result {
                Ok(tracker) => trackers.push(tracker),
                Err(e) => {
                    error!(item = %name, error = %e, "Failed to set up item");
                    failed += 1;
                }
            }
        }

        // Phase 2: one tick per tracker.
        let outcomes: Vec<bool> = stream::iter(trackers)
            .map(|tracker| async move {
                let name = tracker.name().to_string();
                match tracker.run_tick().await {
                    Ok(price) => {
                        info!(item = %name, price, "Task complete");
                        true
                    }
                    Err(e) => {
                        error!(item = %name, error = %e, "Task failed");
                        false
                    }
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let succeeded = outcomes.iter().filter(|ok| **ok).count();
        failed += outcomes.len() - succeeded;

        info!(
            succeeded,
            failed,
            "End: {:.2} seconds",
            start.elapsed().as_secs_f64()
        );

        Ok(RunReport {
            items_total,
            succeeded,
            failed,
        })
    }
}
