use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::debug;

use crate::config::FetcherConfig;
use crate::models::SelectorPair;
use crate::{AppError, Result};

/// Fetches a page and extracts a numeric price using a site's selector pair.
///
/// A missing price element is retried up to `max_attempts` times with a fixed
/// delay; transport errors and unparseable price text fail immediately.
pub struct PriceFetcher {
    client: Client,
    non_price_chars: Regex,
    max_attempts: u32,
    retry_delay: Duration,
}

impl PriceFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            non_price_chars: Regex::new(r"[^0-9.]").unwrap(),
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    pub async fn fetch(&self, url: &str, selectors: &SelectorPair) -> Result<f64> {
        let strategy =
            FixedInterval::new(self.retry_delay).take(self.max_attempts as usize - 1);

        RetryIf::spawn(
            strategy,
            || self.attempt(url, selectors),
            // Only "no price element yet" is worth another look at the page
            |err: &AppError| matches!(err, AppError::PriceNotFound { .. }),
        )
        .await
    }

    async fn attempt(&self, url: &str, selectors: &SelectorPair) -> Result<f64> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        match self.first_match(&body, selectors)? {
            Some(text) => {
                debug!(url, text, "Matched price element");
                self.parse_price(&text)
            }
            None => Err(AppError::PriceNotFound {
                url: url.to_string(),
            }),
        }
    }

    /// First non-empty text node of the first element matched by the primary
    /// selector, falling back to the sale selector. Elements whose text nodes
    /// are all empty do not count as a match.
    ///
    /// Only one text node is taken. Joining the descendants of sale markup
    /// like `was <s>£20</s> now £9.99` would splice two prices into a number
    /// that appears nowhere on the page.
    fn first_match(&self, body: &str, selectors: &SelectorPair) -> Result<Option<String>> {
        let document = Html::parse_document(body);

        for raw in [&selectors.primary, &selectors.sale] {
            let selector = Selector::parse(raw).map_err(|e| AppError::InvalidSelector {
                selector: raw.clone(),
                message: format!("{:?}", e),
            })?;

            for element in document.select(&selector) {
                if let Some(text) = element.text().map(str::trim).find(|t| !t.is_empty()) {
                    return Ok(Some(text.to_string()));
                }
            }
        }

        Ok(None)
    }

    /// Strips everything that is not a digit or `.` and parses the rest.
    /// Deliberately locale-naive.
    fn parse_price(&self, text: &str) -> Result<f64> {
        let cleaned = self.non_price_chars.replace_all(text, "");

        cleaned.parse::<f64>().map_err(|_| AppError::PriceParse {
            text: text.to_string(),
        })
    }
}
