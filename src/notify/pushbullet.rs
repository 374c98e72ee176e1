use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::Notifier;
use crate::{AppError, Result};

const PUSHBULLET_API: &str = "https://api.pushbullet.com/v2/pushes";

/// Sends link pushes through the Pushbullet API.
pub struct PushbulletNotifier {
    client: Client,
    access_token: String,
    api_url: String,
}

impl PushbulletNotifier {
    pub fn new(access_token: String) -> Self {
        Self::with_api_url(access_token, PUSHBULLET_API.to_string())
    }

    /// Overridable endpoint, for tests.
    pub fn with_api_url(access_token: String, api_url: String) -> Self {
        Self {
            client: Client::new(),
            access_token,
            api_url,
        }
    }
}

#[async_trait]
impl Notifier for PushbulletNotifier {
    async fn push(&self, title: &str, link: &str, body: &str) -> Result<()> {
        let payload = json!({
            "type": "link",
            "title": title,
            "url": link,
            "body": body,
        });

        let response = self
            .client
            .post(&self.api_url)
            .header("Access-Token", &self.access_token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Notification(format!(
                "Pushbullet returned {}",
                response.status()
            )));
        }

        debug!(title, "Pushed notification");
        Ok(())
    }
}
