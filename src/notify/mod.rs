use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::Result;

pub mod pushbullet;

pub use pushbullet::PushbulletNotifier;

/// One-way push capability. Fire-and-forget; callers do not consume any
/// delivery confirmation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn push(&self, title: &str, link: &str, body: &str) -> Result<()>;
}

/// Prints the notification instead of sending it. Used for dry runs.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn push(&self, title: &str, link: &str, body: &str) -> Result<()> {
        info!(title, link, body, "Notification (dry run)");
        Ok(())
    }
}

/// A push that went through a [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct PushedNote {
    pub title: String,
    pub link: String,
    pub body: String,
}

/// Collects pushes in memory instead of sending them, for callers that
/// want to inspect what would have gone out. The test suites use it to
/// assert on notification behaviour.
#[derive(Default)]
pub struct MemoryNotifier {
    pushes: Mutex<Vec<PushedNote>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded(&self) -> Vec<PushedNote> {
        self.pushes.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn push(&self, title: &str, link: &str, body: &str) -> Result<()> {
        self.pushes.lock().await.push(PushedNote {
            title: title.to_string(),
            link: link.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
