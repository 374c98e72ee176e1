pub mod config;
pub mod fetcher;
pub mod history;
pub mod items;
pub mod models;
pub mod notify;
pub mod runner;
pub mod selectors;
pub mod tracker;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
