use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::models::TrackedItem;
use crate::Result;

/// Raw row of the item sheet. Header names match the sheet exactly.
#[derive(Debug, Deserialize)]
struct ItemRow {
    #[serde(rename = "ITEM NAME")]
    name: String,
    #[serde(rename = "ITEM LINK")]
    link: String,
    #[serde(rename = "WEBSITE")]
    website: String,
    #[serde(rename = "DESIRED PRICE")]
    desired_price: f64,
}

/// Loads the item sheet, skipping rows with a blank item name or a link
/// that is not a URL. A bad row must not take its siblings down with it.
///
/// The website column is lowercased here so the selector lookup downstream
/// can do an exact match.
pub fn load_items(path: &Path) -> Result<Vec<TrackedItem>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut items = Vec::new();

    for row in reader.deserialize() {
        let row: ItemRow = row?;
        if row.name.trim().is_empty() {
            debug!("Skipping sheet row with blank item name");
            continue;
        }

        if url::Url::parse(&row.link).is_err() {
            warn!(item = %row.name, link = %row.link, "Skipping sheet row with invalid link");
            continue;
        }

        items.push(TrackedItem {
            name: row.name,
            link: row.link,
            site: row.website.to_lowercase(),
            price_limit: row.desired_price,
        });
    }

    Ok(items)
}
