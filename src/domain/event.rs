use serde::{Deserialize, Serialize};

pub const DATE_NOT_FOUND: &str = "Date not found";
pub const SOURCE_NOT_FOUND: &str = "Source not found";
pub const DATA_NOT_FOUND: &str = "Data not found";
pub const IMAGE_NOT_FOUND: &str = "Image not found";
pub const LOCATION_NOT_FOUND: &str = "Location not found";

/// One reported event scraped from a region's timeline.
///
/// Every field is always populated: either the extracted content or the
/// matching sentinel string when the element was absent. A record is never
/// partially constructed; field extraction failures are isolated from each
/// other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub region: String,
    pub date: String,
    pub source_url: String,
    pub title: String,
    pub image_url: String,
    pub location: String,
}
