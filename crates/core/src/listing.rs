//! Paged directory listings
//!
//! Listings fetch one object more than requested to learn whether a next
//! page exists; the name of the last kept object becomes the next marker.
//! Directory markers keep their trailing separator, the form flat stores
//! sort them under.

use serde::Serialize;

use crate::error::Result;
use crate::object::StorageObject;
use crate::path::SEP;
use crate::traits::Container;

/// One page of a directory listing
#[derive(Debug, Clone, Serialize)]
pub struct ListingPage {
    /// Objects on this page
    pub objects: Vec<StorageObject>,

    /// Marker resuming the listing after this page, if more objects exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_marker: Option<String>,
}

impl ListingPage {
    /// Build a page from a listing fetched with `limit + 1` objects
    pub fn from_overfetch(mut objects: Vec<StorageObject>, limit: usize) -> Self {
        let next_marker = if objects.len() > limit {
            objects.truncate(limit);
            objects.last().map(marker_for)
        } else {
            None
        };
        Self {
            objects,
            next_marker,
        }
    }
}

fn marker_for(object: &StorageObject) -> String {
    if object.is_subdir() || object.is_placeholder {
        format!("{}{SEP}", object.name)
    } else {
        object.name.clone()
    }
}

/// List one page of `path` and normalise it for display
///
/// The marker is taken from the raw listing, so placeholder entries removed
/// by `filter_objects` never shift the page boundary.
pub async fn list_page(
    container: &dyn Container,
    path: &str,
    marker: Option<&str>,
    limit: usize,
) -> Result<ListingPage> {
    let objects = container
        .get_objects(path, marker, limit.saturating_add(1))
        .await?;
    let mut page = ListingPage::from_overfetch(objects, limit);
    page.objects = container.filter_objects(page.objects).await?;
    tracing::debug!(
        container = container.name(),
        path,
        count = page.objects.len(),
        more = page.next_marker.is_some(),
        "Listed directory page"
    );
    Ok(page)
}
