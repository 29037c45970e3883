//! Row-set selection
//!
//! The rows of a resolved sheet are animal tags, either every member of one
//! herd or every active animal. Selection runs fresh on each resolution.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::store::RanchStore;

/// Herd filter value that selects every active animal
pub const ALL_ACTIVE: &str = "All active";

/// Statuses counted as active. Animals with no status are active too.
pub const ACTIVE_STATUSES: [&str; 4] = ["Current", "Target Sale", "Undefined", "CULL LIST, Current"];

pub struct RowSetSelector {
    store: Arc<dyn RanchStore>,
}

impl RowSetSelector {
    pub fn new(store: Arc<dyn RanchStore>) -> Self {
        Self { store }
    }

    /// Ordered, de-duplicated row keys in scope
    pub async fn row_keys(&self, herd: Option<&str>) -> Result<Vec<String>> {
        let mut keys = match herd.map(str::trim) {
            Some(herd) if !herd.is_empty() && herd != ALL_ACTIVE => {
                self.store.herd_members(herd).await?
            }
            _ => self.store.animals_with_status(&ACTIVE_STATUSES).await?,
        };
        keys.retain(|k| !k.is_empty());
        keys.sort();
        keys.dedup();
        debug!("Selected {} rows for herd {:?}", keys.len(), herd);
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CowRecord, InMemoryRanchStore};

    fn cow(tag: &str, herd: Option<&str>, status: Option<&str>) -> CowRecord {
        let mut cow = CowRecord::new(tag);
        cow.current_herd = herd.map(str::to_string);
        cow.status = status.map(str::to_string);
        cow
    }

    fn selector() -> RowSetSelector {
        let store = InMemoryRanchStore::new()
            .with_cow(cow("30", Some("North"), Some("Sold")))
            .with_cow(cow("101", Some("North"), Some("Current")))
            .with_cow(cow("102", Some("South"), None))
            .with_cow(cow("103", None, Some("Sold")))
            .with_cow(cow("104", None, Some("CULL LIST, Current")))
            .with_cow(cow("", Some("North"), None));
        RowSetSelector::new(Arc::new(store))
    }

    #[tokio::test]
    async fn active_includes_null_status_and_excludes_sold() {
        let selector = selector();
        let expected = vec!["101", "102", "104"];
        assert_eq!(selector.row_keys(None).await.unwrap(), expected);
        assert_eq!(selector.row_keys(Some(ALL_ACTIVE)).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn herd_filter_ignores_status() {
        let keys = selector().row_keys(Some("North")).await.unwrap();
        assert_eq!(keys, vec!["101", "30"]);
    }

    #[tokio::test]
    async fn unknown_herd_is_empty() {
        assert!(selector().row_keys(Some("West")).await.unwrap().is_empty());
    }
}
