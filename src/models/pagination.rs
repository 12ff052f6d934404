use serde::{Deserialize, Serialize};

use super::content::Content;

/// One page of a content listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination<T = Content> {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Pagination<T> {
    pub fn has_next_page(&self) -> bool {
        self.current_page < self.last_page
    }
}
