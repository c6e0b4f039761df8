use std::collections::HashMap;

use async_trait::async_trait;

use crate::aggregation::TimeWindow;
use crate::error::{ProvisionError, StoreError};
use crate::models::{AuthUser, NewSale, SaleRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub window: Option<TimeWindow>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn within(window: TimeWindow) -> Self {
        Self {
            window: Some(window),
            limit: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Relational storage for sale records. Implementations return records
/// newest first and assign `id` and `created_at` on insert.
#[async_trait]
pub trait SalesStore: Send + Sync {
    async fn fetch_records(&self, filter: &RecordFilter) -> Result<Vec<SaleRecord>, StoreError>;

    async fn insert_record(&self, sale: NewSale) -> Result<SaleRecord, StoreError>;

    async fn delete_window(&self, window: &TimeWindow) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Owner id to email. Ids without a profile are simply absent.
    async fn resolve_display_names(&self, owner_ids: &[String]) -> Result<HashMap<String, String>, StoreError>;

    async fn record_profile(&self, owner_id: &str, email: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// `Ok(None)` when the provider does not accept the access token.
    async fn authenticate(&self, access_token: &str) -> Result<Option<AuthUser>, StoreError>;

    /// Creates a confirmed account and returns its user id.
    async fn create_user(&self, email: &str, password: &str) -> Result<String, ProvisionError>;
}
