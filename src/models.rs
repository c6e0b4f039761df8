use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stored in place of an empty product type.
pub const UNCATEGORIZED: &str = "-----";

// One recorded cash sale, as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub amount: Decimal,
    pub owner_id: String,
    pub category: String,
}

// A sale that passed admission checks but has no id or timestamp yet.
// The store assigns both on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub amount: Decimal,
    pub owner_id: String,
    pub category: String,
}

impl NewSale {
    pub fn new(amount: Decimal, owner_id: String, category: String) -> Self {
        Self {
            amount,
            owner_id,
            category,
        }
    }
}

/// User identity as reported by the hosted auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

/// A sale annotated for presentation: owner email and local timestamp label.
#[derive(Debug, Clone, Serialize)]
pub struct SaleView {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub created_at_label: String,
    pub amount: Decimal,
    pub category: String,
    pub owner_id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardTotals {
    pub today_total: Decimal,
    pub month_total: Decimal,
    pub today_label: String,
    pub month_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub keys: Vec<String>,
    pub labels: Vec<String>,
    pub totals: Vec<Decimal>,
    pub rounded: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesFilter {
    #[default]
    Today,
    Month,
}
