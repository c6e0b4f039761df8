use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio_postgres::{types::ToSql, Client, NoTls, Row};
use tracing::{debug, error};

use crate::aggregation::TimeWindow;
use crate::error::StoreError;
use crate::models::{NewSale, SaleRecord};
use crate::store::{IdentityLookup, RecordFilter, SalesStore};
use crate::validators::normalize_category;

const SALE_COLUMNS: &str = "id, created_at, amount, user_id, product_type";

pub struct Database {
    client: Client,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Database connection error: {}", e);
            }
        });

        let db = Database { client };
        db.init_tables().await?;
        Ok(db)
    }

    async fn init_tables(&self) -> Result<()> {
        self.client.execute(
            "CREATE TABLE IF NOT EXISTS sales (
                id BIGSERIAL PRIMARY KEY,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                amount NUMERIC(14, 2) NOT NULL CHECK (amount >= 0),
                user_id TEXT NOT NULL,
                product_type TEXT
            )",
            &[],
        ).await?;

        self.client.execute(
            "CREATE INDEX IF NOT EXISTS sales_created_at_idx ON sales (created_at DESC)",
            &[],
        ).await?;

        self.client.execute(
            "CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL
            )",
            &[],
        ).await?;

        Ok(())
    }

    pub async fn test_connection(&self) -> Result<()> {
        self.client.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    pub async fn get_sales_count(&self) -> Result<i64> {
        let row = self.client.query_one("SELECT COUNT(*) FROM sales", &[]).await?;
        Ok(row.get(0))
    }
}

fn sale_from_row(row: &Row) -> SaleRecord {
    let category: Option<String> = row.get(4);
    SaleRecord {
        id: row.get(0),
        created_at: row.get(1),
        amount: row.get(2),
        owner_id: row.get(3),
        category: normalize_category(category.as_deref()),
    }
}

#[async_trait]
impl SalesStore for Database {
    async fn fetch_records(&self, filter: &RecordFilter) -> Result<Vec<SaleRecord>, StoreError> {
        let limit = filter.limit.map(|limit| limit as i64);
        let mut query = format!("SELECT {} FROM sales", SALE_COLUMNS);
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(window) = &filter.window {
            query.push_str(" WHERE created_at >= $1 AND created_at < $2");
            params.push(&window.from);
            params.push(&window.to);
        }

        query.push_str(" ORDER BY created_at DESC, id DESC");

        if let Some(limit) = &limit {
            query.push_str(&format!(" LIMIT ${}", params.len() + 1));
            params.push(limit);
        }

        let rows = self.client.query(&query, &params).await?;
        debug!("Fetched {} sales", rows.len());
        Ok(rows.iter().map(sale_from_row).collect())
    }

    async fn insert_record(&self, sale: NewSale) -> Result<SaleRecord, StoreError> {
        let row = self.client.query_one(
            &format!(
                "INSERT INTO sales (amount, user_id, product_type)
                 VALUES ($1, $2, $3)
                 RETURNING {}",
                SALE_COLUMNS
            ),
            &[&sale.amount, &sale.owner_id, &sale.category],
        ).await?;

        Ok(sale_from_row(&row))
    }

    async fn delete_window(&self, window: &TimeWindow) -> Result<u64, StoreError> {
        let deleted = self.client.execute(
            "DELETE FROM sales WHERE created_at >= $1 AND created_at < $2",
            &[&window.from, &window.to],
        ).await?;

        Ok(deleted)
    }
}

#[async_trait]
impl IdentityLookup for Database {
    async fn resolve_display_names(&self, owner_ids: &[String]) -> Result<HashMap<String, String>, StoreError> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = owner_ids.to_vec();
        let rows = self.client.query(
            "SELECT id, email FROM profiles WHERE id = ANY($1)",
            &[&ids],
        ).await?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<_, String>(0), row.get::<_, String>(1)))
            .collect())
    }

    async fn record_profile(&self, owner_id: &str, email: &str) -> Result<(), StoreError> {
        self.client.execute(
            "INSERT INTO profiles (id, email)
             VALUES ($1, $2)
             ON CONFLICT (id)
             DO UPDATE SET email = EXCLUDED.email",
            &[&owner_id, &email],
        ).await?;

        Ok(())
    }
}
