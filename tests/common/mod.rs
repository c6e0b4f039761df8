// In-memory collaborators and a server harness for the HTTP tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use sales_desk::aggregation::TimeWindow;
use sales_desk::api::{create_router, AppState};
use sales_desk::config::AdminConfig;
use sales_desk::error::{ProvisionError, StoreError};
use sales_desk::models::{AuthUser, NewSale, SaleRecord};
use sales_desk::service::{AdminService, ReportSettings, SalesService};
use sales_desk::store::{AuthProvider, IdentityLookup, RecordFilter, SalesStore};

pub const USER_TOKEN: &str = "user-token";
pub const USER_ID: &str = "user-1";
pub const USER_EMAIL: &str = "anna@example.com";
pub const ADMIN_PASSWORD: &str = "admin-pw";
pub const SESSION_SECRET: &str = "test-session-secret";
pub const COMMON_PASSWORD: &str = "welcome-1";
pub const TAKEN_EMAIL: &str = "taken@example.com";

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<SaleRecord>>,
    next_id: AtomicI64,
    pub failing: AtomicBool,
}

impl MemoryStore {
    pub async fn seed(&self, created_at: DateTime<Utc>, amount: Decimal, owner_id: &str, category: &str) -> SaleRecord {
        let record = SaleRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            created_at,
            amount,
            owner_id: owner_id.to_string(),
            category: category.to_string(),
        };
        self.records.lock().await.push(record.clone());
        record
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Msg("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SalesStore for MemoryStore {
    async fn fetch_records(&self, filter: &RecordFilter) -> Result<Vec<SaleRecord>, StoreError> {
        self.check()?;
        let mut records: Vec<SaleRecord> = self.records
            .lock()
            .await
            .iter()
            .filter(|record| filter.window.map_or(true, |window| window.contains(record.created_at)))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn insert_record(&self, sale: NewSale) -> Result<SaleRecord, StoreError> {
        self.check()?;
        Ok(self.seed(Utc::now(), sale.amount, &sale.owner_id, &sale.category).await)
    }

    async fn delete_window(&self, window: &TimeWindow) -> Result<u64, StoreError> {
        self.check()?;
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| !window.contains(record.created_at));
        Ok((before - records.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryIdentities {
    pub profiles: Mutex<HashMap<String, String>>,
    pub failing: AtomicBool,
}

#[async_trait]
impl IdentityLookup for MemoryIdentities {
    async fn resolve_display_names(&self, owner_ids: &[String]) -> Result<HashMap<String, String>, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Msg("profiles unavailable".to_string()));
        }
        let profiles = self.profiles.lock().await;
        Ok(owner_ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|email| (id.clone(), email.clone())))
            .collect())
    }

    async fn record_profile(&self, owner_id: &str, email: &str) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Msg("profiles unavailable".to_string()));
        }
        self.profiles.lock().await.insert(owner_id.to_string(), email.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct StubAuth {
    pub created: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl AuthProvider for StubAuth {
    async fn authenticate(&self, access_token: &str) -> Result<Option<AuthUser>, StoreError> {
        if access_token == USER_TOKEN {
            return Ok(Some(AuthUser {
                id: USER_ID.to_string(),
                email: USER_EMAIL.to_string(),
            }));
        }
        Ok(None)
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<String, ProvisionError> {
        if email == TAKEN_EMAIL {
            return Err(ProvisionError::Rejected(
                "A user with this email address has already been registered".to_string(),
            ));
        }
        let mut created = self.created.lock().await;
        created.push((email.to_string(), password.to_string()));
        Ok(format!("new-user-{}", created.len()))
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub identities: Arc<MemoryIdentities>,
    pub auth: Arc<StubAuth>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(USER_TOKEN)
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(USER_TOKEN)
    }
}

pub fn admin_config() -> AdminConfig {
    AdminConfig {
        session_secret: SESSION_SECRET.to_string(),
        password: ADMIN_PASSWORD.to_string(),
        common_password: COMMON_PASSWORD.to_string(),
        session_ttl_seconds: 7200,
        secure_cookie: true,
    }
}

pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let identities = Arc::new(MemoryIdentities::default());
    let auth = Arc::new(StubAuth::default());

    identities.record_profile(USER_ID, USER_EMAIL).await.unwrap();

    let sales = SalesService::new(
        store.clone(),
        identities.clone(),
        ReportSettings {
            tz: chrono_tz::UTC,
            recent_limit: 10,
            chart_months: 12,
        },
    );
    let admin = AdminService::new(admin_config(), auth.clone(), identities.clone());

    let router = create_router(AppState {
        sales: Arc::new(sales),
        admin: Arc::new(admin),
        auth: auth.clone(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        store,
        identities,
        auth,
    }
}
