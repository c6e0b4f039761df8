use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::RoundingStrategy;
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

use crate::aggregation::{self, WindowKind};
use crate::config::AdminConfig;
use crate::display;
use crate::error::{AppError, AppResult, StoreError};
use crate::export;
use crate::models::{ChartSeries, DashboardTotals, NewSale, SaleRecord, SaleView, SalesFilter};
use crate::session::{self, AdminSession};
use crate::store::{AuthProvider, IdentityLookup, RecordFilter, SalesStore};
use crate::validators::{normalize_category, parse_amount, validate_email};

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub tz: Tz,
    pub recent_limit: usize,
    pub chart_months: u32,
}

pub struct SalesService {
    store: Arc<dyn SalesStore>,
    identities: Arc<dyn IdentityLookup>,
    settings: ReportSettings,
}

impl SalesService {
    pub fn new(store: Arc<dyn SalesStore>, identities: Arc<dyn IdentityLookup>, settings: ReportSettings) -> Self {
        Self {
            store,
            identities,
            settings,
        }
    }

    pub async fn record_sale(&self, owner_id: &str, amount: &str, category: Option<&str>) -> AppResult<SaleRecord> {
        let amount = parse_amount(amount).map_err(|e| {
            warn!("Rejected sale amount from {}: {}", owner_id, e);
            e
        })?;

        let sale = NewSale::new(amount, owner_id.to_string(), normalize_category(category));
        let record = self.store.insert_record(sale).await?;
        info!("Recorded sale {} of {} by {}", record.id, record.amount, owner_id);
        Ok(record)
    }

    /// Today's and this month's totals. Both come from one month fetch since
    /// the day window always lies inside the month window.
    pub async fn totals(&self, now: DateTime<Utc>) -> AppResult<DashboardTotals> {
        let tz = &self.settings.tz;
        let day = aggregation::window_for(WindowKind::Day, now, tz);
        let month = aggregation::window_for(WindowKind::Month, now, tz);

        let records = self.store.fetch_records(&RecordFilter::within(month)).await?;

        Ok(DashboardTotals {
            today_total: aggregation::sum(&records, &day),
            month_total: aggregation::sum(&records, &month),
            today_label: display::date_label(now, tz),
            month_label: display::current_month_label(now, tz),
        })
    }

    pub async fn recent(&self, filter: SalesFilter, now: DateTime<Utc>) -> AppResult<Vec<SaleView>> {
        let tz = &self.settings.tz;
        let kind = match filter {
            SalesFilter::Today => WindowKind::Day,
            SalesFilter::Month => WindowKind::Month,
        };
        let window = aggregation::window_for(kind, now, tz);
        let limit = self.settings.recent_limit;

        let records = self.store
            .fetch_records(&RecordFilter::within(window).limit(limit))
            .await?;
        let latest = aggregation::recent(&records, &window, limit);
        let emails = self.resolve_owners(&latest).await?;

        Ok(latest
            .into_iter()
            .map(|record| SaleView {
                id: record.id,
                created_at: record.created_at,
                created_at_label: display::timestamp_label(record.created_at, tz),
                amount: record.amount,
                category: normalize_category(Some(&record.category)),
                email: emails.get(&record.owner_id).cloned().unwrap_or_default(),
                owner_id: record.owner_id,
            })
            .collect())
    }

    pub async fn chart(&self, now: DateTime<Utc>) -> AppResult<ChartSeries> {
        let tz = &self.settings.tz;
        let months = self.settings.chart_months;
        let span = aggregation::window_for(WindowKind::TrailingMonths(months), now, tz);

        let records = self.store.fetch_records(&RecordFilter::within(span)).await?;
        let series = aggregation::monthly_series(&records, now, months, tz);

        Ok(ChartSeries {
            keys: series.iter().map(|entry| entry.key.to_string()).collect(),
            labels: series.iter().map(|entry| display::month_label(&entry.key)).collect(),
            rounded: series
                .iter()
                .map(|entry| {
                    entry.total
                        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                        .to_i64()
                        .unwrap_or_default()
                })
                .collect(),
            totals: series.into_iter().map(|entry| entry.total).collect(),
        })
    }

    pub async fn reset_day(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let day = aggregation::window_for(WindowKind::Day, now, &self.settings.tz);
        let deleted = self.store.delete_window(&day).await?;
        info!("Reset day {}: deleted {} sales", display::date_label(now, &self.settings.tz), deleted);
        Ok(deleted)
    }

    pub async fn export(&self) -> AppResult<Vec<u8>> {
        let records = self.store
            .fetch_records(&RecordFilter::all())
            .await
            .map_err(|source| AppError::Export { stage: "sales", source })?;

        let emails = self.resolve_owners(&records)
            .await
            .map_err(|source| AppError::Export { stage: "profiles", source })?;

        let rows = export::build_rows(&records, &emails, &self.settings.tz);
        let bytes = export::write_workbook(&rows)?;
        info!("Exported {} sales ({} bytes)", rows.len(), bytes.len());
        Ok(bytes)
    }

    async fn resolve_owners(&self, records: &[SaleRecord]) -> Result<HashMap<String, String>, StoreError> {
        let owner_ids: Vec<String> = records
            .iter()
            .map(|record| record.owner_id.clone())
            .filter(|id| !id.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        self.identities.resolve_display_names(&owner_ids).await
    }
}

pub struct AdminService {
    config: AdminConfig,
    auth: Arc<dyn AuthProvider>,
    identities: Arc<dyn IdentityLookup>,
}

impl AdminService {
    pub fn new(config: AdminConfig, auth: Arc<dyn AuthProvider>, identities: Arc<dyn IdentityLookup>) -> Self {
        Self {
            config,
            auth,
            identities,
        }
    }

    /// Returns a fresh session token when the password matches.
    pub fn login(&self, password: &str) -> AppResult<Option<String>> {
        let expected = self.config.password.as_bytes();
        let matches: bool = password.as_bytes().ct_eq(expected).into();
        if expected.is_empty() || !matches {
            warn!("Admin login rejected");
            return Ok(None);
        }

        let token = session::issue(&self.config.session_secret)?;
        info!("Admin session issued");
        Ok(Some(token))
    }

    pub fn session(&self, token: Option<&str>, now: DateTime<Utc>) -> AdminSession {
        match token {
            Some(token) => session::inspect(token, &self.config.session_secret, self.config.session_ttl(), now),
            None => AdminSession::Unauthenticated,
        }
    }

    pub fn session_cookie(&self, token: &str) -> String {
        session::session_cookie(token, self.config.session_ttl(), self.config.secure_cookie)
    }

    pub fn clear_cookie(&self) -> String {
        session::clear_cookie(self.config.secure_cookie)
    }

    pub async fn create_user(&self, email: &str) -> AppResult<String> {
        let email = validate_email(email).map_err(AppError::InvalidInput)?;

        let user_id = self.auth.create_user(&email, &self.config.common_password).await?;

        // The account already exists at the provider; a retry would be rejected
        if let Err(e) = self.identities.record_profile(&user_id, &email).await {
            error!("Failed to record profile for user {} ({}): {}", user_id, email, e);
        }

        info!("Created user {} for {}", user_id, email);
        Ok(user_id)
    }
}
