use axum::{
    extract::{Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE},
        StatusCode,
    },
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::api::AppState;
use crate::error::AppResult;
use crate::export::{EXPORT_FILENAME, XLSX_CONTENT_TYPE};
use crate::models::{AuthUser, ChartSeries, DashboardTotals, SaleRecord, SaleView, SalesFilter};

#[derive(Debug, Deserialize)]
pub struct RecordSaleRequest {
    pub amount: String,
    #[serde(default)]
    pub product_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    #[serde(default)]
    pub filter: SalesFilter,
}

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

pub async fn me(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
    Json(user)
}

pub async fn record_sale(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RecordSaleRequest>,
) -> AppResult<(StatusCode, Json<SaleRecord>)> {
    let record = state.sales
        .record_sale(&user.id, &payload.amount, payload.product_type.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn dashboard_totals(State(state): State<AppState>) -> AppResult<Json<DashboardTotals>> {
    Ok(Json(state.sales.totals(Utc::now()).await?))
}

pub async fn recent_sales(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<SaleView>>> {
    Ok(Json(state.sales.recent(query.filter, Utc::now()).await?))
}

pub async fn monthly_chart(State(state): State<AppState>) -> AppResult<Json<ChartSeries>> {
    Ok(Json(state.sales.chart(Utc::now()).await?))
}

pub async fn reset_day(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    tracing::info!("Day reset requested by {}", user.email);
    let deleted = state.sales.reset_day(Utc::now()).await?;

    Ok(Json(json!({
        "ok": true,
        "deleted": deleted
    })))
}

pub async fn export_sales(State(state): State<AppState>) -> AppResult<Response> {
    let bytes = state.sales.export().await?;
    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILENAME);

    Ok((
        [
            (CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> AppResult<Response> {
    match state.admin.login(&payload.password)? {
        Some(token) => Ok((
            [(SET_COOKIE, state.admin.session_cookie(&token))],
            Json(json!({ "ok": true })),
        )
            .into_response()),
        None => Ok((StatusCode::UNAUTHORIZED, Json(json!({ "ok": false }))).into_response()),
    }
}

pub async fn admin_logout(State(state): State<AppState>) -> Response {
    (
        [(SET_COOKIE, state.admin.clear_cookie())],
        Json(json!({ "ok": true })),
    )
        .into_response()
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = state.admin.create_user(&payload.email).await?;

    Ok(Json(json!({
        "ok": true,
        "user_id": user_id
    })))
}
