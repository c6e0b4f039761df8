use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{require_admin, require_user};
use crate::service::{AdminService, SalesService};
use crate::store::AuthProvider;

// App state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub sales: Arc<SalesService>,
    pub admin: Arc<AdminService>,
    pub auth: Arc<dyn AuthProvider>,
}

// Create the main router with all endpoints
pub fn create_router(state: AppState) -> Router {
    // Signed-in users (bearer token from the auth provider)
    let user_routes = Router::new()
        .route("/api/me", get(handlers::me))
        .route("/api/sales", post(handlers::record_sale))
        .route("/api/sales/recent", get(handlers::recent_sales))
        .route("/api/dashboard/totals", get(handlers::dashboard_totals))
        .route("/api/dashboard/chart", get(handlers::monthly_chart))
        .route("/api/reset-day", post(handlers::reset_day))
        .route("/api/export", get(handlers::export_sales))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_user));

    // Admin session cookie
    let admin_routes = Router::new()
        .route("/api/admin/create-user", post(handlers::create_user))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/admin/login", post(handlers::admin_login))
        .route("/api/admin/logout", post(handlers::admin_logout))
        .merge(user_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(64 * 1024)),
        )
        .with_state(state)
}
