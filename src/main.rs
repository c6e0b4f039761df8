use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sales_desk::api::{create_router, AppState};
use sales_desk::auth_client::HostedAuthClient;
use sales_desk::config::Config;
use sales_desk::db::Database;
use sales_desk::service::{AdminService, ReportSettings, SalesService};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration first
    let config = Config::load()?;

    // Initialize logging with configured level, RUST_LOG wins when set
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sales_desk={0},tower_http={0}", config.service.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    config.validate()?;
    info!("Configuration loaded successfully");

    let tz = config.reporting.tz()?;
    info!("Reporting windows use timezone {}", tz);

    // Connect to database
    let db = Arc::new(Database::new(&config.db_url()).await?);
    db.test_connection().await?;
    info!("Database stats - Sales: {}", db.get_sales_count().await?);

    let auth = Arc::new(HostedAuthClient::new(&config.auth));

    let sales = SalesService::new(
        db.clone(),
        db.clone(),
        ReportSettings {
            tz,
            recent_limit: config.reporting.recent_limit,
            chart_months: config.reporting.chart_months,
        },
    );
    let admin = AdminService::new(config.admin.clone(), auth.clone(), db.clone());

    let router = create_router(AppState {
        sales: Arc::new(sales),
        admin: Arc::new(admin),
        auth,
    });

    let addr: SocketAddr = format!("{}:{}", config.service.host, config.service.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Sales desk listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
