use anyhow::{anyhow, bail, Result};
use chrono::Duration;
use chrono_tz::Tz;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub service: ServiceConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

// Hosted auth provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default)]
    pub service_role_key: String,
}

#[derive(Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub session_secret: String,
    #[serde(default)]
    pub password: String,
    /// Password given to every account the admin provisions.
    #[serde(default)]
    pub common_password: String,
    pub session_ttl_seconds: i64,
    pub secure_cookie: bool,
}

// Keeps secrets out of startup logs
impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("secure_cookie", &self.secure_cookie)
            .finish_non_exhaustive()
    }
}

impl AdminConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_seconds)
    }
}

pub const MAX_CHART_MONTHS: u32 = 120;

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    pub timezone: String,
    pub recent_limit: usize,
    pub chart_months: u32,
}

impl ReportingConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid reporting timezone '{}': {}", self.timezone, e))
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_builder = config::Config::builder()
            .set_default("service.host", "0.0.0.0")?
            .set_default("service.port", 8080)?
            .set_default("service.log_level", "info")?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.name", "sales")?
            .set_default("database.user", "postgres")?
            .set_default("database.password", "")?
            .set_default("admin.session_ttl_seconds", 60 * 60 * 2)?
            .set_default("admin.secure_cookie", true)?
            .set_default("reporting.timezone", "Europe/Rome")?
            .set_default("reporting.recent_limit", 10)?
            .set_default("reporting.chart_months", 12)?
            // Start with the shared config file
            .add_source(config::File::with_name("config").required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config.local").required(false))
            // Add environment variables with prefix "SALES_", e.g. SALES_ADMIN__PASSWORD
            .add_source(
                config::Environment::with_prefix("SALES")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Config = config_builder.try_deserialize()?;
        Ok(config)
    }

    /// Missing secrets are fatal: the service must not start issuing or
    /// accepting admin sessions without them.
    pub fn validate(&self) -> Result<()> {
        if self.admin.session_secret.is_empty() {
            bail!("admin.session_secret is not configured");
        }
        if self.admin.password.is_empty() {
            bail!("admin.password is not configured");
        }
        if self.admin.common_password.is_empty() {
            bail!("admin.common_password is not configured");
        }
        if self.admin.session_ttl_seconds <= 0 {
            bail!("admin.session_ttl_seconds must be positive");
        }
        if self.auth.url.is_empty() {
            bail!("auth.url is not configured");
        }
        if !(1..=MAX_CHART_MONTHS).contains(&self.reporting.chart_months) {
            bail!("reporting.chart_months must be between 1 and {}", MAX_CHART_MONTHS);
        }
        self.reporting.tz()?;
        Ok(())
    }

    pub fn db_url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.database.user,
            self.database.password,
            self.database.host,
            self.database.port,
            self.database.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database: DatabaseConfig {
                host: "db".to_string(),
                port: 5432,
                name: "sales".to_string(),
                user: "app".to_string(),
                password: "pw".to_string(),
            },
            service: ServiceConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                log_level: "info".to_string(),
            },
            auth: AuthConfig {
                url: "https://auth.example.com".to_string(),
                anon_key: "anon".to_string(),
                service_role_key: "service".to_string(),
            },
            admin: AdminConfig {
                session_secret: "secret".to_string(),
                password: "admin-pw".to_string(),
                common_password: "common-pw".to_string(),
                session_ttl_seconds: 7200,
                secure_cookie: true,
            },
            reporting: ReportingConfig {
                timezone: "Europe/Rome".to_string(),
                recent_limit: 10,
                chart_months: 12,
            },
        }
    }

    #[test]
    fn test_db_url() {
        assert_eq!(sample().db_url(), "postgresql://app:pw@db:5432/sales");
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(sample().validate().is_ok());
        assert_eq!(sample().admin.session_ttl(), Duration::hours(2));
    }

    #[test]
    fn test_validate_rejects_missing_secrets() {
        let mut config = sample();
        config.admin.session_secret.clear();
        assert!(config.validate().is_err());

        let mut config = sample();
        config.admin.password.clear();
        assert!(config.validate().is_err());

        let mut config = sample();
        config.admin.common_password.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_timezone() {
        let mut config = sample();
        config.reporting.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_chart_months() {
        let mut config = sample();
        config.reporting.chart_months = 0;
        assert!(config.validate().is_err());

        config.reporting.chart_months = u32::MAX;
        assert!(config.validate().is_err());

        config.reporting.chart_months = MAX_CHART_MONTHS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_admin_debug_hides_secrets() {
        let rendered = format!("{:?}", sample().admin);
        assert!(!rendered.contains("admin-pw"));
        assert!(!rendered.contains("common-pw"));
    }
}
