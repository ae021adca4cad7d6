use std::fmt;

use anyhow::Context;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"..")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

#[derive(Clone)]
pub struct MailConfig {
    pub api_url: String,
    /// No key means mail is only logged (local development).
    pub api_key: Option<String>,
    pub from_email: String,
    pub from_name: String,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// `database_url` may carry credentials and is left out of `Debug`.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub frontend_url: String,
    pub env: String,
    pub invitation_ttl_hours: i64,
    pub reset_ttl_minutes: i64,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is required")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "habitisti".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "habitisti".into()),
            ttl_minutes: parse_or("JWT_TTL_MINUTES", 60 * 24 * 3)?,
        };
        let mail = MailConfig {
            api_url: std::env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://send.api.mailtrap.io/api/send".into()),
            api_key: std::env::var("MAIL_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            from_email: std::env::var("FROM_EMAIL").unwrap_or_else(|_| "no-reply@habitisti.local".into()),
            from_name: std::env::var("FROM_NAME").unwrap_or_else(|_| "Habitisti".into()),
        };
        Ok(Self {
            database_url,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            jwt,
            mail,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            invitation_ttl_hours: parse_or("INVITATION_TTL_HOURS", 24 * 3)?,
            reset_ttl_minutes: parse_or("RESET_TTL_MINUTES", 60)?,
            request_timeout_secs: parse_or("REQUEST_TIMEOUT_SECS", 60)?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.env == "production"
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"..")
            .field("db_max_connections", &self.db_max_connections)
            .field("jwt", &self.jwt)
            .field("mail", &self.mail)
            .field("frontend_url", &self.frontend_url)
            .field("env", &self.env)
            .field("invitation_ttl_hours", &self.invitation_ttl_hours)
            .field("reset_ttl_minutes", &self.reset_ttl_minutes)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v.trim().parse::<T>().with_context(|| format!("{key} is not a valid number")),
        Err(_) => Ok(default),
    }
}
