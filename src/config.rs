use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

/// Upper bound for configured token lifetimes.
pub const MAX_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

/// SMTP settings for reset mails. Absent when `SMTP_HOST` is not set.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub client_url: String,
    pub environment: Environment,
    pub mail: Option<MailConfig>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt = JwtConfig {
            secret: var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "inkwell".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "inkwell-users".into()),
            ttl: match var("JWT_EXPIRES_IN") {
                Some(v) => parse_lifetime(&v).with_context(|| format!("JWT_EXPIRES_IN={v}"))?,
                None => Duration::from_secs(7 * 24 * 60 * 60),
            },
        };

        let environment = match var("APP_ENV").as_deref().map(str::to_ascii_lowercase) {
            Some(env) if env == "production" || env == "prod" => Environment::Production,
            _ => Environment::Development,
        };

        let mail = match var("SMTP_HOST") {
            Some(host) => Some(MailConfig {
                host,
                port: match var("SMTP_PORT") {
                    Some(p) => p.parse().with_context(|| format!("SMTP_PORT={p}"))?,
                    None => 587,
                },
                username: var("SMTP_USERNAME"),
                password: var("SMTP_PASSWORD"),
                from: var("MAIL_FROM").unwrap_or_else(|| "Inkwell <noreply@inkwell.dev>".into()),
            }),
            None => None,
        };

        // `PORT` is what most hosting platforms inject.
        let port = match var("APP_PORT").or_else(|| var("PORT")) {
            Some(p) => p.parse().with_context(|| format!("invalid port `{p}`"))?,
            None => 5000,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            jwt,
            client_url: var("CLIENT_URL")
                .unwrap_or_else(|| "http://localhost:5173".into())
                .trim_end_matches('/')
                .to_string(),
            environment,
            mail,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        })
    }

    /// Reset links are echoed in API responses only outside production.
    pub fn expose_reset_url(&self) -> bool {
        self.environment != Environment::Production
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

/// Parses token lifetimes such as `7d`, `12h`, `30m`, `45s` or a bare number of seconds.
pub fn parse_lifetime(value: &str) -> anyhow::Result<Duration> {
    let value = value.trim();
    let (digits, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => value.split_at(idx),
        None => (value, "s"),
    };
    let amount: u64 = digits
        .parse()
        .with_context(|| format!("invalid lifetime `{value}`"))?;
    let unit_secs: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => anyhow::bail!("unknown lifetime unit `{other}`"),
    };
    let seconds = amount
        .checked_mul(unit_secs)
        .filter(|&s| s <= MAX_LIFETIME.as_secs())
        .with_context(|| format!("lifetime `{value}` exceeds 365 days"))?;
    anyhow::ensure!(seconds > 0, "lifetime must be positive");
    Ok(Duration::from_secs(seconds))
}
