//! Connection settings.

use crate::error::{PgExtrasError, Result};

/// Where a session connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// libpq-style `key=value` string or `postgres://` URL.
    pub dsn: String,
}

impl Config {
    pub fn with_dsn(dsn: impl Into<String>) -> Self {
        Self { dsn: dsn.into() }
    }

    /// Reads the DSN from the environment.
    ///
    /// `PGEXTRAS_DSN` wins, then `DATABASE_URL`. Otherwise the DSN is built
    /// from the standard libpq variables:
    /// - PGHOST (default: localhost)
    /// - PGPORT (default: 5432)
    /// - PGUSER (default: $USER)
    /// - PGPASSWORD (default: empty)
    /// - PGDATABASE (default: same as PGUSER)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(dsn) = var("PGEXTRAS_DSN").or_else(|| var("DATABASE_URL")) {
            return Ok(Self::with_dsn(dsn));
        }

        let user = var("PGUSER")
            .or_else(|| var("USER"))
            .ok_or_else(|| PgExtrasError::Config("PGUSER or USER not set".to_string()))?;
        let host = var("PGHOST").unwrap_or_else(|| "localhost".to_string());
        let port = var("PGPORT").unwrap_or_else(|| "5432".to_string());
        let database = var("PGDATABASE").unwrap_or_else(|| user.clone());

        let mut parts = vec![
            format!("host={}", quote_value(&host)),
            format!("port={}", quote_value(&port)),
            format!("user={}", quote_value(&user)),
        ];
        if let Some(password) = var("PGPASSWORD") {
            parts.push(format!("password={}", quote_value(&password)));
        }
        parts.push(format!("dbname={}", quote_value(&database)));

        Ok(Self::with_dsn(parts.join(" ")))
    }
}

/// Quotes a libpq `key=value` value when it contains spaces, quotes or
/// backslashes.
fn quote_value(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}
