//! Error type shared by every pgextras operation.

use thiserror::Error;

/// Remediation text reported when `pg_stat_statements` is missing.
pub const PG_STAT_STATEMENTS_NOT_AVAILABLE: &str = "pg_stat_statements extension needs to be \
installed in the public schema first. This extension is only available on Postgres versions \
9.2 or greater. You can install it by adding pg_stat_statements to shared_preload_libraries \
in postgresql.conf, restarting postgres and then running the following sql statement in your \
database: CREATE EXTENSION pg_stat_statements;";

/// Errors surfaced by a [`PgExtras`](crate::PgExtras) session.
#[derive(Debug, Error)]
pub enum PgExtrasError {
    /// A report needs `pg_stat_statements`, which is not installed.
    #[error("{}", PG_STAT_STATEMENTS_NOT_AVAILABLE)]
    ExtensionMissing,
    /// `SELECT version()` returned a banner we could not read.
    #[error("unable to parse server version from {0:?}")]
    VersionParse(String),
    /// A gate statement returned no row or lacked the expected column.
    #[error("statement {statement} returned no {column} column")]
    MissingColumn {
        statement: &'static str,
        column: &'static str,
    },
    /// Error reported by the PostgreSQL driver, passed through untouched.
    #[error("PostgreSQL: {}", format_postgres_error(.0))]
    Database(#[from] postgres::Error),
    /// Error reported by a non-postgres backend (see [`crate::backend::mock`]).
    #[error("backend error: {0}")]
    Backend(String),
    /// Connection settings could not be determined.
    #[error("configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PgExtrasError>;

/// Formats a driver error for display.
///
/// Server errors read `SEVERITY SQLSTATE: message`, followed by the server's
/// hint when it sent one. Client side failures go through
/// [`describe_client_error`].
pub fn format_postgres_error(e: &postgres::Error) -> String {
    match e.as_db_error() {
        Some(db) => {
            describe_server_error(db.severity(), db.code().code(), db.message(), db.hint())
        }
        None => describe_client_error(&e.to_string()),
    }
}

fn describe_server_error(severity: &str, code: &str, message: &str, hint: Option<&str>) -> String {
    match hint {
        Some(hint) => format!("{severity} {code}: {message} (hint: {hint})"),
        None => format!("{severity} {code}: {message}"),
    }
}

/// Rewrites the connection failures a diagnostic run usually hits into a
/// pointer at the setting to fix. Anything else keeps the driver's text.
fn describe_client_error(msg: &str) -> String {
    if msg.contains("Connection refused") {
        "connection refused; check PGHOST/PGPORT or the connection string".to_string()
    } else if msg.contains("password authentication failed") {
        "password authentication failed; check PGUSER/PGPASSWORD or the connection string"
            .to_string()
    } else if msg.contains("timed out") {
        "timed out connecting to the server".to_string()
    } else if let Some((_, fatal)) = msg.rsplit_once("FATAL:") {
        fatal.trim().to_string()
    } else {
        msg.to_string()
    }
}
