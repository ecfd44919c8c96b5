//! Diagnostic session.
//!
//! A [`PgExtras`] owns at most one connection, opened on the first statement
//! and released by [`PgExtras::close`] or on drop. Two lookups are cached for
//! the lifetime of the session and never re-run:
//!
//! - the server version (`SELECT version()`), which selects column spellings,
//! - the presence of `pg_stat_statements`, required by `calls` and `outliers`.

use tracing::{debug, info, warn};

use crate::backend::{Connection, Connector, PgConnector};
use crate::catalog::{self, Report, ReportOptions};
use crate::config::Config;
use crate::error::{PgExtrasError, Result};
use crate::normalize::collapse_whitespace;
use crate::record::Record;
use crate::version::{ActivityColumns, ServerVersion, StatementColumns};

/// One diagnostic session against one server.
///
/// Not meant to be shared between threads; open one session per thread.
pub struct PgExtras<C: Connector = PgConnector> {
    dsn: String,
    connector: C,
    connection: Option<C::Connection>,
    server_version: Option<ServerVersion>,
    pg_stat_statements: Option<bool>,
}

impl PgExtras<PgConnector> {
    /// Creates a session that connects with the `postgres` driver.
    ///
    /// Nothing is sent to the server until the first report runs.
    pub fn new(dsn: impl Into<String>) -> Self {
        Self::with_connector(dsn, PgConnector::new())
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.dsn.clone())
    }
}

impl<C: Connector> PgExtras<C> {
    /// Creates a session over any connector.
    pub fn with_connector(dsn: impl Into<String>, connector: C) -> Self {
        Self {
            dsn: dsn.into(),
            connector,
            connection: None,
            server_version: None,
            pg_stat_statements: None,
        }
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Returns the open connection, connecting first if needed.
    fn connection(&mut self) -> Result<&mut C::Connection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                let connection = self.connector.connect(&self.dsn)?;
                info!("connected to PostgreSQL");
                connection
            }
        };
        Ok(self.connection.insert(connection))
    }

    /// Runs `statement` and returns every row.
    ///
    /// Whitespace is collapsed before sending; rows are unaffected.
    pub fn execute(&mut self, statement: &str) -> Result<Vec<Record>> {
        let sql = collapse_whitespace(statement);
        debug!(sql = %sql, "executing statement");
        let rows = self.connection()?.simple_query(&sql)?;
        debug!(rows = rows.len(), "statement finished");
        Ok(rows)
    }

    /// Releases the connection. Calling it again is a no-op.
    ///
    /// Cached lookups are kept.
    pub fn close(&mut self) -> Result<()> {
        match self.connection.take() {
            Some(connection) => {
                info!("closing PostgreSQL connection");
                connection.close()
            }
            None => Ok(()),
        }
    }

    /// Server version, queried once per session.
    pub fn server_version(&mut self) -> Result<ServerVersion> {
        if let Some(version) = self.server_version {
            return Ok(version);
        }

        let rows = self.execute(catalog::VERSION)?;
        let banner = rows
            .first()
            .and_then(|row| row.value(0))
            .ok_or(PgExtrasError::MissingColumn {
                statement: "SELECT version()",
                column: "version",
            })?;
        let version = ServerVersion::parse(banner)?;
        debug!(%version, "detected server version");

        self.server_version = Some(version);
        Ok(version)
    }

    /// True when the server is at least `major.minor.0`.
    pub fn is_at_least(&mut self, major: u32, minor: u32) -> Result<bool> {
        Ok(self.server_version()?.is_at_least(major, minor))
    }

    /// True from 9.2 on, where `pg_stat_activity` uses `pid` and `query`.
    pub fn is_pg_at_least_nine_two(&mut self) -> Result<bool> {
        self.is_at_least(9, 2)
    }

    /// `pg_stat_activity` spellings for this server.
    pub fn activity_columns(&mut self) -> Result<ActivityColumns> {
        Ok(ActivityColumns::for_version(self.server_version()?))
    }

    /// `pg_stat_statements` spellings for this server.
    pub fn statement_columns(&mut self) -> Result<StatementColumns> {
        Ok(StatementColumns::for_version(self.server_version()?))
    }

    /// Checks that `pg_stat_statements` is installed.
    ///
    /// The catalog is queried once per session; a missing extension keeps
    /// failing with [`PgExtrasError::ExtensionMissing`] without asking the
    /// server again.
    pub fn pg_stat_statements(&mut self) -> Result<bool> {
        let available = match self.pg_stat_statements {
            Some(available) => available,
            None => {
                let rows = self.execute(catalog::PG_STAT_STATEMENTS)?;
                let available = rows
                    .first()
                    .and_then(|row| row.get_bool("available"))
                    .ok_or(PgExtrasError::MissingColumn {
                        statement: "pg_extension lookup",
                        column: "available",
                    })?;
                debug!(available, "checked for pg_stat_statements");
                self.pg_stat_statements = Some(available);
                available
            }
        };

        if available {
            Ok(true)
        } else {
            Err(PgExtrasError::ExtensionMissing)
        }
    }

    /// Runs `report` by name.
    pub fn run(&mut self, report: Report, options: &ReportOptions) -> Result<Vec<Record>> {
        match report {
            Report::Bloat => self.bloat(),
            Report::Blocking => self.blocking(),
            Report::CacheHit => self.cache_hit(),
            Report::Calls => self.calls(options.truncate),
            Report::IndexSize => self.index_size(),
            Report::IndexUsage => self.index_usage(),
            Report::Locks => self.locks(),
            Report::LongRunningQueries => self.long_running_queries(),
            Report::Mandelbrot => self.mandelbrot(),
            Report::Outliers => self.outliers(options.truncate),
            Report::Ps => self.ps(),
            Report::SeqScans => self.seq_scans(),
            Report::TableIndexesSize => self.table_indexes_size(),
            Report::TableSize => self.table_size(),
            Report::TotalIndexSize => self.total_index_size(),
            Report::TotalIndexesSize => self.total_indexes_size(),
            Report::TotalTableSize => self.total_table_size(),
            Report::UnusedIndexes => self.unused_indexes(),
            Report::VacuumStats => self.vacuum_stats(),
            Report::Version => self.version(),
        }
    }

    /// Index and table cache hit rates, in that order.
    pub fn cache_hit(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::CACHE_HIT)
    }

    pub fn index_usage(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::INDEX_USAGE)
    }

    /// Ten most frequently called statements. Needs `pg_stat_statements`.
    pub fn calls(&mut self, truncate: bool) -> Result<Vec<Record>> {
        self.pg_stat_statements()?;
        let columns = self.statement_columns()?;
        self.execute(&catalog::build_calls_query(columns, truncate))
    }

    /// Ten statements with the longest aggregate execution time. Needs
    /// `pg_stat_statements`.
    pub fn outliers(&mut self, truncate: bool) -> Result<Vec<Record>> {
        self.pg_stat_statements()?;
        let columns = self.statement_columns()?;
        self.execute(&catalog::build_outliers_query(columns, truncate))
    }

    pub fn blocking(&mut self) -> Result<Vec<Record>> {
        let columns = self.activity_columns()?;
        self.execute(&catalog::build_blocking_query(columns))
    }

    pub fn locks(&mut self) -> Result<Vec<Record>> {
        let columns = self.activity_columns()?;
        self.execute(&catalog::build_locks_query(columns))
    }

    pub fn long_running_queries(&mut self) -> Result<Vec<Record>> {
        let columns = self.activity_columns()?;
        self.execute(&catalog::build_long_running_queries_query(columns))
    }

    pub fn ps(&mut self) -> Result<Vec<Record>> {
        let columns = self.activity_columns()?;
        self.execute(&catalog::build_ps_query(columns))
    }

    pub fn vacuum_stats(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::VACUUM_STATS)
    }

    pub fn bloat(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::BLOAT)
    }

    pub fn seq_scans(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::SEQ_SCANS)
    }

    pub fn unused_indexes(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::UNUSED_INDEXES)
    }

    pub fn total_table_size(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::TOTAL_TABLE_SIZE)
    }

    pub fn total_indexes_size(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::TOTAL_INDEXES_SIZE)
    }

    pub fn table_size(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::TABLE_SIZE)
    }

    pub fn index_size(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::INDEX_SIZE)
    }

    pub fn total_index_size(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::TOTAL_INDEX_SIZE)
    }

    pub fn table_indexes_size(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::TABLE_INDEXES_SIZE)
    }

    pub fn mandelbrot(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::MANDELBROT)
    }

    /// The `SELECT version()` banner as a single record.
    pub fn version(&mut self) -> Result<Vec<Record>> {
        self.execute(catalog::VERSION)
    }
}

impl<C: Connector> Drop for PgExtras<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close PostgreSQL connection");
        }
    }
}
