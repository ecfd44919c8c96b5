//! In-memory mock server for testing sessions without PostgreSQL.
//!
//! [`MockConnector`] answers statements from a script: each entry pairs a
//! substring with the rows (or error) to return when a statement contains it.
//! Unmatched statements return no rows. Every statement sent and every
//! connect/close is recorded so tests can assert on what reached the server.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Connection, Connector};
use crate::error::{PgExtrasError, Result};
use crate::record::Record;

/// Banner of a current server.
pub const BANNER_16: &str = "PostgreSQL 16.2 (Debian 16.2-1.pgdg120+2) on x86_64-pc-linux-gnu, \
                             compiled by gcc (Debian 12.2.0-14) 12.2.0, 64-bit";

/// Banner of a server from before the `pid`/`query` rename.
pub const BANNER_9_1: &str =
    "PostgreSQL 9.1.24 on x86_64-unknown-linux-gnu, compiled by gcc (GCC) 4.4.7 20120313, 64-bit";

#[derive(Debug, Clone)]
enum Answer {
    Rows(Vec<Record>),
    Error(String),
}

#[derive(Debug, Default)]
struct MockState {
    script: Vec<(String, Answer)>,
    statements: Vec<String>,
    connects: usize,
    closes: usize,
    refuse: Option<String>,
}

/// Scripted connector. Clones share the same script and log.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Creates a connector with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// A server reporting `banner` from `SELECT version()`, with or without
    /// `pg_stat_statements` installed.
    pub fn typical_server(banner: &str, pg_stat_statements: bool) -> Self {
        let mock = Self::new();
        mock.respond("SELECT version()", &["version"], &[&[Some(banner)]]);
        mock.respond(
            "FROM pg_extension",
            &["available"],
            &[&[Some(if pg_stat_statements { "t" } else { "f" })]],
        );
        mock
    }

    /// Answers statements containing `needle` with `rows`.
    ///
    /// Later entries win over earlier ones for the same statement.
    pub fn respond(&self, needle: &str, columns: &[&str], rows: &[&[Option<&str>]]) -> &Self {
        let columns: Arc<[String]> = columns.iter().map(|c| c.to_string()).collect();
        let records = rows
            .iter()
            .map(|row| {
                let values = row.iter().map(|v| v.map(str::to_string)).collect();
                Record::new(Arc::clone(&columns), values)
            })
            .collect();
        self.lock()
            .script
            .push((needle.to_string(), Answer::Rows(records)));
        self
    }

    /// Fails statements containing `needle` with a backend error.
    pub fn fail(&self, needle: &str, message: &str) -> &Self {
        self.lock()
            .script
            .push((needle.to_string(), Answer::Error(message.to_string())));
        self
    }

    /// Makes every later connection attempt fail.
    pub fn refuse_connections(&self, message: &str) {
        self.lock().refuse = Some(message.to_string());
    }

    /// Statements received so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    /// Number of statements received that contain `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.lock()
            .statements
            .iter()
            .filter(|s| s.contains(needle))
            .count()
    }

    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    pub fn closes(&self) -> usize {
        self.lock().closes
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Connector for MockConnector {
    type Connection = MockConnection;

    fn connect(&self, _dsn: &str) -> Result<MockConnection> {
        let mut state = self.lock();
        if let Some(message) = &state.refuse {
            return Err(PgExtrasError::Backend(message.clone()));
        }
        state.connects += 1;
        Ok(MockConnection {
            state: Arc::clone(&self.state),
        })
    }
}

/// Connection handed out by [`MockConnector`].
#[derive(Debug)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl Connection for MockConnection {
    fn simple_query(&mut self, sql: &str) -> Result<Vec<Record>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.statements.push(sql.to_string());
        let answer = state
            .script
            .iter()
            .rev()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, answer)| answer.clone());
        match answer {
            Some(Answer::Rows(rows)) => Ok(rows),
            Some(Answer::Error(message)) => Err(PgExtrasError::Backend(message)),
            None => Ok(Vec::new()),
        }
    }

    fn close(self) -> Result<()> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closes += 1;
        Ok(())
    }
}
