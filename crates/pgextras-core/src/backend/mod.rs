//! Connection abstraction.
//!
//! A session talks to the server through a [`Connector`] that opens one
//! [`Connection`]. Production code uses [`PgConnector`], backed by the
//! `postgres` driver; tests use [`MockConnector`], an in-memory server with
//! scripted answers.
//!
//! ```text
//!            ┌───────────────┐
//!            │   PgExtras    │  lazy connect, cached version/extension flags
//!            └───────┬───────┘
//!                    │
//!             ┌──────▼──────┐
//!             │  Connector  │ (trait)
//!             └──────┬──────┘
//!          ┌─────────┴─────────┐
//!   ┌──────▼──────┐     ┌──────▼──────┐
//!   │ PgConnector │     │MockConnector│
//!   │  (postgres) │     │  (testing)  │
//!   └─────────────┘     └─────────────┘
//! ```

pub mod mock;
mod pg;

pub use self::mock::MockConnector;
pub use self::pg::{PgConnection, PgConnector};

use crate::error::Result;
use crate::record::Record;

/// Opens connections for a session.
pub trait Connector {
    type Connection: Connection;

    /// Opens a new connection to `dsn`.
    fn connect(&self, dsn: &str) -> Result<Self::Connection>;
}

/// One open connection.
pub trait Connection {
    /// Runs `sql` through the simple query protocol and returns every row.
    fn simple_query(&mut self, sql: &str) -> Result<Vec<Record>>;

    /// Closes the connection.
    fn close(self) -> Result<()>;
}
