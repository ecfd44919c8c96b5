//! pgextras-core: diagnostic queries for PostgreSQL.
//!
//! Provides:
//! - `session` — [`PgExtras`], one lazily opened connection plus cached
//!   version and `pg_stat_statements` checks
//! - `catalog` — the diagnostic statements and the [`Report`] enum naming them
//! - `version` — banner parsing and version-dependent column names
//! - `backend` — connection traits, the `postgres` backend and a mock
//! - `record` — [`Record`], one result row with named text fields
//! - `config` — DSN resolution from the environment
//!
//! ```no_run
//! use pgextras_core::PgExtras;
//!
//! let mut pg = PgExtras::new("host=localhost user=postgres dbname=bench");
//! for row in pg.cache_hit()? {
//!     println!("{}: {}", row.get("name").unwrap_or("?"), row.get("ratio").unwrap_or("-"));
//! }
//! pg.close()?;
//! # Ok::<(), pgextras_core::PgExtrasError>(())
//! ```

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod normalize;
pub mod record;
pub mod session;
pub mod version;

pub use catalog::{Report, ReportOptions, UnknownReport};
pub use config::Config;
pub use error::{PgExtrasError, Result};
pub use record::Record;
pub use session::PgExtras;
pub use version::ServerVersion;
