//! Server version detection and the column names that depend on it.
//!
//! PostgreSQL has renamed several statistics columns over the years. The
//! catalog is written against placeholders; the structs here pick the right
//! spelling for a given [`ServerVersion`]:
//!
//! | Since | Old                             | New                                       |
//! |-------|---------------------------------|-------------------------------------------|
//! | 9.2   | `procpid`, `current_query`      | `pid`, `query`, `state`                   |
//! | 9.6   | `waiting`                       | `wait_event`                              |
//! | 13    | `total_time`                    | `total_exec_time`                         |
//! | 17    | `blk_read_time`, `blk_write_time` | `shared_blk_read_time`, `shared_blk_write_time` |

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PgExtrasError, Result};

static BANNER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PostgreSQL (\d+)\.(\d+)(?:\.(\d+))?(?:[\s(,]|$)").expect("valid banner regex")
});

/// Server version as a `(major, minor, patch)` triple.
///
/// Ordering is lexicographic over the triple, so `10.1.0 > 9.6.24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses the banner returned by `SELECT version()`, e.g.
    /// `PostgreSQL 9.1.14 on x86_64-unknown-linux-gnu, compiled by gcc ...`.
    ///
    /// Servers from 10 on report two components (`PostgreSQL 16.2 on ...`);
    /// the patch level is then 0.
    pub fn parse(banner: &str) -> Result<Self> {
        let err = || PgExtrasError::VersionParse(banner.to_string());
        let caps = BANNER_RE.captures(banner).ok_or_else(err)?;
        let component = |idx: usize| -> Result<u32> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse().map_err(|_| err()),
                None => Ok(0),
            }
        };
        Ok(Self::new(component(1)?, component(2)?, component(3)?))
    }

    pub fn is_at_least(&self, major: u32, minor: u32) -> bool {
        *self >= Self::new(major, minor, 0)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// `pg_stat_activity` spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityColumns {
    /// `pid` or `procpid`.
    pub pid: &'static str,
    /// `query` or `current_query`.
    pub query: &'static str,
    /// Extra `WHERE` clause dropping idle backends.
    pub idle_filter: &'static str,
    /// Expression reported as `waiting`.
    pub waiting: &'static str,
}

impl ActivityColumns {
    pub fn for_version(version: ServerVersion) -> Self {
        let (pid, query, idle_filter) = if version.is_at_least(9, 2) {
            ("pid", "query", "AND state <> 'idle'")
        } else {
            ("procpid", "current_query", "AND current_query <> '<IDLE>'")
        };
        let waiting = if version.is_at_least(9, 6) {
            "wait_event IS NOT NULL AS waiting"
        } else {
            "waiting"
        };
        Self {
            pid,
            query,
            idle_filter,
            waiting,
        }
    }
}

/// `pg_stat_statements` spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementColumns {
    /// Total execution time in milliseconds.
    pub total_time: &'static str,
    /// Time spent on block I/O in milliseconds.
    pub io_time: &'static str,
}

impl StatementColumns {
    pub fn for_version(version: ServerVersion) -> Self {
        let total_time = if version.major >= 13 {
            "total_exec_time"
        } else {
            "total_time"
        };
        let io_time = if version.major >= 17 {
            "(shared_blk_read_time + shared_blk_write_time)"
        } else {
            "(blk_read_time + blk_write_time)"
        };
        Self {
            total_time,
            io_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_part_banner() {
        let v = ServerVersion::parse(
            "PostgreSQL 9.1.14 on x86_64-unknown-linux-gnu, compiled by gcc (GCC) 4.4.7, 64-bit",
        )
        .unwrap();
        assert_eq!(v, ServerVersion::new(9, 1, 14));
    }

    #[test]
    fn parses_two_part_banner() {
        let v = ServerVersion::parse(
            "PostgreSQL 16.2 (Debian 16.2-1.pgdg120+2) on x86_64-pc-linux-gnu, compiled by gcc",
        )
        .unwrap();
        assert_eq!(v, ServerVersion::new(16, 2, 0));

        let v = ServerVersion::parse("PostgreSQL 17.0 on aarch64-apple-darwin23.6.0").unwrap();
        assert_eq!(v, ServerVersion::new(17, 0, 0));
    }

    #[test]
    fn rejects_unexpected_banners() {
        for banner in [
            "",
            "postgres 9.2.0 on linux",
            "PostgreSQL 17beta1 on x86_64",
            "EnterpriseDB 9.2.1",
            "PostgreSQL nine",
        ] {
            match ServerVersion::parse(banner) {
                Err(PgExtrasError::VersionParse(b)) => assert_eq!(b, banner),
                other => panic!("expected VersionParse for {banner:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn ordering_is_numeric_not_textual() {
        assert!(ServerVersion::new(10, 1, 0) > ServerVersion::new(9, 6, 24));
        assert!(ServerVersion::new(9, 10, 0) > ServerVersion::new(9, 2, 0));
        assert!(ServerVersion::new(9, 2, 0).is_at_least(9, 2));
        assert!(!ServerVersion::new(9, 1, 24).is_at_least(9, 2));
    }

    #[test]
    fn activity_columns_switch_at_nine_two() {
        let old = ActivityColumns::for_version(ServerVersion::new(9, 1, 24));
        assert_eq!((old.pid, old.query), ("procpid", "current_query"));
        assert!(old.idle_filter.contains("<IDLE>"));

        let new = ActivityColumns::for_version(ServerVersion::new(9, 2, 0));
        assert_eq!((new.pid, new.query), ("pid", "query"));
        assert!(new.idle_filter.contains("state"));
    }

    #[test]
    fn waiting_column_switches_at_nine_six() {
        assert_eq!(
            ActivityColumns::for_version(ServerVersion::new(9, 5, 25)).waiting,
            "waiting"
        );
        assert!(
            ActivityColumns::for_version(ServerVersion::new(9, 6, 0))
                .waiting
                .starts_with("wait_event")
        );
    }

    #[test]
    fn statement_columns_follow_renames() {
        let v12 = StatementColumns::for_version(ServerVersion::new(12, 18, 0));
        assert_eq!(v12.total_time, "total_time");
        assert!(v12.io_time.contains("blk_read_time"));
        assert!(!v12.io_time.contains("shared_"));

        let v16 = StatementColumns::for_version(ServerVersion::new(16, 2, 0));
        assert_eq!(v16.total_time, "total_exec_time");
        assert!(!v16.io_time.contains("shared_"));

        let v17 = StatementColumns::for_version(ServerVersion::new(17, 0, 0));
        assert!(v17.io_time.contains("shared_blk_read_time"));
    }
}
