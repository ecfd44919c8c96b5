//! The diagnostic query catalog.
//!
//! Most entries are literal statements. Those touching `pg_stat_activity` or
//! `pg_stat_statements` are built by the `build_*` functions below, which
//! splice in the column spellings chosen by [`crate::version`].

use std::fmt;
use std::str::FromStr;

use crate::version::{ActivityColumns, StatementColumns};

/// Lookup used by the extension gate.
pub const PG_STAT_STATEMENTS: &str = r#"
    SELECT exists(
        SELECT 1
        FROM pg_extension
        WHERE extname = 'pg_stat_statements'
    ) AS available
"#;

pub const VERSION: &str = "SELECT version()";

/// Shortens query text to 40 characters.
const TRUNCATED_QUERY: &str = r#"
    CASE WHEN length(query) < 40
        THEN query
        ELSE substr(query, 0, 38) || '..'
    END
"#;

pub const CACHE_HIT: &str = r#"
    SELECT
        'index hit rate' AS name,
        (sum(idx_blks_hit)) / nullif(sum(idx_blks_hit + idx_blks_read), 0) AS ratio
    FROM pg_statio_user_indexes
    UNION ALL
    SELECT
        'table hit rate' AS name,
        sum(heap_blks_hit) / nullif(sum(heap_blks_hit) + sum(heap_blks_read), 0) AS ratio
    FROM pg_statio_user_tables
"#;

pub const INDEX_USAGE: &str = r#"
    SELECT
        relname,
        CASE idx_scan
            WHEN 0 THEN 'Insufficient data'
            ELSE (100 * idx_scan / (seq_scan + idx_scan))::text
        END percent_of_times_index_used,
        n_live_tup rows_in_table
    FROM pg_stat_user_tables
    ORDER BY n_live_tup DESC
"#;

pub const VACUUM_STATS: &str = r#"
    WITH table_opts AS (
        SELECT
            pg_class.oid,
            relname,
            nspname,
            array_to_string(reloptions, '') AS relopts
        FROM pg_class
            INNER JOIN pg_namespace ns ON relnamespace = ns.oid
    ), vacuum_settings AS (
        SELECT
            oid,
            relname,
            nspname,
            CASE
                WHEN relopts LIKE '%autovacuum_vacuum_threshold%'
                THEN regexp_replace(
                    relopts,
                    '.*autovacuum_vacuum_threshold=([0-9.]+).*',
                    E'\\1'
                )::integer
                ELSE current_setting('autovacuum_vacuum_threshold')::integer
            END AS autovacuum_vacuum_threshold,
            CASE
                WHEN relopts LIKE '%autovacuum_vacuum_scale_factor%'
                THEN regexp_replace(
                    relopts,
                    '.*autovacuum_vacuum_scale_factor=([0-9.]+).*',
                    E'\\1'
                )::real
                ELSE current_setting('autovacuum_vacuum_scale_factor')::real
            END AS autovacuum_vacuum_scale_factor
        FROM table_opts
    )
    SELECT
        vacuum_settings.nspname AS schema,
        vacuum_settings.relname AS table,
        to_char(psut.last_vacuum, 'YYYY-MM-DD HH24:MI') AS last_vacuum,
        to_char(psut.last_autovacuum, 'YYYY-MM-DD HH24:MI') AS last_autovacuum,
        to_char(pg_class.reltuples, '9G999G999G999') AS rowcount,
        to_char(psut.n_dead_tup, '9G999G999G999') AS dead_rowcount,
        to_char(
            autovacuum_vacuum_threshold + (
                autovacuum_vacuum_scale_factor::numeric * pg_class.reltuples),
            '9G999G999G999'
        ) AS autovacuum_threshold,
        CASE
            WHEN autovacuum_vacuum_threshold + (
                autovacuum_vacuum_scale_factor::numeric * pg_class.reltuples
            ) < psut.n_dead_tup
            THEN 'yes'
        END AS expect_autovacuum
    FROM pg_stat_user_tables psut
        INNER JOIN pg_class ON psut.relid = pg_class.oid
        INNER JOIN vacuum_settings ON pg_class.oid = vacuum_settings.oid
    ORDER BY 1
"#;

pub const BLOAT: &str = r#"
    WITH constants AS (
        SELECT
            current_setting('block_size')::numeric AS bs,
            23 AS hdr,
            4 AS ma
    ), bloat_info AS (
        SELECT
            ma,
            bs,
            schemaname,
            tablename,
            (datawidth + (hdr + ma - (CASE WHEN hdr % ma = 0 THEN ma ELSE hdr % ma END)))::numeric
                AS datahdr,
            (maxfracsum * (
                nullhdr + ma - (CASE WHEN nullhdr % ma = 0 THEN ma ELSE nullhdr % ma END)
            )) AS nullhdr2
        FROM (
            SELECT
                schemaname,
                tablename,
                hdr,
                ma,
                bs,
                SUM((1 - null_frac) * avg_width) AS datawidth,
                MAX(null_frac) AS maxfracsum,
                hdr + (
                    SELECT 1 + count(*) / 8
                    FROM pg_stats s2
                    WHERE
                        null_frac <> 0
                        AND s2.schemaname = s.schemaname
                        AND s2.tablename = s.tablename
                ) AS nullhdr
            FROM pg_stats s, constants
            GROUP BY 1, 2, 3, 4, 5
        ) AS foo
    ), table_bloat AS (
        SELECT
            schemaname,
            tablename,
            cc.relpages,
            bs,
            CEIL(
                (cc.reltuples * (
                    (datahdr + ma - (CASE WHEN datahdr % ma = 0 THEN ma ELSE datahdr % ma END))
                    + nullhdr2 + 4
                )) / (bs - 20::float)
            ) AS otta
        FROM bloat_info
            JOIN pg_class cc ON cc.relname = bloat_info.tablename
            JOIN pg_namespace nn ON cc.relnamespace = nn.oid
                AND nn.nspname = bloat_info.schemaname
                AND nn.nspname <> 'information_schema'
    ), index_bloat AS (
        SELECT
            schemaname,
            tablename,
            bs,
            COALESCE(c2.relname, '?') AS iname,
            COALESCE(c2.reltuples, 0) AS ituples,
            COALESCE(c2.relpages, 0) AS ipages,
            COALESCE(CEIL((c2.reltuples * (datahdr - 12)) / (bs - 20::float)), 0) AS iotta
        FROM bloat_info
            JOIN pg_class cc ON cc.relname = bloat_info.tablename
            JOIN pg_namespace nn ON cc.relnamespace = nn.oid
                AND nn.nspname = bloat_info.schemaname
                AND nn.nspname <> 'information_schema'
            JOIN pg_index i ON indrelid = cc.oid
            JOIN pg_class c2 ON c2.oid = i.indexrelid
    )
    SELECT
        type,
        schemaname,
        object_name,
        bloat,
        pg_size_pretty(raw_waste) AS waste
    FROM (
        SELECT
            'table' AS type,
            schemaname,
            tablename AS object_name,
            ROUND(
                CASE WHEN otta = 0 THEN 0.0 ELSE table_bloat.relpages / otta::numeric END,
                1
            ) AS bloat,
            CASE
                WHEN relpages < otta THEN '0'
                ELSE (bs * (table_bloat.relpages - otta)::bigint)::bigint
            END AS raw_waste
        FROM table_bloat
        UNION
        SELECT
            'index' AS type,
            schemaname,
            tablename || '::' || iname AS object_name,
            ROUND(
                CASE WHEN iotta = 0 OR ipages = 0 THEN 0.0 ELSE ipages / iotta::numeric END,
                1
            ) AS bloat,
            CASE
                WHEN ipages < iotta THEN '0'
                ELSE (bs * (ipages - iotta))::bigint
            END AS raw_waste
        FROM index_bloat
    ) bloat_summary
    ORDER BY raw_waste DESC, bloat DESC
"#;

pub const SEQ_SCANS: &str = r#"
    SELECT
        relname AS name,
        seq_scan AS count
    FROM pg_stat_user_tables
    ORDER BY seq_scan DESC
"#;

/// Indexes with fewer than 50 scans on tables larger than 5 pages.
///
/// Tiny tables are skipped: the planner picks a sequential scan for them
/// almost every time, which says nothing about the index.
pub const UNUSED_INDEXES: &str = r#"
    SELECT
        schemaname || '.' || relname AS table,
        indexrelname AS index,
        pg_size_pretty(pg_relation_size(i.indexrelid)) AS index_size,
        idx_scan AS index_scans
    FROM pg_stat_user_indexes ui
        JOIN pg_index i ON ui.indexrelid = i.indexrelid
    WHERE
        NOT indisunique AND idx_scan < 50
        AND pg_relation_size(relid) > 5 * 8192
    ORDER BY
        pg_relation_size(i.indexrelid) / nullif(idx_scan, 0) DESC NULLS FIRST,
        pg_relation_size(i.indexrelid) DESC
"#;

pub const TOTAL_TABLE_SIZE: &str = r#"
    SELECT
        c.relname AS name,
        pg_size_pretty(pg_total_relation_size(c.oid)) AS size
    FROM pg_class c
        LEFT JOIN pg_namespace n ON (n.oid = c.relnamespace)
    WHERE
        n.nspname NOT IN ('pg_catalog', 'information_schema')
        AND n.nspname !~ '^pg_toast'
        AND c.relkind = 'r'
    ORDER BY pg_total_relation_size(c.oid) DESC
"#;

pub const TOTAL_INDEXES_SIZE: &str = r#"
    SELECT
        c.relname AS table,
        pg_size_pretty(pg_indexes_size(c.oid)) AS index_size
    FROM pg_class c
        LEFT JOIN pg_namespace n ON (n.oid = c.relnamespace)
    WHERE
        n.nspname NOT IN ('pg_catalog', 'information_schema')
        AND n.nspname !~ '^pg_toast'
        AND c.relkind = 'r'
    ORDER BY pg_indexes_size(c.oid) DESC
"#;

pub const TABLE_SIZE: &str = r#"
    SELECT
        c.relname AS name,
        pg_size_pretty(pg_table_size(c.oid)) AS size
    FROM pg_class c
        LEFT JOIN pg_namespace n ON (n.oid = c.relnamespace)
    WHERE
        n.nspname NOT IN ('pg_catalog', 'information_schema')
        AND n.nspname !~ '^pg_toast'
        AND c.relkind = 'r'
    ORDER BY pg_table_size(c.oid) DESC
"#;

pub const INDEX_SIZE: &str = r#"
    SELECT
        c.relname AS name,
        pg_size_pretty(sum(c.relpages::bigint * 8192)::bigint) AS size
    FROM pg_class c
        LEFT JOIN pg_namespace n ON (n.oid = c.relnamespace)
    WHERE
        n.nspname NOT IN ('pg_catalog', 'information_schema')
        AND n.nspname !~ '^pg_toast'
        AND c.relkind = 'i'
    GROUP BY c.relname
    ORDER BY sum(c.relpages) DESC
"#;

pub const TOTAL_INDEX_SIZE: &str = r#"
    SELECT pg_size_pretty(sum(c.relpages::bigint * 8192)::bigint) AS size
    FROM pg_class c
        LEFT JOIN pg_namespace n ON (n.oid = c.relnamespace)
    WHERE
        n.nspname NOT IN ('pg_catalog', 'information_schema')
        AND n.nspname !~ '^pg_toast'
        AND c.relkind = 'i'
"#;

pub const TABLE_INDEXES_SIZE: &str = r#"
    SELECT
        c.relname AS table,
        pg_size_pretty(pg_indexes_size(c.oid)) AS index_size
    FROM pg_class c
        LEFT JOIN pg_namespace n ON (n.oid = c.relnamespace)
    WHERE
        n.nspname NOT IN ('pg_catalog', 'information_schema')
        AND n.nspname !~ '^pg_toast'
        AND c.relkind = 'r'
    ORDER BY pg_indexes_size(c.oid) DESC
"#;

pub const MANDELBROT: &str = r#"
    WITH RECURSIVE z(ix, iy, cx, cy, x, y, i) AS (
        SELECT ix, iy, x::float, y::float, x::float, y::float, 0
        FROM
            (SELECT -2.2 + 0.031 * i, i FROM generate_series(0, 101) AS i) AS xgen(x, ix),
            (SELECT -1.5 + 0.031 * i, i FROM generate_series(0, 101) AS i) AS ygen(y, iy)
        UNION ALL
        SELECT ix, iy, cx, cy, x * x - y * y + cx AS x, y * x * 2 + cy, i + 1
        FROM z
        WHERE x * x + y * y < 16::float AND i < 100
    )
    SELECT array_to_string(
        array_agg(substring(' .,,,-----++++%%%%@@@@#### ', least(greatest(i, 1), 27), 1)),
        ''
    ) AS line
    FROM (
        SELECT ix, iy, max(i) AS i
        FROM z
        GROUP BY iy, ix
        ORDER BY iy, ix
    ) AS zt
    GROUP BY iy
    ORDER BY iy
"#;

/// Builds the top-10 by call count query for `pg_stat_statements`.
pub fn build_calls_query(columns: StatementColumns, truncate: bool) -> String {
    let StatementColumns {
        total_time,
        io_time,
    } = columns;
    let select = if truncate {
        format!("{TRUNCATED_QUERY} AS qry")
    } else {
        "query".to_string()
    };

    format!(
        r#"
            SELECT
                {select},
                interval '1 millisecond' * {total_time} AS exec_time,
                to_char(
                    ({total_time} / nullif(sum({total_time}) OVER (), 0)) * 100,
                    'FM90D0'
                ) || '%' AS prop_exec_time,
                to_char(calls, 'FM999G999G990') AS ncalls,
                interval '1 millisecond' * {io_time} AS sync_io_time
            FROM pg_stat_statements
            WHERE userid = (
                SELECT usesysid
                FROM pg_user
                WHERE usename = current_user
                LIMIT 1
            )
            ORDER BY calls DESC
            LIMIT 10
        "#
    )
}

/// Builds the top-10 by aggregate execution time query for `pg_stat_statements`.
pub fn build_outliers_query(columns: StatementColumns, truncate: bool) -> String {
    let StatementColumns {
        total_time,
        io_time,
    } = columns;
    let query = if truncate { TRUNCATED_QUERY } else { "query" };

    format!(
        r#"
            SELECT
                {query} AS qry,
                interval '1 millisecond' * {total_time} AS exec_time,
                to_char(
                    ({total_time} / nullif(sum({total_time}) OVER (), 0)) * 100,
                    'FM90D0'
                ) || '%' AS prop_exec_time,
                to_char(calls, 'FM999G999G990') AS ncalls,
                interval '1 millisecond' * {io_time} AS sync_io_time
            FROM pg_stat_statements
            WHERE userid = (
                SELECT usesysid
                FROM pg_user
                WHERE usename = current_user
                LIMIT 1
            )
            ORDER BY {total_time} DESC
            LIMIT 10
        "#
    )
}

/// Builds the query listing statements waiting on locks held by others.
pub fn build_blocking_query(columns: ActivityColumns) -> String {
    let ActivityColumns { pid, query, .. } = columns;

    format!(
        r#"
            SELECT
                bl.pid AS blocked_pid,
                ka.{query} AS blocking_statement,
                now() - ka.query_start AS blocking_duration,
                kl.pid AS blocking_pid,
                a.{query} AS blocked_statement,
                now() - a.query_start AS blocked_duration
            FROM pg_catalog.pg_locks bl
                JOIN pg_catalog.pg_stat_activity a ON bl.pid = a.{pid}
                JOIN pg_catalog.pg_locks kl
                    JOIN pg_catalog.pg_stat_activity ka ON kl.pid = ka.{pid}
                ON bl.transactionid = kl.transactionid AND bl.pid != kl.pid
            WHERE NOT bl.granted
        "#
    )
}

/// Builds the query listing exclusive locks held by other backends.
pub fn build_locks_query(columns: ActivityColumns) -> String {
    let ActivityColumns { pid, query, .. } = columns;

    format!(
        r#"
            SELECT
                pg_stat_activity.{pid},
                pg_class.relname,
                pg_locks.transactionid,
                pg_locks.granted,
                substr(pg_stat_activity.{query}, 1, 30) AS query_snippet,
                age(now(), pg_stat_activity.query_start) AS "age"
            FROM pg_stat_activity,
                pg_locks LEFT OUTER JOIN pg_class ON (pg_locks.relation = pg_class.oid)
            WHERE
                pg_stat_activity.{query} <> '<insufficient privilege>'
                AND pg_locks.pid = pg_stat_activity.{pid}
                AND pg_locks.mode = 'ExclusiveLock'
                AND pg_stat_activity.{pid} <> pg_backend_pid()
            ORDER BY query_start
        "#
    )
}

/// Builds the query listing non-idle statements running longer than five minutes.
pub fn build_long_running_queries_query(columns: ActivityColumns) -> String {
    let ActivityColumns {
        pid,
        query,
        idle_filter,
        ..
    } = columns;

    format!(
        r#"
            SELECT
                {pid},
                now() - pg_stat_activity.query_start AS duration,
                {query} AS query
            FROM pg_stat_activity
            WHERE
                pg_stat_activity.{query} <> ''::text
                {idle_filter}
                AND now() - pg_stat_activity.query_start > interval '5 minutes'
            ORDER BY now() - pg_stat_activity.query_start DESC
        "#
    )
}

/// Builds the snapshot of non-idle backends other than our own.
pub fn build_ps_query(columns: ActivityColumns) -> String {
    let ActivityColumns {
        pid,
        query,
        idle_filter,
        waiting,
    } = columns;

    format!(
        r#"
            SELECT
                {pid},
                application_name AS source,
                age(now(), query_start) AS running_for,
                {waiting},
                {query} AS query
            FROM pg_stat_activity
            WHERE
                {query} <> '<insufficient privilege>'
                AND {pid} <> pg_backend_pid()
                {idle_filter}
            ORDER BY query_start DESC
        "#
    )
}

/// Every entry of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Report {
    Bloat,
    Blocking,
    CacheHit,
    Calls,
    IndexSize,
    IndexUsage,
    Locks,
    LongRunningQueries,
    Mandelbrot,
    Outliers,
    Ps,
    SeqScans,
    TableIndexesSize,
    TableSize,
    TotalIndexSize,
    TotalIndexesSize,
    TotalTableSize,
    UnusedIndexes,
    VacuumStats,
    Version,
}

impl Report {
    pub const ALL: [Report; 20] = [
        Report::Bloat,
        Report::Blocking,
        Report::CacheHit,
        Report::Calls,
        Report::IndexSize,
        Report::IndexUsage,
        Report::Locks,
        Report::LongRunningQueries,
        Report::Mandelbrot,
        Report::Outliers,
        Report::Ps,
        Report::SeqScans,
        Report::TableIndexesSize,
        Report::TableSize,
        Report::TotalIndexSize,
        Report::TotalIndexesSize,
        Report::TotalTableSize,
        Report::UnusedIndexes,
        Report::VacuumStats,
        Report::Version,
    ];

    /// Stable kebab-case identifier.
    pub fn name(self) -> &'static str {
        match self {
            Report::Bloat => "bloat",
            Report::Blocking => "blocking",
            Report::CacheHit => "cache-hit",
            Report::Calls => "calls",
            Report::IndexSize => "index-size",
            Report::IndexUsage => "index-usage",
            Report::Locks => "locks",
            Report::LongRunningQueries => "long-running-queries",
            Report::Mandelbrot => "mandelbrot",
            Report::Outliers => "outliers",
            Report::Ps => "ps",
            Report::SeqScans => "seq-scans",
            Report::TableIndexesSize => "table-indexes-size",
            Report::TableSize => "table-size",
            Report::TotalIndexSize => "total-index-size",
            Report::TotalIndexesSize => "total-indexes-size",
            Report::TotalTableSize => "total-table-size",
            Report::UnusedIndexes => "unused-indexes",
            Report::VacuumStats => "vacuum-stats",
            Report::Version => "version",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Report::Bloat => "table and index bloat, most wasteful first",
            Report::Blocking => "statements holding locks that others are waiting on",
            Report::CacheHit => "index and table cache hit rates (healthy is 99% and up)",
            Report::Calls => "10 most frequently called statements",
            Report::IndexSize => "size of each index, largest first",
            Report::IndexUsage => "how often each table is read through an index",
            Report::Locks => "statements holding exclusive locks",
            Report::LongRunningQueries => "statements running longer than five minutes",
            Report::Mandelbrot => "the Mandelbrot set",
            Report::Outliers => "10 statements with the longest aggregate execution time",
            Report::Ps => "active statements of other backends",
            Report::SeqScans => "sequential scan count per table",
            Report::TableIndexesSize => "total size of the indexes of each table",
            Report::TableSize => "size of each table excluding indexes",
            Report::TotalIndexSize => "total size of all indexes",
            Report::TotalIndexesSize => "total size of the indexes of each table",
            Report::TotalTableSize => "size of each table including indexes",
            Report::UnusedIndexes => "rarely scanned indexes, ordered by size per scan",
            Report::VacuumStats => "dead rows and whether autovacuum is expected to run",
            Report::Version => "server version banner",
        }
    }

    pub fn requires_pg_stat_statements(self) -> bool {
        matches!(self, Report::Calls | Report::Outliers)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned by [`Report::from_str`] for a name outside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown report {0:?}")]
pub struct UnknownReport(pub String);

impl FromStr for Report {
    type Err = UnknownReport;

    /// Accepts the kebab-case name or its snake_case spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Report::ALL
            .into_iter()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| UnknownReport(s.to_string()))
    }
}

/// Knobs accepted by [`PgExtras::run`](crate::PgExtras::run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Shorten query text to 40 characters in `calls` and `outliers`.
    pub truncate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::collapse_whitespace;
    use crate::version::ServerVersion;

    fn activity(major: u32, minor: u32) -> ActivityColumns {
        ActivityColumns::for_version(ServerVersion::new(major, minor, 0))
    }

    fn statements(major: u32) -> StatementColumns {
        StatementColumns::for_version(ServerVersion::new(major, 0, 0))
    }

    #[test]
    fn activity_queries_use_modern_columns() {
        let ps = collapse_whitespace(&build_ps_query(activity(16, 2)));
        assert!(ps.starts_with("SELECT pid, application_name AS source"));
        assert!(ps.contains("wait_event IS NOT NULL AS waiting"));
        assert!(ps.contains("AND state <> 'idle'"));
        assert!(!ps.contains("procpid"));

        let locks = collapse_whitespace(&build_locks_query(activity(16, 2)));
        assert!(locks.contains("substr(pg_stat_activity.query, 1, 30) AS query_snippet"));
        assert!(locks.contains("pg_stat_activity.pid <> pg_backend_pid()"));
    }

    #[test]
    fn activity_queries_use_legacy_columns() {
        let ps = collapse_whitespace(&build_ps_query(activity(9, 1)));
        assert!(ps.starts_with("SELECT procpid,"));
        assert!(ps.contains("waiting, current_query AS query"));
        assert!(ps.contains("AND current_query <> '<IDLE>'"));

        let blocking = collapse_whitespace(&build_blocking_query(activity(9, 1)));
        assert!(blocking.contains("ka.current_query AS blocking_statement"));
        assert!(blocking.contains("ON bl.pid = a.procpid"));
        assert!(blocking.contains("ON kl.pid = ka.procpid"));

        let long = collapse_whitespace(&build_long_running_queries_query(activity(9, 1)));
        assert!(
            long.starts_with("SELECT procpid, now() - pg_stat_activity.query_start AS duration")
        );
    }

    #[test]
    fn no_placeholder_survives_rendering() {
        let rendered = [
            build_ps_query(activity(9, 1)),
            build_ps_query(activity(17, 0)),
            build_locks_query(activity(9, 4)),
            build_blocking_query(activity(12, 0)),
            build_long_running_queries_query(activity(15, 0)),
            build_calls_query(statements(12), true),
            build_calls_query(statements(17), false),
            build_outliers_query(statements(13), true),
            build_outliers_query(statements(11), false),
        ];
        for sql in rendered {
            assert!(!sql.contains('{') && !sql.contains('}'), "unrendered template: {sql}");
        }
    }

    #[test]
    fn outliers_truncation_wraps_query_text() {
        let plain = collapse_whitespace(&build_outliers_query(statements(16), false));
        assert!(plain.starts_with("SELECT query AS qry,"));
        assert!(plain.contains("ORDER BY total_exec_time DESC LIMIT 10"));

        let short = collapse_whitespace(&build_outliers_query(statements(16), true));
        assert!(short.starts_with(
            "SELECT CASE WHEN length(query) < 40 THEN query \
             ELSE substr(query, 0, 38) || '..' END AS qry,"
        ));
    }

    #[test]
    fn calls_selects_query_unless_truncated() {
        let plain = collapse_whitespace(&build_calls_query(statements(12), false));
        assert!(
            plain.starts_with("SELECT query, interval '1 millisecond' * total_time AS exec_time")
        );
        assert!(plain.contains("ORDER BY calls DESC LIMIT 10"));

        let short = collapse_whitespace(&build_calls_query(statements(12), true));
        assert!(short.contains("END AS qry, interval"));
    }

    #[test]
    fn statements_queries_follow_io_rename() {
        let v16 = collapse_whitespace(&build_calls_query(statements(16), false));
        assert!(v16.contains("(blk_read_time + blk_write_time) AS sync_io_time"));

        let v17 = collapse_whitespace(&build_outliers_query(statements(17), false));
        assert!(v17.contains("(shared_blk_read_time + shared_blk_write_time) AS sync_io_time"));
    }

    #[test]
    fn exec_time_share_survives_an_all_zero_window() {
        for sql in [
            build_calls_query(statements(16), false),
            build_outliers_query(statements(16), true),
        ] {
            let sql = collapse_whitespace(&sql);
            assert!(sql.contains("(total_exec_time / nullif(sum(total_exec_time) OVER (), 0))"));
            assert!(!sql.contains("/ sum("));
        }
        let legacy = collapse_whitespace(&build_calls_query(statements(12), false));
        assert!(legacy.contains("nullif(sum(total_time) OVER (), 0)"));
    }

    #[test]
    fn cache_hit_lists_index_before_table() {
        let sql = collapse_whitespace(CACHE_HIT);
        let index = sql.find("'index hit rate'").unwrap();
        let table = sql.find("'table hit rate'").unwrap();
        assert!(index < table);
        assert!(sql.contains("UNION ALL"));
    }

    #[test]
    fn report_names_round_trip() {
        for report in Report::ALL {
            assert_eq!(report.name().parse::<Report>(), Ok(report));
            assert_eq!(report.to_string(), report.name());
            assert!(!report.description().is_empty());
        }
        assert_eq!("cache_hit".parse::<Report>(), Ok(Report::CacheHit));
        assert_eq!(" Outliers ".parse::<Report>(), Ok(Report::Outliers));
        assert_eq!(
            "mandelbrot-zoom".parse::<Report>(),
            Err(UnknownReport("mandelbrot-zoom".to_string()))
        );
    }

    #[test]
    fn only_statement_reports_need_extension() {
        let gated: Vec<Report> = Report::ALL
            .into_iter()
            .filter(|r| r.requires_pg_stat_statements())
            .collect();
        assert_eq!(gated, vec![Report::Calls, Report::Outliers]);
    }
}
