//! `postgres` driver backend.

use std::sync::Arc;

use postgres::{Client, NoTls, SimpleQueryMessage};

use super::{Connection, Connector};
use crate::error::Result;
use crate::record::Record;

/// Connects with [`postgres::Client`] over a plain TCP or Unix socket.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgConnector;

impl PgConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for PgConnector {
    type Connection = PgConnection;

    fn connect(&self, dsn: &str) -> Result<PgConnection> {
        let client = Client::connect(dsn, NoTls)?;
        Ok(PgConnection { client })
    }
}

/// Open driver connection.
pub struct PgConnection {
    client: Client,
}

impl Connection for PgConnection {
    fn simple_query(&mut self, sql: &str) -> Result<Vec<Record>> {
        let messages = self.client.simple_query(sql)?;
        Ok(collect_rows(messages))
    }

    fn close(self) -> Result<()> {
        self.client.close()?;
        Ok(())
    }
}

/// Turns simple query messages into records.
fn collect_rows(messages: Vec<SimpleQueryMessage>) -> Vec<Record> {
    let mut collector = RowCollector::default();
    for message in messages {
        match message {
            SimpleQueryMessage::Row(row) => {
                let values = (0..row.len())
                    .map(|idx| row.get(idx).map(str::to_string))
                    .collect();
                collector.push_row(
                    || row.columns().iter().map(|c| c.name().to_string()).collect(),
                    values,
                );
            }
            SimpleQueryMessage::CommandComplete(_) => collector.end_result_set(),
            _ => {}
        }
    }
    collector.finish()
}

/// Accumulates records across the result sets of one simple query.
///
/// Column names are read once per result set and shared by its rows.
#[derive(Default)]
struct RowCollector {
    records: Vec<Record>,
    columns: Option<Arc<[String]>>,
}

impl RowCollector {
    fn push_row(&mut self, names: impl FnOnce() -> Vec<String>, values: Vec<Option<String>>) {
        let columns = self.columns.get_or_insert_with(|| names().into()).clone();
        self.records.push(Record::new(columns, values));
    }

    fn end_result_set(&mut self) {
        self.columns = None;
    }

    fn finish(self) -> Vec<Record> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn rows_of_one_result_set_share_column_names() {
        let mut collector = RowCollector::default();
        let mut lookups = 0;
        for n in ["1", "2"] {
            collector.push_row(
                || {
                    lookups += 1;
                    names(&["n"])
                },
                vec![Some(n.to_string())],
            );
        }
        let records = collector.finish();

        assert_eq!(lookups, 1);
        assert_eq!(records.len(), 2);
        assert!(std::ptr::eq(records[0].columns(), records[1].columns()));
        assert_eq!(records[1].get("n"), Some("2"));
    }

    #[test]
    fn command_complete_starts_a_new_column_set() {
        let mut collector = RowCollector::default();
        collector.push_row(|| names(&["version"]), vec![Some("PostgreSQL 16.2".to_string())]);
        collector.end_result_set();
        collector.push_row(|| names(&["name", "ratio"]), vec![Some("x".to_string()), None]);
        let records = collector.finish();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("version"), Some("PostgreSQL 16.2"));
        assert!(!records[1].has_column("version"));
        assert_eq!(records[1].get("name"), Some("x"));
        assert_eq!(records[1].value(1), None);
    }

    #[test]
    fn empty_result_yields_no_records() {
        let mut collector = RowCollector::default();
        collector.end_result_set();
        assert!(collector.finish().is_empty());
    }
}
