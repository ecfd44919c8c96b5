//! Shared helpers for tests against a real server started with Testcontainers.

use postgres::{Client, NoTls};
use testcontainers::core::IntoContainerPort;
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, ImageExt};
use testcontainers_modules::postgres::Postgres;

/// A PostgreSQL 16 container with `pg_stat_statements` preloaded but not
/// yet created in the database.
///
/// The container is removed when `LiveServer` is dropped.
pub struct LiveServer {
    pub dsn: String,
    _container: Container<Postgres>,
}

impl LiveServer {
    pub fn start() -> Self {
        let container = Postgres::default()
            .with_tag("16-alpine")
            .with_cmd(["-c", "shared_preload_libraries=pg_stat_statements"])
            .start()
            .expect("failed to start postgres container");
        let host = container.get_host().expect("container host");
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .expect("container port");

        Self {
            dsn: format!("host={host} port={port} user=postgres password=postgres dbname=postgres"),
            _container: container,
        }
    }

    /// A driver connection outside any session, for setup statements.
    pub fn admin(&self) -> Client {
        Client::connect(&self.dsn, NoTls).expect("admin connection")
    }
}
