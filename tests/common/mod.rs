//! Common test utilities and helpers
//!
//! Shared setup for the integration tests: connection config from the
//! environment, plus a raw client for creating and dropping fixtures.

use sherlock::config::{ConnectionConfig, Settings, SslMode};
use sherlock::service::BrowserService;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_postgres::{Client, NoTls};

static NEXT_ID: AtomicU32 = AtomicU32::new(0);

/// Test database connection config
pub fn test_config() -> ConnectionConfig {
    ConnectionConfig {
        name: "integration-test".to_string(),
        host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: std::env::var("TEST_DB_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5433),
        database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "test_db".to_string()),
        username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "test_user".to_string()),
        password: Some(
            std::env::var("TEST_DB_PASSWORD").unwrap_or_else(|_| "test_password".to_string()),
        ),
        ssl_mode: SslMode::Disable,
    }
}

/// A connected service plus a raw client owning one scratch table name
pub struct Fixture {
    pub service: BrowserService,
    pub table: String,
    client: Client,
}

impl Fixture {
    /// Returns `None` (and logs a skip) when the database is unreachable
    pub async fn new(label: &str) -> Option<Self> {
        let config = test_config();

        let pg = config.pg_config(std::time::Duration::from_secs(5));
        let (client, connection) = match pg.connect(NoTls).await {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!(
                    "Skipping test: Database not available at {}:{} - {}",
                    config.host, config.port, e
                );
                return None;
            }
        };
        tokio::spawn(async move {
            let _ = connection.await;
        });

        let mut service: BrowserService = BrowserService::new(Settings::default());
        if let Err(e) = service.connect_with(&config).await {
            eprintln!("Skipping test: service could not connect - {}", e);
            return None;
        }

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let table = format!(
            "sherlock_{}_{}_{}_{}",
            label,
            std::process::id(),
            nanos,
            NEXT_ID.fetch_add(1, Ordering::Relaxed)
        );

        Some(Self {
            service,
            table,
            client,
        })
    }

    /// Run setup SQL; panics on failure
    pub async fn exec(&self, sql: &str) {
        self.client
            .batch_execute(sql)
            .await
            .unwrap_or_else(|e| panic!("setup failed: {e}\n{sql}"));
    }

    pub async fn teardown(self) {
        let _ = self
            .client
            .batch_execute(&format!("DROP TABLE IF EXISTS {}", self.table))
            .await;
    }
}
