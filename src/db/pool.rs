//! Connection pool
//!
//! A bounded bb8 pool over tokio-postgres. One TLS-capable manager covers
//! every SSL mode: with `sslmode=disable` the driver never starts TLS.

use crate::config::{ConnectionConfig, Settings};
use crate::error::{DbError, DbResult};
use bb8::{Pool, PooledConnection, RunError};
use bb8_postgres::PostgresConnectionManager;
use tokio_postgres_rustls::MakeRustlsConnect;

pub type PgManager = PostgresConnectionManager<MakeRustlsConnect>;
pub type PgPool = Pool<PgManager>;
pub type PgConnection<'a> = PooledConnection<'a, PgManager>;

/// Build the pool and ping the server once.
///
/// Connect failures are reported immediately rather than retried until the
/// connection timeout.
pub async fn connect_pool(config: &ConnectionConfig, settings: &Settings) -> DbResult<PgPool> {
    // bb8 asserts on a zero connection timeout
    settings
        .validate()
        .map_err(|e| DbError::InvalidArgument(e.to_string()))?;

    let tls = MakeRustlsConnect::new(make_tls_config());
    let manager = PostgresConnectionManager::new(config.pg_config(settings.connect_timeout()), tls);

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .connection_timeout(settings.connect_timeout())
        .retry_connection(false)
        .build(manager)
        .await
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

    ping(&pool).await?;
    Ok(pool)
}

/// Liveness check: check out a connection and run `SELECT 1`
pub async fn ping(pool: &PgPool) -> DbResult<()> {
    let conn = checkout(pool).await?;
    conn.simple_query("SELECT 1")
        .await
        .map_err(|e| DbError::ConnectionFailed(format!("no response from database: {}", e)))?;
    Ok(())
}

pub async fn checkout(pool: &PgPool) -> DbResult<PgConnection<'_>> {
    pool.get().await.map_err(|e| match e {
        RunError::User(e) => DbError::ConnectionFailed(e.to_string()),
        RunError::TimedOut => DbError::Timeout,
    })
}

/// Build a rustls ClientConfig that trusts OS certificates (with Mozilla roots as fallback)
fn make_tls_config() -> rustls::ClientConfig {
    let mut root_store = rustls::RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();
    let mut loaded = 0;
    for cert in native_certs.certs {
        if root_store.add(cert).is_ok() {
            loaded += 1;
        }
    }
    if loaded == 0 {
        tracing::debug!("no native root certificates found, using webpki roots");
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}
