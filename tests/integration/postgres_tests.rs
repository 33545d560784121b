//! Integration tests for the browser service against a live PostgreSQL
//!
//! These tests require the test PostgreSQL database to be running.
//! Each test creates its own uniquely named tables and drops them afterwards.

use crate::common::{Fixture, test_config};
use sherlock::DbError;
use sherlock::config::Settings;
use sherlock::db::{CellValue, Database, DataRequest, PostgresProvider, SortDirection};
use sherlock::service::BrowserService;

#[tokio::test]
async fn test_connect_and_close() {
    let config = test_config();
    let provider = match PostgresProvider::connect(&config, &Settings::default()).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!(
                "Skipping test: Database not available at {}:{} - {}",
                config.host, config.port, e
            );
            return;
        }
    };
    assert!(provider.list_tables().await.is_ok());
    provider.close();
}

#[tokio::test]
async fn test_connect_wrong_port_fails() {
    let mut config = test_config();
    config.port = 1;
    let settings = Settings {
        connect_timeout_secs: 2,
        ..Settings::default()
    };
    let result = PostgresProvider::connect(&config, &settings).await;
    assert!(matches!(
        result,
        Err(DbError::ConnectionFailed(_)) | Err(DbError::Timeout)
    ));
}

#[tokio::test]
async fn test_users_page_count_and_structure() {
    let Some(fx) = Fixture::new("users").await else {
        return;
    };
    fx.exec(&format!(
        "CREATE TABLE {t} (id integer PRIMARY KEY, name text NOT NULL, created_at timestamptz);
         INSERT INTO {t} VALUES (1, 'alice', '2024-01-01 00:00:00+00');",
        t = fx.table
    ))
    .await;

    let rows = fx
        .service
        .list_data(&fx.table, "", "", 0)
        .await
        .expect("list_data failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "1");
    assert_eq!(rows[0]["name"], "alice");
    assert_eq!(rows[0]["created_at"], "2024-01-01T00:00:00Z");

    assert_eq!(fx.service.list_count(&fx.table).await.unwrap(), 1);

    let tables = fx.service.list_table().await.unwrap();
    assert!(tables.contains(&fx.table));

    let structure = fx.service.list_structure(&fx.table).await.unwrap();
    let names: Vec<&str> = structure.iter().map(|c| c["column_name"].as_str()).collect();
    assert_eq!(names, vec!["id", "name", "created_at"]);
    assert_eq!(structure[0]["data_type"], "integer");
    assert_eq!(structure[0]["nullable"], "NO");
    assert_eq!(structure[2]["nullable"], "YES");
    assert_eq!(structure[2]["column_default"], "");

    fx.teardown().await;
}

#[tokio::test]
async fn test_null_and_type_rendering() {
    let Some(fx) = Fixture::new("types").await else {
        return;
    };
    fx.exec(&format!(
        "CREATE TABLE {t} (
            id bigint,
            price numeric(10,2),
            ratio double precision,
            flag boolean,
            tags text[],
            doc jsonb,
            note text
         );
         INSERT INTO {t} VALUES
            (7, 12.50, 0.5, true, ARRAY['a','b'], '{{\"k\": 1}}', NULL);",
        t = fx.table
    ))
    .await;

    let rows = fx.service.list_data(&fx.table, "", "", 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["id"], "7");
    assert_eq!(row["price"], "12.50");
    assert_eq!(row["ratio"], "0.5");
    assert_eq!(row["flag"], "true");
    assert_eq!(row["tags"], "{a,b}");
    assert_eq!(row["doc"], "{\"k\": 1}");
    assert_eq!(row["note"], "NULL");

    fx.teardown().await;
}

#[tokio::test]
async fn test_values_without_a_rust_form_keep_server_text() {
    let Some(fx) = Fixture::new("special").await else {
        return;
    };
    fx.exec(&format!(
        "CREATE TABLE {t} (
            n numeric,
            big numeric,
            ts timestamptz,
            ts_plain timestamp,
            f double precision,
            r real
         );
         INSERT INTO {t} VALUES
            ('NaN', 123456789012345678901234567890123, 'infinity', '-infinity',
             'Infinity', '-Infinity');",
        t = fx.table
    ))
    .await;

    let rows = fx.service.list_data(&fx.table, "", "", 0).await.unwrap();
    let row = &rows[0];
    assert_eq!(row["n"], "NaN");
    assert_eq!(row["big"], "123456789012345678901234567890123");
    assert_eq!(row["ts"], "infinity");
    assert_eq!(row["ts_plain"], "-infinity");
    assert_eq!(row["f"], "Infinity");
    assert_eq!(row["r"], "-Infinity");

    let page = fx
        .service
        .fetch_page(&DataRequest::new(fx.table.clone(), 10))
        .await
        .unwrap();
    let cells = &page.rows[0].values;
    assert!(matches!(cells[0], CellValue::Number(_)));
    assert!(matches!(cells[2], CellValue::Timestamp(_)));

    fx.teardown().await;
}

#[tokio::test]
async fn test_numeric_sort_uses_column_type() {
    let Some(fx) = Fixture::new("numsort").await else {
        return;
    };
    fx.exec(&format!(
        "CREATE TABLE {t} (id integer, seen_at timestamp);
         INSERT INTO {t} VALUES
            (10, '2024-01-03 00:00:00'), (9, '2024-01-01 00:00:00'), (2, '2023-12-31 23:59:59');",
        t = fx.table
    ))
    .await;

    let rows = fx.service.list_data(&fx.table, "id", "asc", 0).await.unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str()).collect();
    assert_eq!(ids, vec!["2", "9", "10"]);

    let rows = fx.service.list_data(&fx.table, "seen_at", "desc", 0).await.unwrap();
    assert_eq!(rows[0]["seen_at"], "2024-01-03T00:00:00Z");
    assert_eq!(rows[2]["seen_at"], "2023-12-31T23:59:59Z");

    fx.teardown().await;
}

#[tokio::test]
async fn test_dotted_table_name_round_trips() {
    let Some(fx) = Fixture::new("dotted").await else {
        return;
    };
    let name = format!("{}.v2", fx.table);
    fx.exec(&format!(
        "CREATE TABLE \"{n}\" (id integer);
         INSERT INTO \"{n}\" VALUES (1);",
        n = name
    ))
    .await;

    let listed = format!("\"{}\"", name);
    let tables = fx.service.list_table().await.unwrap();
    assert!(tables.contains(&listed), "{listed} not in {tables:?}");

    assert_eq!(fx.service.list_count(&listed).await.unwrap(), 1);
    assert_eq!(fx.service.list_data(&listed, "id", "asc", 0).await.unwrap().len(), 1);
    assert_eq!(fx.service.list_structure(&listed).await.unwrap().len(), 1);

    // Typed without quotes, it still resolves once no such schema exists
    assert_eq!(fx.service.list_count(&name).await.unwrap(), 1);

    fx.exec(&format!("DROP TABLE \"{}\"", name)).await;
    fx.teardown().await;
}

#[tokio::test]
async fn test_pagination_covers_every_row_once() {
    let Some(fx) = Fixture::new("paged").await else {
        return;
    };
    fx.exec(&format!(
        "CREATE TABLE {t} (id integer);
         INSERT INTO {t} SELECT generate_series(1, 120);",
        t = fx.table
    ))
    .await;

    let mut seen = Vec::new();
    for offset in [0u64, 50, 100, 150] {
        let rows = fx
            .service
            .list_data(&fx.table, "id", "asc", offset)
            .await
            .unwrap();
        seen.extend(rows.iter().map(|r| r["id"].parse::<i32>().unwrap()));
    }
    assert_eq!(seen, (1..=120).collect::<Vec<_>>());

    let tail = fx
        .service
        .list_data(&fx.table, "id", "desc", 0)
        .await
        .unwrap();
    assert_eq!(tail[0]["id"], "120");
    assert_eq!(tail.len(), 50);

    fx.teardown().await;
}

#[tokio::test]
async fn test_sort_by_text_column() {
    let Some(fx) = Fixture::new("sorted").await else {
        return;
    };
    fx.exec(&format!(
        "CREATE TABLE {t} (id integer, name text);
         INSERT INTO {t} VALUES (1, 'carol'), (2, 'alice'), (3, 'bob');",
        t = fx.table
    ))
    .await;

    let request = DataRequest::new(fx.table.clone(), 10).with_sort("name", SortDirection::Desc);
    let page = fx.service.fetch_page(&request).await.unwrap();
    let names: Vec<&str> = page.rows.iter().map(|r| r.values[1].display()).collect();
    assert_eq!(names, vec!["carol", "bob", "alice"]);

    fx.teardown().await;
}

#[tokio::test]
async fn test_schema_qualified_table() {
    let Some(fx) = Fixture::new("qualified").await else {
        return;
    };
    let schema = format!("{}_s", fx.table);
    fx.exec(&format!(
        "CREATE SCHEMA {s};
         CREATE TABLE {s}.items (id integer);
         INSERT INTO {s}.items VALUES (1), (2);",
        s = schema
    ))
    .await;

    let qualified = format!("{}.items", schema);
    let tables = fx.service.list_table().await.unwrap();
    assert!(tables.contains(&qualified));
    assert_eq!(fx.service.list_count(&qualified).await.unwrap(), 2);

    fx.exec(&format!("DROP SCHEMA {} CASCADE", schema)).await;
    fx.teardown().await;
}

#[tokio::test]
async fn test_unknown_names_are_rejected() {
    let Some(fx) = Fixture::new("known").await else {
        return;
    };
    fx.exec(&format!("CREATE TABLE {} (id integer)", fx.table))
        .await;

    let err = fx
        .service
        .list_data("no_such_table_anywhere", "", "", 0)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UnknownTable(_)));

    let err = fx
        .service
        .list_data(&fx.table, "id; DROP TABLE x", "asc", 0)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UnknownColumn { .. }));

    let err = fx
        .service
        .list_data(&fx.table, "id", "sideways", 0)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidArgument(_)));

    let err = fx.service.list_count("\"; SELECT 1; --").await.unwrap_err();
    assert!(matches!(err, DbError::InvalidArgument(_)));

    let err = fx.service.list_count("x\"; SELECT 1; --").await.unwrap_err();
    assert!(matches!(err, DbError::UnknownTable(_)));

    fx.teardown().await;
}

#[tokio::test]
async fn test_empty_table() {
    let Some(fx) = Fixture::new("empty").await else {
        return;
    };
    fx.exec(&format!("CREATE TABLE {} (id integer)", fx.table))
        .await;

    let rows = fx.service.list_data(&fx.table, "", "", 0).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(fx.service.list_count(&fx.table).await.unwrap(), 0);

    fx.teardown().await;
}

#[tokio::test]
async fn test_service_connect_by_url() {
    let config = test_config();
    let url = format!(
        "postgres://{}:{}@{}:{}/{}?sslmode=disable",
        config.username,
        config.password.clone().unwrap_or_default(),
        config.host,
        config.port,
        config.database
    );
    let mut service: BrowserService = BrowserService::new(Settings::default());
    if let Err(e) = service.connect(&url).await {
        eprintln!("Skipping test: Database not available - {}", e);
        return;
    }
    assert!(service.is_connected());
    assert!(service.list_table().await.is_ok());
    service.close();
    assert!(matches!(
        service.list_table().await,
        Err(DbError::NotConnected)
    ));
}
