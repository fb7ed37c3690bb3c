#![cfg(feature = "test-utils")]

mod common;

use pg_middleware::prelude::*;
use pg_middleware::test_utils::stop_postgres_embedded;
use pg_middleware::{TxStage, begin};
use tokio::runtime::Runtime;

#[test]
fn test02_transactions_and_bulk_insert() -> Result<(), Box<dyn std::error::Error>> {
    let server = common::start("test02")?;
    let pool = new_pool(&server.config.clone().with_max_connections(4).with_connect_timeout(
        std::time::Duration::from_secs(5),
    ))?;

    let rt = Runtime::new()?;
    rt.block_on(async {
        execute_batch(
            &pool,
            "CREATE TABLE acct (id BIGINT PRIMARY KEY, balance BIGINT NOT NULL);",
        )
        .await?;

        // all statements commit together, in order
        run_statements_in_transaction(
            &pool,
            &[
                QueryAndParams::new(
                    "INSERT INTO acct (id, balance) VALUES ($1, $2)",
                    vec![RowValues::Int(1), RowValues::Int(100)],
                ),
                QueryAndParams::new(
                    "UPDATE acct SET balance = balance * 2 WHERE id = $1",
                    vec![RowValues::Int(1)],
                ),
            ],
        )
        .await?;
        let balance: i64 = query_one(&pool, "SELECT balance FROM acct WHERE id = 1", &[]).await?;
        assert_eq!(balance, 200);

        // a failing statement undoes the earlier ones
        let err = run_statements_in_transaction(
            &pool,
            &[
                QueryAndParams::new(
                    "INSERT INTO acct (id, balance) VALUES ($1, $2)",
                    vec![RowValues::Int(2), RowValues::Int(5)],
                ),
                QueryAndParams::new(
                    "INSERT INTO acct (id, balance) VALUES ($1, $2)",
                    vec![RowValues::Int(1), RowValues::Int(5)],
                ),
            ],
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            PgMiddlewareError::Transaction {
                stage: TxStage::Execute,
                ..
            }
        ));
        let count: i64 = query_one(&pool, "SELECT count(*) FROM acct", &[]).await?;
        assert_eq!(count, 1);

        // manual transaction with logic in between
        {
            let mut client = pool.get().await?;
            let tx = begin(&mut client).await?;
            let ids: Vec<i64> = tx.query_simple("SELECT id FROM acct", &[]).await?;
            for id in ids {
                tx.exec(
                    "UPDATE acct SET balance = balance + 1 WHERE id = $1",
                    &[RowValues::Int(id)],
                )
                .await?;
            }
            tx.rollback().await?;
        }
        let balance: i64 = query_one(&pool, "SELECT balance FROM acct WHERE id = 1", &[]).await?;
        assert_eq!(balance, 200);

        // bulk insert
        execute_batch(&pool, "CREATE TABLE pts (x INT, label TEXT);").await?;
        let rows: Vec<Vec<RowValues>> = (0..25)
            .map(|i| vec![RowValues::Int(i), RowValues::Text(format!("p{i}"))])
            .collect();
        bulk_insert(&pool, "pts", &["x", "label"], &rows).await?;
        let total: i64 = query_one(&pool, "SELECT count(*) FROM pts", &[]).await?;
        assert_eq!(total, 25);

        let err = bulk_insert::<&str>(&pool, "pts", &["x", "label"], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, PgMiddlewareError::InvalidInput(_)));

        let err = bulk_insert(&pool, "pts", &["x"], &[vec![RowValues::Int(1), RowValues::Int(2)]])
            .await
            .unwrap_err();
        assert!(matches!(err, PgMiddlewareError::ExecutionError(_)));

        // pagination and CTE
        let page: Vec<i32> = query_with_pagination(
            &pool,
            "SELECT x FROM pts WHERE x >= $1 ORDER BY x",
            5,
            10,
            &[RowValues::Int(3)],
        )
        .await?;
        assert_eq!(page, vec![13, 14, 15, 16, 17]);

        let labels: Vec<String> = query_with_cte(
            &pool,
            "small AS (SELECT x, label FROM pts WHERE x < $1)",
            "SELECT label FROM small ORDER BY x",
            &[RowValues::Int(3)],
        )
        .await?;
        assert_eq!(labels, vec!["p0", "p1", "p2"]);

        let err = query_with_cte::<String>(&pool, "broken AS (", "SELECT 1", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, PgMiddlewareError::Postgres(_)));

        Ok::<(), PgMiddlewareError>(())
    })?;

    close(Some(&pool));
    stop_postgres_embedded(server);
    Ok(())
}
