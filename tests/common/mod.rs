#![allow(dead_code)]

use pg_middleware::test_utils::{EmbeddedPostgres, setup_postgres_embedded};

pub fn start(dbname: &str) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    setup_postgres_embedded(dbname)
}
