use featurebase_http::{BatchOptions, ConnectionConfig, FeatureBaseClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let db = FeatureBaseClient::new(ConnectionConfig::from_env())?;

    let setup = db
        .query_batch(
            [
                "CREATE TABLE IF NOT EXISTS batch_users (_id ID, name STRING)",
                "INSERT INTO batch_users (_id, name) VALUES (1, 'Alice')",
                "INSERT INTO batch_users (_id, name) VALUES (2, 'Bob')",
            ],
            BatchOptions::sequential().stop_on_error(true),
        )
        .await;

    for result in &setup {
        match &result.error_message {
            None => println!("ok: {} ({} us)", result.sql, result.execution_time_us),
            Some(message) => eprintln!("failed: {} => {message}", result.sql),
        }
    }

    let reads = db
        .query_batch(
            [
                "SELECT * FROM batch_users",
                "SELECT COUNT(*) FROM batch_users",
            ],
            BatchOptions::concurrent(),
        )
        .await;

    for result in reads {
        println!("{}: {} row(s)", result.sql, result.row_count());
    }

    Ok(())
}
