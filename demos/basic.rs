use featurebase_http::{ConnectionConfig, FeatureBaseClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let db = FeatureBaseClient::new(ConnectionConfig::from_env())?;

    let created = db
        .query("CREATE TABLE IF NOT EXISTS users (_id ID, name STRING)")
        .await;
    if !created.ok {
        anyhow::bail!("create failed: {:?}", created.error_message);
    }

    db.query("INSERT INTO users (_id, name) VALUES (1, 'Kit')").await;

    let result = db.query("SELECT _id, name FROM users").await;
    if !result.ok {
        anyhow::bail!("select failed: {:?}", result.error_message);
    }

    for row in result.rows() {
        println!("{:?} {:?}", row.get("_id"), row.get_text("name"));
    }

    Ok(())
}
