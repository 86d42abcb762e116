//! Loads a million generated rows with `BULK INSERT ... WITH INPUT 'INLINE'`.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use featurebase_http::{ConnectionConfig, FeatureBaseClient};

const TOTAL_ROWS: u64 = 1_000_000;
const BATCH_SIZE: u64 = 10_000;

/// Cheap xorshift generator; the data only has to look varied.
struct Letters(u64);

impl Letters {
    fn seeded() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.subsec_nanos())
            .unwrap_or(7);
        Self(u64::from(nanos) | 1)
    }

    fn word(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| {
                self.0 ^= self.0 << 13;
                self.0 ^= self.0 >> 7;
                self.0 ^= self.0 << 17;
                char::from(b'a' + (self.0 % 26) as u8)
            })
            .collect()
    }
}

fn bulk_insert_sql(letters: &mut Letters, first_id: u64, count: u64) -> String {
    let records = (first_id..first_id + count)
        .map(|id| format!("{id}, {id}, \"{}\", \"{}\"", letters.word(3), letters.word(12)))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "BULK INSERT INTO demo_upload(_id, keycol, val1, val2) \
         MAP (0 ID, 1 INT, 2 STRING, 3 STRING) FROM x'{records}' \
         WITH INPUT 'INLINE' FORMAT 'CSV' BATCHSIZE {}",
        count + 1
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let db = FeatureBaseClient::new(ConnectionConfig::from_env())?;

    for sql in [
        "DROP TABLE IF EXISTS demo_upload",
        "CREATE TABLE demo_upload(_id ID, keycol INT, val1 STRING, val2 STRING)",
    ] {
        let result = db.query(sql).await;
        if let Some(message) = result.error_message {
            eprintln!("{message}");
        }
    }

    let mut letters = Letters::seeded();
    let mut next_id = 1;
    for _ in 0..TOTAL_ROWS / BATCH_SIZE {
        let sql = bulk_insert_sql(&mut letters, next_id, BATCH_SIZE);
        let started = Instant::now();
        let result = db.query(&sql).await;
        if !result.ok {
            eprintln!("{}", result.error_message.unwrap_or_default());
            break;
        }
        println!(
            "inserted {} rows in {:.3} seconds",
            result.rows_affected,
            started.elapsed().as_secs_f64()
        );
        next_id += BATCH_SIZE;
    }

    Ok(())
}
