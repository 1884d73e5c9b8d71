use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;

use super::error::{MongoDaoError, MongoResult};

const MAX_PING_ATTEMPTS: u32 = 10;
const INITIAL_PING_DELAY: Duration = Duration::from_millis(250);
const MAX_PING_DELAY: Duration = Duration::from_secs(5);

/// Build a client and verify connectivity with a bounded ping-retry loop.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempts = 0;
    let mut delay = INITIAL_PING_DELAY;

    while let Err(err) = database.run_command(doc! { "ping": 1 }).await {
        attempts += 1;
        if attempts >= MAX_PING_ATTEMPTS {
            return Err(MongoDaoError::InitialPing {
                attempts,
                source: err,
            });
        }
        sleep(delay).await;
        delay = (delay * 2).min(MAX_PING_DELAY);
    }

    Ok((client, database))
}
