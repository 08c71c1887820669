use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::{info, warn};

use super::error::{MongoDaoError, MongoResult};

/// Backoff applied while the server is still coming up.
struct StartupBackoff;

impl StartupBackoff {
    const MAX_ATTEMPTS: u32 = 10;
    const FIRST_DELAY: Duration = Duration::from_millis(250);
    const MAX_DELAY: Duration = Duration::from_secs(5);

    fn after(delay: Duration) -> Duration {
        (delay * 2).min(Self::MAX_DELAY)
    }
}

/// Build a client and wait until the target database answers a ping.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempt = 0;
    let mut delay = StartupBackoff::FIRST_DELAY;
    loop {
        attempt += 1;
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                if attempt > 1 {
                    info!(attempt, database = database_name, "MongoDB reachable after retry");
                }
                return Ok((client, database));
            }
            Err(source) if attempt >= StartupBackoff::MAX_ATTEMPTS => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                warn!(
                    attempt,
                    wait_ms = delay.as_millis(),
                    error = %err,
                    "MongoDB ping failed; retrying"
                );
                sleep(delay).await;
                delay = StartupBackoff::after(delay);
            }
        }
    }
}
