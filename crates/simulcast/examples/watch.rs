//! Watch a scheduled broadcast as pseudo-live playback.
//!
//! ```
//! cargo run -p simulcast --example watch [URL] [MINUTES_AGO]
//! ```

use std::{env::args, error::Error};

use simulcast::prelude::*;
use tracing::{info, metadata::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::default()
                .add_directive("simulcast_session=debug".parse()?)
                .add_directive("simulcast_engine=debug".parse()?)
                .add_directive(LevelFilter::INFO.into()),
        )
        .init();

    let locator = ContentLocator::parse(
        &args()
            .nth(1)
            .unwrap_or_else(|| "https://cdn.example.com/class.m3u8".to_string()),
    )?;
    let minutes_ago: i64 = args().nth(2).as_deref().unwrap_or("5").parse()?;
    let start = chrono::Utc::now() - chrono::Duration::minutes(minutes_ago);

    info!(%locator, %start, "joining broadcast");

    let descriptor =
        BroadcastSession::new(start.to_rfc3339(), locator).with_subject("demo".to_owned());
    let session = LiveSession::start(descriptor, SyncOptions::default())?;
    let mut events = session.subscribe();

    info!("Session started (Press Ctrl+C to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, stopping...");
                break;
            }
            recv = events.recv() => match recv {
                Ok(Event::Session(SessionEvent::Ended)) => {
                    info!("broadcast ended");
                    break;
                }
                Ok(ev) => info!(?ev),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => warn!(n, "events lagged"),
                Err(_) => break,
            }
        }
    }

    session.shutdown();
    Ok(())
}
