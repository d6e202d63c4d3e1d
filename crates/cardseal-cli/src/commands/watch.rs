//! `cardseal watch`: the reader's refresh loop.
//!
//! Every tick unseals afresh and drops the plaintext once printed. Errors
//! other than fatal ones are shown in place of the card and the loop keeps
//! going, the way a widget would render an error entry.

use std::path::Path;
use std::time::Duration;

use clap::Args;
use tracing::{info, warn};

use crate::render;

/// Watch command arguments.
#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between refreshes
    #[arg(long, default_value_t = 3600, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Stop after this many refreshes
    #[arg(long)]
    pub count: Option<u64>,
}

/// Run the watch command.
pub async fn run(args: WatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let pipeline = super::pipeline(config_path)?;
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval));
    let mut refreshes = 0u64;

    info!(interval_secs = args.interval, "watching sealed card");
    loop {
        if args.count.is_some_and(|count| refreshes >= count) {
            return Ok(());
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                return Ok(());
            }
        }
        refreshes += 1;

        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        match pipeline.unseal().await {
            Ok(token) => println!("[{stamp}] {}", render::card(token.as_ref(), false)),
            Err(e) if e.is_fatal() => return Err(super::explain(e, "read card")),
            Err(e) => {
                warn!("refresh failed: {e}");
                println!("[{stamp}] Error: {e}");
            }
        }
    }
}
