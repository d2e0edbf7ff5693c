// SPDX-License-Identifier: GPL-3.0-only
use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::context::Context;
use crate::service::DataService;

/// Periodically purge key-value entries older than `max_age` until `ctx` is
/// cancelled.
pub async fn run_retention(
    service: Arc<DataService>,
    ctx: Context,
    max_age: Duration,
    every: Duration,
) {
    let Ok(max_age) = TimeDelta::from_std(max_age) else {
        error!(?max_age, "Retention period out of range, purging disabled");
        return;
    };

    info!(max_age_secs = max_age.num_seconds(), "Retention task started");
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ctx.cancelled() => break,
            _ = interval.tick() => {}
        }

        let Some(cutoff) = Utc::now().checked_sub_signed(max_age) else {
            error!(
                max_age_secs = max_age.num_seconds(),
                "Retention period reaches past the representable time range, purging disabled"
            );
            break;
        };
        match service.purge_older_than(&ctx, cutoff).await {
            Ok(0) => {}
            Ok(purged) => info!(purged, %cutoff, "Purged expired data entries"),
            Err(e) => error!(error = %e, "Failed to purge expired data entries"),
        }
    }
    info!("Retention task stopped");
}
