// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::error::SyncError;
use crate::feed::FeedFetcher;
use crate::library::Library;
use crate::progress::SharedProgressReporter;
use crate::storage::Storage;
use crate::sync::SyncOptions;

/// Run update cycles on a fixed interval until `shutdown` flips to true.
///
/// The first cycle starts immediately. A cycle that overruns the interval
/// delays the next one instead of triggering a burst. Whether the machine is
/// online or on power is for the caller to decide before starting this loop.
///
/// Returns the number of completed cycles. A storage failure stops the loop.
pub async fn run_periodic<S, F>(
    library: Library<S, F>,
    interval: Duration,
    options: SyncOptions,
    reporter: SharedProgressReporter,
    mut shutdown: watch::Receiver<bool>,
) -> Result<usize, SyncError>
where
    S: Storage + ?Sized + 'static,
    F: FeedFetcher + ?Sized + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cycles = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                // Sender dropped counts as shutdown
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        let report = tokio::select! {
            report = library.update_all(&options, reporter.clone()) => report?,
            _ = shutdown.wait_for(|stop| *stop) => {
                tracing::info!("Shutdown requested during update cycle");
                break;
            }
        };

        cycles += 1;
        tracing::debug!(
            cycle = cycles,
            updated = report.updates.len(),
            failed = report.failed,
            "Scheduled update finished"
        );
    }

    Ok(cycles)
}
