// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Background telemetry fetching.
//!
//! One OS thread runs a tokio runtime with a single fetch loop, so at most
//! one request is ever outstanding. Refresh requests travel on a watch
//! channel: a later trigger replaces an earlier one instead of queuing
//! behind it. Every request carries a monotonically increasing sequence
//! number; a response that is no longer the latest issued request is
//! dropped, so stale data can never overwrite newer state. Completed
//! outcomes are drained by the UI thread at the start of a frame.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use log::{error, warn};
use opensky_client::{BoundingBox, FetchError, OpenSkyClient, StateBatch};
use tokio::sync::watch;

/// Result of one completed fetch, tagged with its request sequence.
#[derive(Debug)]
pub struct TelemetryUpdate {
    pub seq: u64,
    pub outcome: Result<StateBatch, FetchError>,
}

#[derive(Debug, Clone, Copy)]
struct RefreshRequest {
    seq: u64,
    bounds: BoundingBox,
}

/// Handle owned by the UI thread.
#[derive(Debug)]
pub struct TelemetryService {
    request_tx: watch::Sender<Option<RefreshRequest>>,
    update_rx: mpsc::Receiver<TelemetryUpdate>,
    latest_seq: Arc<AtomicU64>,
}

impl TelemetryService {
    /// Start the background fetch loop. `refresh_interval` re-fetches the
    /// most recent bounds even without a new trigger; the egui context is
    /// poked whenever a result lands so a sleeping UI repaints.
    #[must_use]
    pub fn spawn(ctx: egui::Context, refresh_interval: Duration) -> Self {
        Self::spawn_with_client(ctx, refresh_interval, OpenSkyClient::new())
    }

    /// As [`Self::spawn`], against a specific client (mirrors, tests).
    #[allow(dead_code)]
    #[must_use]
    pub fn spawn_with_client(
        ctx: egui::Context,
        refresh_interval: Duration,
        client: OpenSkyClient,
    ) -> Self {
        let (request_tx, request_rx) = watch::channel(None);
        let (update_tx, update_rx) = mpsc::channel();
        let latest_seq = Arc::new(AtomicU64::new(0));
        let loop_seq = Arc::clone(&latest_seq);

        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to start telemetry runtime: {}", e);
                    return;
                }
            };
            runtime.block_on(fetch_loop(
                client,
                request_rx,
                update_tx,
                loop_seq,
                ctx,
                refresh_interval,
            ));
        });

        Self {
            request_tx,
            update_rx,
            latest_seq,
        }
    }

    /// Ask for a refresh of the given bounds, superseding any request that
    /// has not started yet. Returns the sequence number issued.
    pub fn request_refresh(&self, bounds: BoundingBox) -> u64 {
        let seq = self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;
        if self
            .request_tx
            .send(Some(RefreshRequest { seq, bounds }))
            .is_err()
        {
            warn!("Telemetry worker is gone; refresh dropped");
        }
        seq
    }

    /// Take the newest completed update, if any. Results superseded by a
    /// later request are discarded here as a second line of defense.
    pub fn try_recv(&self) -> Option<TelemetryUpdate> {
        let mut newest = None;
        while let Ok(update) = self.update_rx.try_recv() {
            if update.seq == self.latest_seq.load(Ordering::SeqCst) {
                newest = Some(update);
            }
        }
        newest
    }
}

async fn fetch_loop(
    client: OpenSkyClient,
    mut request_rx: watch::Receiver<Option<RefreshRequest>>,
    update_tx: mpsc::Sender<TelemetryUpdate>,
    latest_seq: Arc<AtomicU64>,
    ctx: egui::Context,
    refresh_interval: Duration,
) {
    let mut interval = tokio::time::interval(refresh_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = request_rx.changed() => {
                if changed.is_err() {
                    break; // UI side dropped the service
                }
            }
            _ = interval.tick() => {}
        }

        let request = *request_rx.borrow_and_update();
        let Some(request) = request else {
            continue;
        };

        let outcome = client.fetch_states(&request.bounds).await;

        // A newer request was issued while this one was in flight.
        if latest_seq.load(Ordering::SeqCst) != request.seq {
            continue;
        }
        if update_tx
            .send(TelemetryUpdate {
                seq: request.seq,
                outcome,
            })
            .is_err()
        {
            break;
        }
        ctx.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_service() -> TelemetryService {
        // Unroutable loopback port: fetches fail fast without leaving the
        // machine.
        TelemetryService::spawn_with_client(
            egui::Context::default(),
            Duration::from_secs(30),
            OpenSkyClient::with_base_url("http://127.0.0.1:9/api"),
        )
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let service = local_service();
        let bounds = BoundingBox::new(30.0, 42.0, -126.0, -113.0);

        let first = service.request_refresh(bounds);
        let second = service.request_refresh(bounds);
        assert!(second > first);
    }

    #[test]
    fn test_no_update_before_any_fetch_completes() {
        let service = local_service();
        assert!(service.try_recv().is_none());
    }

    #[test]
    fn test_stale_results_discarded_after_supersession() {
        let service = local_service();
        let bounds = BoundingBox::new(30.0, 42.0, -126.0, -113.0);

        let _old = service.request_refresh(bounds);
        std::thread::sleep(Duration::from_millis(300));

        // Issue a newer request; anything completed for the old sequence
        // must never surface.
        let newest = service.request_refresh(bounds);
        if let Some(update) = service.try_recv() {
            assert_eq!(update.seq, newest);
        }
    }
}
