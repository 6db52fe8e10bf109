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

//! Status reporting for the UI: where the data is coming from, how many
//! flights are tracked, and a bounded diagnostics log. Display-only; the
//! core never reads back from here.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Where the currently displayed traffic comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// No fetch has completed yet.
    Connecting,
    /// Last batch came from the live feed.
    Live,
    /// Live feed unavailable; showing generated traffic.
    Synthetic,
}

impl FeedStatus {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            FeedStatus::Connecting => "CONNECTING",
            FeedStatus::Live => "LIVE",
            FeedStatus::Synthetic => "SIMULATED",
        }
    }
}

/// Diagnostic message with timestamp.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub timestamp: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// Aggregated status shown by the UI.
#[derive(Debug)]
pub struct SystemStatus {
    pub feed: FeedStatus,
    /// Tracked flights after the last tick.
    pub flight_count: usize,
    /// Mean altitude in feet, if anything is tracked.
    pub average_altitude_ft: Option<f64>,
    /// When the last fetch attempt finished, either way.
    pub last_fetch_at: Option<DateTime<Utc>>,
    /// Last fetch failure, kept until a fetch succeeds.
    pub last_error: Option<String>,

    // Diagnostic messages (keep last 50)
    diagnostics: VecDeque<DiagnosticMessage>,
    max_diagnostics: usize,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemStatus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            feed: FeedStatus::Connecting,
            flight_count: 0,
            average_altitude_ft: None,
            last_fetch_at: None,
            last_error: None,
            diagnostics: VecDeque::with_capacity(50),
            max_diagnostics: 50,
        }
    }

    /// Record a successful live batch.
    pub fn record_live_batch(&mut self, observations: usize) {
        self.feed = FeedStatus::Live;
        self.last_fetch_at = Some(Utc::now());
        self.last_error = None;
        self.add_diagnostic(
            DiagnosticLevel::Info,
            format!("Live batch applied: {} observations", observations),
        );
    }

    /// Record a failed fetch and the switch to generated traffic.
    pub fn record_fallback(&mut self, error: &str) {
        self.feed = FeedStatus::Synthetic;
        self.last_fetch_at = Some(Utc::now());
        self.last_error = Some(error.to_owned());
        self.add_diagnostic(
            DiagnosticLevel::Warning,
            format!("Feed unavailable, using synthetic traffic: {}", error),
        );
    }

    /// Refresh the per-tick aggregates.
    pub fn update_flight_stats(&mut self, count: usize, average_altitude_ft: Option<f64>) {
        self.flight_count = count;
        self.average_altitude_ft = average_altitude_ft;
    }

    /// Add a diagnostic message, evicting the oldest past the cap.
    pub fn add_diagnostic(&mut self, level: DiagnosticLevel, message: String) {
        self.diagnostics.push_back(DiagnosticMessage {
            timestamp: Utc::now(),
            level,
            message,
        });

        while self.diagnostics.len() > self.max_diagnostics {
            self.diagnostics.pop_front();
        }
    }

    #[allow(dead_code)]
    #[must_use]
    pub fn diagnostics(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.diagnostics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_connecting() {
        let status = SystemStatus::new();
        assert_eq!(status.feed, FeedStatus::Connecting);
        assert!(status.last_fetch_at.is_none());
    }

    #[test]
    fn test_live_batch_clears_error() {
        let mut status = SystemStatus::new();
        status.record_fallback("HTTP 502");
        assert_eq!(status.feed, FeedStatus::Synthetic);
        assert!(status.last_error.is_some());

        status.record_live_batch(12);
        assert_eq!(status.feed, FeedStatus::Live);
        assert!(status.last_error.is_none());
    }

    #[test]
    fn test_diagnostics_ring_is_bounded() {
        let mut status = SystemStatus::new();
        for i in 0..80 {
            status.add_diagnostic(DiagnosticLevel::Info, format!("msg {i}"));
        }
        assert_eq!(status.diagnostics().count(), 50);
        // Oldest entries were evicted first.
        assert_eq!(status.diagnostics().next().unwrap().message, "msg 30");
    }

    #[test]
    fn test_feed_labels() {
        assert_eq!(FeedStatus::Live.label(), "LIVE");
        assert_eq!(FeedStatus::Synthetic.label(), "SIMULATED");
    }
}
