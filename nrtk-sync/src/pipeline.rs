//! Cycle runner shared by one-shot and interval mode.
//!
//! A failed cycle is logged and reported as `false`; it never stops interval
//! mode. Intervals shorter than [`MIN_SYNC_INTERVAL`] fall back to a single
//! cycle.

use std::thread;
use std::time::Duration;

use nrtk_renderer::Renderer;

use crate::engine::{sync_cycle, CycleOutcome};
use crate::fetch::ContentSource;
use crate::paths::Layout;

/// Shortest accepted pause between two cycles.
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_secs(60);

/// How often to run a sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Once,
    Every(Duration),
}

impl Schedule {
    /// Interval mode for `secs >= 60`, a single cycle otherwise.
    pub fn from_secs(secs: u64) -> Self {
        let interval = Duration::from_secs(secs);
        if interval >= MIN_SYNC_INTERVAL {
            Schedule::Every(interval)
        } else {
            if secs > 0 {
                tracing::warn!(
                    secs,
                    min = MIN_SYNC_INTERVAL.as_secs(),
                    "interval below minimum, running a single cycle"
                );
            }
            Schedule::Once
        }
    }
}

/// Run one cycle and log its outcome. Returns `true` on success.
pub fn run_cycle(layout: &Layout, source: &dyn ContentSource, renderer: &Renderer) -> bool {
    if let Err(err) = layout.ensure_dirs() {
        tracing::error!(error = %err, "unable to prepare local directories");
        return false;
    }
    match sync_cycle(layout, source, renderer) {
        Ok(CycleOutcome::Unchanged { checksum }) => {
            tracing::debug!(%checksum, "no changes");
            true
        }
        Ok(CycleOutcome::Synced(report)) => {
            tracing::info!(
                checksum = %report.checksum,
                previous = report.previous_checksum.as_deref().unwrap_or("-"),
                archived = report.archived(),
                deleted = report.deleted(),
                written = report.written(),
                "content synced"
            );
            true
        }
        Err(err) => {
            tracing::error!(error = %err, "sync cycle failed");
            false
        }
    }
}

/// Run according to `schedule`. Returns only in [`Schedule::Once`] mode,
/// with the result of that cycle.
pub fn run(
    layout: &Layout,
    source: &dyn ContentSource,
    renderer: &Renderer,
    schedule: Schedule,
) -> bool {
    match schedule {
        Schedule::Once => run_cycle(layout, source, renderer),
        Schedule::Every(interval) => run_forever(layout, source, renderer, interval),
    }
}

/// Repeat cycles with `interval` between them. Never returns.
pub fn run_forever(
    layout: &Layout,
    source: &dyn ContentSource,
    renderer: &Renderer,
    interval: Duration,
) -> ! {
    tracing::info!(secs = interval.as_secs(), "interval mode");
    loop {
        run_cycle(layout, source, renderer);
        thread::sleep(interval);
    }
}

/// Bounded variant of [`run_forever`]: `cycles` iterations, `pause` between
/// them. Returns how many cycles succeeded.
pub fn run_cycles(
    layout: &Layout,
    source: &dyn ContentSource,
    renderer: &Renderer,
    cycles: usize,
    mut pause: impl FnMut(),
) -> usize {
    let mut ok = 0;
    for i in 0..cycles {
        if run_cycle(layout, source, renderer) {
            ok += 1;
        }
        if i + 1 < cycles {
            pause();
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use nrtk_core::RawResponse;
    use std::cell::Cell;
    use tempfile::TempDir;

    const DOC: &str = r#"{
        "homepage_url": "https://example.com",
        "stories": [{
            "canonical_url": "https://example.com/", "content": "<p>home</p>",
            "anchor": "index", "updated_at": "2025-03-01T10:20:30Z", "title": "Home",
            "is_landing": true, "hash": "h1", "uid": 1, "credits": null
        }],
        "error_page": "<h1>404</h1>", "entity": null, "title": "Example"
    }"#;

    #[test]
    fn schedule_below_minimum_is_once() {
        assert_eq!(Schedule::from_secs(0), Schedule::Once);
        assert_eq!(Schedule::from_secs(59), Schedule::Once);
    }

    #[test]
    fn schedule_at_minimum_is_interval() {
        assert_eq!(Schedule::from_secs(60), Schedule::Every(Duration::from_secs(60)));
        assert_eq!(Schedule::from_secs(3600), Schedule::Every(Duration::from_secs(3600)));
    }

    #[test]
    fn run_cycle_creates_layout_and_succeeds() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        let source = || -> Result<RawResponse, FetchError> { Ok(RawResponse::ok(DOC)) };
        assert!(run_cycle(&layout, &source, &Renderer::new().unwrap()));
        assert!(layout.meta_path().is_file());
        assert!(layout.content_dir().join("index").is_file());
    }

    #[test]
    fn run_cycle_reports_failure_as_false() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        let source = || -> Result<RawResponse, FetchError> { Ok(RawResponse { status: 500, body: String::new() }) };
        assert!(!run_cycle(&layout, &source, &Renderer::new().unwrap()));
        assert!(!layout.meta_path().exists());
    }

    #[test]
    fn failed_cycles_do_not_stop_the_loop() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        let calls = Cell::new(0);
        let source = || -> Result<RawResponse, FetchError> {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(FetchError::Transport {
                    url: "http://x".into(),
                    message: "timed out".into(),
                })
            } else {
                Ok(RawResponse::ok(DOC))
            }
        };
        let pauses = Cell::new(0);
        let ok = run_cycles(&layout, &source, &Renderer::new().unwrap(), 3, || {
            pauses.set(pauses.get() + 1)
        });
        assert_eq!(calls.get(), 3);
        assert_eq!(ok, 2);
        assert_eq!(pauses.get(), 2);
    }
}
