use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use crate::foundation::error::{MixviewError, MixviewResult};
use crate::poll::source::SnapshotSource;
use crate::projection::config::{ProjectionConfig, SchedulePhase};
use crate::projection::dashboard::{Dashboard, project};
use crate::snapshot::index::SnapshotIndex;

/// Default time between ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Poll loop options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollerOpts {
    /// Time between tick starts.
    pub interval: Duration,
    /// Schedule phase checks are evaluated against.
    pub phase: SchedulePhase,
    /// Stop after this many ticks; `None` runs until cancelled.
    pub max_ticks: Option<u64>,
}

impl Default for PollerOpts {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            phase: SchedulePhase::default(),
            max_ticks: None,
        }
    }
}

impl PollerOpts {
    /// Reject options the loop cannot honour.
    pub fn validate(&self) -> MixviewResult<()> {
        if self.interval.is_zero() {
            return Err(MixviewError::validation("poll interval must be > 0"));
        }
        if self.max_ticks == Some(0) {
            return Err(MixviewError::validation("max_ticks must be > 0 when set"));
        }
        Ok(())
    }
}

/// Result of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new dashboard replaced the previous one.
    Updated,
    /// Fetch or parse failed; the previous dashboard is kept.
    Skipped,
}

/// Tick counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Ticks attempted.
    pub ticks: u64,
    /// Ticks that produced a dashboard.
    pub updated: u64,
    /// Ticks skipped after a fetch failure.
    pub skipped: u64,
}

/// Fetch → index → resolve → project on a fixed cadence.
///
/// Snapshots and indices live only for the tick that created them; the last good
/// [`Dashboard`] is the only state carried between ticks.
pub struct Poller<S> {
    source: S,
    config: ProjectionConfig,
    opts: PollerOpts,
    last: Option<Dashboard>,
    stats: PollStats,
}

impl<S: SnapshotSource> Poller<S> {
    /// Validate `config` and `opts` and build an idle poller.
    pub fn new(source: S, config: ProjectionConfig, opts: PollerOpts) -> MixviewResult<Self> {
        config.validate()?;
        opts.validate()?;
        Ok(Self {
            source,
            config,
            opts,
            last: None,
            stats: PollStats::default(),
        })
    }

    /// Last successfully projected dashboard.
    pub fn last(&self) -> Option<&Dashboard> {
        self.last.as_ref()
    }

    /// Counters so far.
    pub fn stats(&self) -> PollStats {
        self.stats
    }

    /// Switch the schedule phase used from the next tick on.
    pub fn set_phase(&mut self, phase: SchedulePhase) {
        self.opts.phase = phase;
    }

    /// Run a single fetch/resolve/project cycle.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;
        let snapshot = match self.source.fetch() {
            Ok(s) => s,
            Err(e) => {
                self.stats.skipped += 1;
                tracing::warn!(error = %e, "snapshot fetch failed, keeping previous dashboard");
                return TickOutcome::Skipped;
            }
        };

        let index = SnapshotIndex::build(&snapshot);
        let dashboard = project(&index, &self.config, self.opts.phase);
        self.last = Some(dashboard);
        self.stats.updated += 1;
        TickOutcome::Updated
    }

    /// Tick until `cancel` fires (a message or a dropped sender) or `max_ticks` is reached.
    ///
    /// `publish` sees each new dashboard once, and never one from a tick that was cancelled
    /// while in flight.
    pub fn run<F>(&mut self, cancel: &Receiver<()>, mut publish: F) -> PollStats
    where
        F: FnMut(&Dashboard),
    {
        tracing::info!(interval_ms = self.opts.interval.as_millis() as u64, "poll loop started");
        loop {
            if is_cancelled(cancel) {
                break;
            }

            let started = Instant::now();
            let outcome = self.tick();

            if is_cancelled(cancel) {
                break;
            }
            if outcome == TickOutcome::Updated
                && let Some(dashboard) = &self.last
            {
                publish(dashboard);
            }
            if self.opts.max_ticks.is_some_and(|max| self.stats.ticks >= max) {
                break;
            }

            let wait = self.opts.interval.saturating_sub(started.elapsed());
            match cancel.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::info!(
            ticks = self.stats.ticks,
            skipped = self.stats.skipped,
            "poll loop stopped"
        );
        self.stats
    }
}

fn is_cancelled(cancel: &Receiver<()>) -> bool {
    match cancel.try_recv() {
        Ok(()) | Err(TryRecvError::Disconnected) => true,
        Err(TryRecvError::Empty) => false,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/poll/poller.rs"]
mod tests;
