// src/scheduler.rs
//! Periodic re-execution of a job (normally one aggregation + dispatch).
//!
//! The ticker loop runs in its own task; `start` is the blocking wait that
//! observes the stop token. Runs are serialized: a tick that fires while a
//! run is still going is skipped, not queued. Stopping abandons the pending
//! sleep but lets an in-flight run finish.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ScheduleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

pub struct Scheduler {
    interval: Duration,
    run_on_start: bool,
    state: watch::Sender<SchedulerState>,
}

impl Scheduler {
    /// A zero interval is bumped to 1ms (tokio intervals must be non-zero).
    pub fn new(interval: Duration, run_on_start: bool) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            interval: interval.max(Duration::from_millis(1)),
            run_on_start,
            state,
        }
    }

    pub fn from_config(cfg: &ScheduleConfig) -> Self {
        Self::new(
            Duration::from_secs(cfg.interval_minutes.saturating_mul(60)),
            cfg.run_on_start,
        )
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Run `job` now (if configured) and then every interval until `stop`
    /// is cancelled. Returns once the ticker loop has exited.
    pub async fn start<F, Fut>(&self, job: F, stop: CancellationToken)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.state.send_replace(SchedulerState::Running);
        info!(
            target: "radar",
            interval_secs = self.interval.as_secs(),
            run_on_start = self.run_on_start,
            "Scheduler started"
        );

        let ticker = tokio::spawn(ticker_loop(
            self.interval,
            self.run_on_start,
            job,
            stop.clone(),
        ));

        stop.cancelled().await;
        info!(target: "radar", "Scheduler stopping; waiting for in-flight run");
        if let Err(e) = ticker.await {
            warn!(target: "radar", error = %e, "scheduler loop ended abnormally");
        }

        self.state.send_replace(SchedulerState::Stopped);
        info!(target: "radar", "Scheduler stopped.");
    }
}

async fn ticker_loop<F, Fut>(interval: Duration, run_on_start: bool, job: F, stop: CancellationToken)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    if run_on_start && !stop.is_cancelled() {
        execute(&job).await;
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {}
        }
        execute(&job).await;
    }
}

/// One run in its own task so both errors and panics stay inside the loop.
async fn execute<F, Fut>(job: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    info!(target: "radar", at = %chrono::Utc::now().format("%H:%M:%S"), "Running scrape cycle...");
    match tokio::spawn(job()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(target: "radar", "Scheduler error: {e:#}"),
        Err(e) => warn!(target: "radar", error = %e, "Scheduler run panicked"),
    }
}

/// Cancel `token` on Ctrl-C.
pub fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!(target: "radar", error = %e, "ctrl-c listener failed");
                }
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}
