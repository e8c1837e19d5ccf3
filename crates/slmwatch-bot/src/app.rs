//! Main application orchestration.
//!
//! Schedules every watched order on a fixed interval until its watcher
//! invocation returns `Done`, and starts a new watch for each successor job
//! that arrives on the watcher queue.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use slmwatch_broker::{DynBrokerClient, FakeBroker, KiteClient};
use slmwatch_core::{AccountContext, OrderId, WatcherJobInput};
use slmwatch_queue::{ChannelQueue, QueuedJob};
use slmwatch_telemetry::Metrics;
use slmwatch_watcher::{SlmWatcher, Termination, WatchAction, WatchOutcome};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;

/// Final state of one scheduled watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchReport {
    pub order_id: OrderId,
    /// Number of watcher invocations.
    pub invocations: u64,
    /// `None` when shutdown stopped the watch (or it never started) before
    /// the order reached a final state.
    pub termination: Option<Termination>,
}

impl WatchReport {
    /// Failed watches and orders left unwatched at shutdown.
    pub fn needs_attention(&self) -> bool {
        self.termination
            .as_ref()
            .map_or(true, Termination::needs_attention)
    }
}

/// Reports collected over one run, in completion order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<WatchReport>,
}

impl RunSummary {
    pub fn report(&self, order_id: &OrderId) -> Option<&WatchReport> {
        self.reports.iter().find(|r| &r.order_id == order_id)
    }

    /// Exit orders placed during the run.
    pub fn compensations(&self) -> Vec<OrderId> {
        self.reports
            .iter()
            .filter_map(|r| match r.termination.as_ref().map(Termination::action) {
                Some(WatchAction::Compensated(order_id)) => Some(order_id),
                _ => None,
            })
            .collect()
    }

    pub fn attention_count(&self) -> usize {
        self.reports.iter().filter(|r| r.needs_attention()).count()
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    watcher: Arc<SlmWatcher>,
    /// Keeps the watcher queue open for the lifetime of the application.
    _queue: ChannelQueue,
    jobs_rx: mpsc::Receiver<QueuedJob>,
    account: AccountContext,
}

impl Application {
    /// Create a new application with the broker selected by configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        let broker: DynBrokerClient = if config.broker.mock_orders {
            warn!("Mock orders enabled, using the scripted fake broker");
            Arc::new(FakeBroker::out_of_range_fixture())
        } else {
            Arc::new(KiteClient::new(config.broker.kite.clone())?)
        };

        Self::with_broker(config, broker)
    }

    /// Create an application around an explicit broker.
    pub fn with_broker(config: AppConfig, broker: DynBrokerClient) -> AppResult<Self> {
        config.validate()?;

        let (queue, jobs_rx) = ChannelQueue::new(config.queue.capacity);
        let watcher = Arc::new(SlmWatcher::new(
            broker,
            Arc::new(queue.clone()),
            config.watcher.clone(),
        ));
        let account = AccountContext::new(config.account.user_id.clone());

        Ok(Self {
            config,
            watcher,
            _queue: queue,
            jobs_rx,
            account,
        })
    }

    /// Run until Ctrl-C (or until idle when `exit_when_idle` is set).
    pub async fn run(self, initial: Vec<WatcherJobInput>) -> AppResult<RunSummary> {
        self.run_until(initial, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(?e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` resolves.
    ///
    /// On shutdown, in-flight invocations finish and no new ticks start.
    /// Successor jobs still queued at that point are reported as unwatched.
    pub async fn run_until<F>(self, initial: Vec<WatcherJobInput>, shutdown: F) -> AppResult<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let Self {
            config,
            watcher,
            _queue,
            mut jobs_rx,
            account,
        } = self;

        let period = Duration::from_millis(config.scheduler.poll_interval_ms);
        let exit_when_idle = config.scheduler.exit_when_idle;
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();
        let mut summary = RunSummary::default();

        info!(
            watches = initial.len(),
            poll_interval_ms = config.scheduler.poll_interval_ms,
            user = %account.user_id,
            "Starting watcher scheduler"
        );
        for input in initial {
            spawn_watch(&mut tasks, &watcher, input, period, &stop_rx);
        }

        tokio::pin!(shutdown);

        loop {
            if exit_when_idle && tasks.is_empty() {
                match jobs_rx.try_recv() {
                    Ok(job) => {
                        let input = job.into_watch_input(account.clone());
                        spawn_watch(&mut tasks, &watcher, input, period, &stop_rx);
                        continue;
                    }
                    Err(_) => {
                        info!("No active watches, exiting");
                        break;
                    }
                }
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                Some(job) = jobs_rx.recv() => {
                    debug!(job_id = %job.id, order_id = %job.successor.order_id, "Successor job received");
                    let input = job.into_watch_input(account.clone());
                    spawn_watch(&mut tasks, &watcher, input, period, &stop_rx);
                }

                Some(joined) = tasks.join_next() => record(&mut summary, joined),

                else => break,
            }
        }

        // Let in-flight invocations finish; no new ticks after this.
        let _ = stop_tx.send(true);
        while let Some(joined) = tasks.join_next().await {
            record(&mut summary, joined);
        }

        // Exit orders enqueued by the last invocations have no watch left.
        while let Ok(job) = jobs_rx.try_recv() {
            error!(
                job_id = %job.id,
                order_id = %job.successor.order_id,
                order_tag = job.initial_job_data.order_tag.as_str(),
                "Successor job dropped at shutdown, order is unmonitored"
            );
            summary.reports.push(WatchReport {
                order_id: job.successor.order_id,
                invocations: 0,
                termination: None,
            });
        }

        match Metrics::render() {
            Ok(text) => debug!(metrics = %text, "Final metrics"),
            Err(e) => warn!(?e, "Failed to render metrics"),
        }
        info!(
            watches = summary.reports.len(),
            compensations = summary.compensations().len(),
            needs_attention = summary.attention_count(),
            "Shutting down"
        );

        Ok(summary)
    }
}

fn record(summary: &mut RunSummary, joined: Result<WatchReport, JoinError>) {
    match joined {
        Ok(report) => {
            log_report(&report);
            summary.reports.push(report);
        }
        Err(e) => error!(?e, "Watch task failed, its order may be unmonitored"),
    }
}

fn spawn_watch(
    tasks: &mut JoinSet<WatchReport>,
    watcher: &Arc<SlmWatcher>,
    input: WatcherJobInput,
    period: Duration,
    stop_rx: &watch::Receiver<bool>,
) {
    info!(
        order_id = %input.watched_order_id,
        order_tag = input.order_tag(),
        "Watching order"
    );
    tasks.spawn(watch_until_done(
        Arc::clone(watcher),
        input,
        period,
        stop_rx.clone(),
    ));
}

/// Invoke the watcher every `period` until it returns `Done` or shutdown
/// is requested.
async fn watch_until_done(
    watcher: Arc<SlmWatcher>,
    input: WatcherJobInput,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) -> WatchReport {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut invocations = 0u64;

    loop {
        if *stop_rx.borrow() {
            break;
        }
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        invocations += 1;
        if let WatchOutcome::Done(termination) = watcher.watch(&input).await {
            return WatchReport {
                order_id: input.watched_order_id,
                invocations,
                termination: Some(termination),
            };
        }
    }

    WatchReport {
        order_id: input.watched_order_id,
        invocations,
        termination: None,
    }
}

fn log_report(report: &WatchReport) {
    match &report.termination {
        Some(termination) if report.needs_attention() => error!(
            order_id = %report.order_id,
            invocations = report.invocations,
            ?termination,
            "Watch ended, manual attention required"
        ),
        Some(termination) => info!(
            order_id = %report.order_id,
            invocations = report.invocations,
            outcome = termination.label(),
            "Watch ended"
        ),
        None => error!(
            order_id = %report.order_id,
            invocations = report.invocations,
            "Watch stopped before the order reached a final state, order is unmonitored"
        ),
    }
}
