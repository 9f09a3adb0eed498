//! Concurrent quote collection.
//!
//! Every request is fetched by its own worker task. Workers hand their
//! outcome to a single collector task over a channel, and only the collector
//! touches the accumulated results. A run joins in two phases: first every
//! worker is joined (dropping the last sender closes the channel), then the
//! collector is awaited once it has drained the channel.

use super::error::{FetchError, FetchFailure, ReportError};
use super::quote::{InstrumentRequest, QuoteProvider, WeightedQuote};
use super::report::Report;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// What a run does when some fetches fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The first failure cancels outstanding fetches and fails the run.
    #[default]
    FailFast,
    /// Failures are reported alongside whatever was fetched.
    Partial,
}

#[derive(Debug, Clone)]
pub struct FanOutOptions {
    /// Upper bound on concurrent upstream requests.
    pub max_in_flight: usize,
    /// Deadline for the whole run; outstanding fetches are aborted after it.
    pub run_timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for FanOutOptions {
    fn default() -> Self {
        FanOutOptions {
            max_in_flight: 8,
            run_timeout: Duration::from_secs(30),
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

type Outcome = (usize, Result<WeightedQuote, FetchError>);

struct Collected {
    items: Vec<WeightedQuote>,
    errors: Vec<FetchError>,
    /// Indexed by request position; false means the worker never reported.
    reported: Vec<bool>,
    /// Request positions whose worker panicked.
    panicked: HashSet<usize>,
    timed_out: bool,
}

impl Collected {
    fn new(expected: usize) -> Self {
        Collected {
            items: Vec::with_capacity(expected),
            errors: Vec::new(),
            reported: vec![false; expected],
            panicked: HashSet::new(),
            timed_out: false,
        }
    }
}

pub struct FanOutCoordinator {
    provider: Arc<dyn QuoteProvider>,
    options: FanOutOptions,
}

impl FanOutCoordinator {
    pub fn new(provider: Arc<dyn QuoteProvider>, options: FanOutOptions) -> Self {
        Self { provider, options }
    }

    /// Fetches every request concurrently and aggregates the results.
    pub async fn run(&self, requests: &[InstrumentRequest]) -> Result<Report, ReportError> {
        self.run_with_progress(requests, &|| ()).await
    }

    /// Like [`run`](Self::run), calling `on_resolved` once per finished fetch.
    pub async fn run_with_progress(
        &self,
        requests: &[InstrumentRequest],
        on_resolved: &(dyn Fn() + Sync),
    ) -> Result<Report, ReportError> {
        if requests.is_empty() {
            return Err(ReportError::NoInstruments);
        }

        let collected = self.collect(requests, on_resolved).await;
        self.finish(requests, collected)
    }

    async fn collect(
        &self,
        requests: &[InstrumentRequest],
        on_resolved: &(dyn Fn() + Sync),
    ) -> Collected {
        let (tx, rx) = mpsc::channel::<Outcome>(requests.len());
        let (abort_tx, mut abort_rx) = watch::channel(false);
        let collector = tokio::spawn(collect_outcomes(
            rx,
            requests.len(),
            self.options.failure_policy,
            abort_tx,
        ));

        let limiter = Arc::new(Semaphore::new(self.options.max_in_flight.max(1)));
        let mut workers = JoinSet::new();
        let mut task_index = HashMap::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let limiter = Arc::clone(&limiter);
            let tx = tx.clone();
            let request = request.clone();
            let handle = workers.spawn(async move {
                let Ok(_permit) = limiter.acquire_owned().await else {
                    return;
                };
                debug!(identifier = %request.identifier, "Fetching quote");
                let outcome = provider
                    .fetch_quote(&request.identifier)
                    .await
                    .map(|quote| WeightedQuote::new(quote, request.weight));
                let _ = tx.send((index, outcome)).await;
            });
            task_index.insert(handle.id(), index);
        }
        drop(tx);

        let deadline = tokio::time::sleep(self.options.run_timeout);
        tokio::pin!(deadline);
        let mut abort_seen = false;
        let mut timed_out = false;
        let mut panicked = HashSet::new();

        // Phase one: wait for every producer.
        loop {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(Ok(())) => on_resolved(),
                    Some(Err(e)) if e.is_panic() => {
                        error!(error = %e, "Quote worker panicked");
                        if let Some(&index) = task_index.get(&e.id()) {
                            panicked.insert(index);
                        }
                        if self.options.failure_policy == FailurePolicy::FailFast {
                            workers.abort_all();
                        }
                        on_resolved();
                    }
                    Some(Err(_)) => {}
                    None => break,
                },
                changed = abort_rx.changed(), if !abort_seen => {
                    if changed.is_ok() && *abort_rx.borrow() {
                        debug!(outstanding = workers.len(), "Cancelling outstanding fetches");
                        workers.abort_all();
                    }
                    abort_seen = true;
                },
                () = &mut deadline, if !timed_out => {
                    warn!(
                        timeout = ?self.options.run_timeout,
                        outstanding = workers.len(),
                        "Quote collection deadline reached"
                    );
                    workers.abort_all();
                    timed_out = true;
                }
            }
        }

        // Phase two: every sender is gone, so the collector finishes draining.
        let mut collected = match collector.await {
            Ok(collected) => collected,
            Err(e) => {
                error!(error = %e, "Quote collector failed");
                Collected::new(requests.len())
            }
        };
        collected.panicked = panicked;
        collected.timed_out = timed_out;
        collected
    }

    fn finish(
        &self,
        requests: &[InstrumentRequest],
        collected: Collected,
    ) -> Result<Report, ReportError> {
        let Collected {
            items,
            mut errors,
            reported,
            panicked,
            timed_out,
        } = collected;

        // Aborted, panicked or timed-out workers never report back.
        errors.extend(
            requests
                .iter()
                .enumerate()
                .zip(&reported)
                .filter(|(_, seen)| !**seen)
                .map(|((index, request), _)| {
                    let identifier = request.identifier.clone();
                    if panicked.contains(&index) {
                        FetchError::Panicked { identifier }
                    } else {
                        FetchError::Cancelled { identifier }
                    }
                }),
        );

        info!(
            requested = requests.len(),
            fetched = items.len(),
            failed = errors.len(),
            "Quote collection finished"
        );

        let only_cancelled = errors.iter().all(FetchError::is_cancelled);
        match self.options.failure_policy {
            FailurePolicy::FailFast if !errors.is_empty() => {
                if timed_out && only_cancelled {
                    return Err(ReportError::Timeout {
                        timeout: self.options.run_timeout,
                    });
                }
                let first = errors.iter().position(|e| !e.is_cancelled()).unwrap_or(0);
                return Err(ReportError::Fetch(errors.swap_remove(first)));
            }
            FailurePolicy::Partial if items.is_empty() => {
                if timed_out && only_cancelled {
                    return Err(ReportError::Timeout {
                        timeout: self.options.run_timeout,
                    });
                }
                return Err(ReportError::NoData {
                    failures: errors.iter().map(FetchFailure::from).collect(),
                });
            }
            _ => {}
        }

        let failures = errors.iter().map(FetchFailure::from).collect();
        Ok(Report::build(items)?.with_failures(failures))
    }
}

async fn collect_outcomes(
    mut rx: mpsc::Receiver<Outcome>,
    expected: usize,
    policy: FailurePolicy,
    abort: watch::Sender<bool>,
) -> Collected {
    let mut collected = Collected::new(expected);
    while let Some((index, outcome)) = rx.recv().await {
        if let Some(seen) = collected.reported.get_mut(index) {
            *seen = true;
        }
        match outcome {
            Ok(item) => collected.items.push(item),
            Err(e) => {
                warn!(error = %e, "Quote fetch failed");
                if policy == FailurePolicy::FailFast && collected.errors.is_empty() {
                    let _ = abort.send(true);
                }
                collected.errors.push(e);
            }
        }
    }
    collected
}
