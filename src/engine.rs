use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use hickory_resolver::TokioResolver;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::MonitorConfig;
use crate::models::{ProbeOutcome, RoundReport};
use crate::probes;
use crate::report::Reporter;

/// One entry in a round's probe set, in enumeration order: the ping for
/// a target first, then that target's ports in configured order.
#[derive(Debug, Clone)]
enum ProbeSpec {
    Ping { host: String },
    Port { host: String, port: u16 },
}

impl ProbeSpec {
    /// Terminal outcome for a probe whose task never produced one.
    fn failure_outcome(&self, detail: String) -> ProbeOutcome {
        match self {
            Self::Ping { host } => ProbeOutcome::PingError {
                host: host.clone(),
                detail,
            },
            Self::Port { host, port } => ProbeOutcome::PortError {
                host: host.clone(),
                port: *port,
                detail,
            },
        }
    }
}

pub struct Monitor {
    config: MonitorConfig,
    resolver: TokioResolver,
    concurrency_limiter: Arc<Semaphore>,
    reporter: Arc<dyn Reporter>,
}

impl Monitor {
    pub fn new(config: MonitorConfig, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let resolver = TokioResolver::builder_tokio()
            .context("Failed to read system resolver configuration")?
            .build();

        let max_concurrency = config.max_concurrency;

        Ok(Self {
            config,
            resolver,
            concurrency_limiter: Arc::new(Semaphore::new(max_concurrency)),
            reporter,
        })
    }

    /// Drive rounds forever. Stops only when the caller drops the
    /// future (shutdown signal); in-flight probes are bounded by their
    /// own timeouts, so cancellation is prompt.
    pub async fn run(self: Arc<Self>) {
        info!(
            probes_per_round = self.config.probe_count(),
            max_concurrency = self.config.max_concurrency,
            "Monitor loop starting"
        );

        let mut seq: u64 = 0;
        loop {
            seq += 1;
            let started = Instant::now();

            let report = self.run_round(seq).await;
            self.reporter.report(&report);

            let elapsed = started.elapsed();
            info!(
                round = seq,
                probes = report.outcomes.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Round completed"
            );

            match self.config.check_interval().checked_sub(elapsed) {
                Some(idle) => tokio::time::sleep(idle).await,
                None => {
                    // Overrun: start the next round immediately rather
                    // than letting rounds stack up concurrently.
                    warn!(round = seq, "Round exceeded the check interval");
                }
            }
        }
    }

    /// Execute one full round: fan out every probe, wait for all of
    /// them, and return the outcomes in enumeration order.
    pub async fn run_round(self: &Arc<Self>, seq: u64) -> RoundReport {
        let timestamp = Utc::now();
        let specs = self.probe_set();

        let mut tasks = FuturesUnordered::new();
        for (idx, spec) in specs.into_iter().enumerate() {
            let monitor = Arc::clone(self);
            let task_spec = spec.clone();
            let handle = tokio::spawn(async move {
                let _permit = monitor.concurrency_limiter.acquire().await.ok();
                monitor.execute(&task_spec).await
            });
            tasks.push(async move {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => spec.failure_outcome(format!("probe task failed: {e}")),
                };
                (idx, outcome)
            });
        }

        let mut indexed = Vec::with_capacity(tasks.len());
        while let Some(pair) = tasks.next().await {
            indexed.push(pair);
        }
        indexed.sort_by_key(|(idx, _)| *idx);

        RoundReport {
            seq,
            timestamp,
            outcomes: indexed.into_iter().map(|(_, outcome)| outcome).collect(),
        }
    }

    fn probe_set(&self) -> Vec<ProbeSpec> {
        let mut specs = Vec::with_capacity(self.config.probe_count());
        for target in &self.config.targets {
            specs.push(ProbeSpec::Ping {
                host: target.host.clone(),
            });
            for &port in &target.ports {
                specs.push(ProbeSpec::Port {
                    host: target.host.clone(),
                    port,
                });
            }
        }
        specs
    }

    async fn execute(&self, spec: &ProbeSpec) -> ProbeOutcome {
        let timeout = self.config.probe_timeout();
        match spec {
            ProbeSpec::Ping { host } => probes::ping_host(&self.resolver, host, timeout).await,
            ProbeSpec::Port { host, port } => probes::check_port(host, *port, timeout).await,
        }
    }
}
