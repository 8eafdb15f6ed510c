use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::chart::{Chart, ChartOptions, build_chart};
use crate::system::aggregate::Metric;
use crate::system::snapshot::{DEFAULT_CPU_INTERVAL, ProcessSource, capture};

#[derive(Clone, Debug)]
pub struct ChartRequest {
    pub metric: Metric,
    pub options: ChartOptions,
    pub cpu_interval: Duration,
}

impl ChartRequest {
    pub fn new(metric: Metric) -> Self {
        ChartRequest {
            metric,
            options: ChartOptions::default(),
            cpu_interval: DEFAULT_CPU_INTERVAL,
        }
    }
}

/// A chart being built on the blocking pool. Dropping it abandons the
/// result; the run still finishes and its chart is thrown away.
pub struct PendingChart {
    generation: u64,
    rx: oneshot::Receiver<Chart>,
}

impl PendingChart {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn wait(self) -> Option<Chart> {
        self.rx.await.ok()
    }
}

/// Runs the capture + layout pipeline off the caller's thread.
///
/// Only the most recent request is kept: asking again before the previous
/// chart arrives abandons it. Each run builds its own source from
/// `factory`, so runs never share process state.
pub struct ChartWorker<F> {
    factory: Arc<F>,
    pending: Option<PendingChart>,
    generation: u64,
}

impl<F, S> ChartWorker<F>
where
    F: Fn() -> S + Send + Sync + 'static,
    S: ProcessSource,
{
    pub fn new(factory: F) -> Self {
        ChartWorker {
            factory: Arc::new(factory),
            pending: None,
            generation: 0,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn request(&mut self, request: ChartRequest) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        if let Some(stale) = self.pending.take() {
            tracing::debug!(
                superseded = stale.generation(),
                generation,
                "abandoning pending chart"
            );
        }

        let (tx, rx) = oneshot::channel();
        let factory = Arc::clone(&self.factory);
        tokio::task::spawn_blocking(move || {
            let mut source = factory();
            let snapshot = capture(&mut source, request.cpu_interval);
            let chart = build_chart(snapshot, request.metric, &request.options);
            if tx.send(chart).is_err() {
                tracing::debug!(generation, "discarding abandoned chart");
            }
        });

        self.pending = Some(PendingChart { generation, rx });
        generation
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(generation = pending.generation(), "chart cancelled");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits for the latest requested chart. `None` when nothing is
    /// pending or the run died.
    pub async fn next(&mut self) -> Option<Chart> {
        let pending = self.pending.take()?;
        pending.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::process::{ProcessRecord, Reading};
    use crate::system::snapshot::StaticSource;

    fn source() -> StaticSource {
        let records = vec![
            ProcessRecord {
                pid: 1,
                parent_pid: None,
                name: "init".into(),
                memory_percent: Reading::Value(12.0),
                cpu_percent: Reading::Value(50.0),
                username: Reading::Value("root".into()),
                memory_bytes: Reading::Value(4096),
            },
            ProcessRecord {
                pid: 2,
                parent_pid: Some(1),
                name: "shell".into(),
                memory_percent: Reading::Value(8.0),
                cpu_percent: Reading::Denied,
                username: Reading::Denied,
                memory_bytes: Reading::Denied,
            },
        ];
        StaticSource::new(records, 2)
    }

    fn request(metric: Metric) -> ChartRequest {
        ChartRequest {
            cpu_interval: Duration::ZERO,
            ..ChartRequest::new(metric)
        }
    }

    #[tokio::test]
    async fn delivers_requested_chart() {
        let mut worker = ChartWorker::new(source);
        worker.request(request(Metric::Ram));
        assert!(worker.is_pending());
        let chart = worker.next().await.expect("chart not delivered");
        assert_eq!(chart.metric(), Metric::Ram);
        assert!((chart.total_span() - 72.0).abs() < 1e-9);
        assert!(!worker.is_pending());
    }

    #[tokio::test]
    async fn newer_request_supersedes_older() {
        let mut worker = ChartWorker::new(source);
        let first = worker.request(request(Metric::Ram));
        let second = worker.request(request(Metric::Cpu));
        assert!(second > first);
        let chart = worker.next().await.expect("chart not delivered");
        assert_eq!(chart.metric(), Metric::Cpu);
        assert!((chart.total_span() - 90.0).abs() < 1e-9);
        assert!(worker.next().await.is_none());
    }

    #[tokio::test]
    async fn cancelled_request_yields_nothing() {
        let mut worker = ChartWorker::new(source);
        worker.request(request(Metric::Ram));
        worker.cancel();
        assert!(worker.next().await.is_none());
    }
}
