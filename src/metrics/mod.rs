//! Operation counters and latency tracking for the simulator, mirrored to
//! the `metrics` facade so any installed recorder (the demo binary uses
//! Prometheus) can scrape them.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::info;

/// Counters and gauges for one simulation run.
#[derive(Debug)]
pub struct SimulatorMetrics {
    submit_latency: LatencyTracker,
    cancel_latency: LatencyTracker,

    orders_submitted: AtomicU64,
    orders_rejected: AtomicU64,
    orders_cancelled: AtomicU64,
    trades_executed: AtomicU64,
    market_data_ticks: AtomicU64,

    total_volume: AtomicU64,
}

impl SimulatorMetrics {
    pub fn new() -> Self {
        describe_counter!("simulator_orders_total", "Orders submitted, by outcome");
        describe_counter!("simulator_trades_total", "Trades executed");
        describe_counter!("simulator_volume_total", "Shares traded");
        describe_counter!("simulator_ticks_total", "Market data ticks published");
        describe_gauge!("simulator_resting_orders", "Orders currently resting across books");
        describe_histogram!(
            "simulator_operation_duration_seconds",
            "Duration of exchange operations"
        );

        Self {
            submit_latency: LatencyTracker::new("submit_order"),
            cancel_latency: LatencyTracker::new("cancel_order"),
            orders_submitted: AtomicU64::new(0),
            orders_rejected: AtomicU64::new(0),
            orders_cancelled: AtomicU64::new(0),
            trades_executed: AtomicU64::new(0),
            market_data_ticks: AtomicU64::new(0),
            total_volume: AtomicU64::new(0),
        }
    }

    pub fn time_submit<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.submit_latency.time(f)
    }

    pub fn time_cancel<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.cancel_latency.time(f)
    }

    pub fn record_order_submitted(&self) {
        self.orders_submitted.fetch_add(1, Ordering::Relaxed);
        counter!("simulator_orders_total", "outcome" => "admitted").increment(1);
    }

    pub fn record_order_rejected(&self) {
        self.orders_rejected.fetch_add(1, Ordering::Relaxed);
        counter!("simulator_orders_total", "outcome" => "rejected").increment(1);
    }

    pub fn record_order_cancelled(&self) {
        self.orders_cancelled.fetch_add(1, Ordering::Relaxed);
        counter!("simulator_orders_total", "outcome" => "cancelled").increment(1);
    }

    pub fn record_trade(&self, quantity: u64) {
        self.trades_executed.fetch_add(1, Ordering::Relaxed);
        self.total_volume.fetch_add(quantity, Ordering::Relaxed);
        counter!("simulator_trades_total").increment(1);
        counter!("simulator_volume_total").increment(quantity);
    }

    pub fn record_tick(&self) {
        self.market_data_ticks.fetch_add(1, Ordering::Relaxed);
        counter!("simulator_ticks_total").increment(1);
    }

    pub fn set_resting_orders(&self, count: u64) {
        gauge!("simulator_resting_orders").set(count as f64);
    }

    pub fn orders_submitted(&self) -> u64 {
        self.orders_submitted.load(Ordering::Relaxed)
    }

    pub fn orders_rejected(&self) -> u64 {
        self.orders_rejected.load(Ordering::Relaxed)
    }

    pub fn orders_cancelled(&self) -> u64 {
        self.orders_cancelled.load(Ordering::Relaxed)
    }

    pub fn trades_executed(&self) -> u64 {
        self.trades_executed.load(Ordering::Relaxed)
    }

    pub fn market_data_ticks(&self) -> u64 {
        self.market_data_ticks.load(Ordering::Relaxed)
    }

    pub fn total_volume(&self) -> u64 {
        self.total_volume.load(Ordering::Relaxed)
    }

    pub fn submit_latency_stats(&self) -> OperationLatencyStats {
        self.submit_latency.stats()
    }

    pub fn cancel_latency_stats(&self) -> OperationLatencyStats {
        self.cancel_latency.stats()
    }
}

impl Default for SimulatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency tracker for one operation.
#[derive(Debug)]
struct LatencyTracker {
    operation: &'static str,
    samples: AtomicU64,
    total_nanos: AtomicU64,
    min_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl LatencyTracker {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            samples: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            min_nanos: AtomicU64::new(u64::MAX),
            max_nanos: AtomicU64::new(0),
        }
    }

    fn time<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record(start.elapsed());
        result
    }

    fn record(&self, duration: Duration) {
        let nanos = duration.as_nanos() as u64;

        self.samples.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.min_nanos.fetch_min(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);

        histogram!(
            "simulator_operation_duration_seconds",
            "operation" => self.operation
        )
        .record(duration.as_secs_f64());
    }

    fn stats(&self) -> OperationLatencyStats {
        let samples = self.samples.load(Ordering::Relaxed);
        let total = self.total_nanos.load(Ordering::Relaxed);
        let min = self.min_nanos.load(Ordering::Relaxed);

        OperationLatencyStats {
            operation: self.operation,
            samples,
            avg_nanos: if samples > 0 { total / samples } else { 0 },
            min_nanos: if min == u64::MAX { 0 } else { min },
            max_nanos: self.max_nanos.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OperationLatencyStats {
    pub operation: &'static str,
    pub samples: u64,
    pub avg_nanos: u64,
    pub min_nanos: u64,
    pub max_nanos: u64,
}

impl OperationLatencyStats {
    pub fn avg_micros(&self) -> f64 {
        self.avg_nanos as f64 / 1_000.0
    }
}

/// Logs a metrics summary line on a fixed interval.
pub struct MetricsReporter {
    metrics: Arc<SimulatorMetrics>,
    period: Duration,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<SimulatorMetrics>, period: Duration) -> Self {
        Self { metrics, period }
    }

    pub async fn run(&self) {
        let mut interval = interval(self.period);

        loop {
            interval.tick().await;

            let submit = self.metrics.submit_latency_stats();
            info!(
                "Simulator metrics - orders: {} admitted, {} rejected, {} cancelled | trades: {} ({} shares) | ticks: {} | submit latency avg {:.2}us",
                self.metrics.orders_submitted(),
                self.metrics.orders_rejected(),
                self.metrics.orders_cancelled(),
                self.metrics.trades_executed(),
                self.metrics.total_volume(),
                self.metrics.market_data_ticks(),
                submit.avg_micros(),
            );
        }
    }
}
