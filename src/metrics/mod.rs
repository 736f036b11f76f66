// Private module declaration
mod server;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

// Re-export for public API
pub use server::{render_metrics, start_metrics_server, TableHealth};

// ============================================================================
// Metrics Module - Prometheus metrics for the dinner
// ============================================================================
//
// Provides metrics for:
// - Meals eaten per philosopher
// - Back-offs per philosopher and per fork side
// - Observer counter resets
// - Forks picked up right now
// - How many philosophers are eating right now, and for how long
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for a dinner
pub struct Metrics {
    registry: Registry,

    pub meals_total: IntCounterVec,
    pub backoffs_total: IntCounterVec,
    pub counter_resets_total: IntCounter,
    pub philosophers_eating: IntGauge,
    pub forks_held: IntGauge,
    pub eating_duration: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let meals_total = IntCounterVec::new(
            Opts::new("philosopher_meals_total", "Total meals eaten"),
            &["philosopher"],
        )?;
        registry.register(Box::new(meals_total.clone()))?;

        let backoffs_total = IntCounterVec::new(
            Opts::new(
                "philosopher_backoffs_total",
                "Attempts abandoned because a fork was busy",
            ),
            &["philosopher", "fork"],
        )?;
        registry.register(Box::new(backoffs_total.clone()))?;

        let counter_resets_total = IntCounter::new(
            "meal_counter_resets_total",
            "Times every philosopher had eaten and the counters were reset",
        )?;
        registry.register(Box::new(counter_resets_total.clone()))?;

        let philosophers_eating = IntGauge::new(
            "philosophers_eating",
            "Philosophers currently holding both forks",
        )?;
        registry.register(Box::new(philosophers_eating.clone()))?;

        let forks_held = IntGauge::new("forks_held", "Forks currently picked up")?;
        registry.register(Box::new(forks_held.clone()))?;

        let eating_duration = Histogram::with_opts(
            HistogramOpts::new("eating_duration_seconds", "Time spent holding both forks")
                .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        registry.register(Box::new(eating_duration.clone()))?;

        Ok(Self {
            registry,
            meals_total,
            backoffs_total,
            counter_resets_total,
            philosophers_eating,
            forks_held,
            eating_duration,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn fork_picked_up(&self) {
        self.forks_held.inc();
    }

    pub fn fork_put_down(&self) {
        self.forks_held.dec();
    }

    /// A philosopher picked up both forks
    pub fn eating_started(&self) {
        self.philosophers_eating.inc();
    }

    /// A philosopher finished a meal
    pub fn eating_finished(&self, philosopher: usize, duration_secs: f64) {
        let id = philosopher.to_string();
        self.philosophers_eating.dec();
        self.meals_total.with_label_values(&[id.as_str()]).inc();
        self.eating_duration.observe(duration_secs);
    }

    /// A philosopher found `fork` ("left" or "right") busy
    pub fn record_backoff(&self, philosopher: usize, fork: &str) {
        let id = philosopher.to_string();
        self.backoffs_total.with_label_values(&[id.as_str(), fork]).inc();
    }

    pub fn record_reset(&self) {
        self.counter_resets_total.inc();
    }

    /// Sum of meals across all philosophers
    pub fn total_meals(&self) -> u64 {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.name() == "philosopher_meals_total")
            .flat_map(|family| family.metric.iter())
            .filter_map(|metric| metric.counter.value)
            .sum::<f64>() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(metrics.registry.gather().len() > 0);
    }

    #[test]
    fn test_record_meal() {
        let metrics = Metrics::new().unwrap();
        metrics.eating_started();
        assert_eq!(metrics.philosophers_eating.get(), 1);

        metrics.eating_finished(2, 0.05);
        assert_eq!(metrics.philosophers_eating.get(), 0);

        let gathered = metrics.registry.gather();
        let meals = gathered.iter().find(|m| m.name() == "philosopher_meals_total").unwrap();
        assert_eq!(meals.metric[0].counter.value, Some(1.0));
        assert_eq!(metrics.eating_duration.get_sample_count(), 1);
    }

    #[test]
    fn test_record_backoff() {
        let metrics = Metrics::new().unwrap();
        metrics.record_backoff(0, "left");
        metrics.record_backoff(0, "right");
        metrics.record_backoff(0, "right");

        let gathered = metrics.registry.gather();
        let backoffs = gathered.iter().find(|m| m.name() == "philosopher_backoffs_total").unwrap();
        assert_eq!(backoffs.metric.len(), 2); // One series per fork side
    }

    #[test]
    fn test_forks_held_gauge() {
        let metrics = Metrics::new().unwrap();
        metrics.fork_picked_up();
        metrics.fork_picked_up();
        metrics.fork_put_down();

        let gathered = metrics.registry.gather();
        let held = gathered.iter().find(|m| m.name() == "forks_held").unwrap();
        assert_eq!(held.metric[0].gauge.value, Some(1.0));
    }

    #[test]
    fn test_record_reset() {
        let metrics = Metrics::new().unwrap();
        metrics.record_reset();
        metrics.record_reset();

        assert_eq!(metrics.counter_resets_total.get(), 2);
    }

    #[test]
    fn test_total_meals_sums_philosophers() {
        let metrics = Metrics::new().unwrap();
        for philosopher in [0, 1, 1, 4] {
            metrics.eating_started();
            metrics.eating_finished(philosopher, 0.01);
        }

        assert_eq!(metrics.total_meals(), 4);
    }
}
