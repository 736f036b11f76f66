// ============================================================================
// Dining Philosophers
// ============================================================================
//
// A table of philosophers contending for the forks between them.
//
// Structure:
// - table/      - Forks, philosophers and the shared progress counters
// - supervisor/ - Spawns the diners and the observer, joins them, reports
// - config      - Table configuration (serde + validation)
// - metrics     - Prometheus metrics and the optional exporter
//
// ============================================================================

pub mod config;
pub mod metrics;
pub mod supervisor;
pub mod table;

pub use config::{ConfigError, DurationRange, TableConfig};
pub use metrics::Metrics;
pub use supervisor::{DinnerReport, Observer, Supervisor};
pub use table::{
    Attempt, ForkPool, Philosopher, PhilosopherStats, ProgressTracker, ResourcePool, Table,
    TableError,
};
