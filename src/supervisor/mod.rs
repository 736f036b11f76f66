// ============================================================================
// Supervisor Module
// ============================================================================
//
// Runs a dinner: builds the shared table, spawns one task per philosopher
// plus the observer, and joins every one of them before the table goes away.
//
// Structure:
// - coordinator - Supervisor (spawn, join, failure handling)
// - observer    - Periodic "everyone ate -> reset counters" check
// - report      - DinnerReport returned when the dinner ends
//
// ============================================================================

mod coordinator;
mod observer;
mod report;

pub use coordinator::Supervisor;
pub use observer::Observer;
pub use report::DinnerReport;
