// ============================================================================
// Table Errors
// ============================================================================
//
// Contention is not an error: a busy fork is an ordinary `Attempt` outcome.
// These variants are contract violations and task failures only.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("Fork {fork} released while not held")]
    ForkNotHeld { fork: usize },

    #[error("A table needs at least 2 seats, got {seats}")]
    TableTooSmall { seats: usize },

    #[error("Philosopher {id} has no seat at a table of {seats}")]
    UnknownPhilosopher { id: usize, seats: usize },

    #[error("Task failed: {0}")]
    TaskFailed(String),
}
