use thiserror::Error;

/// Reasons to refuse a maze before searching it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("the first cell can't be blocked")]
    InvalidStart,
    #[error("the maze needs at least one blocked cell")]
    NoObstacles,
}
