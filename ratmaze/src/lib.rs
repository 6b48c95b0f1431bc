//! Finds a way for a rat through a square maze, moving only down or right from the top
//! left corner to the bottom right one.
//!
//! The search is a plain depth-first search with backtracking. It can be driven to the
//! end with [`solve`] or one node at a time with [`PathFinder::step`], and keeps a trace of
//! every visited cell so callers can show how it explored the maze.

mod error;
mod find;
mod grid;
pub mod parallel;
pub mod util;

pub use error::Rejection;
pub use find::*;
pub use grid::*;
