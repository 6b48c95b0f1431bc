//! Explores the two directions of a node concurrently with [`rayon::join`].
//!
//! The first branch to reach the goal publishes its path, every other branch polls the
//! shared flag before entering a node and stops. `found` always agrees with
//! [`crate::solve`], the path may be a different one when the maze has several.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    OnceLock,
};

use log::debug;

use crate::find::{MapStorage, MapTrait, Mark, PathFinderState, PathResult};
use crate::grid::{CellStorage, GridMap, Point};

#[derive(Debug, Clone, Copy)]
pub struct ParallelOptions {
    /// Branches deeper than this are explored sequentially
    pub split_depth: usize,
}

impl Default for ParallelOptions {
    fn default() -> Self {
        Self { split_depth: 12 }
    }
}

struct Search<'a, F> {
    map: &'a GridMap,
    goal: Point,
    split_depth: usize,
    solved: AtomicBool,
    path: OnceLock<Vec<Point>>,
    visited: Vec<Vec<AtomicBool>>,
    on_visit: &'a F,
}

impl<'a, F: Fn(Point) + Sync> Search<'a, F> {
    fn is_safe(&self, marks: &CellStorage<Mark>, point: Point) -> bool {
        !self.solved.load(Ordering::Acquire)
            && self.map.is_valid(point)
            && marks.get(point) == Mark::Free
    }

    fn explore(&self, point: Point, mut marks: CellStorage<Mark>, mut trail: Vec<Point>) {
        if !self.is_safe(&marks, point) {
            return;
        }

        *marks.get_mut(point) = Mark::OnPath;
        self.visited[point.row][point.col].store(true, Ordering::Relaxed);
        (self.on_visit)(point);
        trail.push(point);

        if point == self.goal {
            // only the first branch to flip the flag gets to publish
            if self
                .solved
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let _ = self.path.set(trail);
            }
            return;
        }

        let next: Vec<Point> = self
            .map
            .successors_of(point)
            .filter(|p| self.is_safe(&marks, *p))
            .collect();

        match next.as_slice() {
            &[down, right] if trail.len() <= self.split_depth => {
                rayon::join(
                    || self.explore(down, marks.clone(), trail.clone()),
                    || self.explore(right, marks.clone(), trail.clone()),
                );
            }
            _ => {
                for &p in &next {
                    if self.solved.load(Ordering::Acquire) {
                        break;
                    }
                    self.explore(p, marks.clone(), trail.clone());
                }
            }
        }
    }
}

pub fn solve(
    map: &GridMap,
    options: &ParallelOptions,
) -> (PathFinderState<Point>, CellStorage<bool>) {
    solve_with(map, options, &|_| {})
}

/// Like [`solve`], `on_visit` is called from whatever thread marks the node
pub fn solve_with<F: Fn(Point) + Sync>(
    map: &GridMap,
    options: &ParallelOptions,
    on_visit: &F,
) -> (PathFinderState<Point>, CellStorage<bool>) {
    let start = map.start();
    if !map.is_free(start) {
        return (PathFinderState::InvalidStart, map.create_storage());
    }

    let search = Search {
        map,
        goal: map.goal(),
        split_depth: options.split_depth,
        solved: AtomicBool::new(false),
        path: OnceLock::new(),
        visited: (0..map.size())
            .map(|_| (0..map.size()).map(|_| AtomicBool::new(false)).collect())
            .collect(),
        on_visit,
    };

    debug!("searching {0}x{0} maze in parallel", map.size());
    // returns once every spawned branch has been joined
    search.explore(start, map.create_marks(), Vec::new());

    let mut visited: CellStorage<bool> = map.create_storage();
    for (row, cells) in search.visited.into_iter().enumerate() {
        for (col, value) in cells.into_iter().enumerate() {
            *visited.get_mut(Point { row, col }) = value.into_inner();
        }
    }

    let state = match search.path.into_inner() {
        Some(path) => PathFinderState::PathFound(PathResult {
            path,
            start,
            goal: map.goal(),
        }),
        None => PathFinderState::NoPathFound,
    };
    debug!("parallel search done: {:?}", state);

    (state, visited)
}
