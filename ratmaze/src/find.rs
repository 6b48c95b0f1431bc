use std::fmt::{Debug, Display};

use log::{debug, trace};
use serde::Serialize;

use crate::grid::Cell;

/// Supertrait that collects all the requirements on the NodeReference values
/// Must be copy, comparable and not references (hence 'static)
pub trait NodeReference: Copy + Eq + Debug + 'static {}

pub trait MapTrait {
    /// The type that can be used to reference nodes in the map
    type Reference: NodeReference;

    /// The type that the map uses for storage. Cloning gives an independent copy.
    type Storage<T: Default + Copy + 'static>: MapStorage<T, Reference = Self::Reference> + Clone;

    /// Check if the provided node reference is inside the map
    fn is_valid(&self, node: Self::Reference) -> bool;

    /// Check if the provided node is inside the map and not blocked
    fn is_free(&self, node: Self::Reference) -> bool;

    fn start(&self) -> Self::Reference;
    fn goal(&self) -> Self::Reference;

    /// Return the nodes reachable in one move from the provided node, in the order they
    /// should be explored. Only nodes inside the map are returned.
    fn successors_of(&self, node: Self::Reference) -> impl Iterator<Item = Self::Reference>;

    /// Create a storage for values of type T
    fn create_storage<T: Default + Copy + 'static>(&self) -> Self::Storage<T>;

    /// Create a working copy of the map where every cell is either free or blocked
    fn create_marks(&self) -> Self::Storage<Mark>;
}

pub trait MapStorage<T> {
    type Reference: NodeReference;

    fn is_valid(&self, node: Self::Reference) -> bool;
    fn get(&self, node: Self::Reference) -> T;
    fn get_mut(&mut self, node: Self::Reference) -> &mut T;
}

/// A cell of the working copy a search branch carries around
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Mark {
    #[default]
    Free,
    Blocked,
    /// Part of the candidate path of the branch owning this copy
    OnPath,
}

impl From<Cell> for Mark {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Free => Mark::Free,
            Cell::Blocked => Mark::Blocked,
        }
    }
}

impl Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Mark::Free => ".",
                Mark::Blocked => "X",
                Mark::OnPath => "*",
            }
        )
    }
}

#[derive(Debug, PartialEq, Clone, Eq, Serialize)]
pub struct PathResult<R> {
    /// Every node from start to goal, both included
    pub path: Vec<R>,
    pub start: R,
    pub goal: R,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFinderState<R> {
    Computing,
    /// The start node is blocked, nothing was searched
    InvalidStart,
    NoPathFound,
    PathFound(PathResult<R>),
}

impl<R> PathFinderState<R> {
    pub fn is_done(&self) -> bool {
        !matches!(self, PathFinderState::Computing)
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PathFinderState::PathFound(_))
    }

    pub fn path(&self) -> Option<&[R]> {
        match self {
            PathFinderState::PathFound(result) => Some(&result.path),
            _ => None,
        }
    }
}

/// Receives the progress of a search while it runs, e.g. to draw it step by step
pub trait SearchObserver<R> {
    /// `node` was marked as visited
    fn on_visit(&mut self, node: R);

    /// Every direction out of `node` was tried without reaching the goal
    fn on_backtrack(&mut self, _node: R) {}

    fn on_finish(&mut self, _state: &PathFinderState<R>) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl<R> SearchObserver<R> for NoopObserver {
    fn on_visit(&mut self, _node: R) {}
}

impl<R, F: FnMut(R)> SearchObserver<R> for F {
    fn on_visit(&mut self, node: R) {
        self(node)
    }
}

/// One entered node of the depth-first search
struct Frame<R, S> {
    point: R,
    /// Working copy private to this branch
    marks: S,
    /// Successors not tried yet
    successors: std::vec::IntoIter<R>,
}

/// Depth-first search that only follows the moves given by
/// [`MapTrait::successors_of`]. Every entered node gets its own copy of the marks so
/// sibling branches never see each other's candidate path. The visited map is never
/// reverted and ends up as a trace of everything that was explored.
pub struct PathFinder<M: MapTrait> {
    start: M::Reference,
    goal: M::Reference,
    visited: M::Storage<bool>,
    stack: Vec<Frame<M::Reference, M::Storage<Mark>>>,
    // the start node, waiting for the first step
    pending: Option<M::Storage<Mark>>,
    solved: bool,
    visits: usize,
    state: PathFinderState<M::Reference>,
}

impl<M: MapTrait> PathFinder<M> {
    pub fn new(map: &M) -> Self {
        let start = map.start();
        let state = if map.is_free(start) {
            PathFinderState::Computing
        } else {
            PathFinderState::InvalidStart
        };

        Self {
            start,
            goal: map.goal(),
            visited: map.create_storage(),
            stack: Vec::new(),
            pending: (!state.is_done()).then(|| map.create_marks()),
            solved: false,
            visits: 0,
            state,
        }
    }

    pub fn finish(self, map: &M) -> (PathFinderState<M::Reference>, M::Storage<bool>) {
        self.finish_with(map, &mut NoopObserver)
    }

    pub fn finish_with<O: SearchObserver<M::Reference>>(
        mut self,
        map: &M,
        observer: &mut O,
    ) -> (PathFinderState<M::Reference>, M::Storage<bool>) {
        debug!("searching from {:?} to {:?}", self.start, self.goal);
        loop {
            match self.step_with(map, observer) {
                PathFinderState::Computing => {}
                s => {
                    debug!("search done after {} visits: {:?}", self.visits, s);
                    observer.on_finish(&s);
                    return (s, self.visited);
                }
            }
        }
    }

    pub fn step(&mut self, map: &M) -> PathFinderState<M::Reference> {
        self.step_with(map, &mut NoopObserver)
    }

    /// Does one unit of work: either enter (and mark) one node or backtrack out of one.
    pub fn step_with<O: SearchObserver<M::Reference>>(
        &mut self,
        map: &M,
        observer: &mut O,
    ) -> PathFinderState<M::Reference> {
        if self.state.is_done() {
            return self.state.clone();
        }

        if let Some(marks) = self.pending.take() {
            let start = self.start;
            return self.enter(map, start, marks, observer);
        }

        // pick the next direction of the deepest node that is still worth trying
        let next = match self.stack.last_mut() {
            Some(frame) => {
                let solved = self.solved;
                let marks = &frame.marks;
                frame
                    .successors
                    .find(|&p| !solved && is_safe(map, marks, p))
                    .map(|p| (p, frame.marks.clone()))
            }
            None => {
                self.state = PathFinderState::NoPathFound;
                return self.state.clone();
            }
        };

        match next {
            Some((point, marks)) => self.enter(map, point, marks, observer),
            None => {
                // all directions failed, dropping the frame drops its marker with it
                if let Some(frame) = self.stack.pop() {
                    observer.on_backtrack(frame.point);
                }
                if self.stack.is_empty() {
                    self.state = PathFinderState::NoPathFound;
                }
                self.state.clone()
            }
        }
    }

    fn enter<O: SearchObserver<M::Reference>>(
        &mut self,
        map: &M,
        point: M::Reference,
        mut marks: M::Storage<Mark>,
        observer: &mut O,
    ) -> PathFinderState<M::Reference> {
        // checked for every node, the goal included
        if self.solved || !is_safe(map, &marks, point) {
            if self.stack.is_empty() {
                self.state = PathFinderState::NoPathFound;
            }
            return self.state.clone();
        }

        *marks.get_mut(point) = Mark::OnPath;
        *self.visited.get_mut(point) = true;
        self.visits += 1;
        trace!("visit {:?}", point);
        observer.on_visit(point);

        if point == self.goal {
            // first path found wins, nothing else gets explored
            self.solved = true;
            let path = self
                .stack
                .iter()
                .map(|frame| frame.point)
                .chain(std::iter::once(point))
                .collect();

            self.stack.clear();
            self.state = PathFinderState::PathFound(PathResult {
                path,
                start: self.start,
                goal: self.goal,
            });
            return self.state.clone();
        }

        self.stack.push(Frame {
            point,
            marks,
            successors: map.successors_of(point).collect::<Vec<_>>().into_iter(),
        });

        self.state.clone()
    }

    pub fn state(&self) -> &PathFinderState<M::Reference> {
        &self.state
    }

    pub fn get_visited(&self) -> &M::Storage<bool> {
        &self.visited
    }

    /// Number of times a node was entered so far, nodes reached again through another
    /// branch count again
    pub fn visit_count(&self) -> usize {
        self.visits
    }

    /// The candidate path the search is currently extending
    pub fn current_path(&self) -> impl Iterator<Item = M::Reference> + '_ {
        self.stack.iter().map(|frame| frame.point)
    }

    pub fn start(&self) -> M::Reference {
        self.start
    }

    pub fn goal(&self) -> M::Reference {
        self.goal
    }
}

fn is_safe<M: MapTrait>(map: &M, marks: &M::Storage<Mark>, node: M::Reference) -> bool {
    map.is_valid(node) && marks.get(node) == Mark::Free
}

/// Run a complete search over `map`
pub fn solve<M: MapTrait>(map: &M) -> (PathFinderState<M::Reference>, M::Storage<bool>) {
    PathFinder::new(map).finish(map)
}

/// Run a complete search over `map`, reporting every visit as it happens
pub fn solve_with<M: MapTrait, O: SearchObserver<M::Reference>>(
    map: &M,
    observer: &mut O,
) -> (PathFinderState<M::Reference>, M::Storage<bool>) {
    PathFinder::new(map).finish_with(map, observer)
}
