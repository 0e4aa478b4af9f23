use std::{cmp::Ordering, collections::BinaryHeap};

use log::{debug, info, trace, warn};
use thiserror::Error;

use crate::grid::{CellStatus, CellStorage, GridMap, Point};

/// Precondition failures reported by [`PathFinder`]. None of them change the
/// grid or the finder.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    #[error("no start cell has been placed")]
    MissingStart,
    #[error("no end cell has been placed")]
    MissingEnd,
    #[error("advance called before a search was started")]
    NotStarted,
    #[error("the grid was edited or replaced since the search started")]
    GridChanged,
}

/// What a single call to [`PathFinder::advance`] achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    InProgress,
    Found,
    Exhausted,
}

impl StepResult {
    pub fn is_done(&self) -> bool {
        !matches!(self, StepResult::InProgress)
    }
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct PathResult {
    /// Every cell from start to goal, both included
    pub path: Vec<Point>,
    pub start: Point,
    pub goal: Point,
    pub total_cost: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFinderState {
    Idle,
    Running,
    Found(PathResult),
    Exhausted,
}

/// The objects that we store in the priority queue
#[derive(Debug)]
struct ToVisit {
    cost: usize,
    // insertion counter, breaks ties between equal costs in arrival order
    order: u64,
    point: Point,
}

impl Ord for ToVisit {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse for BinaryHeap to be a min-heap
        self.cost
            .cmp(&other.cost)
            .then(self.order.cmp(&other.order))
            .reverse()
    }
}

impl PartialOrd for ToVisit {
    fn partial_cmp(&self, other: &ToVisit) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ToVisit {
    fn eq(&self, other: &ToVisit) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ToVisit {}

/// Bookkeeping for one run. Lives only as long as the run.
#[derive(Debug)]
pub struct SearchState {
    start: Point,
    goal: Point,
    // the grid this run was started on
    size: usize,
    revision: u64,
    // None stands for an unreached cell (infinite distance)
    distance: CellStorage<Option<usize>>,
    previous: CellStorage<Option<Point>>,
    visited: CellStorage<bool>,
    frontier: BinaryHeap<ToVisit>,
    next_order: u64,
    visited_count: usize,
}

impl SearchState {
    fn new(grid: &GridMap, start: Point, goal: Point) -> Self {
        let mut state = Self {
            start,
            goal,
            size: grid.size(),
            revision: grid.revision(),
            distance: grid.create_storage(),
            previous: grid.create_storage(),
            visited: grid.create_storage(),
            frontier: BinaryHeap::new(),
            next_order: 0,
            visited_count: 0,
        };
        *state.distance.get_mut(start) = Some(0);
        state.push(0, start);
        state
    }

    fn push(&mut self, cost: usize, point: Point) {
        self.frontier.push(ToVisit {
            cost,
            order: self.next_order,
            point,
        });
        self.next_order += 1;
    }

    /// Pops the cheapest entry whose cell is not finalized yet. Stale entries
    /// left behind by later improvements are dropped on the way.
    fn pop_fresh(&mut self) -> Option<ToVisit> {
        while let Some(visit) = self.frontier.pop() {
            if !self.visited.get(visit.point) {
                return Some(visit);
            }
        }
        None
    }

    /// Follows the predecessor pointers back from the goal
    fn backtrack(&self) -> Vec<Point> {
        let mut path = vec![self.goal];
        let mut current = self.goal;

        while let Some(from) = self.previous.get(current) {
            path.push(from);
            current = from;
        }

        path.reverse();
        path
    }

    /// Best known distance from the start, `None` while unreached
    pub fn distance(&self, point: Point) -> Option<usize> {
        if self.distance.is_valid(point) {
            self.distance.get(point)
        } else {
            None
        }
    }

    pub fn previous(&self, point: Point) -> Option<Point> {
        if self.previous.is_valid(point) {
            self.previous.get(point)
        } else {
            None
        }
    }

    /// True once the shortest distance of the cell is final
    pub fn is_visited(&self, point: Point) -> bool {
        self.visited.is_valid(point) && self.visited.get(point)
    }

    pub fn visited_count(&self) -> usize {
        self.visited_count
    }

    /// Number of queued entries, stale ones included
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }
}

/// Dijkstra over a unit-weight grid, revealed one finalized cell per call.
///
/// The finder never owns the grid. Each call borrows it, reads walls through
/// [`GridMap::neighbors_of`] and writes Frontier/Path markers for display.
/// The caller decides when to advance; nothing here blocks or sleeps.
#[derive(Debug)]
pub struct PathFinder {
    state: PathFinderState,
    search: Option<SearchState>,
    steps: usize,
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathFinder {
    pub fn new() -> Self {
        Self {
            state: PathFinderState::Idle,
            search: None,
            steps: 0,
        }
    }

    /// Begins a new run from the grid's start to its end. Any previous run is
    /// dropped and the markers it left on the grid are cleared.
    pub fn start(&mut self, grid: &mut GridMap) -> Result<(), SearchError> {
        let start = grid.start().ok_or(SearchError::MissingStart)?;
        let goal = grid.end().ok_or(SearchError::MissingEnd)?;

        grid.clear_search_marks();

        debug!("starting search from {} to {}", start, goal);
        self.search = Some(SearchState::new(grid, start, goal));
        self.state = PathFinderState::Running;
        self.steps = 0;
        Ok(())
    }

    /// Finalizes at most one cell and reports where the run stands.
    ///
    /// Once the run is over the same terminal result is returned again
    /// without touching anything. A grid of another size, or one edited
    /// since [`PathFinder::start`], is refused with
    /// [`SearchError::GridChanged`]; start again to search the new layout.
    pub fn advance(&mut self, grid: &mut GridMap) -> Result<StepResult, SearchError> {
        match self.state {
            PathFinderState::Idle => return Err(SearchError::NotStarted),
            PathFinderState::Found(_) => return Ok(StepResult::Found),
            PathFinderState::Exhausted => return Ok(StepResult::Exhausted),
            PathFinderState::Running => {}
        }
        let search = self.search.as_mut().ok_or(SearchError::NotStarted)?;
        if grid.size() != search.size || grid.revision() != search.revision {
            warn!("grid changed under a running search");
            return Err(SearchError::GridChanged);
        }
        self.steps += 1;

        let Some(visit) = search.pop_fresh() else {
            info!("no path after {} steps", self.steps);
            self.state = PathFinderState::Exhausted;
            return Ok(StepResult::Exhausted);
        };

        *search.visited.get_mut(visit.point) = true;
        search.visited_count += 1;
        if visit.point != search.start {
            grid.mark(visit.point, CellStatus::Frontier);
        }
        trace!(
            "step {}: visiting {} at distance {}",
            self.steps,
            visit.point,
            visit.cost
        );

        if visit.point == search.goal {
            let path = search.backtrack();
            for point in &path {
                if *point != search.start && *point != search.goal {
                    grid.mark(*point, CellStatus::Path);
                }
            }
            info!(
                "path found after {} steps: {} cells, cost {}",
                self.steps,
                path.len(),
                visit.cost
            );

            self.state = PathFinderState::Found(PathResult {
                path,
                start: search.start,
                goal: search.goal,
                total_cost: visit.cost,
            });
            return Ok(StepResult::Found);
        }

        let neighbors: Vec<Point> = grid.neighbors_of(visit.point).collect();
        for next in neighbors {
            if search.visited.get(next) {
                continue;
            }
            let candidate = visit.cost + 1;
            if search.distance.get(next).map_or(true, |d| candidate < d) {
                *search.distance.get_mut(next) = Some(candidate);
                *search.previous.get_mut(next) = Some(visit.point);
                search.push(candidate, next);
                if next != search.goal {
                    grid.mark(next, CellStatus::Frontier);
                }
            }
        }

        Ok(StepResult::InProgress)
    }

    /// Advances until the run is over
    pub fn finish(&mut self, grid: &mut GridMap) -> Result<StepResult, SearchError> {
        loop {
            match self.advance(grid)? {
                StepResult::InProgress => {}
                s => return Ok(s),
            }
        }
    }

    /// Drops the current run. Grid markers are left as they are.
    pub fn reset(&mut self) {
        self.state = PathFinderState::Idle;
        self.search = None;
        self.steps = 0;
    }

    pub fn state(&self) -> &PathFinderState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, PathFinderState::Running)
    }

    pub fn search(&self) -> Option<&SearchState> {
        self.search.as_ref()
    }

    /// The reconstructed path, once found
    pub fn path(&self) -> Option<&PathResult> {
        match &self.state {
            PathFinderState::Found(result) => Some(result),
            _ => None,
        }
    }

    /// Number of `advance` calls that did work in the current run
    pub fn steps(&self) -> usize {
        self.steps
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::parse_grid;

    fn p(row: usize, col: usize) -> Point {
        Point::new(row, col)
    }

    fn run(grid: &mut GridMap) -> (PathFinder, StepResult) {
        let mut finder = PathFinder::new();
        finder.start(grid).unwrap();
        let result = finder.finish(grid).unwrap();
        (finder, result)
    }

    /// Records the grid after every advance call
    fn record_frames(grid: &mut GridMap) -> (Vec<String>, Option<PathResult>) {
        let mut finder = PathFinder::new();
        finder.start(grid).unwrap();
        let mut frames = Vec::new();
        loop {
            let result = finder.advance(grid).unwrap();
            frames.push(grid.to_string());
            if result.is_done() {
                return (frames, finder.path().cloned());
            }
        }
    }

    fn assert_valid_path(grid: &GridMap, result: &PathResult) {
        assert_eq!(result.path.first(), Some(&result.start));
        assert_eq!(result.path.last(), Some(&result.goal));
        assert_eq!(result.path.len(), result.total_cost + 1);
        for pair in result.path.windows(2) {
            assert!(
                grid.neighbors_of(pair[0]).any(|n| n == pair[1]),
                "{} -> {} is not a move",
                pair[0],
                pair[1]
            );
        }
        assert!(result.path.iter().all(|point| !grid.is_wall(*point)));
    }

    #[test]
    fn test_open_grid_corner_to_corner() {
        let mut grid = GridMap::new(5);
        grid.set_start(p(0, 0));
        grid.set_end(p(4, 4));

        let (finder, result) = run(&mut grid);
        assert_eq!(result, StepResult::Found);

        let found = finder.path().unwrap();
        assert_eq!(found.path.len(), 9);
        assert_eq!(found.total_cost, 8);
        assert_valid_path(&grid, found);

        let path_cells = grid
            .points()
            .filter(|point| grid.status_of(*point) == Some(CellStatus::Path))
            .count();
        assert_eq!(path_cells, 7);
        assert_eq!(grid.status_of(p(0, 0)), Some(CellStatus::Start));
        assert_eq!(grid.status_of(p(4, 4)), Some(CellStatus::End));
    }

    #[test]
    fn test_open_grid_distance_is_manhattan() {
        let pairs = [
            (p(0, 0), p(0, 5)),
            (p(3, 2), p(7, 6)),
            (p(7, 7), p(0, 1)),
            (p(5, 0), p(2, 3)),
        ];
        for (start, end) in pairs {
            let mut grid = GridMap::new(8);
            grid.set_start(start);
            grid.set_end(end);

            let (finder, result) = run(&mut grid);
            assert_eq!(result, StepResult::Found);
            let search = finder.search().unwrap();
            assert_eq!(search.distance(end), Some(start.manhattan(&end)));
            assert_eq!(finder.path().unwrap().total_cost, start.manhattan(&end));
        }
    }

    #[test]
    fn test_forced_detour() {
        let mut grid = parse_grid(
            "S..\n\
             .X.\n\
             .XE\n",
        )
        .unwrap();

        let (finder, result) = run(&mut grid);
        assert_eq!(result, StepResult::Found);

        let found = finder.path().unwrap();
        assert_eq!(found.total_cost, 4);
        assert_eq!(found.path, vec![p(0, 0), p(0, 1), p(0, 2), p(1, 2), p(2, 2)]);
        assert_valid_path(&grid, found);
        assert_eq!(grid.status_of(p(0, 1)), Some(CellStatus::Path));
    }

    #[test]
    fn test_enclosed_goal_is_exhausted() {
        let mut grid = parse_grid(
            "S....\n\
             .....\n\
             ..X..\n\
             .XEX.\n\
             ..X..\n",
        )
        .unwrap();

        let (finder, result) = run(&mut grid);
        assert_eq!(result, StepResult::Exhausted);
        assert_eq!(finder.state(), &PathFinderState::Exhausted);
        assert!(finder.path().is_none());
        assert!(grid
            .points()
            .all(|point| grid.status_of(point) != Some(CellStatus::Path)));
        // every reachable cell got finalized
        assert_eq!(finder.search().unwrap().visited_count(), 25 - 4 - 1);
    }

    #[test]
    fn test_adjacent_goal() {
        let mut grid = GridMap::new(4);
        grid.set_start(p(1, 1));
        grid.set_end(p(1, 2));

        let mut finder = PathFinder::new();
        finder.start(&mut grid).unwrap();
        assert_eq!(finder.advance(&mut grid), Ok(StepResult::InProgress));
        assert_eq!(finder.advance(&mut grid), Ok(StepResult::Found));

        let found = finder.path().unwrap();
        assert_eq!(found.path, vec![p(1, 1), p(1, 2)]);
        assert_eq!(found.total_cost, 1);
    }

    #[test]
    fn test_first_step_marks_open_neighbors() {
        let mut grid = GridMap::new(3);
        grid.set_start(p(1, 1));
        grid.set_end(p(0, 1));
        grid.set_wall(p(1, 0));

        let mut finder = PathFinder::new();
        finder.start(&mut grid).unwrap();
        finder.advance(&mut grid).unwrap();

        assert_eq!(grid.status_of(p(1, 2)), Some(CellStatus::Frontier));
        assert_eq!(grid.status_of(p(2, 1)), Some(CellStatus::Frontier));
        assert_eq!(grid.status_of(p(1, 0)), Some(CellStatus::Wall));
        assert_eq!(grid.status_of(p(0, 1)), Some(CellStatus::End));
        assert_eq!(grid.status_of(p(1, 1)), Some(CellStatus::Start));

        let search = finder.search().unwrap();
        assert!(search.is_visited(p(1, 1)));
        assert!(!search.is_visited(p(1, 2)));
        assert_eq!(search.distance(p(1, 2)), Some(1));
        assert_eq!(search.previous(p(2, 1)), Some(p(1, 1)));
        assert_eq!(search.distance(p(0, 0)), None);
        assert_eq!(search.previous(p(1, 1)), None);
    }

    #[test]
    fn test_ties_pop_in_discovery_order() {
        let mut grid = GridMap::new(3);
        grid.set_start(p(1, 1));
        grid.set_end(p(0, 0));

        let mut finder = PathFinder::new();
        finder.start(&mut grid).unwrap();
        finder.advance(&mut grid).unwrap();

        // right, down, left, up were discovered in that order at distance 1
        let expected = [p(1, 2), p(2, 1), p(1, 0), p(0, 1)];
        for (i, point) in expected.iter().enumerate() {
            finder.advance(&mut grid).unwrap();
            let search = finder.search().unwrap();
            assert!(search.is_visited(*point), "step {} should visit {}", i, point);
            assert_eq!(search.visited_count(), i + 2);
        }
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let mut grid = GridMap::new(3);
        grid.set_start(p(0, 0));
        grid.set_end(p(2, 2));

        let (mut finder, result) = run(&mut grid);
        assert_eq!(result, StepResult::Found);

        let snapshot = grid.clone();
        let steps = finder.steps();
        let state = finder.state().clone();
        for _ in 0..3 {
            assert_eq!(finder.advance(&mut grid), Ok(StepResult::Found));
        }
        assert_eq!(grid, snapshot);
        assert_eq!(finder.steps(), steps);
        assert_eq!(finder.state(), &state);

        grid.set_wall(p(1, 0));
        grid.set_wall(p(0, 1));
        let (mut finder, result) = run(&mut grid);
        assert_eq!(result, StepResult::Exhausted);
        assert_eq!(finder.advance(&mut grid), Ok(StepResult::Exhausted));
    }

    #[test]
    fn test_terminates_within_cell_count() {
        let layouts = [
            "S....\n.....\n.....\n.....\n....E\n",
            "S.X..\n.XX..\n.....\n.....\n....E\n",
            "SX...\nX....\n.....\n.....\n....E\n",
            "S....\nXXXX.\n.....\n.XXXX\n....E\n",
        ];
        for layout in layouts {
            let mut grid = parse_grid(layout).unwrap();
            let limit = grid.size() * grid.size();

            let mut finder = PathFinder::new();
            finder.start(&mut grid).unwrap();
            let mut calls = 0;
            while !finder.advance(&mut grid).unwrap().is_done() {
                calls += 1;
                assert!(calls < limit, "no terminal state for\n{}", layout);
            }
            assert!(calls + 1 <= limit);
        }
    }

    #[test]
    fn test_runs_are_deterministic() {
        let layout = "S......\n\
                      .XXX.X.\n\
                      ...X...\n\
                      .X.X.X.\n\
                      .X...X.\n\
                      .XXXXX.\n\
                      ......E\n";

        let (frames_a, path_a) = record_frames(&mut parse_grid(layout).unwrap());
        let (frames_b, path_b) = record_frames(&mut parse_grid(layout).unwrap());

        assert_eq!(frames_a, frames_b);
        assert_eq!(path_a, path_b);
        assert!(path_a.is_some());
    }

    #[test]
    fn test_preconditions() {
        let mut grid = GridMap::new(3);
        let mut finder = PathFinder::new();

        assert_eq!(finder.advance(&mut grid), Err(SearchError::NotStarted));
        assert_eq!(finder.start(&mut grid), Err(SearchError::MissingStart));

        grid.set_start(p(0, 0));
        assert_eq!(finder.start(&mut grid), Err(SearchError::MissingEnd));
        assert_eq!(finder.state(), &PathFinderState::Idle);
        assert_eq!(finder.advance(&mut grid), Err(SearchError::NotStarted));
        assert_eq!(grid.status_of(p(0, 0)), Some(CellStatus::Start));

        grid.set_end(p(2, 2));
        assert_eq!(finder.start(&mut grid), Ok(()));
        assert!(finder.is_running());

        finder.reset();
        assert_eq!(finder.advance(&mut grid), Err(SearchError::NotStarted));
    }

    #[test]
    fn test_other_grid_is_refused() {
        let mut small = GridMap::new(3);
        small.set_start(p(0, 0));
        small.set_end(p(2, 2));
        let mut large = GridMap::new(5);

        let mut finder = PathFinder::new();
        finder.start(&mut small).unwrap();
        assert_eq!(finder.finish(&mut large), Err(SearchError::GridChanged));
        assert_eq!(large, GridMap::new(5));
        assert_eq!(finder.steps(), 0);

        // the original grid can still be searched
        assert_eq!(finder.finish(&mut small), Ok(StepResult::Found));
    }

    #[test]
    fn test_edit_during_run_is_refused() {
        let mut grid = GridMap::new(3);
        grid.set_start(p(0, 0));
        grid.set_end(p(0, 2));

        let mut finder = PathFinder::new();
        finder.start(&mut grid).unwrap();
        assert_eq!(finder.advance(&mut grid), Ok(StepResult::InProgress));

        // (0, 1) is queued already
        grid.set_wall(p(0, 1));
        assert_eq!(finder.finish(&mut grid), Err(SearchError::GridChanged));
        assert!(finder.path().is_none());
        assert_eq!(grid.status_of(p(0, 1)), Some(CellStatus::Wall));

        // a fresh run goes around the wall
        finder.start(&mut grid).unwrap();
        assert_eq!(finder.finish(&mut grid), Ok(StepResult::Found));
        let found = finder.path().unwrap();
        assert_eq!(found.total_cost, 4);
        assert!(!found.path.contains(&p(0, 1)));
        assert_valid_path(&grid, found);
    }

    #[test]
    fn test_walling_a_visited_cell_is_refused() {
        let mut grid = GridMap::new(4);
        grid.set_start(p(0, 0));
        grid.set_end(p(0, 3));

        let mut finder = PathFinder::new();
        finder.start(&mut grid).unwrap();
        finder.advance(&mut grid).unwrap();
        finder.advance(&mut grid).unwrap();
        assert!(finder.search().unwrap().is_visited(p(0, 1)));

        grid.set_wall(p(0, 1));
        assert_eq!(finder.advance(&mut grid), Err(SearchError::GridChanged));

        // erasing the wall again is still an edit
        grid.erase(p(0, 1));
        assert_eq!(finder.advance(&mut grid), Err(SearchError::GridChanged));
    }

    #[test]
    fn test_restart_clears_previous_marks() {
        let mut grid = GridMap::new(5);
        grid.set_start(p(0, 0));
        grid.set_end(p(0, 4));
        run(&mut grid);
        assert_eq!(grid.status_of(p(0, 2)), Some(CellStatus::Path));

        // move the end and restart in the middle of nowhere
        grid.erase(p(0, 4));
        grid.set_end(p(4, 0));
        let mut finder = PathFinder::new();
        finder.start(&mut grid).unwrap();
        assert!(grid.points().all(|point| !grid
            .status_of(point)
            .is_some_and(|s| s.is_search_mark())));

        assert_eq!(finder.finish(&mut grid), Ok(StepResult::Found));
        assert_eq!(grid.status_of(p(2, 0)), Some(CellStatus::Path));
        assert_ne!(grid.status_of(p(0, 2)), Some(CellStatus::Path));
    }

    #[test]
    fn test_start_while_running_discards_run() {
        let mut grid = GridMap::new(6);
        grid.set_start(p(0, 0));
        grid.set_end(p(5, 5));

        let mut finder = PathFinder::new();
        finder.start(&mut grid).unwrap();
        for _ in 0..5 {
            finder.advance(&mut grid).unwrap();
        }
        finder.start(&mut grid).unwrap();
        assert_eq!(finder.steps(), 0);
        assert_eq!(finder.search().unwrap().visited_count(), 0);
        assert_eq!(finder.search().unwrap().frontier_len(), 1);

        assert_eq!(finder.finish(&mut grid), Ok(StepResult::Found));
        assert_eq!(finder.path().unwrap().total_cost, 10);
    }
}
