//! Step-by-step Dijkstra over an editable square grid.
//!
//! [`GridMap`] holds what the user drew, [`PathFinder`] walks it one
//! finalized cell per [`PathFinder::advance`] call and leaves Frontier and
//! Path markers behind so a renderer can show progress between calls.

pub mod find;
pub mod grid;
pub mod util;

pub use find::{PathFinder, PathFinderState, PathResult, SearchError, SearchState, StepResult};
pub use grid::{CellStatus, Direction, GridMap, PlaceKind, Point, DEFAULT_GRID_SIZE};
pub use util::parse_grid;
