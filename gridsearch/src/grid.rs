use std::fmt::Display;

use log::debug;

/// Side length used when no explicit size is requested
pub const DEFAULT_GRID_SIZE: usize = 20;

/// The visual status of a single cell.
///
/// Start, End and Wall are owned by the user. Frontier and Path are written
/// by the search and can be wiped with [`GridMap::clear_search_marks`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum CellStatus {
    #[default]
    Empty,
    Wall,
    Start,
    End,
    Frontier,
    Path,
}

impl CellStatus {
    /// True for the markers that a search leaves behind
    pub fn is_search_mark(&self) -> bool {
        matches!(self, CellStatus::Frontier | CellStatus::Path)
    }
}

impl Display for CellStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CellStatus::Empty => ".",
                CellStatus::Wall => "X",
                CellStatus::Start => "S",
                CellStatus::End => "E",
                CellStatus::Frontier => "o",
                CellStatus::Path => "*",
            }
        )
    }
}

/// What the user asked to put into a cell
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PlaceKind {
    Start,
    End,
    Wall,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The order in which neighbors are reported. Search traces depend on it.
    pub const NEIGHBOR_ORDER: [Direction; 4] = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    /// Moves one cell in this direction, or `None` when that would leave a grid
    /// with side length `size`.
    pub fn step(&self, point: Point, size: usize) -> Option<Point> {
        let Point { row, col } = point;
        match self {
            Direction::Up if row > 0 => Some(Point::new(row - 1, col)),
            Direction::Down if row + 1 < size => Some(Point::new(row + 1, col)),
            Direction::Left if col > 0 => Some(Point::new(row, col - 1)),
            Direction::Right if col + 1 < size => Some(Point::new(row, col + 1)),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Number of orthogonal moves between two points
    pub fn manhattan(&self, other: &Point) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A square grid of cells plus the optional start and end points.
///
/// All setters take coordinates that may be out of range; such calls are
/// ignored and report `false`.
#[derive(Debug, Clone)]
pub struct GridMap {
    size: usize,
    cells: Vec<Vec<CellStatus>>,
    start: Option<Point>,
    end: Option<Point>,
    // bumped on every user edit, search markers leave it alone
    revision: u64,
}

impl PartialEq for GridMap {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size
            && self.start == other.start
            && self.end == other.end
            && self.cells == other.cells
    }
}

impl Eq for GridMap {}

impl Default for GridMap {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE)
    }
}

impl GridMap {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![vec![CellStatus::Empty; size]; size],
            start: None,
            end: None,
            revision: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start(&self) -> Option<Point> {
        self.start
    }

    pub fn end(&self) -> Option<Point> {
        self.end
    }

    /// Counter of user edits. Changes whenever a wall, the start or the end
    /// is placed or cleared.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Check if the provided point lies inside the grid
    pub fn is_valid(&self, point: Point) -> bool {
        point.row < self.size && point.col < self.size
    }

    /// Status of a cell, `None` when the point is outside the grid
    pub fn status_of(&self, point: Point) -> Option<CellStatus> {
        self.is_valid(point).then(|| self.cells[point.row][point.col])
    }

    pub fn is_wall(&self, point: Point) -> bool {
        self.status_of(point) == Some(CellStatus::Wall)
    }

    /// Iterates over every point in row-major order
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.size).flat_map(move |row| (0..self.size).map(move |col| Point::new(row, col)))
    }

    /// Turns a cell into a wall unless it is the start or the end
    pub fn set_wall(&mut self, point: Point) -> bool {
        if !self.is_valid(point) || Some(point) == self.start || Some(point) == self.end {
            return false;
        }
        self.cells[point.row][point.col] = CellStatus::Wall;
        self.revision += 1;
        true
    }

    /// Places the start. Rejected when a start exists already, or the cell is
    /// the end or a wall.
    pub fn set_start(&mut self, point: Point) -> bool {
        if self.start.is_some() || !self.can_hold_endpoint(point) {
            return false;
        }
        self.start = Some(point);
        self.cells[point.row][point.col] = CellStatus::Start;
        self.revision += 1;
        true
    }

    /// Places the end, with the same rules as [`GridMap::set_start`]
    pub fn set_end(&mut self, point: Point) -> bool {
        if self.end.is_some() || !self.can_hold_endpoint(point) {
            return false;
        }
        self.end = Some(point);
        self.cells[point.row][point.col] = CellStatus::End;
        self.revision += 1;
        true
    }

    fn can_hold_endpoint(&self, point: Point) -> bool {
        match self.status_of(point) {
            None | Some(CellStatus::Wall | CellStatus::Start | CellStatus::End) => false,
            Some(_) => true,
        }
    }

    /// Resets a cell to Empty, releasing the start or end if it was one.
    /// Returns `false` only when nothing changed.
    pub fn clear(&mut self, point: Point) -> bool {
        let Some(status) = self.status_of(point) else {
            return false;
        };
        match status {
            CellStatus::Empty => return false,
            CellStatus::Start => self.start = None,
            CellStatus::End => self.end = None,
            CellStatus::Wall | CellStatus::Frontier | CellStatus::Path => {}
        }
        self.cells[point.row][point.col] = CellStatus::Empty;
        self.revision += 1;
        true
    }

    pub fn place(&mut self, point: Point, kind: PlaceKind) -> bool {
        let changed = match kind {
            PlaceKind::Start => self.set_start(point),
            PlaceKind::End => self.set_end(point),
            PlaceKind::Wall => self.set_wall(point),
        };
        debug!("place {:?} at {}: changed={}", kind, point, changed);
        changed
    }

    pub fn erase(&mut self, point: Point) -> bool {
        let changed = self.clear(point);
        debug!("erase at {}: changed={}", point, changed);
        changed
    }

    /// Removes every Frontier and Path marker left by a previous search
    pub fn clear_search_marks(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            if cell.is_search_mark() {
                *cell = CellStatus::Empty;
            }
        }
    }

    /// Empties the whole grid, including start, end and walls
    pub fn clear_all(&mut self) {
        let revision = self.revision + 1;
        *self = Self::new(self.size);
        self.revision = revision;
    }

    /// Writes a search marker. Only Empty and Frontier cells accept one, so
    /// walls and the endpoints are never overwritten.
    pub(crate) fn mark(&mut self, point: Point, status: CellStatus) {
        if let Some(CellStatus::Empty | CellStatus::Frontier) = self.status_of(point) {
            self.cells[point.row][point.col] = status;
        }
    }

    /// Return an iterator over the passable orthogonal neighbors of the
    /// provided point, in the order right, down, left, up
    pub fn neighbors_of(&self, point: Point) -> impl Iterator<Item = Point> {
        let mut points = Vec::with_capacity(4);

        if self.is_valid(point) {
            for direction in Direction::NEIGHBOR_ORDER {
                if let Some(next) = direction.step(point, self.size) {
                    if !self.is_wall(next) {
                        points.push(next);
                    }
                }
            }
        }

        points.into_iter()
    }

    /// Create a per-cell storage for values of type T with the same dimensions
    pub fn create_storage<T: Default + Copy + Clone + 'static>(&self) -> CellStorage<T> {
        CellStorage(vec![vec![Default::default(); self.size]; self.size])
    }
}

impl Display for GridMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.cells {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Per-cell storage with the shape of a grid (a vec in a vec)
// TODO: change from vec of vec to one single vec -> better cache friendlyness!
#[derive(Debug, Clone)]
pub struct CellStorage<T>(Vec<Vec<T>>);

impl<T: Copy + 'static> CellStorage<T> {
    pub fn is_valid(&self, node: Point) -> bool {
        node.row < self.0.len() && self.0.first().is_some_and(|r| node.col < r.len())
    }

    pub fn get(&self, node: Point) -> T {
        self.0[node.row][node.col]
    }

    pub fn get_mut(&mut self, node: Point) -> &mut T {
        &mut self.0[node.row][node.col]
    }
}
