use gridsearch::{GridMap, PlaceKind, Point};

/// Converts a position relative to the grid's top left corner into the cell
/// under it. Anything outside the grid maps to `None`.
pub fn pixel_to_cell(x: f32, y: f32, cell_size: f32, grid_size: usize) -> Option<Point> {
    if x < 0.0 || y < 0.0 || cell_size <= 0.0 {
        return None;
    }
    let point = Point {
        row: (y / cell_size) as usize,
        col: (x / cell_size) as usize,
    };
    (point.row < grid_size && point.col < grid_size).then_some(point)
}

/// What a primary click places: the start first, then the end, then walls.
/// Clicking the start or the end itself places nothing.
pub fn primary_click_kind(map: &GridMap, point: Point) -> Option<PlaceKind> {
    match (map.start(), map.end()) {
        (None, end) if end != Some(point) => Some(PlaceKind::Start),
        (Some(start), None) if start != point => Some(PlaceKind::End),
        (start, end) if start != Some(point) && end != Some(point) => Some(PlaceKind::Wall),
        _ => None,
    }
}

/// Space starts a search unless one is running or a widget holds the
/// keyboard focus, since egui hands Space to the focused widget as well
pub fn space_starts_search(space_pressed: bool, widget_focused: bool, running: bool) -> bool {
    space_pressed && !widget_focused && !running
}
