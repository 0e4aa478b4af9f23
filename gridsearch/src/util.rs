use anyhow::{anyhow, bail};

use crate::grid::{GridMap, PlaceKind, Point};

/// Builds a grid from its text form, one line per row:
/// `.` empty, `X` wall, `S` start and `E` end.
///
/// Blank lines and surrounding whitespace are ignored. The rows must form a
/// square.
pub fn parse_grid(text: &str) -> Result<GridMap, anyhow::Error> {
    let rows: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let size = rows.len();
    if size == 0 {
        bail!("grid text contains no rows");
    }

    let mut map = GridMap::new(size);

    for (row, line) in rows.iter().enumerate() {
        let width = line.chars().count();
        if width != size {
            bail!("row {} has {} cells, expected {}", row, width, size);
        }

        for (col, c) in line.chars().enumerate() {
            let point = Point::new(row, col);
            let kind = match c {
                '.' => continue,
                'X' => PlaceKind::Wall,
                'S' => PlaceKind::Start,
                'E' => PlaceKind::End,
                other => return Err(anyhow!("unknown cell {:?}", other)),
            };
            if !map.place(point, kind) {
                bail!("duplicate {:?}", kind);
            }
        }
    }

    Ok(map)
}
