//! Grid maze the robot is confined to.
//!
//! Cell `(cx, cy)` covers `[cx·s, (cx+1)·s) × [cy·s, (cy+1)·s)` for cell size `s`, with
//! `(0, 0)` in the bottom-left corner. Cells outside the grid count as walls unless the maze
//! has an open border.

use thiserror::Error;

use super::{Angle, Position};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Cell {
    #[default]
    Open,
    Wall,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MazeError {
    #[error("maze has no cells")]
    Empty,
    #[error("expected {expected} cells for the given dimensions, got {found}")]
    CellCount { expected: usize, found: usize },
    #[error("row {row} has {found} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("invalid cell value {value} at ({cx}, {cy})")]
    InvalidCell { cx: usize, cy: usize, value: u8 },
    #[error("cell size must be positive and finite, got {0}")]
    CellSize(f64),
}

/// Axis-aligned world rectangle of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct CellRect {
    pub min: Position,
    pub max: Position,
}

impl CellRect {
    /// Point of the rectangle closest to `position`.
    pub fn closest_point(&self, position: Position) -> Position {
        Position::new(
            position.x().clamp(self.min.x(), self.max.x()),
            position.y().clamp(self.min.y(), self.max.y()),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MazeGrid {
    width: usize,
    height: usize,
    cell_size: f64,
    cells: Vec<Cell>,
    open_border: bool,
}

impl MazeGrid {
    /// `cells` is row-major, starting with the bottom row.
    pub fn new(
        width: usize,
        height: usize,
        cell_size: f64,
        cells: Vec<Cell>,
    ) -> Result<Self, MazeError> {
        if width == 0 || height == 0 {
            return Err(MazeError::Empty);
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(MazeError::CellSize(cell_size));
        }
        if cells.len() != width * height {
            return Err(MazeError::CellCount {
                expected: width * height,
                found: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cell_size,
            cells,
            open_border: false,
        })
    }

    /// Rows of `0` (open) and `1` (wall); `rows[cy][cx]`, the first row at the bottom.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R], cell_size: f64) -> Result<Self, MazeError> {
        let width = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);
        let mut cells = Vec::with_capacity(width * rows.len());
        for (cy, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(MazeError::RowLength {
                    row: cy,
                    expected: width,
                    found: row.len(),
                });
            }
            for (cx, value) in row.iter().enumerate() {
                cells.push(match value {
                    0 => Cell::Open,
                    1 => Cell::Wall,
                    _ => {
                        return Err(MazeError::InvalidCell {
                            cx,
                            cy,
                            value: *value,
                        })
                    }
                });
            }
        }
        Self::new(width, rows.len(), cell_size, cells)
    }

    pub fn with_open_border(self, open_border: bool) -> Self {
        Self {
            open_border,
            ..self
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn open_border(&self) -> bool {
        self.open_border
    }

    /// World extent `(width·s, height·s)`.
    pub fn extent(&self) -> Position {
        Position::new(
            self.width as f64 * self.cell_size,
            self.height as f64 * self.cell_size,
        )
    }

    pub fn cell(&self, cx: i64, cy: i64) -> Cell {
        if cx < 0 || cy < 0 || cx as usize >= self.width || cy as usize >= self.height {
            return if self.open_border {
                Cell::Open
            } else {
                Cell::Wall
            };
        }
        self.cells[cy as usize * self.width + cx as usize]
    }

    pub fn is_blocked(&self, cx: i64, cy: i64) -> bool {
        self.cell(cx, cy) == Cell::Wall
    }

    pub fn cell_index(&self, position: Position) -> (i64, i64) {
        (
            (position.x() / self.cell_size).floor() as i64,
            (position.y() / self.cell_size).floor() as i64,
        )
    }

    pub fn cell_rect(&self, cx: i64, cy: i64) -> CellRect {
        CellRect {
            min: Position::new(cx as f64 * self.cell_size, cy as f64 * self.cell_size),
            max: Position::new(
                (cx as f64 + 1.0) * self.cell_size,
                (cy as f64 + 1.0) * self.cell_size,
            ),
        }
    }

    /// Wall cells inside the grid, for renderers.
    pub fn walls(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Wall)
            .map(|(i, _)| (i % self.width, i / self.width))
    }

    /// Distance along the ray from `origin` to the boundary of the first blocked cell, or
    /// `None` if there is none within `max_range`.
    ///
    /// Walks the grid cell by cell, so a hit is always reported on the exact cell boundary.
    pub fn ray_cast(&self, origin: Position, heading: Angle, max_range: f64) -> Option<f64> {
        let direction = heading.unit_vector();
        let (mut cx, mut cy) = self.cell_index(origin);
        if self.is_blocked(cx, cy) {
            return Some(0.0);
        }

        let (step_x, mut t_max_x, t_delta_x) =
            traversal(origin.x(), direction.x(), cx, self.cell_size);
        let (step_y, mut t_max_y, t_delta_y) =
            traversal(origin.y(), direction.y(), cy, self.cell_size);

        // The ray parameter stops growing at huge coordinates, so the walk is bounded by the
        // boundaries a ray of `max_range` can cross.
        let crossings = ((max_range / self.cell_size).ceil() as usize)
            .saturating_add(1)
            .saturating_mul(2);
        for _ in 0..crossings {
            let t = if t_max_x < t_max_y {
                cx = cx.saturating_add(step_x);
                let t = t_max_x;
                t_max_x += t_delta_x;
                t
            } else {
                cy = cy.saturating_add(step_y);
                let t = t_max_y;
                t_max_y += t_delta_y;
                t
            };
            if !(t <= max_range) {
                return None;
            }
            if self.is_blocked(cx, cy) {
                return Some(t.max(0.0));
            }
        }
        None
    }
}

/// Step direction, ray parameter of the first boundary crossing, and parameter distance
/// between crossings along one axis.
fn traversal(origin: f64, direction: f64, cell: i64, cell_size: f64) -> (i64, f64, f64) {
    if direction > 0.0 {
        let boundary = (cell as f64 + 1.0) * cell_size;
        (1, (boundary - origin) / direction, cell_size / direction)
    } else if direction < 0.0 {
        let boundary = cell as f64 * cell_size;
        (-1, (boundary - origin) / direction, -cell_size / direction)
    } else {
        (0, f64::INFINITY, f64::INFINITY)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    /// 5×5 arena with a wall border and a single pillar at (3, 3).
    pub fn arena() -> MazeGrid {
        MazeGrid::from_rows(
            &[
                [1u8, 1, 1, 1, 1],
                [1, 0, 0, 0, 1],
                [1, 0, 0, 0, 1],
                [1, 0, 0, 1, 1],
                [1, 1, 1, 1, 1],
            ],
            0.3,
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows() {
        let maze = arena();
        assert_eq!(maze.width(), 5);
        assert_eq!(maze.height(), 5);
        assert_eq!(maze.cell(0, 0), Cell::Wall);
        assert_eq!(maze.cell(1, 1), Cell::Open);
        assert_eq!(maze.cell(3, 3), Cell::Wall);
        assert_eq!(maze.walls().count(), 17);
    }

    #[rstest]
    #[case::row_length(MazeGrid::from_rows(&[vec![0u8, 1], vec![0]], 0.3), MazeError::RowLength { row: 1, expected: 2, found: 1 })]
    #[case::invalid_cell(MazeGrid::from_rows(&[[0u8, 2]], 0.3), MazeError::InvalidCell { cx: 1, cy: 0, value: 2 })]
    #[case::empty(MazeGrid::from_rows::<[u8; 0]>(&[], 0.3), MazeError::Empty)]
    #[case::cell_size(MazeGrid::from_rows(&[[0u8]], 0.0), MazeError::CellSize(0.0))]
    #[case::cell_count(MazeGrid::new(2, 2, 0.3, vec![Cell::Open; 3]), MazeError::CellCount { expected: 4, found: 3 })]
    fn test_invalid_maze(#[case] result: Result<MazeGrid, MazeError>, #[case] error: MazeError) {
        assert_eq!(result, Err(error));
    }

    #[rstest]
    #[case::left(-1, 2)]
    #[case::below(2, -1)]
    #[case::right(5, 2)]
    #[case::above(2, 5)]
    fn test_out_of_bounds(#[case] cx: i64, #[case] cy: i64) {
        let maze = MazeGrid::from_rows(&[[0u8; 5]; 5], 0.3).unwrap();
        assert!(maze.is_blocked(cx, cy));
        assert!(!maze.with_open_border(true).is_blocked(cx, cy));
    }

    #[test]
    fn test_cell_mapping() {
        let maze = arena();
        assert_eq!(maze.cell_index(Position::new(0.45, 0.31)), (1, 1));
        assert_eq!(maze.cell_index(Position::new(-0.01, 0.0)), (-1, 0));
        let rect = maze.cell_rect(1, 2);
        assert_abs_diff_eq!(rect.min, Position::new(0.3, 0.6), epsilon = 1e-12);
        assert_abs_diff_eq!(rect.max, Position::new(0.6, 0.9), epsilon = 1e-12);
        assert_abs_diff_eq!(maze.extent(), Position::new(1.5, 1.5), epsilon = 1e-12);
    }

    #[test]
    fn test_cell_rect_closest_point() {
        let rect = arena().cell_rect(3, 3);
        assert_abs_diff_eq!(
            rect.closest_point(Position::new(0.8, 1.0)),
            Position::new(0.9, 1.0),
            epsilon = 1e-12
        );
    }

    #[rstest]
    #[case::east(Position::new(0.45, 0.45), 0.0, Some(0.75))]
    #[case::west(Position::new(0.45, 0.45), PI, Some(0.15))]
    #[case::north(Position::new(0.45, 0.45), 0.5 * PI, Some(0.75))]
    #[case::south(Position::new(0.45, 0.45), 1.5 * PI, Some(0.15))]
    #[case::pillar(Position::new(0.75, 1.05), 0.0, Some(0.15))]
    #[case::diagonal(Position::new(0.45, 0.45), 0.25 * PI, Some(0.45 * 2f64.sqrt()))]
    #[case::out_of_range(Position::new(0.45, 0.45), 0.0, None)]
    fn test_ray_cast(
        #[case] origin: Position,
        #[case] heading: f64,
        #[case] expected: Option<f64>,
    ) {
        let max_range = if expected.is_some() { 2.0 } else { 0.5 };
        let distance = arena().ray_cast(origin, Angle::new(heading), max_range);
        match (distance, expected) {
            (Some(d), Some(e)) => assert_abs_diff_eq!(d, e, epsilon = 1e-9),
            _ => assert_eq!(distance, expected),
        }
    }

    #[test]
    fn test_ray_cast_from_inside_wall() {
        let distance = arena().ray_cast(Position::new(0.1, 0.1), Angle::new(0.0), 1.0);
        assert_eq!(distance, Some(0.0));
    }

    #[rstest]
    #[case::far_right(Position::new(1e300, 0.45), 0.0)]
    #[case::far_left(Position::new(-1e300, 0.45), PI)]
    #[case::diagonal(Position::new(-1e18, 1e18), PI / 4.0)]
    fn test_ray_cast_far_outside_open_border(#[case] origin: Position, #[case] heading: f64) {
        let maze = MazeGrid::from_rows(&[[0u8; 3]; 3], 0.3)
            .unwrap()
            .with_open_border(true);
        assert_eq!(maze.ray_cast(origin, Angle::new(heading), 1.0), None);
    }

    #[test]
    fn test_cell_rect_far_outside() {
        let rect = arena().cell_rect(i64::MAX, i64::MIN);
        assert!(rect.min.x() <= rect.max.x() && rect.min.y() <= rect.max.y());
    }

    #[test]
    fn test_ray_cast_open_border() {
        let maze = MazeGrid::from_rows(&[[0u8; 3]; 3], 0.3)
            .unwrap()
            .with_open_border(true);
        assert_eq!(
            maze.ray_cast(Position::new(0.45, 0.45), Angle::new(0.0), 2.0),
            None
        );
    }
}
