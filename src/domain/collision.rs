//! Collision response of the circular body against wall cells.
//!
//! Overlaps are resolved by pushing the body out along the minimum translation vector of the
//! deepest contact and removing the velocity component that points into that wall. The
//! tangential component is kept, so the robot slides along walls instead of sticking to them.

use super::{maze::CellRect, MazeGrid, Position, RobotState};

/// Extra clearance added to every push-out so the resolved circle is not left exactly
/// tangent, where rounding could report a new contact.
const SKIN: f64 = 1e-9;

const SEARCH_RINGS: [f64; 7] = [0.05, 0.1, 0.2, 0.3, 0.5, 0.75, 1.0];
const SEARCH_DIRECTIONS: usize = 8;

/// Overlap of the body with one wall cell.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Contact {
    pub cell: (i64, i64),
    /// Unit vector pointing out of the wall.
    pub normal: Position,
    pub depth: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionOutcome {
    /// Overlapping cells seen on the first pass.
    pub contacts: usize,
    /// Push-outs applied.
    pub passes: usize,
    /// Overlap remained after the pass limit; the position is a best effort.
    pub unresolved: bool,
}

impl CollisionOutcome {
    pub fn collided(&self) -> bool {
        self.passes > 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionResolver {
    max_passes: usize,
}

impl CollisionResolver {
    pub fn new(max_passes: usize) -> Self {
        Self {
            max_passes: max_passes.max(1),
        }
    }

    /// All wall cells the circle overlaps. Tangency does not count.
    pub fn contacts(&self, position: Position, radius: f64, maze: &MazeGrid) -> Vec<Contact> {
        // Further out than one cell beyond the grid every cell looks the same as the border.
        let margin = radius + maze.cell_size();
        let extent = maze.extent();
        let position = Position::new(
            position.x().clamp(-margin, extent.x() + margin),
            position.y().clamp(-margin, extent.y() + margin),
        );
        let (cx_min, cy_min) = maze.cell_index(position + Position::new(-radius, -radius));
        let (cx_max, cy_max) = maze.cell_index(position + Position::new(radius, radius));

        let mut contacts = vec![];
        for cy in cy_min..=cy_max {
            for cx in cx_min..=cx_max {
                if !maze.is_blocked(cx, cy) {
                    continue;
                }
                if let Some((normal, depth)) =
                    penetration(position, radius, &maze.cell_rect(cx, cy), |dx, dy| {
                        !maze.is_blocked(cx + dx, cy + dy)
                    })
                {
                    contacts.push(Contact {
                        cell: (cx, cy),
                        normal,
                        depth,
                    });
                }
            }
        }
        contacts
    }

    pub fn has_collision(&self, position: Position, radius: f64, maze: &MazeGrid) -> bool {
        !self.contacts(position, radius, maze).is_empty()
    }

    /// Corrects `state` in place: position pushed out of walls, velocity into walls removed.
    pub fn resolve(
        &self,
        state: &mut RobotState,
        radius: f64,
        maze: &MazeGrid,
    ) -> CollisionOutcome {
        let mut outcome = CollisionOutcome::default();

        for pass in 0..self.max_passes {
            let contacts = self.contacts(state.position(), radius, maze);
            if pass == 0 {
                outcome.contacts = contacts.len();
            }
            let Some(contact) = contacts
                .into_iter()
                .max_by(|a, b| a.depth.total_cmp(&b.depth))
            else {
                return outcome;
            };
            outcome.passes += 1;

            state.set_position(state.position() + contact.normal * (contact.depth + SKIN));

            let velocity = state.world_velocity();
            let into_wall = velocity.dot(contact.normal);
            if into_wall < 0.0 {
                state.set_world_velocity(velocity - contact.normal * into_wall);
            }
        }

        outcome.unresolved = self.has_collision(state.position(), radius, maze);
        outcome
    }

    /// Nearest point around `position` where the body fits, probing rings of growing radius
    /// in eight directions.
    pub fn find_free_position(
        &self,
        position: Position,
        radius: f64,
        maze: &MazeGrid,
    ) -> Option<Position> {
        if !self.has_collision(position, radius, maze) {
            return Some(position);
        }
        SEARCH_RINGS.iter().find_map(|ring| {
            (0..SEARCH_DIRECTIONS)
                .map(|i| {
                    let angle = i as f64 * std::f64::consts::TAU / SEARCH_DIRECTIONS as f64;
                    position + Position::new(angle.cos(), angle.sin()) * *ring
                })
                .find(|candidate| !self.has_collision(*candidate, radius, maze))
        })
    }
}

/// Minimum translation of a circle out of a rectangle as `(normal, depth)`, or `None` if
/// they do not overlap. `is_exit(dx, dy)` tells whether the neighbouring cell in that
/// direction is free; a center buried inside the rectangle leaves through the nearest free
/// face.
fn penetration(
    center: Position,
    radius: f64,
    rect: &CellRect,
    is_exit: impl Fn(i64, i64) -> bool,
) -> Option<(Position, f64)> {
    let closest = rect.closest_point(center);
    let offset = center - closest;
    let distance = offset.length();

    if distance >= radius {
        return None;
    }
    if distance > 0.0 {
        return Some((offset * (1.0 / distance), radius - distance));
    }

    let faces = [
        (center.x() - rect.min.x(), Position::new(-1.0, 0.0), (-1, 0)),
        (rect.max.x() - center.x(), Position::new(1.0, 0.0), (1, 0)),
        (center.y() - rect.min.y(), Position::new(0.0, -1.0), (0, -1)),
        (rect.max.y() - center.y(), Position::new(0.0, 1.0), (0, 1)),
    ];
    let shallowest = |a: &&(f64, Position, (i64, i64)), b: &&(f64, Position, (i64, i64))| {
        a.0.total_cmp(&b.0)
    };
    let (inset, normal, _) = faces
        .iter()
        .filter(|(_, _, (dx, dy))| is_exit(*dx, *dy))
        .min_by(shallowest)
        .or_else(|| faces.iter().min_by(shallowest))?;
    Some((*normal, inset + radius))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::{maze::tests::arena, Angle, BodyVelocity};

    const RADIUS: f64 = 0.075;

    fn robot_at(x: f64, y: f64, velocity: Position) -> RobotState {
        let mut state = RobotState::new(Position::new(x, y), Angle::new(0.0));
        state.set_body_velocity(BodyVelocity::default());
        state.set_world_velocity(velocity);
        state
    }

    fn resolver() -> CollisionResolver {
        CollisionResolver::new(4)
    }

    #[test]
    fn test_tangent_is_not_a_collision() {
        let maze = MazeGrid::from_rows(&[[1u8, 0, 0], [1, 0, 0], [1, 0, 0]], 0.5).unwrap();
        let mut state = robot_at(0.75, 0.75, Position::new(-1.0, 0.0));
        let outcome = resolver().resolve(&mut state, 0.25, &maze);
        assert!(!outcome.collided());
        assert_eq!(state.position(), Position::new(0.75, 0.75));
        assert_eq!(state.world_velocity(), Position::new(-1.0, 0.0));
    }

    #[test]
    fn test_push_out_keeps_tangential_velocity() {
        let maze = arena();
        let mut state = robot_at(0.3 + RADIUS - 0.01, 0.6, Position::new(-0.2, 0.1));
        let outcome = resolver().resolve(&mut state, RADIUS, &maze);

        assert!(outcome.collided());
        assert!(!outcome.unresolved);
        assert!(state.position().x() - RADIUS >= 0.3);
        assert_abs_diff_eq!(state.position().x(), 0.3 + RADIUS, epsilon = 1e-6);
        assert_abs_diff_eq!(state.position().y(), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(state.world_velocity().x(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(state.world_velocity().y(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_velocity_leaving_the_wall_is_kept() {
        let maze = arena();
        let mut state = robot_at(0.3 + RADIUS - 0.01, 0.6, Position::new(0.2, 0.0));
        resolver().resolve(&mut state, RADIUS, &maze);
        assert_abs_diff_eq!(state.world_velocity().x(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_corner_wedge() {
        let maze = arena();
        let mut state = robot_at(0.35, 0.35, Position::new(-0.1, -0.1));
        let outcome = resolver().resolve(&mut state, RADIUS, &maze);

        assert!(!outcome.unresolved);
        assert_eq!(outcome.contacts, 3);
        assert!(outcome.passes >= 2);
        assert!(!resolver().has_collision(state.position(), RADIUS, &maze));
        assert_abs_diff_eq!(state.world_velocity().length(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_outer_corner_pushes_diagonally() {
        let maze = arena();
        // pillar (3, 3) has its bottom-left corner at (0.9, 0.9)
        let mut state = robot_at(0.86, 0.86, Position::default());
        resolver().resolve(&mut state, RADIUS, &maze);
        let corner = Position::new(0.9, 0.9);
        assert_abs_diff_eq!(state.position().distance(corner), RADIUS, epsilon = 1e-6);
        assert_abs_diff_eq!(state.position().x(), state.position().y(), epsilon = 1e-12);
    }

    #[test]
    fn test_center_inside_wall_exits_towards_open_cell() {
        let maze = arena();
        // deep inside the left border wall, nearest face is the outer one
        let mut state = robot_at(0.05, 0.6, Position::default());
        resolver().resolve(&mut state, RADIUS, &maze);
        assert!(state.position().x() >= 0.3 + RADIUS - 1e-6);
        assert!(!resolver().has_collision(state.position(), RADIUS, &maze));
    }

    #[rstest]
    #[case::left(0.05, 0.45, Position::new(RADIUS, 0.45))]
    #[case::bottom(0.45, 0.01, Position::new(0.45, RADIUS))]
    #[case::right(0.88, 0.45, Position::new(0.9 - RADIUS, 0.45))]
    fn test_outside_of_grid_is_a_wall(
        #[case] x: f64,
        #[case] y: f64,
        #[case] expected: Position,
    ) {
        let maze = MazeGrid::from_rows(&[[0u8; 3]; 3], 0.3).unwrap();
        let mut state = robot_at(x, y, Position::default());
        let outcome = resolver().resolve(&mut state, RADIUS, &maze);
        assert!(outcome.collided());
        assert_abs_diff_eq!(state.position(), expected, epsilon = 1e-6);
    }

    #[rstest]
    #[case::far_right(Position::new(1e300, 0.5))]
    #[case::far_below(Position::new(0.5, -1e300))]
    #[case::far_corner(Position::new(-1e18, 1e18))]
    fn test_far_outside_of_grid(#[case] position: Position) {
        let maze = MazeGrid::from_rows(&[[0u8; 3]; 3], 0.3).unwrap();
        assert!(resolver().has_collision(position, RADIUS, &maze));
        assert_eq!(resolver().find_free_position(position, RADIUS, &maze), None);

        let mut state = robot_at(position.x(), position.y(), Position::default());
        assert!(resolver().resolve(&mut state, RADIUS, &maze).unresolved);

        let open = maze.with_open_border(true);
        assert!(!resolver().has_collision(position, RADIUS, &open));
    }

    #[test]
    fn test_open_border() {
        let maze = MazeGrid::from_rows(&[[0u8; 3]; 3], 0.3)
            .unwrap()
            .with_open_border(true);
        let mut state = robot_at(0.01, 0.45, Position::new(-0.1, 0.0));
        let outcome = resolver().resolve(&mut state, RADIUS, &maze);
        assert!(!outcome.collided());
        assert_eq!(state.position(), Position::new(0.01, 0.45));
    }

    #[test]
    fn test_unresolvable_overlap_is_bounded() {
        // corridor narrower than the body
        let maze = MazeGrid::from_rows(&[[1u8, 0, 1], [1, 0, 1], [1, 0, 1]], 0.1).unwrap();
        let mut state = robot_at(0.15, 0.15, Position::default());
        let outcome = CollisionResolver::new(4).resolve(&mut state, RADIUS, &maze);
        assert_eq!(outcome.passes, 4);
        assert!(outcome.unresolved);
        assert!(state.position().x().is_finite());
    }

    #[test]
    fn test_contacts() {
        let maze = arena();
        let contacts = resolver().contacts(Position::new(0.36, 0.36), RADIUS, &maze);
        let mut cells = contacts.iter().map(|c| c.cell).collect::<Vec<_>>();
        cells.sort();
        assert_eq!(cells, vec![(0, 1), (1, 0)]);
        for contact in contacts {
            assert_abs_diff_eq!(contact.depth, RADIUS - 0.06, epsilon = 1e-12);
            assert_abs_diff_eq!(contact.normal.length(), 1.0, epsilon = 1e-12);
        }
    }

    #[rstest]
    #[case::already_free(Position::new(0.6, 0.6), Some(Position::new(0.6, 0.6)))]
    #[case::against_wall(Position::new(0.32, 0.6), Some(Position::new(0.42, 0.6)))]
    #[case::nowhere(Position::new(10.0, 10.0), None)]
    fn test_find_free_position(#[case] position: Position, #[case] expected: Option<Position>) {
        let found = resolver().find_free_position(position, RADIUS, &arena());
        match (found, expected) {
            (Some(f), Some(e)) => assert_abs_diff_eq!(f, e, epsilon = 1e-12),
            _ => assert_eq!(found, expected),
        }
    }
}
