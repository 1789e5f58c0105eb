//! Spatial query facade and grid geometry helpers.
//!
//! The dungeon collaborator owns the map; the core only asks questions
//! through [`SpatialQuery`]. Implementations answer conservatively: a query
//! it cannot answer (out-of-bounds coordinates, missing level data) reports
//! "not passable" / "not visible" rather than failing.

use crate::creature::Target;

/// Read-only spatial interface supplied by the dungeon.
pub trait SpatialQuery {
    /// Whether a creature can stand on the cell. Unknown cells are not
    /// passable.
    fn is_passable(&self, x: i32, y: i32) -> bool;

    /// Whether the cell is opaque wall. Unknown cells count as wall.
    fn is_wall(&self, x: i32, y: i32) -> bool;

    /// The combatant standing on the cell, if any.
    fn occupant_at(&self, x: i32, y: i32) -> Option<Target>;

    /// All combatants within `radius` (Chebyshev) of the cell.
    fn occupants_in_radius(&self, x: i32, y: i32, radius: i32) -> Vec<Target>;

    /// Unobstructed line of sight between two cells. Unknown is not visible.
    fn line_of_sight(&self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> bool;
}

/// Euclidean distance between two points, floored to an integer.
pub fn distance(x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    ((dx * dx + dy * dy) as f64).sqrt() as i32
}

/// Chebyshev (king-move) distance.
pub fn chebyshev(x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
    (x2 - x1).abs().max((y2 - y1).abs())
}

/// The eight neighbor offsets, in the fixed order used for surround
/// heuristics and escape checks.
pub const NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Enumerate the grid cells inside an angular cone.
///
/// The cone radiates from `(ox, oy)` toward `(tx, ty)` with a 45-degree
/// half-angle, bounded by Chebyshev `range`. The origin cell is excluded.
pub fn cone_cells(ox: i32, oy: i32, tx: i32, ty: i32, range: i32) -> Vec<(i32, i32)> {
    let bx = tx - ox;
    let by = ty - oy;
    if (bx, by) == (0, 0) || range <= 0 {
        return Vec::new();
    }

    let b_len_sq = (bx * bx + by * by) as i64;
    let mut cells = Vec::new();
    for dy in -range..=range {
        for dx in -range..=range {
            if (dx, dy) == (0, 0) {
                continue;
            }
            let dot = (dx * bx + dy * by) as i64;
            if dot <= 0 {
                continue;
            }
            let a_len_sq = (dx * dx + dy * dy) as i64;
            // cos(angle) >= sqrt(2)/2, kept in integer arithmetic.
            if 2 * dot * dot >= a_len_sq * b_len_sq {
                cells.push((ox + dx, oy + dy));
            }
        }
    }
    cells
}
