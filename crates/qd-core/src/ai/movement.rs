//! Single-step movement with the shared tie-break ordering.
//!
//! All pursuit, flee and guard movement tries the diagonal toward the goal
//! first, then the horizontal component, then the vertical one, then a
//! perpendicular detour. A blocked move is a valid "nothing happened"
//! outcome, never an error and never retried within the turn.

use qd_rng::GameRng;

use crate::creature::CreatureId;
use crate::spatial::{SpatialQuery, NEIGHBORS};
use crate::world::World;

/// Whether a creature could stand on the cell right now.
pub(crate) fn cell_open(world: &World, spatial: &dyn SpatialQuery, x: i32, y: i32) -> bool {
    spatial.is_passable(x, y) && spatial.occupant_at(x, y).is_none() && world.is_cell_free(x, y)
}

/// Step offsets toward a direction, in tie-break order.
fn candidates(dx: i32, dy: i32) -> Vec<(i32, i32)> {
    let mut steps = Vec::with_capacity(5);
    let mut push = |step: (i32, i32)| {
        if step != (0, 0) && !steps.contains(&step) {
            steps.push(step);
        }
    };
    push((dx, dy));
    push((dx, 0));
    push((0, dy));
    // Perpendicular detour, fixed order.
    push((dy, -dx));
    push((-dy, dx));
    steps
}

fn try_step(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    id: CreatureId,
    steps: &[(i32, i32)],
) -> Option<(i32, i32)> {
    let (cx, cy) = world.creature(id).map(|c| (c.x, c.y))?;
    for (dx, dy) in steps {
        let (nx, ny) = (cx + dx, cy + dy);
        if cell_open(world, spatial, nx, ny) {
            world.move_creature(id, nx, ny);
            return Some((nx, ny));
        }
    }
    None
}

/// Move one step toward a goal cell.
pub fn step_toward(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    id: CreatureId,
    tx: i32,
    ty: i32,
) -> Option<(i32, i32)> {
    let (cx, cy) = world.creature(id).map(|c| (c.x, c.y))?;
    let steps = candidates((tx - cx).signum(), (ty - cy).signum());
    try_step(world, spatial, id, &steps)
}

/// Move one step away from a cell, same tie-break ordering.
pub fn step_away(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    id: CreatureId,
    tx: i32,
    ty: i32,
) -> Option<(i32, i32)> {
    let (cx, cy) = world.creature(id).map(|c| (c.x, c.y))?;
    let steps = candidates((cx - tx).signum(), (cy - ty).signum());
    try_step(world, spatial, id, &steps)
}

/// Sidestep around a target: only the perpendicular directions.
pub fn circle_step(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    id: CreatureId,
    tx: i32,
    ty: i32,
) -> Option<(i32, i32)> {
    let (cx, cy) = world.creature(id).map(|c| (c.x, c.y))?;
    let (dx, dy) = ((tx - cx).signum(), (ty - cy).signum());
    try_step(world, spatial, id, &[(dy, -dx), (-dy, dx)])
}

/// Random-direction move attempt, for confusion and wandering.
pub fn random_step(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    id: CreatureId,
    rng: &mut GameRng,
) -> Option<(i32, i32)> {
    let step = NEIGHBORS[rng.rn2(8) as usize];
    try_step(world, spatial, id, &[step])
}

/// Try to claim one of the eight cells around the target, in fixed order.
/// The surround heuristic for pack hunters; falls back to `None` when the
/// ring is full.
pub fn surround_step(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    id: CreatureId,
    tx: i32,
    ty: i32,
) -> Option<(i32, i32)> {
    let (cx, cy) = world.creature(id).map(|c| (c.x, c.y))?;
    for (dx, dy) in NEIGHBORS {
        let (gx, gy) = (tx + dx, ty + dy);
        if (gx, gy) == (cx, cy) {
            // Already in the ring.
            return None;
        }
        if cell_open(world, spatial, gx, gy) {
            return step_toward(world, spatial, id, gx, gy);
        }
    }
    None
}

/// Count the open cells next to a creature; used by the cornered check.
pub fn open_escape_directions(world: &World, spatial: &dyn SpatialQuery, id: CreatureId) -> usize {
    let Some((cx, cy)) = world.creature(id).map(|c| (c.x, c.y)) else {
        return 0;
    };
    NEIGHBORS
        .iter()
        .filter(|(dx, dy)| cell_open(world, spatial, cx + dx, cy + dy))
        .count()
}
