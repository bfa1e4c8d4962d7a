//! The authoritative simulation step.
//!
//! One call advances every entity by one fixed tick: integrate intents,
//! keep entities out of walls (or inside the world bounds), then relax
//! entity-entity overlap. The step reads only prior-tick state plus each
//! entity's own intent, so results depend solely on the input snapshot and
//! the stable id ordering of the store.

use crate::grid::CollisionGrid;
use crate::{Entity, PLAYER_RADIUS, WORLD_HEIGHT, WORLD_WIDTH};
use std::collections::BTreeMap;

/// Advances all entities by one tick of `dt` seconds.
///
/// With a grid, each axis of the movement candidate is tested against the
/// map independently and applied only if unblocked, which produces wall
/// sliding instead of a dead stop on diagonal contact. Without a grid,
/// positions are clamped to the world bounds. In both variants a pairwise
/// separation pass runs afterwards, followed by re-validation so that
/// walls (or bounds) always win over inter-entity pushes.
pub fn step(entities: &mut BTreeMap<u32, Entity>, grid: Option<&CollisionGrid>, dt: f32) {
    integrate(entities, grid, dt);

    // Positions entering the separation pass are known valid; pushes are
    // re-validated against them afterwards.
    let before_push: BTreeMap<u32, (f32, f32)> =
        entities.iter().map(|(id, e)| (*id, (e.x, e.y))).collect();

    resolve_overlaps(entities);
    revalidate(entities, grid, &before_push);
}

fn integrate(entities: &mut BTreeMap<u32, Entity>, grid: Option<&CollisionGrid>, dt: f32) {
    for entity in entities.values_mut() {
        let candidate_x = entity.x + entity.dx * entity.speed * dt;
        let candidate_y = entity.y + entity.dy * entity.speed * dt;

        match grid {
            Some(grid) => {
                // Each axis is tested with the other axis unchanged.
                let x_open = !grid.is_area_blocked(candidate_x, entity.y, PLAYER_RADIUS);
                let y_open = !grid.is_area_blocked(entity.x, candidate_y, PLAYER_RADIUS);
                if x_open {
                    entity.x = candidate_x;
                }
                if y_open {
                    entity.y = candidate_y;
                }
            }
            None => {
                entity.x = candidate_x.clamp(PLAYER_RADIUS, WORLD_WIDTH - PLAYER_RADIUS);
                entity.y = candidate_y.clamp(PLAYER_RADIUS, WORLD_HEIGHT - PLAYER_RADIUS);
            }
        }
    }
}

/// One best-effort relaxation pass over all unordered pairs, in ascending
/// id order. Order-dependent but deterministic for a given store.
fn resolve_overlaps(entities: &mut BTreeMap<u32, Entity>) {
    let ids: Vec<u32> = entities.keys().copied().collect();

    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            if let (Some(a), Some(b)) = (
                entities.get(&ids[i]).cloned(),
                entities.get(&ids[j]).cloned(),
            ) {
                let mut a = a;
                let mut b = b;
                separate_pair(&mut a, &mut b);
                entities.insert(ids[i], a);
                entities.insert(ids[j], b);
            }
        }
    }
}

/// Pushes two overlapping entities apart by half the overlap each, along
/// the normalized separating vector. Exact coincidence falls back to a
/// fixed x-axis separation so the normal is never a division by zero.
pub fn separate_pair(a: &mut Entity, b: &mut Entity) {
    let min_dist = 2.0 * PLAYER_RADIUS;

    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let dist_sq = dx * dx + dy * dy;
    if dist_sq >= min_dist * min_dist {
        return;
    }

    let dist = dist_sq.sqrt();
    let (nx, ny) = if dist > 0.0 {
        (dx / dist, dy / dist)
    } else {
        (1.0, 0.0)
    };

    let push = (min_dist - dist) / 2.0;
    a.x -= nx * push;
    a.y -= ny * push;
    b.x += nx * push;
    b.y += ny * push;
}

fn revalidate(
    entities: &mut BTreeMap<u32, Entity>,
    grid: Option<&CollisionGrid>,
    before_push: &BTreeMap<u32, (f32, f32)>,
) {
    for (id, entity) in entities.iter_mut() {
        match grid {
            Some(grid) => {
                let Some(&(prev_x, prev_y)) = before_push.get(id) else {
                    continue;
                };
                // Revert per axis, only for this entity; the partner's
                // push stands regardless.
                if grid.is_area_blocked(entity.x, prev_y, PLAYER_RADIUS) {
                    entity.x = prev_x;
                }
                if grid.is_area_blocked(entity.x, entity.y, PLAYER_RADIUS) {
                    entity.y = prev_y;
                }
            }
            None => {
                entity.x = entity.x.clamp(PLAYER_RADIUS, WORLD_WIDTH - PLAYER_RADIUS);
                entity.y = entity.y.clamp(PLAYER_RADIUS, WORLD_HEIGHT - PLAYER_RADIUS);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PLAYER_SPEED, TILE_SIZE};
    use assert_approx_eq::assert_approx_eq;

    fn entity(id: u32, x: f32, y: f32) -> Entity {
        Entity::new(id, x, y, "#ffffff".to_string())
    }

    fn store(entries: Vec<Entity>) -> BTreeMap<u32, Entity> {
        entries.into_iter().map(|e| (e.id, e)).collect()
    }

    fn distance(a: &Entity, b: &Entity) -> f32 {
        ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
    }

    #[test]
    fn integration_moves_with_intent() {
        let mut entities = store(vec![entity(1, 100.0, 100.0)]);
        entities.get_mut(&1).unwrap().dx = 1.0;

        step(&mut entities, None, 1.0 / 30.0);

        let moved = &entities[&1];
        assert_approx_eq!(moved.x, 100.0 + PLAYER_SPEED / 30.0, 1e-3);
        assert_approx_eq!(moved.y, 100.0);
    }

    #[test]
    fn zero_intent_is_idempotent() {
        let mut entities = store(vec![entity(1, 321.5, 123.25)]);

        for _ in 0..50 {
            step(&mut entities, None, 1.0 / 30.0);
        }

        assert_eq!(entities[&1].x, 321.5);
        assert_eq!(entities[&1].y, 123.25);
    }

    #[test]
    fn positions_stay_within_world_bounds() {
        let mut entities = store(vec![entity(1, PLAYER_RADIUS + 1.0, PLAYER_RADIUS + 1.0)]);
        {
            let e = entities.get_mut(&1).unwrap();
            e.dx = -1.0;
            e.dy = -1.0;
        }

        for _ in 0..100 {
            step(&mut entities, None, 1.0 / 30.0);
        }

        let e = &entities[&1];
        assert_eq!(e.x, PLAYER_RADIUS);
        assert_eq!(e.y, PLAYER_RADIUS);
    }

    #[test]
    fn wall_sliding_advances_along_open_axis() {
        // Top row is solid wall, bottom row open. Moving diagonally
        // up-right from the open row must slide right, not stop.
        let grid = CollisionGrid::parse("1,1,1,1\n0,0,0,0\n").unwrap();
        let mut entities = store(vec![entity(1, 1.5 * TILE_SIZE, 1.5 * TILE_SIZE)]);
        {
            let e = entities.get_mut(&1).unwrap();
            let inv = std::f32::consts::FRAC_1_SQRT_2;
            e.dx = inv;
            e.dy = -inv;
        }

        step(&mut entities, Some(&grid), 0.1);

        let e = &entities[&1];
        assert!(e.x > 1.5 * TILE_SIZE, "should slide along x");
        assert_eq!(e.y, 1.5 * TILE_SIZE, "blocked axis must not move");
        assert!(!grid.is_area_blocked(e.x, e.y, PLAYER_RADIUS));
    }

    #[test]
    fn overlapping_pair_separates_symmetrically() {
        // radius 10, centers 5 apart: overlap 15, each pushed 7.5 along x.
        let mut entities = store(vec![entity(1, 100.0, 100.0), entity(2, 105.0, 100.0)]);

        step(&mut entities, None, 1.0 / 30.0);

        assert_approx_eq!(entities[&1].x, 92.5, 1e-3);
        assert_approx_eq!(entities[&1].y, 100.0, 1e-3);
        assert_approx_eq!(entities[&2].x, 112.5, 1e-3);
        assert_approx_eq!(entities[&2].y, 100.0, 1e-3);
        assert_approx_eq!(distance(&entities[&1], &entities[&2]), 20.0, 1e-3);
    }

    #[test]
    fn separation_never_decreases_distance() {
        let mut a = entity(1, 100.0, 100.0);
        let mut b = entity(2, 112.0, 104.0);
        let before = distance(&a, &b);
        assert!(before < 2.0 * PLAYER_RADIUS);

        separate_pair(&mut a, &mut b);

        let after = distance(&a, &b);
        assert!(after > before);
        assert_approx_eq!(after, 2.0 * PLAYER_RADIUS, 1e-3);
    }

    #[test]
    fn coincident_entities_get_fallback_separation() {
        let mut a = entity(1, 200.0, 200.0);
        let mut b = entity(2, 200.0, 200.0);

        separate_pair(&mut a, &mut b);

        assert_approx_eq!(distance(&a, &b), 2.0 * PLAYER_RADIUS, 1e-3);
        assert!(a.x < b.x, "fallback separation is along the x axis");
        assert_eq!(a.y, b.y);
    }

    #[test]
    fn step_is_deterministic_for_same_store() {
        let seed = vec![
            entity(1, 100.0, 100.0),
            entity(2, 108.0, 103.0),
            entity(3, 104.0, 96.0),
        ];
        let mut first = store(seed.clone());
        let mut second = store(seed);

        step(&mut first, None, 1.0 / 30.0);
        step(&mut second, None, 1.0 / 30.0);

        for id in [1, 2, 3] {
            assert_eq!(first[&id].x, second[&id].x);
            assert_eq!(first[&id].y, second[&id].y);
        }
    }

    #[test]
    fn walls_win_over_separation_push() {
        // Single open corridor with a wall on the left. Entity 1 sits
        // close to the wall; the pairwise push toward it must be reverted
        // while entity 2 keeps its half of the push.
        let grid = CollisionGrid::parse("1,0,0\n").unwrap();
        let mut entities = store(vec![
            entity(1, TILE_SIZE + 12.0, 16.0),
            entity(2, TILE_SIZE + 24.0, 16.0),
        ]);

        step(&mut entities, Some(&grid), 1.0 / 30.0);

        let a = &entities[&1];
        let b = &entities[&2];
        assert_eq!(a.x, TILE_SIZE + 12.0, "push into the wall is reverted");
        assert!(b.x > TILE_SIZE + 24.0, "partner keeps its push");
        assert!(!grid.is_area_blocked(a.x, a.y, PLAYER_RADIUS));
        assert!(!grid.is_area_blocked(b.x, b.y, PLAYER_RADIUS));
    }

    #[test]
    fn separation_push_respects_world_bounds() {
        let mut entities = store(vec![
            entity(1, PLAYER_RADIUS + 1.0, 100.0),
            entity(2, PLAYER_RADIUS + 4.0, 100.0),
        ]);

        step(&mut entities, None, 1.0 / 30.0);

        for e in entities.values() {
            assert!(e.x >= PLAYER_RADIUS && e.x <= WORLD_WIDTH - PLAYER_RADIUS);
            assert!(e.y >= PLAYER_RADIUS && e.y <= WORLD_HEIGHT - PLAYER_RADIUS);
        }
    }
}
