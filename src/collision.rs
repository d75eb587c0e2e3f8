// Narrow-phase tests and per-category resolution for actor pairs

use crate::actor::{Actor, ActorKind, Body};
use crate::building::Building;
use crate::types::{Aabb, ArenaCommand, Category, GameEvent, Plane};
use glam::Vec3;
use rand::Rng;
use std::collections::VecDeque;

/// Mutable tick state the resolution callbacks write into
pub struct CollisionContext<'a, R: Rng> {
    pub rng: &'a mut R,
    pub commands: &'a mut VecDeque<ArenaCommand>,
    pub events: &'a mut Vec<GameEvent>,
}

fn xz_distance_sq(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

/// Narrow-phase intersection test, chosen by the pair's categories.
pub fn intersects(a: &Actor, b: &Actor) -> bool {
    use Category as C;

    match (a.category(), b.category()) {
        (C::NonColliding, _) | (_, C::NonColliding) => false,
        (C::Building, C::Building) => false,
        (C::Shell | C::Missile, C::Shell | C::Missile) => false,
        (C::PlayerTank | C::AiTank, C::PlayerTank | C::AiTank) => a.bounds().intersects(&b.bounds()),
        (C::PlayerTank | C::AiTank, C::Building) => tank_hits_building(a, b),
        (C::Building, C::PlayerTank | C::AiTank) => tank_hits_building(b, a),
        (C::Shell | C::Missile, C::PlayerTank | C::AiTank) => projectile_hits_tank(a, b),
        (C::PlayerTank | C::AiTank, C::Shell | C::Missile) => projectile_hits_tank(b, a),
        (C::Shell | C::Missile, C::Building) => projectile_hits_building(a, b),
        (C::Building, C::Shell | C::Missile) => projectile_hits_building(b, a),
    }
}

/// Box-vs-circle approximation on the ground plane
fn tank_hits_building(tank: &Actor, building: &Actor) -> bool {
    let Some(b) = building.building_data() else {
        return false;
    };
    b.aabb()
        .contains_xz_inflated(tank.body.position(), tank.bounds().radius)
}

fn projectile_hits_tank(projectile: &Actor, tank: &Actor) -> bool {
    let Some(p) = projectile.projectile_state() else {
        return false;
    };
    // A tank never hits itself with its own shot
    p.owner != tank.id && projectile.bounds().intersects(&tank.bounds())
}

fn projectile_hits_building(projectile: &Actor, building: &Actor) -> bool {
    let Some(b) = building.building_data() else {
        return false;
    };
    let sphere = projectile.bounds();
    let aabb = b.aabb();
    aabb.contains_xz_inflated(sphere.center, sphere.radius)
        && sphere.center.y <= aabb.max.y + sphere.radius
        && sphere.center.y >= aabb.min.y - sphere.radius
}

/// Resolves a colliding pair: `a` reacts to `b`, then `b` reacts to `a`.
/// The second call sees whatever the first one changed.
pub fn resolve_pair<R: Rng>(a: &mut Actor, b: &mut Actor, ctx: &mut CollisionContext<'_, R>) {
    collide(a, b, ctx);
    collide(b, a, ctx);
}

/// One side of a collision: `this` reacts to touching `other`.
pub fn collide<R: Rng>(this: &mut Actor, other: &mut Actor, ctx: &mut CollisionContext<'_, R>) {
    let this_category = this.category();
    let other_id = other.id;
    let other_dead = other.dead;
    let other_is_building = other.category() == Category::Building;

    match (&mut this.kind, &mut other.kind) {
        (ActorKind::PlayerTank(_) | ActorKind::AiTank(..), ActorKind::Building(building)) => {
            this.is_colliding = true;
            if let Some(plane) = resolve_against_wall(&mut this.body, building, ctx.rng) {
                crate::debug_collision!(
                    actor = this.id,
                    "Hit wall of building {} (normal {:.2}, {:.2}, {:.2})",
                    other_id,
                    plane.normal.x,
                    plane.normal.y,
                    plane.normal.z
                );
            }
        }
        (
            ActorKind::PlayerTank(_) | ActorKind::AiTank(..),
            ActorKind::PlayerTank(_) | ActorKind::AiTank(..),
        ) => {
            this.is_colliding = true;
            this.body.bounce_back();
            crate::debug_collision!(actor = this.id, "Bounced off tank {}", other_id);
        }
        (
            ActorKind::PlayerTank(tank) | ActorKind::AiTank(tank, _),
            ActorKind::Projectile(projectile),
        ) => {
            // Damage is read from the projectile's dead flag as it stands now. If the
            // projectile has not yet exploded this tick, the hit lands on a later pass.
            if other_dead && !projectile.spent {
                projectile.spent = true;
                let destroyed = tank.take_damage(projectile.damage());
                ctx.events.push(GameEvent::TankDamaged {
                    id: this.id,
                    health: tank.health,
                });
                log::info!(
                    "Tank {} took {:.0} damage from projectile {}, health {:.0}",
                    this.id,
                    projectile.damage(),
                    other_id,
                    tank.health
                );
                if destroyed && !this.dead {
                    this.dead = true;
                    ctx.commands.push_back(ArenaCommand::TankDestroyed {
                        id: this.id,
                        category: this_category,
                    });
                }
            }
        }
        (
            ActorKind::Projectile(projectile),
            ActorKind::PlayerTank(_) | ActorKind::AiTank(..) | ActorKind::Building(_),
        ) => {
            if !this.dead {
                this.dead = true;
                // Blast against a wall hurts nobody
                projectile.spent = other_is_building;
                this.body.velocity = Vec3::ZERO;
                ctx.events.push(GameEvent::Explosion {
                    position: this.body.position(),
                    kind: projectile.kind,
                });
                crate::debug_collision!(actor = this.id, "Exploded against {}", other_id);
            }
        }
        _ => {}
    }
}

/// Picks the wall of `building` nearest to `position`.
///
/// Heuristic rather than exact: takes the two or three ground corners nearest
/// on the XZ plane (stable order, so earlier corners win distance ties), builds
/// candidate walls through the nearest corner and each of the others, and keeps
/// whichever candidate plane lies closer to the position. The returned normal
/// points away from the building.
pub fn nearest_wall_plane<R: Rng>(position: Vec3, building: &Building, rng: &mut R) -> Option<Plane> {
    let mut corners = building.wall_corners();
    corners.sort_by(|a, b| xz_distance_sq(*a, position).total_cmp(&xz_distance_sq(*b, position)));
    corners.truncate(3);

    let (&anchor, rest) = corners.split_first()?;
    let center = building.center();

    let mut best: Option<(f32, Plane)> = None;
    for &other in rest {
        let Some(plane) = wall_through(anchor, other, rng) else {
            continue;
        };
        let plane = plane.away_from(center);
        let distance = plane.signed_distance(position).abs();
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, plane));
        }
    }
    best.map(|(_, plane)| plane)
}

/// Upright plane through two corners. The third point is straight above the
/// first corner, unless the corners are stacked vertically, in which case a
/// horizontal axis is picked at random to stand in.
fn wall_through<R: Rng>(a: Vec3, b: Vec3, rng: &mut R) -> Option<Plane> {
    let auxiliary = if xz_distance_sq(a, b) > 1e-8 {
        a + Vec3::Y
    } else if rng.gen_bool(0.5) {
        a + Vec3::X
    } else {
        a + Vec3::Z
    };
    Plane::from_points(a, b, auxiliary)
}

/// Cancels the into-wall part of the velocity and replays the step from the
/// previous position. Returns the wall that was used.
pub fn resolve_against_wall<R: Rng>(body: &mut Body, building: &Building, rng: &mut R) -> Option<Plane> {
    let plane = nearest_wall_plane(body.position(), building, rng)?;
    let into_wall = body.velocity.dot(plane.normal);
    if into_wall < 0.0 {
        body.velocity -= plane.normal * into_wall;
    }
    body.replay_step();
    Some(plane)
}

/// True if nothing in `obstacles` blocks the straight segment `from -> to`
pub fn line_of_sight(from: Vec3, to: Vec3, obstacles: &[Aabb]) -> bool {
    !obstacles.iter().any(|b| b.intersects_segment(from, to))
}
