// Live actor registry. Membership changes are queued and applied between ticks.

use crate::actor::{Actor, ActorKind};
use crate::ai::{AiAction, Perception};
use crate::collision::{self, CollisionContext};
use crate::config;
use crate::nav::NavGraph;
use crate::types::{Aabb, ActorId, ArenaCommand, Category, GameEvent, ProjectileKind};
use glam::Vec3;
use log::{error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct Arena {
    actors: Vec<Actor>,
    pending_add: Vec<Actor>,
    pending_remove: Vec<ActorId>,
    next_id: u32,
    rng: StdRng, // Only the wall heuristic draws from this
    pub commands: VecDeque<ArenaCommand>,
    events: Vec<GameEvent>,
}

impl Arena {
    pub fn new(seed: u64) -> Self {
        Arena {
            actors: Vec::new(),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
            next_id: 1,
            rng: StdRng::seed_from_u64(seed),
            commands: VecDeque::new(),
            events: Vec::new(),
        }
    }

    /// Queues an actor for the next flush and returns its id
    pub fn spawn(&mut self, mut actor: Actor) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        actor.id = id;
        // The bounding volume must exist before the actor joins the live set
        actor.bounds();
        crate::debug_physics!(actor = id, "Queued {:?} for spawn", actor.category());
        self.pending_add.push(actor);
        id
    }

    /// Queues an actor for removal at the next flush. Unknown ids are ignored then.
    pub fn remove(&mut self, id: ActorId) {
        if !self.pending_remove.contains(&id) {
            self.pending_remove.push(id);
        }
    }

    /// Applies queued removals, then queued additions
    pub fn flush(&mut self) {
        if !self.pending_remove.is_empty() {
            let removals = std::mem::take(&mut self.pending_remove);
            self.actors.retain(|a| !removals.contains(&a.id));
            self.pending_add.retain(|a| !removals.contains(&a.id));
            crate::debug_physics!("Removed {} actor(s)", removals.len());
        }
        if !self.pending_add.is_empty() {
            crate::debug_physics!("Added {} actor(s)", self.pending_add.len());
            self.actors.append(&mut self.pending_add);
        }
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    /// The live player tank, if there is one
    pub fn player(&self) -> Option<&Actor> {
        self.actors
            .iter()
            .find(|a| !a.dead && a.category() == Category::PlayerTank)
    }

    pub fn player_mut(&mut self) -> Option<&mut Actor> {
        self.actors
            .iter_mut()
            .find(|a| !a.dead && a.category() == Category::PlayerTank)
    }

    /// World boxes of every building, for line-of-sight tests
    pub fn obstacles(&self) -> Vec<Aabb> {
        self.actors
            .iter()
            .filter_map(|a| a.building_data().map(|b| *b.aabb()))
            .collect()
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Clears last tick's contact flags and schedules actors that died last
    /// tick for removal. They stay in the registry for this one cleanup tick.
    pub fn begin_tick(&mut self) {
        let mut expired = Vec::new();
        for actor in self.actors.iter_mut() {
            actor.is_colliding = false;
            if actor.dead {
                expired.push(actor.id);
            }
        }
        for id in expired {
            self.remove(id);
        }
    }

    pub fn integrate(&mut self, dt: f32) {
        for actor in self.actors.iter_mut() {
            let was_dead = actor.dead;
            actor.update_physics(dt);
            // Projectiles that ran out of lifetime detonate where they are
            if let (false, true, Some(p)) = (was_dead, actor.dead, actor.projectile_state()) {
                self.events.push(GameEvent::Explosion {
                    position: actor.body.position(),
                    kind: p.kind,
                });
            }
        }
    }

    /// Tests every pair of participating actors once and resolves the ones
    /// that touch. The participant set is fixed when the pass starts.
    /// Returns the number of colliding pairs.
    pub fn collision_pass(&mut self) -> usize {
        let live: Vec<usize> = self
            .actors
            .iter()
            .enumerate()
            .filter(|(_, a)| a.participates_in_collision())
            .map(|(idx, _)| idx)
            .collect();

        let mut ctx = CollisionContext {
            rng: &mut self.rng,
            commands: &mut self.commands,
            events: &mut self.events,
        };

        let mut hits = 0;
        for (k, &i) in live.iter().enumerate() {
            for &j in &live[k + 1..] {
                let (left, right) = self.actors.split_at_mut(j);
                let (a, b) = (&mut left[i], &mut right[0]);
                if collision::intersects(a, b) {
                    collision::resolve_pair(a, b, &mut ctx);
                    hits += 1;
                }
            }
        }
        if hits > 0 {
            crate::debug_collision!("{} colliding pair(s) among {} actors", hits, live.len());
        }
        hits
    }

    /// Runs every AI tank's controller against post-collision positions.
    /// Fire requests are queued as commands.
    pub fn update_ai(&mut self, dt: f32, graph: &NavGraph) {
        let player = self.player().map(|p| p.body.position());
        let obstacles = self.obstacles();
        let perception = Perception {
            player,
            obstacles: &obstacles,
        };

        for actor in self.actors.iter_mut().filter(|a| !a.dead) {
            let id = actor.id;
            if let ActorKind::AiTank(tank, brain) = &mut actor.kind {
                let action = brain.update(id, &mut actor.body, tank.weapon_ready, graph, &perception, dt);
                if let AiAction::Fire { direction } = action {
                    self.commands.push_back(ArenaCommand::Fire {
                        shooter: id,
                        kind: ProjectileKind::Missile,
                        direction,
                    });
                }
            }
        }
    }

    /// Launches a projectile from a live, armed tank and disarms it.
    /// Returns the projectile's id, `None` if the shooter could not fire.
    pub fn fire(&mut self, shooter: ActorId, kind: ProjectileKind, direction: Vec3) -> Option<ActorId> {
        let actor = self.actor_mut(shooter).filter(|a| !a.dead)?;
        let origin = actor.body.position();
        let tank = actor.tank_mut().filter(|t| t.weapon_ready)?;
        tank.weapon_ready = false;

        let heading = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero();
        let muzzle = origin + heading * config::MUZZLE_OFFSET;
        let projectile = match Actor::projectile(kind, shooter, muzzle, heading) {
            Ok(projectile) => projectile,
            Err(e) => {
                error!("Tank {} failed to fire: {}", shooter, e);
                return None;
            }
        };
        let id = self.spawn(projectile);
        self.events.push(GameEvent::ProjectileFired {
            shooter,
            kind,
            position: muzzle,
        });
        info!("Tank {} fired {:?} {}", shooter, kind, id);
        Some(id)
    }

    /// Makes a tank's weapon available again
    pub fn rearm(&mut self, id: ActorId) {
        if let Some(tank) = self.actor_mut(id).and_then(Actor::tank_mut) {
            tank.weapon_ready = true;
        }
    }
}
