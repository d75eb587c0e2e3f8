use crate::actor::Actor;
use crate::ai::AiController;
use crate::arena::Arena;
use crate::building::Building;
use crate::config;
use crate::error::SimError;
use crate::nav::NavGraph;
use crate::player::{self, Intents};
use crate::timer::TimerScheduler;
use crate::types::{ActorId, ArenaCommand, Category, GameEvent, ProjectileKind};
use glam::Vec3;
use log::{error, info};
use std::path::Path;

/// One gameplay session: the actor registry, its timers and the navigation
/// graph the AI tanks patrol on.
pub struct Game {
    pub arena: Arena,
    timers: TimerScheduler<Arena>,
    nav: NavGraph,
    spawn_point: Vec3,
    tick_count: u64,
}

impl Game {
    pub fn new(nav: NavGraph, seed: u64) -> Self {
        let spawn_point = nav.navigation_nodes().first().copied().unwrap_or(Vec3::ZERO);
        Game {
            arena: Arena::new(seed),
            timers: TimerScheduler::new(),
            nav,
            spawn_point,
            tick_count: 0,
        }
    }

    /// Loads the navigation graph; without it there is no session
    pub fn load(nav_path: &Path, seed: u64) -> Result<Self, SimError> {
        let nav = NavGraph::load(nav_path)?;
        Ok(Self::new(nav, seed))
    }

    pub fn nav(&self) -> &NavGraph {
        &self.nav
    }

    pub fn timers(&self) -> &TimerScheduler<Arena> {
        &self.timers
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn spawn_point(&self) -> Vec3 {
        self.spawn_point
    }

    /// Where the player tank starts and respawns
    pub fn set_spawn_point(&mut self, spawn_point: Vec3) {
        self.spawn_point = spawn_point;
    }

    pub fn spawn_player(&mut self) -> Result<ActorId, SimError> {
        let id = self.arena.spawn(Actor::player_tank(self.spawn_point, 0.0)?);
        info!("Player tank {} spawning at {}", id, self.spawn_point);
        Ok(id)
    }

    /// AI tank starting on `begin`, patrolling to `end` and back
    pub fn spawn_ai_tank(&mut self, begin: Vec3, end: Vec3) -> Result<ActorId, SimError> {
        let brain = AiController::new(&self.nav, begin, end)?;
        let id = self.arena.spawn(Actor::ai_tank(begin, 0.0, brain)?);
        info!("AI tank {} patrolling {} <-> {}", id, begin, end);
        Ok(id)
    }

    pub fn spawn_building(&mut self, building: Building) -> Result<ActorId, SimError> {
        Ok(self.arena.spawn(Actor::building(building)?))
    }

    /// Applies queued spawns and removals now, for setup outside the tick loop
    pub fn flush(&mut self) {
        self.arena.flush();
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.arena.drain_events()
    }

    /// Advances the session by `dt` seconds. Timers run first, then input,
    /// physics, collision and AI; the registry changes only at the very end.
    pub fn tick(&mut self, dt: f32, intents: &Intents) {
        if dt <= 0.0 {
            return;
        }
        self.tick_count += 1;

        self.timers.update(dt, &mut self.arena);
        self.apply_player_input(intents, dt);
        self.arena.begin_tick();
        self.arena.integrate(dt);
        self.arena.collision_pass();
        self.arena.update_ai(dt, &self.nav);
        self.process_commands();
        self.arena.flush();
    }

    fn apply_player_input(&mut self, intents: &Intents, dt: f32) {
        let Some(player) = self.arena.player_mut() else {
            return;
        };
        let id = player.id;
        player::drive(player, intents, dt);

        if intents.boost && player::start_boost(player) {
            self.timers.add_timer(
                &format!("boost_{}", id),
                config::BOOST_DURATION,
                move |arena: &mut Arena, _| {
                    if let Some(actor) = arena.actor_mut(id) {
                        player::end_boost(actor);
                    }
                },
                false,
            );
        }

        if intents.fire && player.tank().is_some_and(|t| t.weapon_ready) {
            let direction = player.body.forward();
            self.arena.commands.push_back(ArenaCommand::Fire {
                shooter: id,
                kind: ProjectileKind::Shell,
                direction,
            });
        }
    }

    fn process_commands(&mut self) {
        while let Some(command) = self.arena.commands.pop_front() {
            match command {
                ArenaCommand::Fire {
                    shooter,
                    kind,
                    direction,
                } => {
                    if self.arena.fire(shooter, kind, direction).is_none() {
                        continue;
                    }
                    let cooldown = match kind {
                        ProjectileKind::Shell => config::PLAYER_FIRE_COOLDOWN,
                        ProjectileKind::Missile => config::AI_FIRE_COOLDOWN,
                    };
                    self.timers.add_timer(
                        &format!("fire_cooldown_{}", shooter),
                        cooldown,
                        move |arena: &mut Arena, _| arena.rearm(shooter),
                        false,
                    );
                }
                ArenaCommand::TankDestroyed { id, category } => {
                    let position = self
                        .arena
                        .actor(id)
                        .map(|a| a.body.position())
                        .unwrap_or_default();
                    info!("Tank {} ({:?}) destroyed at {}", id, category, position);
                    self.arena.push_event(GameEvent::TankDestroyed {
                        id,
                        category,
                        position,
                    });
                    if category == Category::PlayerTank {
                        self.schedule_respawn();
                    }
                }
            }
        }
    }

    fn schedule_respawn(&mut self) {
        let spawn_point = self.spawn_point;
        let scheduled = self.timers.add_timer(
            "player_respawn",
            config::PLAYER_RESPAWN_DELAY,
            move |arena: &mut Arena, _| match Actor::player_tank(spawn_point, 0.0) {
                Ok(tank) => {
                    let id = arena.spawn(tank);
                    arena.push_event(GameEvent::PlayerRespawned { id });
                    info!("Player respawned as tank {}", id);
                }
                Err(e) => error!("Player respawn failed: {}", e),
            },
            false,
        );
        if scheduled {
            info!("Player respawn in {:.1}s", config::PLAYER_RESPAWN_DELAY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const DT: f32 = 1.0 / 60.0;

    // (0,0,0) - (0,0,5) - (0,0,10), spawn point is the first node
    const TRACK: &str = "\
000000000 000000005
000000005 000000010
";

    fn game() -> Game {
        Game::new(NavGraph::parse(TRACK).unwrap(), 42)
    }

    fn run(game: &mut Game, seconds: f32, intents: &Intents) -> Vec<GameEvent> {
        let ticks = (seconds / DT).ceil() as usize;
        let mut events = Vec::new();
        for _ in 0..ticks {
            game.tick(DT, intents);
            events.extend(game.drain_events());
        }
        events
    }

    #[test]
    fn test_missing_nav_file_is_fatal() {
        let result = Game::load(Path::new("/nonexistent/arena.nav"), 0);
        assert!(matches!(result, Err(SimError::Navigation(_))));
    }

    #[test]
    fn test_spawns_join_after_tick() {
        let mut game = game();
        game.spawn_player().unwrap();
        assert!(game.arena.is_empty());
        game.tick(DT, &Intents::default());
        assert_eq!(game.arena.len(), 1);
        assert_eq!(game.tick_count(), 1);

        game.tick(0.0, &Intents::default());
        assert_eq!(game.tick_count(), 1);
    }

    #[test]
    fn test_ai_spawn_needs_graph_nodes() {
        let mut game = game();
        let err = game
            .spawn_ai_tank(Vec3::new(3.0, 0.0, 3.0), Vec3::ZERO)
            .unwrap_err();
        assert!(matches!(err, SimError::UnknownWaypoint(_)));
    }

    #[test]
    fn test_fire_cooldown_rearms_weapon() {
        let mut game = game();
        let id = game.spawn_player().unwrap();
        game.flush();

        let fire = Intents {
            fire: true,
            ..Default::default()
        };
        game.tick(DT, &fire);
        let events = game.drain_events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::ProjectileFired { shooter, .. } if *shooter == id))
        );
        let cooldown = format!("fire_cooldown_{}", id);
        assert!(game.timers().contains(&cooldown));
        assert!(!game.arena.actor(id).unwrap().tank().unwrap().weapon_ready);

        // Holding fire does nothing until the cooldown runs out
        let events = run(&mut game, config::PLAYER_FIRE_COOLDOWN - 2.0 * DT, &fire);
        assert!(events.is_empty());
        let events = run(&mut game, 3.0 * DT, &fire);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::ProjectileFired { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_boost_window_ends() {
        let mut game = game();
        let id = game.spawn_player().unwrap();
        game.flush();

        let boost = Intents {
            boost: true,
            ..Default::default()
        };
        game.tick(DT, &boost);
        let boosted = config::TANK_TERMINAL_VELOCITY * config::BOOST_FACTOR;
        assert_approx_eq!(game.arena.actor(id).unwrap().body.terminal_velocity(), boosted);
        assert!(game.timers().contains(&format!("boost_{}", id)));

        run(&mut game, config::BOOST_DURATION + 2.0 * DT, &Intents::default());
        let tank = game.arena.actor(id).unwrap();
        assert_approx_eq!(tank.body.terminal_velocity(), config::TANK_TERMINAL_VELOCITY);
        assert!(!tank.tank().unwrap().boosting);
    }

    #[test]
    fn test_player_destroyed_and_respawned() {
        let mut game = game();
        let first = game.spawn_player().unwrap();
        // A lethal shell from nobody in particular, closing in head on
        game.arena.spawn(
            Actor::projectile(
                ProjectileKind::Shell,
                ActorId(999),
                Vec3::new(0.0, 0.0, 3.0),
                Vec3::NEG_Z,
            )
            .unwrap(),
        );
        game.flush();
        game.arena.actor_mut(first).unwrap().tank_mut().unwrap().health = 5.0;

        let events = run(&mut game, 0.25, &Intents::default());
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::TankDestroyed { id, .. } if *id == first))
        );
        assert!(game.timers().contains("player_respawn"));
        assert!(game.arena.player().is_none());
        assert!(game.arena.actor(first).is_none());

        let events = run(&mut game, config::PLAYER_RESPAWN_DELAY, &Intents::default());
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::PlayerRespawned { .. }))
        );
        let player = game.arena.player().unwrap();
        assert_ne!(player.id, first);
        assert_eq!(player.body.position(), game.spawn_point());
        assert_approx_eq!(player.tank().unwrap().health, config::TANK_MAX_HEALTH);
    }

    #[test]
    fn test_ai_tank_engages_player() {
        let mut game = game();
        game.set_spawn_point(Vec3::new(0.0, 0.0, 10.0));
        let player = game.spawn_player().unwrap();
        let ai = game.spawn_ai_tank(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0)).unwrap();
        game.flush();

        let events = run(&mut game, 1.5, &Intents::default());
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::ProjectileFired { shooter, kind: ProjectileKind::Missile, .. } if *shooter == ai))
        );
        assert!(game.timers().contains(&format!("fire_cooldown_{}", ai)));
        let health = game.arena.actor(player).unwrap().tank().unwrap().health;
        assert_approx_eq!(health, config::TANK_MAX_HEALTH - config::MISSILE_DAMAGE);
    }
}
