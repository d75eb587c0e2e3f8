// AI tank brain: patrol a waypoint route, sweep the turret at each stop, chase and shoot the player

use crate::actor::Body;
use crate::collision;
use crate::config;
use crate::error::SimError;
use crate::nav::NavGraph;
use crate::types::{Aabb, ActorId};
use crate::utils;
use glam::Vec3;
use log::warn;
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiState {
    Patrol,
    NeedPatrol,
    Scan,
    Pursue,
    Attack,
}

/// What an AI tank can see this tick. Built by the arena after collision
/// resolution, so positions are final for the tick.
#[derive(Debug, Clone, Copy)]
pub struct Perception<'a> {
    pub player: Option<Vec3>,
    pub obstacles: &'a [Aabb],
}

impl Perception<'_> {
    /// No player and nothing to hide behind
    pub fn blind() -> Perception<'static> {
        Perception {
            player: None,
            obstacles: &[],
        }
    }

    /// Player position if it is within `range` of `from` and no building blocks the view
    pub fn visible_player(&self, from: Vec3, range: f32) -> Option<Vec3> {
        let player = self.player?;
        if from.distance(player) > range {
            return None;
        }
        let eye = Vec3::Y * config::SIGHT_HEIGHT;
        collision::line_of_sight(from + eye, player + eye, self.obstacles).then_some(player)
    }
}

/// Request raised by the controller for the arena to carry out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AiAction {
    Idle,
    Fire { direction: Vec3 },
}

#[derive(Debug, Clone)]
pub struct AiController {
    state: AiState,
    begin: Vec3,
    end: Vec3,
    forward_path: Vec<Vec3>, // begin -> end
    reverse_path: Vec<Vec3>, // end -> begin
    current_path: Vec<Vec3>,
    cursor: usize,
    target: Vec3,
    target_heading: Option<f32>, // None until a leg has been planned
    turret_yaw: f32,
    swept: f32, // Turret rotation accumulated during the current scan
}

impl AiController {
    /// Both endpoints must be graph nodes joined by some route. Both patrol
    /// paths are computed here, once.
    pub fn new(graph: &NavGraph, begin: Vec3, end: Vec3) -> Result<Self, SimError> {
        for endpoint in [begin, end] {
            if !graph.contains_node(endpoint) {
                return Err(SimError::UnknownWaypoint(endpoint));
            }
        }
        let forward_path = graph
            .path(begin, end)
            .ok_or(SimError::NoPatrolPath { begin, end })?;
        let reverse_path = graph
            .path(end, begin)
            .ok_or(SimError::NoPatrolPath { begin, end })?;

        let target = forward_path.first().copied().unwrap_or(begin);
        Ok(AiController {
            state: AiState::Patrol,
            begin,
            end,
            current_path: forward_path.clone(),
            forward_path,
            reverse_path,
            cursor: 0,
            target,
            target_heading: None,
            turret_yaw: 0.0,
            swept: 0.0,
        })
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    /// Waypoint the tank is currently heading for
    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn current_path(&self) -> &[Vec3] {
        &self.current_path
    }

    pub fn turret_yaw(&self) -> f32 {
        self.turret_yaw
    }

    /// Runs one decision step. Motion is expressed through `body.velocity` and
    /// hull yaw, and takes effect at the next physics step.
    pub fn update(
        &mut self,
        id: ActorId,
        body: &mut Body,
        weapon_ready: bool,
        graph: &NavGraph,
        perception: &Perception<'_>,
        dt: f32,
    ) -> AiAction {
        if dt <= 0.0 {
            return AiAction::Idle;
        }

        let before = self.state;
        let action = match self.state {
            AiState::Patrol => {
                self.patrol(body, perception, dt);
                AiAction::Idle
            }
            AiState::Scan => {
                self.scan(body, perception, dt);
                AiAction::Idle
            }
            AiState::NeedPatrol => {
                self.plan_next_leg(id, body, graph);
                AiAction::Idle
            }
            AiState::Pursue => {
                self.pursue(body, perception, dt);
                AiAction::Idle
            }
            AiState::Attack => self.attack(body, weapon_ready, perception, dt),
        };

        if self.state != before {
            crate::debug_ai!(actor = id, "{:?} -> {:?}", before, self.state);
        }
        action
    }

    fn patrol(&mut self, body: &mut Body, perception: &Perception<'_>, dt: f32) {
        let position = body.position();
        if perception
            .visible_player(position, config::DETECTION_RADIUS)
            .is_some()
        {
            self.state = AiState::Pursue;
            return;
        }

        let to_target = self.target - position;
        let distance = to_target.length();
        if distance <= config::ARRIVAL_RADIUS {
            body.set_position(self.target);
            body.velocity = Vec3::ZERO;
            self.turret_yaw = body.yaw();
            self.swept = 0.0;
            self.state = AiState::Scan;
            return;
        }

        let heading = match self.target_heading {
            Some(heading) => heading,
            None => {
                let heading = heading_towards(body, self.target);
                self.target_heading = Some(heading);
                heading
            }
        };
        let (yaw, converged) = utils::rotate_towards(
            body.yaw(),
            heading,
            config::AI_TURN_RATE * dt,
            config::HEADING_TOLERANCE,
        );
        body.set_yaw(yaw);

        // Translation waits for the hull to face the waypoint. Never overshoot it.
        body.velocity = if converged {
            to_target / distance * config::AI_SPEED.min(distance / dt)
        } else {
            Vec3::ZERO
        };
    }

    fn scan(&mut self, body: &Body, perception: &Perception<'_>, dt: f32) {
        let from = body.position();
        let step = (config::TURRET_ROTATION_SPEED * dt).min((TAU - self.swept).max(0.0));
        let sub_step = step / config::SCAN_SUB_STEPS as f32;

        for _ in 0..config::SCAN_SUB_STEPS {
            self.turret_yaw = utils::wrap_angle(self.turret_yaw + sub_step);
            self.swept += sub_step;
            if self.player_in_sight_cone(from, perception) {
                self.state = AiState::Attack;
                return;
            }
        }

        if self.swept >= TAU - 1e-3 {
            self.state = AiState::NeedPatrol;
        }
    }

    fn player_in_sight_cone(&self, from: Vec3, perception: &Perception<'_>) -> bool {
        let Some(player) = perception.visible_player(from, config::SIGHT_RANGE) else {
            return false;
        };
        let bearing = utils::yaw_of_direction(player - from);
        utils::wrap_angle(bearing - self.turret_yaw).abs() <= config::SCAN_HALF_ANGLE
    }

    /// Moves the cursor to the next waypoint. At the end of the active path the
    /// complementary patrol path takes over; away from both endpoints a fresh
    /// route back to the patrol start is searched from the nearest node.
    fn plan_next_leg(&mut self, id: ActorId, body: &Body, graph: &NavGraph) {
        let position = body.position();
        self.cursor += 1;

        if self.cursor >= self.current_path.len() {
            self.current_path = if position == self.end {
                self.reverse_path.clone()
            } else if position == self.begin {
                self.forward_path.clone()
            } else {
                let replanned = graph
                    .nearest_node(position)
                    .and_then(|start| graph.path(start, self.begin));
                match replanned {
                    Some(path) => {
                        crate::debug_ai!(
                            actor = id,
                            "Re-planned route back to patrol start ({} waypoints)",
                            path.len()
                        );
                        path
                    }
                    None => {
                        warn!("AI tank {} found no route back to its patrol start", id);
                        self.forward_path.clone()
                    }
                }
            };
            self.cursor = 0;
            if self.current_path.len() > 1 && self.current_path[0] == position {
                self.cursor = 1;
            }
        }

        self.target = self
            .current_path
            .get(self.cursor)
            .copied()
            .unwrap_or(position);
        self.target_heading = Some(heading_towards(body, self.target));
        self.state = AiState::Patrol;
    }

    fn pursue(&mut self, body: &mut Body, perception: &Perception<'_>, dt: f32) {
        let position = body.position();
        let Some(player) = perception.visible_player(position, config::SIGHT_RANGE) else {
            self.lose_player(body);
            return;
        };

        let to_player = player - position;
        let distance = to_player.length();
        if distance <= config::ATTACK_RANGE {
            body.velocity = Vec3::ZERO;
            self.state = AiState::Attack;
            return;
        }

        let bearing = utils::yaw_of_direction(to_player);
        let (yaw, converged) = utils::rotate_towards(
            body.yaw(),
            bearing,
            config::AI_TURN_RATE * dt,
            config::HEADING_TOLERANCE,
        );
        body.set_yaw(yaw);
        body.velocity = if converged {
            to_player / distance * config::AI_PURSUE_SPEED
        } else {
            Vec3::ZERO
        };
        self.aim_turret(bearing, dt);
    }

    fn attack(
        &mut self,
        body: &mut Body,
        weapon_ready: bool,
        perception: &Perception<'_>,
        dt: f32,
    ) -> AiAction {
        let position = body.position();
        let Some(player) = perception.visible_player(position, config::SIGHT_RANGE) else {
            self.lose_player(body);
            return AiAction::Idle;
        };

        let to_player = player - position;
        if to_player.length() > config::ATTACK_RANGE {
            self.state = AiState::Pursue;
            return AiAction::Idle;
        }

        body.velocity = Vec3::ZERO;
        let aimed = self.aim_turret(utils::yaw_of_direction(to_player), dt);
        if aimed && weapon_ready {
            AiAction::Fire {
                direction: utils::heading_vector(self.turret_yaw),
            }
        } else {
            AiAction::Idle
        }
    }

    fn aim_turret(&mut self, bearing: f32, dt: f32) -> bool {
        let (yaw, aimed) = utils::rotate_towards(
            self.turret_yaw,
            bearing,
            config::TURRET_ROTATION_SPEED * dt,
            config::AIM_TOLERANCE,
        );
        self.turret_yaw = yaw;
        aimed
    }

    /// Stop and head back to the patrol route on the next tick
    fn lose_player(&mut self, body: &mut Body) {
        body.velocity = Vec3::ZERO;
        self.current_path.clear();
        self.cursor = 0;
        self.state = AiState::NeedPatrol;
    }
}

/// Absolute yaw that points the hull at `target`
fn heading_towards(body: &Body, target: Vec3) -> f32 {
    let turn = utils::signed_angle_xz(body.forward(), target - body.position());
    utils::wrap_angle(body.yaw() + turn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Integration;
    use assert_approx_eq::assert_approx_eq;
    use std::f32::consts::FRAC_PI_2;

    const DT: f32 = 0.05;
    const ID: ActorId = ActorId(1);

    // (0,0,0) - (5,0,0) - (10,0,0)
    const LINE: &str = "\
000000000 005000000
005000000 010000000
";

    fn line_graph() -> NavGraph {
        NavGraph::parse(LINE).unwrap()
    }

    fn tank_body(position: Vec3) -> Body {
        Body::new(
            position,
            config::TANK_MASS,
            config::TANK_TERMINAL_VELOCITY,
            config::TANK_SCALE,
            config::TANK_MODEL_RADIUS,
            Integration::ForceDriven,
        )
        .unwrap()
    }

    fn patroller(graph: &NavGraph) -> AiController {
        AiController::new(graph, Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)).unwrap()
    }

    /// Physics then AI, the order the arena runs them in
    fn step(
        ai: &mut AiController,
        body: &mut Body,
        graph: &NavGraph,
        perception: &Perception<'_>,
    ) -> AiAction {
        body.integrate(DT);
        ai.update(ID, body, true, graph, perception, DT)
    }

    fn run_until(
        ai: &mut AiController,
        body: &mut Body,
        graph: &NavGraph,
        perception: &Perception<'_>,
        state: AiState,
        max_ticks: usize,
    ) -> usize {
        for tick in 1..=max_ticks {
            step(ai, body, graph, perception);
            if ai.state() == state {
                return tick;
            }
        }
        panic!("never reached {:?}, stuck in {:?}", state, ai.state());
    }

    #[test]
    fn test_init_rejects_bad_endpoints() {
        let graph = line_graph();
        let err = AiController::new(&graph, Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO).unwrap_err();
        assert!(matches!(err, SimError::UnknownWaypoint(_)));

        let split = NavGraph::parse("000000000 005000000\n020000000 025000000\n").unwrap();
        let err = AiController::new(&split, Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, SimError::NoPatrolPath { .. }));
    }

    #[test]
    fn test_initial_state() {
        let graph = line_graph();
        let ai = patroller(&graph);
        assert_eq!(ai.state(), AiState::Patrol);
        assert_eq!(ai.target(), Vec3::ZERO);
        assert_eq!(ai.current_path().len(), 3);
    }

    #[test]
    fn test_full_scan_without_sighting_needs_patrol() {
        let graph = line_graph();
        let mut ai = patroller(&graph);
        let mut body = tank_body(Vec3::ZERO);
        let blind = Perception::blind();

        // Spawned on the first waypoint: arrives at once
        ai.update(ID, &mut body, true, &graph, &blind, DT);
        assert_eq!(ai.state(), AiState::Scan);

        let ticks = (TAU / config::TURRET_ROTATION_SPEED / DT).round() as usize;
        for _ in 0..ticks {
            assert_eq!(ai.state(), AiState::Scan);
            ai.update(ID, &mut body, true, &graph, &blind, DT);
        }
        assert_eq!(ai.state(), AiState::NeedPatrol);
    }

    #[test]
    fn test_zero_dt_changes_nothing() {
        let graph = line_graph();
        let mut ai = patroller(&graph);
        let mut body = tank_body(Vec3::ZERO);
        assert_eq!(ai.update(ID, &mut body, true, &graph, &Perception::blind(), 0.0), AiAction::Idle);
        assert_eq!(ai.state(), AiState::Patrol);
    }

    #[test]
    fn test_next_leg_turns_then_drives_to_waypoint() {
        let graph = line_graph();
        let mut ai = patroller(&graph);
        let mut body = tank_body(Vec3::ZERO);
        let blind = Perception::blind();

        run_until(&mut ai, &mut body, &graph, &blind, AiState::NeedPatrol, 200);
        step(&mut ai, &mut body, &graph, &blind);
        assert_eq!(ai.state(), AiState::Patrol);
        assert_eq!(ai.target(), Vec3::new(5.0, 0.0, 0.0));

        // Hull faces +Z; the waypoint is along +X, a quarter turn
        step(&mut ai, &mut body, &graph, &blind);
        assert_eq!(body.velocity, Vec3::ZERO, "moved before facing the waypoint");

        run_until(&mut ai, &mut body, &graph, &blind, AiState::Scan, 400);
        assert_eq!(body.position(), Vec3::new(5.0, 0.0, 0.0));
        assert_approx_eq!(body.yaw(), FRAC_PI_2, 1e-4);
    }

    #[test]
    fn test_patrol_swaps_paths_at_endpoints() {
        let graph = NavGraph::parse("000000000 005000000\n").unwrap();
        let end = Vec3::new(5.0, 0.0, 0.0);
        let mut ai = AiController::new(&graph, Vec3::ZERO, end).unwrap();
        let mut body = tank_body(Vec3::ZERO);
        let blind = Perception::blind();

        run_until(&mut ai, &mut body, &graph, &blind, AiState::NeedPatrol, 200);
        step(&mut ai, &mut body, &graph, &blind);
        assert_eq!(ai.target(), end);

        run_until(&mut ai, &mut body, &graph, &blind, AiState::Scan, 400);
        run_until(&mut ai, &mut body, &graph, &blind, AiState::NeedPatrol, 200);
        step(&mut ai, &mut body, &graph, &blind);
        // At the far end the reverse path takes over, skipping the node we stand on
        assert_eq!(ai.current_path(), &[end, Vec3::ZERO]);
        assert_eq!(ai.target(), Vec3::ZERO);
    }

    #[test]
    fn test_detected_player_is_attacked() {
        let graph = line_graph();
        let mut ai = patroller(&graph);
        let mut body = tank_body(Vec3::ZERO);
        let sees = Perception {
            player: Some(Vec3::new(0.0, 0.0, 10.0)),
            obstacles: &[],
        };

        ai.update(ID, &mut body, true, &graph, &sees, DT);
        assert_eq!(ai.state(), AiState::Pursue);
        ai.update(ID, &mut body, true, &graph, &sees, DT);
        assert_eq!(ai.state(), AiState::Attack);

        // Turret already points down +Z
        let action = ai.update(ID, &mut body, true, &graph, &sees, DT);
        match action {
            AiAction::Fire { direction } => assert_approx_eq!(direction.z, 1.0, 1e-5),
            AiAction::Idle => panic!("aimed and ready but did not fire"),
        }
        assert_eq!(ai.update(ID, &mut body, false, &graph, &sees, DT), AiAction::Idle);
    }

    #[test]
    fn test_scan_spots_distant_player() {
        let graph = line_graph();
        let mut ai = patroller(&graph);
        let mut body = tank_body(Vec3::ZERO);
        // Beyond the detection radius but inside turret range
        let sees = Perception {
            player: Some(Vec3::new(-30.0, 0.0, 0.0)),
            obstacles: &[],
        };

        ai.update(ID, &mut body, true, &graph, &sees, DT);
        assert_eq!(ai.state(), AiState::Scan);
        run_until(&mut ai, &mut body, &graph, &sees, AiState::Attack, 80);
        let off_bearing = utils::wrap_angle(ai.turret_yaw() + FRAC_PI_2);
        assert!(off_bearing.abs() <= config::SCAN_HALF_ANGLE + 1e-4);
    }

    #[test]
    fn test_building_blocks_sight() {
        let graph = line_graph();
        let mut ai = patroller(&graph);
        let mut body = tank_body(Vec3::ZERO);
        let wall = [Aabb::new(Vec3::new(-2.0, 0.0, 4.0), Vec3::new(2.0, 3.0, 6.0))];
        let hidden = Perception {
            player: Some(Vec3::new(0.0, 0.0, 10.0)),
            obstacles: &wall,
        };

        ai.update(ID, &mut body, true, &graph, &hidden, DT);
        assert_eq!(ai.state(), AiState::Scan);
        for _ in 0..80 {
            ai.update(ID, &mut body, true, &graph, &hidden, DT);
            assert_ne!(ai.state(), AiState::Attack);
        }
        assert_eq!(ai.state(), AiState::NeedPatrol);
    }

    #[test]
    fn test_losing_player_replans_from_nearest_node() {
        let graph = line_graph();
        let mut ai = patroller(&graph);
        let mut body = tank_body(Vec3::new(3.0, 0.0, 2.0));
        let sees = Perception {
            player: Some(Vec3::new(3.0, 0.0, 20.0)),
            obstacles: &[],
        };

        ai.update(ID, &mut body, true, &graph, &sees, DT);
        assert_eq!(ai.state(), AiState::Pursue);
        ai.update(ID, &mut body, true, &graph, &Perception::blind(), DT);
        assert_eq!(ai.state(), AiState::NeedPatrol);
        assert_eq!(body.velocity, Vec3::ZERO);

        ai.update(ID, &mut body, true, &graph, &Perception::blind(), DT);
        assert_eq!(ai.state(), AiState::Patrol);
        assert_eq!(ai.current_path(), &[Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO]);
        assert_eq!(ai.target(), Vec3::new(5.0, 0.0, 0.0));
    }
}
