//! Configuration constants for the tank arena simulation.

use std::f32::consts::PI;

// Simulation clock
pub const DEFAULT_TICK_RATE: u32 = 60; // Ticks per second for the headless runner
pub const DEFAULT_TICKS: u32 = 3600; // One minute of simulated play at 60 Hz

// Tank hull
pub const TANK_MASS: f32 = 50.0;
pub const TANK_TERMINAL_VELOCITY: f32 = 8.0; // World units per second
pub const TANK_SCALE: f32 = 1.0;
pub const TANK_MODEL_RADIUS: f32 = 1.5; // Model-space bounding sphere radius
pub const TANK_MAX_HEALTH: f32 = 100.0;
pub const TANK_ENGINE_FORCE: f32 = 400.0; // Newtons applied while driving forward
pub const TANK_REVERSE_FORCE: f32 = 250.0;
pub const TANK_DRAG: f32 = 60.0; // Drag force per unit of velocity when coasting
pub const TANK_TURN_RATE: f32 = PI / 2.0; // Hull yaw rate, radians per second
pub const MUZZLE_OFFSET: f32 = 2.0; // Distance ahead of the hull where projectiles spawn

// Boost window
pub const BOOST_FACTOR: f32 = 1.75; // Terminal velocity multiplier while boosting
pub const BOOST_DURATION: f32 = 3.0; // Seconds

// Weapons
pub const SHELL_DAMAGE: f32 = 10.0;
pub const MISSILE_DAMAGE: f32 = 30.0;
pub const SHELL_SPEED: f32 = 40.0;
pub const MISSILE_SPEED: f32 = 25.0;
pub const PROJECTILE_MASS: f32 = 1.0;
pub const PROJECTILE_MODEL_RADIUS: f32 = 0.25;
pub const PROJECTILE_LIFETIME: f32 = 3.0; // Seconds before a projectile self-detonates
pub const PLAYER_FIRE_COOLDOWN: f32 = 0.5;
pub const AI_FIRE_COOLDOWN: f32 = 2.0;
pub const PLAYER_RESPAWN_DELAY: f32 = 5.0;

// Static geometry
pub const ROOF_CORNER_HEIGHT: f32 = 1.0; // Box corners above this height are ignored by wall resolution

// AI
pub const TURRET_ROTATION_SPEED: f32 = PI / 2.0; // Radians per second
pub const SCAN_SUB_STEPS: u32 = 4; // Line-of-sight checks per tick while scanning
pub const SCAN_HALF_ANGLE: f32 = PI / 12.0; // Half-width of the turret sight cone
pub const AI_SPEED: f32 = 4.0; // Patrol speed, world units per second
pub const AI_PURSUE_SPEED: f32 = 6.0;
pub const AI_TURN_RATE: f32 = PI / 2.0; // Hull yaw rate, radians per second
pub const HEADING_TOLERANCE: f32 = 0.1; // Heading snaps to target within this many radians
pub const AIM_TOLERANCE: f32 = 0.05;
pub const ARRIVAL_RADIUS: f32 = 0.25; // Waypoint counts as reached within this distance
pub const DETECTION_RADIUS: f32 = 20.0; // Automatic player detection range
pub const SIGHT_RANGE: f32 = 40.0; // Maximum range of the scanning turret
pub const ATTACK_RANGE: f32 = 15.0;
pub const SIGHT_HEIGHT: f32 = 1.0; // Height of the turret's line of sight above the hull origin
