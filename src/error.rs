// Session-level errors: fatal configuration problems raised while setting up a game

use crate::nav::NavError;
use glam::Vec3;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Navigation(#[from] NavError),
    #[error("Actor mass must be positive, got {0}")]
    NonPositiveMass(f32),
    #[error("Actor scale must be positive, got {0}")]
    NonPositiveScale(f32),
    #[error("Patrol endpoint {0} is not a navigation node")]
    UnknownWaypoint(Vec3),
    #[error("Invalid waypoint token '{token}': {message}")]
    InvalidToken { token: String, message: String },
    #[error("No navigation route between patrol endpoints {begin} and {end}")]
    NoPatrolPath { begin: Vec3, end: Vec3 },
}
