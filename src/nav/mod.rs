// Navigation module entry point: waypoint graph loading and path search

pub mod error;
pub mod graph;
pub mod pathfinder;

pub use error::NavError;
pub use graph::{NavGraph, Vertex};
