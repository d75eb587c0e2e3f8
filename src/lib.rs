pub mod actor;
pub mod ai;
pub mod arena;
pub mod building;
pub mod collision;
pub mod config;
pub mod error;
pub mod game;
pub mod logging;
pub mod nav;
pub mod player;
pub mod timer;
pub mod types;
pub mod utils;
