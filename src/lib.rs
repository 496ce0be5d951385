pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod leaderboard;
pub mod maze;
pub mod rng;
pub mod room;
pub mod server_protocol;
pub mod server_utils;
pub mod service;
pub mod store;
pub mod types;
