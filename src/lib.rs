pub mod api;
pub mod app_state;
pub mod config;
pub mod db;
pub mod middleware;
pub mod utils;
pub mod workflow;
pub mod ws;
