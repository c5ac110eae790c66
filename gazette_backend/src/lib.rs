pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod feed;
pub mod images;
pub mod pagination;
pub mod publishing;
pub mod telemetry;
pub mod utils;
