pub mod app;
pub mod config;
pub mod counters;
pub mod discord;
pub mod metrics;

pub mod error;
pub mod logger;
