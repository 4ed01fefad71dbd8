pub mod config;
pub mod control;
pub mod health;
pub mod metrics;
