//! configuration-service: hierarchical configuration management with
//! inheritance along the node tree and reference-aware cloning.
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
