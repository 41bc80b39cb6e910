//! # Meal Planner
//!
//! Backend for weekly meal plans: locally authored recipes, recipes snapshotted
//! from an external provider, and a consolidated shopping list derived from
//! everything planned for the week.

pub mod circuit_breaker;
pub mod classifier;
pub mod collector;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod normalizer;
pub mod provider;
pub mod quantity;
pub mod shopping_list;
