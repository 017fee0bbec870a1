//! Strand Core Types
//!
//! This crate provides the foundational types used throughout the Strand mapper:
//! - Value types (the Value enum carried in properties and parameters)
//! - The Entity capability implemented by mapped domain objects
//! - Result models (graph, row, graph-row, statistics)
//! - Common error messages

mod entity;
pub mod messages;
mod model;
mod value;

pub use entity::*;
pub use model::*;
pub use value::*;
