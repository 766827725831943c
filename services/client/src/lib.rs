//! Adapters and runtime wiring for the TriHeart reader client.

pub mod adapters;
pub mod config;
pub mod error;
pub mod reader;
pub mod session;
