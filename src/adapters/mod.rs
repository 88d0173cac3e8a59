//! Adapters for the outside world.

pub mod handlers;
