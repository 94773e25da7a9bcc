//! Use-case layer.
//!
//! # Responsibility
//! - Translate user intents into store operations.
//! - Translate store outcomes into view notifications.

pub mod goal_controller;
