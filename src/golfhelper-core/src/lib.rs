//! Golfhelper Core Library
//!
//! Configuration, logging and the organize pipeline behind the `golfhelper` CLI.

pub mod colored_logger;
pub mod config;
pub mod organizer;
