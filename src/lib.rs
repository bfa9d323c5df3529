//! Sprintlens: delivery analytics for sprints and initiative portfolios
//!
//! The crate takes already-typed sprint, story, initiative, and team records
//! and derives forecasts, health scores, risk assessments, priorities,
//! capacity plans, and advisory recommendations from them. It performs no
//! record I/O and renders nothing; every result is a plain serializable
//! structure owned by the caller.

pub mod analysis;
pub mod core;
pub mod entities;

pub use crate::core::{Config, Error, Result};
