//! Curmunchkins Engine: the rules behind neuro-inclusive story authoring.
//!
//! Stories are built from a fixed five-beat shape ("Sparks") while a
//! multi-axis sensory budget keeps every scene within what the child can
//! tolerate. The engine derives the active load from a location plus the
//! props in play, drives the Spark cursor and its authored beats, and raises
//! regulation alerts when a stressor's intensity crosses the threshold.

pub mod core;
pub mod schema;

pub use crate::core::session::{Session, SessionBuilder, SessionError};
