//! Plain data types shared by the engine, the exporters and the bindings.

pub mod catalog;
pub mod sensory;
pub mod spark;
pub mod story;
