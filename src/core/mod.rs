pub mod budget;
pub mod catalog;
#[cfg(feature = "narrator")]
pub mod collab;
pub mod config;
pub mod export;
pub mod regulation;
pub mod requests;
pub mod session;
pub mod spark;
pub mod telemetry;
