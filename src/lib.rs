pub mod classify;
pub mod config;
pub mod conflict;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod family;
pub mod model;
