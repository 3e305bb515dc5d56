//! macro-deck
//!
//! Records global keyboard and mouse input as key-state snapshots and
//! replays them in a loop through simulated input.

pub mod config;
pub mod control;
pub mod data;
pub mod error;
pub mod input;
pub mod logging;
pub mod player;
pub mod recorder;
pub mod store;

#[cfg(test)]
mod test_support;
