//! Queue Monitor - watches one public service queue and announces changes in
//! its availability.
//!
//! This library provides the collector, the state machine, persistence and
//! the poll loop; the binary wires them to the environment.

pub mod collector;
pub mod config;
pub mod monitor;
pub mod notify;
pub mod persistence;
pub mod retry;
pub mod runner;
pub mod types;

#[cfg(test)]
pub mod test_utils;
