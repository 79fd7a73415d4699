//! Deterministic random number generation
//!
//! Uses the xorshift64* algorithm. Every random draw in the simulator goes
//! through this module so that a seed fully determines a run.

mod xorshift;

pub use xorshift::RngManager;
