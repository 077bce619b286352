//! Command handlers
//!
//! Each module takes the opened store, the resolved owner and an `Output`,
//! and prints its result in the requested format.

pub mod artifact;
pub mod cleanup;
pub mod collection;
pub mod config;
pub mod share;
pub mod stats;
pub mod tag;
pub mod transfer;
