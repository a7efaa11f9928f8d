//! Garden service: orchestration over the grid mutation engine.
//!
//! Hosts implement the engine's store contracts over their persistence;
//! this crate ships a reference in-memory store, the service facade the
//! outer application calls, and a demo binary that exercises a batch end
//! to end.

pub mod memory;
pub mod service;
