//! Debugger host adapters.
//!
//! # Responsibility
//! - Implement [`crate::loader::SymbolLoader`] against a real gdb session.
//! - Keep MI protocol details out of the load service.

pub mod gdb;
pub mod mi;
