//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate session, walker and host loader into command-level APIs.
//! - Keep CLI and host adapters decoupled from traversal details.

pub mod symbol_service;
