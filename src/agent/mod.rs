//! # Agent Module
//!
//! Trading agent pipeline: registry of agent records, free-text command
//! interpretation, validated action execution, and performance bookkeeping.

pub mod executor;
pub mod interpreter;
pub mod performance;
pub mod registry;
pub mod types;
