//! # Flow Module
//!
//! Blockchain collaborator boundary: the `FlowClient` capability trait, the
//! fixed action catalog that wraps it, and the static Cadence templates the
//! actions submit.

pub mod actions;
pub mod client;
pub mod templates;
