//! # Authentication Module
//!
//! Handles JWT token issuance, validation, and middleware for securing API endpoints.

pub mod jwt;
pub mod middleware;
pub mod models;
