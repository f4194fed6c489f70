//! # Users Module
//!
//! In-memory user accounts with argon2-hashed passwords.

pub mod store;
