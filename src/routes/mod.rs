// # Routes Module
//
// HTTP route handlers for the FlowGenie backend, organized by API domain.
// Each submodule exposes a `create_routes()` builder that `server.rs`
// merges into the application router.

/// Health check and monitoring endpoints
pub mod health;

/// User registration, login, and profile endpoints
pub mod users;

/// Trading agent CRUD, command, and marketplace endpoints
pub mod agents;

/// Flow blockchain pass-through endpoints
pub mod flow;
