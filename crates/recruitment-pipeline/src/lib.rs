//! Recruitment pipeline client.
//!
//! Mirrors the server-side recruitment stage machine closely enough to offer the right
//! actions, renders an application into a bound surface, and talks to the backend through
//! a typed transport. A sandbox implementation of the backend lives alongside the client so
//! the whole flow can be exercised without the production HR service.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
