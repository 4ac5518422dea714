// HTTP API routes
//
// Each submodule handles one resource with its own state struct.

pub mod activity;
pub mod archive;
pub mod common;
pub mod events;
pub mod registrations;
pub mod users;
pub mod validation;

// Re-export common types
pub use common::{ApiError, ErrorResponse, ListResponse};
