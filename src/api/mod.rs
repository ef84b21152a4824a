//! HTTP API module for the dataset routes.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::{ApiError, AppState};
pub use routes::create_router;
