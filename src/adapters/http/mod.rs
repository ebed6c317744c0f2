//! HTTP adapter - REST surface of the engine.

mod handlers;
mod routes;

pub use handlers::AppState;
pub use routes::app_router;
