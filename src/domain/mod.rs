//! Domain layer - pure conversation logic, no I/O.

pub mod document;
pub mod foundation;
pub mod intent;
pub mod reply;
pub mod session;
pub mod workflow;
