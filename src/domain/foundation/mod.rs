//! Foundation module - shared value objects and error types.
//!
//! Small building blocks used across every domain module: strongly-typed
//! identifiers, timestamps, session status, and the domain error
//! hierarchy.

mod errors;
mod ids;
mod session_status;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{MessageId, SessionId, SubjectId, NEW_SESSION_TOKEN, SESSION_END_TOKEN};
pub use session_status::SessionStatus;
pub use timestamp::Timestamp;
