//! Session module - the persisted conversation record.

mod aggregate;
mod context;
mod message;
mod schema;

pub use aggregate::Session;
pub use context::{
    SessionContext, DOCUMENT_KEY_PREFIX, REDIRECT_TO_END_CONNECTION, TIMEOUT_AWAITING_CHOICE,
};
pub use message::{Role, TurnMessage};
pub use schema::{upgrade_context, CURRENT_SCHEMA_VERSION};
