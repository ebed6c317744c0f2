//! Service workflow module - per-service multi-step state machines.
//!
//! Each supported service is a small explicit state machine persisted as
//! a scalar string under `context.<service>_workflow_state`, gated by a
//! readiness predicate over the session's verified documents.

mod bills;
mod duration;
mod license;
mod readiness;
mod service;

pub use bills::{BillAction, BillState};
pub use duration::{parse_duration_years, MAX_YEARS, MIN_YEARS};
pub use license::{renewal_fee, LicenseAction, LicenseState};
pub use readiness::{allowed_categories, required_fields, service_ready};
pub use service::ServiceKind;
