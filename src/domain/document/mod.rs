//! Document module - per-upload verification state machine.
//!
//! Covers the lifecycle of one uploaded artifact: extraction output is
//! stored as a [`DocumentContext`] entry, driven through the tri-state
//! verification machine, corrected via free-text parsing, and finally
//! category-bound to a service on confirmation.

mod category;
mod correction;
mod entry;

pub use category::{DocumentCategory, ServiceBinding};
pub use correction::{contains_field_token, parse_corrections};
pub use entry::{
    mask_identifier, normalize_identifier, CategoryDetection, DocumentContext, VerificationState,
};
