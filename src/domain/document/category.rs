//! Document categories and category-gated service binding.
//!
//! The extraction service labels each upload with a free-form category
//! string; this module maps those labels onto the closed set the engine
//! understands and decides which service (if any) a freshly verified
//! document should activate.

use crate::domain::workflow::ServiceKind;

/// Closed set of document categories the engine reasons about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentCategory {
    IdentityCard,
    DrivingLicense,
    UtilityBill,
    Other(String),
}

impl DocumentCategory {
    /// Maps an extraction-service label onto a known category.
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "identity_card" | "mykad" | "ic" | "national_id" => DocumentCategory::IdentityCard,
            "driving_license" | "driving_licence" | "license" | "lesen_memandu" => {
                DocumentCategory::DrivingLicense
            }
            "utility_bill" | "tnb_bill" | "electricity_bill" | "bil_elektrik" => {
                DocumentCategory::UtilityBill
            }
            _ => DocumentCategory::Other(normalized),
        }
    }

    /// Returns true if this category carries the holder's identity and
    /// must pass the subject cross-check before being stored.
    pub fn is_identity(&self) -> bool {
        matches!(
            self,
            DocumentCategory::IdentityCard | DocumentCategory::DrivingLicense
        )
    }
}

/// Outcome of category-gated auto-binding once a document verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceBinding {
    /// Category unambiguously selects a service.
    Bind(ServiceKind),
    /// Identity-only category: the user must choose a service explicitly.
    AskUser,
    /// Category does not map to any service.
    None,
}

impl DocumentCategory {
    /// Service auto-binding for this category.
    ///
    /// A utility bill activates bill payment and a driving license
    /// activates license renewal; a bare identity card could serve
    /// either, so the user is asked instead of guessing.
    pub fn service_binding(&self) -> ServiceBinding {
        match self {
            DocumentCategory::UtilityBill => ServiceBinding::Bind(ServiceKind::BillPayment),
            DocumentCategory::DrivingLicense => ServiceBinding::Bind(ServiceKind::LicenseRenewal),
            DocumentCategory::IdentityCard => ServiceBinding::AskUser,
            DocumentCategory::Other(_) => ServiceBinding::None,
        }
    }
}
