//! Supported services and their reserved context-key families.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A government service the assistant can walk a user through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    LicenseRenewal,
    BillPayment,
}

impl ServiceKind {
    /// Stable tag used in persistence and context keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::LicenseRenewal => "license_renewal",
            ServiceKind::BillPayment => "bill_payment",
        }
    }

    /// Parses the persisted tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "license_renewal" => Some(ServiceKind::LicenseRenewal),
            "bill_payment" => Some(ServiceKind::BillPayment),
            _ => None,
        }
    }

    /// Context key holding this service's workflow state.
    pub fn workflow_state_key(&self) -> String {
        format!("{}_workflow_state", self.as_str())
    }

    /// Context key for a service-scoped scratch value.
    pub fn param_key(&self, param: &str) -> String {
        format!("{}_{}", self.as_str(), param)
    }

    /// One-shot flag set when the visible transcript was cleared on
    /// first readiness.
    pub fn messages_cleared_key(&self) -> String {
        format!("{}_messages_cleared", self.as_str())
    }

    /// Human-readable name for replies.
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::LicenseRenewal => "driving license renewal",
            ServiceKind::BillPayment => "TNB bill payment",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
