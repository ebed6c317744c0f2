//! Readiness predicate: when may a service leave its document-gathering
//! phase.
//!
//! A service is ready once at least one *verified* document carries the
//! full required field set and an allowed category. The check is cheap
//! and idempotent; the engine re-evaluates it every turn.

use crate::domain::document::{DocumentCategory, DocumentContext, VerificationState};

use super::ServiceKind;

/// Fields a verified document must carry for the service to proceed.
pub fn required_fields(service: ServiceKind) -> &'static [&'static str] {
    match service {
        ServiceKind::LicenseRenewal => &["name", "ic_number"],
        ServiceKind::BillPayment => &["account_number", "amount"],
    }
}

/// Document categories acceptable for the service.
pub fn allowed_categories(service: ServiceKind) -> &'static [DocumentCategory] {
    match service {
        ServiceKind::LicenseRenewal => &[
            DocumentCategory::DrivingLicense,
            DocumentCategory::IdentityCard,
        ],
        ServiceKind::BillPayment => &[DocumentCategory::UtilityBill],
    }
}

/// True if any verified document satisfies the service's gate.
pub fn service_ready<'a, I>(service: ServiceKind, documents: I) -> bool
where
    I: IntoIterator<Item = &'a DocumentContext>,
{
    documents.into_iter().any(|doc| {
        doc.is_verified == VerificationState::Verified
            && allowed_categories(service).contains(&doc.category())
            && required_fields(service)
                .iter()
                .all(|field| doc.extracted_data.get(*field).is_some_and(|v| !v.is_empty()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::CategoryDetection;
    use std::collections::BTreeMap;

    fn doc(category: &str, fields: &[(&str, &str)], verified: bool) -> DocumentContext {
        let mut entry = DocumentContext::new(
            "doc.jpg",
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            CategoryDetection {
                detected_category: category.to_string(),
                confidence: 0.9,
            },
        );
        if verified {
            entry.confirm().unwrap();
        }
        entry
    }

    #[test]
    fn verified_license_with_required_fields_is_ready() {
        let d = doc(
            "driving_license",
            &[("name", "Ahmad"), ("ic_number", "900101145678")],
            true,
        );
        assert!(service_ready(ServiceKind::LicenseRenewal, [&d]));
    }

    #[test]
    fn unverified_document_is_not_ready() {
        let d = doc(
            "driving_license",
            &[("name", "Ahmad"), ("ic_number", "900101145678")],
            false,
        );
        assert!(!service_ready(ServiceKind::LicenseRenewal, [&d]));
    }

    #[test]
    fn missing_required_field_blocks_readiness() {
        let d = doc("driving_license", &[("name", "Ahmad")], true);
        assert!(!service_ready(ServiceKind::LicenseRenewal, [&d]));
    }

    #[test]
    fn wrong_category_blocks_readiness() {
        let d = doc(
            "utility_bill",
            &[("name", "Ahmad"), ("ic_number", "900101145678")],
            true,
        );
        assert!(!service_ready(ServiceKind::LicenseRenewal, [&d]));
    }

    #[test]
    fn identity_card_is_acceptable_for_license_renewal() {
        let d = doc(
            "identity_card",
            &[("name", "Ahmad"), ("ic_number", "900101145678")],
            true,
        );
        assert!(service_ready(ServiceKind::LicenseRenewal, [&d]));
    }

    #[test]
    fn bill_payment_requires_account_and_amount() {
        let ready = doc(
            "utility_bill",
            &[("account_number", "2201234567"), ("amount", "152.40")],
            true,
        );
        let missing = doc("utility_bill", &[("account_number", "2201234567")], true);
        assert!(service_ready(ServiceKind::BillPayment, [&ready]));
        assert!(!service_ready(ServiceKind::BillPayment, [&missing]));
    }

    #[test]
    fn any_one_qualifying_document_suffices() {
        let bad = doc("utility_bill", &[], false);
        let good = doc(
            "utility_bill",
            &[("account_number", "2201234567"), ("amount", "152.40")],
            true,
        );
        assert!(service_ready(ServiceKind::BillPayment, [&bad, &good]));
    }
}
