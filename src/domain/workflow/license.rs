//! License renewal workflow state machine.
//!
//! `license_shown -> license_confirmed -> asking_duration ->
//! confirming_license_payment_details -> license_payment_confirmed`.
//!
//! Declining at `license_shown` or at the payment confirmation step
//! cancels the session outright: this is a one-way workflow once
//! entered.

use std::fmt;

/// Position within the license renewal workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseState {
    LicenseShown,
    LicenseConfirmed,
    AskingDuration,
    ConfirmingPaymentDetails,
    PaymentConfirmed,
}

/// What the engine should do after applying a user event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseAction {
    /// Move to a new workflow state.
    Advance(LicenseState),
    /// Cancel the whole session (one-way decline).
    CancelSession,
    /// Keep the current state and re-prompt.
    Stay,
}

impl LicenseState {
    /// Persisted string form (`context.license_renewal_workflow_state`).
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseState::LicenseShown => "license_shown",
            LicenseState::LicenseConfirmed => "license_confirmed",
            LicenseState::AskingDuration => "asking_duration",
            LicenseState::ConfirmingPaymentDetails => "confirming_license_payment_details",
            LicenseState::PaymentConfirmed => "license_payment_confirmed",
        }
    }

    /// Parses the persisted form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "license_shown" => Some(LicenseState::LicenseShown),
            "license_confirmed" => Some(LicenseState::LicenseConfirmed),
            "asking_duration" => Some(LicenseState::AskingDuration),
            "confirming_license_payment_details" => Some(LicenseState::ConfirmingPaymentDetails),
            "license_payment_confirmed" => Some(LicenseState::PaymentConfirmed),
            _ => None,
        }
    }

    /// Applies an affirmative answer at this state.
    pub fn on_affirmative(self) -> LicenseAction {
        match self {
            LicenseState::LicenseShown => LicenseAction::Advance(LicenseState::LicenseConfirmed),
            LicenseState::LicenseConfirmed => LicenseAction::Advance(LicenseState::AskingDuration),
            // An affirmative is not a duration; re-ask.
            LicenseState::AskingDuration => LicenseAction::Stay,
            LicenseState::ConfirmingPaymentDetails => {
                LicenseAction::Advance(LicenseState::PaymentConfirmed)
            }
            // Terminal; repeated confirmations must not regress.
            LicenseState::PaymentConfirmed => LicenseAction::Stay,
        }
    }

    /// Applies a negative answer at this state.
    pub fn on_negative(self) -> LicenseAction {
        match self {
            LicenseState::LicenseShown | LicenseState::ConfirmingPaymentDetails => {
                LicenseAction::CancelSession
            }
            _ => LicenseAction::Stay,
        }
    }

    /// Applies a parsed duration; only meaningful while asking for one.
    pub fn on_duration(self) -> LicenseAction {
        match self {
            LicenseState::AskingDuration => {
                LicenseAction::Advance(LicenseState::ConfirmingPaymentDetails)
            }
            _ => LicenseAction::Stay,
        }
    }

    /// Terminal state: the turn should redirect to the end-of-session
    /// confirmation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LicenseState::PaymentConfirmed)
    }
}

impl fmt::Display for LicenseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Renewal fee for the chosen duration.
pub fn renewal_fee(years: u8, fee_per_year: f64) -> f64 {
    years as f64 * fee_per_year
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_form_round_trips() {
        for state in [
            LicenseState::LicenseShown,
            LicenseState::LicenseConfirmed,
            LicenseState::AskingDuration,
            LicenseState::ConfirmingPaymentDetails,
            LicenseState::PaymentConfirmed,
        ] {
            assert_eq!(LicenseState::parse(state.as_str()), Some(state));
        }
    }

    #[test]
    fn happy_path_advances_in_order() {
        assert_eq!(
            LicenseState::LicenseShown.on_affirmative(),
            LicenseAction::Advance(LicenseState::LicenseConfirmed)
        );
        assert_eq!(
            LicenseState::LicenseConfirmed.on_affirmative(),
            LicenseAction::Advance(LicenseState::AskingDuration)
        );
        assert_eq!(
            LicenseState::AskingDuration.on_duration(),
            LicenseAction::Advance(LicenseState::ConfirmingPaymentDetails)
        );
        assert_eq!(
            LicenseState::ConfirmingPaymentDetails.on_affirmative(),
            LicenseAction::Advance(LicenseState::PaymentConfirmed)
        );
        assert!(LicenseState::PaymentConfirmed.is_terminal());
    }

    #[test]
    fn declining_the_offer_cancels_the_session() {
        assert_eq!(
            LicenseState::LicenseShown.on_negative(),
            LicenseAction::CancelSession
        );
        assert_eq!(
            LicenseState::ConfirmingPaymentDetails.on_negative(),
            LicenseAction::CancelSession
        );
    }

    #[test]
    fn negative_elsewhere_stays_put() {
        assert_eq!(LicenseState::AskingDuration.on_negative(), LicenseAction::Stay);
        assert_eq!(LicenseState::LicenseConfirmed.on_negative(), LicenseAction::Stay);
    }

    #[test]
    fn repeated_affirmative_does_not_regress_terminal_state() {
        assert_eq!(
            LicenseState::PaymentConfirmed.on_affirmative(),
            LicenseAction::Stay
        );
    }

    #[test]
    fn duration_outside_asking_state_is_ignored() {
        assert_eq!(LicenseState::LicenseShown.on_duration(), LicenseAction::Stay);
    }

    #[test]
    fn fee_is_per_year_times_duration() {
        assert_eq!(renewal_fee(3, 30.0), 90.0);
        assert_eq!(renewal_fee(1, 30.0), 30.0);
    }
}
