//! TNB bill payment workflow state machine.
//!
//! `(initial) -> [selecting_account when several linked accounts] ->
//! tnb_bills_shown -> tnb_bills_confirmed`. If no outstanding bills are
//! found the workflow short-circuits straight to an end-of-session
//! offer.

use std::fmt;

/// Position within the bill payment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillState {
    SelectingAccount,
    BillsShown,
    BillsConfirmed,
}

/// What the engine should do after applying a user event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillAction {
    /// Move to a new workflow state.
    Advance(BillState),
    /// Offer to end the session (nothing left to do).
    OfferEnd,
    /// Keep the current state and re-prompt.
    Stay,
}

impl BillState {
    /// Persisted string form (`context.bill_payment_workflow_state`).
    pub fn as_str(&self) -> &'static str {
        match self {
            BillState::SelectingAccount => "selecting_account",
            BillState::BillsShown => "tnb_bills_shown",
            BillState::BillsConfirmed => "tnb_bills_confirmed",
        }
    }

    /// Parses the persisted form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "selecting_account" => Some(BillState::SelectingAccount),
            "tnb_bills_shown" => Some(BillState::BillsShown),
            "tnb_bills_confirmed" => Some(BillState::BillsConfirmed),
            _ => None,
        }
    }

    /// Applies an account selection; only meaningful while selecting.
    pub fn on_account_selected(self) -> BillAction {
        match self {
            BillState::SelectingAccount => BillAction::Advance(BillState::BillsShown),
            _ => BillAction::Stay,
        }
    }

    /// Applies an affirmative answer at this state.
    pub fn on_affirmative(self) -> BillAction {
        match self {
            BillState::BillsShown => BillAction::Advance(BillState::BillsConfirmed),
            // Terminal; repeated confirmations must not regress.
            BillState::BillsConfirmed => BillAction::Stay,
            BillState::SelectingAccount => BillAction::Stay,
        }
    }

    /// Applies a negative answer at this state.
    ///
    /// Declining the shown bills means there is nothing to pay; the
    /// engine offers to end the session rather than cancelling.
    pub fn on_negative(self) -> BillAction {
        match self {
            BillState::BillsShown => BillAction::OfferEnd,
            _ => BillAction::Stay,
        }
    }

    /// Terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BillState::BillsConfirmed)
    }
}

impl fmt::Display for BillState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
