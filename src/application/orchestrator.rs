//! Conversation orchestrator - one stateless invocation per turn.
//!
//! Loads the session snapshot, runs the upload or message pipeline, and
//! persists every state change through atomic partial updates before
//! both sides of the turn are pushed to the transcript together.
//! Deterministic templates answer everything safety-critical; the
//! completion service is only consulted for open-ended passthrough
//! turns and degrades to an apology on failure.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::domain::document::{
    mask_identifier, normalize_identifier, DocumentCategory, DocumentContext, ServiceBinding,
    VerificationState,
};
use crate::domain::foundation::{DomainError, SessionId, SessionStatus, SubjectId};
use crate::domain::intent::{Intent, TimeoutChoice};
use crate::domain::reply::{build_prompt, normalize_reply, templates};
use crate::domain::session::{
    Session, SessionContext, TurnMessage, REDIRECT_TO_END_CONNECTION, TIMEOUT_AWAITING_CHOICE,
};
use crate::domain::workflow::{
    renewal_fee, service_ready, BillAction, BillState, LicenseAction, LicenseState, ServiceKind,
};
use crate::ports::{
    Attachment, CompletionProvider, CompletionRequest, DocumentExtractor, SessionStore,
};

use super::classifier::{ClassifySnapshot, IntentClassifier};
use super::lifecycle::{SessionHandle, SessionLifecycle};
use super::turn::{TurnData, TurnError, TurnRequest, TurnResponse};

/// Tunables the engine reads per turn.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Inactivity window before the continue-or-new prompt.
    pub timeout_minutes: i64,
    /// License renewal fee per year, in RM.
    pub fee_per_year: f64,
    /// Token budget for generative replies.
    pub reply_max_tokens: u32,
    /// Sampling temperature for generative replies.
    pub reply_temperature: f32,
    /// Nucleus sampling parameter for generative replies.
    pub reply_top_p: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timeout_minutes: 30,
            fee_per_year: 30.0,
            reply_max_tokens: 512,
            reply_temperature: 0.5,
            reply_top_p: 0.8,
        }
    }
}

/// What one turn resolved to, before transcript persistence.
struct TurnOutcome {
    reply: String,
    intent_tag: &'static str,
    /// Session reached a terminal status this turn.
    ended: bool,
    /// Completion-service failure marker for the assistant message.
    model_error: Option<String>,
}

impl TurnOutcome {
    fn new(reply: String, intent_tag: &'static str) -> Self {
        Self {
            reply,
            intent_tag,
            ended: false,
            model_error: None,
        }
    }

    fn ended(mut self) -> Self {
        self.ended = true;
        self
    }
}

/// The turn-processing engine.
pub struct ConversationOrchestrator {
    store: Arc<dyn SessionStore>,
    extractor: Arc<dyn DocumentExtractor>,
    completion: Arc<dyn CompletionProvider>,
    classifier: IntentClassifier,
    lifecycle: SessionLifecycle,
    settings: EngineSettings,
}

impl ConversationOrchestrator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        extractor: Arc<dyn DocumentExtractor>,
        completion: Arc<dyn CompletionProvider>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(completion.clone()),
            lifecycle: SessionLifecycle::new(store.clone(), settings.timeout_minutes),
            store,
            extractor,
            completion,
            settings,
        }
    }

    /// Handles one inbound turn end to end.
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnResponse, TurnError> {
        request.validate()?;
        let subject = SubjectId::new(request.subject_id.clone()).map_err(DomainError::from)?;
        let session_id = SessionId::from_token(request.session_id.clone());

        let (mut session, fresh) = match self.lifecycle.begin_or_resume(&subject, &session_id).await?
        {
            SessionHandle::Ready { session, fresh } => (session, fresh),
            SessionHandle::RestartRequired => {
                // Nothing is persisted for unusable session ids.
                return Ok(respond(
                    SessionId::end_marker(),
                    TurnMessage::assistant(templates::restart_required_notice()),
                    Some("none".to_string()),
                    None,
                ));
            }
        };
        self.lifecycle.upgrade_schema(&mut session).await?;

        let outcome = match request.first_attachment() {
            Some(attachment) => self.handle_upload(&mut session, attachment).await?,
            None => {
                let text = request.message.as_deref().unwrap_or_default();
                self.handle_message(&mut session, text, fresh).await?
            }
        };

        let user_content = match request.first_attachment() {
            Some(attachment) => format!("[document uploaded: {}]", attachment.name),
            None => request.message.clone().unwrap_or_default(),
        };
        let user_message =
            TurnMessage::user(user_content, Some(outcome.intent_tag.to_string()));
        let mut assistant_message = TurnMessage::assistant(outcome.reply.clone());
        if let Some(error) = &outcome.model_error {
            assistant_message = assistant_message.with_model_error(error.clone());
        }

        // Both turn sides land in one atomic push.
        self.store
            .push_messages(
                session.subject_id(),
                session.id(),
                &[user_message, assistant_message.clone()],
            )
            .await?;

        info!(
            session_id = %session.id(),
            intent = outcome.intent_tag,
            ended = outcome.ended,
            "turn handled"
        );

        let visible_id = if outcome.ended {
            SessionId::end_marker()
        } else {
            session.id().clone()
        };
        Ok(respond(
            visible_id,
            assistant_message,
            Some(outcome.intent_tag.to_string()),
            request.attachment.clone(),
        ))
    }

    // ── Upload pipeline ────────────────────────────────────────────

    async fn handle_upload(
        &self,
        session: &mut Session,
        attachment: &Attachment,
    ) -> Result<TurnOutcome, TurnError> {
        let extraction = self.extractor.extract(attachment).await?;
        if extraction.blurry {
            return Ok(TurnOutcome::new(
                templates::blurry_document_notice(),
                "document_upload",
            ));
        }

        let entry = DocumentContext::new(
            attachment.name.clone(),
            extraction.fields,
            extraction.category,
        );

        // A bound service only accepts its own document categories.
        if let Some(service) = session.service() {
            let category = entry.category();
            let acceptable = crate::domain::workflow::allowed_categories(service)
                .contains(&category)
                || matches!(category, DocumentCategory::IdentityCard);
            if !acceptable {
                return Ok(TurnOutcome::new(
                    templates::wrong_category_notice(service),
                    "document_upload",
                ));
            }
        }

        // Identity documents must belong to the authenticated subject.
        if entry.category().is_identity() {
            if let Some(id_value) = entry.identifier_value() {
                if normalize_identifier(id_value) != session.subject_id().normalized() {
                    warn!(session_id = %session.id(), "identity document mismatch");
                    return Ok(TurnOutcome::new(
                        templates::identity_mismatch_notice(&mask_identifier(id_value)),
                        "document_upload",
                    ));
                }
            }
        }

        let key = SessionContext::document_key(&entry.file_name);
        let value = serde_json::to_value(&entry).unwrap_or(Value::Null);
        self.merge(session, BTreeMap::from([(key, value)])).await?;

        Ok(TurnOutcome::new(
            templates::verification_prompt(&entry),
            "document_upload",
        ))
    }

    // ── Message pipeline ───────────────────────────────────────────

    async fn handle_message(
        &self,
        session: &mut Session,
        text: &str,
        fresh: bool,
    ) -> Result<TurnOutcome, TurnError> {
        // Idle sessions get the continue-or-new prompt before anything
        // else; the user's message is recorded but not acted on.
        if !fresh
            && !session.context().flag(TIMEOUT_AWAITING_CHOICE)
            && self.lifecycle.timed_out(session)
        {
            self.merge(
                session,
                BTreeMap::from([(TIMEOUT_AWAITING_CHOICE.to_string(), json!(true))]),
            )
            .await?;
            return Ok(TurnOutcome::new(templates::timeout_choice_prompt(), "none"));
        }

        let intent = {
            let pending = session.context().pending_document();
            let account_options = self.account_options(session);
            let snapshot = ClassifySnapshot {
                pending_document: pending.as_ref().map(|(_, doc)| doc),
                active_service: session.service(),
                workflow_state: session
                    .service()
                    .and_then(|s| session.context().workflow_state(s)),
                timeout_awaiting_choice: session.context().flag(TIMEOUT_AWAITING_CHOICE),
                account_options,
            };
            self.classifier.classify(text, &snapshot).await
        };

        match intent {
            Intent::EndSession => {
                self.end_session(session, SessionStatus::Cancelled, "session_termination")
                    .await
            }
            Intent::TranscriptionFailure => Ok(TurnOutcome::new(
                templates::transcription_failure_banner(
                    session.last_assistant_message().map(|m| m.content.as_str()),
                ),
                "transcription_failure",
            )),
            Intent::TimeoutChoice(choice) => self.resolve_timeout_choice(session, choice).await,
            Intent::DocumentRejected => self.reject_document(session).await,
            Intent::CorrectionProvided(corrections) => {
                self.stage_corrections(session, corrections).await
            }
            Intent::Affirmative => self.handle_affirmative(session, text).await,
            Intent::Negative => self.handle_negative(session, text).await,
            Intent::ServiceSelection(service) => self.select_service(session, service).await,
            Intent::DurationSelection(years) => self.select_duration(session, years).await,
            Intent::AccountSelection(account) => self.select_account(session, account).await,
            Intent::None => {
                // Free text during the duration question is a reprompt,
                // not a generative digression.
                if session.service() == Some(ServiceKind::LicenseRenewal)
                    && self.license_state(session) == Some(LicenseState::AskingDuration)
                {
                    return Ok(TurnOutcome::new(templates::invalid_duration_notice(), "none"));
                }
                Ok(self.generative_reply(session, text).await)
            }
        }
    }

    async fn end_session(
        &self,
        session: &mut Session,
        status: SessionStatus,
        intent_tag: &'static str,
    ) -> Result<TurnOutcome, TurnError> {
        session.set_status(status)?;
        self.store
            .set_status(session.subject_id(), session.id(), status)
            .await?;
        let reply = match status {
            SessionStatus::Completed => templates::session_completed_notice(),
            _ => templates::session_cancelled_notice(),
        };
        Ok(TurnOutcome::new(reply, intent_tag).ended())
    }

    async fn resolve_timeout_choice(
        &self,
        session: &mut Session,
        choice: TimeoutChoice,
    ) -> Result<TurnOutcome, TurnError> {
        match choice {
            TimeoutChoice::Continue => {
                self.remove_keys(session, &[TIMEOUT_AWAITING_CHOICE.to_string()])
                    .await?;
                // Re-serve the last prompt from before the timeout
                // interjection itself.
                let timeout_prompts =
                    [templates::timeout_choice_prompt(), templates::timeout_choice_reprompt()];
                let reply = session
                    .messages()
                    .iter()
                    .rev()
                    .find(|m| {
                        m.role == crate::domain::session::Role::Assistant
                            && !timeout_prompts.contains(&m.content)
                    })
                    .map(|m| templates::resume_banner(&m.content))
                    .unwrap_or_else(templates::anything_else_prompt);
                Ok(TurnOutcome::new(reply, "timeout_choice"))
            }
            TimeoutChoice::New => {
                session.set_status(SessionStatus::Archived)?;
                self.store
                    .set_status(session.subject_id(), session.id(), SessionStatus::Archived)
                    .await?;
                Ok(TurnOutcome::new(templates::timeout_new_notice(), "timeout_choice").ended())
            }
            TimeoutChoice::Unclear => Ok(TurnOutcome::new(
                templates::timeout_choice_reprompt(),
                "timeout_choice",
            )),
        }
    }

    // ── Document verification ──────────────────────────────────────

    async fn reject_document(&self, session: &mut Session) -> Result<TurnOutcome, TurnError> {
        let (key, mut doc) = session
            .context()
            .pending_document()
            .ok_or_else(|| DomainError::no_document_pending())?;
        doc.mark_rejected()?;
        self.put_document(session, &key, &doc).await?;
        Ok(TurnOutcome::new(
            templates::correction_needed_prompt(),
            "document_rejection",
        ))
    }

    async fn stage_corrections(
        &self,
        session: &mut Session,
        corrections: BTreeMap<String, String>,
    ) -> Result<TurnOutcome, TurnError> {
        let (key, mut doc) = session
            .context()
            .pending_document()
            .ok_or_else(|| DomainError::no_document_pending())?;
        doc.stage_corrections(corrections)?;
        self.put_document(session, &key, &doc).await?;
        Ok(TurnOutcome::new(
            templates::correction_ack(&doc),
            "correction_provided",
        ))
    }

    /// Confirms the pending document and runs the post-verification
    /// flow: category binding, readiness, workflow entry.
    async fn confirm_document(&self, session: &mut Session) -> Result<TurnOutcome, TurnError> {
        let (key, mut doc) = session
            .context()
            .pending_document()
            .ok_or_else(|| DomainError::no_document_pending())?;
        doc.confirm()?;
        self.put_document(session, &key, &doc).await?;

        // Category binding on confirmation.
        if session.service().is_none() {
            match doc.category().service_binding() {
                ServiceBinding::Bind(service) => {
                    self.bind_service(session, service).await?;
                }
                ServiceBinding::AskUser => {
                    return Ok(TurnOutcome::new(
                        templates::service_choice_prompt(),
                        "affirmative",
                    ));
                }
                ServiceBinding::None => {
                    return Ok(TurnOutcome::new(
                        templates::document_verified_notice(),
                        "affirmative",
                    ));
                }
            }
        }

        let service = match session.service() {
            Some(service) => service,
            None => {
                return Ok(TurnOutcome::new(
                    templates::document_verified_notice(),
                    "affirmative",
                ))
            }
        };

        if session.context().workflow_state(service).is_some() {
            // A bill verified while bills are still being presented
            // changes the selection; re-present with the new set.
            if service == ServiceKind::BillPayment
                && matches!(
                    self.bill_state(session),
                    Some(BillState::BillsShown | BillState::SelectingAccount)
                )
            {
                let reply = self.enter_bill_workflow(session).await?;
                return Ok(TurnOutcome::new(reply, "affirmative"));
            }
            // Otherwise this was a supplementary upload.
            return Ok(TurnOutcome::new(
                templates::document_verified_notice(),
                "affirmative",
            ));
        }

        if self.ready(session, service) {
            let reply = self.enter_workflow(session, service).await?;
            Ok(TurnOutcome::new(reply, "affirmative"))
        } else {
            Ok(TurnOutcome::new(
                templates::documents_needed_prompt(service),
                "affirmative",
            ))
        }
    }

    // ── Workflow progression ───────────────────────────────────────

    async fn handle_affirmative(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<TurnOutcome, TurnError> {
        if session.context().pending_document().is_some() {
            return self.confirm_document(session).await;
        }
        if session.context().flag(REDIRECT_TO_END_CONNECTION) {
            return self
                .end_session(session, SessionStatus::Completed, "affirmative")
                .await;
        }

        let Some(service) = session.service() else {
            return Ok(self.generative_reply(session, text).await);
        };

        match service {
            ServiceKind::LicenseRenewal => self.license_affirmative(session).await,
            ServiceKind::BillPayment => self.bill_affirmative(session).await,
        }
    }

    async fn license_affirmative(&self, session: &mut Session) -> Result<TurnOutcome, TurnError> {
        let state = self.license_state(session);
        let Some(state) = state else {
            return Ok(TurnOutcome::new(
                templates::documents_needed_prompt(ServiceKind::LicenseRenewal),
                "affirmative",
            ));
        };

        match state.on_affirmative() {
            LicenseAction::Advance(next) => match next {
                // The confirmed hop is transient; the same turn lands on
                // the duration question.
                LicenseState::LicenseConfirmed | LicenseState::AskingDuration => {
                    self.set_workflow_state(
                        session,
                        ServiceKind::LicenseRenewal,
                        LicenseState::AskingDuration.as_str(),
                    )
                    .await?;
                    Ok(TurnOutcome::new(templates::ask_duration(), "affirmative"))
                }
                LicenseState::PaymentConfirmed => {
                    self.set_workflow_state(
                        session,
                        ServiceKind::LicenseRenewal,
                        next.as_str(),
                    )
                    .await?;
                    let (years, fee) = self.license_payment_params(session);
                    self.merge(
                        session,
                        BTreeMap::from([(REDIRECT_TO_END_CONNECTION.to_string(), json!(true))]),
                    )
                    .await?;
                    Ok(TurnOutcome::new(
                        templates::payment_confirmed(years, fee),
                        "affirmative",
                    ))
                }
                _ => Ok(TurnOutcome::new(templates::end_offer(), "affirmative")),
            },
            LicenseAction::CancelSession => {
                self.end_session(session, SessionStatus::Cancelled, "affirmative")
                    .await
            }
            LicenseAction::Stay => {
                let reply = if state == LicenseState::AskingDuration {
                    templates::invalid_duration_notice()
                } else {
                    templates::end_offer()
                };
                Ok(TurnOutcome::new(reply, "affirmative"))
            }
        }
    }

    async fn bill_affirmative(&self, session: &mut Session) -> Result<TurnOutcome, TurnError> {
        let state = self.bill_state(session);
        let Some(state) = state else {
            return Ok(TurnOutcome::new(
                templates::documents_needed_prompt(ServiceKind::BillPayment),
                "affirmative",
            ));
        };

        match state.on_affirmative() {
            BillAction::Advance(next) => {
                self.set_workflow_state(session, ServiceKind::BillPayment, next.as_str())
                    .await?;
                let (account, amount) = self.selected_bill(session);
                self.merge(
                    session,
                    BTreeMap::from([(REDIRECT_TO_END_CONNECTION.to_string(), json!(true))]),
                )
                .await?;
                Ok(TurnOutcome::new(
                    templates::bill_payment_confirmed(&account, &amount),
                    "affirmative",
                ))
            }
            BillAction::OfferEnd => {
                self.merge(
                    session,
                    BTreeMap::from([(REDIRECT_TO_END_CONNECTION.to_string(), json!(true))]),
                )
                .await?;
                Ok(TurnOutcome::new(templates::end_offer(), "affirmative"))
            }
            BillAction::Stay => {
                let reply = match state {
                    BillState::SelectingAccount => {
                        templates::account_choice_prompt(&self.account_options(session))
                    }
                    _ => templates::end_offer(),
                };
                Ok(TurnOutcome::new(reply, "affirmative"))
            }
        }
    }

    async fn handle_negative(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<TurnOutcome, TurnError> {
        if session.context().flag(REDIRECT_TO_END_CONNECTION) {
            self.remove_keys(session, &[REDIRECT_TO_END_CONNECTION.to_string()])
                .await?;
            return Ok(TurnOutcome::new(
                templates::anything_else_prompt(),
                "negative",
            ));
        }

        let Some(service) = session.service() else {
            return Ok(self.generative_reply(session, text).await);
        };

        match service {
            ServiceKind::LicenseRenewal => {
                let Some(state) = self.license_state(session) else {
                    return Ok(self.generative_reply(session, text).await);
                };
                match state.on_negative() {
                    LicenseAction::CancelSession => {
                        self.end_session(session, SessionStatus::Cancelled, "negative")
                            .await
                    }
                    _ => {
                        let reply = if state == LicenseState::AskingDuration {
                            templates::invalid_duration_notice()
                        } else {
                            return Ok(self.generative_reply(session, text).await);
                        };
                        Ok(TurnOutcome::new(reply, "negative"))
                    }
                }
            }
            ServiceKind::BillPayment => {
                let Some(state) = self.bill_state(session) else {
                    return Ok(self.generative_reply(session, text).await);
                };
                match state.on_negative() {
                    BillAction::OfferEnd => {
                        self.merge(
                            session,
                            BTreeMap::from([(
                                REDIRECT_TO_END_CONNECTION.to_string(),
                                json!(true),
                            )]),
                        )
                        .await?;
                        Ok(TurnOutcome::new(templates::end_offer(), "negative"))
                    }
                    _ => {
                        let reply = match state {
                            BillState::SelectingAccount => {
                                templates::account_choice_prompt(&self.account_options(session))
                            }
                            _ => return Ok(self.generative_reply(session, text).await),
                        };
                        Ok(TurnOutcome::new(reply, "negative"))
                    }
                }
            }
        }
    }

    async fn select_service(
        &self,
        session: &mut Session,
        service: ServiceKind,
    ) -> Result<TurnOutcome, TurnError> {
        self.bind_service(session, service).await?;

        let reply = if session.context().workflow_state(service).is_some() {
            // Already mid-workflow; nothing to restart.
            templates::documents_needed_prompt(service)
        } else if self.ready(session, service) {
            self.enter_workflow(session, service).await?
        } else {
            templates::documents_needed_prompt(service)
        };
        Ok(TurnOutcome::new(reply, "service_selection"))
    }

    async fn select_duration(
        &self,
        session: &mut Session,
        years: u8,
    ) -> Result<TurnOutcome, TurnError> {
        let fee = renewal_fee(years, self.settings.fee_per_year);
        let service = ServiceKind::LicenseRenewal;
        self.merge(
            session,
            BTreeMap::from([
                (service.param_key("duration_years"), json!(years)),
                (service.param_key("renew_fee"), json!(fee)),
            ]),
        )
        .await?;
        self.set_workflow_state(
            session,
            service,
            LicenseState::ConfirmingPaymentDetails.as_str(),
        )
        .await?;
        Ok(TurnOutcome::new(
            templates::payment_details(years, fee),
            "duration_selection",
        ))
    }

    async fn select_account(
        &self,
        session: &mut Session,
        account: String,
    ) -> Result<TurnOutcome, TurnError> {
        let service = ServiceKind::BillPayment;
        let amount = self
            .bill_amount_for(session, &account)
            .unwrap_or_else(|| "0.00".to_string());
        self.merge(
            session,
            BTreeMap::from([
                (service.param_key("selected_account"), json!(account.clone())),
                (service.param_key("amount"), json!(amount.clone())),
            ]),
        )
        .await?;
        self.remove_keys(session, &[service.param_key("account_options")])
            .await?;
        self.set_workflow_state(session, service, BillState::BillsShown.as_str())
            .await?;
        Ok(TurnOutcome::new(
            templates::bills_summary(&account, &amount),
            "account_selection",
        ))
    }

    // ── Workflow entry ─────────────────────────────────────────────

    /// Starts the bound service's workflow once readiness is reached.
    ///
    /// Clears the visible transcript exactly once per service so the
    /// workflow opens on a clean screen.
    async fn enter_workflow(
        &self,
        session: &mut Session,
        service: ServiceKind,
    ) -> Result<String, TurnError> {
        let cleared_key = service.messages_cleared_key();
        if !session.context().flag(&cleared_key) {
            self.store
                .clear_messages(session.subject_id(), session.id())
                .await?;
            session.clear_messages();
            self.merge(session, BTreeMap::from([(cleared_key, json!(true))]))
                .await?;
        }

        match service {
            ServiceKind::LicenseRenewal => {
                let doc = self
                    .service_document(session, service)
                    .ok_or_else(|| DomainError::no_document_pending())?;
                let reply = templates::license_offer(&doc);
                self.set_workflow_state(session, service, LicenseState::LicenseShown.as_str())
                    .await?;
                Ok(reply)
            }
            ServiceKind::BillPayment => self.enter_bill_workflow(session).await,
        }
    }

    async fn enter_bill_workflow(&self, session: &mut Session) -> Result<String, TurnError> {
        let service = ServiceKind::BillPayment;
        let bills = self.outstanding_bills(session);

        match bills.len() {
            0 => {
                self.merge(
                    session,
                    BTreeMap::from([(REDIRECT_TO_END_CONNECTION.to_string(), json!(true))]),
                )
                .await?;
                Ok(templates::no_outstanding_bills())
            }
            1 => {
                let (account, amount) = bills.into_iter().next().unwrap_or_default();
                self.merge(
                    session,
                    BTreeMap::from([
                        (service.param_key("selected_account"), json!(account.clone())),
                        (service.param_key("amount"), json!(amount.clone())),
                    ]),
                )
                .await?;
                self.set_workflow_state(session, service, BillState::BillsShown.as_str())
                    .await?;
                Ok(templates::bills_summary(&account, &amount))
            }
            _ => {
                let accounts: Vec<String> =
                    bills.into_iter().map(|(account, _)| account).collect();
                self.merge(
                    session,
                    BTreeMap::from([(service.param_key("account_options"), json!(accounts))]),
                )
                .await?;
                self.set_workflow_state(session, service, BillState::SelectingAccount.as_str())
                    .await?;
                Ok(templates::account_choice_prompt(
                    &self.account_options(session),
                ))
            }
        }
    }

    // ── Generative passthrough ─────────────────────────────────────

    async fn generative_reply(&self, session: &Session, text: &str) -> TurnOutcome {
        let pending = session.context().pending_document();
        let prompt = build_prompt(
            pending.as_ref().map(|(_, doc)| doc),
            session.messages(),
            text,
        );

        let mut request = CompletionRequest::new(prompt);
        request.max_tokens = self.settings.reply_max_tokens;
        request.temperature = self.settings.reply_temperature;
        request.top_p = self.settings.reply_top_p;

        match self.completion.complete(request).await {
            Ok(raw) => TurnOutcome::new(normalize_reply(&raw), "none"),
            Err(err) => {
                warn!(session_id = %session.id(), error = %err, "completion failed");
                let mut outcome = TurnOutcome::new(templates::apology_fallback(), "none");
                outcome.model_error = Some(err.to_string());
                outcome
            }
        }
    }

    // ── Snapshot helpers ───────────────────────────────────────────

    fn license_state(&self, session: &Session) -> Option<LicenseState> {
        session
            .context()
            .workflow_state(ServiceKind::LicenseRenewal)
            .and_then(LicenseState::parse)
    }

    fn bill_state(&self, session: &Session) -> Option<BillState> {
        session
            .context()
            .workflow_state(ServiceKind::BillPayment)
            .and_then(BillState::parse)
    }

    fn ready(&self, session: &Session, service: ServiceKind) -> bool {
        let docs = session.context().verified_documents();
        service_ready(service, docs.iter())
    }

    /// First verified document satisfying the service's requirements.
    fn service_document(&self, session: &Session, service: ServiceKind) -> Option<DocumentContext> {
        session
            .context()
            .verified_documents()
            .into_iter()
            .find(|doc| {
                doc.is_verified == VerificationState::Verified
                    && crate::domain::workflow::allowed_categories(service)
                        .contains(&doc.category())
            })
    }

    /// Verified utility bills with a positive outstanding amount.
    fn outstanding_bills(&self, session: &Session) -> Vec<(String, String)> {
        session
            .context()
            .verified_documents()
            .into_iter()
            .filter(|doc| doc.category() == DocumentCategory::UtilityBill)
            .filter_map(|doc| {
                let account = doc.extracted_data.get("account_number")?.clone();
                let amount = doc.extracted_data.get("amount")?.clone();
                let outstanding = amount
                    .trim_start_matches("RM")
                    .trim()
                    .replace(',', "")
                    .parse::<f64>()
                    .unwrap_or(0.0);
                (outstanding > 0.0).then_some((account, amount))
            })
            .collect()
    }

    fn bill_amount_for(&self, session: &Session, account: &str) -> Option<String> {
        self.outstanding_bills(session)
            .into_iter()
            .find(|(acc, _)| acc == account)
            .map(|(_, amount)| amount)
    }

    fn account_options(&self, session: &Session) -> Vec<String> {
        session
            .context()
            .service_param(ServiceKind::BillPayment, "account_options")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn license_payment_params(&self, session: &Session) -> (u8, f64) {
        let service = ServiceKind::LicenseRenewal;
        let years = session
            .context()
            .service_param(service, "duration_years")
            .and_then(Value::as_u64)
            .unwrap_or(1) as u8;
        let fee = session
            .context()
            .service_param(service, "renew_fee")
            .and_then(Value::as_f64)
            .unwrap_or_else(|| renewal_fee(years, self.settings.fee_per_year));
        (years, fee)
    }

    fn selected_bill(&self, session: &Session) -> (String, String) {
        let service = ServiceKind::BillPayment;
        let account = session
            .context()
            .service_param(service, "selected_account")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let amount = session
            .context()
            .service_param(service, "amount")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        (account, amount)
    }

    // ── Persistence helpers (snapshot + store stay in step) ────────

    async fn merge(
        &self,
        session: &mut Session,
        patch: BTreeMap<String, Value>,
    ) -> Result<(), TurnError> {
        for (key, value) in &patch {
            session.context_mut().set(key.clone(), value.clone());
        }
        self.store
            .merge_context(session.subject_id(), session.id(), patch)
            .await?;
        Ok(())
    }

    async fn remove_keys(&self, session: &mut Session, keys: &[String]) -> Result<(), TurnError> {
        for key in keys {
            session.context_mut().remove(key);
        }
        self.store
            .remove_context_keys(session.subject_id(), session.id(), keys)
            .await?;
        Ok(())
    }

    async fn put_document(
        &self,
        session: &mut Session,
        key: &str,
        doc: &DocumentContext,
    ) -> Result<(), TurnError> {
        let value = serde_json::to_value(doc).unwrap_or(Value::Null);
        self.merge(session, BTreeMap::from([(key.to_string(), value)]))
            .await
    }

    async fn set_workflow_state(
        &self,
        session: &mut Session,
        service: ServiceKind,
        state: &str,
    ) -> Result<(), TurnError> {
        self.merge(
            session,
            BTreeMap::from([(service.workflow_state_key(), json!(state))]),
        )
        .await
    }

    async fn bind_service(
        &self,
        session: &mut Session,
        service: ServiceKind,
    ) -> Result<(), TurnError> {
        if session.service() == Some(service) {
            return Ok(());
        }
        session.set_service(Some(service));
        self.store
            .set_service(session.subject_id(), session.id(), Some(service))
            .await?;
        Ok(())
    }
}

fn respond(
    session_id: SessionId,
    assistant: TurnMessage,
    intent_tag: Option<String>,
    attachment: Option<Vec<Attachment>>,
) -> TurnResponse {
    TurnResponse::ok(TurnData {
        message_id: assistant.id.to_string(),
        message: assistant.content,
        created_at: *assistant.timestamp.as_datetime(),
        session_id: session_id.as_str().to_string(),
        attachment,
        intent_type: intent_tag,
        model_error: assistant.model_error,
    })
}
