//! End-to-end conversation flows against in-process adapters.

use std::sync::Arc;

use govassist::adapters::ai::MockCompletionProvider;
use govassist::adapters::extraction::MockDocumentExtractor;
use govassist::adapters::memory::InMemorySessionStore;
use govassist::application::{ConversationOrchestrator, EngineSettings, TurnRequest, TurnResponse};
use govassist::domain::foundation::{SessionStatus, SubjectId};
use govassist::domain::session::Session;
use govassist::ports::{Attachment, SessionStore};

const SUBJECT: &str = "900101-14-5678";

struct Harness {
    store: Arc<InMemorySessionStore>,
    orchestrator: ConversationOrchestrator,
}

fn harness(extractor: MockDocumentExtractor) -> Harness {
    let store = Arc::new(InMemorySessionStore::new());
    let orchestrator = ConversationOrchestrator::new(
        store.clone(),
        Arc::new(extractor),
        Arc::new(MockCompletionProvider::new()),
        EngineSettings::default(),
    );
    Harness {
        store,
        orchestrator,
    }
}

fn license_extractor() -> MockDocumentExtractor {
    MockDocumentExtractor::new().with_document(
        "license.jpg",
        "driving_license",
        &[
            ("name", "Ahmad Bin Ali"),
            ("ic_number", "900101-14-5678"),
            ("license_number", "D1234567"),
        ],
    )
}

fn bill_extractor() -> MockDocumentExtractor {
    MockDocumentExtractor::new().with_document(
        "bill.pdf",
        "utility_bill",
        &[("account_number", "2201234567"), ("amount", "150.50")],
    )
}

fn message_turn(session_id: &str, message: &str) -> TurnRequest {
    TurnRequest {
        subject_id: SUBJECT.to_string(),
        message: Some(message.to_string()),
        session_id: session_id.to_string(),
        created_at: None,
        attachment: None,
        ekyc: None,
    }
}

fn upload_turn(session_id: &str, name: &str) -> TurnRequest {
    TurnRequest {
        subject_id: SUBJECT.to_string(),
        message: None,
        session_id: session_id.to_string(),
        created_at: None,
        attachment: Some(vec![Attachment {
            url: format!("https://files.example/{name}"),
            name: name.to_string(),
            content_type: "application/octet-stream".to_string(),
        }]),
        ekyc: None,
    }
}

async fn send(h: &Harness, request: TurnRequest) -> TurnResponse {
    h.orchestrator.handle_turn(request).await.expect("turn ok")
}

fn subject() -> SubjectId {
    SubjectId::new(SUBJECT).unwrap()
}

#[tokio::test]
async fn new_session_sentinel_returns_a_real_session_id() {
    let h = harness(MockDocumentExtractor::new());
    let response = send(&h, message_turn("new_session", "hello")).await;

    assert_ne!(response.data.session_id, "new_session");
    assert_ne!(response.data.session_id, "session_end");
    assert_eq!(response.status.code, 200);
}

#[tokio::test]
async fn opening_a_second_session_archives_the_first() {
    let h = harness(MockDocumentExtractor::new());
    let first = send(&h, message_turn("new_session", "hello")).await;
    let _second = send(&h, message_turn("new_session", "hello again")).await;

    let first_session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(first.data.session_id.clone()),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first_session.status(), SessionStatus::Archived);
}

#[tokio::test]
async fn stale_session_ids_ask_for_a_restart() {
    let h = harness(MockDocumentExtractor::new());
    let response = send(&h, message_turn("definitely-not-a-session", "hello")).await;

    assert_eq!(response.data.session_id, "session_end");
    assert!(response.data.message.contains("no longer available"));
}

#[tokio::test]
async fn license_renewal_happy_path() {
    let h = harness(license_extractor());

    // Upload the license; the engine must ask for confirmation, never
    // auto-verify.
    let r1 = send(&h, upload_turn("new_session", "license.jpg")).await;
    let sid = r1.data.session_id.clone();
    assert!(r1.data.message.contains("license.jpg"));
    assert!(r1.data.message.contains("Ahmad Bin Ali"));
    assert!(r1.data.message.to_lowercase().contains("correct"));

    // Explicit yes verifies, binds license renewal, and shows the offer.
    let r2 = send(&h, message_turn(&sid, "yes")).await;
    assert!(r2.data.message.contains("renew this license"));

    // Accepting the offer moves straight to the duration question.
    let r3 = send(&h, message_turn(&sid, "yes")).await;
    assert!(r3.data.message.contains("How many years"));

    // Number words parse; fee is duration times the per-year rate.
    let r4 = send(&h, message_turn(&sid, "three years")).await;
    assert!(r4.data.message.contains("RM90.00"));
    assert_eq!(r4.data.intent_type.as_deref(), Some("duration_selection"));

    // Confirming payment is terminal for the workflow.
    let r5 = send(&h, message_turn(&sid, "yes")).await;
    assert!(r5.data.message.contains("RM90.00"));
    assert!(r5.data.message.contains("3 year(s)"));

    // Accepting the end offer completes the session.
    let r6 = send(&h, message_turn(&sid, "yes")).await;
    assert_eq!(r6.data.session_id, "session_end");

    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(
        session
            .context()
            .workflow_state(govassist::domain::workflow::ServiceKind::LicenseRenewal),
        Some("license_payment_confirmed")
    );
}

#[tokio::test]
async fn license_workflow_persists_duration_and_fee_params() {
    let h = harness(license_extractor());
    let r1 = send(&h, upload_turn("new_session", "license.jpg")).await;
    let sid = r1.data.session_id.clone();
    send(&h, message_turn(&sid, "yes")).await;
    send(&h, message_turn(&sid, "yes")).await;
    send(&h, message_turn(&sid, "5")).await;

    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    let service = govassist::domain::workflow::ServiceKind::LicenseRenewal;
    assert_eq!(
        session
            .context()
            .service_param(service, "duration_years")
            .and_then(|v| v.as_u64()),
        Some(5)
    );
    assert_eq!(
        session
            .context()
            .service_param(service, "renew_fee")
            .and_then(|v| v.as_f64()),
        Some(150.0)
    );
    assert_eq!(
        session.context().workflow_state(service),
        Some("confirming_license_payment_details")
    );
}

#[tokio::test]
async fn invalid_durations_are_reprompted() {
    let h = harness(license_extractor());
    let r1 = send(&h, upload_turn("new_session", "license.jpg")).await;
    let sid = r1.data.session_id.clone();
    send(&h, message_turn(&sid, "yes")).await;
    send(&h, message_turn(&sid, "yes")).await;

    for out_of_range in ["0", "11", "fifty years please thanks"] {
        let response = send(&h, message_turn(&sid, out_of_range)).await;
        assert!(
            response.data.message.contains("between 1 and 10"),
            "input {out_of_range:?} should be rejected, got {:?}",
            response.data.message
        );
    }

    // The workflow did not advance.
    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        session
            .context()
            .workflow_state(govassist::domain::workflow::ServiceKind::LicenseRenewal),
        Some("asking_duration")
    );
}

#[tokio::test]
async fn declining_the_license_offer_cancels_the_session() {
    let h = harness(license_extractor());
    let r1 = send(&h, upload_turn("new_session", "license.jpg")).await;
    let sid = r1.data.session_id.clone();
    send(&h, message_turn(&sid, "yes")).await;

    let response = send(&h, message_turn(&sid, "no")).await;
    assert_eq!(response.data.session_id, "session_end");

    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status(), SessionStatus::Cancelled);
}

#[tokio::test]
async fn wrong_category_upload_mid_service_is_rejected_without_state_change() {
    let extractor = license_extractor().with_document(
        "bill.pdf",
        "utility_bill",
        &[("account_number", "2201234567"), ("amount", "150.50")],
    );
    let h = harness(extractor);

    let r1 = send(&h, upload_turn("new_session", "license.jpg")).await;
    let sid = r1.data.session_id.clone();
    send(&h, message_turn(&sid, "yes")).await;

    // A TNB bill makes no sense mid license renewal.
    let r3 = send(&h, upload_turn(&sid, "bill.pdf")).await;
    assert!(r3.data.message.contains("doesn't look right"));
    assert!(r3.data.message.contains("identity card or driving license"));

    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    // Neither the workflow nor the document set moved.
    assert_eq!(
        session
            .context()
            .workflow_state(govassist::domain::workflow::ServiceKind::LicenseRenewal),
        Some("license_shown")
    );
    assert_eq!(session.context().documents().len(), 1);
}

#[tokio::test]
async fn identity_card_alone_asks_which_service_then_honors_the_choice() {
    let extractor = MockDocumentExtractor::new().with_document(
        "ic.jpg",
        "identity_card",
        &[("name", "Ahmad Bin Ali"), ("ic_number", SUBJECT)],
    );
    let h = harness(extractor);

    let r1 = send(&h, upload_turn("new_session", "ic.jpg")).await;
    let sid = r1.data.session_id.clone();
    assert!(r1.data.message.contains("ic.jpg"));

    // An identity card fits both services, so confirming it cannot bind
    // one; the engine asks instead.
    let r2 = send(&h, message_turn(&sid, "yes")).await;
    assert!(r2.data.message.contains("What would you like to do today"));

    // The card already satisfies license renewal's readiness, so the
    // choice goes straight to the offer.
    let r3 = send(&h, message_turn(&sid, "renew my license")).await;
    assert_eq!(r3.data.intent_type.as_deref(), Some("service_selection"));
    assert!(r3.data.message.contains("renew this license"));

    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        session
            .context()
            .workflow_state(govassist::domain::workflow::ServiceKind::LicenseRenewal),
        Some("license_shown")
    );
}

#[tokio::test]
async fn termination_mid_verification_cancels_immediately() {
    let h = harness(license_extractor());
    let r1 = send(&h, upload_turn("new_session", "license.jpg")).await;
    let sid = r1.data.session_id.clone();

    let response = send(&h, message_turn(&sid, "exit")).await;
    assert_eq!(response.data.session_id, "session_end");
    assert_eq!(
        response.data.intent_type.as_deref(),
        Some("session_termination")
    );

    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status(), SessionStatus::Cancelled);
    // The rejected turn is still on the transcript.
    assert!(session
        .messages()
        .iter()
        .any(|m| m.content.contains("exit")));
}

#[tokio::test]
async fn identity_mismatch_is_not_persisted_and_is_masked() {
    let extractor = MockDocumentExtractor::new().with_document(
        "other_ic.jpg",
        "identity_card",
        &[("name", "Lee Mei Ling"), ("ic_number", "990303-14-1111")],
    );
    let h = harness(extractor);

    let response = send(&h, upload_turn("new_session", "other_ic.jpg")).await;
    let sid = response.data.session_id.clone();
    assert!(response.data.message.contains("doesn't match"));
    // Only the last four characters stay visible.
    assert!(response.data.message.contains("1111"));
    assert!(!response.data.message.contains("990303"));

    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    assert!(session.context().documents().is_empty());
}

#[tokio::test]
async fn blurry_uploads_ask_for_a_retake() {
    let h = harness(MockDocumentExtractor::new().with_blurry("blurry.jpg"));
    let response = send(&h, upload_turn("new_session", "blurry.jpg")).await;

    assert!(response.data.message.contains("blurry"));
}

#[tokio::test]
async fn corrections_are_staged_then_applied_on_confirm() {
    let h = harness(license_extractor());
    let r1 = send(&h, upload_turn("new_session", "license.jpg")).await;
    let sid = r1.data.session_id.clone();

    let r2 = send(&h, message_turn(&sid, "name: Siti Binti Omar")).await;
    assert_eq!(r2.data.intent_type.as_deref(), Some("correction_provided"));
    assert!(r2.data.message.contains("Siti Binti Omar"));

    // Still pending until the explicit confirm.
    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid.clone()),
        )
        .await
        .unwrap()
        .unwrap();
    assert!(session.context().pending_document().is_some());

    send(&h, message_turn(&sid, "yes")).await;

    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    let docs = session.context().verified_documents();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].extracted_data["name"], "Siti Binti Omar");
    assert!(docs[0].corrected_data.is_none());
}

#[tokio::test]
async fn rejection_without_details_asks_which_field() {
    let h = harness(license_extractor());
    let r1 = send(&h, upload_turn("new_session", "license.jpg")).await;
    let sid = r1.data.session_id.clone();

    let response = send(&h, message_turn(&sid, "that's wrong")).await;
    assert_eq!(
        response.data.intent_type.as_deref(),
        Some("document_rejection")
    );
    assert!(response.data.message.contains("Which field"));
}

#[tokio::test]
async fn bill_payment_happy_path() {
    let h = harness(bill_extractor());
    let r1 = send(&h, upload_turn("new_session", "bill.pdf")).await;
    let sid = r1.data.session_id.clone();

    // Confirming the bill binds bill payment and shows the outstanding
    // amount straight away (single account).
    let r2 = send(&h, message_turn(&sid, "yes")).await;
    assert!(r2.data.message.contains("2201234567"));
    assert!(r2.data.message.contains("150.50"));

    let r3 = send(&h, message_turn(&sid, "yes")).await;
    assert!(r3.data.message.contains("confirmed"));

    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        session
            .context()
            .workflow_state(govassist::domain::workflow::ServiceKind::BillPayment),
        Some("tnb_bills_confirmed")
    );
}

#[tokio::test]
async fn declining_the_bill_offers_to_end() {
    let h = harness(bill_extractor());
    let r1 = send(&h, upload_turn("new_session", "bill.pdf")).await;
    let sid = r1.data.session_id.clone();
    send(&h, message_turn(&sid, "yes")).await;

    let r2 = send(&h, message_turn(&sid, "no")).await;
    assert!(r2.data.message.contains("end the session"));

    // Declining the end offer keeps the session open.
    let r3 = send(&h, message_turn(&sid, "no")).await;
    assert!(r3.data.message.contains("what else"));
    assert_ne!(r3.data.session_id, "session_end");
}

#[tokio::test]
async fn multiple_bills_offer_an_account_choice_selectable_by_ordinal() {
    let extractor = MockDocumentExtractor::new()
        .with_document(
            "bill1.pdf",
            "utility_bill",
            &[("account_number", "2201234567"), ("amount", "150.50")],
        )
        .with_document(
            "bill2.pdf",
            "utility_bill",
            &[("account_number", "2209876543"), ("amount", "88.20")],
        );
    let h = harness(extractor);

    let r1 = send(&h, upload_turn("new_session", "bill1.pdf")).await;
    let sid = r1.data.session_id.clone();
    send(&h, upload_turn(&sid, "bill2.pdf")).await;

    // Oldest pending first: this confirms bill1, binds bill payment,
    // and shows its amount (only one bill verified so far).
    let r2 = send(&h, message_turn(&sid, "yes")).await;
    assert!(r2.data.message.contains("150.50"));

    // Confirming bill2 re-presents the selection with both accounts.
    let r3 = send(&h, message_turn(&sid, "yes")).await;
    assert!(r3.data.message.contains("2201234567"));
    assert!(r3.data.message.contains("2209876543"));

    // Ordinal selection resolves against the presented options.
    let r4 = send(&h, message_turn(&sid, "the second one")).await;
    assert_eq!(r4.data.intent_type.as_deref(), Some("account_selection"));
    assert!(r4.data.message.contains("2209876543"));
    assert!(r4.data.message.contains("88.20"));

    let r5 = send(&h, message_turn(&sid, "yes")).await;
    assert!(r5.data.message.contains("88.20"));
    assert!(r5.data.message.contains("confirmed"));

    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.context().verified_documents().len(), 2);
}

#[tokio::test]
async fn timeout_prompts_a_choice_and_continue_resumes() {
    let h = harness(MockDocumentExtractor::new());

    // Seed a session whose last activity is past the window.
    let mut session = Session::new(subject());
    let mut stale = govassist::domain::session::TurnMessage::assistant("Where were we...");
    stale.timestamp = govassist::domain::foundation::Timestamp::now().add_minutes(-45);
    session.push_message(stale);
    h.store.insert(&session).await.unwrap();
    let sid = session.id().as_str().to_string();

    let r1 = send(&h, message_turn(&sid, "hello again")).await;
    assert!(r1.data.message.contains("continue"));

    let r2 = send(&h, message_turn(&sid, "continue")).await;
    assert!(r2.data.message.contains("Where were we"));

    let reloaded = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    assert!(!reloaded
        .context()
        .flag(govassist::domain::session::TIMEOUT_AWAITING_CHOICE));
}

#[tokio::test]
async fn timeout_choice_new_archives_the_session() {
    let h = harness(MockDocumentExtractor::new());

    let mut session = Session::new(subject());
    let mut stale = govassist::domain::session::TurnMessage::assistant("Old prompt");
    stale.timestamp = govassist::domain::foundation::Timestamp::now().add_minutes(-45);
    session.push_message(stale);
    h.store.insert(&session).await.unwrap();
    let sid = session.id().as_str().to_string();

    send(&h, message_turn(&sid, "hello")).await;
    let r2 = send(&h, message_turn(&sid, "new")).await;
    assert_eq!(r2.data.session_id, "session_end");

    let reloaded = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status(), SessionStatus::Archived);
}

#[tokio::test]
async fn transcription_failures_reserve_the_last_prompt() {
    let h = harness(license_extractor());
    let r1 = send(&h, upload_turn("new_session", "license.jpg")).await;
    let sid = r1.data.session_id.clone();

    let response = send(&h, message_turn(&sid, "[inaudible]")).await;
    assert_eq!(
        response.data.intent_type.as_deref(),
        Some("transcription_failure")
    );
    assert!(response.data.message.contains("repeat"));
    // The previous verification prompt is re-served.
    assert!(response.data.message.contains("license.jpg"));
}

#[tokio::test]
async fn completion_failure_degrades_to_an_apology() {
    let store = Arc::new(InMemorySessionStore::new());
    // Every completion call fails: fallback classification degrades to
    // keyword results and the generative reply becomes an apology.
    let provider = MockCompletionProvider::new()
        .with_failure("gateway down")
        .with_failure("gateway down")
        .with_failure("gateway down");
    let orchestrator = ConversationOrchestrator::new(
        store.clone(),
        Arc::new(MockDocumentExtractor::new()),
        Arc::new(provider),
        EngineSettings::default(),
    );
    let h = Harness {
        store,
        orchestrator,
    };

    let response = send(
        &h,
        message_turn("new_session", "tell me about something else entirely today"),
    )
    .await;
    assert!(response.data.message.contains("trouble responding"));
    assert!(response.data.model_error.is_some());
}

#[tokio::test]
async fn both_message_and_attachment_is_a_client_error() {
    let h = harness(MockDocumentExtractor::new());
    let mut request = message_turn("new_session", "hello");
    request.attachment = Some(vec![Attachment {
        url: "https://files.example/x.jpg".to_string(),
        name: "x.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
    }]);

    let error = h.orchestrator.handle_turn(request).await.unwrap_err();
    assert!(error.to_string().contains("not both"));
}

#[tokio::test]
async fn affirmative_confirm_is_idempotent() {
    let h = harness(license_extractor());
    let r1 = send(&h, upload_turn("new_session", "license.jpg")).await;
    let sid = r1.data.session_id.clone();
    send(&h, message_turn(&sid, "yes")).await;
    // A second yes lands on the workflow state machine, not the (now
    // absent) pending document.
    let r3 = send(&h, message_turn(&sid, "yes")).await;
    assert!(r3.data.message.contains("How many years"));

    let session = h
        .store
        .find(
            &subject(),
            &govassist::domain::foundation::SessionId::from_token(sid),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.context().verified_documents().len(), 1);
}
