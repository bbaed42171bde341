//! End-to-end tests for the application lifecycle against the in-memory store.

use std::sync::Arc;

use admit_lifecycle::{ApplicationService, LifecycleError};
use admit_model::{
    Actor, Application, ApplicationId, ApplicationStatus, CoreConfig, ErrorKind, FixedClock,
    ProgramId,
};
use admit_store::{
    Filter, MemoryGateway, MemoryObjectStore, Operation, PersistenceGateway, Table, fetch_one,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};

struct Fixture {
    gateway: Arc<MemoryGateway>,
    objects: Arc<MemoryObjectStore>,
    service: ApplicationService,
    now: DateTime<Utc>,
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap()
}

async fn fixture() -> Fixture {
    let gateway = Arc::new(MemoryGateway::new());
    let objects = Arc::new(MemoryObjectStore::default());

    insert(&gateway, Table::Programs, json!({ "id": "prog-a", "university_id": "uni-1", "name": "Architecture" })).await;
    insert(&gateway, Table::Programs, json!({ "id": "prog-b", "university_id": "uni-2", "name": "Biology" })).await;
    insert(&gateway, Table::Programs, json!({ "id": "prog-c", "university_id": "uni-3", "name": "Chemistry" })).await;

    let service = ApplicationService::new(
        gateway.clone(),
        objects.clone(),
        CoreConfig::default(),
    )
    .with_clock(Arc::new(FixedClock::new(now())));

    Fixture {
        gateway,
        objects,
        service,
        now: now(),
    }
}

async fn insert(gateway: &MemoryGateway, table: Table, row: Value) {
    gateway
        .insert_row(table, row.as_object().cloned().expect("object row"))
        .await
        .expect("insert");
}

async fn seed_application(gateway: &MemoryGateway, id: &str, student: &str, program: &str, status: &str) {
    insert(
        gateway,
        Table::Applications,
        json!({
            "id": id,
            "student_id": student,
            "program_id": program,
            "status": status,
            "submitted_at": null,
            "application_data": { "shared_document_ids": ["doc-1"], "essay": "kept" },
            "missing_fields": []
        }),
    )
    .await;
}

async fn seed_offer_letter(gateway: &MemoryGateway, application: &str) {
    insert(
        gateway,
        Table::OfferLetters,
        json!({
            "id": format!("offer-{application}"),
            "application_id": application,
            "file_name": "offer.pdf",
            "file_url": "https://storage.local/object/public/offer-letters/offer.pdf"
        }),
    )
    .await;
}

async fn load(gateway: &MemoryGateway, id: &str) -> Option<Application> {
    fetch_one(gateway, Table::Applications, &Filter::by_id(id))
        .await
        .expect("read application")
}

#[tokio::test]
async fn accept_without_offer_letter_is_a_validation_failure() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "submitted").await;

    let err = fx
        .service
        .update_application_status(
            &Actor::official("uni-1"),
            &ApplicationId::new("app-a"),
            ApplicationStatus::Accepted,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::MissingOfferLetter { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let stored = load(&fx.gateway, "app-a").await.unwrap();
    assert_eq!(stored.status, ApplicationStatus::Submitted);
    assert!(stored.application_data.payment_due_date().is_none());
}

#[tokio::test]
async fn accept_opens_ten_day_payment_window() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "under_review").await;
    seed_offer_letter(&fx.gateway, "app-a").await;

    let update = fx
        .service
        .update_application_status(
            &Actor::official("uni-1"),
            &ApplicationId::new("app-a"),
            ApplicationStatus::Accepted,
        )
        .await
        .expect("accept");
    assert_eq!(update.cleanup.expect("cleanup").settled().await, None);

    let stored = load(&fx.gateway, "app-a").await.unwrap();
    assert_eq!(stored.status, ApplicationStatus::Accepted);
    assert_eq!(
        stored.application_data.payment_due_date(),
        Some(fx.now + Duration::days(10))
    );
    assert_eq!(stored.application_data.payment_status(), Some("pending_payment"));
    assert_eq!(stored.application_data.get("essay"), Some(&json!("kept")));
}

#[tokio::test]
async fn accept_keeps_existing_payment_status() {
    let fx = fixture().await;
    insert(
        &fx.gateway,
        Table::Applications,
        json!({
            "id": "app-a",
            "student_id": "stu-1",
            "program_id": "prog-a",
            "status": "submitted",
            "application_data": { "payment_status": "paid" }
        }),
    )
    .await;
    seed_offer_letter(&fx.gateway, "app-a").await;

    let update = fx
        .service
        .update_application_status(
            &Actor::Administrator,
            &ApplicationId::new("app-a"),
            ApplicationStatus::Accepted,
        )
        .await
        .unwrap();

    assert_eq!(update.application.application_data.payment_status(), Some("paid"));
    let stored = load(&fx.gateway, "app-a").await.unwrap();
    assert_eq!(stored.application_data.payment_status(), Some("paid"));
}

#[tokio::test]
async fn accept_withdraws_competing_applications() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "submitted").await;
    seed_application(&fx.gateway, "app-b", "stu-1", "prog-b", "under_review").await;
    seed_application(&fx.gateway, "app-c", "stu-1", "prog-c", "draft").await;
    seed_application(&fx.gateway, "app-x", "stu-2", "prog-b", "submitted").await;
    seed_offer_letter(&fx.gateway, "app-a").await;

    let update = fx
        .service
        .update_application_status(
            &Actor::official("uni-1"),
            &ApplicationId::new("app-a"),
            ApplicationStatus::Accepted,
        )
        .await
        .unwrap();
    assert_eq!(update.cleanup.unwrap().settled().await, None);

    assert_eq!(load(&fx.gateway, "app-a").await.unwrap().status, ApplicationStatus::Accepted);
    assert!(load(&fx.gateway, "app-b").await.is_none());
    assert!(load(&fx.gateway, "app-c").await.is_none());
    assert!(load(&fx.gateway, "app-x").await.is_some());
}

#[tokio::test]
async fn failed_cleanup_never_reverts_acceptance() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "submitted").await;
    seed_application(&fx.gateway, "app-b", "stu-1", "prog-b", "submitted").await;
    seed_application(&fx.gateway, "app-c", "stu-1", "prog-c", "submitted").await;
    seed_offer_letter(&fx.gateway, "app-a").await;
    fx.gateway
        .fail_on(Operation::Delete, Table::Applications, "connection reset");

    let update = fx
        .service
        .update_application_status(
            &Actor::official("uni-1"),
            &ApplicationId::new("app-a"),
            ApplicationStatus::Accepted,
        )
        .await
        .expect("acceptance itself succeeds");

    let warning = update.cleanup.unwrap().settled().await.expect("warning");
    assert_eq!(warning.message, "connection reset");
    assert_eq!(warning.kind(), ErrorKind::BestEffort);

    assert_eq!(load(&fx.gateway, "app-a").await.unwrap().status, ApplicationStatus::Accepted);
    assert!(load(&fx.gateway, "app-b").await.is_some());
    assert!(load(&fx.gateway, "app-c").await.is_some());
}

#[tokio::test]
async fn official_of_another_university_is_refused() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "submitted").await;
    seed_offer_letter(&fx.gateway, "app-a").await;

    let err = fx
        .service
        .update_application_status(
            &Actor::official("uni-2"),
            &ApplicationId::new("app-a"),
            ApplicationStatus::Rejected,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(load(&fx.gateway, "app-a").await.unwrap().status, ApplicationStatus::Submitted);
}

#[tokio::test]
async fn officials_decide_only_pending_applications() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "draft").await;

    let err = fx
        .service
        .update_application_status(
            &Actor::official("uni-1"),
            &ApplicationId::new("app-a"),
            ApplicationStatus::Rejected,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
}

#[tokio::test]
async fn reject_sets_status_without_cleanup() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "submitted").await;
    seed_application(&fx.gateway, "app-b", "stu-1", "prog-b", "submitted").await;

    let update = fx
        .service
        .update_application_status(
            &Actor::official("uni-1"),
            &ApplicationId::new("app-a"),
            ApplicationStatus::Rejected,
        )
        .await
        .unwrap();

    assert!(update.cleanup.is_none());
    assert_eq!(update.application.progress(), 100);
    assert_eq!(load(&fx.gateway, "app-a").await.unwrap().status, ApplicationStatus::Rejected);
    assert!(load(&fx.gateway, "app-b").await.is_some());
}

#[tokio::test]
async fn students_cannot_decide() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "submitted").await;
    seed_offer_letter(&fx.gateway, "app-a").await;

    let err = fx
        .service
        .update_application_status(
            &Actor::student("stu-1"),
            &ApplicationId::new("app-a"),
            ApplicationStatus::Accepted,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[tokio::test]
async fn administrator_can_override_status() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "draft").await;

    let update = fx
        .service
        .update_application_status(
            &Actor::Administrator,
            &ApplicationId::new("app-a"),
            ApplicationStatus::Submitted,
        )
        .await
        .unwrap();
    assert_eq!(update.application.submitted_at, Some(fx.now));

    fx.service
        .update_application_status(
            &Actor::Administrator,
            &ApplicationId::new("app-a"),
            ApplicationStatus::UnderReview,
        )
        .await
        .unwrap();
    assert_eq!(
        load(&fx.gateway, "app-a").await.unwrap().status,
        ApplicationStatus::UnderReview
    );

    let err = fx
        .service
        .update_application_status(
            &Actor::official("uni-1"),
            &ApplicationId::new("app-a"),
            ApplicationStatus::Draft,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[tokio::test]
async fn submit_stamps_submission_time() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "draft").await;

    let submitted = fx
        .service
        .submit_application(&Actor::student("stu-1"), &ApplicationId::new("app-a"))
        .await
        .unwrap();
    assert_eq!(submitted.status, ApplicationStatus::Submitted);
    assert_eq!(submitted.progress(), 75);

    let stored = load(&fx.gateway, "app-a").await.unwrap();
    assert_eq!(stored.status, ApplicationStatus::Submitted);
    assert_eq!(stored.submitted_at, Some(fx.now));

    let again = fx
        .service
        .submit_application(&Actor::student("stu-1"), &ApplicationId::new("app-a"))
        .await
        .unwrap_err();
    assert!(matches!(again, LifecycleError::InvalidTransition { .. }));
}

#[tokio::test]
async fn submit_requires_ownership() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "draft").await;

    let err = fx
        .service
        .submit_application(&Actor::student("stu-2"), &ApplicationId::new("app-a"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(load(&fx.gateway, "app-a").await.unwrap().status, ApplicationStatus::Draft);
}

#[tokio::test]
async fn backend_failures_pass_through_verbatim() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "draft").await;
    fx.gateway.fail_on(
        Operation::Write,
        Table::Applications,
        "new row violates row-level security policy",
    );

    let err = fx
        .service
        .submit_application(&Actor::student("stu-1"), &ApplicationId::new("app-a"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(err.user_message(), "new row violates row-level security policy");
    assert_eq!(load(&fx.gateway, "app-a").await.unwrap().status, ApplicationStatus::Draft);
}

#[tokio::test]
async fn withdraw_never_deletes_an_accepted_application() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "accepted").await;

    let err = fx
        .service
        .withdraw_application(&Actor::student("stu-1"), &ApplicationId::new("app-a"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidTransition {
            status: ApplicationStatus::Accepted,
            ..
        }
    ));
    assert!(load(&fx.gateway, "app-a").await.is_some());
}

#[tokio::test]
async fn withdraw_deletes_pending_application() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "under_review").await;

    fx.service
        .withdraw_application(&Actor::student("stu-1"), &ApplicationId::new("app-a"))
        .await
        .unwrap();
    assert!(load(&fx.gateway, "app-a").await.is_none());

    let err = fx
        .service
        .withdraw_application(&Actor::student("stu-1"), &ApplicationId::new("app-a"))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::ApplicationNotFound(_)));
}

#[tokio::test]
async fn create_and_edit_draft() {
    let fx = fixture().await;
    let student = Actor::student("stu-9");

    let draft = fx
        .service
        .create_application(&student, &ProgramId::new("prog-a"))
        .await
        .unwrap();
    assert_eq!(draft.status, ApplicationStatus::Draft);
    assert_eq!(draft.progress(), 30);

    let same = fx
        .service
        .create_application(&student, &ProgramId::new("prog-a"))
        .await
        .unwrap();
    assert_eq!(same.id, draft.id);

    let patch = json!({ "personal_statement": "Bridges.", "hobby": "chess" });
    let edited = fx
        .service
        .save_draft(&student, &draft.id, patch.as_object().cloned().unwrap())
        .await
        .unwrap();
    assert!(!edited.missing_fields.contains(&"personal_statement".to_string()));
    assert!(edited.missing_fields.contains(&"passport".to_string()));

    let stored = load(&fx.gateway, draft.id.as_str()).await.unwrap();
    assert_eq!(stored.application_data.get("hobby"), Some(&json!("chess")));
    assert_eq!(stored.missing_fields, edited.missing_fields);

    let err = fx
        .service
        .create_application(&Actor::Administrator, &ProgramId::new("prog-a"))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::StudentOnly { .. }));

    let err = fx
        .service
        .create_application(&student, &ProgramId::new("prog-missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::ProgramNotFound(_)));
}

#[tokio::test]
async fn uploaded_offer_letter_unlocks_acceptance() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "submitted").await;
    let official = Actor::official("uni-1");

    let letter = fx
        .service
        .upload_offer_letter(&official, &ApplicationId::new("app-a"), "Offer Letter.pdf", b"%PDF".to_vec())
        .await
        .unwrap();
    assert!(letter.file_url.starts_with("https://storage.local/object/public/offer-letters/app-a/"));
    assert!(letter.file_url.ends_with("Offer_Letter.pdf"));

    let path = letter
        .file_url
        .trim_start_matches("https://storage.local/object/public/offer-letters/");
    assert!(fx.objects.contains("offer-letters", path).await);

    let update = fx
        .service
        .update_application_status(&official, &ApplicationId::new("app-a"), ApplicationStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(update.application.status, ApplicationStatus::Accepted);
}

#[tokio::test]
async fn bank_accounts_are_revealed_on_acceptance() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "submitted").await;
    insert(
        &fx.gateway,
        Table::BankAccounts,
        json!({
            "id": "bank-1",
            "university_id": "uni-1",
            "bank_name": "Ziraat",
            "account_holder": "Uni One",
            "iban": "TR00 0000",
            "currency": "TRY"
        }),
    )
    .await;
    let student = Actor::student("stu-1");
    let app = ApplicationId::new("app-a");

    assert_eq!(fx.service.bank_accounts_for(&student, &app).await.unwrap(), None);
    assert_eq!(
        fx.service
            .bank_accounts_for(&Actor::official("uni-1"), &app)
            .await
            .unwrap()
            .map(|accounts| accounts.len()),
        Some(1)
    );

    seed_offer_letter(&fx.gateway, "app-a").await;
    fx.service
        .update_application_status(&Actor::Administrator, &app, ApplicationStatus::Accepted)
        .await
        .unwrap();

    let accounts = fx.service.bank_accounts_for(&student, &app).await.unwrap().unwrap();
    assert_eq!(accounts[0].bank_name, "Ziraat");

    assert!(
        fx.service
            .bank_accounts_for(&Actor::student("stu-2"), &app)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn draft_edits_cannot_set_core_fields() {
    let fx = fixture().await;
    let student = Actor::student("stu-9");
    let draft = fx
        .service
        .create_application(&student, &ProgramId::new("prog-a"))
        .await
        .unwrap();

    for patch in [
        json!({ "payment_status": "paid", "hobby": "chess" }),
        json!({ "shared_document_ids": ["doc-of-someone-else"] }),
        json!({ "payment_due_date": "2030-01-01T00:00:00Z" }),
    ] {
        let err = fx
            .service
            .save_draft(&student, &draft.id, patch.as_object().cloned().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::ReservedFields { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    let stored = load(&fx.gateway, draft.id.as_str()).await.unwrap();
    assert!(stored.application_data.as_map().is_empty());

    // Acceptance still seeds the pending payment status.
    fx.service
        .submit_application(&student, &draft.id)
        .await
        .unwrap();
    seed_offer_letter(&fx.gateway, draft.id.as_str()).await;
    let update = fx
        .service
        .update_application_status(&Actor::Administrator, &draft.id, ApplicationStatus::Accepted)
        .await
        .unwrap();
    update.cleanup.expect("cleanup").settled().await;
    let stored = load(&fx.gateway, draft.id.as_str()).await.unwrap();
    assert_eq!(stored.application_data.payment_status(), Some("pending_payment"));
}

#[tokio::test]
async fn unrepresentable_payment_window_leaves_application_untouched() {
    let fx = fixture().await;
    seed_application(&fx.gateway, "app-a", "stu-1", "prog-a", "submitted").await;
    seed_offer_letter(&fx.gateway, "app-a").await;
    let config = CoreConfig {
        payment_window_days: i64::MAX,
        ..CoreConfig::default()
    };
    let service = ApplicationService::new(fx.gateway.clone(), fx.objects.clone(), config)
        .with_clock(Arc::new(FixedClock::new(fx.now)));

    let err = service
        .update_application_status(
            &Actor::Administrator,
            &ApplicationId::new("app-a"),
            ApplicationStatus::Accepted,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidPaymentWindow { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let stored = load(&fx.gateway, "app-a").await.unwrap();
    assert_eq!(stored.status, ApplicationStatus::Submitted);
    assert_eq!(stored.application_data.payment_due_date(), None);
}
