//! Application lifecycle operations against the store.
//!
//! Each operation reads the application, authorizes the actor, checks the
//! transition and then writes. Steps within one operation are strictly
//! sequential; nothing is wrapped in a transaction, so a concurrent writer of
//! the same row can still win a lost-update race on `application_data`.

use std::sync::Arc;

use admit_model::{
    Actor, Application, ApplicationData, ApplicationId, ApplicationStatus, BankAccount, Clock,
    CoreConfig, OfferLetter, OfferLetterId, Program, ProgramId, SystemClock, UniversityId,
    format_timestamp,
};
use admit_store::{
    BackgroundEffect, Filter, ObjectStore, PersistenceGateway, Row, Table, fetch_all, fetch_one,
    insert_record, sanitize_object_name,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{LifecycleError, Result};
use crate::machine::{AccessTarget, Action, authorize, next_status};
use crate::payment::compute_payment_window;

/// Outcome of a status update.
#[derive(Debug)]
pub struct StatusUpdate {
    /// The application as written.
    pub application: Application,
    /// Withdrawal of the student's other applications, spawned after an
    /// acceptance. Drop it to let it run unobserved.
    pub cleanup: Option<BackgroundEffect>,
}

/// Drives the application state machine against the store.
pub struct ApplicationService {
    gateway: Arc<dyn PersistenceGateway>,
    objects: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    config: CoreConfig,
}

impl ApplicationService {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        objects: Arc<dyn ObjectStore>,
        config: CoreConfig,
    ) -> Self {
        Self {
            gateway,
            objects,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start a draft application for the acting student.
    ///
    /// Starting a program the student already applied to returns the
    /// existing application.
    pub async fn create_application(
        &self,
        actor: &Actor,
        program_id: &ProgramId,
    ) -> Result<Application> {
        let student_id = actor
            .student_id()
            .cloned()
            .ok_or(LifecycleError::StudentOnly {
                action: Action::Create,
            })?;
        self.load_program(program_id).await?;

        let existing: Option<Application> = fetch_one(
            self.gateway.as_ref(),
            Table::Applications,
            &Filter::new()
                .eq("student_id", student_id.as_str())
                .eq("program_id", program_id.as_str()),
        )
        .await?;
        if let Some(existing) = existing {
            debug!(application_id = %existing.id, "application already started");
            return Ok(existing);
        }

        let draft = Application::draft(student_id, program_id.clone(), self.clock.now());
        authorize(actor, Action::Create, AccessTarget::new(&draft, None))?;
        let stored = insert_record(self.gateway.as_ref(), Table::Applications, &draft).await?;
        info!(application_id = %stored.id, program_id = %program_id, "draft created");
        Ok(stored)
    }

    /// Merge `patch` into a draft's data and drop the fields it fills from
    /// `missing_fields`. Keys the core maintains (shared documents, payment)
    /// are refused.
    pub async fn save_draft(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
        patch: Row,
    ) -> Result<Application> {
        let mut application = self.load_application(application_id).await?;
        authorize(actor, Action::EditDraft, AccessTarget::new(&application, None))?;
        transition_to(Action::EditDraft, application.status)?;
        let reserved = ApplicationData::reserved_keys_in(&patch);
        if !reserved.is_empty() {
            return Err(LifecycleError::ReservedFields { fields: reserved });
        }

        application
            .missing_fields
            .retain(|field| patch.get(field).is_none_or(Value::is_null));
        application.application_data.merge(patch);

        let mut write = Row::new();
        write.insert(
            "application_data".to_string(),
            application.application_data.clone().into_value(),
        );
        write.insert(
            "missing_fields".to_string(),
            Value::from(application.missing_fields.clone()),
        );
        self.gateway
            .write_row(
                Table::Applications,
                &Filter::by_id(application_id.as_str()),
                write,
            )
            .await?;

        debug!(
            application_id = %application_id,
            missing = application.missing_fields.len(),
            "draft saved"
        );
        Ok(application)
    }

    /// Submit a draft for review.
    pub async fn submit_application(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
    ) -> Result<Application> {
        let mut application = self.load_application(application_id).await?;
        authorize(actor, Action::Submit, AccessTarget::new(&application, None))?;
        let next = transition_to(Action::Submit, application.status)?;

        let now = self.clock.now();
        let mut patch = status_patch(next);
        patch.insert(
            "submitted_at".to_string(),
            Value::String(format_timestamp(now)),
        );
        self.gateway
            .write_row(
                Table::Applications,
                &Filter::by_id(application_id.as_str()),
                patch,
            )
            .await?;

        application.status = next;
        application.submitted_at = Some(now);
        info!(application_id = %application_id, "application submitted");
        Ok(application)
    }

    /// Move an application to `new_status`.
    ///
    /// `accepted` and `rejected` follow the decision rules; any other target
    /// status is an administrator override.
    pub async fn update_application_status(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
        new_status: ApplicationStatus,
    ) -> Result<StatusUpdate> {
        let application = self.load_application(application_id).await?;
        let action = match new_status {
            ApplicationStatus::Accepted => Action::Accept,
            ApplicationStatus::Rejected => Action::Reject,
            other => Action::Override(other),
        };

        let university_id = self.university_for(actor, &application).await?;
        authorize(
            actor,
            action,
            AccessTarget::new(&application, university_id.as_ref()),
        )?;
        let next = transition_to(action, application.status)?;

        match action {
            Action::Accept => self.accept(application).await,
            _ => {
                let mut application = application;
                let mut patch = status_patch(next);
                if next == ApplicationStatus::Submitted && application.submitted_at.is_none() {
                    let now = self.clock.now();
                    patch.insert(
                        "submitted_at".to_string(),
                        Value::String(format_timestamp(now)),
                    );
                    application.submitted_at = Some(now);
                }
                self.gateway
                    .write_row(
                        Table::Applications,
                        &Filter::by_id(application_id.as_str()),
                        patch,
                    )
                    .await?;

                info!(
                    application_id = %application_id,
                    from = %application.status,
                    to = %next,
                    "application status updated"
                );
                application.status = next;
                Ok(StatusUpdate {
                    application,
                    cleanup: None,
                })
            }
        }
    }

    /// Delete an application on the student's request.
    ///
    /// Accepted applications are never deleted this way, not even when the
    /// status changes between the read and the delete.
    pub async fn withdraw_application(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
    ) -> Result<()> {
        let application = self.load_application(application_id).await?;
        authorize(actor, Action::Withdraw, AccessTarget::new(&application, None))?;
        next_status(Action::Withdraw, application.status)?;

        let filter = Filter::by_id(application_id.as_str())
            .neq("status", ApplicationStatus::Accepted.as_str());
        let deleted = self
            .gateway
            .delete_rows(Table::Applications, &filter)
            .await?;
        if deleted == 0 {
            // Accepted or removed since it was read.
            let current = self.load_application(application_id).await?;
            return Err(LifecycleError::InvalidTransition {
                action: Action::Withdraw,
                status: current.status,
            });
        }

        info!(application_id = %application_id, "application withdrawn");
        Ok(())
    }

    /// Upload an offer letter for an application.
    pub async fn upload_offer_letter(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<OfferLetter> {
        let application = self.load_application(application_id).await?;
        let university_id = self.university_for(actor, &application).await?;
        authorize(
            actor,
            Action::UploadOfferLetter,
            AccessTarget::new(&application, university_id.as_ref()),
        )?;
        transition_to(Action::UploadOfferLetter, application.status)?;

        let letter_id = OfferLetterId::generate();
        let bucket = &self.config.storage.offer_letter_bucket;
        let path = format!(
            "{}/{}-{}",
            application_id,
            letter_id,
            sanitize_object_name(file_name)
        );
        self.objects.upload(bucket, &path, bytes).await?;

        let letter = OfferLetter {
            id: letter_id,
            application_id: application_id.clone(),
            file_name: file_name.to_string(),
            file_url: self.objects.public_url(bucket, &path),
            uploaded_at: Some(self.clock.now()),
        };
        let stored = insert_record(self.gateway.as_ref(), Table::OfferLetters, &letter).await?;
        info!(application_id = %application_id, offer_letter_id = %stored.id, "offer letter uploaded");
        Ok(stored)
    }

    /// Bank accounts of the university an application targets.
    ///
    /// Returns `None` to a student whose application is not accepted yet.
    pub async fn bank_accounts_for(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
    ) -> Result<Option<Vec<BankAccount>>> {
        let application = self.load_application(application_id).await?;
        let program = self.load_program(&application.program_id).await?;
        authorize(
            actor,
            Action::ViewBankAccounts,
            AccessTarget::new(&application, Some(&program.university_id)),
        )?;

        if matches!(actor, Actor::Student { .. })
            && application.status != ApplicationStatus::Accepted
        {
            return Ok(None);
        }

        let accounts = fetch_all(
            self.gateway.as_ref(),
            Table::BankAccounts,
            &Filter::new().eq("university_id", program.university_id.as_str()),
        )
        .await?;
        Ok(Some(accounts))
    }

    async fn accept(&self, mut application: Application) -> Result<StatusUpdate> {
        let offer_letters = self
            .gateway
            .count(
                Table::OfferLetters,
                &Filter::new().eq("application_id", application.id.as_str()),
            )
            .await?;
        if offer_letters == 0 {
            return Err(LifecycleError::MissingOfferLetter {
                application_id: application.id.clone(),
            });
        }

        let days = self.config.payment_window_days;
        let window = compute_payment_window(self.clock.now(), days)
            .ok_or(LifecycleError::InvalidPaymentWindow { days })?;
        let mut data = application.application_data.clone();
        window.apply_to(&mut data);

        let mut patch = status_patch(ApplicationStatus::Accepted);
        patch.insert("application_data".to_string(), data.clone().into_value());
        self.gateway
            .write_row(
                Table::Applications,
                &Filter::by_id(application.id.as_str()),
                patch,
            )
            .await?;

        application.status = ApplicationStatus::Accepted;
        application.application_data = data;
        info!(
            application_id = %application.id,
            payment_due_date = %format_timestamp(window.due_date),
            "application accepted"
        );

        let cleanup = self.withdraw_competing(&application);
        Ok(StatusUpdate {
            application,
            cleanup: Some(cleanup),
        })
    }

    /// Best-effort deletion of every other application of the same student.
    fn withdraw_competing(&self, accepted: &Application) -> BackgroundEffect {
        let gateway = Arc::clone(&self.gateway);
        let application_id = accepted.id.clone();
        let filter = Filter::new()
            .eq("student_id", accepted.student_id.as_str())
            .neq("id", accepted.id.as_str());

        BackgroundEffect::spawn("withdraw competing applications", async move {
            let deleted = gateway.delete_rows(Table::Applications, &filter).await?;
            info!(
                application_id = %application_id,
                deleted,
                "competing applications withdrawn"
            );
            Ok(())
        })
    }

    async fn load_application(&self, application_id: &ApplicationId) -> Result<Application> {
        fetch_one(
            self.gateway.as_ref(),
            Table::Applications,
            &Filter::by_id(application_id.as_str()),
        )
        .await?
        .ok_or_else(|| LifecycleError::ApplicationNotFound(application_id.clone()))
    }

    async fn load_program(&self, program_id: &ProgramId) -> Result<Program> {
        fetch_one(
            self.gateway.as_ref(),
            Table::Programs,
            &Filter::by_id(program_id.as_str()),
        )
        .await?
        .ok_or_else(|| LifecycleError::ProgramNotFound(program_id.clone()))
    }

    /// University owning the application's program, looked up only when the
    /// actor is an official (nobody else's authorization depends on it).
    async fn university_for(
        &self,
        actor: &Actor,
        application: &Application,
    ) -> Result<Option<UniversityId>> {
        if !matches!(actor, Actor::UniversityOfficial { .. }) {
            return Ok(None);
        }
        let program: Option<Program> = fetch_one(
            self.gateway.as_ref(),
            Table::Programs,
            &Filter::by_id(application.program_id.as_str()),
        )
        .await?;
        Ok(program.map(|program| program.university_id))
    }
}

fn transition_to(action: Action, current: ApplicationStatus) -> Result<ApplicationStatus> {
    next_status(action, current)?.ok_or(LifecycleError::InvalidTransition {
        action,
        status: current,
    })
}

fn status_patch(status: ApplicationStatus) -> Row {
    let mut patch = Row::new();
    patch.insert("status".to_string(), Value::from(status.as_str()));
    patch
}
