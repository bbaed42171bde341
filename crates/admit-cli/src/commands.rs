use std::fs;
use std::path::Path;

use admit_cli::logging::redact_value;
use admit_cli::session::Session;
use admit_documents::{SaveOutcome, SelectionLedger};
use admit_lifecycle::LifecycleError;
use admit_model::{
    Actor, Application, ApplicationId, ApplicationStatus, DocumentId, DocumentTypeId, ProgramId,
};
use admit_store::{Filter, Row, Table, fetch_one};
use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use tracing::info;

use crate::cli::SaveDraftArgs;
use crate::summary::{
    print_application, print_bank_accounts, print_save_status, print_selection,
    print_shared_documents, print_warning,
};

pub fn run_progress(status: ApplicationStatus) {
    println!("{status}: {}%", admit_lifecycle::progress(status));
}

pub async fn run_create(session: &Session, actor: &Actor, program: &ProgramId) -> Result<()> {
    let application = session
        .applications()
        .create_application(actor, program)
        .await?;
    print_application(&application);
    Ok(())
}

pub async fn run_save_draft(session: &Session, actor: &Actor, args: &SaveDraftArgs) -> Result<()> {
    let patch = parse_fields(&args.fields)?;
    let application = session
        .applications()
        .save_draft(actor, &args.application, patch)
        .await?;
    print_application(&application);
    Ok(())
}

pub async fn run_submit(session: &Session, actor: &Actor, application: &ApplicationId) -> Result<()> {
    let application = session
        .applications()
        .submit_application(actor, application)
        .await?;
    print_application(&application);
    Ok(())
}

pub async fn run_status(
    session: &Session,
    actor: &Actor,
    application: &ApplicationId,
    status: ApplicationStatus,
) -> Result<()> {
    let update = session
        .applications()
        .update_application_status(actor, application, status)
        .await?;
    print_application(&update.application);

    // The process exits after this command; wait so the cleanup is not lost.
    if let Some(cleanup) = update.cleanup
        && let Some(warning) = cleanup.settled().await
    {
        print_warning(&warning);
    }
    Ok(())
}

pub async fn run_withdraw(session: &Session, actor: &Actor, application: &ApplicationId) -> Result<()> {
    session
        .applications()
        .withdraw_application(actor, application)
        .await?;
    println!("Application {application} withdrawn");
    Ok(())
}

pub async fn run_show(session: &Session, actor: &Actor, application_id: &ApplicationId) -> Result<()> {
    let application = load(session, application_id).await?;
    // Whoever may see the shared documents may see the application.
    session
        .documents()
        .shared_documents_for(actor, &application)
        .await?;
    print_application(&application);
    Ok(())
}

pub async fn run_upload_offer_letter(
    session: &Session,
    actor: &Actor,
    application: &ApplicationId,
    file: &Path,
) -> Result<()> {
    let (file_name, bytes) = read_upload(file)?;
    info!(file = redact_value(&file_name), bytes = bytes.len(), "uploading offer letter");
    let letter = session
        .applications()
        .upload_offer_letter(actor, application, &file_name, bytes)
        .await?;
    println!("Offer letter {} uploaded: {}", letter.id, letter.file_url);
    Ok(())
}

pub async fn run_upload_document(
    session: &Session,
    actor: &Actor,
    file: &Path,
    doc_type: Option<&DocumentTypeId>,
) -> Result<()> {
    let (file_name, bytes) = read_upload(file)?;
    info!(file = redact_value(&file_name), bytes = bytes.len(), "uploading document");
    let document = session
        .documents()
        .upload_document(actor, doc_type.cloned(), &file_name, bytes)
        .await?;
    println!("Document {} uploaded: {}", document.id, document.file_url);
    Ok(())
}

pub async fn run_verify(
    session: &Session,
    actor: &Actor,
    document: &DocumentId,
    verified: bool,
) -> Result<()> {
    let document = session
        .documents()
        .set_document_verified(actor, document, verified)
        .await?;
    let state = if document.is_verified { "verified" } else { "not verified" };
    println!("Document {} is {state}", document.id);
    Ok(())
}

pub async fn run_shared(session: &Session, actor: &Actor, application_id: &ApplicationId) -> Result<()> {
    let library = session.documents();
    let application = load(session, application_id).await?;
    let shared = library.shared_documents_for(actor, &application).await?;
    let email = library.student_contact(actor, &application, &shared).await?;
    if let Some(email) = &email {
        info!(email = redact_value(email), "student contact visible");
    }
    print_shared_documents(&shared, |entry| library.describe(entry), email.as_deref());
    Ok(())
}

pub async fn run_selection(
    session: &Session,
    actor: &Actor,
    application: &ApplicationId,
) -> Result<()> {
    let library = session.documents();
    let ledger = SelectionLedger::load(library.clone(), actor, application).await?;
    print_selection(&ledger.documents(), &ledger.status(), |entry| {
        library.describe(entry)
    });
    Ok(())
}

pub async fn run_toggle(
    session: &Session,
    actor: &Actor,
    application: &ApplicationId,
    document: &DocumentId,
) -> Result<()> {
    let ledger = SelectionLedger::load(session.documents(), actor, application).await?;
    let toggle = ledger.toggle(document)?;
    let verb = if toggle.selected { "Shared" } else { "Unshared" };

    let outcome = toggle.save.settled().await;
    if let Some(watermark) = toggle.watermark
        && let Some(warning) = watermark.settled().await
    {
        print_warning(&warning);
    }

    match outcome {
        SaveOutcome::Saved | SaveOutcome::Superseded => {
            println!("{verb} document {document} with application {application}");
        }
        SaveOutcome::Failed(message) => {
            print_save_status(&ledger.status());
            bail!("document selection was not saved: {message}");
        }
    }
    ledger.close();
    Ok(())
}

pub async fn run_bank_accounts(
    session: &Session,
    actor: &Actor,
    application: &ApplicationId,
) -> Result<()> {
    let accounts = session
        .applications()
        .bank_accounts_for(actor, application)
        .await?;
    print_bank_accounts(accounts.as_deref());
    Ok(())
}

async fn load(session: &Session, application_id: &ApplicationId) -> Result<Application> {
    let application: Option<Application> = fetch_one(
        session.gateway().as_ref(),
        Table::Applications,
        &Filter::by_id(application_id.as_str()),
    )
    .await?;
    application.ok_or_else(|| LifecycleError::ApplicationNotFound(application_id.clone()).into())
}

fn read_upload(file: &Path) -> Result<(String, Vec<u8>)> {
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("{} has no usable file name", file.display()))?
        .to_string();
    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    Ok((file_name, bytes))
}

/// Parse `key=value` pairs. Values that are valid JSON keep their type,
/// anything else is stored as a string.
pub fn parse_fields(fields: &[String]) -> Result<Row> {
    let mut patch = Row::new();
    for field in fields {
        let (key, raw) = field
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got '{field}'"))?;
        let key = key.trim();
        if key.is_empty() {
            bail!("empty field name in '{field}'");
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        patch.insert(key.to_string(), value);
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields_keeps_json_types() {
        let patch = parse_fields(&[
            "gpa=3.7".to_string(),
            "personal_statement=I like bridges".to_string(),
            "languages=[\"tr\",\"en\"]".to_string(),
        ])
        .unwrap();
        assert_eq!(patch["gpa"], serde_json::json!(3.7));
        assert_eq!(patch["personal_statement"], serde_json::json!("I like bridges"));
        assert_eq!(patch["languages"], serde_json::json!(["tr", "en"]));
    }

    #[test]
    fn test_parse_fields_rejects_malformed_pairs() {
        assert!(parse_fields(&["no-equals".to_string()]).is_err());
        assert!(parse_fields(&["=value".to_string()]).is_err());
    }
}
