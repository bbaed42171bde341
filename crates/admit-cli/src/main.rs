//! Admissions core CLI.

use std::io::{self, IsTerminal};

use admit_cli::logging::{LogConfig, LogFormat, init_logging};
use admit_cli::session::Session;
use admit_documents::DocumentError;
use admit_lifecycle::LifecycleError;
use admit_model::Notification;
use admit_store::GatewayError;
use clap::{ColorChoice, Parser};
use tracing::error;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{
    run_bank_accounts, run_create, run_progress, run_save_draft, run_selection, run_shared,
    run_show, run_status, run_submit, run_toggle, run_upload_document, run_upload_offer_letter,
    run_verify, run_withdraw,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let exit_code = match run(&cli).await {
        Ok(()) => 0,
        Err(error) => {
            error!(error = %error, "command failed");
            report(&error);
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Command::Progress { status } = &cli.command {
        run_progress(*status);
        return Ok(());
    }

    let session = Session::open(&cli.store, cli.config.as_deref()).await?;
    let actor = &cli.actor;
    match &cli.command {
        Command::Progress { .. } => {}
        Command::Create { program } => run_create(&session, actor, program).await?,
        Command::SaveDraft(args) => run_save_draft(&session, actor, args).await?,
        Command::Submit { application } => run_submit(&session, actor, application).await?,
        Command::Status {
            application,
            status,
        } => run_status(&session, actor, application, *status).await?,
        Command::Withdraw { application } => run_withdraw(&session, actor, application).await?,
        Command::Show { application } => run_show(&session, actor, application).await?,
        Command::UploadOfferLetter { application, file } => {
            run_upload_offer_letter(&session, actor, application, file).await?;
        }
        Command::UploadDocument { file, doc_type } => {
            run_upload_document(&session, actor, file, doc_type.as_ref()).await?;
        }
        Command::Verify { document, unset } => {
            run_verify(&session, actor, document, !unset).await?;
        }
        Command::Shared { application } => run_shared(&session, actor, application).await?,
        Command::Selection { application } => {
            run_selection(&session, actor, application).await?;
        }
        Command::Toggle {
            application,
            document,
        } => run_toggle(&session, actor, application, document).await?,
        Command::BankAccounts { application } => {
            run_bank_accounts(&session, actor, application).await?;
        }
    }

    if cli.command.mutates() {
        session.save().await?;
    }
    Ok(())
}

/// Print a failed command the way the user-facing errors describe themselves.
fn report(error: &anyhow::Error) {
    let (notification, suggestion) = if let Some(e) = error.downcast_ref::<LifecycleError>() {
        (e.notification(), e.suggestion())
    } else if let Some(e) = error.downcast_ref::<DocumentError>() {
        (e.notification(), e.suggestion())
    } else if let Some(e) = error.downcast_ref::<GatewayError>() {
        (e.notification(), e.suggestion())
    } else {
        eprintln!("error: {error:#}");
        return;
    };
    print_notification(&notification);
    if let Some(suggestion) = suggestion {
        eprintln!("  hint: {suggestion}");
    }
}

fn print_notification(notification: &Notification) {
    eprintln!("error: {}: {}", notification.title, notification.description);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config.log_data = cli.log_data;
    config
}
