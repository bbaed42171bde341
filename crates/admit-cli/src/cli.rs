//! CLI argument definitions for the `admit` command.

use std::path::PathBuf;

use admit_model::{Actor, ApplicationId, ApplicationStatus, DocumentId, DocumentTypeId, ProgramId};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "admit",
    version,
    about = "Admissions core - application lifecycle and shared documents",
    long_about = "Drive the admissions core against a local JSON store.\n\n\
                  Applications move draft -> submitted -> under review -> accepted or rejected.\n\
                  Students choose which documents each application shares with the university."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store snapshot file (created on first write).
    #[arg(long, value_name = "PATH", default_value = "admit-store.json", global = true)]
    pub store: PathBuf,

    /// Core configuration file (JSON). Defaults apply when absent.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Who is acting: `student:<id>`, `official:<university id>` or `admin`.
    #[arg(long, value_name = "ACTOR", default_value = "admin", global = true)]
    pub actor: Actor,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include student emails and file names in logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the progress percentage of a status.
    Progress {
        #[arg(value_name = "STATUS")]
        status: ApplicationStatus,
    },

    /// Start a draft application for a program (students only).
    Create {
        #[arg(value_name = "PROGRAM_ID")]
        program: ProgramId,
    },

    /// Fill in fields of a draft application.
    SaveDraft(SaveDraftArgs),

    /// Submit a draft application.
    Submit { application: ApplicationId },

    /// Change an application's status (accept, reject or override).
    Status {
        application: ApplicationId,
        #[arg(value_name = "STATUS")]
        status: ApplicationStatus,
    },

    /// Withdraw (delete) an application that is not accepted.
    Withdraw { application: ApplicationId },

    /// Show an application.
    Show { application: ApplicationId },

    /// Upload an offer letter for an application.
    UploadOfferLetter {
        application: ApplicationId,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Upload a document into the acting student's library.
    UploadDocument {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Document type id.
        #[arg(long = "type", value_name = "TYPE_ID")]
        doc_type: Option<DocumentTypeId>,
    },

    /// Mark a document as verified.
    Verify {
        document: DocumentId,
        /// Clear the verified flag instead.
        #[arg(long)]
        unset: bool,
    },

    /// List the documents an application shares with the viewer.
    Shared { application: ApplicationId },

    /// Show the student's documents and which ones an application shares.
    Selection { application: ApplicationId },

    /// Share or unshare a document with an application.
    Toggle {
        application: ApplicationId,
        document: DocumentId,
    },

    /// Show the university bank accounts for an application.
    BankAccounts { application: ApplicationId },
}

impl Command {
    /// Whether the command writes to the store.
    pub fn mutates(&self) -> bool {
        !matches!(
            self,
            Command::Progress { .. }
                | Command::Show { .. }
                | Command::Shared { .. }
                | Command::Selection { .. }
                | Command::BankAccounts { .. }
        )
    }
}

#[derive(Args)]
pub struct SaveDraftArgs {
    pub application: ApplicationId,

    /// Field to set, as `key=value`. Values are parsed as JSON when possible.
    #[arg(long = "set", value_name = "KEY=VALUE", required = true)]
    pub fields: Vec<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
